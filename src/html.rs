//! HTML to plain text extraction.

use scraper::{Html, Node};

const SKIPPED_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// Strip HTML down to readable plain text.
///
/// Script, style, and noscript subtrees are dropped entirely. Remaining text
/// nodes become individual lines; lines are trimmed, empty ones removed, and
/// the survivors joined with blank lines so downstream chunking sees
/// paragraph boundaries.
pub fn strip_html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    let mut raw = String::new();

    for node in fragment.tree.root().descendants() {
        if let Node::Text(text) = node.value() {
            let skipped = node.ancestors().any(|ancestor| match ancestor.value() {
                Node::Element(el) => SKIPPED_TAGS.contains(&el.name()),
                _ => false,
            });
            if !skipped {
                raw.push_str(text);
                raw.push('\n');
            }
        }
    }

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// First `max_chars` characters of `text`, with an ellipsis marker when
/// anything was cut off.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut taken: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        taken.push_str("...");
    }
    taken
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_basic_markup() {
        let text = strip_html_to_text("<p>Hello <em>world</em></p><p>Second paragraph</p>");
        assert!(text.contains("Hello"));
        assert!(text.contains("world"));
        assert!(text.contains("Second paragraph"));
    }

    #[test]
    fn test_strip_drops_scripts_and_styles() {
        let html = r#"<p>Visible</p>
            <script>var hidden = "nope";</script>
            <style>.x { color: red; }</style>
            <noscript>also hidden</noscript>"#;
        let text = strip_html_to_text(html);
        assert!(text.contains("Visible"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_strip_empty_input() {
        assert_eq!(strip_html_to_text(""), "");
        assert_eq!(strip_html_to_text("   "), "");
        assert_eq!(strip_html_to_text("<div><script>x()</script></div>"), "");
    }

    #[test]
    fn test_strip_produces_paragraph_boundaries() {
        let text = strip_html_to_text("<p>One</p><p>Two</p>");
        assert_eq!(text, "One\n\nTwo");
    }

    #[test]
    fn test_excerpt_short_text_untouched() {
        assert_eq!(excerpt("short", 250), "short");
    }

    #[test]
    fn test_excerpt_truncates_with_marker() {
        let long = "a".repeat(300);
        let cut = excerpt(&long, 250);
        assert_eq!(cut.chars().count(), 253);
        assert!(cut.ends_with("..."));
    }
}
