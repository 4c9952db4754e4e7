//! Article selection: deciding which fetched articles are work for this run.

use std::collections::BTreeSet;

use crate::fetch::Article;

/// A parsed target selector.
///
/// Raw selectors are `"field:value"` strings (`guid`/`id`, `link`/`url`,
/// `title`) or a bare needle matched across title, guid, and link. Parsing
/// happens once at the boundary so matching is exhaustive over typed
/// variants instead of re-sniffing strings per article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Exact guid match, case-insensitive.
    Guid(String),
    /// Exact link match, case-insensitive.
    Link(String),
    /// Case-insensitive substring match on the title.
    Title(String),
    /// Case-insensitive substring match on title, guid, or link.
    Any(String),
}

impl Selector {
    /// Parse one raw selector. Empty or whitespace-only input matches
    /// nothing and yields `None`; an unknown field prefix falls back to a
    /// bare substring match on the whole raw string.
    pub fn parse(raw: &str) -> Option<Selector> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Some((field, value)) = raw.split_once(':') {
            let value = value.trim();
            if value.is_empty() {
                return None;
            }
            match field.trim().to_lowercase().as_str() {
                "guid" | "id" => return Some(Selector::Guid(value.to_string())),
                "link" | "url" => return Some(Selector::Link(value.to_string())),
                "title" => return Some(Selector::Title(value.to_string())),
                _ => {}
            }
        }

        Some(Selector::Any(raw.to_string()))
    }

    pub fn matches(&self, article: &Article) -> bool {
        match self {
            Selector::Guid(value) => article.guid.eq_ignore_ascii_case(value),
            Selector::Link(value) => article.link.eq_ignore_ascii_case(value),
            Selector::Title(value) => contains_ci(&article.title, value),
            Selector::Any(value) => {
                contains_ci(&article.title, value)
                    || contains_ci(&article.guid, value)
                    || contains_ci(&article.link, value)
            }
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// How a run picks its articles.
#[derive(Debug, Clone)]
pub enum SelectionMode {
    /// Unprocessed articles, oldest first, capped at `max_count`.
    Incremental { max_count: usize },
    /// All selector matches, oldest first, no cap. `include_processed`
    /// controls whether already-processed guids are re-selected.
    Targeted {
        selectors: Vec<Selector>,
        include_processed: bool,
    },
}

/// Select the articles to process this run, in processing order.
///
/// Ordering is ascending by publish time in both modes so capped or
/// restarted runs work through a backlog deterministically.
pub fn select(
    articles: &[Article],
    processed: &BTreeSet<String>,
    mode: &SelectionMode,
) -> Vec<Article> {
    let mut chosen: Vec<Article> = match mode {
        SelectionMode::Incremental { .. } => articles
            .iter()
            .filter(|a| !processed.contains(&a.guid))
            .cloned()
            .collect(),
        SelectionMode::Targeted {
            selectors,
            include_processed,
        } => articles
            .iter()
            .filter(|a| selectors.iter().any(|s| s.matches(a)))
            .filter(|a| *include_processed || !processed.contains(&a.guid))
            .cloned()
            .collect(),
    };

    chosen.sort_by_key(|a| a.published);

    if let SelectionMode::Incremental { max_count } = mode {
        chosen.truncate(*max_count);
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(guid: &str, title: &str, link: &str, day: u32) -> Article {
        Article {
            guid: guid.to_string(),
            title: title.to_string(),
            link: link.to_string(),
            published: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
            author: String::new(),
            description_html: String::new(),
            content_html: "<p>body</p>".to_string(),
        }
    }

    fn processed(guids: &[&str]) -> BTreeSet<String> {
        guids.iter().map(|g| g.to_string()).collect()
    }

    #[test]
    fn test_selector_parse_fields() {
        assert_eq!(
            Selector::parse("guid:abc"),
            Some(Selector::Guid("abc".to_string()))
        );
        assert_eq!(
            Selector::parse("id:abc"),
            Some(Selector::Guid("abc".to_string()))
        );
        assert_eq!(
            Selector::parse("url:https://x.test/p"),
            Some(Selector::Link("https://x.test/p".to_string()))
        );
        assert_eq!(
            Selector::parse("title:Launch"),
            Some(Selector::Title("Launch".to_string()))
        );
    }

    #[test]
    fn test_selector_parse_bare_and_unknown_field() {
        assert_eq!(
            Selector::parse("launch week"),
            Some(Selector::Any("launch week".to_string()))
        );
        // Unknown prefix is treated as a bare needle, colon included.
        assert_eq!(
            Selector::parse("weird:thing"),
            Some(Selector::Any("weird:thing".to_string()))
        );
    }

    #[test]
    fn test_selector_parse_empty() {
        assert_eq!(Selector::parse(""), None);
        assert_eq!(Selector::parse("   "), None);
        assert_eq!(Selector::parse("title:  "), None);
    }

    #[test]
    fn test_selector_matching() {
        let a = article("guid-1", "Product Launch", "https://x.test/launch", 1);
        assert!(Selector::Guid("GUID-1".to_string()).matches(&a));
        assert!(!Selector::Guid("guid".to_string()).matches(&a));
        assert!(Selector::Link("https://X.test/launch".to_string()).matches(&a));
        assert!(Selector::Title("launch".to_string()).matches(&a));
        assert!(Selector::Any("x.test".to_string()).matches(&a));
        assert!(!Selector::Any("retro".to_string()).matches(&a));
    }

    #[test]
    fn test_incremental_skips_processed() {
        let articles = vec![
            article("A", "Old Post", "https://x.test/a", 1),
            article("B", "New Post", "https://x.test/b", 2),
        ];
        let selected = select(
            &articles,
            &processed(&["A"]),
            &SelectionMode::Incremental { max_count: 5 },
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].guid, "B");
    }

    #[test]
    fn test_incremental_oldest_first_and_capped() {
        let articles = vec![
            article("C", "Third", "https://x.test/c", 3),
            article("A", "First", "https://x.test/a", 1),
            article("B", "Second", "https://x.test/b", 2),
        ];
        let selected = select(
            &articles,
            &BTreeSet::new(),
            &SelectionMode::Incremental { max_count: 2 },
        );
        let guids: Vec<&str> = selected.iter().map(|a| a.guid.as_str()).collect();
        assert_eq!(guids, vec!["A", "B"]);
    }

    #[test]
    fn test_incremental_deterministic() {
        let articles = vec![
            article("B", "Second", "https://x.test/b", 2),
            article("A", "First", "https://x.test/a", 1),
        ];
        let first = select(
            &articles,
            &BTreeSet::new(),
            &SelectionMode::Incremental { max_count: 5 },
        );
        let second = select(
            &articles,
            &BTreeSet::new(),
            &SelectionMode::Incremental { max_count: 5 },
        );
        let order =
            |sel: &[Article]| sel.iter().map(|a| a.guid.clone()).collect::<Vec<_>>();
        assert_eq!(order(&first), order(&second));
    }

    #[test]
    fn test_targeted_title_match_ignores_processed_set() {
        let articles = vec![
            article("A", "Product Launch", "https://x.test/a", 1),
            article("B", "Retro", "https://x.test/b", 2),
        ];
        let mode = SelectionMode::Targeted {
            selectors: vec![Selector::parse("title:Launch").unwrap()],
            include_processed: true,
        };
        let selected = select(&articles, &processed(&["A"]), &mode);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].guid, "A");
    }

    #[test]
    fn test_targeted_excludes_processed_when_configured() {
        let articles = vec![
            article("A", "Product Launch", "https://x.test/a", 1),
            article("B", "Second Launch", "https://x.test/b", 2),
        ];
        let mode = SelectionMode::Targeted {
            selectors: vec![Selector::parse("title:Launch").unwrap()],
            include_processed: false,
        };
        let selected = select(&articles, &processed(&["A"]), &mode);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].guid, "B");
    }

    #[test]
    fn test_targeted_no_cap() {
        let articles: Vec<Article> = (1..=9)
            .map(|d| {
                article(
                    &format!("G{}", d),
                    &format!("Launch {}", d),
                    &format!("https://x.test/{}", d),
                    d,
                )
            })
            .collect();
        let mode = SelectionMode::Targeted {
            selectors: vec![Selector::parse("title:Launch").unwrap()],
            include_processed: true,
        };
        let selected = select(&articles, &BTreeSet::new(), &mode);
        assert_eq!(selected.len(), 9);
    }
}
