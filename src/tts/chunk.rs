//! Text chunking for the bounded-size synthesis API.

/// Split plain text into chunks of at most `max_len` characters.
///
/// Paragraphs (blank-line separated) are packed greedily into each chunk; a
/// single paragraph longer than `max_len` is hard-split at the last space
/// before the limit, or mid-word at exactly `max_len` when it has no spaces
/// in that span. Chunks preserve input order and are never empty.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    if max_len == 0 {
        return Vec::new();
    }

    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for paragraph in paragraphs {
        let candidate_len = if current.is_empty() {
            char_len(paragraph)
        } else {
            char_len(&current) + 2 + char_len(paragraph)
        };

        if candidate_len <= max_len {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        let mut rest = paragraph.to_string();
        while char_len(&rest) > max_len {
            let cut = split_index(&rest, max_len);
            chunks.push(rest[..cut].trim().to_string());
            rest = rest[cut..].trim().to_string();
        }
        current = rest;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index to cut an oversized paragraph at: the last space within the
/// first `max_len` characters, else the boundary after exactly `max_len`
/// characters.
fn split_index(paragraph: &str, max_len: usize) -> usize {
    let mut last_space = None;
    let mut limit = paragraph.len();

    for (pos, (idx, ch)) in paragraph.char_indices().enumerate() {
        if pos >= max_len {
            limit = idx;
            break;
        }
        if ch == ' ' {
            last_space = Some(idx);
        }
    }

    last_space.unwrap_or(limit)
}
