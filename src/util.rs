//! Shared utilities: slugs, publish-date parsing, JSON file persistence.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::error::Result;

const SLUG_MAX_LEN: usize = 80;

/// Normalize a title into a filename-safe slug: lowercased, ASCII
/// alphanumerics only, whitespace and hyphen runs collapsed to single
/// hyphens, bounded length, `"untitled"` when nothing survives.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let slug = kept
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    let bounded: String = slug.chars().take(SLUG_MAX_LEN).collect();
    let trimmed = bounded.trim_matches('-');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a feed publish date, normalized to UTC.
///
/// RSS feeds carry RFC 2822 dates, the Substack JSON APIs carry RFC 3339 or
/// naive ISO timestamps. Anything unparseable falls back to the current time
/// so an article with a mangled date still gets processed.
pub fn parse_pub_date(raw: &str) -> DateTime<Utc> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Utc::now();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Utc.from_utc_datetime(&naive);
    }
    Utc::now()
}

pub fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Read a JSON file, returning `default` when the file does not exist.
pub fn load_json_or<T: DeserializeOwned>(path: &Path, default: T) -> Result<T> {
    if !path.exists() {
        return Ok(default);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write a JSON file atomically: serialize to a temp sibling, then rename
/// over the target so a crash mid-write never leaves a truncated file.
pub fn save_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = Path::new(&tmp);

    std::fs::write(tmp_path, json)?;
    std::fs::rename(tmp_path, path)?;
    Ok(())
}
