//! Substack posts/archive JSON API parsing.

use serde::Deserialize;
use serde_json::Value;

use crate::fetch::{Article, FetchError};
use crate::util::parse_pub_date;

/// One row of the posts or archive API response. Both endpoints share this
/// shape; unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct PostRow {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    canonical_url: Option<String>,
    #[serde(default)]
    post_date: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    body_html: Option<String>,
    #[serde(default)]
    truncated_body_text: Option<String>,
    #[serde(rename = "publishedBylines", default)]
    published_bylines: Vec<Byline>,
}

#[derive(Debug, Deserialize)]
struct Byline {
    #[serde(default)]
    name: Option<String>,
}

pub fn parse_rows(json: &str) -> Result<Vec<Article>, FetchError> {
    let rows: Vec<PostRow> =
        serde_json::from_str(json).map_err(|e| FetchError::Parse(e.to_string()))?;
    Ok(rows.into_iter().map(row_to_article).collect())
}

fn row_to_article(row: PostRow) -> Article {
    let title = row
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());
    let link = row
        .canonical_url
        .map(|l| l.trim().to_string())
        .unwrap_or_default();

    // The numeric post id is the stable identifier; fall back like the RSS
    // path when it is missing.
    let guid = match row.id {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ if !link.is_empty() => link.clone(),
        _ => title.clone(),
    };

    let description = row
        .description
        .or(row.subtitle)
        .map(|d| d.trim().to_string())
        .unwrap_or_default();
    let content_html = row
        .body_html
        .or(row.truncated_body_text)
        .filter(|body| !body.trim().is_empty())
        .unwrap_or_else(|| description.clone());

    let author = row
        .published_bylines
        .into_iter()
        .next()
        .and_then(|byline| byline.name)
        .map(|name| name.trim().to_string())
        .unwrap_or_default();

    Article {
        guid,
        title,
        link,
        published: parse_pub_date(row.post_date.as_deref().unwrap_or("")),
        author,
        description_html: description,
        content_html,
    }
}
