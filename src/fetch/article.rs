//! Fetching a single article page by URL.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::fetch::{FeedClient, FetchError, ACCEPT_HTML};
use crate::html::strip_html_to_text;

/// Structured content of one article page, as returned by the
/// `fetch-article` command.
#[derive(Debug, Clone, Serialize)]
pub struct FetchedArticle {
    pub title: String,
    pub author: String,
    pub pub_date: String,
    pub description: String,
    pub link: String,
    pub content_html: String,
    pub content_text: String,
    pub word_count: usize,
}

pub async fn fetch_article_by_url(
    client: &FeedClient,
    url: &str,
) -> Result<FetchedArticle, FetchError> {
    let html = client.get_text(url, ACCEPT_HTML).await?;
    Ok(extract_article(&html, url))
}

/// Substack renders the post body in one of a few known containers.
const BODY_SELECTORS: [&str; 4] = [
    "div.body.markup",
    "div.available-content",
    "div.post-content",
    "article",
];

pub(crate) fn extract_article(html: &str, url: &str) -> FetchedArticle {
    let document = Html::parse_document(html);

    let title = meta_content(&document, "meta[property=\"og:title\"]")
        .or_else(|| {
            select_first(&document, "h1").map(|h1| h1.text().collect::<String>().trim().to_string())
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let author = meta_content(&document, "meta[name=\"author\"]").unwrap_or_default();

    let pub_date = select_first(&document, "time")
        .and_then(|time| time.value().attr("datetime"))
        .map(|dt| dt.trim().to_string())
        .unwrap_or_default();

    let description = meta_content(&document, "meta[property=\"og:description\"]")
        .unwrap_or_default();

    let content_html = BODY_SELECTORS
        .iter()
        .find_map(|sel| select_first(&document, sel))
        .map(|el| el.html())
        .unwrap_or_default();

    let content_text = strip_html_to_text(&content_html);
    let word_count = content_text.split_whitespace().count();

    FetchedArticle {
        title,
        author,
        pub_date,
        description,
        link: url.to_string(),
        content_html,
        content_text,
        word_count,
    }
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    select_first(document, selector)
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}
