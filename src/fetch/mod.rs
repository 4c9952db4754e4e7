//! Fetching candidate articles from Substack.
//!
//! The primary source is the RSS feed; endpoints behind anti-bot rules
//! return 403 for non-browser clients, so fetches carry browser-like
//! headers and fall back to the Substack posts and archive JSON APIs.

pub mod article;
pub mod substack;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

pub use article::{fetch_article_by_url, FetchedArticle};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
const ACCEPT_FEED: &str =
    "application/rss+xml, application/xml;q=0.9, text/xml;q=0.8, */*;q=0.1";
pub(crate) const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("failed to parse feed content: {0}")]
    Parse(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// One newsletter post as seen by the pipeline. The guid is the dedup key
/// and must be stable run-to-run; it comes from the feed, never from
/// mutable content.
#[derive(Debug, Clone)]
pub struct Article {
    pub guid: String,
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
    pub author: String,
    pub description_html: String,
    pub content_html: String,
}

/// HTTP client for feed and article retrieval.
pub struct FeedClient {
    client: reqwest::Client,
}

impl FeedClient {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// GET a URL as text with bounded retries. Rate-limit and server-error
    /// statuses and transport faults are retried with increasing backoff;
    /// any other non-success status is returned immediately so callers can
    /// react (403 drives the API fallback chain).
    pub(crate) async fn get_text(&self, url: &str, accept: &str) -> Result<String, FetchError> {
        let backoff_delays = [2u64, 8, 30];

        for attempt in 0..=backoff_delays.len() {
            let outcome = self
                .client
                .get(url)
                .header("Accept", accept)
                .header("Accept-Language", "en-US,en;q=0.9")
                .header("Cache-Control", "no-cache")
                .header("Referer", referer_for(url))
                .send()
                .await;

            let retryable_err = match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(|source| {
                            FetchError::Transport {
                                url: url.to_string(),
                                source,
                            }
                        });
                    }
                    let err = FetchError::Status {
                        url: url.to_string(),
                        status,
                    };
                    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        err
                    } else {
                        return Err(err);
                    }
                }
                Err(source) => FetchError::Transport {
                    url: url.to_string(),
                    source,
                },
            };

            if attempt < backoff_delays.len() {
                let delay = backoff_delays[attempt];
                log::warn!(
                    "fetch attempt {} failed, retrying in {}s: {}",
                    attempt + 1,
                    delay,
                    retryable_err
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
            } else {
                return Err(retryable_err);
            }
        }

        unreachable!()
    }

    /// Fetch the full candidate list: RSS first, then the posts API, then
    /// the archive API when an endpoint rejects us with 403.
    pub async fn fetch_articles(
        &self,
        feed_url: &str,
        max_posts: usize,
    ) -> Result<Vec<Article>, FetchError> {
        log::info!("fetching Substack feed: {}", feed_url);
        match self.get_text(feed_url, ACCEPT_FEED).await {
            Ok(xml) => parse_feed_xml(&xml),
            Err(e) if e.status() == Some(StatusCode::FORBIDDEN) => {
                log::warn!("RSS feed returned 403, falling back to the posts API");
                self.fetch_from_posts_api(feed_url, max_posts).await
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_from_posts_api(
        &self,
        feed_url: &str,
        max_posts: usize,
    ) -> Result<Vec<Article>, FetchError> {
        let base = api_base(feed_url);
        let posts_url = format!("{}/api/v1/posts?limit={}", base, (max_posts * 3).max(10));

        match self.get_text(&posts_url, ACCEPT_FEED).await {
            Ok(json) => substack::parse_rows(&json),
            Err(e) if e.status() == Some(StatusCode::FORBIDDEN) => {
                log::warn!("posts API returned 403, falling back to the archive API");
                let archive_url = format!("{}/api/v1/archive?sort=new", base);
                let json = self.get_text(&archive_url, ACCEPT_FEED).await?;
                substack::parse_rows(&json)
            }
            Err(e) => Err(e),
        }
    }
}

/// The publication base URL for the Substack JSON APIs, derived from the
/// feed URL (`https://name.substack.com/feed` → `https://name.substack.com`).
fn api_base(feed_url: &str) -> String {
    match feed_url.find("/feed") {
        Some(idx) => feed_url[..idx].to_string(),
        None => feed_url.trim_end_matches('/').to_string(),
    }
}

fn referer_for(url: &str) -> String {
    match url.rfind('/') {
        Some(idx) => url[..idx].to_string(),
        None => url.to_string(),
    }
}

/// Map a parsed RSS/Atom document to articles. Entries keep their feed
/// guid, falling back to link then title when a feed omits it.
pub(crate) fn parse_feed_xml(xml: &str) -> Result<Vec<Article>, FetchError> {
    let feed =
        feed_rs::parser::parse(xml.as_bytes()).map_err(|e| FetchError::Parse(e.to_string()))?;

    let mut articles = Vec::new();
    for entry in feed.entries {
        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());
        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default();
        let guid = {
            let id = entry.id.trim();
            if !id.is_empty() {
                id.to_string()
            } else if !link.is_empty() {
                link.clone()
            } else {
                title.clone()
            }
        };
        let description_html = entry.summary.map(|s| s.content).unwrap_or_default();
        let content_html = entry
            .content
            .and_then(|c| c.body)
            .filter(|body| !body.trim().is_empty())
            .unwrap_or_else(|| description_html.clone());
        let author = entry
            .authors
            .first()
            .map(|p| p.name.trim().to_string())
            .unwrap_or_default();

        articles.push(Article {
            guid,
            title,
            link,
            published: entry.published.or(entry.updated).unwrap_or_else(Utc::now),
            author,
            description_html,
            content_html,
        });
    }

    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Example Letter</title>
    <link>https://example.substack.com</link>
    <description>Test feed</description>
    <item>
      <title>First Post</title>
      <link>https://example.substack.com/p/first-post</link>
      <guid isPermaLink="false">substack:post:1001</guid>
      <pubDate>Tue, 14 May 2024 10:30:00 GMT</pubDate>
      <description>&lt;p&gt;A teaser.&lt;/p&gt;</description>
      <content:encoded>&lt;p&gt;Full body of the first post.&lt;/p&gt;</content:encoded>
    </item>
    <item>
      <title>Second Post</title>
      <link>https://example.substack.com/p/second-post</link>
      <guid isPermaLink="false">substack:post:1002</guid>
      <pubDate>Wed, 15 May 2024 09:00:00 GMT</pubDate>
      <description>&lt;p&gt;Another teaser.&lt;/p&gt;</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_xml_maps_fields() {
        let articles = parse_feed_xml(SAMPLE_RSS).unwrap();
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.guid, "substack:post:1001");
        assert_eq!(first.title, "First Post");
        assert_eq!(first.link, "https://example.substack.com/p/first-post");
        assert_eq!(first.published.to_rfc3339(), "2024-05-14T10:30:00+00:00");
        assert!(first.content_html.contains("Full body"));
    }

    #[test]
    fn test_parse_feed_xml_falls_back_to_description() {
        let articles = parse_feed_xml(SAMPLE_RSS).unwrap();
        let second = &articles[1];
        assert!(second.content_html.contains("Another teaser"));
    }

    #[test]
    fn test_parse_feed_xml_rejects_garbage() {
        assert!(parse_feed_xml("not xml at all").is_err());
    }

    #[test]
    fn test_api_base_strips_feed_suffix() {
        assert_eq!(
            api_base("https://name.substack.com/feed"),
            "https://name.substack.com"
        );
        assert_eq!(
            api_base("https://name.substack.com/"),
            "https://name.substack.com"
        );
    }

    #[test]
    fn test_referer_is_parent_path() {
        assert_eq!(
            referer_for("https://name.substack.com/feed"),
            "https://name.substack.com"
        );
    }
}
