//! Podcast RSS document generation.

use rss::extension::itunes::{
    ITunesChannelExtensionBuilder, ITunesItemExtensionBuilder, ITunesOwnerBuilder,
};
use rss::{ChannelBuilder, EnclosureBuilder, GuidBuilder, ImageBuilder, ItemBuilder};
use std::path::Path;

use crate::config::Settings;
use crate::error::Result;
use crate::store::EpisodeRecord;
use crate::util::{ensure_parent, parse_pub_date};

/// Feed-level values for the rendered document.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub title: String,
    pub description: String,
    pub site_link: String,
    pub author: String,
    pub email: String,
    pub language: String,
    pub image_url: String,
    pub feed_url: String,
}

impl FeedConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        FeedConfig {
            title: settings.podcast.title.clone(),
            description: settings.podcast.description.clone(),
            site_link: settings.podcast.link.clone(),
            author: settings.podcast.author.clone(),
            email: settings.podcast.email.clone(),
            language: settings.podcast.language.clone(),
            image_url: settings.podcast.image_url.clone(),
            feed_url: if settings.public_base_url.is_empty() {
                String::new()
            } else {
                format!("{}/feed.xml", settings.public_base_url.trim_end_matches('/'))
            },
        }
    }
}

/// Public URL an episode's audio file is served from.
pub fn build_audio_url(public_base_url: &str, file_name: &str) -> String {
    format!("{}/audio/{}", public_base_url.trim_end_matches('/'), file_name)
}

/// Render the podcast feed document.
///
/// Pure function of its inputs: episodes are ordered newest-first by
/// publish time regardless of collection order, and no other state is
/// consulted.
pub fn render_feed(episodes: &[EpisodeRecord], cfg: &FeedConfig) -> Result<Vec<u8>> {
    let mut ordered: Vec<&EpisodeRecord> = episodes.iter().collect();
    ordered.sort_by_key(|ep| std::cmp::Reverse(parse_pub_date(&ep.pub_date_iso)));

    let items: Vec<rss::Item> = ordered
        .iter()
        .map(|ep| {
            let itunes = ITunesItemExtensionBuilder::default()
                .author(Some(if ep.author.is_empty() {
                    cfg.author.clone()
                } else {
                    ep.author.clone()
                }))
                .summary(Some(ep.description.clone()))
                .explicit(Some("no".to_string()))
                .build();

            ItemBuilder::default()
                .guid(Some(
                    GuidBuilder::default()
                        .value(ep.guid.clone())
                        .permalink(false)
                        .build(),
                ))
                .title(Some(ep.title.clone()))
                .link((!ep.link.is_empty()).then(|| ep.link.clone()))
                .description(Some(ep.description.clone()))
                .enclosure(Some(
                    EnclosureBuilder::default()
                        .url(ep.audio_url.clone())
                        .length(ep.audio_size_bytes.to_string())
                        .mime_type("audio/mpeg".to_string())
                        .build(),
                ))
                .pub_date(Some(parse_pub_date(&ep.pub_date_iso).to_rfc2822()))
                .itunes_ext(Some(itunes))
                .build()
        })
        .collect();

    let itunes_channel = ITunesChannelExtensionBuilder::default()
        .author(Some(cfg.author.clone()))
        .summary(Some(cfg.description.clone()))
        .explicit(Some("no".to_string()))
        .image((!cfg.image_url.is_empty()).then(|| cfg.image_url.clone()))
        .owner(Some(
            ITunesOwnerBuilder::default()
                .name(Some(cfg.author.clone()))
                .email(Some(cfg.email.clone()))
                .build(),
        ))
        .build();

    let site_link = if cfg.site_link.is_empty() {
        cfg.feed_url.clone()
    } else {
        cfg.site_link.clone()
    };

    let channel = ChannelBuilder::default()
        .title(cfg.title.clone())
        .description(cfg.description.clone())
        .link(site_link.clone())
        .language(Some(cfg.language.clone()))
        .image((!cfg.image_url.is_empty()).then(|| {
            ImageBuilder::default()
                .url(cfg.image_url.clone())
                .title(cfg.title.clone())
                .link(site_link)
                .build()
        }))
        .itunes_ext(Some(itunes_channel))
        .items(items)
        .build();

    let body = channel.pretty_write_to(Vec::new(), b' ', 2)?;
    let mut document = Vec::new();
    if !body.starts_with(b"<?xml") {
        document.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    }
    document.extend(body);
    Ok(document)
}

/// Render and write the feed file, creating parent directories as needed.
pub fn write_feed(episodes: &[EpisodeRecord], cfg: &FeedConfig, path: &Path) -> Result<()> {
    let document = render_feed(episodes, cfg)?;
    ensure_parent(path)?;
    std::fs::write(path, document)?;
    log::info!("feed written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FeedConfig {
        FeedConfig {
            title: "Test Cast".to_string(),
            description: "Audio versions of test posts.".to_string(),
            site_link: "https://example.substack.com".to_string(),
            author: "Jane Writer".to_string(),
            email: "jane@example.test".to_string(),
            language: "en".to_string(),
            image_url: String::new(),
            feed_url: "https://cdn.test/feed.xml".to_string(),
        }
    }

    fn record(guid: &str, date_iso: &str) -> EpisodeRecord {
        EpisodeRecord {
            guid: guid.to_string(),
            title: format!("Episode {}", guid),
            description: "desc".to_string(),
            author: String::new(),
            link: format!("https://example.substack.com/p/{}", guid),
            pub_date_iso: date_iso.to_string(),
            audio_file: format!("{}.mp3", guid),
            audio_url: format!("https://cdn.test/audio/{}.mp3", guid),
            audio_size_bytes: 2048,
        }
    }

    #[test]
    fn test_build_audio_url() {
        assert_eq!(
            build_audio_url("https://cdn.test/", "ep.mp3"),
            "https://cdn.test/audio/ep.mp3"
        );
        assert_eq!(
            build_audio_url("https://cdn.test", "ep.mp3"),
            "https://cdn.test/audio/ep.mp3"
        );
    }

    #[test]
    fn test_render_orders_newest_first() {
        let episodes = vec![
            record("old", "2024-01-01T00:00:00+00:00"),
            record("newest", "2024-06-01T00:00:00+00:00"),
            record("middle", "2024-03-01T00:00:00+00:00"),
        ];
        let xml = String::from_utf8(render_feed(&episodes, &config()).unwrap()).unwrap();

        let pos = |guid: &str| xml.find(&format!(">{}<", guid)).unwrap();
        assert!(pos("newest") < pos("middle"));
        assert!(pos("middle") < pos("old"));
    }

    #[test]
    fn test_render_includes_enclosure() {
        let episodes = vec![record("ep1", "2024-05-14T10:30:00+00:00")];
        let xml = String::from_utf8(render_feed(&episodes, &config()).unwrap()).unwrap();

        assert!(xml.contains("https://cdn.test/audio/ep1.mp3"));
        assert!(xml.contains("audio/mpeg"));
        assert!(xml.contains("2048"));
    }

    #[test]
    fn test_render_channel_metadata_and_declaration() {
        let xml = String::from_utf8(render_feed(&[], &config()).unwrap()).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("Test Cast"));
        assert!(xml.contains("<language>en</language>"));
    }

    #[test]
    fn test_render_is_stable_for_same_inputs() {
        let episodes = vec![
            record("a", "2024-05-14T10:30:00+00:00"),
            record("b", "2024-05-15T10:30:00+00:00"),
        ];
        let first = render_feed(&episodes, &config()).unwrap();
        let second = render_feed(&episodes, &config()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_item_author_falls_back_to_channel_author() {
        let episodes = vec![record("ep1", "2024-05-14T10:30:00+00:00")];
        let xml = String::from_utf8(render_feed(&episodes, &config()).unwrap()).unwrap();
        assert!(xml.contains("Jane Writer"));
    }
}
