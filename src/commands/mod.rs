//! Command implementations behind the CLI surface.
//!
//! Each command is independently invokable and returns a structured result
//! that serializes to the JSON the CLI prints.

use serde::Serialize;
use std::path::Path;

use crate::audio::MergeStrategy;
use crate::config::{self, Settings, SetupStatus};
use crate::error::{AppError, Result};
use crate::feed::{self, FeedConfig};
use crate::fetch::{fetch_article_by_url, FeedClient, FetchedArticle};
use crate::pipeline::{sweep_orphans, Pipeline, RunSummary};
use crate::store::{EpisodeRecord, Store};
use crate::tts::ElevenLabsClient;
use crate::util::parse_pub_date;

/// Check configuration readiness without requiring any of it to be set.
pub fn setup_check() -> SetupStatus {
    config::setup_report()
}

/// The full batch: fetch candidates, select, synthesize, publish.
pub async fn run_batch(settings: &Settings) -> Result<RunSummary> {
    settings.ensure_ready()?;

    let client = FeedClient::new()?;
    let articles = client
        .fetch_articles(&settings.feed_url, settings.max_posts)
        .await?;
    if articles.is_empty() {
        log::warn!("no items found in the feed");
    }

    let tts = ElevenLabsClient::new(settings)?;
    let merge = MergeStrategy::detect().await;
    let mut store = Store::open(&settings.episodes_file, &settings.state_file)?;

    Pipeline::new(settings, &tts, merge)
        .run(&mut store, &articles)
        .await
}

/// Fetch one article's structured content by URL.
pub async fn fetch_article(url: &str) -> Result<FetchedArticle> {
    let client = FeedClient::new()?;
    Ok(fetch_article_by_url(&client, url).await?)
}

#[derive(Debug, Serialize)]
pub struct AudioResult {
    pub audio_file: String,
    pub audio_path: String,
    pub audio_url: String,
    pub audio_size_bytes: u64,
    pub chunks_processed: usize,
}

/// Synthesize audio for arbitrary text (from a file) without touching the
/// episode catalog.
pub async fn generate_audio(
    settings: &Settings,
    title: &str,
    pub_date: &str,
    text_file: &Path,
) -> Result<AudioResult> {
    settings.ensure_ready()?;

    let text = std::fs::read_to_string(text_file)?.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Other(format!(
            "text file is empty: {}",
            text_file.display()
        )));
    }

    let tts = ElevenLabsClient::new(settings)?;
    let merge = MergeStrategy::detect().await;
    let pipeline = Pipeline::new(settings, &tts, merge);

    let audio = pipeline
        .synthesize_to_file(&text, title, parse_pub_date(pub_date))
        .await?;

    Ok(AudioResult {
        audio_url: feed::build_audio_url(&settings.public_base_url, &audio.file_name),
        audio_path: audio.path.display().to_string(),
        audio_file: audio.file_name,
        audio_size_bytes: audio.size_bytes,
        chunks_processed: audio.chunks,
    })
}

#[derive(Debug, Serialize)]
pub struct UpdateFeedResult {
    pub episodes_count: usize,
    pub feed_path: String,
    pub state_path: String,
}

/// Append or replace one episode record, mark its guid processed, and
/// rebuild the feed document.
pub fn update_feed(settings: &Settings, record: EpisodeRecord) -> Result<UpdateFeedResult> {
    let mut store = Store::open(&settings.episodes_file, &settings.state_file)?;

    let guid = record.guid.clone();
    store.upsert_episode(record);
    store.mark_processed(&guid);

    feed::write_feed(
        store.episodes(),
        &FeedConfig::from_settings(settings),
        &settings.output_feed_file,
    )?;
    store.save()?;

    Ok(UpdateFeedResult {
        episodes_count: store.episode_count(),
        feed_path: settings.output_feed_file.display().to_string(),
        state_path: settings.state_file.display().to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct EpisodeListing {
    pub episodes: Vec<EpisodeRecord>,
    pub episode_count: usize,
    pub processed_guids_count: usize,
}

/// List the current catalog and processed-state counts.
pub fn list_episodes(settings: &Settings) -> Result<EpisodeListing> {
    let store = Store::open(&settings.episodes_file, &settings.state_file)?;
    Ok(EpisodeListing {
        episode_count: store.episode_count(),
        processed_guids_count: store.processed_count(),
        episodes: store.episodes().to_vec(),
    })
}

#[derive(Debug, Serialize)]
pub struct CleanupResult {
    pub removed: Vec<String>,
    pub removed_count: usize,
}

/// Remove orphaned per-chunk part files left by a crashed run.
pub fn cleanup(settings: &Settings) -> Result<CleanupResult> {
    let removed = sweep_orphans(&settings.output_audio_dir)?;
    Ok(CleanupResult {
        removed_count: removed.len(),
        removed,
    })
}
