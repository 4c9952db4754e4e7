//! Batch orchestration: selection, synthesis, assembly, catalog updates.


use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::audio::MergeStrategy;
use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::feed::{self, FeedConfig};
use crate::fetch::Article;
use crate::html;
use crate::select::{self, SelectionMode, Selector};
use crate::store::{EpisodeRecord, Store};
use crate::tts::chunk::chunk_text;
use crate::tts::SpeechSynthesizer;
use crate::util::slugify;

/// Outcome of one batch run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub episodes_total: usize,
    pub feed_path: String,
    pub state_path: String,
}

/// Final audio produced for one article.
#[derive(Debug)]
pub struct AudioOutput {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub chunks: usize,
}

enum ArticleStatus {
    Published,
    SkippedEmpty,
}

pub struct Pipeline<'a> {
    settings: &'a Settings,
    tts: &'a dyn SpeechSynthesizer,
    merge: MergeStrategy,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: &'a Settings,
        tts: &'a dyn SpeechSynthesizer,
        merge: MergeStrategy,
    ) -> Self {
        Self {
            settings,
            tts,
            merge,
        }
    }

    /// The selection mode for this run: targeted when selectors are
    /// configured, incremental otherwise. A configured selector that parses
    /// to nothing still keeps the run targeted (matching no articles)
    /// rather than silently processing the whole backlog.
    pub fn selection_mode(&self) -> SelectionMode {
        if self.settings.target_selectors.is_empty() {
            return SelectionMode::Incremental {
                max_count: self.settings.max_posts,
            };
        }

        SelectionMode::Targeted {
            selectors: self
                .settings
                .target_selectors
                .iter()
                .filter_map(|raw| Selector::parse(raw))
                .collect(),
            include_processed: self.settings.target_include_processed,
        }
    }

    /// Process a batch of candidate articles.
    ///
    /// Articles are handled one at a time; a failure is contained to its
    /// article and the batch continues. The store is checkpointed after
    /// every article so a crash never forgets finished work, and the feed
    /// is re-rendered from the full catalog at the end.
    pub async fn run(&self, store: &mut Store, articles: &[Article]) -> Result<RunSummary> {
        std::fs::create_dir_all(&self.settings.output_audio_dir)?;

        let orphans = sweep_orphans(&self.settings.output_audio_dir)?;
        if !orphans.is_empty() {
            log::info!("removed {} orphaned part file(s) from a prior run", orphans.len());
        }

        let mode = self.selection_mode();
        if let SelectionMode::Targeted { selectors, .. } = &mode {
            log::info!("cherry-pick mode enabled with {} selector(s)", selectors.len());
        }
        let selected = select::select(articles, store.processed_guids(), &mode);
        if selected.is_empty() {
            log::info!("no posts to process");
        }

        let mut processed = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;

        for article in &selected {
            match self.process_article(store, article).await {
                Ok(ArticleStatus::Published) => processed += 1,
                Ok(ArticleStatus::SkippedEmpty) => skipped += 1,
                Err(e) => {
                    log::error!("failed to process \"{}\": {}", article.title, e);
                    failed += 1;
                }
            }
        }

        feed::write_feed(
            store.episodes(),
            &FeedConfig::from_settings(self.settings),
            &self.settings.output_feed_file,
        )?;
        store.save()?;

        log::info!(
            "run finished: {} processed, {} skipped, {} failed, {} episodes tracked",
            processed,
            skipped,
            failed,
            store.episode_count()
        );

        Ok(RunSummary {
            processed,
            skipped,
            failed,
            episodes_total: store.episode_count(),
            feed_path: self.settings.output_feed_file.display().to_string(),
            state_path: store.state_path().display().to_string(),
        })
    }

    async fn process_article(&self, store: &mut Store, article: &Article) -> Result<ArticleStatus> {
        log::info!("generating audio for: {}", article.title);

        let text = html::strip_html_to_text(&article.content_html);
        if text.is_empty() {
            // Deliberate terminal state: processed, nothing to publish.
            log::info!("skipping (empty content): {}", article.title);
            store.mark_processed(&article.guid);
            store.save()?;
            return Ok(ArticleStatus::SkippedEmpty);
        }

        let audio = self
            .synthesize_to_file(&text, &article.title, article.published)
            .await?;

        let mut description = html::strip_html_to_text(&article.description_html);
        if description.is_empty() {
            description = html::excerpt(&text, 250);
        }

        store.upsert_episode(EpisodeRecord {
            guid: article.guid.clone(),
            title: article.title.clone(),
            description,
            author: article.author.clone(),
            link: article.link.clone(),
            pub_date_iso: article.published.to_rfc3339(),
            audio_url: feed::build_audio_url(&self.settings.public_base_url, &audio.file_name),
            audio_file: audio.file_name,
            audio_size_bytes: audio.size_bytes,
        });
        store.mark_processed(&article.guid);
        store.save()?;

        Ok(ArticleStatus::Published)
    }

    /// Chunk text, synthesize each chunk to a part file, and assemble the
    /// parts into the final per-article audio file. Part files never
    /// survive this call: they are deleted after assembly and on every
    /// failure path.
    pub async fn synthesize_to_file(
        &self,
        text: &str,
        title: &str,
        published: DateTime<Utc>,
    ) -> Result<AudioOutput> {
        let chunks = chunk_text(text, self.settings.text_limit);
        if chunks.is_empty() {
            return Err(AppError::Other("no text chunks to synthesize".to_string()));
        }

        let base_name = format!("{}-{}", published.format("%Y-%m-%d"), slugify(title));
        let output_dir = &self.settings.output_audio_dir;
        tokio::fs::create_dir_all(output_dir).await?;

        let mut part_files: Vec<PathBuf> = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            log::info!("  chunk {}/{}", idx + 1, chunks.len());

            let audio_bytes = match self.tts.synthesize(chunk).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    remove_files(&part_files).await;
                    return Err(e.into());
                }
            };

            let part_path = output_dir.join(format!("{}.part{}.mp3", base_name, idx + 1));
            if let Err(e) = tokio::fs::write(&part_path, &audio_bytes).await {
                let _ = tokio::fs::remove_file(&part_path).await;
                remove_files(&part_files).await;
                return Err(e.into());
            }
            part_files.push(part_path);
        }

        let final_path = output_dir.join(format!("{}.mp3", base_name));
        let size_bytes = match self.merge.assemble(&part_files, &final_path).await {
            Ok(size) => size,
            Err(e) => {
                remove_files(&part_files).await;
                return Err(e);
            }
        };
        remove_files(&part_files).await;

        Ok(AudioOutput {
            file_name: format!("{}.mp3", base_name),
            path: final_path,
            size_bytes,
            chunks: chunks.len(),
        })
    }
}

async fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            log::warn!("failed to remove part file {}: {}", path.display(), e);
        }
    }
}

fn part_file_re() -> &'static Regex {
    static PART_FILE_RE: OnceLock<Regex> = OnceLock::new();
    PART_FILE_RE.get_or_init(|| Regex::new(r"\.part\d+\.mp3$").expect("valid regex"))
}

/// Delete leftover per-chunk part files in the audio output directory.
/// Returns the removed file names.
pub fn sweep_orphans(output_dir: &Path) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    if !output_dir.exists() {
        return Ok(removed);
    }

    for entry in std::fs::read_dir(output_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if part_file_re().is_match(&name) {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed.push(name),
                Err(e) => {
                    log::warn!("failed to remove orphan {}: {}", name, e);
                    removed.push(format!("{} (failed: {})", name, e));
                }
            }
        }
    }

    Ok(removed)
}
