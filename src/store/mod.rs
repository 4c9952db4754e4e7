//! Persistent episode catalog and processed-article state.

pub mod models;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::util::{load_json_or, save_json_atomic};

pub use models::*;

/// The episode collection plus the processed-guid set, backed by two JSON
/// files. Single-writer: exactly one run owns a given project root at a
/// time.
pub struct Store {
    episodes_file: PathBuf,
    state_file: PathBuf,
    episodes: Vec<EpisodeRecord>,
    processed: BTreeSet<String>,
}

impl Store {
    /// Load both files, defaulting to empty when absent.
    pub fn open(episodes_file: &Path, state_file: &Path) -> Result<Self> {
        let episodes: Vec<EpisodeRecord> = load_json_or(episodes_file, Vec::new())?;
        let state: ProcessedState = load_json_or(state_file, ProcessedState::default())?;

        Ok(Self {
            episodes_file: episodes_file.to_path_buf(),
            state_file: state_file.to_path_buf(),
            episodes,
            processed: state.processed_guids.into_iter().collect(),
        })
    }

    pub fn episodes(&self) -> &[EpisodeRecord] {
        &self.episodes
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }

    pub fn processed_guids(&self) -> &BTreeSet<String> {
        &self.processed
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    pub fn is_processed(&self, guid: &str) -> bool {
        self.processed.contains(guid)
    }

    /// Record a guid as handled. Idempotent; guids are never removed.
    pub fn mark_processed(&mut self, guid: &str) {
        self.processed.insert(guid.to_string());
    }

    /// Append a record, replacing any prior record with the same guid so
    /// re-publishing an article never duplicates it.
    pub fn upsert_episode(&mut self, record: EpisodeRecord) {
        self.episodes.retain(|ep| ep.guid != record.guid);
        self.episodes.push(record);
    }

    /// Write both files, each atomically (temp sibling + rename). The two
    /// files are independent; there is no cross-file transaction.
    pub fn save(&self) -> Result<()> {
        save_json_atomic(&self.episodes_file, &self.episodes)?;
        let state = ProcessedState {
            processed_guids: self.processed.iter().cloned().collect(),
        };
        save_json_atomic(&self.state_file, &state)?;
        Ok(())
    }

    pub fn episodes_path(&self) -> &Path {
        &self.episodes_file
    }

    pub fn state_path(&self) -> &Path {
        &self.state_file
    }
}
