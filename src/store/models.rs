use serde::{Deserialize, Serialize};

/// Durable catalog entry for one published episode. Field names are the
/// on-disk JSON layout of `episodes.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub guid: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub link: String,
    pub pub_date_iso: String,
    pub audio_file: String,
    pub audio_url: String,
    pub audio_size_bytes: u64,
}

/// On-disk layout of `state.json`: the set of article guids already handled,
/// kept sorted for stable diffs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessedState {
    #[serde(default)]
    pub processed_guids: Vec<String>,
}
