//! Environment-sourced configuration.
//!
//! All environment reads happen here, once, at process start. Components
//! receive an explicit [`Settings`] value and never consult ambient state.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

pub const DEFAULT_FEED_URL: &str = "https://ovidiueftimie.substack.com/feed";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3_44100_128";
pub const DEFAULT_TEXT_LIMIT: usize = 4500;
pub const DEFAULT_MAX_POSTS: usize = 3;

/// Feed-level podcast metadata for the rendered RSS document.
#[derive(Debug, Clone)]
pub struct PodcastMeta {
    pub title: String,
    pub description: String,
    pub link: String,
    pub author: String,
    pub email: String,
    pub language: String,
    pub image_url: String,
}

/// Resolved configuration for one run, constructed once in `main`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub voice_id: String,
    pub model_id: String,
    pub output_format: String,
    pub text_limit: usize,

    pub feed_url: String,
    pub max_posts: usize,
    pub target_selectors: Vec<String>,
    pub target_include_processed: bool,

    pub public_base_url: String,
    pub state_file: PathBuf,
    pub episodes_file: PathBuf,
    pub output_audio_dir: PathBuf,
    pub output_feed_file: PathBuf,

    pub podcast: PodcastMeta,
}

impl Settings {
    /// Build settings from the process environment, with paths resolved
    /// against `project_root`. Credentials may be absent here so that
    /// state-only commands work before setup; anything that talks to the
    /// network calls [`Settings::ensure_ready`] first.
    pub fn from_env(project_root: &Path) -> Result<Self> {
        let api_key = env("ELEVENLABS_API_KEY", "");
        let voice_id = env("ELEVENLABS_VOICE_ID", "");
        let public_base_url = env("PUBLIC_BASE_URL", "");

        let text_limit = env("ELEVENLABS_TEXT_LIMIT", "")
            .parse::<usize>()
            .unwrap_or(DEFAULT_TEXT_LIMIT);
        if text_limit == 0 {
            return Err(AppError::Config(
                "ELEVENLABS_TEXT_LIMIT must be greater than zero".to_string(),
            ));
        }

        let max_posts = env("MAX_POSTS_PER_RUN", "")
            .parse::<usize>()
            .unwrap_or(DEFAULT_MAX_POSTS);

        Ok(Settings {
            api_key,
            voice_id,
            model_id: env("ELEVENLABS_MODEL_ID", DEFAULT_MODEL_ID),
            output_format: env("ELEVENLABS_OUTPUT_FORMAT", DEFAULT_OUTPUT_FORMAT),
            text_limit,
            feed_url: env("SUBSTACK_FEED_URL", DEFAULT_FEED_URL),
            max_posts,
            target_selectors: parse_csv(&env("TARGET_ARTICLES", "")),
            target_include_processed: parse_bool(&env("TARGET_INCLUDE_PROCESSED", "true")),
            public_base_url,
            state_file: project_root.join(env("STATE_FILE", "data/state.json")),
            episodes_file: project_root.join(env("EPISODES_FILE", "data/episodes.json")),
            output_audio_dir: project_root.join(env("OUTPUT_AUDIO_DIR", "output/public/audio")),
            output_feed_file: project_root.join(env("OUTPUT_FEED_FILE", "output/public/feed.xml")),
            podcast: PodcastMeta {
                title: env("PODCAST_TITLE", "Substack Audio"),
                description: env("PODCAST_DESCRIPTION", "Audio versions of Substack posts."),
                link: env("PODCAST_LINK", ""),
                author: env("PODCAST_AUTHOR", ""),
                email: env("PODCAST_EMAIL", ""),
                language: env("PODCAST_LANGUAGE", "en"),
                image_url: env("PODCAST_IMAGE_URL", ""),
            },
        })
    }

    /// Fatal configuration check for commands that synthesize audio or
    /// publish: reported before any network activity.
    pub fn ensure_ready(&self) -> Result<()> {
        if self.api_key.is_empty() || self.voice_id.is_empty() {
            return Err(AppError::Config(
                "missing ELEVENLABS_API_KEY or ELEVENLABS_VOICE_ID".to_string(),
            ));
        }
        if self.public_base_url.is_empty() {
            return Err(AppError::Config("missing PUBLIC_BASE_URL".to_string()));
        }
        Ok(())
    }
}

fn env(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load a `.env` file into the process environment. Lines are `KEY=VALUE`;
/// values already present in the environment win. Missing file is fine.
pub fn load_dotenv(path: &Path) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if !key.is_empty() && std::env::var(key).is_err() {
            std::env::set_var(key, value);
        }
    }
}

// ── Setup readiness report ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct EnvVarHelp {
    pub env_var: String,
    pub label: String,
    pub help: String,
}

/// Result of the `setup-check` command: which required and recommended
/// variables are present, with key values masked.
#[derive(Debug, Serialize)]
pub struct SetupStatus {
    pub ready: bool,
    pub missing: Vec<EnvVarHelp>,
    pub warnings: Vec<EnvVarHelp>,
    pub config: BTreeMap<String, String>,
    pub voice_model: String,
}

const REQUIRED_VARS: [(&str, &str, &str); 3] = [
    (
        "ELEVENLABS_API_KEY",
        "ElevenLabs API key",
        "Sign up at elevenlabs.io, go to Profile > API Keys, and copy your key.",
    ),
    (
        "ELEVENLABS_VOICE_ID",
        "ElevenLabs Voice ID",
        "In ElevenLabs, go to Voices, pick a voice, and copy the Voice ID from the URL or settings.",
    ),
    (
        "PUBLIC_BASE_URL",
        "Public base URL for audio files",
        "The URL where your podcast files will be hosted (e.g. https://yourname.github.io/my-podcast).",
    ),
];

const RECOMMENDED_VARS: [(&str, &str, &str); 6] = [
    (
        "PODCAST_TITLE",
        "Podcast title",
        "The name of your podcast as it appears in Spotify/Apple Podcasts.",
    ),
    (
        "PODCAST_AUTHOR",
        "Podcast author name",
        "Your name or pen name.",
    ),
    (
        "PODCAST_DESCRIPTION",
        "Podcast description",
        "A short description of your podcast for directories.",
    ),
    (
        "PODCAST_LINK",
        "Podcast website link",
        "URL to your Substack or podcast website.",
    ),
    (
        "PODCAST_EMAIL",
        "Contact email",
        "Email shown in podcast directories.",
    ),
    (
        "PODCAST_IMAGE_URL",
        "Podcast cover image URL",
        "URL to a square image (1400x1400 min, 3000x3000 max) for podcast directories.",
    ),
];

/// Inspect the environment without failing on missing values; this is the
/// one command that must work before the user has configured anything.
pub fn setup_report() -> SetupStatus {
    let mut missing = Vec::new();
    let mut warnings = Vec::new();
    let mut config = BTreeMap::new();

    for (name, label, help) in REQUIRED_VARS {
        let value = env(name, "");
        if value.is_empty() {
            missing.push(EnvVarHelp {
                env_var: name.to_string(),
                label: label.to_string(),
                help: help.to_string(),
            });
        } else {
            let shown = if name.contains("KEY") {
                "***".to_string()
            } else {
                value
            };
            config.insert(name.to_string(), shown);
        }
    }

    for (name, label, help) in RECOMMENDED_VARS {
        let value = env(name, "");
        if value.is_empty() {
            warnings.push(EnvVarHelp {
                env_var: name.to_string(),
                label: label.to_string(),
                help: help.to_string(),
            });
        } else {
            config.insert(name.to_string(), value);
        }
    }

    SetupStatus {
        ready: missing.is_empty(),
        missing,
        warnings,
        config,
        voice_model: env("ELEVENLABS_MODEL_ID", DEFAULT_MODEL_ID),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("1"));
        assert!(parse_bool(" Yes "));
        assert!(parse_bool("ON"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
        assert!(!parse_bool("maybe"));
    }

    #[test]
    fn test_parse_csv() {
        assert_eq!(parse_csv("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_csv(""), Vec::<String>::new());
        assert_eq!(parse_csv(" , ,"), Vec::<String>::new());
        assert_eq!(parse_csv("title:Launch"), vec!["title:Launch"]);
    }
}
