//! Speech synthesis via the ElevenLabs REST API.

pub mod chunk;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::Settings;

const API_BASE_URL: &str = "https://api.elevenlabs.io";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Synthesis failure classes. Retry policy matches on these: rate limits,
/// server errors, and transport faults are retryable; a rejected key is not.
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("speech API rejected credentials (HTTP {status}): check the API key")]
    Auth { status: StatusCode },

    #[error("speech API rate limit hit")]
    RateLimited,

    #[error("speech API server error (HTTP {status})")]
    Server { status: StatusCode },

    #[error("speech API returned HTTP {status}: {body}")]
    Unexpected { status: StatusCode, body: String },

    #[error("speech API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl TtsError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            TtsError::RateLimited | TtsError::Server { .. } | TtsError::Transport(_)
        )
    }
}

/// The one seam the pipeline needs from a TTS provider: bounded text in,
/// raw audio bytes out.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError>;
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// ElevenLabs client for the text-to-speech endpoint.
pub struct ElevenLabsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    voice_id: String,
    model_id: String,
    output_format: String,
}

impl ElevenLabsClient {
    pub fn new(settings: &Settings) -> Result<Self, TtsError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
            api_key: settings.api_key.clone(),
            voice_id: settings.voice_id.clone(),
            model_id: settings.model_id.clone(),
            output_format: settings.output_format.clone(),
        })
    }

    /// Single synthesis attempt, streaming the audio body into memory.
    async fn try_synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        let url = format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.base_url, self.voice_id, self.output_format
        );

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&SynthesisRequest {
                text,
                model_id: &self.model_id,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TtsError::Auth { status },
                StatusCode::TOO_MANY_REQUESTS => TtsError::RateLimited,
                s if s.is_server_error() => TtsError::Server { status },
                _ => {
                    let body = response.text().await.unwrap_or_default();
                    TtsError::Unexpected {
                        status,
                        body: body.chars().take(200).collect(),
                    }
                }
            });
        }

        let mut audio = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(part) = stream.next().await {
            audio.extend_from_slice(&part?);
        }
        Ok(audio)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    /// Synthesize with bounded retries and increasing backoff for transient
    /// failures. Credential errors surface immediately.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        let backoff_delays = [2u64, 8, 30];

        for attempt in 0..=backoff_delays.len() {
            match self.try_synthesize(text).await {
                Ok(audio) => return Ok(audio),
                Err(e) if e.is_retryable() && attempt < backoff_delays.len() => {
                    let delay = backoff_delays[attempt];
                    log::warn!(
                        "synthesis attempt {} failed, retrying in {}s: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }

        unreachable!()
    }
}
