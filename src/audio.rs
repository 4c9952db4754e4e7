//! Joining per-chunk audio files into one episode file.

use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::error::{AppError, Result};

/// How chunk audio gets merged. Probed once at startup; `assemble` never
/// branches on tool availability itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Lossless container-level concat via ffmpeg's concat demuxer.
    FfmpegConcat,
    /// Raw ordered byte append. MPEG audio frames tolerate this; it is a
    /// best-effort fallback, not guaranteed gapless.
    ByteConcat,
}

impl MergeStrategy {
    /// Probe for ffmpeg and pick the best available strategy.
    pub async fn detect() -> Self {
        let probe = Command::new("ffmpeg")
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await;

        match probe {
            Ok(status) if status.success() => {
                log::info!("ffmpeg available, using lossless concat");
                MergeStrategy::FfmpegConcat
            }
            _ => {
                log::info!("ffmpeg not available, falling back to byte concatenation");
                MergeStrategy::ByteConcat
            }
        }
    }

    /// Join `parts` (same codec, in playback order) into `output`.
    /// Returns the byte size of the final file.
    pub async fn assemble(self, parts: &[PathBuf], output: &Path) -> Result<u64> {
        if parts.is_empty() {
            return Err(AppError::Audio("no audio parts to assemble".to_string()));
        }

        if parts.len() == 1 {
            tokio::fs::copy(&parts[0], output).await?;
        } else {
            match self {
                MergeStrategy::FfmpegConcat => ffmpeg_concat(parts, output).await?,
                MergeStrategy::ByteConcat => byte_concat(parts, output).await?,
            }
        }

        let meta = tokio::fs::metadata(output).await?;
        Ok(meta.len())
    }
}

async fn ffmpeg_concat(parts: &[PathBuf], output: &Path) -> Result<()> {
    // The list file must outlive the child process; NamedTempFile deletes
    // on drop.
    let mut list_file = tempfile::NamedTempFile::new()?;
    for part in parts {
        let absolute = std::fs::canonicalize(part)?;
        writeln!(list_file, "file '{}'", absolute.display())?;
    }
    list_file.flush()?;

    let result = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "concat",
            "-safe",
            "0",
            "-i",
        ])
        .arg(list_file.path())
        .args(["-c", "copy"])
        .arg(output)
        .output()
        .await
        .map_err(|e| AppError::Audio(format!("failed to spawn ffmpeg: {}", e)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(AppError::Audio(format!(
            "ffmpeg concat failed with status {}: {}",
            result.status,
            stderr.lines().last().unwrap_or("")
        )));
    }
    Ok(())
}

async fn byte_concat(parts: &[PathBuf], output: &Path) -> Result<()> {
    let mut joined = Vec::new();
    for part in parts {
        let bytes = tokio::fs::read(part).await?;
        joined.extend_from_slice(&bytes);
    }
    tokio::fs::write(output, joined).await?;
    Ok(())
}
