//! ffmpeg/ffprobe wrapper that normalizes uploads for recognition.

use async_trait::async_trait;
use log::*;
use speech_ai::traits::media;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use uuid::Uuid;

/// Mono 48 kHz Opus, the encoding the recognizer is configured for.
const OPUS_OUTPUT_ARGS: [&str; 9] = [
    "-vn", "-acodec", "libopus", "-ar", "48000", "-ac", "1", "-b:a", "64k",
];

pub struct FfmpegProcessor {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegProcessor {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegProcessor {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    async fn run_ffmpeg(&self, args: Vec<OsString>) -> Result<(), speech_ai::Error> {
        let output = Command::new(&self.ffmpeg)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                warn!("Failed to start {}: {e}", self.ffmpeg.display());
                speech_ai::Error::Media(format!("ffmpeg failed: {e}"))
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(speech_ai::Error::Media(format!(
                "ffmpeg failed: {}: {}",
                output.status,
                combined.trim()
            )));
        }
        Ok(())
    }
}

pub(crate) fn transcode_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
    args.extend(OPUS_OUTPUT_ARGS.iter().map(OsString::from));
    args.push(output.into());
    args
}

pub(crate) fn probe_args(input: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(input.into());
    args
}

pub(crate) fn split_args(input: &Path, output: &Path, start: f64, chunk_secs: u32) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-i".into(),
        input.into(),
        "-ss".into(),
        format!("{start:.2}").into(),
        "-t".into(),
        chunk_secs.to_string().into(),
    ];
    args.extend(OPUS_OUTPUT_ARGS.iter().map(OsString::from));
    args.push(output.into());
    args
}

pub(crate) fn parse_duration(stdout: &str) -> Result<f64, speech_ai::Error> {
    stdout
        .trim()
        .parse::<f64>()
        .map_err(|e| speech_ai::Error::Media(format!("failed to parse duration: {e}")))
}

/// Start offsets of consecutive chunks covering `duration` seconds.
pub(crate) fn chunk_starts(duration: f64, chunk_secs: u32) -> Vec<f64> {
    if chunk_secs == 0 || !duration.is_finite() {
        return Vec::new();
    }
    let step = f64::from(chunk_secs);
    let mut starts = Vec::new();
    let mut start = 0.0;
    while start < duration {
        starts.push(start);
        start += step;
    }
    starts
}

pub(crate) fn chunk_file_name(start: f64) -> String {
    format!("{}_chunk_{}.ogg", Uuid::new_v4(), start as u64)
}

/// Best-effort removal of scratch files.
pub(crate) async fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove {}: {e}", path.display());
        }
    }
}

async fn ensure_dir(dir: &Path) -> Result<(), speech_ai::Error> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| speech_ai::Error::Media(format!("create {}: {e}", dir.display())))
}

#[async_trait]
impl media::Processor for FfmpegProcessor {
    async fn probe_duration(&self, input: &Path) -> Result<f64, speech_ai::Error> {
        let output = Command::new(&self.ffprobe)
            .args(probe_args(input))
            .output()
            .await
            .map_err(|e| speech_ai::Error::Media(format!("ffprobe failed: {e}")))?;

        if !output.status.success() {
            return Err(speech_ai::Error::Media(format!(
                "ffprobe failed: {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }

    async fn transcode(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, speech_ai::Error> {
        ensure_dir(out_dir).await?;
        let output = out_dir.join(format!("{}.ogg", Uuid::new_v4()));

        debug!("Transcoding {} to {}", input.display(), output.display());
        if let Err(e) = self.run_ffmpeg(transcode_args(input, &output)).await {
            if tokio::fs::try_exists(&output).await.unwrap_or(false) {
                remove_files(std::slice::from_ref(&output)).await;
            }
            return Err(e);
        }
        Ok(output)
    }

    async fn split(
        &self,
        input: &Path,
        out_dir: &Path,
        chunk_secs: u32,
    ) -> Result<Vec<PathBuf>, speech_ai::Error> {
        if chunk_secs == 0 {
            return Err(speech_ai::Error::Configuration(
                "chunk duration must be positive".to_string(),
            ));
        }
        let duration = self.probe_duration(input).await?;
        ensure_dir(out_dir).await?;

        let mut chunks = Vec::new();
        for start in chunk_starts(duration, chunk_secs) {
            let chunk = out_dir.join(chunk_file_name(start));
            let result = self
                .run_ffmpeg(split_args(input, &chunk, start, chunk_secs))
                .await;
            // ffmpeg may leave a partial file behind on failure
            chunks.push(chunk);
            if let Err(e) = result {
                remove_files(&chunks).await;
                return Err(speech_ai::Error::Media(format!("ffmpeg split failed: {e}")));
            }
        }

        debug!("Split {} into {} chunks", input.display(), chunks.len());
        Ok(chunks)
    }
}
