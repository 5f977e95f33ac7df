//! Full local pipeline: transcription, diarization and alignment in one call.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOptions {
    /// Language hint; `None` lets the pipeline detect it
    pub language: Option<String>,
    pub num_speakers: Option<u32>,
    pub detect_fillers: bool,
}

/// A speaker-attributed, already-aligned piece of transcript. Times are seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSegment {
    #[serde(default)]
    pub speaker: Option<String>,
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub has_fillers: bool,
    #[serde(default)]
    pub fillers_found: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    #[serde(default)]
    pub language: Option<String>,
    pub full_text: String,
    #[serde(default)]
    pub segments: Vec<PipelineSegment>,
    #[serde(default)]
    pub num_speakers: u32,
    #[serde(default)]
    pub processing_time_seconds: f64,
}
