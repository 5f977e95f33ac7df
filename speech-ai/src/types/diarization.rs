//! Speaker diarization results.

use serde::{Deserialize, Serialize};

/// One speaker turn. Times are seconds from the start of the audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiarizationSegment {
    pub speaker: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub duration: f64,
}

/// Speaker turns in chronological order, without text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diarization {
    pub segments: Vec<DiarizationSegment>,
    #[serde(default)]
    pub num_speakers: u32,
}
