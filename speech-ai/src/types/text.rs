//! Filler-word text processing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextProcessingRequest {
    pub text: String,
    pub detect_fillers: bool,
    pub remove_fillers: bool,
}

impl TextProcessingRequest {
    /// Detect fillers without rewriting the text.
    pub fn detect_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            detect_fillers: true,
            remove_fillers: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedSegment {
    pub text: String,
    #[serde(default)]
    pub has_fillers: bool,
    #[serde(default)]
    pub cleaned_text: String,
    #[serde(default)]
    pub fillers_found: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextProcessing {
    #[serde(default)]
    pub segments: Vec<ProcessedSegment>,
    #[serde(default)]
    pub total_fillers: u32,
}

impl TextProcessing {
    /// Every distinct filler reported across all segments, lowercased.
    pub fn fillers(&self) -> Vec<String> {
        let mut fillers: Vec<String> = self
            .segments
            .iter()
            .flat_map(|segment| segment.fillers_found.iter())
            .map(|filler| filler.to_lowercase())
            .collect();
        fillers.sort();
        fillers.dedup();
        fillers
    }
}
