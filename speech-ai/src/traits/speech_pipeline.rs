//! Local speech pipeline provider trait.

use crate::types::diarization::Diarization;
use crate::types::pipeline::{PipelineOptions, PipelineResult};
use crate::types::text::{TextProcessing, TextProcessingRequest};
use crate::Error;
use async_trait::async_trait;
use std::path::Path;

/// Self-hosted ML service.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Transcribe, diarize and align in a single round trip.
    async fn transcribe_full(
        &self,
        audio: &Path,
        options: &PipelineOptions,
    ) -> Result<PipelineResult, Error>;

    /// Speaker turns only, no text.
    async fn diarize(&self, audio: &Path) -> Result<Diarization, Error>;

    /// Detect (and optionally strip) filler words.
    async fn process_text(&self, request: &TextProcessingRequest)
        -> Result<TextProcessing, Error>;

    /// Lightweight liveness probe.
    async fn health(&self) -> Result<(), Error>;
}
