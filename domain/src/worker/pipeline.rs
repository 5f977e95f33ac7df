//! Provider routing: one pipeline per deployment, chosen from configuration.

use super::backoff::Backoff;
use super::cloud::CloudSpeechPipeline;
use super::error::TaskFailure;
use super::local::LocalMlPipeline;
use crate::task_store::TaskStore;
use crate::transcription_provider::TranscriptionProvider;
use crate::transcription_task::PendingTask;
use async_trait::async_trait;
use log::*;
use service::config::ProviderKind;
use speech_ai::traits::{media, object_storage, recognition, speech_pipeline};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What a pipeline hands back to the scheduler on success.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub transcript_text: String,
    /// The variant that actually produced the text
    pub provider: TranscriptionProvider,
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn process(
        &self,
        task: &PendingTask,
        cancel: &CancellationToken,
    ) -> Result<Completion, TaskFailure>;
}

/// Fails every task because the configured provider has no client.
pub struct MissingPipeline {
    message: String,
}

impl MissingPipeline {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Pipeline for MissingPipeline {
    async fn process(
        &self,
        _task: &PendingTask,
        _cancel: &CancellationToken,
    ) -> Result<Completion, TaskFailure> {
        Err(TaskFailure::NotConfigured(self.message.clone()))
    }
}

/// Clients available to the pipelines. Optional ones are absent when not configured.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn TaskStore>,
    pub recognizer: Option<Arc<dyn recognition::Provider>>,
    pub ml: Option<Arc<dyn speech_pipeline::Provider>>,
    pub storage: Option<Arc<dyn object_storage::Provider>>,
    pub media: Arc<dyn media::Processor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub work_dir: PathBuf,
    /// Used when a task carries no language of its own
    pub language: String,
    pub short_audio_threshold_secs: f64,
    pub chunk_duration_secs: u32,
    pub backoff: Backoff,
}

pub fn build(
    kind: ProviderKind,
    collaborators: Collaborators,
    settings: PipelineSettings,
) -> Arc<dyn Pipeline> {
    match kind {
        ProviderKind::LocalMl => match collaborators.ml {
            Some(ml) => Arc::new(LocalMlPipeline::new(collaborators.store, ml)),
            None => {
                warn!("Provider {kind} selected but ML_SERVICE_URL is not set; tasks will fail");
                Arc::new(MissingPipeline::new("local ML service is not configured"))
            }
        },
        ProviderKind::CloudSpeech => match collaborators.recognizer.clone() {
            Some(recognizer) => Arc::new(CloudSpeechPipeline::new(
                recognizer,
                collaborators,
                settings,
            )),
            None => {
                warn!("Provider {kind} selected without a speech client; tasks will fail");
                Arc::new(MissingPipeline::new("cloud speech client is not configured"))
            }
        },
    }
}
