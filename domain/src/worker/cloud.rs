//! Cloud speech pipeline: the recognition strategy adapts to the audio duration.
//!
//! Short audio is recognized in one synchronous call. Long audio goes through object
//! storage and a polled long-running operation when storage is configured, and is cut into
//! fixed-length chunks recognized one by one otherwise. When the ML service is available
//! its diarization is layered on top of whichever text the recognizer produced.

use super::backoff::{poll_until, PollError};
use super::error::TaskFailure;
use super::pipeline::{Collaborators, Completion, Pipeline, PipelineSettings};
use super::segments;
use crate::gateway::object_storage::object_key;
use crate::task_store::TaskStore;
use crate::transcription_provider::TranscriptionProvider;
use crate::transcription_segment::{join_texts, SegmentInput};
use crate::transcription_task::PendingTask;
use async_trait::async_trait;
use log::*;
use speech_ai::traits::{media, object_storage, recognition, speech_pipeline};
use speech_ai::types::recognition::{LongRunningOperation, OperationState};
use speech_ai::types::text::{TextProcessing, TextProcessingRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const SHUTDOWN: &str = "worker shutting down";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Strategy {
    Sync,
    Async,
    Chunked,
}

impl Strategy {
    fn provider(self) -> TranscriptionProvider {
        match self {
            Strategy::Sync => TranscriptionProvider::CloudSpeechSync,
            Strategy::Async => TranscriptionProvider::CloudSpeechAsync,
            Strategy::Chunked => TranscriptionProvider::CloudSpeechChunked,
        }
    }
}

/// Picks the recognition path. An unknown duration counts as long.
pub(crate) fn select_strategy(duration: Option<f64>, threshold: f64, has_storage: bool) -> Strategy {
    match duration {
        Some(seconds) if seconds <= threshold => Strategy::Sync,
        _ if has_storage => Strategy::Async,
        _ => Strategy::Chunked,
    }
}

pub struct CloudSpeechPipeline {
    recognizer: Arc<dyn recognition::Provider>,
    store: Arc<dyn TaskStore>,
    ml: Option<Arc<dyn speech_pipeline::Provider>>,
    storage: Option<Arc<dyn object_storage::Provider>>,
    media: Arc<dyn media::Processor>,
    settings: PipelineSettings,
}

impl CloudSpeechPipeline {
    pub fn new(
        recognizer: Arc<dyn recognition::Provider>,
        collaborators: Collaborators,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            recognizer,
            store: collaborators.store,
            ml: collaborators.ml,
            storage: collaborators.storage,
            media: collaborators.media,
            settings,
        }
    }

    fn language_for<'a>(&'a self, task: &'a PendingTask) -> &'a str {
        task.language
            .as_deref()
            .filter(|language| !language.trim().is_empty())
            .unwrap_or(&self.settings.language)
    }

    async fn transcribe(
        &self,
        task: &PendingTask,
        audio: &Path,
        duration: Option<f64>,
        cancel: &CancellationToken,
    ) -> Result<Completion, TaskFailure> {
        let language = self.language_for(task);
        let strategy = select_strategy(
            duration,
            self.settings.short_audio_threshold_secs,
            self.storage.is_some(),
        );
        info!(
            "Task {}: {:?} recognition via {} (language {language})",
            task.id,
            strategy,
            self.recognizer.provider_id()
        );

        let text = match strategy {
            Strategy::Sync => self.recognizer.recognize(audio, language).await,
            Strategy::Async => self.recognize_async(task, audio, language, cancel).await,
            Strategy::Chunked => self.recognize_chunked(task, audio, language, cancel).await,
        }
        .map_err(TaskFailure::Recognition)?;

        if let Some(ml) = &self.ml {
            self.diarize_and_save(task, ml.as_ref(), audio, &text).await;
        }

        Ok(Completion {
            transcript_text: text,
            provider: strategy.provider(),
        })
    }

    async fn recognize_async(
        &self,
        task: &PendingTask,
        audio: &Path,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<String, speech_ai::Error> {
        let storage = self.storage.as_ref().ok_or_else(|| {
            speech_ai::Error::Configuration("object storage is not configured".to_string())
        })?;

        let key = object_key(task.id, audio);
        let uri = storage.put_file(&key, audio).await?;
        debug!("Task {}: uploaded audio to {uri}", task.id);

        let result = self.await_operation(task, &uri, language, cancel).await;

        if let Err(e) = storage.delete(&key).await {
            warn!("Task {}: failed to delete uploaded object {key}: {e}", task.id);
        }
        result
    }

    async fn await_operation(
        &self,
        task: &PendingTask,
        uri: &str,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<String, speech_ai::Error> {
        let operation_id = self.recognizer.start_long_running(uri, language).await?;
        info!("Task {}: waiting for operation {operation_id}", task.id);

        let recognizer = &self.recognizer;
        let id = operation_id.as_str();
        let polled = poll_until(
            &self.settings.backoff,
            cancel,
            move || recognizer.get_operation(id),
            LongRunningOperation::is_done,
            speech_ai::Error::is_transient,
        )
        .await;

        match polled {
            Ok(operation) => match operation.state {
                OperationState::Succeeded { text } => Ok(text),
                OperationState::Failed { message } => Err(speech_ai::Error::Provider(message)),
                OperationState::Running => Err(speech_ai::Error::Provider(format!(
                    "operation {operation_id} is still running"
                ))),
            },
            Err(PollError::Exhausted { attempts }) => Err(speech_ai::Error::Timeout(format!(
                "operation timed out after {attempts} attempts"
            ))),
            Err(PollError::Cancelled) => Err(speech_ai::Error::Cancelled(SHUTDOWN.to_string())),
            Err(PollError::Failed(e)) => Err(e),
        }
    }

    async fn recognize_chunked(
        &self,
        task: &PendingTask,
        audio: &Path,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<String, speech_ai::Error> {
        let chunks = self
            .media
            .split(audio, &self.settings.work_dir, self.settings.chunk_duration_secs)
            .await?;
        info!("Task {}: recognizing {} chunks", task.id, chunks.len());

        let result = self.recognize_chunks(task, &chunks, language, cancel).await;

        for chunk in &chunks {
            discard(chunk).await;
        }
        result
    }

    async fn recognize_chunks(
        &self,
        task: &PendingTask,
        chunks: &[PathBuf],
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<String, speech_ai::Error> {
        let mut texts = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(speech_ai::Error::Cancelled(SHUTDOWN.to_string()));
            }
            let text = self.recognizer.recognize(chunk, language).await.map_err(|e| {
                warn!("Task {}: chunk {} of {} failed: {e}", task.id, index + 1, chunks.len());
                e
            })?;
            texts.push(text);
        }
        Ok(join_texts(texts.iter().map(String::as_str)))
    }

    async fn diarize_and_save(
        &self,
        task: &PendingTask,
        ml: &dyn speech_pipeline::Provider,
        audio: &Path,
        text: &str,
    ) {
        info!("Task {}: starting diarization", task.id);

        let diarization = match ml.diarize(audio).await {
            Ok(diarization) if !diarization.segments.is_empty() => diarization,
            Ok(_) => {
                warn!("Task {}: diarization found no speaker turns", task.id);
                return self.save_single_segment(task, ml, text).await;
            }
            Err(e) => {
                warn!("Task {}: diarization failed (non-fatal): {e}", task.id);
                return self.save_single_segment(task, ml, text).await;
            }
        };
        info!(
            "Task {}: diarization found {} speakers, {} segments",
            task.id,
            diarization.num_speakers,
            diarization.segments.len()
        );

        match serde_json::to_string(&diarization) {
            Ok(raw) => {
                if let Err(e) = self.store.save_speaker_data(task.id, raw).await {
                    warn!("Task {}: failed to save speaker data: {e}", task.id);
                }
            }
            Err(e) => warn!("Task {}: failed to encode speaker data: {e}", task.id),
        }

        let fillers = detect_fillers(task, ml, text)
            .await
            .map(|processed| processed.fillers())
            .unwrap_or_default();

        for segment in segments::from_diarization(text, &diarization, &fillers) {
            self.insert(task, segment).await;
        }
    }

    async fn save_single_segment(
        &self,
        task: &PendingTask,
        ml: &dyn speech_pipeline::Provider,
        text: &str,
    ) {
        let has_fillers = detect_fillers(task, ml, text)
            .await
            .is_some_and(|processed| processed.total_fillers > 0);
        self.insert(task, segments::single(text, has_fillers)).await;
    }

    async fn insert(&self, task: &PendingTask, segment: SegmentInput) {
        if let Err(e) = self.store.insert_segment(task.id, segment).await {
            warn!("Task {}: failed to save segment: {e}", task.id);
        }
    }
}

async fn detect_fillers(
    task: &PendingTask,
    ml: &dyn speech_pipeline::Provider,
    text: &str,
) -> Option<TextProcessing> {
    if text.trim().is_empty() {
        return None;
    }
    match ml.process_text(&TextProcessingRequest::detect_only(text)).await {
        Ok(processed) => Some(processed),
        Err(e) => {
            warn!("Task {}: text processing failed (non-fatal): {e}", task.id);
            None
        }
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove {}: {e}", path.display());
        }
    }
}

#[async_trait]
impl Pipeline for CloudSpeechPipeline {
    async fn process(
        &self,
        task: &PendingTask,
        cancel: &CancellationToken,
    ) -> Result<Completion, TaskFailure> {
        let input = Path::new(&task.storage_path);

        let duration = match self.media.probe_duration(input).await {
            Ok(seconds) => {
                debug!("Task {}: audio duration {seconds:.2}s", task.id);
                Some(seconds)
            }
            Err(e) => {
                warn!("Task {}: duration probe failed, treating audio as long: {e}", task.id);
                None
            }
        };

        let audio = self
            .media
            .transcode(input, &self.settings.work_dir)
            .await
            .map_err(TaskFailure::Transcode)?;

        let outcome = self.transcribe(task, &audio, duration, cancel).await;
        discard(&audio).await;
        outcome
    }
}
