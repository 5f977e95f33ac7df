//! Local ML pipeline: a single call returns text, speakers and aligned timings.

use super::error::TaskFailure;
use super::pipeline::{Completion, Pipeline};
use super::segments::seconds_to_ms;
use crate::task_store::TaskStore;
use crate::transcription_provider::TranscriptionProvider;
use crate::transcription_segment::SegmentInput;
use crate::transcription_task::PendingTask;
use async_trait::async_trait;
use log::*;
use speech_ai::traits::speech_pipeline;
use speech_ai::types::pipeline::PipelineOptions;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct LocalMlPipeline {
    store: Arc<dyn TaskStore>,
    ml: Arc<dyn speech_pipeline::Provider>,
}

impl LocalMlPipeline {
    pub fn new(store: Arc<dyn TaskStore>, ml: Arc<dyn speech_pipeline::Provider>) -> Self {
        Self { store, ml }
    }
}

#[async_trait]
impl Pipeline for LocalMlPipeline {
    async fn process(
        &self,
        task: &PendingTask,
        _cancel: &CancellationToken,
    ) -> Result<Completion, TaskFailure> {
        let options = PipelineOptions {
            // Empty lets the service detect the language
            language: task
                .language
                .clone()
                .filter(|language| !language.trim().is_empty()),
            num_speakers: None,
            detect_fillers: true,
        };

        let result = self
            .ml
            .transcribe_full(Path::new(&task.storage_path), &options)
            .await
            .map_err(TaskFailure::Transcription)?;

        info!(
            "Task {}: transcribed {} segments from {} speakers (language {:?}, {:.1}s)",
            task.id,
            result.segments.len(),
            result.num_speakers,
            result.language,
            result.processing_time_seconds
        );

        match serde_json::to_string(&result) {
            Ok(raw) => {
                if let Err(e) = self.store.save_speaker_data(task.id, raw).await {
                    warn!("Task {}: failed to save pipeline response: {e}", task.id);
                }
            }
            Err(e) => warn!("Task {}: failed to encode pipeline response: {e}", task.id),
        }

        for segment in &result.segments {
            let input = SegmentInput {
                speaker_id: segment.speaker.clone(),
                start_time_ms: seconds_to_ms(segment.start),
                end_time_ms: seconds_to_ms(segment.end),
                text: segment.text.clone(),
                has_fillers: segment.has_fillers,
            };
            if let Err(e) = self.store.insert_segment(task.id, input).await {
                warn!("Task {}: failed to save segment: {e}", task.id);
            }
        }

        Ok(Completion {
            transcript_text: result.full_text,
            provider: TranscriptionProvider::LocalMl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::test_support::{pending_task, FakeMl, RecordingStore};
    use speech_ai::types::pipeline::{PipelineResult, PipelineSegment};

    fn segment(speaker: &str, start: f64, end: f64, text: &str, has_fillers: bool) -> PipelineSegment {
        PipelineSegment {
            speaker: Some(speaker.to_string()),
            start,
            end,
            text: text.to_string(),
            has_fillers,
            fillers_found: vec![],
        }
    }

    #[tokio::test]
    async fn pipeline_response_is_persisted_as_segments() {
        let store = Arc::new(RecordingStore::default());
        let ml = Arc::new(FakeMl::default());
        *ml.transcription.lock().unwrap() = Some(Ok(PipelineResult {
            language: Some("ru".to_string()),
            full_text: "ну здравствуйте коллеги".to_string(),
            segments: vec![
                segment("SPEAKER_00", 0.0, 1.25, "ну здравствуйте", true),
                segment("SPEAKER_01", 1.25, 2.5, "коллеги", false),
            ],
            num_speakers: 2,
            processing_time_seconds: 4.2,
        }));
        let pipeline = LocalMlPipeline::new(store.clone(), ml.clone());

        let completion = pipeline
            .process(&pending_task(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(completion.transcript_text, "ну здравствуйте коллеги");
        assert_eq!(completion.provider, TranscriptionProvider::LocalMl);

        let segments = store.segments.lock().unwrap().clone();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].end_time_ms, 1250);
        assert!(segments[0].has_fillers);
        assert_eq!(segments[1].speaker_id.as_deref(), Some("SPEAKER_01"));
        assert_eq!(segments[1].start_time_ms, 1250);
        assert_eq!(store.speaker_data.lock().unwrap().len(), 1);

        let options = ml.options_seen.lock().unwrap().clone();
        assert_eq!(options[0].language.as_deref(), Some("ru-RU"));
        assert!(options[0].detect_fillers);
    }

    #[tokio::test]
    async fn pipeline_error_is_reported_verbatim() {
        let store = Arc::new(RecordingStore::default());
        let ml = Arc::new(FakeMl::default());
        *ml.transcription.lock().unwrap() = Some(Err(speech_ai::Error::Provider(
            "transcribe-full error: status 500, body: CUDA out of memory".to_string(),
        )));
        let pipeline = LocalMlPipeline::new(store.clone(), ml);

        let failure = pipeline
            .process(&pending_task(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            failure.to_string(),
            "provider error: transcribe-full error: status 500, body: CUDA out of memory"
        );
        assert!(store.segments.lock().unwrap().is_empty());
    }
}
