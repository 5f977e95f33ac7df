//! In-memory stand-ins for every worker seam.

use super::backoff::Backoff;
use super::pipeline::PipelineSettings;
use crate::error::Error;
use crate::task_store::TaskStore;
use crate::transcription_segment::SegmentInput;
use crate::transcription_task::{PendingTask, TaskSuccess};
use crate::Id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use speech_ai::traits::{media, object_storage, recognition, speech_pipeline};
use speech_ai::types::diarization::Diarization;
use speech_ai::types::pipeline::{PipelineOptions, PipelineResult};
use speech_ai::types::recognition::{LongRunningOperation, OperationState};
use speech_ai::types::text::{TextProcessing, TextProcessingRequest};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) fn pending_task() -> PendingTask {
    PendingTask {
        id: Id::new_v4(),
        file_id: Id::new_v4(),
        storage_path: "/data/uploads/standup.mp4".to_string(),
        language: Some("ru-RU".to_string()),
    }
}

pub(crate) fn settings(work_dir: &Path) -> PipelineSettings {
    PipelineSettings {
        work_dir: work_dir.to_path_buf(),
        language: "ru-RU".to_string(),
        short_audio_threshold_secs: 30.0,
        chunk_duration_secs: 29,
        backoff: Backoff {
            initial: Duration::from_secs(1),
            multiplier: 2,
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
        },
    }
}

fn unscripted(what: &str) -> speech_ai::Error {
    speech_ai::Error::Provider(format!("unexpected {what} call"))
}

#[derive(Default)]
pub(crate) struct RecordingStore {
    pub segments: Mutex<Vec<SegmentInput>>,
    pub speaker_data: Mutex<Vec<String>>,
}

#[async_trait]
impl TaskStore for RecordingStore {
    async fn find_claimable(&self, _limit: u64) -> Result<Vec<PendingTask>, Error> {
        Ok(Vec::new())
    }

    async fn claim(&self, _id: Id, _started_at: DateTime<Utc>) -> Result<bool, Error> {
        Ok(true)
    }

    async fn complete(&self, _id: Id, _success: TaskSuccess) -> Result<(), Error> {
        Ok(())
    }

    async fn fail(&self, _id: Id, _message: &str, _completed_at: DateTime<Utc>) -> Result<(), Error> {
        Ok(())
    }

    async fn insert_segment(&self, _task_id: Id, segment: SegmentInput) -> Result<(), Error> {
        self.segments.lock().unwrap().push(segment);
        Ok(())
    }

    async fn save_speaker_data(&self, _task_id: Id, raw_json: String) -> Result<(), Error> {
        self.speaker_data.lock().unwrap().push(raw_json);
        Ok(())
    }
}

/// Replays scripted answers; operations default to still running.
#[derive(Default)]
pub(crate) struct FakeRecognizer {
    pub recognized: Mutex<VecDeque<Result<String, speech_ai::Error>>>,
    pub operations: Mutex<VecDeque<Result<OperationState, speech_ai::Error>>>,
    pub recognize_calls: AtomicUsize,
    pub polls: AtomicUsize,
    pub started_uris: Mutex<Vec<String>>,
}

impl FakeRecognizer {
    pub fn with_texts(texts: Vec<Result<String, speech_ai::Error>>) -> Self {
        Self {
            recognized: Mutex::new(texts.into()),
            ..Self::default()
        }
    }

    pub fn with_operations(states: Vec<Result<OperationState, speech_ai::Error>>) -> Self {
        Self {
            operations: Mutex::new(states.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl recognition::Provider for FakeRecognizer {
    async fn recognize(&self, _audio: &Path, _language: &str) -> Result<String, speech_ai::Error> {
        self.recognize_calls.fetch_add(1, Ordering::SeqCst);
        self.recognized
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("recognize")))
    }

    async fn start_long_running(
        &self,
        audio_uri: &str,
        _language: &str,
    ) -> Result<String, speech_ai::Error> {
        self.started_uris.lock().unwrap().push(audio_uri.to_string());
        Ok("op-1".to_string())
    }

    async fn get_operation(
        &self,
        operation_id: &str,
    ) -> Result<LongRunningOperation, speech_ai::Error> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let state = self
            .operations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(OperationState::Running))?;
        Ok(LongRunningOperation {
            id: operation_id.to_string(),
            state,
        })
    }

    fn provider_id(&self) -> &str {
        "fake"
    }
}

#[derive(Default)]
pub(crate) struct FakeMl {
    pub transcription: Mutex<Option<Result<PipelineResult, speech_ai::Error>>>,
    pub diarization: Mutex<Option<Result<Diarization, speech_ai::Error>>>,
    pub text_processing: Mutex<Option<Result<TextProcessing, speech_ai::Error>>>,
    pub options_seen: Mutex<Vec<PipelineOptions>>,
}

#[async_trait]
impl speech_pipeline::Provider for FakeMl {
    async fn transcribe_full(
        &self,
        _audio: &Path,
        options: &PipelineOptions,
    ) -> Result<PipelineResult, speech_ai::Error> {
        self.options_seen.lock().unwrap().push(options.clone());
        self.transcription
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(unscripted("transcribe_full")))
    }

    async fn diarize(&self, _audio: &Path) -> Result<Diarization, speech_ai::Error> {
        self.diarization
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(unscripted("diarize")))
    }

    async fn process_text(
        &self,
        _request: &TextProcessingRequest,
    ) -> Result<TextProcessing, speech_ai::Error> {
        self.text_processing
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(unscripted("process_text")))
    }

    async fn health(&self) -> Result<(), speech_ai::Error> {
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeStorage {
    pub uploaded: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_upload: bool,
}

#[async_trait]
impl object_storage::Provider for FakeStorage {
    async fn put_file(&self, key: &str, _file: &Path) -> Result<String, speech_ai::Error> {
        if self.fail_upload {
            return Err(speech_ai::Error::Storage("bucket not found".to_string()));
        }
        self.uploaded.lock().unwrap().push(key.to_string());
        Ok(format!("https://storage.example.net/bucket/{key}"))
    }

    async fn delete(&self, key: &str) -> Result<(), speech_ai::Error> {
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

/// Writes real scratch files so cleanup can be observed.
pub(crate) struct FakeMedia {
    duration: Option<f64>,
    chunk_count: usize,
    fail_transcode: bool,
    pub split_calls: AtomicUsize,
}

impl FakeMedia {
    pub fn new(duration: Option<f64>, chunk_count: usize) -> Self {
        Self {
            duration,
            chunk_count,
            fail_transcode: false,
            split_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_transcode() -> Self {
        Self {
            fail_transcode: true,
            ..Self::new(Some(10.0), 0)
        }
    }
}

#[async_trait]
impl media::Processor for FakeMedia {
    async fn probe_duration(&self, _input: &Path) -> Result<f64, speech_ai::Error> {
        self.duration
            .ok_or_else(|| speech_ai::Error::Media("ffprobe failed: exit status: 1".to_string()))
    }

    async fn transcode(&self, _input: &Path, out_dir: &Path) -> Result<PathBuf, speech_ai::Error> {
        if self.fail_transcode {
            return Err(speech_ai::Error::Media(
                "ffmpeg failed: exit status: 1: Invalid data found".to_string(),
            ));
        }
        let output = out_dir.join("transcoded.ogg");
        tokio::fs::write(&output, b"OggS").await?;
        Ok(output)
    }

    async fn split(
        &self,
        _input: &Path,
        out_dir: &Path,
        chunk_secs: u32,
    ) -> Result<Vec<PathBuf>, speech_ai::Error> {
        self.split_calls.fetch_add(1, Ordering::SeqCst);
        let mut chunks = Vec::with_capacity(self.chunk_count);
        for index in 0..self.chunk_count {
            let chunk = out_dir.join(format!("chunk_{}.ogg", index as u32 * chunk_secs));
            tokio::fs::write(&chunk, b"OggS").await?;
            chunks.push(chunk);
        }
        Ok(chunks)
    }
}
