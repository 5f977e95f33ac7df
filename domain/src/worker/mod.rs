//! Background transcription worker.
//!
//! The scheduler polls the store on a fixed interval, claims pending tasks with a
//! conditional update and runs each claimed task through the configured pipeline, writing
//! exactly one terminal state per task. Claims are the only coordination between worker
//! processes sharing a database.
//!
//! A task whose process is killed mid-flight stays `in_progress`; nothing reclaims it.

pub mod backoff;
pub mod cloud;
pub mod error;
pub mod local;
pub mod pipeline;
pub(crate) mod segments;
pub mod setup;

#[cfg(test)]
pub(crate) mod test_support;

use crate::task_store::TaskStore;
use crate::transcription_task::{PendingTask, TaskSuccess};
use chrono::Utc;
use log::*;
use pipeline::Pipeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub use error::TaskFailure;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub poll_interval: Duration,
    pub batch_size: u64,
}

pub struct Scheduler {
    store: Arc<dyn TaskStore>,
    pipeline: Arc<dyn Pipeline>,
    settings: Settings,
}

impl Scheduler {
    pub fn new(store: Arc<dyn TaskStore>, pipeline: Arc<dyn Pipeline>, settings: Settings) -> Self {
        Self {
            store,
            pipeline,
            settings,
        }
    }

    /// Polls until `cancel` fires. The task being processed when it fires runs to its
    /// terminal state first.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            "Worker started: polling every {:?}, batch size {}",
            self.settings.poll_interval, self.settings.batch_size
        );

        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.run_once(&cancel).await;
                }
            }
        }

        info!("Worker stopped");
    }

    /// One scheduler tick. Returns the number of tasks this worker claimed and processed.
    pub async fn run_once(&self, cancel: &CancellationToken) -> usize {
        let tasks = match self.store.find_claimable(self.settings.batch_size).await {
            Ok(tasks) => tasks,
            Err(e) => {
                error!("Failed to fetch pending tasks: {e}");
                return 0;
            }
        };

        let mut processed = 0;
        for task in tasks {
            if cancel.is_cancelled() {
                break;
            }

            match self.store.claim(task.id, Utc::now()).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Task {} already claimed, skipping", task.id);
                    continue;
                }
                Err(e) => {
                    error!("Task {}: claim failed: {e}", task.id);
                    continue;
                }
            }

            self.process_task(&task, cancel).await;
            processed += 1;
        }
        processed
    }

    async fn process_task(&self, task: &PendingTask, cancel: &CancellationToken) {
        info!("Task {}: processing {}", task.id, task.storage_path);
        let started = Instant::now();

        match self.pipeline.process(task, cancel).await {
            Ok(completion) => {
                let elapsed = started.elapsed().as_secs();
                let success = TaskSuccess {
                    transcript_text: completion.transcript_text,
                    provider: completion.provider,
                    processing_time_seconds: i32::try_from(elapsed).unwrap_or(i32::MAX),
                    completed_at: Utc::now(),
                };

                match self.store.complete(task.id, success).await {
                    Ok(()) => info!(
                        "Task {}: done via {} in {elapsed}s",
                        task.id, completion.provider
                    ),
                    Err(e) => error!("Task {}: failed to save result: {e}", task.id),
                }
            }
            Err(failure) => {
                let message = failure.to_string();
                warn!("Task {}: failed: {message}", task.id);

                if let Err(e) = self.store.fail(task.id, &message, Utc::now()).await {
                    error!("Task {}: failed to record failure: {e}", task.id);
                }
            }
        }
    }
}
