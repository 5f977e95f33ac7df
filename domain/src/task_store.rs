//! Persistence seam between the worker and the database.

use crate::error::Error;
use crate::Id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entity_api::transcription_segment::{self, SegmentInput};
use entity_api::transcription_task::{self, PendingTask, TaskSuccess};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Task lifecycle writes performed by the worker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Oldest pending tasks first, each with its file's storage path.
    async fn find_claimable(&self, limit: u64) -> Result<Vec<PendingTask>, Error>;

    /// Moves a task from pending to in progress. `false` when another worker got it first.
    async fn claim(&self, id: Id, started_at: DateTime<Utc>) -> Result<bool, Error>;

    async fn complete(&self, id: Id, success: TaskSuccess) -> Result<(), Error>;

    async fn fail(&self, id: Id, message: &str, completed_at: DateTime<Utc>) -> Result<(), Error>;

    async fn insert_segment(&self, task_id: Id, segment: SegmentInput) -> Result<(), Error>;

    async fn save_speaker_data(&self, task_id: Id, raw_json: String) -> Result<(), Error>;
}

pub struct DbTaskStore {
    db: Arc<DatabaseConnection>,
}

impl DbTaskStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskStore for DbTaskStore {
    async fn find_claimable(&self, limit: u64) -> Result<Vec<PendingTask>, Error> {
        Ok(transcription_task::find_claimable(self.db.as_ref(), limit).await?)
    }

    async fn claim(&self, id: Id, started_at: DateTime<Utc>) -> Result<bool, Error> {
        Ok(transcription_task::claim(self.db.as_ref(), id, started_at).await?)
    }

    async fn complete(&self, id: Id, success: TaskSuccess) -> Result<(), Error> {
        Ok(transcription_task::mark_done(self.db.as_ref(), id, success).await?)
    }

    async fn fail(&self, id: Id, message: &str, completed_at: DateTime<Utc>) -> Result<(), Error> {
        Ok(transcription_task::mark_failed(self.db.as_ref(), id, message, completed_at).await?)
    }

    async fn insert_segment(&self, task_id: Id, segment: SegmentInput) -> Result<(), Error> {
        transcription_segment::create(self.db.as_ref(), task_id, segment).await?;
        Ok(())
    }

    async fn save_speaker_data(&self, task_id: Id, raw_json: String) -> Result<(), Error> {
        Ok(transcription_task::save_speaker_data(self.db.as_ref(), task_id, raw_json).await?)
    }
}
