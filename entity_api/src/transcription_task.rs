//! Operations for transcription_tasks table.
//!
//! The worker coordinates through this table only: `find_claimable` reads a FIFO batch of
//! pending tasks and `claim` moves one of them to `in_progress` with a single conditional
//! update. Nothing else guards a task against two workers.

use super::error::Error;
use chrono::{DateTime, Utc};
use entity::files;
use entity::task_status::TaskStatus;
use entity::transcription_provider::TranscriptionProvider;
use entity::transcription_tasks::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, ConnectionTrait, QueryOrder, QuerySelect,
};
use std::collections::HashMap;

/// A pending task joined with the location of its media file.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTask {
    pub id: Id,
    pub file_id: Id,
    pub storage_path: String,
    pub language: Option<String>,
}

/// Values written when a pipeline finishes successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSuccess {
    pub transcript_text: String,
    pub provider: TranscriptionProvider,
    pub processing_time_seconds: i32,
    pub completed_at: DateTime<Utc>,
}

/// Creates a new pending task for an uploaded file
pub async fn create<C: ConnectionTrait>(
    db: &C,
    file_id: Id,
    language: Option<String>,
) -> Result<Model, Error> {
    debug!("Creating new transcription task for file: {file_id}");

    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        file_id: Set(file_id),
        status: Set(TaskStatus::Pending),
        language: Set(language),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    Ok(active_model.insert(db).await?)
}

/// Returns up to `limit` pending tasks, oldest first, with their file paths.
///
/// Tasks whose file row has disappeared are skipped.
pub async fn find_claimable<C: ConnectionTrait>(
    db: &C,
    limit: u64,
) -> Result<Vec<PendingTask>, Error> {
    let tasks = Entity::find()
        .filter(Column::Status.eq(TaskStatus::Pending))
        .order_by_asc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?;

    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let file_ids: Vec<Id> = tasks.iter().map(|task| task.file_id).collect();
    let paths: HashMap<Id, String> = files::Entity::find()
        .filter(files::Column::Id.is_in(file_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|file| (file.id, file.storage_path))
        .collect();

    Ok(tasks
        .into_iter()
        .filter_map(|task| match paths.get(&task.file_id) {
            Some(storage_path) => Some(PendingTask {
                id: task.id,
                file_id: task.file_id,
                storage_path: storage_path.clone(),
                language: task.language,
            }),
            None => {
                warn!("Task {} references missing file {}", task.id, task.file_id);
                None
            }
        })
        .collect())
}

/// Atomically moves a task from `pending` to `in_progress` and stamps `started_at`.
///
/// Returns `false` when no row matched: another worker claimed it first or it was deleted.
pub async fn claim<C: ConnectionTrait>(
    db: &C,
    id: Id,
    started_at: DateTime<Utc>,
) -> Result<bool, Error> {
    let result = Entity::update_many()
        .set(ActiveModel {
            status: Set(TaskStatus::InProgress),
            started_at: Set(Some(started_at.into())),
            ..Default::default()
        })
        .filter(Column::Id.eq(id))
        .filter(Column::Status.eq(TaskStatus::Pending))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Marks a task `done` with its transcript and the pipeline that produced it
pub async fn mark_done<C: ConnectionTrait>(
    db: &C,
    id: Id,
    success: TaskSuccess,
) -> Result<(), Error> {
    debug!(
        "Marking transcription task {id} done via {} ({}s)",
        success.provider, success.processing_time_seconds
    );

    let result = Entity::update_many()
        .set(ActiveModel {
            status: Set(TaskStatus::Done),
            transcript_text: Set(Some(success.transcript_text)),
            provider: Set(Some(success.provider)),
            processing_time_seconds: Set(Some(success.processing_time_seconds)),
            error_message: Set(None),
            completed_at: Set(Some(success.completed_at.into())),
            ..Default::default()
        })
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }
    Ok(())
}

/// Marks a task `error` with a human-readable message.
///
/// Not guarded by the current status: calling it twice overwrites the message.
pub async fn mark_failed<C: ConnectionTrait>(
    db: &C,
    id: Id,
    message: &str,
    completed_at: DateTime<Utc>,
) -> Result<(), Error> {
    let result = Entity::update_many()
        .set(ActiveModel {
            status: Set(TaskStatus::Error),
            error_message: Set(Some(message.to_string())),
            completed_at: Set(Some(completed_at.into())),
            ..Default::default()
        })
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }
    Ok(())
}

/// Stores the raw diarization or pipeline response for diagnostics
pub async fn save_speaker_data<C: ConnectionTrait>(
    db: &C,
    id: Id,
    raw_json: String,
) -> Result<(), Error> {
    Entity::update_many()
        .set(ActiveModel {
            speaker_data: Set(Some(raw_json)),
            ..Default::default()
        })
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

/// Replaces the aggregate transcript text, used after segment edits
pub async fn update_transcript_text<C: ConnectionTrait>(
    db: &C,
    id: Id,
    transcript_text: String,
) -> Result<(), Error> {
    Entity::update_many()
        .set(ActiveModel {
            transcript_text: Set(Some(transcript_text)),
            ..Default::default()
        })
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

/// Finds a task by ID
pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

/// Finds a task together with its file, only if the file belongs to the session
pub async fn find_by_id_for_session<C: ConnectionTrait>(
    db: &C,
    id: Id,
    user_session_id: &str,
) -> Result<(Model, files::Model), Error> {
    let task = find_by_id(db, id).await?;
    let file = files::Entity::find_by_id(task.file_id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)?;

    if file.user_session_id != user_session_id {
        debug!("Task {id} is not visible to the requesting session");
        return Err(Error::not_found());
    }
    Ok((task, file))
}

/// Lists a session's tasks with their files, newest first
pub async fn find_history_for_session<C: ConnectionTrait>(
    db: &C,
    user_session_id: &str,
) -> Result<Vec<(Model, files::Model)>, Error> {
    let files: HashMap<Id, files::Model> = files::Entity::find()
        .filter(files::Column::UserSessionId.eq(user_session_id))
        .all(db)
        .await?
        .into_iter()
        .map(|file| (file.id, file))
        .collect();

    if files.is_empty() {
        return Ok(Vec::new());
    }

    let tasks = Entity::find()
        .filter(Column::FileId.is_in(files.keys().copied().collect::<Vec<_>>()))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?;

    Ok(tasks
        .into_iter()
        .filter_map(|task| files.get(&task.file_id).cloned().map(|file| (task, file)))
        .collect())
}
