//! Segment reads and edits on behalf of an API session.
//!
//! Every operation first resolves the task through its file's owning session, so a task
//! of another session is indistinguishable from a missing one.

use crate::error::Error;
use crate::transcription_segments::Model;
use crate::Id;
use entity_api::transcription_task::find_by_id_for_session;
use log::*;
use sea_orm::{DatabaseConnection, TransactionTrait};

pub use entity_api::transcription_segment::{join_texts, SegmentInput};

/// Lists a task's segments in start order.
pub async fn find_by_task_id(
    db: &DatabaseConnection,
    task_id: Id,
    user_session_id: &str,
) -> Result<Vec<Model>, Error> {
    find_by_id_for_session(db, task_id, user_session_id).await?;
    Ok(entity_api::transcription_segment::find_by_task_id(db, task_id).await?)
}

/// Corrects one segment's text and rebuilds the task transcript from all segments,
/// atomically. Returns the updated segment and the new transcript.
pub async fn update_text(
    db: &DatabaseConnection,
    task_id: Id,
    segment_id: Id,
    user_session_id: &str,
    text: String,
) -> Result<(Model, String), Error> {
    let txn = db.begin().await.map_err(Error::db_transaction)?;

    find_by_id_for_session(&txn, task_id, user_session_id).await?;
    let segment =
        entity_api::transcription_segment::update_text(&txn, task_id, segment_id, text).await?;
    let transcript =
        entity_api::transcription_segment::rebuild_transcript_text(&txn, task_id).await?;

    txn.commit().await.map_err(Error::db_transaction)?;

    debug!("Segment {segment_id} corrected, transcript of task {task_id} rebuilt");
    Ok((segment, transcript))
}

/// Names a diarized speaker across all of a task's segments. Returns the number renamed.
pub async fn rename_speaker(
    db: &DatabaseConnection,
    task_id: Id,
    user_session_id: &str,
    speaker_id: &str,
    speaker_name: &str,
) -> Result<u64, Error> {
    let txn = db.begin().await.map_err(Error::db_transaction)?;

    find_by_id_for_session(&txn, task_id, user_session_id).await?;
    let renamed = entity_api::transcription_segment::rename_speaker(
        &txn,
        task_id,
        speaker_id,
        speaker_name,
    )
    .await?;

    txn.commit().await.map_err(Error::db_transaction)?;
    Ok(renamed)
}
