//! Operations for transcription_segments table.

use super::error::Error;
use super::transcription_task;
use chrono::Utc;
use entity::transcription_segments::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, sea_query::Expr, ActiveValue::Set, ConnectionTrait, QueryOrder,
};

/// A timed piece of transcript produced by a pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentInput {
    pub speaker_id: Option<String>,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub text: String,
    pub has_fillers: bool,
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    task_id: Id,
    input: SegmentInput,
) -> Result<Model, Error> {
    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        task_id: Set(task_id),
        speaker_id: Set(input.speaker_id),
        speaker_name: Set(None),
        start_time_ms: Set(input.start_time_ms),
        end_time_ms: Set(input.end_time_ms),
        text: Set(input.text),
        has_fillers: Set(input.has_fillers),
        is_corrected: Set(false),
        created_at: Set(Utc::now().into()),
    };

    Ok(active_model.insert(db).await?)
}

/// Lists a task's segments ordered by start time
pub async fn find_by_task_id<C: ConnectionTrait>(
    db: &C,
    task_id: Id,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::TaskId.eq(task_id))
        .order_by_asc(Column::StartTimeMs)
        .all(db)
        .await?)
}

/// Replaces a segment's text and flags it as user-corrected
pub async fn update_text<C: ConnectionTrait>(
    db: &C,
    task_id: Id,
    segment_id: Id,
    text: String,
) -> Result<Model, Error> {
    let segment = Entity::find_by_id(segment_id)
        .filter(Column::TaskId.eq(task_id))
        .one(db)
        .await?
        .ok_or_else(Error::not_found)?;

    debug!("Correcting text of segment {segment_id}");

    let mut active_model: ActiveModel = segment.into();
    active_model.text = Set(text);
    active_model.is_corrected = Set(true);

    Ok(active_model.update(db).await?)
}

/// Sets the display name on every segment of a task attributed to `speaker_id`.
/// Returns the number of segments renamed.
pub async fn rename_speaker<C: ConnectionTrait>(
    db: &C,
    task_id: Id,
    speaker_id: &str,
    speaker_name: &str,
) -> Result<u64, Error> {
    let speaker_name = speaker_name.trim();
    if speaker_name.is_empty() {
        return Err(Error::validation());
    }

    let result = Entity::update_many()
        .col_expr(Column::SpeakerName, Expr::value(speaker_name.to_string()))
        .filter(Column::TaskId.eq(task_id))
        .filter(Column::SpeakerId.eq(speaker_id))
        .exec(db)
        .await?;

    debug!(
        "Renamed speaker {speaker_id} on {} segments of task {task_id}",
        result.rows_affected
    );
    Ok(result.rows_affected)
}

/// Joins non-empty segment texts with single spaces, in the given order
pub fn join_texts<'a, I>(texts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    texts
        .into_iter()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Recomputes a task's transcript from its segments in start order and stores it
pub async fn rebuild_transcript_text<C: ConnectionTrait>(
    db: &C,
    task_id: Id,
) -> Result<String, Error> {
    let segments = find_by_task_id(db, task_id).await?;
    let transcript = join_texts(segments.iter().map(|segment| segment.text.as_str()));

    transcription_task::update_transcript_text(db, task_id, transcript.clone()).await?;
    Ok(transcript)
}
