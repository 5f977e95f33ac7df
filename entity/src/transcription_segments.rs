//! SeaORM Entity for transcription_segments table.
//! Timed slices of a task's transcript, optionally attributed to a speaker.

use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transcription_segments")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Id,

    pub task_id: Id,

    /// Speaker label from diarization (e.g., "SPEAKER_00")
    pub speaker_id: Option<String>,

    /// Display name a user assigned to the speaker
    pub speaker_name: Option<String>,

    /// Start time in milliseconds from beginning of the audio
    pub start_time_ms: i64,

    /// End time in milliseconds from beginning of the audio
    pub end_time_ms: i64,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    /// Segment contains filler words
    pub has_fillers: bool,

    /// Text was edited by a user after transcription
    pub is_corrected: bool,

    #[serde(skip_deserializing)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transcription_tasks::Entity",
        from = "Column::TaskId",
        to = "super::transcription_tasks::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    TranscriptionTasks,
}

impl Related<super::transcription_tasks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TranscriptionTasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
