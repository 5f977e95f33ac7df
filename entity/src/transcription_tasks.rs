//! SeaORM Entity for transcription_tasks table.
//! One transcription job per uploaded file.

use crate::task_status::TaskStatus;
use crate::transcription_provider::TranscriptionProvider;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transcription_tasks")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Id,

    pub file_id: Id,

    /// Current status of the task
    pub status: TaskStatus,

    /// Pipeline that produced the transcript, set on success
    pub provider: Option<TranscriptionProvider>,

    /// Language hint, empty for auto-detection
    pub language: Option<String>,

    /// Full transcript text, set on success
    #[sea_orm(column_type = "Text")]
    pub transcript_text: Option<String>,

    /// Raw diarization / pipeline response kept for diagnostics
    #[serde(skip_serializing)]
    #[sea_orm(column_type = "Text")]
    pub speaker_data: Option<String>,

    /// Human-readable failure message, set on error
    #[sea_orm(column_type = "Text")]
    pub error_message: Option<String>,

    /// Wall-clock seconds between claim and completion
    pub processing_time_seconds: Option<i32>,

    #[serde(skip_deserializing)]
    pub created_at: DateTimeWithTimeZone,

    /// Set by the conditional claim
    pub started_at: Option<DateTimeWithTimeZone>,

    /// Set when the task reaches `done` or `error`
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::files::Entity",
        from = "Column::FileId",
        to = "super::files::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Files,

    #[sea_orm(has_many = "super::transcription_segments::Entity")]
    TranscriptionSegments,
}

impl Related<super::files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl Related<super::transcription_segments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TranscriptionSegments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
