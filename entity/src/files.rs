//! SeaORM Entity for files table.
//! An uploaded media asset. Rows are immutable after creation except for deletion.

use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Id,

    /// Name of the file as uploaded by the user
    pub original_name: String,

    /// Local path the worker reads the media from
    #[serde(skip_serializing)]
    pub storage_path: String,

    /// Size in bytes
    pub file_size: i64,

    pub mime_type: String,

    /// Opaque session id that owns the file; every read is scoped by it
    #[serde(skip_serializing)]
    pub user_session_id: String,

    /// Optional project grouping; cleared when the project is deleted
    pub project_id: Option<Id>,

    #[serde(skip_deserializing)]
    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Projects,

    #[sea_orm(has_many = "super::transcription_tasks::Entity")]
    TranscriptionTasks,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::transcription_tasks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TranscriptionTasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
