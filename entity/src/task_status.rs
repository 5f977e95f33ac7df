use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of a transcription task through its lifecycle.
///
/// `Pending` -> `InProgress` happens only through the conditional claim; `Done` and
/// `Error` are terminal.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, EnumIter, Deserialize, Default, Serialize, DeriveActiveEnum,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum TaskStatus {
    /// Created at upload time, waiting for a worker
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    /// Claimed by a worker
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Transcript is available
    #[sea_orm(string_value = "done")]
    Done,
    /// Processing failed, see the task's error message
    #[sea_orm(string_value = "error")]
    Error,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(fmt, "pending"),
            TaskStatus::InProgress => write!(fmt, "in_progress"),
            TaskStatus::Done => write!(fmt, "done"),
            TaskStatus::Error => write!(fmt, "error"),
        }
    }
}
