use uuid::Uuid;

pub mod files;
pub mod projects;
pub mod task_status;
pub mod transcription_provider;
pub mod transcription_segments;
pub mod transcription_tasks;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
