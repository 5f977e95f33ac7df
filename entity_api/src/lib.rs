pub use entity::{
    files, projects, task_status, transcription_provider, transcription_segments,
    transcription_tasks, Id,
};

pub mod error;
pub mod file;
pub mod project;
pub mod transcription_segment;
pub mod transcription_task;
