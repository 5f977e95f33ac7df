//! This module re-exports various items from the `entity_api` crate.
//!
//! The purpose of this re-export is to ensure that consumers of the `domain` crate do not need to
//! directly depend on the `entity_api` crate. Models, enums and the id type are exposed from here,
//! while the SQL behind them stays in `entity_api`.
pub use entity_api::{
    files, projects, task_status, transcription_provider, transcription_segments,
    transcription_tasks, Id,
};

pub mod error;
pub mod export;
pub mod file;
pub mod gateway;
pub mod project;
pub mod task_store;
pub mod transcription_segment;
pub mod transcription_task;
pub mod upload;
pub mod worker;
