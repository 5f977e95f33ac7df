//! Speech processing abstraction layer.
//!
//! Trait-based seams for everything a transcription worker talks to:
//! - Cloud speech recognition (synchronous and long-running operations)
//! - A local speech pipeline (full transcription, diarization, filler-word processing)
//! - Object storage used to hand long audio to the cloud recognizer
//! - Media probing, transcoding and splitting
//!
//! Gateways implement these traits; the worker depends only on the traits so every
//! collaborator can be replaced by a fake in tests.

pub mod error;
pub mod traits;
pub mod types;

pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
