//! Per-task terminal failures.

use std::error::Error as StdError;
use std::fmt;

/// Why a claimed task ended in `error`. `Display` is the message stored on the task.
#[derive(Debug)]
pub enum TaskFailure {
    /// The configured provider has no usable client
    NotConfigured(String),
    Transcode(speech_ai::Error),
    Recognition(speech_ai::Error),
    /// Local pipeline failure, reported verbatim
    Transcription(speech_ai::Error),
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskFailure::NotConfigured(message) => write!(f, "{message}"),
            TaskFailure::Transcode(e) => write!(f, "audio conversion failed: {e}"),
            TaskFailure::Recognition(e) => write!(f, "recognition failed: {e}"),
            TaskFailure::Transcription(e) => write!(f, "{e}"),
        }
    }
}

impl StdError for TaskFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TaskFailure::NotConfigured(_) => None,
            TaskFailure::Transcode(e)
            | TaskFailure::Recognition(e)
            | TaskFailure::Transcription(e) => Some(e),
        }
    }
}
