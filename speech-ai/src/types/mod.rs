pub mod diarization;
pub mod pipeline;
pub mod recognition;
pub mod text;
