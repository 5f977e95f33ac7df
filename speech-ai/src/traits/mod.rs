pub mod media;
pub mod object_storage;
pub mod recognition;
pub mod speech_pipeline;
