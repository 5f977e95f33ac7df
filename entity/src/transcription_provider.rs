use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The pipeline that actually produced a task's transcript.
///
/// The cloud variants are distinct because the strategy is picked per task from the
/// audio duration and the deployment's object storage configuration.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, EnumIter, Deserialize, Serialize, DeriveActiveEnum,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum TranscriptionProvider {
    #[sea_orm(string_value = "local_ml")]
    LocalMl,
    #[sea_orm(string_value = "cloud_speech_sync")]
    CloudSpeechSync,
    #[sea_orm(string_value = "cloud_speech_async")]
    CloudSpeechAsync,
    #[sea_orm(string_value = "cloud_speech_chunked")]
    CloudSpeechChunked,
}

impl std::fmt::Display for TranscriptionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalMl => write!(f, "local_ml"),
            Self::CloudSpeechSync => write!(f, "cloud_speech_sync"),
            Self::CloudSpeechAsync => write!(f, "cloud_speech_async"),
            Self::CloudSpeechChunked => write!(f, "cloud_speech_chunked"),
        }
    }
}
