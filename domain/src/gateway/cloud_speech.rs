//! Hosted speech recognition client.
//!
//! Short audio goes through the synchronous endpoint as raw OGG/Opus bytes. Long audio is
//! referenced by an object storage URI and recognized by a long-running operation which
//! the caller polls.

use super::{read_audio, send_error, status_error};
use crate::error::Error;
use async_trait::async_trait;
use log::*;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use speech_ai::traits::recognition;
use speech_ai::types::recognition::{LongRunningOperation, OperationState};
use speech_auth::api_key::{ApiKeyAuth, ProviderAuth};
use std::path::Path;

const PROVIDER_ID: &str = "cloud_speech";

/// Endpoints of the speech service.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub recognize_url: String,
    pub long_running_url: String,
    pub operations_url: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default, alias = "error_code")]
    code: serde_json::Value,
    #[serde(default, alias = "error_message")]
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionSpec<'a> {
    language_code: &'a str,
    model: &'a str,
    audio_encoding: &'a str,
    sample_rate_hertz: u32,
    audio_channel_count: u32,
}

#[derive(Debug, Serialize)]
struct RecognitionConfig<'a> {
    specification: RecognitionSpec<'a>,
}

#[derive(Debug, Serialize)]
struct AudioSource<'a> {
    uri: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LongRunningRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: AudioSource<'a>,
    folder_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct Operation {
    pub id: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<OperationResult>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct OperationResult {
    #[serde(default)]
    pub chunks: Vec<ResultChunk>,
}

#[derive(Debug, Deserialize)]
pub struct ResultChunk {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
pub struct Alternative {
    #[serde(default)]
    pub text: String,
}

impl Operation {
    fn into_long_running(self) -> LongRunningOperation {
        let state = match (self.done, self.error) {
            (false, _) => OperationState::Running,
            (true, Some(error)) => OperationState::Failed {
                message: error.message,
            },
            (true, None) => OperationState::Succeeded {
                text: extract_text(self.response.as_ref()),
            },
        };
        LongRunningOperation { id: self.id, state }
    }
}

/// Joins the first alternative of every chunk, in order, with single spaces.
pub fn extract_text(result: Option<&OperationResult>) -> String {
    result
        .map(|result| {
            result
                .chunks
                .iter()
                .filter_map(|chunk| chunk.alternatives.first())
                .map(|alternative| alternative.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

pub struct CloudSpeechClient {
    client: reqwest::Client,
    auth: ApiKeyAuth,
    endpoints: Endpoints,
}

impl CloudSpeechClient {
    pub fn new(api_key: SecretString, folder_id: String, endpoints: Endpoints) -> Result<Self, Error> {
        let auth = ApiKeyAuth::cloud_speech(api_key, folder_id)?;
        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            auth,
            endpoints,
        })
    }

    async fn service_error(context: &str, response: reqwest::Response) -> speech_ai::Error {
        let status = response.status();
        if matches!(status.as_u16(), 401 | 403 | 429) {
            return status_error(context, response).await;
        }

        let body = response.text().await.unwrap_or_default();
        error!("{context}: status {status}, body: {body}");
        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) if !parsed.message.is_empty() => speech_ai::Error::Provider(format!(
                "speech service error (code {}): {}",
                parsed.code, parsed.message
            )),
            _ => speech_ai::Error::Provider(format!(
                "speech service error: status {}, body: {body}",
                status.as_u16()
            )),
        }
    }
}

#[async_trait]
impl recognition::Provider for CloudSpeechClient {
    async fn recognize(&self, audio: &Path, language: &str) -> Result<String, speech_ai::Error> {
        let bytes = read_audio(audio).await?;
        debug!(
            "Recognizing {} ({} bytes) synchronously",
            audio.display(),
            bytes.len()
        );

        let mut query = vec![("format", "oggopus")];
        if !language.is_empty() {
            query.push(("lang", language));
        }

        let response = self
            .auth
            .authenticate(self.client.post(&self.endpoints.recognize_url))
            .query(&query)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| send_error("Failed to send recognition request", e))?;

        if !response.status().is_success() {
            return Err(Self::service_error("Recognition request failed", response).await);
        }

        let recognized: RecognizeResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse recognition response: {:?}", e);
            speech_ai::Error::Deserialization(e.to_string())
        })?;
        Ok(recognized.result)
    }

    async fn start_long_running(
        &self,
        audio_uri: &str,
        language: &str,
    ) -> Result<String, speech_ai::Error> {
        let request = LongRunningRequest {
            config: RecognitionConfig {
                specification: RecognitionSpec {
                    language_code: language,
                    model: "general",
                    audio_encoding: "OGG_OPUS",
                    sample_rate_hertz: 48000,
                    audio_channel_count: 1,
                },
            },
            audio: AudioSource { uri: audio_uri },
            folder_id: self.auth.tenant(),
        };

        let response = self
            .auth
            .authenticate(self.client.post(&self.endpoints.long_running_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("Failed to start long-running recognition", e))?;

        if !response.status().is_success() {
            return Err(Self::service_error("Long-running recognition rejected", response).await);
        }

        let operation: Operation = response.json().await.map_err(|e| {
            warn!("Failed to parse operation: {:?}", e);
            speech_ai::Error::Deserialization(e.to_string())
        })?;
        info!("Started long-running recognition operation {}", operation.id);
        Ok(operation.id)
    }

    async fn get_operation(
        &self,
        operation_id: &str,
    ) -> Result<LongRunningOperation, speech_ai::Error> {
        let url = format!(
            "{}/{}",
            self.endpoints.operations_url.trim_end_matches('/'),
            operation_id
        );

        let response = self
            .auth
            .authenticate(self.client.get(&url))
            .send()
            .await
            .map_err(|e| send_error("Failed to check operation", e))?;

        let status = response.status();
        // Body read failures are retried like send failures
        let body = response
            .text()
            .await
            .map_err(|e| send_error("Failed to read operation", e))?;

        if status != reqwest::StatusCode::OK {
            error!("Operation {operation_id} check failed: status {status}, body: {body}");
            return Err(speech_ai::Error::Provider(format!(
                "operation check failed: status {}",
                status.as_u16()
            )));
        }

        let operation: Operation = serde_json::from_str(&body)?;
        Ok(operation.into_long_running())
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }
}
