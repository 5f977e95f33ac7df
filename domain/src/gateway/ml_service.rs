//! Client for the self-hosted ML service (transcription, diarization, filler detection).

use super::{read_audio, send_error, status_error};
use crate::error::Error;
use async_trait::async_trait;
use log::*;
use reqwest::multipart::{Form, Part};
use speech_ai::traits::speech_pipeline;
use speech_ai::types::diarization::Diarization;
use speech_ai::types::pipeline::{PipelineOptions, PipelineResult};
use speech_ai::types::text::{TextProcessing, TextProcessingRequest};
use std::path::Path;
use std::time::Duration;

/// Inference on long recordings is slow; the service answers only when it is done.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// `/health` does no inference, so a slow answer means the service is stuck.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MlServiceClient {
    client: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
}

impl MlServiceClient {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            health_timeout: HEALTH_TIMEOUT,
        })
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn audio_form(audio: &Path) -> Result<Form, speech_ai::Error> {
        let bytes = read_audio(audio).await?;
        let file_name = audio
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        Ok(Form::new().part("audio", Part::bytes(bytes).file_name(file_name)))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        context: &str,
        response: reqwest::Response,
    ) -> Result<T, speech_ai::Error> {
        if !response.status().is_success() {
            return Err(status_error(context, response).await);
        }
        response.json::<T>().await.map_err(|e| {
            warn!("{context}: failed to parse response: {:?}", e);
            speech_ai::Error::Deserialization(e.to_string())
        })
    }
}

/// Query parameters for `/transcribe-full`; unset options are left for the service to decide.
pub(crate) fn transcribe_query(options: &PipelineOptions) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(language) = options.language.as_deref().filter(|l| !l.is_empty()) {
        query.push(("language", language.to_string()));
    }
    if let Some(num_speakers) = options.num_speakers {
        query.push(("num_speakers", num_speakers.to_string()));
    }
    query.push(("detect_fillers", options.detect_fillers.to_string()));
    query
}

#[async_trait]
impl speech_pipeline::Provider for MlServiceClient {
    async fn transcribe_full(
        &self,
        audio: &Path,
        options: &PipelineOptions,
    ) -> Result<PipelineResult, speech_ai::Error> {
        let form = Self::audio_form(audio).await?;
        info!("Sending {} to the ML service for full transcription", audio.display());

        let response = self
            .client
            .post(self.url("/transcribe-full"))
            .query(&transcribe_query(options))
            .multipart(form)
            .send()
            .await
            .map_err(|e| send_error("Failed to send transcribe-full request", e))?;

        Self::read_json("transcribe-full error", response).await
    }

    async fn diarize(&self, audio: &Path) -> Result<Diarization, speech_ai::Error> {
        let form = Self::audio_form(audio).await?;

        let response = self
            .client
            .post(self.url("/diarize"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| send_error("Failed to send diarize request", e))?;

        let diarization: Diarization = Self::read_json("diarize error", response).await?;
        debug!(
            "Diarization found {} segments from {} speakers",
            diarization.segments.len(),
            diarization.num_speakers
        );
        Ok(diarization)
    }

    async fn process_text(
        &self,
        request: &TextProcessingRequest,
    ) -> Result<TextProcessing, speech_ai::Error> {
        let response = self
            .client
            .post(self.url("/process-text"))
            .json(request)
            .send()
            .await
            .map_err(|e| send_error("Failed to send process-text request", e))?;

        Self::read_json("process-text error", response).await
    }

    async fn health(&self) -> Result<(), speech_ai::Error> {
        let response = self
            .client
            .get(self.url("/health"))
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| send_error("Health check failed", e))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(speech_ai::Error::Provider(format!(
                "ml service unhealthy: status {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use speech_ai::traits::speech_pipeline::Provider;
    use std::io::Write;

    fn audio_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".ogg").tempfile().unwrap();
        file.write_all(b"OggS fake opus").unwrap();
        file
    }

    #[tokio::test]
    async fn diarize_uploads_audio_as_multipart() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/diarize")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data; boundary=.*".to_string()),
            )
            .match_body(Matcher::Regex(r#"name="audio"; filename=".*\.ogg""#.to_string()))
            .with_status(200)
            .with_body(
                r#"{"segments":[
                    {"speaker":"SPEAKER_00","start":0.0,"end":4.2,"duration":4.2},
                    {"speaker":"SPEAKER_01","start":4.2,"end":9.0,"duration":4.8}
                ],"num_speakers":2}"#,
            )
            .create_async()
            .await;

        let client = MlServiceClient::new(&server.url()).unwrap();
        let audio = audio_file();
        let diarization = client.diarize(audio.path()).await.unwrap();

        assert_eq!(diarization.num_speakers, 2);
        assert_eq!(diarization.segments[1].speaker, "SPEAKER_01");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn diarize_error_includes_status_and_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/diarize")
            .with_status(500)
            .with_body("model not loaded")
            .create_async()
            .await;

        let client = MlServiceClient::new(&server.url()).unwrap();
        let audio = audio_file();
        let err = client.diarize(audio.path()).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("diarize error: status 500"));
        assert!(message.contains("model not loaded"));
    }

    #[tokio::test]
    async fn process_text_posts_json_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/process-text")
            .match_body(Matcher::Json(serde_json::json!({
                "text": "ну это вот",
                "detect_fillers": true,
                "remove_fillers": false
            })))
            .with_status(200)
            .with_body(
                r#"{"segments":[{"text":"ну это вот","has_fillers":true,
                    "cleaned_text":"это","fillers_found":["ну","вот"]}],"total_fillers":2}"#,
            )
            .create_async()
            .await;

        let client = MlServiceClient::new(&server.url()).unwrap();
        let processed = client
            .process_text(&TextProcessingRequest::detect_only("ну это вот"))
            .await
            .unwrap();

        assert_eq!(processed.total_fillers, 2);
        assert_eq!(processed.fillers(), vec!["вот".to_string(), "ну".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn transcribe_full_passes_options_as_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/transcribe-full")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("language".into(), "ru".into()),
                Matcher::UrlEncoded("detect_fillers".into(), "true".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"language":"ru","full_text":"добрый день","segments":[
                    {"speaker":"SPEAKER_00","start":0.0,"end":1.5,"text":"добрый день",
                     "has_fillers":false,"fillers_found":[]}
                ],"num_speakers":1,"processing_time_seconds":3.2}"#,
            )
            .create_async()
            .await;

        let client = MlServiceClient::new(&server.url()).unwrap();
        let audio = audio_file();
        let result = client
            .transcribe_full(
                audio.path(),
                &PipelineOptions {
                    language: Some("ru".to_string()),
                    num_speakers: None,
                    detect_fillers: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(result.full_text, "добрый день");
        assert_eq!(result.segments.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn health_gives_up_on_a_silent_service() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _held = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let client = MlServiceClient::new(&format!("http://{addr}"))
            .unwrap()
            .with_health_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = client.health().await.unwrap_err();

        assert!(matches!(err, speech_ai::Error::Timeout(_)), "got {err}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn health_reports_unhealthy_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(503)
            .create_async()
            .await;

        let client = MlServiceClient::new(&server.url()).unwrap();
        let err = client.health().await.unwrap_err();
        assert_eq!(err.to_string(), "provider error: ml service unhealthy: status 503");
    }

    #[test]
    fn transcribe_query_omits_unset_options() {
        let query = transcribe_query(&PipelineOptions {
            language: Some(String::new()),
            num_speakers: Some(3),
            detect_fillers: false,
        });

        assert_eq!(
            query,
            vec![
                ("num_speakers", "3".to_string()),
                ("detect_fillers", "false".to_string())
            ]
        );
    }
}
