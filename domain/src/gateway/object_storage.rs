//! S3-compatible object storage used to hand long recordings to the speech service.

use super::{read_audio, send_error, status_error};
use crate::error::Error;
use async_trait::async_trait;
use chrono::Utc;
use entity::Id;
use log::*;
use secrecy::SecretString;
use speech_ai::traits::object_storage;
use speech_auth::sigv4::{sha256_hex, Signer};
use std::path::Path;
use url::Url;

pub struct S3ObjectStorage {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    signer: Signer,
}

impl S3ObjectStorage {
    pub fn new(
        endpoint: &str,
        region: &str,
        bucket: String,
        access_key_id: String,
        secret_access_key: SecretString,
    ) -> Result<Self, Error> {
        // Reject a malformed endpoint at startup rather than on the first upload
        Url::parse(endpoint).map_err(|e| {
            warn!("Invalid object storage endpoint {endpoint}: {e}");
            Error::config("invalid object storage endpoint")
        })?;

        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket,
            signer: Signer::new(access_key_id, secret_access_key, region.to_string()),
        })
    }

    /// Path-style URI of an object: `{endpoint}/{bucket}/{key}`.
    pub fn object_uri(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    fn object_url(&self, key: &str) -> Result<Url, speech_ai::Error> {
        Url::parse(&self.object_uri(key))
            .map_err(|e| speech_ai::Error::Configuration(format!("invalid object url: {e}")))
    }

    fn signed(
        &self,
        request: reqwest::RequestBuilder,
        method: &str,
        url: &Url,
        content_sha256: &str,
    ) -> Result<reqwest::RequestBuilder, speech_ai::Error> {
        let headers = self
            .signer
            .sign(method, url, content_sha256, Utc::now())
            .map_err(|e| speech_ai::Error::Configuration(e.to_string()))?;
        Ok(headers.apply(request))
    }
}

/// Object key for a task's normalized audio: `audio/{task_id}_{file name}`.
pub fn object_key(task_id: Id, audio: &Path) -> String {
    let file_name = audio
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("audio/{task_id}_{file_name}")
}

#[async_trait]
impl object_storage::Provider for S3ObjectStorage {
    async fn put_file(&self, key: &str, file: &Path) -> Result<String, speech_ai::Error> {
        let bytes = read_audio(file).await?;
        let url = self.object_url(key)?;
        let content_sha256 = sha256_hex(&bytes);
        let size = bytes.len();

        let request = self
            .client
            .put(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "audio/ogg")
            .body(bytes);
        let response = self
            .signed(request, "PUT", &url, &content_sha256)?
            .send()
            .await
            .map_err(|e| send_error("Failed to upload object", e))?;

        if !response.status().is_success() {
            let err = status_error("Object upload failed", response).await;
            return Err(speech_ai::Error::Storage(err.to_string()));
        }

        info!("Uploaded {size} bytes to {key}");
        Ok(url.to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), speech_ai::Error> {
        let url = self.object_url(key)?;
        let empty_sha256 = sha256_hex(&[]);

        let request = self.client.delete(url.clone());
        let response = self
            .signed(request, "DELETE", &url, &empty_sha256)?
            .send()
            .await
            .map_err(|e| send_error("Failed to delete object", e))?;

        if !response.status().is_success() {
            let err = status_error("Object delete failed", response).await;
            return Err(speech_ai::Error::Storage(err.to_string()));
        }

        debug!("Deleted object {key}");
        Ok(())
    }
}
