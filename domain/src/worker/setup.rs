//! Builds a ready-to-run scheduler from process configuration.

use super::backoff::Backoff;
use super::pipeline::{self, Collaborators, PipelineSettings};
use super::{Scheduler, Settings};
use crate::error::Error;
use crate::gateway::cloud_speech::{CloudSpeechClient, Endpoints};
use crate::gateway::media::FfmpegProcessor;
use crate::gateway::ml_service::MlServiceClient;
use crate::gateway::object_storage::S3ObjectStorage;
use crate::task_store::{DbTaskStore, TaskStore};
use log::*;
use sea_orm::DatabaseConnection;
use secrecy::SecretString;
use service::config::Config;
use speech_ai::traits::{object_storage, recognition, speech_pipeline};
use std::sync::Arc;
use std::time::Duration;

pub async fn from_config(config: &Config, db: Arc<DatabaseConnection>) -> Result<Scheduler, Error> {
    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .map_err(|e| {
            error!("Failed to create work dir {}: {e}", config.work_dir.display());
            Error::config("work dir is not writable")
        })?;

    let store: Arc<dyn TaskStore> = Arc::new(DbTaskStore::new(db));
    let collaborators = Collaborators {
        store: store.clone(),
        recognizer: cloud_speech_client(config)?,
        ml: ml_service_client(config).await?,
        storage: object_storage_client(config)?,
        media: Arc::new(FfmpegProcessor::default()),
    };

    let settings = PipelineSettings {
        work_dir: config.work_dir.clone(),
        language: config.transcription_language.clone(),
        short_audio_threshold_secs: config.short_audio_threshold_secs,
        chunk_duration_secs: config.chunk_duration_secs,
        backoff: Backoff {
            initial: Duration::from_secs(config.operation_poll_initial_secs),
            multiplier: 2,
            max_delay: Duration::from_secs(config.operation_poll_max_secs),
            max_attempts: config.operation_poll_max_attempts,
        },
    };

    let pipeline = pipeline::build(config.transcription_provider, collaborators, settings);

    Ok(Scheduler::new(
        store,
        pipeline,
        Settings {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            batch_size: config.batch_size,
        },
    ))
}

fn cloud_speech_client(
    config: &Config,
) -> Result<Option<Arc<dyn recognition::Provider>>, Error> {
    let (Some(api_key), Some(folder_id)) =
        (config.cloud_speech_api_key(), config.cloud_speech_folder_id())
    else {
        return Ok(None);
    };

    info!(
        "Cloud speech client configured (API key {})",
        config.masked_cloud_speech_api_key()
    );
    let client = CloudSpeechClient::new(
        SecretString::new(api_key),
        folder_id,
        Endpoints {
            recognize_url: config.cloud_speech_recognize_url().to_string(),
            long_running_url: config.cloud_speech_long_running_url().to_string(),
            operations_url: config.cloud_speech_operations_url().to_string(),
        },
    )?;
    let client: Arc<dyn recognition::Provider> = Arc::new(client);
    Ok(Some(client))
}

async fn ml_service_client(
    config: &Config,
) -> Result<Option<Arc<dyn speech_pipeline::Provider>>, Error> {
    let Some(url) = config.ml_service_url() else {
        info!("ML service not configured");
        return Ok(None);
    };

    let client = MlServiceClient::new(&url)?;
    match speech_pipeline::Provider::health(&client).await {
        Ok(()) => info!("ML service at {url} is healthy"),
        Err(e) => warn!("ML service at {url} failed its health check: {e}"),
    }
    let client: Arc<dyn speech_pipeline::Provider> = Arc::new(client);
    Ok(Some(client))
}

fn object_storage_client(
    config: &Config,
) -> Result<Option<Arc<dyn object_storage::Provider>>, Error> {
    if !config.has_object_storage() {
        info!("Object storage not configured; long cloud recordings will be chunked");
        return Ok(None);
    }

    let storage = S3ObjectStorage::new(
        config.object_storage_endpoint(),
        config.object_storage_region(),
        config.object_storage_bucket().unwrap_or_default(),
        config.object_storage_access_key().unwrap_or_default(),
        SecretString::new(config.object_storage_secret_key().unwrap_or_default()),
    )?;
    info!(
        "Object storage configured at {}",
        config.object_storage_endpoint()
    );
    let storage: Arc<dyn object_storage::Provider> = Arc::new(storage);
    Ok(Some(storage))
}
