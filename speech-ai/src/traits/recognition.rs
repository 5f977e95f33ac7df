//! Cloud speech recognition provider trait.

use crate::types::recognition::LongRunningOperation;
use crate::Error;
use async_trait::async_trait;
use std::path::Path;

/// Hosted speech-to-text service.
///
/// Short audio is recognized in one blocking call. Long audio is submitted by URI and
/// completes asynchronously; callers poll `get_operation` until it reports done.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Recognize a short normalized audio file and return its text.
    async fn recognize(&self, audio: &Path, language: &str) -> Result<String, Error>;

    /// Submit audio already uploaded to `audio_uri`. Returns the operation id.
    async fn start_long_running(&self, audio_uri: &str, language: &str) -> Result<String, Error>;

    /// Fetch the current state of a long-running operation.
    ///
    /// Transport failures come back as transient errors; a non-success answer from
    /// the service is not worth retrying.
    async fn get_operation(&self, operation_id: &str) -> Result<LongRunningOperation, Error>;

    /// Lowercase identifier used in logs.
    fn provider_id(&self) -> &str;
}
