//! Object storage provider trait.

use crate::Error;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Upload a local file under `key` and return a URI the recognizer can fetch.
    async fn put_file(&self, key: &str, file: &Path) -> Result<String, Error>;

    async fn delete(&self, key: &str) -> Result<(), Error>;
}
