//! Media processing trait.

use crate::Error;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Probes, normalizes and splits local media files.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Duration in seconds.
    async fn probe_duration(&self, input: &Path) -> Result<f64, Error>;

    /// Produce mono audio in the recognizer's encoding inside `out_dir`.
    async fn transcode(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, Error>;

    /// Cut `input` into consecutive pieces of at most `chunk_secs` seconds, in order.
    ///
    /// On failure every piece already written is removed.
    async fn split(
        &self,
        input: &Path,
        out_dir: &Path,
        chunk_secs: u32,
    ) -> Result<Vec<PathBuf>, Error>;
}
