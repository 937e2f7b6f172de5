use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ExtractionError;
use crate::tika::{ExtractionResult, TikaClient};

/// Trait for turning a file on disk into an [`ExtractionResult`]
#[async_trait]
pub trait FileExtractor: Send + Sync {
    /// Extracts metadata and text from the file at `file_path`
    ///
    /// # Arguments
    /// * `file_path` - Path to the document file
    /// * `tika_url` - Base URL of the Tika server to use
    ///
    /// # Returns
    /// * `Ok(ExtractionResult)` - Metadata and text content
    /// * `Err` - Missing or unreadable file, or any Tika failure
    async fn extract(&self, file_path: &str, tika_url: &str) -> Result<ExtractionResult, ExtractionError>;
}

/// Reads the file and calls Tika on tokio's blocking pool.
///
/// Nothing is cached: every call re-reads the file and re-queries Tika.
#[derive(Debug, Clone, Default)]
pub struct TikaExtractor {
    timeout: Option<Duration>,
}

impl TikaExtractor {
    pub fn new(timeout: Option<Duration>) -> Self {
        TikaExtractor { timeout }
    }
}

#[async_trait]
impl FileExtractor for TikaExtractor {
    async fn extract(&self, file_path: &str, tika_url: &str) -> Result<ExtractionResult, ExtractionError> {
        let path = PathBuf::from(file_path);
        let tika_url = tika_url.to_string();
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || {
            let file_bytes = std::fs::read(&path).map_err(|e| ExtractionError::from_read(path.clone(), e))?;
            debug!(path = %path.display(), bytes = file_bytes.len(), "Read file for extraction");

            let client = TikaClient::new(timeout)?;
            client.fetch(&file_bytes, &tika_url)
        })
        .await?
    }
}
