use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while serving an `extract_file` call.
///
/// On the wire all variants collapse to a single tool execution error code;
/// the variant only shows up in the message text and in the logs.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(#[source] serde_json::Error),

    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tika answered with a non-success status
    #[error("Tika returned HTTP {status} for {endpoint}: {body}")]
    RemoteService {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("could not reach Tika: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Tika metadata response is not a JSON object: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("extraction worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ExtractionError {
    /// Map a file read failure, keeping "does not exist" distinct
    pub fn from_read(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ExtractionError::NotFound { path }
        } else {
            ExtractionError::Io { path, source }
        }
    }
}
