use std::path::{Path, PathBuf};

/// Errors raised by the search core.
///
/// Every variant is structural: a missing precondition or malformed input.
/// Nothing here is transient, so callers should not retry.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A persisted artifact or input file does not exist
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Invalid configuration or degenerate fit input
    #[error("configuration error: {0}")]
    Config(String),

    /// A corpus record could not be parsed
    #[error("malformed record on line {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A persisted artifact failed validation
    #[error("corrupt artifact {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn corrupt<P: AsRef<Path>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::Corrupt {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Map an IO error on `path` to `NotFound` when the file is absent.
    pub(crate) fn from_io(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io(err)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
