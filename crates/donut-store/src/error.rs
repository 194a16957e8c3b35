use std::io;
use std::path::PathBuf;

/// A failure recorded against a write session by the caller.
///
/// Typically the error that made an upstream producer give up half-way
/// through streaming an object.
pub type AbortCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from object writer operations.
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// The object's data file already exists: the object was already created.
    #[error("object already exists in {dir}")]
    AlreadyExists { dir: PathBuf },

    /// The object directory does not exist.
    #[error("object directory not found: {dir}")]
    DirectoryNotFound { dir: PathBuf },

    /// The object directory is not writable.
    #[error("permission denied creating object in {dir}")]
    PermissionDenied { dir: PathBuf },

    /// I/O error on one of the object's artifacts.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A write to the data file failed after `written` bytes of the chunk.
    #[error("short write to {path} after {written} bytes: {source}")]
    ShortWrite {
        path: PathBuf,
        written: usize,
        #[source]
        source: io::Error,
    },

    /// A metadata sidecar document could not be persisted.
    #[error("failed to persist sidecar {path}: {source}")]
    Sidecar {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Serialization of a metadata map failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The session was aborted by a recorded failure.
    #[error("write session aborted: {0}")]
    Aborted(#[source] AbortCause),

    /// The writer has already been finalized.
    #[error("object writer is closed")]
    Closed,
}

impl WriterError {
    /// Classify an error from opening the data file of `dir`.
    pub(crate) fn from_open(dir: PathBuf, path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::AlreadyExists => Self::AlreadyExists { dir },
            io::ErrorKind::NotFound => Self::DirectoryNotFound { dir },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { dir },
            _ => Self::Io { path, source },
        }
    }

    /// Returns `true` if the object had already been created.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Bytes of the failed chunk that reached the data file before the error.
    pub fn partial_count(&self) -> usize {
        match self {
            Self::ShortWrite { written, .. } => *written,
            _ => 0,
        }
    }

    /// Returns `true` if the writer had already been finalized.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl From<WriterError> for io::Error {
    fn from(err: WriterError) -> Self {
        match err {
            WriterError::Io { source, .. }
            | WriterError::ShortWrite { source, .. }
            | WriterError::Sidecar { source, .. } => source,
            WriterError::AlreadyExists { .. } => io::Error::new(io::ErrorKind::AlreadyExists, err),
            WriterError::DirectoryNotFound { .. } => io::Error::new(io::ErrorKind::NotFound, err),
            WriterError::PermissionDenied { .. } => {
                io::Error::new(io::ErrorKind::PermissionDenied, err)
            }
            other => io::Error::other(other),
        }
    }
}

/// Result alias for object writer operations.
pub type WriterResult<T> = Result<T, WriterError>;
