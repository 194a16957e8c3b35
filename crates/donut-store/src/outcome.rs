use std::io;
use std::path::PathBuf;

use crate::error::{AbortCause, WriterError, WriterResult};

/// Whether the session finished cleanly or had a failure recorded against it.
#[derive(Debug)]
pub enum CloseStatus {
    /// All data was committed and no failure was recorded.
    Committed,
    /// The data handle was released, but the session had been aborted.
    Aborted(AbortCause),
}

/// Result of persisting one metadata sidecar.
#[derive(Debug)]
pub enum SidecarStatus {
    Persisted,
    Failed { path: PathBuf, error: io::Error },
    /// The writer has no sidecars (in-memory writers).
    Skipped,
}

impl SidecarStatus {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }
}

/// Outcome of both sidecar documents, observed independently.
#[derive(Debug)]
pub struct SidecarReport {
    pub metadata: SidecarStatus,
    pub engine_metadata: SidecarStatus,
}

impl SidecarReport {
    pub(crate) fn skipped() -> Self {
        Self {
            metadata: SidecarStatus::Skipped,
            engine_metadata: SidecarStatus::Skipped,
        }
    }

    /// Returns `true` if both documents were written.
    pub fn all_persisted(&self) -> bool {
        self.metadata.is_persisted() && self.engine_metadata.is_persisted()
    }

    /// Fail with the first sidecar error, metadata before engine metadata.
    pub(crate) fn into_checked(self) -> WriterResult<Self> {
        match (self.metadata, self.engine_metadata) {
            (SidecarStatus::Failed { path, error }, _)
            | (_, SidecarStatus::Failed { path, error }) => Err(WriterError::Sidecar {
                path,
                source: error,
            }),
            (metadata, engine_metadata) => Ok(Self {
                metadata,
                engine_metadata,
            }),
        }
    }
}

/// What a successful finalization produced.
///
/// `status` separates a clean commit from one with a prior abort; `sidecars`
/// reports metadata persistence independently of the data commit.
#[derive(Debug)]
pub struct CloseOutcome {
    pub status: CloseStatus,
    pub bytes_written: u64,
    pub sidecars: SidecarReport,
}

impl CloseOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self.status, CloseStatus::Committed)
    }

    /// Collapse into a plain result, turning a prior abort into
    /// [`WriterError::Aborted`].
    pub fn into_result(self) -> WriterResult<Self> {
        let Self {
            status,
            bytes_written,
            sidecars,
        } = self;
        match status {
            CloseStatus::Aborted(cause) => Err(WriterError::Aborted(cause)),
            CloseStatus::Committed => Ok(Self {
                status: CloseStatus::Committed,
                bytes_written,
                sidecars,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: CloseStatus) -> CloseOutcome {
        CloseOutcome {
            status,
            bytes_written: 11,
            sidecars: SidecarReport {
                metadata: SidecarStatus::Persisted,
                engine_metadata: SidecarStatus::Persisted,
            },
        }
    }

    #[test]
    fn committed_into_result_is_ok() {
        let out = outcome(CloseStatus::Committed).into_result().unwrap();
        assert!(out.is_committed());
        assert_eq!(out.bytes_written, 11);
        assert!(out.sidecars.all_persisted());
    }

    #[test]
    fn aborted_into_result_surfaces_cause() {
        let err = outcome(CloseStatus::Aborted("upstream hung up".into()))
            .into_result()
            .unwrap_err();
        match err {
            WriterError::Aborted(cause) => assert_eq!(cause.to_string(), "upstream hung up"),
            other => panic!("expected Aborted, got {other:?}"),
        }
    }

    #[test]
    fn first_sidecar_failure_wins() {
        let report = SidecarReport {
            metadata: SidecarStatus::Persisted,
            engine_metadata: SidecarStatus::Failed {
                path: PathBuf::from("/o/donutMetadata.json"),
                error: io::Error::other("full"),
            },
        };
        assert!(!report.all_persisted());
        match report.into_checked() {
            Err(WriterError::Sidecar { path, .. }) => {
                assert_eq!(path, PathBuf::from("/o/donutMetadata.json"))
            }
            other => panic!("expected Sidecar, got {other:?}"),
        }
        assert!(SidecarReport::skipped().into_checked().is_ok());
    }
}
