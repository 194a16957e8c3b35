use crate::error::{AbortCause, WriterResult};
use crate::metadata::Metadata;
use crate::outcome::CloseOutcome;

/// A single-object write session.
///
/// All implementations must satisfy these invariants:
/// - The session is `open → closed`; only `close` and `close_with_error`
///   leave the open state, and every mutating call after that fails with
///   [`WriterError::Closed`](crate::WriterError::Closed).
/// - Writes are sequential appends with no buffering or transformation.
/// - The two metadata maps are independent and replaced wholesale; getters
///   hand out owned copies.
/// - Metadata is persisted only at finalization.
/// - The first recorded failure wins and is reported by finalization.
pub trait ObjectWriter: Send {
    /// Append `chunk` to the object's data. Returns `chunk.len()` on success.
    fn write(&mut self, chunk: &[u8]) -> WriterResult<usize>;

    /// Replace the object-level metadata map.
    fn set_metadata(&mut self, metadata: Metadata) -> WriterResult<()>;

    /// A copy of the object-level metadata map.
    fn metadata(&self) -> Metadata;

    /// Replace the engine-level metadata map.
    fn set_engine_metadata(&mut self, metadata: Metadata) -> WriterResult<()>;

    /// A copy of the engine-level metadata map.
    fn engine_metadata(&self) -> Metadata;

    /// Record a failure against the session without finalizing it.
    ///
    /// Only the first recorded failure is kept.
    fn record_failure(&mut self, cause: AbortCause) -> WriterResult<()>;

    /// Finalize the session: persist metadata and release the data.
    fn close(&mut self) -> WriterResult<CloseOutcome>;

    /// Returns `true` once the session has been finalized.
    fn is_closed(&self) -> bool;

    /// Record `cause` and finalize. The outcome carries the first recorded
    /// failure, which may predate `cause`.
    fn close_with_error(&mut self, cause: AbortCause) -> WriterResult<CloseOutcome> {
        self.record_failure(cause)?;
        self.close()
    }
}
