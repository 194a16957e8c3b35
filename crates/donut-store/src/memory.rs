use crate::error::{AbortCause, WriterError, WriterResult};
use crate::metadata::Metadata;
use crate::outcome::{CloseOutcome, CloseStatus, SidecarReport};
use crate::traits::ObjectWriter;

/// An object as captured by [`InMemoryObjectWriter`] at finalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FinalizedObject {
    pub data: Vec<u8>,
    pub metadata: Metadata,
    pub engine_metadata: Metadata,
}

/// In-memory object writer.
///
/// Intended for tests and embedding. Follows the same session rules as
/// [`DiskObjectWriter`](crate::DiskObjectWriter) but appends to a buffer, and
/// finalization snapshots the object instead of writing sidecars.
#[derive(Default)]
pub struct InMemoryObjectWriter {
    data: Vec<u8>,
    metadata: Metadata,
    engine_metadata: Metadata,
    failure: Option<AbortCause>,
    finalized: Option<FinalizedObject>,
}

impl InMemoryObjectWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far (empty after finalization).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The object captured at finalization, if the writer has been closed.
    pub fn finalized(&self) -> Option<&FinalizedObject> {
        self.finalized.as_ref()
    }

    /// Consume the writer, returning the finalized object if it was closed.
    pub fn into_finalized(self) -> Option<FinalizedObject> {
        self.finalized
    }
}

impl ObjectWriter for InMemoryObjectWriter {
    fn write(&mut self, chunk: &[u8]) -> WriterResult<usize> {
        if self.is_closed() {
            return Err(WriterError::Closed);
        }
        self.data.extend_from_slice(chunk);
        Ok(chunk.len())
    }

    fn set_metadata(&mut self, metadata: Metadata) -> WriterResult<()> {
        if self.is_closed() {
            return Err(WriterError::Closed);
        }
        self.metadata = metadata;
        Ok(())
    }

    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn set_engine_metadata(&mut self, metadata: Metadata) -> WriterResult<()> {
        if self.is_closed() {
            return Err(WriterError::Closed);
        }
        self.engine_metadata = metadata;
        Ok(())
    }

    fn engine_metadata(&self) -> Metadata {
        self.engine_metadata.clone()
    }

    fn record_failure(&mut self, cause: AbortCause) -> WriterResult<()> {
        if self.is_closed() {
            return Err(WriterError::Closed);
        }
        if self.failure.is_none() {
            self.failure = Some(cause);
        }
        Ok(())
    }

    fn close(&mut self) -> WriterResult<CloseOutcome> {
        if self.is_closed() {
            return Err(WriterError::Closed);
        }
        let object = FinalizedObject {
            data: std::mem::take(&mut self.data),
            metadata: self.metadata.clone(),
            engine_metadata: self.engine_metadata.clone(),
        };
        let bytes_written = object.data.len() as u64;
        self.finalized = Some(object);

        let status = match self.failure.take() {
            Some(cause) => CloseStatus::Aborted(cause),
            None => CloseStatus::Committed,
        };
        Ok(CloseOutcome {
            status,
            bytes_written,
            sidecars: SidecarReport::skipped(),
        })
    }

    fn is_closed(&self) -> bool {
        self.finalized.is_some()
    }
}

impl std::fmt::Debug for InMemoryObjectWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectWriter")
            .field("buffered", &self.data.len())
            .field("closed", &self.is_closed())
            .field("aborted", &self.failure.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::SidecarStatus;

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs.iter().copied().collect()
    }

    #[test]
    fn captures_object_on_close() {
        let mut writer = InMemoryObjectWriter::new();
        assert_eq!(writer.write(b"hello ").unwrap(), 6);
        assert_eq!(writer.write(b"world").unwrap(), 5);
        assert_eq!(writer.data(), b"hello world");
        writer.set_metadata(meta(&[("a", "1")])).unwrap();
        writer.set_engine_metadata(meta(&[("b", "2")])).unwrap();

        let outcome = writer.close().unwrap();
        assert!(outcome.is_committed());
        assert_eq!(outcome.bytes_written, 11);
        assert!(matches!(outcome.sidecars.metadata, SidecarStatus::Skipped));

        let object = writer.into_finalized().unwrap();
        assert_eq!(object.data, b"hello world");
        assert_eq!(object.metadata, meta(&[("a", "1")]));
        assert_eq!(object.engine_metadata, meta(&[("b", "2")]));
    }

    #[test]
    fn replace_and_isolation() {
        let mut writer = InMemoryObjectWriter::new();
        writer.set_metadata(meta(&[("a", "1")])).unwrap();
        writer.set_metadata(meta(&[("b", "2")])).unwrap();
        assert_eq!(writer.metadata(), meta(&[("b", "2")]));
        assert!(writer.engine_metadata().is_empty());

        let mut copy = writer.metadata();
        copy.insert("c", "3");
        assert_eq!(writer.metadata(), meta(&[("b", "2")]));
    }

    #[test]
    fn first_failure_wins() {
        let mut writer = InMemoryObjectWriter::new();
        writer.record_failure("first".into()).unwrap();
        let outcome = writer.close_with_error("second".into()).unwrap();
        match outcome.status {
            CloseStatus::Aborted(cause) => assert_eq!(cause.to_string(), "first"),
            CloseStatus::Committed => panic!("expected an aborted session"),
        }
        assert!(writer.finalized().is_some());
    }

    #[test]
    fn closed_writer_rejects_mutation() {
        let mut writer = InMemoryObjectWriter::new();
        assert!(writer.finalized().is_none());
        writer.close().unwrap();

        assert!(writer.close().unwrap_err().is_closed());
        assert!(writer.write(b"x").unwrap_err().is_closed());
        assert!(writer.set_metadata(Metadata::new()).unwrap_err().is_closed());
        assert!(writer.record_failure("x".into()).unwrap_err().is_closed());
    }

    #[test]
    fn usable_as_trait_object() {
        let mut writer: Box<dyn ObjectWriter> = Box::new(InMemoryObjectWriter::new());
        writer.write(b"boxed").unwrap();
        assert!(!writer.is_closed());
        let outcome = writer.close().unwrap();
        assert_eq!(outcome.bytes_written, 5);
        assert!(writer.is_closed());
    }
}
