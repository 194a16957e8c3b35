//! Object writer for the donut disk storage layer.
//!
//! An object lives in its own directory as one raw data file plus two JSON
//! sidecar documents:
//!
//! ```text
//! <object-dir>/
//! ├── data                 ← raw bytes, exclusive-create
//! ├── metadata.json        ← object metadata   (string → string)
//! └── donutMetadata.json   ← engine metadata   (string → string)
//! ```
//!
//! # Writers
//!
//! All writers implement the [`ObjectWriter`] trait:
//!
//! - [`DiskObjectWriter`] -- writes the layout above
//! - [`InMemoryObjectWriter`] -- buffer-backed writer for tests and embedding
//!
//! # Session Rules
//!
//! 1. Opening creates the data file exclusively; a second writer for the same
//!    directory fails with [`WriterError::AlreadyExists`].
//! 2. Writes are unbuffered sequential appends.
//! 3. The two metadata maps are independent, replaced wholesale, and only
//!    persisted at close.
//! 4. The first failure recorded against a session wins and is reported by
//!    [`CloseOutcome::status`].
//! 5. Closing twice is an error ([`WriterError::Closed`]), never a second
//!    finalization.
//!
//! # Example
//!
//! ```no_run
//! use donut_store::{DiskObjectWriter, Metadata, ObjectWriter};
//!
//! let mut writer = DiskObjectWriter::open("/srv/donut/bucket/object")?;
//! writer.write(b"hello world")?;
//! writer.set_metadata([("contentType", "text/plain")].into_iter().collect::<Metadata>())?;
//! let outcome = writer.close()?.into_result()?;
//! assert!(outcome.sidecars.all_persisted());
//! # Ok::<(), donut_store::WriterError>(())
//! ```

pub mod config;
pub mod disk;
pub mod error;
pub mod layout;
pub mod memory;
pub mod metadata;
pub mod outcome;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{SidecarPolicy, WriterConfig};
pub use disk::DiskObjectWriter;
pub use error::{AbortCause, WriterError, WriterResult};
pub use layout::{ObjectLayout, DATA_FILE, ENGINE_METADATA_FILE, METADATA_FILE};
pub use memory::{FinalizedObject, InMemoryObjectWriter};
pub use metadata::Metadata;
pub use outcome::{CloseOutcome, CloseStatus, SidecarReport, SidecarStatus};
pub use traits::ObjectWriter;

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive any writer through a full session and return its outcome.
    fn store_object(writer: &mut dyn ObjectWriter, chunks: &[&[u8]]) -> CloseOutcome {
        for chunk in chunks {
            assert_eq!(writer.write(chunk).unwrap(), chunk.len());
        }
        writer
            .set_metadata([("size", "11")].into_iter().collect())
            .unwrap();
        writer
            .set_engine_metadata([("format", "v1")].into_iter().collect())
            .unwrap();
        writer.close().unwrap()
    }

    #[test]
    fn disk_and_memory_writers_agree() {
        let dir = tempfile::tempdir().unwrap();
        let chunks: &[&[u8]] = &[b"hello ", b"world"];

        let mut disk = DiskObjectWriter::open(dir.path()).unwrap();
        let disk_outcome = store_object(&mut disk, chunks);

        let mut memory = InMemoryObjectWriter::new();
        let memory_outcome = store_object(&mut memory, chunks);

        assert_eq!(disk_outcome.bytes_written, memory_outcome.bytes_written);
        assert!(disk_outcome.is_committed() && memory_outcome.is_committed());

        let object = memory.into_finalized().unwrap();
        let layout = disk.layout();
        assert_eq!(std::fs::read(layout.data_path()).unwrap(), object.data);
        assert_eq!(
            Metadata::from_json_slice(&std::fs::read(layout.metadata_path()).unwrap()).unwrap(),
            object.metadata
        );
        assert_eq!(
            Metadata::from_json_slice(&std::fs::read(layout.engine_metadata_path()).unwrap())
                .unwrap(),
            object.engine_metadata
        );
    }

    #[test]
    fn aborted_session_collapses_to_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = DiskObjectWriter::open(dir.path()).unwrap();
        writer.write(b"half").unwrap();

        let err = writer
            .close_with_error("client disconnected".into())
            .and_then(CloseOutcome::into_result)
            .unwrap_err();
        assert_eq!(err.to_string(), "write session aborted: client disconnected");
    }
}
