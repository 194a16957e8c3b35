use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::config::{SidecarPolicy, WriterConfig};
use crate::error::{AbortCause, WriterError, WriterResult};
use crate::layout::ObjectLayout;
use crate::metadata::Metadata;
use crate::outcome::{CloseOutcome, CloseStatus, SidecarReport, SidecarStatus};
use crate::traits::ObjectWriter;

enum State {
    Open(File),
    Closed,
}

/// Filesystem-backed object writer.
///
/// Owns the exclusively created `<dir>/data` file for the lifetime of the
/// session. Chunks go straight to the file; both metadata maps stay in memory
/// until [`close`](ObjectWriter::close), which writes them as
/// `metadata.json` and `donutMetadata.json` beside the data and then releases
/// the handle.
///
/// A writer dropped without being closed releases its handle but persists no
/// metadata.
pub struct DiskObjectWriter {
    layout: ObjectLayout,
    state: State,
    metadata: Metadata,
    engine_metadata: Metadata,
    /// First failure recorded against the session.
    failure: Option<AbortCause>,
    bytes_written: u64,
    config: WriterConfig,
}

impl DiskObjectWriter {
    /// Create the data file in `dir` with the default configuration.
    pub fn open(dir: impl AsRef<Path>) -> WriterResult<Self> {
        Self::open_with_config(dir, WriterConfig::default())
    }

    /// Create the data file in `dir`.
    ///
    /// The directory must already exist. Fails with
    /// [`WriterError::AlreadyExists`] if the object has been created before;
    /// an existing data file is never truncated or appended to.
    pub fn open_with_config(dir: impl AsRef<Path>, config: WriterConfig) -> WriterResult<Self> {
        let layout = ObjectLayout::new(dir.as_ref());
        let path = layout.data_path();

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(config.file_mode);
        }

        let file = options
            .open(&path)
            .map_err(|e| WriterError::from_open(layout.root().to_path_buf(), path, e))?;

        debug!(dir = %layout.root().display(), "object writer opened");
        Ok(Self {
            layout,
            state: State::Open(file),
            metadata: Metadata::new(),
            engine_metadata: Metadata::new(),
            failure: None,
            bytes_written: 0,
            config,
        })
    }

    /// Paths of the object's on-disk artifacts.
    pub fn layout(&self) -> &ObjectLayout {
        &self.layout
    }

    /// Total bytes appended to the data file so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    fn persist_sidecars(&self) -> SidecarReport {
        SidecarReport {
            metadata: self.persist_sidecar(&self.metadata, self.layout.metadata_path()),
            engine_metadata: self
                .persist_sidecar(&self.engine_metadata, self.layout.engine_metadata_path()),
        }
    }

    fn persist_sidecar(&self, metadata: &Metadata, path: PathBuf) -> SidecarStatus {
        match write_sidecar(self.layout.root(), &path, metadata, &self.config) {
            Ok(()) => SidecarStatus::Persisted,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "failed to persist metadata sidecar");
                SidecarStatus::Failed { path, error }
            }
        }
    }
}

/// A data handle that can be flushed to stable storage before release.
trait SyncHandle {
    fn sync_all(&self) -> io::Result<()>;
}

impl SyncHandle for File {
    fn sync_all(&self) -> io::Result<()> {
        File::sync_all(self)
    }
}

/// Release the data handle, syncing it first when `sync` is set so that
/// device errors become the close result.
fn release<H: SyncHandle>(handle: H, layout: &ObjectLayout, sync: bool) -> WriterResult<()> {
    if sync {
        handle.sync_all().map_err(|source| WriterError::Io {
            path: layout.data_path(),
            source,
        })?;
    }
    drop(handle);
    Ok(())
}

/// Decide the close result. A recorded failure outranks a failed release.
fn settle(released: WriterResult<()>, failure: Option<AbortCause>) -> WriterResult<CloseStatus> {
    match (released, failure) {
        (Err(err), Some(cause)) => {
            warn!(error = %err, "data file release failed after session abort");
            Err(WriterError::Aborted(cause))
        }
        (Err(err), None) => Err(err),
        (Ok(()), Some(cause)) => Ok(CloseStatus::Aborted(cause)),
        (Ok(()), None) => Ok(CloseStatus::Committed),
    }
}

impl ObjectWriter for DiskObjectWriter {
    fn write(&mut self, chunk: &[u8]) -> WriterResult<usize> {
        let State::Open(file) = &mut self.state else {
            return Err(WriterError::Closed);
        };

        let result = append_chunk(file, chunk, &self.layout);
        let accepted = match &result {
            Ok(n) => *n,
            Err(err) => err.partial_count(),
        };
        self.bytes_written += accepted as u64;

        trace!(len = accepted, total = self.bytes_written, "object data appended");
        result
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
        if self.failure.is_some() {
            debug!(ignored = %cause, "session failure already recorded");
            return Ok(());
        }
        debug!(dir = %self.layout.root().display(), cause = %cause, "session failure recorded");
        self.failure = Some(cause);
        Ok(())
    }

    fn close(&mut self) -> WriterResult<CloseOutcome> {
        let State::Open(file) = std::mem::replace(&mut self.state, State::Closed) else {
            return Err(WriterError::Closed);
        };

        let sidecars = self.persist_sidecars();
        let released = release(file, &self.layout, self.config.sync_on_close);
        let failure = self.failure.take();

        debug!(
            dir = %self.layout.root().display(),
            bytes = self.bytes_written,
            aborted = failure.is_some(),
            sidecars_persisted = sidecars.all_persisted(),
            "object writer closed"
        );

        let status = settle(released, failure)?;

        let sidecars = match (&status, self.config.sidecar_policy) {
            (CloseStatus::Committed, SidecarPolicy::Strict) => sidecars.into_checked()?,
            _ => sidecars,
        };

        Ok(CloseOutcome {
            status,
            bytes_written: self.bytes_written,
            sidecars,
        })
    }

    fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }
}

/// Byte-sink view of the writer, for use with `std::io::copy` and friends.
///
/// A chunk that was only partly appended reports the accepted prefix as
/// `Ok`, so the error surfaces on the caller's next write for the rest.
impl io::Write for DiskObjectWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io_write_result(ObjectWriter::write(self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        // Writes are unbuffered.
        Ok(())
    }
}

impl Drop for DiskObjectWriter {
    fn drop(&mut self) {
        if !self.is_closed() {
            warn!(
                dir = %self.layout.root().display(),
                "object writer dropped without close; metadata not persisted"
            );
        }
    }
}

impl std::fmt::Debug for DiskObjectWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskObjectWriter")
            .field("dir", &self.layout.root())
            .field("closed", &self.is_closed())
            .field("bytes_written", &self.bytes_written)
            .field("aborted", &self.failure.is_some())
            .finish()
    }
}

/// Write all of `chunk`, retrying interrupted writes.
///
/// Returns the number of bytes accepted alongside the first hard error.
fn append_all<W: io::Write>(sink: &mut W, chunk: &[u8]) -> (usize, io::Result<()>) {
    let mut written = 0;
    while written < chunk.len() {
        match sink.write(&chunk[written..]) {
            Ok(0) => return (written, Err(io::ErrorKind::WriteZero.into())),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return (written, Err(e)),
        }
    }
    (written, Ok(()))
}

/// Append `chunk` to the data file, naming it in a short-write error.
fn append_chunk<W: io::Write>(
    sink: &mut W,
    chunk: &[u8],
    layout: &ObjectLayout,
) -> WriterResult<usize> {
    match append_all(sink, chunk) {
        (written, Ok(())) => Ok(written),
        (written, Err(source)) => Err(WriterError::ShortWrite {
            path: layout.data_path(),
            written,
            source,
        }),
    }
}

/// Map a chunk write onto the `io::Write` contract, where `Err` means
/// nothing was written.
fn io_write_result(result: WriterResult<usize>) -> io::Result<usize> {
    match result {
        Err(WriterError::ShortWrite { written, .. }) if written > 0 => Ok(written),
        other => other.map_err(io::Error::from),
    }
}

/// Replace `path` with the JSON form of `metadata`.
///
/// The document is staged in a temporary file in `dir`, created with the
/// configured file mode, and renamed over `path`, so readers never see a
/// torn sidecar.
fn write_sidecar(
    dir: &Path,
    path: &Path,
    metadata: &Metadata,
    config: &WriterConfig,
) -> io::Result<()> {
    let encoded = metadata.to_json_bytes()?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(".sidecar-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(config.file_mode));
    }
    let mut staged = builder.tempfile_in(dir)?;

    io::Write::write_all(&mut staged, &encoded)?;
    if config.sync_on_close {
        staged.as_file().sync_all()?;
    }
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}
