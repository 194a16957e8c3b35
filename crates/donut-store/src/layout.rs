use std::path::{Path, PathBuf};

/// File name of the raw data stream inside an object directory.
pub const DATA_FILE: &str = "data";

/// File name of the object-level metadata sidecar.
pub const METADATA_FILE: &str = "metadata.json";

/// File name of the engine-level metadata sidecar.
pub const ENGINE_METADATA_FILE: &str = "donutMetadata.json";

/// Paths of the artifacts that make up one object on disk.
///
/// ```text
/// <object-dir>/
/// ├── data                 ← raw bytes, exclusive-create
/// ├── metadata.json        ← object metadata
/// └── donutMetadata.json   ← engine metadata
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectLayout {
    root: PathBuf,
}

impl ObjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The object directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_path(&self) -> PathBuf {
        self.root.join(DATA_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    pub fn engine_metadata_path(&self) -> PathBuf {
        self.root.join(ENGINE_METADATA_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifacts_live_beside_each_other() {
        let layout = ObjectLayout::new("/tmp/obj1");
        assert_eq!(layout.root(), Path::new("/tmp/obj1"));
        assert_eq!(layout.data_path(), PathBuf::from("/tmp/obj1/data"));
        assert_eq!(layout.metadata_path(), PathBuf::from("/tmp/obj1/metadata.json"));
        assert_eq!(
            layout.engine_metadata_path(),
            PathBuf::from("/tmp/obj1/donutMetadata.json")
        );
    }
}
