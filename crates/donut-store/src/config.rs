use serde::{Deserialize, Serialize};

/// How finalization treats a metadata sidecar that cannot be persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidecarPolicy {
    /// Log the failure and report it in the close outcome; the close itself
    /// still succeeds.
    #[default]
    BestEffort,
    /// Fail the close with the first sidecar error.
    Strict,
}

/// Configuration for a disk-backed object writer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Permission bits for the data file (Unix only).
    pub file_mode: u32,
    /// Whether the data file is fsynced before its handle is released, so
    /// that device errors surface as the close result.
    pub sync_on_close: bool,
    /// Treatment of sidecar persistence failures.
    pub sidecar_policy: SidecarPolicy,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            file_mode: 0o600,
            sync_on_close: true,
            sidecar_policy: SidecarPolicy::default(),
        }
    }
}

impl WriterConfig {
    /// A configuration that fails the close when either sidecar cannot be
    /// written.
    pub fn strict() -> Self {
        Self {
            sidecar_policy: SidecarPolicy::Strict,
            ..Default::default()
        }
    }

    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    pub fn with_sync_on_close(mut self, sync: bool) -> Self {
        self.sync_on_close = sync;
        self
    }

    pub fn with_sidecar_policy(mut self, policy: SidecarPolicy) -> Self {
        self.sidecar_policy = policy;
        self
    }
}
