//! Path resolution for telemetry files

use std::path::PathBuf;

/// Overrides the data directory, mainly for tests and sandboxes
pub const HOME_ENV: &str = "AIDROUTE_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub root: PathBuf,
}

impl Paths {
    /// `$AIDROUTE_HOME` when set, else `~/.aidroute`
    pub fn new() -> std::io::Result<Self> {
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_root(root));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;
        Ok(Self::with_root(home.join(".aidroute")))
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn passes_file(&self) -> PathBuf {
        self.root.join("passes.jsonl")
    }

    /// Routing snapshot written after the last applied scenario
    pub fn snapshot_file(&self) -> PathBuf {
        self.root.join("last_snapshot.json")
    }
}
