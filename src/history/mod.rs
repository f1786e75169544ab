// Persisted invocation record — the two command strings remembered from
// the previous run, one file per container name.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// The build and run command strings a previous reconciliation converged
/// on. Either line may be empty: a pulled image has no build command, and
/// a container that never reached a running state has neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandRecord {
    pub build: String,
    pub run: String,
}

/// On-disk store for command records under an injected state directory.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    root: PathBuf,
}

impl HistoryStore {
    /// Open the store, creating the state directory if needed. Failure
    /// here surfaces before any runtime call is made.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Read the record for a container. A missing file reads as an empty
    /// record — the first invocation has nothing to compare against.
    pub fn load(&self, name: &str) -> io::Result<CommandRecord> {
        match fs::read_to_string(self.record_path(name)) {
            Ok(contents) => {
                let mut lines = contents.lines();
                Ok(CommandRecord {
                    build: lines.next().unwrap_or_default().to_string(),
                    run: lines.next().unwrap_or_default().to_string(),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(CommandRecord::default()),
            Err(e) => Err(e),
        }
    }

    /// Overwrite the record atomically: write a sibling temp file, then
    /// rename it over the record. A crash mid-write leaves the previous
    /// record intact.
    pub fn save(&self, name: &str, record: &CommandRecord) -> io::Result<()> {
        let path = self.record_path(name);
        let tmp = self.root.join(format!("{name}.tmp"));
        fs::write(&tmp, format!("{}\n{}\n", record.build, record.run))?;
        fs::rename(&tmp, &path)?;
        debug!(container = name, path = %path.display(), "saved command record");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
