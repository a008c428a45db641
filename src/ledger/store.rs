/// Durable storage for the ordered block sequence.
///
/// The whole sequence is read and written as one document. Writes go to
/// a sibling temp file which is synced and then renamed over the target,
/// so a reader never observes a half-written ledger.
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::block::Block;
use crate::error::{LedgerError, Result};

/// Trait for pluggable ledger persistence.
pub trait LedgerStore: Send + Sync {
    /// Read the full persisted sequence. `None` if nothing has been persisted yet.
    fn load(&self) -> Result<Option<Vec<Block>>>;

    /// Replace the persisted sequence with `blocks`.
    fn save(&self, blocks: &[Block]) -> Result<()>;
}

/// Ledger persisted as a pretty-printed JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "chain.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<Block>>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LedgerError::Io(e)),
        };

        let blocks: Vec<Block> = serde_json::from_slice(&bytes).map_err(|e| {
            LedgerError::CorruptLedger(format!("{}: {e}", self.path.display()))
        })?;

        if blocks.is_empty() {
            return Err(LedgerError::CorruptLedger(format!(
                "{}: persisted chain is empty",
                self.path.display()
            )));
        }

        debug!(path = %self.path.display(), blocks = blocks.len(), "Ledger loaded");
        Ok(Some(blocks))
    }

    fn save(&self, blocks: &[Block]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec_pretty(blocks)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        // Write atomically via temp file
        let temp_path = self.temp_path();
        let written =
            write_synced(&temp_path, &json).and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                debug!(path = %temp_path.display(), error = %cleanup, "Temp file not removed");
            }
            return Err(LedgerError::Io(e));
        }

        debug!(path = %self.path.display(), blocks = blocks.len(), "Ledger saved");
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// In-process ledger store, for tests and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blocks: Mutex<Option<Vec<Block>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Option<Vec<Block>>> {
        self.blocks.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<Block>>> {
        Ok(self.guard().clone())
    }

    fn save(&self, blocks: &[Block]) -> Result<()> {
        *self.guard() = Some(blocks.to_vec());
        Ok(())
    }
}
