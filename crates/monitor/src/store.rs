//! Durable JSON state for buyback targets.
//!
//! One file per store, one record per target name. Writes go through a
//! temp file and an atomic rename. Read-modify-write cycles are a single
//! unit: serialized in-process by a mutex and across processes by an
//! exclusive advisory lock on a sidecar file, with a version counter that
//! surfaces `StateConflict` on writers that bypass the lock.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use folio_core::Error;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buyback::TargetState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateFile {
    version: u64,
    targets: BTreeMap<String, TargetState>,
}

pub struct BuybackStateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl BuybackStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<StateFile> {
        if !self.path.exists() {
            return Ok(StateFile::default());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading state file {}", self.path.display()))?;
        let file = serde_json::from_str(&raw)
            .with_context(|| format!("parsing state file {}", self.path.display()))?;
        Ok(file)
    }

    fn write_file(&self, file: &StateFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let raw = serde_json::to_string_pretty(file)?;
        fs::write(&tmp, raw)
            .with_context(|| format!("writing state file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Reads one target's record.
    pub fn get(&self, target: &str) -> Result<Option<TargetState>> {
        Ok(self.read_file()?.targets.get(target).cloned())
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Read-modify-write for a single target as one unit. The closure sees
    /// the current record (if any) and returns its successor. The whole
    /// cycle runs under an exclusive lock on a sidecar file, so two
    /// processes updating the same store cannot interleave. A writer that
    /// bumped the file version without taking the lock still surfaces as
    /// `StateConflict` instead of a lost update.
    pub fn update<F>(&self, target: &str, apply: F) -> Result<TargetState>
    where
        F: FnOnce(Option<&TargetState>) -> TargetState,
    {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock_file = fs::File::create(self.lock_path())
            .with_context(|| format!("creating lock file {}", self.lock_path().display()))?;
        lock_file
            .lock_exclusive()
            .with_context(|| format!("locking {}", self.lock_path().display()))?;
        let result = self.update_locked(target, apply);
        let _ = lock_file.unlock();
        result
    }

    fn update_locked<F>(&self, target: &str, apply: F) -> Result<TargetState>
    where
        F: FnOnce(Option<&TargetState>) -> TargetState,
    {
        let mut file = self.read_file()?;
        let loaded_version = file.version;

        let next = apply(file.targets.get(target));

        // Detect a writer that bypassed the lock after our read.
        let on_disk = self.read_file()?;
        if on_disk.version != loaded_version {
            return Err(Error::StateConflict {
                target: target.to_string(),
            }
            .into());
        }

        file.targets.insert(target.to_string(), next.clone());
        file.version = loaded_version + 1;
        self.write_file(&file)?;
        debug!(target, version = file.version, "state persisted");
        Ok(next)
    }
}
