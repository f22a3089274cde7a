//! Snapshot file handoff to the desktop widget
//!
//! The widget reads `stock.dat.json` on its own schedule and uses
//! `stock.dat.lock` as the freshness signal. Each publish writes the full
//! body to a sibling temp file, syncs it, renames it into place and only
//! then touches the lock. The lock is removed when the writer is dropped.

use chrono::{DateTime, Local, NaiveDate};
use serde::Deserialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::common::errors::Result;
use crate::common::types::Snapshot;

/// The part of a previous snapshot the runner reads back
#[derive(Debug, Deserialize)]
struct StoredSnapshot {
    #[serde(default)]
    notified: Vec<usize>,
}

/// Location of the snapshot and its lock marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    data_path: PathBuf,
    lock_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_path: impl Into<PathBuf>, lock_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            lock_path: lock_path.into(),
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Local calendar date the snapshot was last written
    pub fn last_modified_date(&self) -> Option<NaiveDate> {
        let modified = fs::metadata(&self.data_path)
            .and_then(|m| m.modified())
            .ok()?;
        Some(DateTime::<Local>::from(modified).date_naive())
    }

    /// Notified slots of the previous snapshot, if it was written on `today`
    pub fn load_notified(&self, today: NaiveDate) -> Vec<usize> {
        if self.last_modified_date() != Some(today) {
            return Vec::new();
        }

        let raw = match fs::read_to_string(&self.data_path) {
            Ok(raw) if !raw.trim().is_empty() => raw,
            Ok(_) => return Vec::new(),
            Err(e) => {
                warn!("Cannot read previous snapshot: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<StoredSnapshot>(&raw) {
            Ok(stored) => stored.notified,
            Err(e) => {
                warn!("Ignoring unreadable previous snapshot: {}", e);
                Vec::new()
            }
        }
    }

    /// Start a write cycle, clearing any lock left by a crashed run
    pub fn open(&self) -> Result<SnapshotWriter> {
        if let Some(parent) = self.data_path.parent() {
            fs::create_dir_all(parent)?;
        }
        remove_lock(&self.lock_path)?;
        Ok(SnapshotWriter {
            store: self.clone(),
        })
    }
}

/// Scoped writer; the lock marker never outlives it
#[derive(Debug)]
pub struct SnapshotWriter {
    store: SnapshotStore,
}

impl SnapshotWriter {
    /// Write `snapshot` in full, then signal the lock
    pub fn publish(&mut self, snapshot: &Snapshot) -> Result<()> {
        let body = serde_json::to_string(snapshot)?;
        let staging = self.store.data_path.with_extension("json.tmp");

        {
            let mut file = fs::File::create(&staging)?;
            file.write_all(body.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&staging, &self.store.data_path)?;

        let mut lock = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.store.lock_path)?;
        lock.write_all(b" ")?;
        lock.sync_all()?;

        debug!("Snapshot published ({} bytes)", body.len());
        Ok(())
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        if let Err(e) = remove_lock(&self.store.lock_path) {
            warn!("Runner sync failed, lock not removed: {}", e);
        }
    }
}

fn remove_lock(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
