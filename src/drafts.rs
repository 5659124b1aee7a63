//! Draft auto-save.
//!
//! Drafts are JSON files under `<vault>/.postvault/drafts/`, one per draft
//! id, overwritten on every save. A save is either immediate (observable by
//! `load` right after) or debounced: the write lands once the window (2 s by
//! default, injectable for tests) elapses without a newer save for the same
//! id. Only the latest content is ever persisted.
//!
//! Conflict detection across devices is intentionally absent: the public
//! types carry a `conflicts` field but `list_drafts` and
//! `find_conflicting_drafts` are permanent stubs returning empty, matching
//! the original feature's unfinished state.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(60);
pub const MAX_DRAFT_LENGTH: usize = 100_000;

const DEVICE_ID_FILE: &str = "device-id";
/// Draft schema version. Always 1; no real versioning exists yet.
const DRAFT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftData {
    pub id: String,
    pub content: String,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub version: u32,
    pub device_id: String,
}

/// Result of a recovery attempt. `conflicts` is always `None` in the current
/// implementation; do not assume real conflict-resolution semantics.
#[derive(Debug, Clone)]
pub struct DraftRecovery {
    pub draft: Option<DraftData>,
    pub conflicts: Option<Vec<DraftData>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// Written through to disk.
    Saved,
    /// Queued behind the debounce window.
    Scheduled,
    SkippedEmpty,
    SkippedTooLong,
}

struct Pending {
    content: String,
    seq: u64,
}

pub struct DraftStore {
    dir: PathBuf,
    device_id: String,
    debounce: Duration,
    pending: Arc<Mutex<HashMap<String, Pending>>>,
}

impl DraftStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Arc<Self>> {
        Self::with_debounce(dir, DEFAULT_DEBOUNCE)
    }

    /// Open with an explicit debounce window (tests shrink it).
    pub fn with_debounce(dir: impl Into<PathBuf>, debounce: Duration) -> Result<Arc<Self>> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let device_id = load_or_create_device_id(&dir)?;
        Ok(Arc::new(DraftStore {
            dir,
            device_id,
            debounce,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }))
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    fn draft_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("draft-{}.json", id))
    }

    /// Save a draft. Emptiness and length gate every save, immediate or not.
    pub fn save(self: &Arc<Self>, id: &str, content: &str, immediate: bool) -> Result<SaveStatus> {
        if content.trim().is_empty() {
            return Ok(SaveStatus::SkippedEmpty);
        }
        if content.chars().count() > MAX_DRAFT_LENGTH {
            return Ok(SaveStatus::SkippedTooLong);
        }

        if immediate {
            // An immediate write supersedes anything still debouncing.
            self.pending.lock().remove(id);
            self.write_draft(id, content)?;
            return Ok(SaveStatus::Saved);
        }

        let seq = {
            let mut pending = self.pending.lock();
            let entry = pending.entry(id.to_string()).or_insert(Pending {
                content: String::new(),
                seq: 0,
            });
            entry.seq += 1;
            entry.content = content.to_string();
            entry.seq
        };

        // One short-lived timer thread per scheduled save; superseded timers
        // find a newer seq and do nothing.
        let store = Arc::clone(self);
        let id = id.to_string();
        thread::spawn(move || {
            thread::sleep(store.debounce);
            // The file write happens under the lock: a concurrent `delete`
            // either removes the pending entry before the check, or removes
            // the file after the write. It can never land in between and
            // leave a resurrected draft behind.
            let mut pending = store.pending.lock();
            match pending.get(&id) {
                Some(entry) if entry.seq == seq => {
                    let content = entry.content.clone();
                    pending.remove(&id);
                    let _ = store.write_draft(&id, &content);
                }
                _ => {}
            }
        });
        Ok(SaveStatus::Scheduled)
    }

    /// Flush every pending debounced save immediately.
    pub fn flush_all(&self) -> Result<()> {
        // Writes stay under the lock for the same reason as the debounce
        // timer: a concurrent `delete` must not interleave.
        let mut pending = self.pending.lock();
        let drained: Vec<(String, String)> = pending
            .drain()
            .map(|(id, entry)| (id, entry.content))
            .collect();
        for (id, content) in drained {
            self.write_draft(&id, &content)?;
        }
        Ok(())
    }

    /// Periodic auto-save loop covering long-lived sessions.
    pub fn spawn_autosave(store: Arc<Self>, interval: Duration) -> thread::JoinHandle<()> {
        thread::spawn(move || loop {
            thread::sleep(interval);
            let _ = store.flush_all();
        })
    }

    /// Load a draft. A draft that fails validation is deleted and reported
    /// as absent.
    pub fn load(&self, id: &str) -> Option<DraftData> {
        let path = self.draft_path(id);
        let text = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<DraftData>(&text) {
            Ok(draft)
                if draft.id == id
                    && draft.version == DRAFT_VERSION
                    && !draft.content.is_empty() =>
            {
                Some(draft)
            }
            _ => {
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.pending.lock().remove(id);
        let path = self.draft_path(id);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to delete {}", path.display()))?;
        }
        Ok(())
    }

    pub fn recover(&self, id: &str) -> DraftRecovery {
        DraftRecovery {
            draft: self.load(id),
            conflicts: None,
        }
    }

    /// Permanently stubbed: multi-device draft listing never shipped.
    pub fn list_drafts(&self) -> Vec<DraftData> {
        Vec::new()
    }

    /// Permanently stubbed: see [`DraftRecovery::conflicts`].
    pub fn find_conflicting_drafts(&self, _id: &str) -> Vec<DraftData> {
        Vec::new()
    }

    fn write_draft(&self, id: &str, content: &str) -> Result<()> {
        let draft = DraftData {
            id: id.to_string(),
            content: content.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            version: DRAFT_VERSION,
            device_id: self.device_id.clone(),
        };
        let path = self.draft_path(id);
        let text = serde_json::to_string_pretty(&draft)?;
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))
    }
}

fn load_or_create_device_id(dir: &std::path::Path) -> Result<String> {
    let path = dir.join(DEVICE_ID_FILE);
    if let Ok(existing) = fs::read_to_string(&path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
    let id = Uuid::new_v4().to_string();
    fs::write(&path, &id).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn device_id_is_generated_once_and_reused() {
        let dir = TempDir::new().unwrap();
        let a = DraftStore::open(dir.path()).unwrap();
        let b = DraftStore::open(dir.path()).unwrap();
        assert_eq!(a.device_id(), b.device_id());
    }

    #[test]
    fn empty_and_oversized_saves_are_gated() {
        let dir = TempDir::new().unwrap();
        let store = DraftStore::open(dir.path()).unwrap();
        assert_eq!(store.save("d", "  \n", true).unwrap(), SaveStatus::SkippedEmpty);
        let huge = "x".repeat(MAX_DRAFT_LENGTH + 1);
        assert_eq!(store.save("d", &huge, true).unwrap(), SaveStatus::SkippedTooLong);
        assert!(store.load("d").is_none());
    }

    #[test]
    fn corrupt_draft_is_deleted_on_load() {
        let dir = TempDir::new().unwrap();
        let store = DraftStore::open(dir.path()).unwrap();
        let path = dir.path().join("draft-bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(store.load("bad").is_none());
        assert!(!path.exists(), "invalid draft file should be removed");
    }

    #[test]
    fn listing_and_conflicts_are_stubbed_empty() {
        let dir = TempDir::new().unwrap();
        let store = DraftStore::open(dir.path()).unwrap();
        store.save("d", "content", true).unwrap();
        assert!(store.list_drafts().is_empty());
        assert!(store.find_conflicting_drafts("d").is_empty());
        let recovery = store.recover("d");
        assert!(recovery.draft.is_some());
        assert!(recovery.conflicts.is_none());
    }
}
