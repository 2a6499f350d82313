//! Process-wide session map with a JSON backing file.
//!
//! The map lock is held only long enough to find, insert or remove a slot.
//! Each slot carries two locks:
//! - `record`, held briefly for every read or mutation;
//! - `turn`, held by a caller for a whole multi-step exchange so that
//!   concurrent chats on one session run one after another while readers,
//!   other sessions and `persist` carry on.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;

use crate::models::SessionRecord;

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session lock poisoned")]
    LockPoisoned,
}

struct SessionSlot {
    turn: Mutex<()>,
    record: Mutex<SessionRecord>,
}

impl SessionSlot {
    fn new(record: SessionRecord) -> Arc<Self> {
        Arc::new(Self {
            turn: Mutex::new(()),
            record: Mutex::new(record),
        })
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<SessionSlot>>>,
    backing_file: Option<PathBuf>,
    persist_lock: Mutex<()>,
}

impl SessionStore {
    /// Store with no backing file; `persist` is a no-op.
    pub fn in_memory() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            backing_file: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Load sessions from `path`, which also becomes the persist target.
    ///
    /// Best effort: a missing file starts empty, an unreadable or corrupt
    /// file starts empty with a warning, and individual records that fail to
    /// parse are skipped.
    pub fn restore(path: &Path) -> Self {
        let mut store = Self::in_memory();
        store.backing_file = Some(path.to_path_buf());

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No session file, starting empty");
                return store;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Session file unreadable, starting empty");
                return store;
            }
        };

        let entries: HashMap<String, serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Session file corrupt, starting empty");
                return store;
            }
        };

        let mut sessions = HashMap::with_capacity(entries.len());
        for (id, value) in entries {
            match serde_json::from_value::<SessionRecord>(value) {
                Ok(mut record) => {
                    record.id = id.clone();
                    sessions.insert(id, SessionSlot::new(record));
                }
                Err(e) => {
                    tracing::warn!(session_id = %id, error = %e, "Skipping unreadable session");
                }
            }
        }

        tracing::info!(count = sessions.len(), path = %path.display(), "Sessions restored");
        store.sessions = RwLock::new(sessions);
        store
    }

    pub fn backing_file(&self) -> Option<&Path> {
        self.backing_file.as_deref()
    }

    fn slot(&self, id: &str) -> Result<Arc<SessionSlot>, SessionStoreError> {
        let map = self.sessions.read().map_err(|_| SessionStoreError::LockPoisoned)?;
        map.get(id)
            .cloned()
            .ok_or_else(|| SessionStoreError::NotFound(id.to_string()))
    }

    /// Insert `record` under its id, replacing any existing session wholesale.
    pub fn create_or_replace(&self, record: SessionRecord) -> Result<(), SessionStoreError> {
        let mut map = self.sessions.write().map_err(|_| SessionStoreError::LockPoisoned)?;
        map.insert(record.id.clone(), SessionSlot::new(record));
        Ok(())
    }

    /// Mutate the existing record for `id`, or insert `create()` if there is none.
    pub fn upsert<R>(
        &self,
        id: &str,
        create: impl FnOnce() -> SessionRecord,
        update: impl FnOnce(&mut SessionRecord) -> R,
    ) -> Result<Option<R>, SessionStoreError> {
        let existing = {
            let mut map = self.sessions.write().map_err(|_| SessionStoreError::LockPoisoned)?;
            let existing = map.get(id).cloned();
            if existing.is_none() {
                let mut record = create();
                record.id = id.to_string();
                map.insert(id.to_string(), SessionSlot::new(record));
            }
            existing
        };

        match existing {
            Some(slot) => {
                let mut record = slot.record.lock().map_err(|_| SessionStoreError::LockPoisoned)?;
                Ok(Some(update(&mut record)))
            }
            None => Ok(None),
        }
    }

    /// Snapshot of the record.
    pub fn get(&self, id: &str) -> Result<SessionRecord, SessionStoreError> {
        let slot = self.slot(id)?;
        let record = slot.record.lock().map_err(|_| SessionStoreError::LockPoisoned)?;
        Ok(record.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions
            .read()
            .map(|map| map.contains_key(id))
            .unwrap_or(false)
    }

    /// Run `f` against the record under its exclusive lock.
    pub fn update<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut SessionRecord) -> R,
    ) -> Result<R, SessionStoreError> {
        let slot = self.slot(id)?;
        let mut record = slot.record.lock().map_err(|_| SessionStoreError::LockPoisoned)?;
        Ok(f(&mut record))
    }

    /// Run `f` while holding the session's turn lock. Other callers of
    /// `serialized` on the same session wait; everything else proceeds.
    pub fn serialized<R>(&self, id: &str, f: impl FnOnce() -> R) -> Result<R, SessionStoreError> {
        let slot = self.slot(id)?;
        let _turn = slot.turn.lock().map_err(|_| SessionStoreError::LockPoisoned)?;
        Ok(f())
    }

    /// Remove a session. Returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool, SessionStoreError> {
        let mut map = self.sessions.write().map_err(|_| SessionStoreError::LockPoisoned)?;
        Ok(map.remove(id).is_some())
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every session to the backing file.
    ///
    /// The file is replaced atomically via a temp file in the same directory,
    /// so a crash mid-write leaves the previous version intact.
    pub fn persist(&self) -> Result<(), SessionStoreError> {
        let Some(path) = self.backing_file.as_deref() else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().map_err(|_| SessionStoreError::LockPoisoned)?;

        let slots: Vec<(String, Arc<SessionSlot>)> = {
            let map = self.sessions.read().map_err(|_| SessionStoreError::LockPoisoned)?;
            map.iter().map(|(id, slot)| (id.clone(), slot.clone())).collect()
        };

        let mut snapshot = BTreeMap::new();
        for (id, slot) in slots {
            let record = slot.record.lock().map_err(|_| SessionStoreError::LockPoisoned)?;
            snapshot.insert(id, record.clone());
        }

        let json = serde_json::to_vec_pretty(&snapshot)?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| SessionStoreError::Io(e.error))?;

        tracing::debug!(count = snapshot.len(), path = %path.display(), "Sessions persisted");
        Ok(())
    }
}
