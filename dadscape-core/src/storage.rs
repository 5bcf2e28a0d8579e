//! Key/value persistence for diaries, the message of the day and progress.
//!
//! The substrate is an opaque get/set-by-key store. [`FileStore`] keeps one
//! file per key on disk, [`MemoryStore`] keeps everything in memory.
//! [`DiaryStore`] layers the typed records on top.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use uuid::Uuid;

use crate::models::{DadCred, Diary, UserProgress};

/// Group every key is stored under.
pub const STORE_GROUP: &str = "dadscape";

pub const DIARIES_KEY: &str = "clanDiaries";
pub const MOTD_KEY: &str = "messageOfTheDay";
pub const CRED_KEY: &str = "dadcred";

pub fn progress_key(diary_id: Uuid) -> String {
    format!("progress_{}", diary_id)
}

/// Errors that can occur reading or writing the store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A flat string store addressed by key.
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn unset(&self, key: &str) -> Result<(), StorageError>;
}

/// Stores each key as a file under `<data_dir>/dadscape/`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: data_dir.as_ref().join(STORE_GROUP),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }
}

/// Keys become file names, so they may not escape the store directory.
fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key.starts_with('.')
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0')
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        // Write then rename so readers never see a half-written value.
        let tmp = self.dir.join(format!(".{}.tmp", key));
        fs::write(&tmp, value).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io { path, source })
    }

    fn unset(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// In-memory store for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn unset(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// Typed access to the records kept in a [`KeyValueStore`].
///
/// Reads never fail: a missing key, an unreadable store or malformed JSON
/// all come back as "nothing stored" and are logged. Writes report errors.
#[derive(Clone)]
pub struct DiaryStore {
    kv: Arc<dyn KeyValueStore>,
}

impl DiaryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.kv.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to read from store");
                None
            }
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring malformed stored value");
                None
            }
        }
    }

    fn write_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.kv.set(key, &json)
    }

    pub fn load_diaries(&self) -> Vec<Diary> {
        self.read_json(DIARIES_KEY).unwrap_or_default()
    }

    pub fn save_diaries(&self, diaries: &[Diary]) -> Result<(), StorageError> {
        self.write_json(DIARIES_KEY, &diaries)
    }

    pub fn load_motd(&self) -> String {
        self.read(MOTD_KEY).unwrap_or_default()
    }

    pub fn save_motd(&self, motd: &str) -> Result<(), StorageError> {
        self.kv.set(MOTD_KEY, motd)
    }

    fn load_progress_map(&self, diary_id: Uuid) -> BTreeMap<String, UserProgress> {
        self.read_json(&progress_key(diary_id)).unwrap_or_default()
    }

    /// Progress for `rsn` in `diary_id`, or `None` if nothing was recorded.
    pub fn load_progress(&self, rsn: &str, diary_id: Uuid) -> Option<UserProgress> {
        self.load_progress_map(diary_id).remove(rsn)
    }

    /// Saves one player's progress, leaving other players in the diary untouched.
    pub fn save_progress(&self, progress: &UserProgress) -> Result<(), StorageError> {
        let mut all = self.load_progress_map(progress.diary_id);
        all.insert(progress.rsn.clone(), progress.clone());
        self.write_json(&progress_key(progress.diary_id), &all)
    }

    pub fn load_cred(&self) -> Option<DadCred> {
        self.read_json(CRED_KEY)
    }

    pub fn save_cred(&self, cred: &DadCred) -> Result<(), StorageError> {
        self.write_json(CRED_KEY, cred)
    }

    /// The stored cred when it belongs to `rsn`, otherwise a fresh unranked one.
    pub fn load_or_create_cred(&self, rsn: &str) -> DadCred {
        self.load_cred()
            .filter(|cred| cred.rsn.eq_ignore_ascii_case(rsn))
            .unwrap_or_else(|| DadCred::unranked(rsn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, Tier};
    use tempfile::TempDir;

    fn file_store() -> (DiaryStore, FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let files = FileStore::new(temp_dir.path());
        let store = DiaryStore::new(Arc::new(files.clone()));
        (store, files, temp_dir)
    }

    #[test]
    fn test_file_store_get_missing_returns_none() {
        let (_store, files, _temp) = file_store();
        assert!(files.get(DIARIES_KEY).unwrap().is_none());
    }

    #[test]
    fn test_file_store_set_creates_group_dir() {
        let (_store, files, temp) = file_store();
        files.set(MOTD_KEY, "Hello dads").unwrap();

        assert!(temp.path().join("dadscape").join(MOTD_KEY).exists());
        assert_eq!(files.get(MOTD_KEY).unwrap(), Some("Hello dads".to_string()));

        files.unset(MOTD_KEY).unwrap();
        files.unset(MOTD_KEY).unwrap();
        assert!(files.get(MOTD_KEY).unwrap().is_none());
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let (_store, files, _temp) = file_store();
        assert!(matches!(
            files.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(files.get(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_diary_roundtrip_through_file_store() {
        let (store, _files, _temp) = file_store();
        let mut diary = Diary::new("Boss Diary", "PvM", "Bob");
        let mut tier = Tier::new("Easy");
        tier.add_task(Task::kill("Kill goblins", "Goblin", 5));
        tier.add_task(Task::kill("Kill cows", "Cow", 10));
        diary.add_tier(tier);
        diary.add_tier(Tier::new("Hard"));

        store.save_diaries(&[diary.clone()]).unwrap();
        assert_eq!(store.load_diaries(), vec![diary]);
    }

    #[test]
    fn test_malformed_diaries_read_as_empty() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(DIARIES_KEY, "{not json").unwrap();
        let store = DiaryStore::new(kv);

        assert!(store.load_diaries().is_empty());
    }

    #[test]
    fn test_progress_saved_per_player() {
        let store = DiaryStore::in_memory();
        let diary_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();

        let mut bob = UserProgress::new("Bob", diary_id);
        bob.increment(task_id, 2);
        let mut alice = UserProgress::new("Alice", diary_id);
        alice.increment(task_id, 7);

        store.save_progress(&bob).unwrap();
        store.save_progress(&alice).unwrap();

        assert_eq!(store.load_progress("Bob", diary_id).unwrap().count(task_id), 2);
        assert_eq!(
            store.load_progress("Alice", diary_id).unwrap().count(task_id),
            7
        );
        assert!(store.load_progress("Carol", diary_id).is_none());
        assert!(store.load_progress("Bob", Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_cred_belongs_to_rsn() {
        let store = DiaryStore::in_memory();
        let mut cred = DadCred::unranked("Bob");
        cred.set_score(42);
        store.save_cred(&cred).unwrap();

        assert_eq!(store.load_or_create_cred("bob").cred_score, 42);
        assert_eq!(store.load_or_create_cred("Alice").cred_score, 0);
    }
}
