//! # Store
//!
//! Flat per-entity collections on disk.
//!
//! ## Layout
//!
//! - One pretty-printed JSON array per entity: `<data dir>/<collection>.json`
//! - A missing file is an empty collection
//! - Optional `<collection>.json.bak` holding the snapshot replaced by the last write
//!
//! ## Writes
//!
//! Every mutation rewrites the whole file:
//! 1. Load the full snapshot
//! 2. Find, validate and merge in memory
//! 3. Copy the current file to `.bak` (when enabled)
//! 4. Write `.tmp`, then rename it over the collection file
//!
//! The rename keeps readers from ever seeing a half-written array. Nothing here
//! serializes writers, callers hold one lock around each `modify`.
use std::{
    fs, io,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Record;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt collection {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Clone, Debug)]
pub struct Store {
    root: PathBuf,
    backup: bool,
}

impl Store {
    pub fn open(root: impl Into<PathBuf>, backup: bool) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(io_error(&root))?;

        Ok(Self { root, backup })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection<T: Record>(&self) -> Collection<T> {
        Collection {
            path: self.root.join(format!("{}.json", T::COLLECTION)),
            backup: self.backup,
            _record: PhantomData,
        }
    }
}

pub struct Collection<T> {
    path: PathBuf,
    backup: bool,
    _record: PhantomData<T>,
}

impl<T: Record> Collection<T> {
    pub fn load(&self) -> Result<Vec<T>, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.path)(e)),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    pub fn find(&self, id: u64) -> Result<Option<T>, StoreError> {
        Ok(self.load()?.into_iter().find(|record| record.id() == id))
    }

    pub fn save(&self, records: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(records).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        if self.backup && self.path.exists() {
            let backup = self.sibling("bak");
            if let Err(e) = fs::copy(&self.path, &backup) {
                warn!("Failed to back up {}: {e}", self.path.display());
            }
        }

        let tmp = self.sibling("tmp");
        fs::write(&tmp, json).map_err(io_error(&tmp))?;
        fs::rename(&tmp, &self.path).map_err(io_error(&self.path))?;

        debug!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Loads the snapshot, hands it to `f`, and writes it back only when `f` succeeds.
    pub fn modify<R, E>(&self, f: impl FnOnce(&mut Vec<T>) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut records = self.load()?;
        let result = f(&mut records)?;
        self.save(&records)?;

        Ok(result)
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }
}

pub fn next_id<T: Record>(records: &[T]) -> u64 {
    records.iter().map(Record::id).max().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    struct Note {
        id: u64,
        text: String,
    }

    impl Record for Note {
        const COLLECTION: &'static str = "notes";

        fn id(&self) -> u64 {
            self.id
        }
    }

    fn note(id: u64, text: &str) -> Note {
        Note {
            id,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("data"), false).unwrap();

        assert!(store.collection::<Note>().load().unwrap().is_empty());
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn test_modify_rewrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path(), false).unwrap();
        let notes = store.collection::<Note>();

        notes
            .modify(|all| {
                all.push(note(next_id(all), "first"));
                all.push(note(next_id(all), "second"));
                Ok::<_, StoreError>(())
            })
            .unwrap();

        let on_disk: Vec<Note> =
            serde_json::from_slice(&fs::read(dir.path().join("notes.json")).unwrap()).unwrap();
        assert_eq!(on_disk, vec![note(1, "first"), note(2, "second")]);
        assert_eq!(notes.find(2).unwrap(), Some(note(2, "second")));
        assert_eq!(notes.find(3).unwrap(), None);
    }

    #[derive(Debug)]
    enum TestError {
        Rejected,
        Store,
    }

    impl From<StoreError> for TestError {
        fn from(_: StoreError) -> Self {
            TestError::Store
        }
    }

    #[test]
    fn test_failed_modify_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path(), false).unwrap();
        let notes = store.collection::<Note>();
        notes.save(&[note(1, "kept")]).unwrap();

        let result = notes.modify(|all| {
            all.clear();
            Err::<(), _>(TestError::Rejected)
        });

        assert!(matches!(result, Err(TestError::Rejected)));
        assert_eq!(notes.load().unwrap(), vec![note(1, "kept")]);
    }

    #[test]
    fn test_backup_holds_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path(), true).unwrap();
        let notes = store.collection::<Note>();

        notes.save(&[note(1, "old")]).unwrap();
        notes.save(&[note(1, "new")]).unwrap();

        let backup: Vec<Note> =
            serde_json::from_slice(&fs::read(dir.path().join("notes.json.bak")).unwrap()).unwrap();
        assert_eq!(backup, vec![note(1, "old")]);
        assert!(!dir.path().join("notes.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path(), false).unwrap();
        fs::write(dir.path().join("notes.json"), "{not json").unwrap();

        assert!(matches!(
            store.collection::<Note>().load(),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id::<Note>(&[]), 1);
        assert_eq!(next_id(&[note(3, "a"), note(9, "b"), note(2, "c")]), 10);
    }
}
