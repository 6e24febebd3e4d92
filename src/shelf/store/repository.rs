use super::document::DocumentCollection;
use super::file::JsonFile;
use super::memory::MemoryStore;
use super::{Page, Pagination, SortOrder, Store};
use crate::config::BackendKind;
use crate::error::Result;
use crate::logging::Logger;
use crate::model::Entity;
use crate::schedule::BackupJob;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// A mutation that has already been applied to the in-memory store.
#[derive(Debug, Clone)]
pub enum Change<'a, E> {
    Saved(&'a E),
    Removed(&'a E),
}

/// How a [`Repository`] makes its in-memory state durable.
pub trait Persistence<E: Entity>: Send {
    fn kind(&self) -> BackendKind;

    /// Called after every successful mutation, with the store already updated.
    fn record(&mut self, change: Change<'_, E>, store: &MemoryStore<E>) -> Result<()>;

    /// Write a point-in-time copy without disturbing the live data.
    fn backup(&mut self, store: &MemoryStore<E>) -> Result<()>;
}

/// Persistence for the plain in-memory backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistence;

impl<E: Entity> Persistence<E> for NoPersistence {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn record(&mut self, _change: Change<'_, E>, _store: &MemoryStore<E>) -> Result<()> {
        Ok(())
    }

    fn backup(&mut self, _store: &MemoryStore<E>) -> Result<()> {
        Ok(())
    }
}

/// An in-memory store plus a persistence strategy.
///
/// Reads are served from memory. Writes mutate memory first, then hand the
/// change to the strategy. If the strategy fails the error is returned, but
/// the in-memory change stays: memory is always the state of record.
pub struct Repository<E: Entity> {
    memory: MemoryStore<E>,
    persistence: Box<dyn Persistence<E>>,
}

impl<E: Entity> Repository<E> {
    pub fn in_memory() -> Self {
        Self {
            memory: MemoryStore::new(),
            persistence: Box::new(NoPersistence),
        }
    }

    /// Build from entities already recovered by the strategy.
    pub fn with_persistence(
        persistence: Box<dyn Persistence<E>>,
        entities: Vec<E>,
        logger: &dyn Logger,
    ) -> Self {
        let (memory, duplicates) = MemoryStore::from_entities(entities);
        for duplicate in duplicates {
            logger.add_warning_log(&format!(
                "Skipping duplicate {} '{}' in {} data",
                E::NATURAL_KEY,
                duplicate.key(),
                E::KIND
            ));
        }
        Self {
            memory,
            persistence,
        }
    }

    /// Open a JSON-file backed repository, running startup recovery.
    pub fn open_file(
        path: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        logger: &dyn Logger,
    ) -> Result<Self> {
        let file = JsonFile::new(path, backup_dir);
        let entities = file.load::<E>(logger)?;
        Ok(Self::with_persistence(Box::new(file), entities, logger))
    }

    /// Open a repository backed by the entity kind's tree in a document database.
    pub fn open_document(
        db: &sled::Db,
        backup_dir: impl Into<PathBuf>,
        logger: &dyn Logger,
    ) -> Result<Self> {
        let collection = DocumentCollection::open(db, E::KIND, backup_dir)?;
        let entities = collection.load::<E>(logger)?;
        Ok(Self::with_persistence(
            Box::new(collection),
            entities,
            logger,
        ))
    }

    pub fn kind(&self) -> BackendKind {
        self.persistence.kind()
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}

impl<E: Entity> Store<E> for Repository<E> {
    fn list(&self, pagination: Pagination, sort: SortOrder) -> Result<Page<E>> {
        self.memory.list(pagination, sort)
    }

    fn get(&self, key: &str) -> Result<E> {
        self.memory.get(key)
    }

    fn add(&mut self, raw: Value) -> Result<E> {
        let entity = self.memory.add(raw)?;
        self.persistence
            .record(Change::Saved(&entity), &self.memory)?;
        Ok(entity)
    }

    fn update(&mut self, entity: E) -> Result<E> {
        let entity = self.memory.update(entity)?;
        self.persistence
            .record(Change::Saved(&entity), &self.memory)?;
        Ok(entity)
    }

    fn delete(&mut self, key: &str) -> Result<E> {
        let removed = self.memory.delete(key)?;
        self.persistence
            .record(Change::Removed(&removed), &self.memory)?;
        Ok(removed)
    }

    fn backup(&mut self) -> Result<()> {
        self.persistence.backup(&self.memory)
    }
}

/// A repository shared between request handling and the scheduled tasks.
///
/// Every operation holds the lock for its whole duration, so each mutation
/// and its write are applied as one step.
pub struct SharedStore<E: Entity> {
    inner: Arc<Mutex<Repository<E>>>,
}

impl<E: Entity> Clone for SharedStore<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Entity> SharedStore<E> {
    pub fn new(repository: Repository<E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(repository)),
        }
    }

    /// A poisoned lock is recovered: the map is never left half-updated.
    pub fn lock(&self) -> MutexGuard<'_, Repository<E>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn kind(&self) -> BackendKind {
        self.lock().kind()
    }
}

impl<E: Entity> BackupJob for SharedStore<E> {
    fn name(&self) -> &str {
        E::KIND
    }

    fn backup(&self) -> Result<()> {
        self.lock().backup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShelfError;
    use crate::logging::{LogLevel, MemoryLogger};
    use crate::model::Note;
    use serde_json::json;

    /// Records what it was told, optionally failing every write.
    #[derive(Default)]
    struct Recorder {
        saved: Arc<Mutex<Vec<String>>>,
        removed: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Persistence<Note> for Recorder {
        fn kind(&self) -> BackendKind {
            BackendKind::File
        }

        fn record(&mut self, change: Change<'_, Note>, _store: &MemoryStore<Note>) -> Result<()> {
            if self.fail {
                return Err(ShelfError::Store("simulated write error".to_string()));
            }
            match change {
                Change::Saved(note) => self.saved.lock().unwrap().push(note.id.clone()),
                Change::Removed(note) => self.removed.lock().unwrap().push(note.id.clone()),
            }
            Ok(())
        }

        fn backup(&mut self, _store: &MemoryStore<Note>) -> Result<()> {
            Err(ShelfError::Store("no backups here".to_string()))
        }
    }

    fn payload() -> Value {
        json!({"title": "t", "content": "c", "authorId": "a1"})
    }

    #[test]
    fn test_every_mutation_reaches_the_strategy() {
        let recorder = Recorder::default();
        let saved = recorder.saved.clone();
        let removed = recorder.removed.clone();
        let mut repo: Repository<Note> =
            Repository::with_persistence(Box::new(recorder), vec![], &MemoryLogger::new());

        let mut note = repo.add(payload()).unwrap();
        note.title = "changed".into();
        repo.update(note.clone()).unwrap();
        repo.delete(&note.id).unwrap();

        assert_eq!(*saved.lock().unwrap(), vec![note.id.clone(), note.id.clone()]);
        assert_eq!(*removed.lock().unwrap(), vec![note.id]);
    }

    #[test]
    fn test_failed_mutations_never_reach_the_strategy() {
        let recorder = Recorder::default();
        let saved = recorder.saved.clone();
        let mut repo: Repository<Note> =
            Repository::with_persistence(Box::new(recorder), vec![], &MemoryLogger::new());

        assert!(repo.add(json!({"title": ""})).is_err());
        assert!(repo.delete("missing").is_err());
        assert!(saved.lock().unwrap().is_empty());
    }

    #[test]
    fn test_write_errors_propagate_but_memory_keeps_the_change() {
        let recorder = Recorder {
            fail: true,
            ..Default::default()
        };
        let mut repo: Repository<Note> =
            Repository::with_persistence(Box::new(recorder), vec![], &MemoryLogger::new());
        let err = repo.add(payload()).unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_duplicates_in_recovered_data_are_logged() {
        let mut source: MemoryStore<Note> = MemoryStore::new();
        let note = source.add(payload()).unwrap();
        let logger = MemoryLogger::new();
        let repo = Repository::with_persistence(
            Box::new(NoPersistence),
            vec![note.clone(), note],
            &logger,
        );
        assert_eq!(repo.len(), 1);
        assert_eq!(logger.count(LogLevel::Warning), 1);
    }

    #[test]
    fn test_shared_store_backs_up_through_the_lock() {
        let store: SharedStore<Note> = SharedStore::new(Repository::in_memory());
        store.lock().add(payload()).unwrap();
        assert_eq!(BackupJob::name(&store), "notes");
        assert!(BackupJob::backup(&store).is_ok());
        assert_eq!(store.kind(), BackendKind::Memory);
    }

    #[test]
    fn test_shared_store_reports_backup_failures() {
        let repo: Repository<Note> = Repository::with_persistence(
            Box::new(Recorder::default()),
            vec![],
            &MemoryLogger::new(),
        );
        let store = SharedStore::new(repo);
        assert!(BackupJob::backup(&store).is_err());
    }
}
