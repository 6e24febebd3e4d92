use super::memory::MemoryStore;
use super::repository::{Change, Persistence};
use super::snapshot::write_backup;
use crate::config::BackendKind;
use crate::error::{Result, ShelfError};
use crate::logging::Logger;
use crate::model::Entity;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// One named collection (a sled tree) inside an embedded document database.
///
/// Documents are keyed by the entity's natural key and stored as JSON bytes.
/// Unlike [`super::file::JsonFile`], each mutation touches a single document.
pub struct DocumentCollection {
    tree: sled::Tree,
    name: String,
    backup_dir: PathBuf,
}

impl DocumentCollection {
    pub fn open(db: &sled::Db, name: &str, backup_dir: impl Into<PathBuf>) -> Result<Self> {
        let tree = db.open_tree(name)?;
        Ok(Self {
            tree,
            name: name.to_string(),
            backup_dir: backup_dir.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Read every document. Ones that fail to decode or validate are logged
    /// and left in place.
    ///
    /// A document stored under a key other than its natural key is moved to
    /// its natural key, so later updates and deletes address it. If that key
    /// is already taken the stray copy is skipped.
    pub fn load<E: Entity>(&self, logger: &dyn Logger) -> Result<Vec<E>> {
        let stored = self.tree.iter().collect::<std::result::Result<Vec<_>, _>>()?;

        let mut entities = Vec::with_capacity(stored.len());
        let mut moved = false;
        for (key, bytes) in stored {
            let key = String::from_utf8_lossy(&key).into_owned();
            let decoded = serde_json::from_slice::<Value>(&bytes)
                .map_err(ShelfError::Serialization)
                .and_then(|value| E::from_json(&value));
            let entity = match decoded {
                Ok(entity) => entity,
                Err(e) => {
                    logger.add_warning_log(&format!(
                        "Skipping document '{}' in {}: {}",
                        key, self.name, e
                    ));
                    continue;
                }
            };

            if key != entity.key() {
                if self.tree.contains_key(entity.key().as_bytes())? {
                    logger.add_warning_log(&format!(
                        "Skipping document '{}' in {}: '{}' is already stored",
                        key,
                        self.name,
                        entity.key()
                    ));
                    continue;
                }
                self.tree.insert(entity.key().as_bytes(), bytes)?;
                self.tree.remove(key.as_bytes())?;
                moved = true;
                logger.add_warning_log(&format!(
                    "Moved document '{}' in {} to its key '{}'",
                    key,
                    self.name,
                    entity.key()
                ));
            }
            entities.push(entity);
        }

        if moved {
            self.tree.flush()?;
        }
        Ok(entities)
    }
}

impl<E: Entity> Persistence<E> for DocumentCollection {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    fn record(&mut self, change: Change<'_, E>, _store: &MemoryStore<E>) -> Result<()> {
        match change {
            Change::Saved(entity) => {
                let bytes = serde_json::to_vec(&entity.to_json()).map_err(ShelfError::Serialization)?;
                self.tree.insert(entity.key().as_bytes(), bytes)?;
            }
            Change::Removed(entity) => {
                self.tree.remove(entity.key().as_bytes())?;
            }
        }
        self.tree.flush()?;
        Ok(())
    }

    fn backup(&mut self, store: &MemoryStore<E>) -> Result<()> {
        write_backup(&self.backup_dir, &self.name, &store.snapshot())?;
        Ok(())
    }
}
