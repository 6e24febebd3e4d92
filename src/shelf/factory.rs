//! # Backend Selection
//!
//! Turns a [`ModuleConfig`] into a ready [`Repository`]. Selection never
//! fails: a missing path, an unavailable document database or a failed open
//! is logged as a warning and the module runs in memory instead.
//!
//! The vice bank's `FILE_PATH` names a directory; each of its collections
//! lives in `<dir>/<kind>.json`.

use crate::config::{BackendKind, Module, ModuleConfig, ShelfConfig};
use crate::error::{Result, ShelfError};
use crate::logging::Logger;
use crate::model::Entity;
use crate::store::repository::Repository;
use std::path::{Path, PathBuf};

/// An open document database and the directory it lives in.
pub struct DocumentDb {
    db: sled::Db,
    path: PathBuf,
}

impl DocumentDb {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let db = sled::open(&path)?;
        Ok(Self { db, path })
    }

    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_backup_dir(&self) -> PathBuf {
        self.path.join("backup")
    }
}

/// Open the document database if any module asks for it.
pub fn open_document_db(config: &ShelfConfig, logger: &dyn Logger) -> Option<DocumentDb> {
    let wanted = Module::ALL
        .iter()
        .any(|m| config.module(*m).backend == BackendKind::Document);
    if !wanted {
        return None;
    }
    let path = config.document_path.as_ref()?;
    match DocumentDb::open(path) {
        Ok(db) => Some(db),
        Err(e) => {
            logger.add_warning_log(&format!(
                "Could not open document database at {}: {}",
                path.display(),
                e
            ));
            None
        }
    }
}

/// Where the file backend keeps `E` for this module.
pub fn data_file<E: Entity>(module: Module, config: &ModuleConfig) -> Option<PathBuf> {
    let path = config.file_path.as_ref()?;
    Some(match module {
        Module::ViceBank => path.join(format!("{}.json", E::KIND)),
        _ => path.clone(),
    })
}

/// Build the repository for one entity kind, falling back to memory.
pub fn open_repository<E: Entity>(
    module: Module,
    config: &ModuleConfig,
    document: Option<&DocumentDb>,
    logger: &dyn Logger,
) -> Repository<E> {
    match select::<E>(module, config, document, logger) {
        Ok(repository) => {
            logger.add_log(&format!(
                "{} using {} storage",
                E::KIND,
                repository.kind()
            ));
            repository
        }
        Err(e) => {
            logger.add_warning_log(&format!(
                "{} falling back to memory storage: {}",
                E::KIND,
                e
            ));
            Repository::in_memory()
        }
    }
}

fn select<E: Entity>(
    module: Module,
    config: &ModuleConfig,
    document: Option<&DocumentDb>,
    logger: &dyn Logger,
) -> Result<Repository<E>> {
    match config.backend {
        BackendKind::Memory => Ok(Repository::in_memory()),
        BackendKind::File => {
            let path = data_file::<E>(module, config).ok_or_else(|| {
                ShelfError::Config(format!("SHELF_{}_FILE_PATH is not set", module.env_name()))
            })?;
            let backup_dir = config
                .resolved_backup_dir(module)
                .ok_or_else(|| ShelfError::Config("no backup directory".to_string()))?;
            Repository::open_file(path, backup_dir, logger)
        }
        BackendKind::Document => {
            let document = document.ok_or_else(|| {
                ShelfError::Config(
                    "document database unavailable (is SHELF_DOCUMENT_PATH set?)".to_string(),
                )
            })?;
            let backup_dir = config
                .resolved_backup_dir(module)
                .unwrap_or_else(|| document.default_backup_dir());
            Repository::open_document(document.db(), backup_dir, logger)
        }
    }
}
