use super::memory::MemoryStore;
use super::repository::{Change, Persistence};
use super::snapshot::{ensure_dir, timestamped_path, to_json_array, write_atomic, write_backup};
use crate::config::BackendKind;
use crate::error::{Result, ShelfError};
use crate::logging::Logger;
use crate::model::Entity;
use chrono::Utc;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

/// One JSON array file holding a whole collection.
///
/// Every mutation rewrites the file in full (temporary file, then rename).
/// Backups are timestamped copies in a separate directory.
pub struct JsonFile {
    path: PathBuf,
    backup_dir: PathBuf,
    stem: String,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("data")
            .to_string();
        Self {
            path,
            backup_dir: backup_dir.into(),
            stem,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    fn data_dir(&self) -> PathBuf {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Startup recovery.
    ///
    /// 1. Open (or create) the data file and read it.
    /// 2. Parse it as a JSON array; each element that fails validation is
    ///    logged and skipped.
    /// 3. If the file is not a JSON array at all, its bytes are copied
    ///    verbatim to a `<stem>_corrupt_<timestamp>.json` quarantine file and
    ///    the data file is reset to `[]`.
    pub fn load<E: Entity>(&self, logger: &dyn Logger) -> Result<Vec<E>> {
        let dir = self.data_dir();
        ensure_dir(&dir)?;

        let mut raw = Vec::new();
        OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(ShelfError::Io)?
            .read_to_end(&mut raw)
            .map_err(ShelfError::Io)?;

        let items = match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            _ => {
                if !raw.is_empty() {
                    let quarantine = timestamped_path(&dir, &self.stem, "corrupt", Utc::now());
                    fs::write(&quarantine, &raw).map_err(ShelfError::Io)?;
                    logger.add_warning_log(&format!(
                        "{} is not a JSON array; moved its contents to {}",
                        self.path.display(),
                        quarantine.display()
                    ));
                }
                write_atomic(&self.path, b"[]")?;
                return Ok(Vec::new());
            }
        };

        let mut entities = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match E::from_json(item) {
                Ok(entity) => entities.push(entity),
                Err(e) => logger.add_warning_log(&format!(
                    "Skipping record {} in {}: {}",
                    index,
                    self.path.display(),
                    e
                )),
            }
        }
        Ok(entities)
    }
}

impl<E: Entity> Persistence<E> for JsonFile {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    fn record(&mut self, _change: Change<'_, E>, store: &MemoryStore<E>) -> Result<()> {
        let content = to_json_array(&store.snapshot())?;
        write_atomic(&self.path, content.as_bytes())
    }

    fn backup(&mut self, store: &MemoryStore<E>) -> Result<()> {
        write_backup(&self.backup_dir, &self.stem, &store.snapshot())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger};
    use crate::model::Note;
    use tempfile::TempDir;

    #[test]
    fn test_creates_missing_file_and_directories() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::new(dir.path().join("a/b/notes.json"), dir.path().join("backup"));
        let loaded = file.load::<Note>(&MemoryLogger::new()).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "[]");
    }

    #[test]
    fn test_non_array_json_is_quarantined() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        fs::write(&path, r#"{"not": "an array"}"#).unwrap();

        let logger = MemoryLogger::new();
        let file = JsonFile::new(&path, dir.path().join("backup"));
        assert!(file.load::<Note>(&logger).unwrap().is_empty());
        assert_eq!(logger.count(LogLevel::Warning), 1);

        let quarantined: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|name| name.starts_with("notes_corrupt_"))
            .collect();
        assert_eq!(quarantined.len(), 1);
    }

    #[test]
    fn test_stem_comes_from_the_file_name() {
        let file = JsonFile::new("/data/blog_posts.json", "/data/backup");
        assert_eq!(file.stem, "blog_posts");
        assert_eq!(file.backup_dir(), Path::new("/data/backup"));
    }
}
