//! Helpers for writing whole-collection JSON snapshots to disk.

use crate::error::{Result, ShelfError};
use crate::model::Entity;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Serialize a collection as a pretty JSON array of entity JSON values.
pub fn to_json_array<E: Entity>(entities: &[E]) -> Result<String> {
    let values: Vec<Value> = entities.iter().map(Entity::to_json).collect();
    serde_json::to_string_pretty(&values).map_err(ShelfError::Serialization)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(ShelfError::Io)?;
    }
    Ok(())
}

/// Write to a temporary sibling, then rename over the target.
/// A crash mid-write leaves the previous content in place.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    ensure_dir(dir)?;

    let stem = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("snapshot");
    let tmp_path = dir.join(format!(".{}-{}.tmp", stem, Uuid::new_v4()));
    fs::write(&tmp_path, content).map_err(ShelfError::Io)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(ShelfError::Io(e));
    }
    Ok(())
}

/// Timestamp safe for file names on every platform: `20240102T030405.678Z`.
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%.3fZ").to_string()
}

/// `<dir>/<stem>_<label>_<timestamp>.json`, with `-N` appended if that name
/// is already taken.
pub fn timestamped_path(dir: &Path, stem: &str, label: &str, at: DateTime<Utc>) -> PathBuf {
    let base = format!("{}_{}_{}", stem, label, file_timestamp(at));
    let mut candidate = dir.join(format!("{}.json", base));
    let mut n = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{}-{}.json", base, n));
        n += 1;
    }
    candidate
}

/// Write a point-in-time copy of the collection into `dir`.
pub fn write_backup<E: Entity>(dir: &Path, stem: &str, entities: &[E]) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let content = to_json_array(entities)?;
    let path = timestamped_path(dir, stem, "backup", Utc::now());
    write_atomic(&path, content.as_bytes())?;
    Ok(path)
}
