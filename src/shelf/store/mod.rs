//! # Storage Layer
//!
//! This module defines the storage abstraction for shelf. The [`Store`] trait
//! is the one contract every resource module talks to, whichever backend is
//! configured underneath.
//!
//! ## Backends
//!
//! - [`memory::MemoryStore`]: a keyed map, nothing is persisted. Also the
//!   in-memory mirror every other backend reads from.
//! - [`repository::Repository`]: a `MemoryStore` plus a [`repository::Persistence`]
//!   strategy that is told about every mutation:
//!   - [`file::JsonFile`]: rewrites one JSON array file per mutation.
//!   - [`document::DocumentCollection`]: one sled tree per entity kind.
//!
//! Reads never touch durable storage; they are answered from memory.
//!
//! ## Storage Layout
//!
//! For `JsonFile`:
//! ```text
//! data/
//! ├── notes.json                              # Live data (JSON array)
//! ├── notes_corrupt_20240101T000000.000Z.json # Quarantined bytes, if any
//! └── backup/
//!     └── notes_backup_20240102T000000.000Z.json
//! ```

use crate::error::Result;
use crate::model::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

pub mod document;
pub mod file;
pub mod memory;
pub mod repository;
pub mod snapshot;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_FILE_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Newest first, by the added timestamp.
    #[default]
    DateAddedDesc,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    pub fn compare<E: Entity>(self, a: &E, b: &E) -> Ordering {
        let primary = match self {
            SortOrder::DateAddedDesc => b.added_at().cmp(&a.added_at()),
            SortOrder::NameAsc => compare_names(a.name(), b.name()),
            SortOrder::NameDesc => compare_names(b.name(), a.name()),
        };
        primary.then_with(|| a.key().cmp(b.key()))
    }
}

/// Case-insensitive comparison that falls back to the exact text, so
/// "apple" < "Banana" < "banana".
///
/// This is not locale-aware collation: letters outside ASCII order by code
/// point after lowercasing, so "Ärger" sorts after "Zebra".
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// A validated page request. Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    page_size: usize,
}

impl Pagination {
    /// Clamps anything below 1 to the defaults instead of failing.
    pub fn new(page: i64, page_size: i64, default_size: usize) -> Self {
        let page = if page < 1 { 1 } else { page as usize };
        let page_size = if page_size < 1 {
            default_size
        } else {
            page_size as usize
        };
        Self { page, page_size }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn skip(&self) -> usize {
        self.page_size.saturating_mul(self.page.saturating_sub(1))
    }

    // Values built without `new` (zeroed, say) get the same clamping.
    fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: if self.page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                self.page_size
            },
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub more_pages: bool,
}

/// Sorts and slices a materialized list.
pub fn paginate<E: Entity>(mut items: Vec<E>, pagination: Pagination, sort: SortOrder) -> Page<E> {
    let pagination = pagination.clamped();
    let total = items.len();
    items.sort_by(|a, b| sort.compare(a, b));

    let skip = pagination.skip();
    let more_pages = skip.saturating_add(pagination.page_size) < total;
    let items = items
        .into_iter()
        .skip(skip)
        .take(pagination.page_size)
        .collect();

    Page { items, more_pages }
}

/// Abstract interface for a resource collection.
///
/// Keys are natural keys (slug, filename or id, depending on the kind).
pub trait Store<E: Entity> {
    /// List one page of entities in the given order
    fn list(&self, pagination: Pagination, sort: SortOrder) -> Result<Page<E>>;

    /// Get an entity by natural key
    fn get(&self, key: &str) -> Result<E>;

    /// Validate a new payload, assign a fresh id and store it
    fn add(&mut self, raw: Value) -> Result<E>;

    /// Replace an existing entity
    fn update(&mut self, entity: E) -> Result<E>;

    /// Remove an entity, returning its last value
    fn delete(&mut self, key: &str) -> Result<E>;

    /// Write the current state to durable storage
    fn backup(&mut self) -> Result<()>;
}
