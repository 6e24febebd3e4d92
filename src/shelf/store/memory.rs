use super::{paginate, Page, Pagination, SortOrder, Store};
use crate::error::{Result, ShelfError};
use crate::model::Entity;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory storage keyed by natural key.
/// Does NOT persist data; `backup` is a no-op.
pub struct MemoryStore<E: Entity> {
    items: HashMap<String, E>,
}

impl<E: Entity> Default for MemoryStore<E> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
        }
    }
}

impl<E: Entity> MemoryStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from recovered entities. Later duplicates of a natural
    /// key are returned instead of stored.
    pub fn from_entities(entities: impl IntoIterator<Item = E>) -> (Self, Vec<E>) {
        let mut store = Self::new();
        let mut duplicates = Vec::new();
        for entity in entities {
            if store.contains(entity.key()) {
                duplicates.push(entity);
            } else {
                store.items.insert(entity.key().to_string(), entity);
            }
        }
        (store, duplicates)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Every entity in the default order, for writing snapshots.
    pub fn snapshot(&self) -> Vec<E> {
        let mut all: Vec<E> = self.items.values().cloned().collect();
        all.sort_by(|a, b| SortOrder::DateAddedDesc.compare(a, b));
        all
    }

    /// Stamp and validate a new payload without storing it.
    pub fn build_new(&self, raw: Value) -> Result<E> {
        let mut object = match raw {
            Value::Object(object) => object,
            other => return Err(ShelfError::invalid(E::LABEL, E::validate(&other))),
        };
        E::prepare_new(&mut object, &Uuid::new_v4().to_string(), Utc::now());
        let entity = E::from_json(&Value::Object(object))?;

        if self.contains(entity.key()) {
            return Err(ShelfError::invalid(
                E::LABEL,
                vec![E::NATURAL_KEY.to_string()],
            ));
        }
        Ok(entity)
    }

    /// Check a replacement against the stored value without applying it.
    pub fn check_update(&self, entity: &E) -> Result<()> {
        E::from_json(&entity.to_json())?;
        let existing = self
            .items
            .get(entity.key())
            .ok_or_else(|| ShelfError::not_found(E::LABEL, entity.key()))?;
        if existing.id() != entity.id() {
            return Err(ShelfError::invalid(E::LABEL, vec!["id".to_string()]));
        }
        Ok(())
    }

    fn insert(&mut self, entity: E) {
        self.items.insert(entity.key().to_string(), entity);
    }
}

impl<E: Entity> Store<E> for MemoryStore<E> {
    fn list(&self, pagination: Pagination, sort: SortOrder) -> Result<Page<E>> {
        Ok(paginate(
            self.items.values().cloned().collect(),
            pagination,
            sort,
        ))
    }

    fn get(&self, key: &str) -> Result<E> {
        self.items
            .get(key)
            .cloned()
            .ok_or_else(|| ShelfError::not_found(E::LABEL, key))
    }

    fn add(&mut self, raw: Value) -> Result<E> {
        let entity = self.build_new(raw)?;
        self.insert(entity.clone());
        Ok(entity)
    }

    fn update(&mut self, entity: E) -> Result<E> {
        self.check_update(&entity)?;
        self.insert(entity.clone());
        Ok(entity)
    }

    fn delete(&mut self, key: &str) -> Result<E> {
        self.items
            .remove(key)
            .ok_or_else(|| ShelfError::not_found(E::LABEL, key))
    }

    fn backup(&mut self) -> Result<()> {
        Ok(())
    }
}
