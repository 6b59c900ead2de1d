//! In-memory data store for testing and development.
//!
//! Data is lost when dropped.

use std::collections::HashMap;
use std::future::ready;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{BlockRow, DataStore};
use crate::error::{Result, VibelinkError};
use crate::future::BoxFuture;

/// Rows keyed by id, behind a `RwLock`.
#[derive(Debug, Default, Clone)]
pub struct MemoryDataStore {
    rows: Arc<RwLock<HashMap<String, BlockRow>>>,
}

impl MemoryDataStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all owners
    pub fn len(&self) -> usize {
        self.read().map(|rows| rows.len()).unwrap_or(0)
    }

    /// Whether the store holds no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, BlockRow>>> {
        self.rows
            .read()
            .map_err(|_| VibelinkError::Store("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, BlockRow>>> {
        self.rows
            .write()
            .map_err(|_| VibelinkError::Store("memory store lock poisoned".into()))
    }

    fn owner_rows(&self, owner_id: &str) -> Result<Vec<BlockRow>> {
        let rows = self.read()?;
        let mut selected: Vec<BlockRow> = rows
            .values()
            .filter(|row| row.owner_id == owner_id)
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        Ok(selected)
    }

    fn apply_positions(&self, owner_id: &str, positions: &[(String, i64)]) -> Result<()> {
        let mut rows = self.write()?;

        // Check everything first so a bad id leaves the map untouched
        for (id, _) in positions {
            match rows.get(id) {
                Some(row) if row.owner_id == owner_id => {}
                _ => return Err(VibelinkError::NotFound(id.clone())),
            }
        }

        for (id, position) in positions {
            if let Some(row) = rows.get_mut(id) {
                row.position = *position;
            }
        }
        Ok(())
    }
}

impl DataStore for MemoryDataStore {
    fn select_by_owner<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<BlockRow>>> {
        Box::pin(ready(self.owner_rows(owner_id)))
    }

    fn select_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<BlockRow>>> {
        let result = self.read().map(|rows| rows.get(id).cloned());
        Box::pin(ready(result))
    }

    fn insert<'a>(&'a self, row: &'a BlockRow) -> BoxFuture<'a, Result<()>> {
        let result = self.write().and_then(|mut rows| {
            if rows.contains_key(&row.id) {
                return Err(VibelinkError::Store(format!("duplicate id {}", row.id)));
            }
            rows.insert(row.id.clone(), row.clone());
            Ok(())
        });
        Box::pin(ready(result))
    }

    fn update<'a>(&'a self, row: &'a BlockRow) -> BoxFuture<'a, Result<bool>> {
        let result = self.write().map(|mut rows| match rows.get_mut(&row.id) {
            Some(existing) if existing.owner_id == row.owner_id => {
                existing.kind = row.kind.clone();
                existing.title = row.title.clone();
                existing.target = row.target.clone();
                existing.secret = row.secret.clone();
                existing.style = row.style.clone();
                existing.icon = row.icon.clone();
                true
            }
            _ => false,
        });
        Box::pin(ready(result))
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>> {
        let result = self.write().map(|mut rows| rows.remove(id).is_some());
        Box::pin(ready(result))
    }

    fn update_positions<'a>(
        &'a self,
        owner_id: &'a str,
        positions: &'a [(String, i64)],
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(ready(self.apply_positions(owner_id, positions)))
    }

    fn increment_interactions<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        let result = self.write().and_then(|mut rows| match rows.get_mut(id) {
            Some(row) => {
                row.interaction_count += 1;
                Ok(())
            }
            None => Err(VibelinkError::NotFound(id.to_string())),
        });
        Box::pin(ready(result))
    }
}
