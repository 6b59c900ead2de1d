//! Block storage.
//!
//! Two layers:
//!
//! - [`DataStore`]: the port to the external relational store. It only knows
//!   flat [`BlockRow`]s and a handful of query/command shapes ("select rows of
//!   an owner ordered by position", "insert row", "update row by id", …).
//! - [`BlockStore`]: the service callers use. It validates fields, assigns
//!   positions, keeps positions contiguous and converts rows to [`Block`]s.
//!
//! Backends: [`MemoryDataStore`] (tests, development) and `SqliteDataStore`
//! (feature `sqlite`).

mod memory;
#[cfg(all(not(target_arch = "wasm32"), feature = "sqlite"))]
mod sqlite;

pub use memory::MemoryDataStore;
#[cfg(all(not(target_arch = "wasm32"), feature = "sqlite"))]
pub use sqlite::SqliteDataStore;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockKind, BlockPatch, BlockStyle, NewBlock};
use crate::error::{Result, ValidationError, VibelinkError};
use crate::future::BoxFuture;

/// A block as the data store sees it: one flat row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRow {
    /// Primary key
    pub id: String,
    /// Owner scope
    pub owner_id: String,
    /// Type name (`link`, `video`, …)
    pub kind: String,
    /// Display label
    pub title: String,
    /// Target URL, absent for headers
    pub target: Option<String>,
    /// Passphrase, present only for gated links
    pub secret: Option<String>,
    /// Style name
    pub style: String,
    /// Icon key
    pub icon: Option<String>,
    /// Render rank
    pub position: i64,
    /// Click counter
    pub interaction_count: i64,
}

impl From<&Block> for BlockRow {
    fn from(block: &Block) -> Self {
        Self {
            id: block.id.clone(),
            owner_id: block.owner_id.clone(),
            kind: block.kind.type_name().to_string(),
            title: block.title.clone(),
            target: block.kind.target().map(str::to_string),
            secret: block.kind.secret().map(str::to_string),
            style: block.style.as_str().to_string(),
            icon: block.icon.clone(),
            position: i64::from(block.position),
            interaction_count: block.interaction_count as i64,
        }
    }
}

impl TryFrom<BlockRow> for Block {
    type Error = VibelinkError;

    fn try_from(row: BlockRow) -> Result<Self> {
        let corrupt = |reason: String| VibelinkError::CorruptRow {
            id: row.id.clone(),
            reason,
        };

        let kind = BlockKind::from_parts(&row.kind, row.target.clone(), row.secret.clone())
            .map_err(|e| corrupt(e.to_string()))?;
        let style = BlockStyle::parse(&row.style).map_err(|e| corrupt(e.to_string()))?;
        let position =
            u32::try_from(row.position).map_err(|_| corrupt(format!("position {}", row.position)))?;

        Ok(Block {
            kind,
            style,
            position,
            interaction_count: row.interaction_count.max(0) as u64,
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            icon: row.icon,
        })
    }
}

/// Port to the external data store.
///
/// Implementations only move rows; validation and position bookkeeping live
/// in [`BlockStore`]. Any transport failure is reported as
/// [`VibelinkError::Store`].
pub trait DataStore: Send + Sync {
    /// All rows of an owner, ordered by position ascending.
    fn select_by_owner<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<BlockRow>>>;

    /// One row by id.
    fn select_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<BlockRow>>>;

    /// Insert a new row.
    fn insert<'a>(&'a self, row: &'a BlockRow) -> BoxFuture<'a, Result<()>>;

    /// Write the editable columns (`kind`, `title`, `target`, `secret`,
    /// `style`, `icon`) of the row with the same id and owner. `position` and
    /// `interaction_count` are left as stored. Returns whether a row matched.
    fn update<'a>(&'a self, row: &'a BlockRow) -> BoxFuture<'a, Result<bool>>;

    /// Delete a row by id. Returns whether a row matched.
    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>>;

    /// Write several positions of one owner, all or nothing. An id not held
    /// by the owner is [`VibelinkError::NotFound`].
    fn update_positions<'a>(
        &'a self,
        owner_id: &'a str,
        positions: &'a [(String, i64)],
    ) -> BoxFuture<'a, Result<()>>;

    /// Add one to a row's interaction counter.
    fn increment_interactions<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// CRUD and reordering of an owner's blocks.
#[derive(Clone)]
pub struct BlockStore {
    data: Arc<dyn DataStore>,
}

impl BlockStore {
    /// Wrap a data store backend
    pub fn new(data: Arc<dyn DataStore>) -> Self {
        Self { data }
    }

    /// The owner's blocks, ordered by position.
    ///
    /// A transport failure is returned as-is; callers render an empty state
    /// rather than mixing stale and fresh data.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Block>> {
        let rows = self.data.select_by_owner(owner_id).await?;
        let mut blocks = rows
            .into_iter()
            .map(Block::try_from)
            .collect::<Result<Vec<_>>>()?;
        blocks.sort_by_key(|b| b.position);
        Ok(blocks)
    }

    /// One block of the owner. Blocks of other owners are reported as not found.
    pub async fn get(&self, owner_id: &str, id: &str) -> Result<Block> {
        match self.data.select_by_id(id).await? {
            Some(row) if row.owner_id == owner_id => Block::try_from(row),
            _ => Err(VibelinkError::NotFound(id.to_string())),
        }
    }

    /// Create a block at the end of the owner's list.
    pub async fn create(&self, owner_id: &str, new: NewBlock) -> Result<Block> {
        new.validate()?;

        let existing = self.data.select_by_owner(owner_id).await?;
        let position = existing
            .iter()
            .map(|row| row.position)
            .max()
            .map_or(0, |max| max + 1);

        let block = Block {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: new.title,
            kind: new.kind,
            position: u32::try_from(position)
                .map_err(|_| VibelinkError::Store(format!("position overflow: {position}")))?,
            style: new.style,
            icon: new.icon,
            interaction_count: 0,
        };

        self.data.insert(&BlockRow::from(&block)).await?;
        log::debug!(
            "Created {} block {} at position {} for {}",
            block.kind.type_name(),
            block.id,
            block.position,
            owner_id
        );
        Ok(block)
    }

    /// Apply a partial edit. Position is never changed here.
    pub async fn update(&self, owner_id: &str, id: &str, patch: &BlockPatch) -> Result<Block> {
        let mut block = self.get(owner_id, id).await?;
        if patch.is_empty() {
            return Ok(block);
        }

        block.apply_patch(patch)?;

        if !self.data.update(&BlockRow::from(&block)).await? {
            return Err(VibelinkError::NotFound(id.to_string()));
        }
        // Position may have moved under a concurrent reorder
        self.get(owner_id, id).await
    }

    /// Delete a block and close the gap it leaves.
    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<()> {
        // Ownership check before touching anything
        self.get(owner_id, id).await?;

        if !self.data.delete(id).await? {
            return Err(VibelinkError::NotFound(id.to_string()));
        }

        self.normalize_positions(owner_id).await
    }

    /// Renumber the owner's blocks to `0..n-1`, keeping their current order.
    ///
    /// Only rows whose position actually changes are written.
    pub async fn normalize_positions(&self, owner_id: &str) -> Result<()> {
        let rows = self.data.select_by_owner(owner_id).await?;
        let changes: Vec<(String, i64)> = rows
            .iter()
            .enumerate()
            .filter(|(index, row)| row.position != *index as i64)
            .map(|(index, row)| (row.id.clone(), index as i64))
            .collect();

        if changes.is_empty() {
            return Ok(());
        }

        log::debug!("Renumbering {} blocks for {}", changes.len(), owner_id);
        self.data.update_positions(owner_id, &changes).await
    }

    /// Write `position = index` for every id in `ordered_ids`.
    ///
    /// The list must be a permutation of the owner's current block ids, so a
    /// stale or partial list can never break contiguity. Calling this twice
    /// with the same list leaves the same stored state.
    pub async fn set_positions(&self, owner_id: &str, ordered_ids: &[String]) -> Result<()> {
        let rows = self.data.select_by_owner(owner_id).await?;
        check_permutation(&rows, ordered_ids)?;

        let positions: Vec<(String, i64)> = ordered_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index as i64))
            .collect();

        self.data.update_positions(owner_id, &positions).await
    }

    /// Count one activation of a block.
    ///
    /// Fire-and-forget: failures are logged and swallowed so the navigation
    /// this accompanies is never blocked.
    pub async fn record_interaction(&self, owner_id: &str, id: &str) {
        let result = async {
            self.get(owner_id, id).await?;
            self.data.increment_interactions(id).await
        }
        .await;

        if let Err(e) = result {
            log::warn!("Failed to record interaction for block {}: {}", id, e);
        }
    }
}

fn check_permutation(rows: &[BlockRow], ordered_ids: &[String]) -> Result<()> {
    let current: HashSet<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    let mut seen = HashSet::with_capacity(ordered_ids.len());

    for id in ordered_ids {
        if !current.contains(id.as_str()) {
            return Err(ValidationError::OrderMismatch(format!("unknown block '{id}'")).into());
        }
        if !seen.insert(id.as_str()) {
            return Err(ValidationError::OrderMismatch(format!("duplicate block '{id}'")).into());
        }
    }

    if seen.len() != current.len() {
        return Err(ValidationError::OrderMismatch(format!(
            "expected {} blocks, got {}",
            current.len(),
            seen.len()
        ))
        .into());
    }

    Ok(())
}
