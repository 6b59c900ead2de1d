//! Optimistic drag-to-reorder.
//!
//! An [`EditorSession`] holds the owner's block list as displayed in the
//! editor. A drag applies to the session immediately and yields an
//! [`OrderSnapshot`] carrying the full new order plus a generation number.
//! [`ReorderCoordinator`] persists snapshots through the [`BlockStore`] and
//! feeds the outcome back with [`EditorSession::record_sync`].
//!
//! Outcomes only change the displayed order for the newest generation. A slow
//! response for an older drag can never overwrite a newer order, even when
//! several persistence calls are in flight and complete out of order. A late
//! success still advances the confirmed order, so a rollback always returns
//! to what the store last accepted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::block::{Block, NewBlock};
use crate::error::Result;
use crate::store::BlockStore;

/// Move the element at `source` to `dest`, shifting the rest.
///
/// Returns `None` when either index is out of bounds or they are equal.
pub fn move_item<T: Clone>(items: &[T], source: usize, dest: usize) -> Option<Vec<T>> {
    if source == dest || source >= items.len() || dest >= items.len() {
        return None;
    }

    let mut moved = items.to_vec();
    let item = moved.remove(source);
    moved.insert(dest, item);
    Some(moved)
}

/// What to do with the displayed order when persisting it fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncFailurePolicy {
    /// Keep showing the optimistic order and flag the failure
    #[default]
    KeepOptimistic,
    /// Restore the last order the store confirmed
    Rollback,
}

/// Persistence state of the displayed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncStatus {
    /// Displayed order matches the store
    Idle,
    /// A write for this generation is outstanding
    Pending {
        /// Generation being written
        generation: u64,
    },
    /// The newest write failed
    Failed {
        /// Error shown to the owner
        message: String,
    },
}

/// Full order to persist, tagged with the generation that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Owner whose blocks are ordered
    pub owner_id: String,
    /// Monotonic per session
    pub generation: u64,
    /// Every block id, in display order
    pub ordered_ids: Vec<String>,
}

/// Editing context for one owner's block list.
#[derive(Debug, Clone)]
pub struct EditorSession {
    owner_id: String,
    blocks: Vec<Block>,
    confirmed: Vec<String>,
    confirmed_generation: u64,
    generation: u64,
    status: SyncStatus,
    policy: SyncFailurePolicy,
}

impl EditorSession {
    /// Start a session from blocks freshly read from the store.
    pub fn new(owner_id: impl Into<String>, blocks: Vec<Block>, policy: SyncFailurePolicy) -> Self {
        let mut session = Self {
            owner_id: owner_id.into(),
            blocks: Vec::new(),
            confirmed: Vec::new(),
            confirmed_generation: 0,
            generation: 0,
            status: SyncStatus::Idle,
            policy,
        };
        session.replace_blocks(blocks);
        session
    }

    /// Owner being edited
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Blocks in display order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Current persistence state
    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Latest generation issued
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ids in the order the store last confirmed
    pub fn confirmed_order(&self) -> &[String] {
        &self.confirmed
    }

    /// Ids in display order
    pub fn ordered_ids(&self) -> Vec<String> {
        self.blocks.iter().map(|b| b.id.clone()).collect()
    }

    /// Apply a drag optimistically.
    ///
    /// Positions are renumbered to list indices. Returns the snapshot to
    /// persist, or `None` when the drag is a no-op.
    pub fn apply_drag(&mut self, source: usize, dest: usize) -> Option<OrderSnapshot> {
        self.blocks = move_item(&self.blocks, source, dest)?;
        renumber(&mut self.blocks);
        Some(self.issue())
    }

    /// Issue a fresh snapshot of the displayed order (manual retry).
    pub fn reissue(&mut self) -> OrderSnapshot {
        self.issue()
    }

    fn issue(&mut self) -> OrderSnapshot {
        self.generation += 1;
        self.status = SyncStatus::Pending {
            generation: self.generation,
        };
        OrderSnapshot {
            owner_id: self.owner_id.clone(),
            generation: self.generation,
            ordered_ids: self.ordered_ids(),
        }
    }

    /// Record the outcome of persisting `snapshot`.
    ///
    /// Returns `false` when the outcome is stale. A stale success newer than
    /// the confirmed order still becomes the confirmed order; if a rollback
    /// already happened the displayed order follows it.
    pub fn record_sync(&mut self, snapshot: &OrderSnapshot, result: &Result<()>) -> bool {
        if snapshot.generation != self.generation {
            log::debug!(
                "Stale sync result for generation {} (latest {})",
                snapshot.generation,
                self.generation
            );
            if result.is_ok() && self.confirm(snapshot) {
                let rolled_back = self.policy == SyncFailurePolicy::Rollback
                    && matches!(self.status, SyncStatus::Failed { .. });
                if rolled_back {
                    self.restore_confirmed();
                }
            }
            return false;
        }

        match result {
            Ok(()) => {
                self.confirm(snapshot);
                self.status = SyncStatus::Idle;
            }
            Err(e) => {
                log::warn!("Failed to persist order for {}: {}", self.owner_id, e);
                if self.policy == SyncFailurePolicy::Rollback {
                    self.restore_confirmed();
                }
                self.status = SyncStatus::Failed {
                    message: e.to_string(),
                };
            }
        }
        true
    }

    fn confirm(&mut self, snapshot: &OrderSnapshot) -> bool {
        if snapshot.generation <= self.confirmed_generation {
            return false;
        }
        self.confirmed = snapshot.ordered_ids.clone();
        self.confirmed_generation = snapshot.generation;
        true
    }

    /// Replace the whole list with blocks read back from the store.
    ///
    /// The new list counts as confirmed and any in-flight result becomes stale.
    pub fn replace_blocks(&mut self, mut blocks: Vec<Block>) {
        blocks.sort_by_key(|b| b.position);
        self.confirmed = blocks.iter().map(|b| b.id.clone()).collect();
        self.blocks = blocks;
        self.generation += 1;
        self.confirmed_generation = self.generation;
        self.status = SyncStatus::Idle;
    }

    fn restore_confirmed(&mut self) {
        let rank: HashMap<&str, usize> = self
            .confirmed
            .iter()
            .enumerate()
            .map(|(index, id)| (id.as_str(), index))
            .collect();
        self.blocks
            .sort_by_key(|b| rank.get(b.id.as_str()).copied().unwrap_or(usize::MAX));
        renumber(&mut self.blocks);
    }
}

fn renumber(blocks: &mut [Block]) {
    for (index, block) in blocks.iter_mut().enumerate() {
        block.position = index as u32;
    }
}

/// Persists editor sessions through a [`BlockStore`].
#[derive(Clone)]
pub struct ReorderCoordinator {
    store: BlockStore,
}

impl ReorderCoordinator {
    /// Coordinator over the given store
    pub fn new(store: BlockStore) -> Self {
        Self { store }
    }

    /// Open an editing session for `owner_id`.
    pub async fn load(&self, owner_id: &str, policy: SyncFailurePolicy) -> Result<EditorSession> {
        let blocks = self.store.list(owner_id).await?;
        Ok(EditorSession::new(owner_id, blocks, policy))
    }

    /// Write a snapshot's full order to the store.
    pub async fn persist(&self, snapshot: &OrderSnapshot) -> Result<()> {
        self.store
            .set_positions(&snapshot.owner_id, &snapshot.ordered_ids)
            .await
    }

    /// Apply a drag, persist it and record the outcome.
    ///
    /// Returns `Ok(false)` for a no-op drag. On a store failure the session
    /// has already been updated according to its policy and the error is
    /// returned for display.
    pub async fn drag_end(
        &self,
        session: &mut EditorSession,
        source: usize,
        dest: usize,
    ) -> Result<bool> {
        let Some(snapshot) = session.apply_drag(source, dest) else {
            return Ok(false);
        };

        let result = self.persist(&snapshot).await;
        session.record_sync(&snapshot, &result);
        result.map(|()| true)
    }

    /// Re-send the displayed order after a failure.
    pub async fn resync(&self, session: &mut EditorSession) -> Result<()> {
        let snapshot = session.reissue();
        let result = self.persist(&snapshot).await;
        session.record_sync(&snapshot, &result);
        result
    }

    /// Create a block at the end and reload the session.
    pub async fn insert(&self, session: &mut EditorSession, new: NewBlock) -> Result<Block> {
        let block = self.store.create(session.owner_id(), new).await?;
        self.reload(session).await?;
        Ok(block)
    }

    /// Delete a block and reload the session with contiguous positions.
    pub async fn remove(&self, session: &mut EditorSession, id: &str) -> Result<()> {
        self.store.delete(session.owner_id(), id).await?;
        self.reload(session).await
    }

    async fn reload(&self, session: &mut EditorSession) -> Result<()> {
        let blocks = self.store.list(session.owner_id()).await?;
        session.replace_blocks(blocks);
        Ok(())
    }
}
