//! SQLite-backed data store.
//!
//! Stores one row per block in a `blocks` table. Position writes for a whole
//! reorder run inside a single transaction.

use std::future::ready;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{BlockRow, DataStore};
use crate::error::{Result, VibelinkError};
use crate::future::BoxFuture;

const SELECT_COLUMNS: &str = "id, owner_id, kind, title, target, secret, style, icon, position, interaction_count";

impl From<rusqlite::Error> for VibelinkError {
    fn from(err: rusqlite::Error) -> Self {
        VibelinkError::Store(err.to_string())
    }
}

/// SQLite-backed block storage.
///
/// # Thread Safety
///
/// The connection is wrapped in a `Mutex`. Every call holds the lock for the
/// duration of one statement (or one transaction) and never across an await.
pub struct SqliteDataStore {
    conn: Mutex<Connection>,
}

impl SqliteDataStore {
    /// Open or create a database at the given path and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory database. Data is lost when dropped.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS blocks (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                target TEXT,
                secret TEXT,
                style TEXT NOT NULL DEFAULT 'primary',
                icon TEXT,
                position INTEGER NOT NULL,
                interaction_count INTEGER NOT NULL DEFAULT 0
            );

            -- Positions are briefly duplicated while a reorder is written,
            -- so this index is not unique.
            CREATE INDEX IF NOT EXISTS idx_blocks_owner_position ON blocks(owner_id, position);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| VibelinkError::Store("sqlite connection lock poisoned".into()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<BlockRow> {
        Ok(BlockRow {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            kind: row.get(2)?,
            title: row.get(3)?,
            target: row.get(4)?,
            secret: row.get(5)?,
            style: row.get(6)?,
            icon: row.get(7)?,
            position: row.get(8)?,
            interaction_count: row.get(9)?,
        })
    }

    fn query_owner(&self, owner_id: &str) -> Result<Vec<BlockRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM blocks WHERE owner_id = ? ORDER BY position ASC, id ASC"
        ))?;
        let rows = stmt
            .query_map(params![owner_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn query_id(&self, id: &str) -> Result<Option<BlockRow>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM blocks WHERE id = ?"),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    fn execute_insert(&self, row: &BlockRow) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO blocks (id, owner_id, kind, title, target, secret, style, icon, position, interaction_count)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                row.id,
                row.owner_id,
                row.kind,
                row.title,
                row.target,
                row.secret,
                row.style,
                row.icon,
                row.position,
                row.interaction_count,
            ],
        )?;
        Ok(())
    }

    fn execute_update(&self, row: &BlockRow) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE blocks
             SET kind = ?, title = ?, target = ?, secret = ?, style = ?, icon = ?
             WHERE id = ? AND owner_id = ?",
            params![
                row.kind,
                row.title,
                row.target,
                row.secret,
                row.style,
                row.icon,
                row.id,
                row.owner_id,
            ],
        )?;
        Ok(changed > 0)
    }

    fn execute_delete(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM blocks WHERE id = ?", params![id])?;
        Ok(changed > 0)
    }

    fn execute_positions(&self, owner_id: &str, positions: &[(String, i64)]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("UPDATE blocks SET position = ? WHERE id = ? AND owner_id = ?")?;
            for (id, position) in positions {
                if stmt.execute(params![position, id, owner_id])? == 0 {
                    // Dropping the transaction rolls everything back
                    return Err(VibelinkError::NotFound(id.clone()));
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn execute_increment(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE blocks SET interaction_count = interaction_count + 1 WHERE id = ?",
            params![id],
        )?;
        if changed == 0 {
            return Err(VibelinkError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

impl DataStore for SqliteDataStore {
    fn select_by_owner<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<BlockRow>>> {
        Box::pin(ready(self.query_owner(owner_id)))
    }

    fn select_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<BlockRow>>> {
        Box::pin(ready(self.query_id(id)))
    }

    fn insert<'a>(&'a self, row: &'a BlockRow) -> BoxFuture<'a, Result<()>> {
        Box::pin(ready(self.execute_insert(row)))
    }

    fn update<'a>(&'a self, row: &'a BlockRow) -> BoxFuture<'a, Result<bool>> {
        Box::pin(ready(self.execute_update(row)))
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(ready(self.execute_delete(id)))
    }

    fn update_positions<'a>(
        &'a self,
        owner_id: &'a str,
        positions: &'a [(String, i64)],
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(ready(self.execute_positions(owner_id, positions)))
    }

    fn increment_interactions<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(ready(self.execute_increment(id)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::block::{BlockKind, NewBlock};
    use crate::future::block_on_test;
    use crate::store::BlockStore;

    fn link(title: &str) -> NewBlock {
        NewBlock::new(
            title,
            BlockKind::Link {
                target: "https://example.com".into(),
            },
        )
    }

    #[test]
    fn test_schema_creates_blocks_table() {
        let store = SqliteDataStore::in_memory().unwrap();
        let conn = store.lock().unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert!(tables.contains(&"blocks".to_string()));
    }

    #[test]
    fn test_block_store_over_sqlite() {
        block_on_test(async {
            let store = BlockStore::new(Arc::new(SqliteDataStore::in_memory().unwrap()));
            let a = store.create("alice", link("A")).await.unwrap();
            let b = store.create("alice", link("B")).await.unwrap();
            let gated = store
                .create(
                    "alice",
                    NewBlock::new(
                        "VIP",
                        BlockKind::GatedLink {
                            target: "https://example.com/vip".into(),
                            secret: "open".into(),
                        },
                    ),
                )
                .await
                .unwrap();

            store
                .set_positions("alice", &[gated.id.clone(), b.id.clone(), a.id.clone()])
                .await
                .unwrap();

            let list = store.list("alice").await.unwrap();
            let titles: Vec<_> = list.iter().map(|b| b.title.as_str()).collect();
            assert_eq!(titles, vec!["VIP", "B", "A"]);
            assert_eq!(list[0].kind.secret(), Some("open"));

            store.record_interaction("alice", &a.id).await;
            assert_eq!(store.get("alice", &a.id).await.unwrap().interaction_count, 1);

            store.delete("alice", &b.id).await.unwrap();
            let positions: Vec<_> = store
                .list("alice")
                .await
                .unwrap()
                .iter()
                .map(|b| b.position)
                .collect();
            assert_eq!(positions, vec![0, 1]);
        });
    }

    #[test]
    fn test_positions_roll_back_on_unknown_id() {
        block_on_test(async {
            let store = SqliteDataStore::in_memory().unwrap();
            let row = BlockRow {
                id: "a".into(),
                owner_id: "alice".into(),
                kind: "header".into(),
                title: "A".into(),
                target: None,
                secret: None,
                style: "primary".into(),
                icon: None,
                position: 0,
                interaction_count: 0,
            };
            store.insert(&row).await.unwrap();

            let positions = vec![("a".to_string(), 7), ("ghost".to_string(), 8)];
            let err = store
                .update_positions("alice", &positions)
                .await
                .unwrap_err();
            assert!(matches!(err, VibelinkError::NotFound(_)));

            let a = store.select_by_id("a").await.unwrap().unwrap();
            assert_eq!(a.position, 0);
        });
    }

    #[test]
    fn test_update_writes_only_editable_columns() {
        block_on_test(async {
            let store = SqliteDataStore::in_memory().unwrap();
            let mut row = BlockRow {
                id: "a".into(),
                owner_id: "alice".into(),
                kind: "header".into(),
                title: "A".into(),
                target: None,
                secret: None,
                style: "primary".into(),
                icon: None,
                position: 0,
                interaction_count: 0,
            };
            store.insert(&row).await.unwrap();
            store.update_positions("alice", &[("a".to_string(), 4)]).await.unwrap();
            store.increment_interactions("a").await.unwrap();

            row.title = "Renamed".into();
            assert!(store.update(&row).await.unwrap());

            let stored = store.select_by_id("a").await.unwrap().unwrap();
            assert_eq!(stored.title, "Renamed");
            assert_eq!(stored.position, 4);
            assert_eq!(stored.interaction_count, 1);
        });
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.db");

        block_on_test(async {
            let store = BlockStore::new(Arc::new(SqliteDataStore::open(&path).unwrap()));
            store.create("alice", link("Kept")).await.unwrap();
        });

        block_on_test(async {
            let store = BlockStore::new(Arc::new(SqliteDataStore::open(&path).unwrap()));
            let list = store.list("alice").await.unwrap();
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].title, "Kept");
        });
    }
}
