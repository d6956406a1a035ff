//! # SolisDb — Persistent Transaction Ledger
//!
//! The sled-backed [`KeyValueLedger`] implementation. Each logical table is
//! a named sled tree; each row is keyed by its transaction id and stored as
//! bincode. The `trs` tree is the authoritative record of confirmed
//! transactions; handler-contributed tables sit alongside it in the same
//! database file.
//!
//! ## Tree Layout
//!
//! | Tree       | Key                  | Value          |
//! |------------|----------------------|----------------|
//! | `trs`      | transaction id (txt) | `bincode(Row)` |
//! | `<table>`  | transaction id (txt) | `bincode(Row)` |
//!
//! ## Atomicity
//!
//! `save_rows` groups the inserts into one atomic batch per tree and flushes
//! once after all batches are applied, so a crash either loses the whole
//! save or none of it per tree.

use std::path::Path;

use async_trait::async_trait;
use sled::{Batch, Db, Tree};

use super::{KeyValueLedger, LedgerError, Row, RowOp};

/// Persistent transaction ledger over a sled database.
///
/// sled trees support lock-free concurrent reads and serialized writes, so
/// `SolisDb` is shared across tasks via `Arc` without extra locking.
#[derive(Clone)]
pub struct SolisDb {
    db: Db,
    trs: Tree,
}

impl SolisDb {
    /// Open or create a ledger at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        Self::from_db(sled::open(path)?)
    }

    /// Create a temporary ledger that vanishes on drop. For tests and the
    /// node selfcheck — no filesystem residue, no cleanup.
    pub fn open_temporary() -> Result<Self, LedgerError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self, LedgerError> {
        let trs = db.open_tree("trs")?;
        Ok(Self { db, trs })
    }

    /// Read back a persisted `trs` row by transaction id.
    pub fn get_row(&self, id: &str) -> Result<Option<Row>, LedgerError> {
        match self.trs.get(id.as_bytes())? {
            Some(bytes) => {
                let row = bincode::deserialize(&bytes)
                    .map_err(|e| LedgerError::Serialization(e.to_string()))?;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    /// Read back a handler-contributed row for a transaction id.
    pub fn get_table_row(&self, table: &str, id: &str) -> Result<Option<Row>, LedgerError> {
        let tree = self.db.open_tree(table)?;
        match tree.get(id.as_bytes())? {
            Some(bytes) => {
                let row = bincode::deserialize(&bytes)
                    .map_err(|e| LedgerError::Serialization(e.to_string()))?;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl KeyValueLedger for SolisDb {
    async fn count_by_id(&self, id: &str) -> Result<u64, LedgerError> {
        // Ids are unique keys, so the count collapses to containment.
        Ok(u64::from(self.trs.contains_key(id.as_bytes())?))
    }

    async fn save_rows(&self, rows: &[RowOp]) -> Result<(), LedgerError> {
        // Group inserts per tree so each tree gets one atomic batch.
        let mut batches: Vec<(Tree, Batch)> = Vec::new();
        for op in rows {
            let key = op
                .key()
                .ok_or_else(|| LedgerError::UnkeyedRow(op.table.clone()))?
                .to_string();
            let value = bincode::serialize(&op.values)
                .map_err(|e| LedgerError::Serialization(e.to_string()))?;

            let tree = if op.table == "trs" {
                self.trs.clone()
            } else {
                self.db.open_tree(op.table.as_bytes())?
            };

            match batches.iter_mut().find(|(t, _)| t.name() == tree.name()) {
                Some((_, batch)) => batch.insert(key.as_bytes(), value),
                None => {
                    let mut batch = Batch::default();
                    batch.insert(key.as_bytes(), value);
                    batches.push((tree, batch));
                }
            }
        }

        for (tree, batch) in batches {
            tree.apply_batch(batch)?;
        }
        self.db.flush_async().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
