//! # Storage Abstractions
//!
//! The transaction core touches persistence through one narrow contract:
//! [`KeyValueLedger`], which can count rows by transaction id (replay
//! detection in `process`) and persist the row set the persistence adapter
//! emits. [`db::SolisDb`] is the bundled sled-backed implementation.
//!
//! Rows are deliberately schema-light: a [`Row`] is an ordered map from
//! column name to [`SqlValue`], and a [`RowOp`] is one pending insert. Type
//! handlers contribute their own rows after the core `trs` row, so the row
//! model has to carry whatever a plug-in needs without the core knowing the
//! plug-in's schema.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod block;
pub mod db;

pub use block::Block;
pub use db::SolisDb;

// ---------------------------------------------------------------------------
// Row model
// ---------------------------------------------------------------------------

/// A single column value in a persisted row.
///
/// Public keys and signatures are stored as raw bytes; identifiers and the
/// comma-joined signature list as text; amounts and fees as unsigned 64-bit
/// integers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Text(String),
    Int(u64),
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// The text content, if this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric content. Numeric columns read back from text storage are
    /// parsed, matching the adapter contract that numerics come from text.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            SqlValue::Int(n) => Some(*n),
            SqlValue::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// The raw byte content, if this value is a byte column.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

/// One persisted row: column name to value, in stable column order.
pub type Row = BTreeMap<String, SqlValue>;

/// A pending insert of one row into a named table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowOp {
    /// Target table. The core always emits `trs` first; handlers append
    /// their own tables.
    pub table: String,
    /// Column values for the row.
    pub values: Row,
}

impl RowOp {
    pub fn new(table: &str, values: Row) -> Self {
        Self {
            table: table.to_string(),
            values,
        }
    }

    /// The key this row is stored under: its `id` column, falling back to
    /// `transactionId` for handler-contributed rows.
    pub fn key(&self) -> Option<&str> {
        self.values
            .get("id")
            .and_then(SqlValue::as_text)
            .or_else(|| self.values.get("transactionId").and_then(SqlValue::as_text))
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a ledger implementation.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("row for table {0} has no id or transactionId column")]
    UnkeyedRow(String),
}

// ---------------------------------------------------------------------------
// KeyValueLedger
// ---------------------------------------------------------------------------

/// The persisted-transaction ledger consumed by the core.
#[async_trait]
pub trait KeyValueLedger: Send + Sync {
    /// Number of persisted `trs` rows with the given transaction id.
    /// Used by `process` for replay detection; any non-zero count means the
    /// transaction is already confirmed.
    async fn count_by_id(&self, id: &str) -> Result<u64, LedgerError>;

    /// Persist a row set atomically, in order.
    async fn save_rows(&self, rows: &[RowOp]) -> Result<(), LedgerError>;
}
