//! # Transaction Core
//!
//! The consensus-critical heart of Solis: canonical encoding, identifier
//! derivation, signatures, verification, and balance mutation. Every byte
//! of the serialized form and every check in the pipeline must be
//! reproducible bit-for-bit across nodes, or the chain forks.
//!
//! ## Architecture
//!
//! ```text
//! types.rs       — The Transaction record
//! error.rs       — The stable TransactionError taxonomy
//! codec.rs       — Canonical bytes, hashing, id derivation, address parsing
//! signing.rs     — sign / multisign / verify_primary / verify_secondary
//! handler.rs     — TransactionHandler trait, TypeRegistry, ChainContext
//! normalize.rs   — Inbound shape validation and asset normalization
//! verify.rs      — The 13-check verification pipeline
//! apply.rs       — apply / undo / (un)confirmed mutation and pool admission
//! persistence.rs — Row mapping to and from the ledger
//! builder.rs     — Fluent construction of signed transactions
//! transfer.rs    — The reference type-0 transfer handler
//! ```
//!
//! ## Ingress flow
//!
//! raw JSON → `normalize` → `process` → `verify_transaction` →
//! `apply_unconfirmed` → (block inclusion) → `apply` → `db_save`.
//! Rollback reverses: `undo` on block rollback, `undo_unconfirmed` when a
//! pooled transaction is evicted.

pub mod apply;
pub mod builder;
pub mod codec;
pub mod error;
pub mod handler;
pub mod normalize;
pub mod persistence;
pub mod signing;
pub mod transfer;
pub mod types;
pub mod verify;

pub use apply::{apply, apply_unconfirmed, process, undo, undo_unconfirmed};
pub use builder::TransactionBuilder;
pub use codec::{canonical_bytes, canonical_hash, parse_address, transaction_id};
pub use error::TransactionError;
pub use handler::{ChainContext, CreateData, TransactionHandler, TypeRegistry};
pub use normalize::normalize;
pub use persistence::{after_save, db_read, db_save};
pub use signing::{multisign, sign, verify_primary, verify_secondary};
pub use transfer::TransferHandler;
pub use types::Transaction;
pub use verify::verify_transaction;
