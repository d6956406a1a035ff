//! # Type Handlers & the Registry
//!
//! Each transaction type (transfer, second-signature registration, delegate
//! registration, vote, multisignature registration, ...) plugs into the core
//! as a [`TransactionHandler`]. The core owns the shared pipeline — canonical
//! encoding, signatures, fee equality, balance mutation — and delegates
//! everything type-specific to the handler: asset bytes, fee schedule,
//! domain verification, and the state effects beyond the sender's balance.
//!
//! The trait *is* the capability check. Where the source system probed a
//! handler object for thirteen capability names at registration time, a Rust
//! type that implements this trait provably has all of them; registration
//! only has to reject duplicate type tags.
//!
//! [`ChainContext`] bundles the registry with the chain parameters into the
//! single immutable value every pipeline operation receives explicitly.
//! There is no process-wide mutable state in this crate.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::account::{Account, AccountStore};
use crate::config::ChainParams;
use crate::storage::{Block, Row, RowOp};

use super::error::TransactionError;
use super::types::Transaction;

// ---------------------------------------------------------------------------
// CreateData
// ---------------------------------------------------------------------------

/// Creation input passed to [`TransactionHandler::create`] by the builder.
#[derive(Clone, Debug, Default)]
pub struct CreateData {
    /// Recipient address, for types that have one.
    pub recipient_id: Option<String>,
    /// Amount in lux, for types that move value.
    pub amount: u64,
    /// Handler-specific creation payload (delegate name, vote list, ...).
    pub payload: Value,
}

// ---------------------------------------------------------------------------
// TransactionHandler
// ---------------------------------------------------------------------------

/// The full capability set a transaction type implements.
///
/// Sync methods are pure with respect to external state; async methods mark
/// the hooks that may perform I/O (the account store, a handler-owned
/// table). `db_save` and `after_save` have default no-op implementations —
/// most types persist nothing beyond the core `trs` row.
#[async_trait]
pub trait TransactionHandler: Send + Sync {
    /// The type tag this handler serves.
    fn tx_type(&self) -> u8;

    /// Populate the type-specific fields of a transaction under
    /// construction: recipient, amount, asset payload.
    fn create(&self, trs: &mut Transaction, data: &CreateData) -> Result<(), TransactionError>;

    /// The fee this transaction must carry. Computed, never client-chosen;
    /// the verifier rejects any transaction whose fee differs.
    fn calculate_fee(&self, trs: &Transaction, sender: &Account) -> u64;

    /// Type-specific verification, run as the final pipeline check. The
    /// error is surfaced to the caller verbatim.
    async fn verify(&self, trs: &Transaction, sender: &Account) -> Result<(), TransactionError>;

    /// The asset's contribution to the canonical byte encoding. Must be
    /// deterministic regardless of any map-insertion order in the payload;
    /// may be empty.
    fn get_bytes(&self, trs: &Transaction) -> Result<Vec<u8>, TransactionError>;

    /// Pool-admission hook, run by `process` after the replay check.
    async fn process(&self, trs: &Transaction, sender: &Account) -> Result<(), TransactionError>;

    /// Validate and canonicalize the asset payload during normalization.
    fn object_normalize(&self, trs: &mut Transaction) -> Result<(), TransactionError>;

    /// Reconstruct the asset payload from a database row. `None` when the
    /// row carries nothing for this type.
    fn db_read(&self, row: &Row) -> Result<Option<Value>, TransactionError>;

    /// Rows to persist beyond the core `trs` row.
    fn db_save(&self, _trs: &Transaction) -> Result<Vec<RowOp>, TransactionError> {
        Ok(Vec::new())
    }

    /// Post-persistence hook.
    async fn after_save(&self, _trs: &Transaction) -> Result<(), TransactionError> {
        Ok(())
    }

    /// Confirmed state effects beyond the sender balance merge the core
    /// already performed. A failure here triggers the compensating rollback.
    async fn apply(
        &self,
        trs: &Transaction,
        block: &Block,
        sender: &Account,
        store: &dyn AccountStore,
    ) -> Result<(), TransactionError>;

    /// Exact inverse of [`TransactionHandler::apply`].
    async fn undo(
        &self,
        trs: &Transaction,
        block: &Block,
        sender: &Account,
        store: &dyn AccountStore,
    ) -> Result<(), TransactionError>;

    /// Unconfirmed state effects beyond the `u_balance` merge.
    async fn apply_unconfirmed(
        &self,
        trs: &Transaction,
        sender: &Account,
        store: &dyn AccountStore,
    ) -> Result<(), TransactionError>;

    /// Exact inverse of [`TransactionHandler::apply_unconfirmed`].
    async fn undo_unconfirmed(
        &self,
        trs: &Transaction,
        sender: &Account,
        store: &dyn AccountStore,
    ) -> Result<(), TransactionError>;

    /// Whether the transaction may be applied at block time. For senders
    /// with a confirmed multisignature group, readiness means the approval
    /// threshold is met. Deliberately not consulted at pool admission.
    fn ready(&self, trs: &Transaction, sender: &Account) -> bool {
        if sender.is_multisignature() {
            trs.signatures
                .as_ref()
                .is_some_and(|sigs| sigs.len() >= sender.multimin as usize)
        } else {
            true
        }
    }
}

// ---------------------------------------------------------------------------
// TypeRegistry
// ---------------------------------------------------------------------------

/// Maps a numeric type tag to its handler.
///
/// Populated once at startup, read-only afterwards — it is carried inside
/// [`ChainContext`] and shared by reference.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    handlers: HashMap<u8, Arc<dyn TransactionHandler>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its type tag. Double registration of a tag
    /// is a wiring bug, reported rather than silently shadowed.
    pub fn register(
        &mut self,
        handler: Arc<dyn TransactionHandler>,
    ) -> Result<(), TransactionError> {
        let tag = handler.tx_type();
        if self.handlers.contains_key(&tag) {
            return Err(TransactionError::handler(format!(
                "transaction type {tag} is already registered"
            )));
        }
        self.handlers.insert(tag, handler);
        Ok(())
    }

    /// Look up the handler for a type tag.
    pub fn get(&self, tx_type: u8) -> Result<&Arc<dyn TransactionHandler>, TransactionError> {
        self.handlers
            .get(&tx_type)
            .ok_or(TransactionError::UnknownType(tx_type))
    }

    /// Whether a handler is registered for the tag.
    pub fn contains(&self, tx_type: u8) -> bool {
        self.handlers.contains_key(&tx_type)
    }
}

// ---------------------------------------------------------------------------
// ChainContext
// ---------------------------------------------------------------------------

/// The immutable context every pipeline operation receives: chain
/// parameters plus the handler registry. Built once at startup; callers
/// typically wrap it in an `Arc` and pass it everywhere.
pub struct ChainContext {
    pub params: ChainParams,
    pub registry: TypeRegistry,
}

impl ChainContext {
    pub fn new(params: ChainParams, registry: TypeRegistry) -> Self {
        Self { params, registry }
    }

    /// Shorthand for handler lookup.
    pub fn handler(&self, tx_type: u8) -> Result<&Arc<dyn TransactionHandler>, TransactionError> {
        self.registry.get(tx_type)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
