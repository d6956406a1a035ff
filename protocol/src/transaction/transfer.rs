//! # Transfer Handler (type 0)
//!
//! The reference [`TransactionHandler`]: a plain value transfer. It carries
//! no asset bytes, charges the flat [`TRANSFER_FEE`], and its entire state
//! effect beyond the sender debit the core already performs is crediting the
//! recipient. Every other transaction type ships as an external plug-in
//! against the same trait; this one lives in-crate because the pipeline is
//! untestable without at least one real handler.

use async_trait::async_trait;
use serde_json::Value;

use crate::account::{Account, AccountDelta, AccountStore};
use crate::config::{DELEGATES_PER_ROUND, TRANSFER_FEE};
use crate::slots;
use crate::storage::{Block, Row};

use super::codec::parse_address;
use super::error::TransactionError;
use super::handler::{CreateData, TransactionHandler};
use super::types::Transaction;

/// Plain value transfer between two addresses.
pub struct TransferHandler;

impl TransferHandler {
    /// The recipient address, which every transfer must carry.
    fn recipient<'t>(&self, trs: &'t Transaction) -> Result<&'t str, TransactionError> {
        trs.recipient_id
            .as_deref()
            .ok_or_else(|| TransactionError::handler("missing recipient"))
    }

    /// The recipient-side delta mirroring a confirmed transfer.
    fn recipient_delta(&self, trs: &Transaction, block: &Block) -> AccountDelta {
        AccountDelta {
            balance: trs.amount as i128,
            u_balance: trs.amount as i128,
            block_id: Some(block.id.clone()),
            round: Some(slots::round_for_height(block.height, DELEGATES_PER_ROUND)),
        }
    }
}

#[async_trait]
impl TransactionHandler for TransferHandler {
    fn tx_type(&self) -> u8 {
        0
    }

    fn create(&self, trs: &mut Transaction, data: &CreateData) -> Result<(), TransactionError> {
        trs.recipient_id = data.recipient_id.clone();
        trs.amount = data.amount;
        Ok(())
    }

    fn calculate_fee(&self, _trs: &Transaction, _sender: &Account) -> u64 {
        TRANSFER_FEE
    }

    async fn verify(&self, trs: &Transaction, _sender: &Account) -> Result<(), TransactionError> {
        let recipient = self.recipient(trs)?;
        parse_address(recipient)
            .map_err(|_| TransactionError::handler("invalid recipient address"))?;
        if trs.amount == 0 {
            return Err(TransactionError::handler("invalid transaction amount"));
        }
        Ok(())
    }

    fn get_bytes(&self, _trs: &Transaction) -> Result<Vec<u8>, TransactionError> {
        // A transfer is fully described by the shared fields.
        Ok(Vec::new())
    }

    async fn process(&self, _trs: &Transaction, _sender: &Account) -> Result<(), TransactionError> {
        Ok(())
    }

    fn object_normalize(&self, _trs: &mut Transaction) -> Result<(), TransactionError> {
        Ok(())
    }

    fn db_read(&self, _row: &Row) -> Result<Option<Value>, TransactionError> {
        Ok(None)
    }

    async fn apply(
        &self,
        trs: &Transaction,
        block: &Block,
        _sender: &Account,
        store: &dyn AccountStore,
    ) -> Result<(), TransactionError> {
        let recipient = self.recipient(trs)?;
        store
            .merge(recipient, self.recipient_delta(trs, block))
            .await?;
        Ok(())
    }

    async fn undo(
        &self,
        trs: &Transaction,
        block: &Block,
        _sender: &Account,
        store: &dyn AccountStore,
    ) -> Result<(), TransactionError> {
        let recipient = self.recipient(trs)?;
        store
            .merge(recipient, self.recipient_delta(trs, block).inverted())
            .await?;
        Ok(())
    }

    async fn apply_unconfirmed(
        &self,
        _trs: &Transaction,
        _sender: &Account,
        _store: &dyn AccountStore,
    ) -> Result<(), TransactionError> {
        // The sender's u_balance debit in the core is the whole unconfirmed
        // effect; recipients are only credited on confirmation.
        Ok(())
    }

    async fn undo_unconfirmed(
        &self,
        _trs: &Transaction,
        _sender: &Account,
        _store: &dyn AccountStore,
    ) -> Result<(), TransactionError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
