//! # Transaction Construction
//!
//! Fluent builder for locally created transactions. The builder gathers the
//! caller's intent, then `build` runs the creation sequence in its fixed
//! order: stamp the timestamp, let the handler shape its fields, sign,
//! attach the optional second signature, derive the id, and finally stamp
//! the handler-computed fee.
//!
//! The ordering is not cosmetic. The fee is not part of the canonical bytes,
//! so it can (and must) be stamped after the id without invalidating either
//! the id or the signatures; the second signature covers the primary one and
//! therefore comes after it.

use serde_json::Value;

use crate::account::Account;
use crate::crypto::SolisKeypair;
use crate::slots;

use super::codec::{canonical_hash, transaction_id};
use super::error::TransactionError;
use super::handler::{ChainContext, CreateData};
use super::signing::sign;
use super::types::Transaction;

/// Fluent builder for signed transactions.
///
/// # Usage
///
/// ```rust,no_run
/// use solis_protocol::transaction::TransactionBuilder;
/// # fn demo(ctx: &solis_protocol::transaction::ChainContext,
/// #         sender: &solis_protocol::account::Account,
/// #         keypair: &solis_protocol::crypto::SolisKeypair) {
/// let trs = TransactionBuilder::new(0)
///     .recipient("58191285901858109S")
///     .amount(1_000)
///     .build(ctx, sender, keypair, None)
///     .unwrap();
/// # }
/// ```
pub struct TransactionBuilder {
    tx_type: u8,
    recipient_id: Option<String>,
    amount: u64,
    payload: Value,
    timestamp: Option<i32>,
}

impl TransactionBuilder {
    /// Start building a transaction of the given type.
    pub fn new(tx_type: u8) -> Self {
        Self {
            tx_type,
            recipient_id: None,
            amount: 0,
            payload: Value::Null,
            timestamp: None,
        }
    }

    /// Set the recipient address.
    pub fn recipient(mut self, address: &str) -> Self {
        self.recipient_id = Some(address.to_string());
        self
    }

    /// Set the amount in lux.
    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    /// Attach a handler-specific creation payload.
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Pin the epoch timestamp. Defaults to the current epoch time, which
    /// is what every non-test caller wants.
    pub fn timestamp(mut self, timestamp: i32) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Produce a signed transaction spending from `sender`.
    ///
    /// `second_keypair` must be supplied exactly when the sender has a
    /// registered second signing key; the pipeline enforces the match on
    /// admission either way.
    pub fn build(
        self,
        ctx: &ChainContext,
        sender: &Account,
        keypair: &SolisKeypair,
        second_keypair: Option<&SolisKeypair>,
    ) -> Result<Transaction, TransactionError> {
        let handler = ctx.handler(self.tx_type)?;
        let timestamp = self.timestamp.unwrap_or_else(slots::now_epoch_seconds);

        let mut trs = Transaction::unsigned(self.tx_type, timestamp, keypair.public_key());
        handler.create(
            &mut trs,
            &CreateData {
                recipient_id: self.recipient_id,
                amount: self.amount,
                payload: self.payload,
            },
        )?;

        trs.signature = Some(sign(&ctx.registry, &trs, keypair)?);

        if let Some(second) = second_keypair {
            let hash = canonical_hash(&ctx.registry, &trs, false, true)?;
            trs.sign_signature = Some(second.sign(&hash));
        }

        trs.id = Some(transaction_id(&ctx.registry, &trs)?);
        trs.fee = handler.calculate_fee(&trs, sender);
        Ok(trs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
