//! # State Mutation & Pool Admission
//!
//! Four balance-mutating operations, each a two-phase merge: the core debits
//! (or credits) the sender through `AccountStore::merge`, then hands control
//! to the type handler for its own state effects. If the handler fails, the
//! balance delta is reversed exactly before the error is surfaced — the
//! caller must observe no net change. If the reversal itself fails, balance
//! integrity is already broken and *that* error wins; the handler error goes
//! to the log.
//!
//! `process` is pool admission: recompute the id (never trust the wire),
//! stamp the sender address, run the handler's admission hook, and reject
//! replays via the ledger. Readiness is deliberately not checked here — a
//! transaction still collecting multisignature approvals may sit in the
//! pool; `apply` enforces readiness at block time.

use tracing::error;

use crate::account::{Account, AccountDelta, AccountStore};
use crate::slots;
use crate::storage::{Block, KeyValueLedger};

use super::codec::transaction_id;
use super::error::TransactionError;
use super::handler::ChainContext;
use super::types::Transaction;

/// Performs `merge(delta)`, runs `effect`, and reverses the merge if the
/// effect fails. The compensating-rollback primitive shared by all four
/// mutation operations.
async fn merge_with_rollback<F>(
    store: &dyn AccountStore,
    address: &str,
    delta: AccountDelta,
    effect: F,
) -> Result<(), TransactionError>
where
    F: std::future::Future<Output = Result<(), TransactionError>>,
{
    store.merge(address, delta.clone()).await?;

    match effect.await {
        Ok(()) => Ok(()),
        Err(effect_err) => match store.merge(address, delta.inverted()).await {
            Ok(_) => Err(effect_err),
            Err(rollback_err) => {
                // The account is now in an inconsistent state; that outranks
                // whatever the handler had to say.
                error!(
                    address,
                    handler_error = %effect_err,
                    rollback_error = %rollback_err,
                    "balance rollback failed after handler error"
                );
                Err(TransactionError::Store(rollback_err))
            }
        },
    }
}

/// Applies a transaction's confirmed effects for a block.
///
/// Requires the handler to report the transaction ready, checks the
/// confirmed balance (waived for the genesis block), debits
/// `amount + fee` with block provenance, and runs the handler's `apply`.
pub async fn apply(
    ctx: &ChainContext,
    store: &dyn AccountStore,
    trs: &Transaction,
    block: &Block,
    sender: &Account,
) -> Result<(), TransactionError> {
    let handler = ctx.handler(trs.tx_type)?;

    if !handler.ready(trs, sender) {
        return Err(TransactionError::NotReady);
    }

    let amount_fee = trs.amount_plus_fee()?;
    let genesis = block.id == ctx.params.genesis_block_id;
    if !genesis && sender.balance < amount_fee {
        return Err(TransactionError::InsufficientBalance {
            available: sender.balance,
            required: amount_fee,
        });
    }

    let round = slots::round_for_height(block.height, ctx.params.delegates_per_round);
    let delta = AccountDelta::confirmed(-(amount_fee as i128), &block.id, round);

    merge_with_rollback(
        store,
        &sender.address,
        delta,
        handler.apply(trs, block, sender, store),
    )
    .await
}

/// Undoes a transaction's confirmed effects on block rollback.
///
/// Credits `amount + fee` back to the confirmed balance, then runs the
/// handler's `undo`; the credit is reversed if the handler fails.
pub async fn undo(
    ctx: &ChainContext,
    store: &dyn AccountStore,
    trs: &Transaction,
    block: &Block,
    sender: &Account,
) -> Result<(), TransactionError> {
    let handler = ctx.handler(trs.tx_type)?;

    let amount_fee = trs.amount_plus_fee()?;
    let round = slots::round_for_height(block.height, ctx.params.delegates_per_round);
    let delta = AccountDelta::confirmed(amount_fee as i128, &block.id, round);

    merge_with_rollback(
        store,
        &sender.address,
        delta,
        handler.undo(trs, block, sender, store),
    )
    .await
}

/// Applies a transaction's unconfirmed effects on pool admission.
///
/// Enforces the second-signature presence rules for whoever submitted the
/// transaction, checks the unconfirmed balance, debits `u_balance`, and
/// runs the handler's `apply_unconfirmed`.
pub async fn apply_unconfirmed(
    ctx: &ChainContext,
    store: &dyn AccountStore,
    trs: &Transaction,
    sender: &Account,
    requester: Option<&Account>,
) -> Result<(), TransactionError> {
    let handler = ctx.handler(trs.tx_type)?;
    let genesis = trs.block_id.as_deref() == Some(ctx.params.genesis_block_id.as_str());

    // Second-signature presence must match the submitter's registration:
    // required when registered, forbidden when not.
    match requester {
        None => {
            if sender.second_signature && trs.sign_signature.is_none() && !genesis {
                return Err(TransactionError::FailedSecondSignature(
                    "missing sender second signature",
                ));
            }
            if !sender.second_signature && trs.sign_signature.is_some() {
                return Err(TransactionError::FailedSecondSignature(
                    "sender does not have a second signature",
                ));
            }
        }
        Some(requester) => {
            if requester.second_signature && trs.sign_signature.is_none() {
                return Err(TransactionError::FailedSecondSignature(
                    "missing requester second signature",
                ));
            }
            if !requester.second_signature && trs.sign_signature.is_some() {
                return Err(TransactionError::FailedSecondSignature(
                    "requester does not have a second signature",
                ));
            }
        }
    }

    let amount_fee = trs.amount_plus_fee()?;
    if !genesis && sender.u_balance < amount_fee {
        return Err(TransactionError::InsufficientBalance {
            available: sender.u_balance,
            required: amount_fee,
        });
    }

    let delta = AccountDelta::unconfirmed(-(amount_fee as i128));
    merge_with_rollback(
        store,
        &sender.address,
        delta,
        handler.apply_unconfirmed(trs, sender, store),
    )
    .await
}

/// Undoes a transaction's unconfirmed effects when it leaves the pool
/// without confirming.
pub async fn undo_unconfirmed(
    ctx: &ChainContext,
    store: &dyn AccountStore,
    trs: &Transaction,
    sender: &Account,
) -> Result<(), TransactionError> {
    let handler = ctx.handler(trs.tx_type)?;

    let amount_fee = trs.amount_plus_fee()?;
    let delta = AccountDelta::unconfirmed(amount_fee as i128);
    merge_with_rollback(
        store,
        &sender.address,
        delta,
        handler.undo_unconfirmed(trs, sender, store),
    )
    .await
}

/// Admits a transaction toward the pool.
///
/// Recomputes the id — a wire id that disagrees is malformed, a missing one
/// is stamped — attaches the sender address, runs the handler's admission
/// hook, and rejects anything the ledger has already confirmed.
pub async fn process(
    ctx: &ChainContext,
    ledger: &dyn KeyValueLedger,
    trs: &mut Transaction,
    sender: &Account,
) -> Result<(), TransactionError> {
    let handler = ctx.handler(trs.tx_type)?;

    let computed = transaction_id(&ctx.registry, trs)?;
    if let Some(claimed) = &trs.id {
        if *claimed != computed {
            return Err(TransactionError::malformed("invalid transaction id"));
        }
    }
    trs.id = Some(computed.clone());
    trs.sender_id = Some(sender.address.clone());

    handler.process(trs, sender).await?;

    if ledger.count_by_id(&computed).await? > 0 {
        return Err(TransactionError::AlreadyConfirmed(computed));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
