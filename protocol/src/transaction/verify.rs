//! # The Verification Pipeline
//!
//! Thirteen ordered checks; the first failure short-circuits and becomes the
//! result. Order matters twice over: cheap string comparisons run before
//! signature verification so garbage fails fast, and the handler's own
//! `verify` runs last so a type plug-in can assume the generic invariants
//! already hold.
//!
//! The one sanctioned deviation is the grandfather list: a transaction whose
//! id is on `SENDER_PUBLIC_KEY_EXCEPTIONS` passes check 3 with a log line
//! instead of a rejection, because a handful of historical transactions
//! would otherwise fail chain replay forever.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::account::Account;
use crate::crypto::SolisPublicKey;
use crate::slots;

use super::error::TransactionError;
use super::handler::ChainContext;
use super::signing::{verify_primary, verify_secondary};
use super::types::Transaction;

/// The co-signer key set for multisignature verification.
///
/// Confirmed membership wins; pending membership is the fallback. When both
/// are empty and the transaction itself is a multisignature registration,
/// the set is bootstrapped from the registration's keysgroup, with each
/// entry's leading `+`/`-` action byte stripped — the group being created is
/// the group that must approve its creation.
fn multisignature_keys(trs: &Transaction, sender: &Account) -> Vec<String> {
    let mut keys = if !sender.multisignatures.is_empty() {
        sender.multisignatures.clone()
    } else {
        sender.u_multisignatures.clone()
    };

    if keys.is_empty() {
        if let Some(keysgroup) = trs
            .asset
            .get("multisignature")
            .and_then(|m| m.get("keysgroup"))
            .and_then(Value::as_array)
        {
            keys = keysgroup
                .iter()
                .filter_map(Value::as_str)
                .map(|entry| entry.get(1..).unwrap_or("").to_string())
                .collect();
        }
    }

    if trs.requester_public_key.is_some() {
        keys.push(trs.sender_public_key.to_hex());
    }
    keys
}

/// Runs the full verification pipeline against a transaction.
///
/// `sender` is the account the transaction claims to spend from; `requester`
/// is the submitting co-signer's account when the transaction arrived
/// through a multisignature group member. Both are read-only here — nothing
/// in verification mutates state.
pub async fn verify_transaction(
    ctx: &ChainContext,
    trs: &Transaction,
    sender: Option<&Account>,
    requester: Option<&Account>,
) -> Result<(), TransactionError> {
    // 1. The type tag must have a registered handler.
    let handler = ctx.handler(trs.tx_type)?;

    // 2. A sender account must exist.
    let sender = sender.ok_or(TransactionError::MissingSender)?;

    // 3. The claimed sender public key must match the account's registered
    //    key. An account that has never sent reveals its key with its first
    //    transaction, so an empty registered key matches anything.
    if let Some(registered) = &sender.public_key {
        if *registered != trs.sender_public_key {
            if ctx.params.is_exempt_transaction(trs.id_or_empty()) {
                debug!(
                    id = trs.id_or_empty(),
                    address = %sender.address,
                    "sender public key mismatch accepted: grandfathered transaction"
                );
            } else {
                return Err(TransactionError::InvalidSenderPublicKey {
                    address: sender.address.clone(),
                });
            }
        }
    }

    // 4. The claimed sender address must match the account, ignoring case.
    let claimed = trs.sender_id.as_deref().unwrap_or("");
    if !claimed.eq_ignore_ascii_case(&sender.address) {
        return Err(TransactionError::InvalidSenderAddress {
            expected: sender.address.clone(),
            actual: claimed.to_string(),
        });
    }

    // 5. A requester must be a member of the sender's multisignature group.
    if let Some(requester_key) = &trs.requester_public_key {
        if !sender
            .multisignatures
            .iter()
            .any(|k| *k == requester_key.to_hex())
        {
            return Err(TransactionError::InvalidRequesterPublicKey);
        }
    }

    // 6. The primary signature verifies against the requester when present,
    //    the sender otherwise.
    let signing_key = trs
        .requester_public_key
        .as_ref()
        .unwrap_or(&trs.sender_public_key);
    if !verify_primary(&ctx.registry, trs, signing_key, trs.signature.as_ref())? {
        return Err(TransactionError::FailedSignature);
    }

    // 7. The second signature of whoever submitted, when they have one
    //    registered. Genesis transactions predate second-signature
    //    enforcement and are exempt.
    let genesis = trs.block_id.as_deref() == Some(ctx.params.genesis_block_id.as_str());
    let second_signer = if trs.requester_public_key.is_some() {
        requester.filter(|r| r.second_signature)
    } else {
        sender.second_signature.then_some(sender)
    };
    if let Some(signer) = second_signer {
        if !genesis {
            let second_key = signer
                .second_public_key
                .as_ref()
                .ok_or(TransactionError::FailedSecondSignature(
                    "no second public key on record",
                ))?;
            if !verify_secondary(&ctx.registry, trs, second_key, trs.sign_signature.as_ref())? {
                return Err(TransactionError::FailedSecondSignature(
                    "missing or invalid second signature",
                ));
            }
        }
    }

    // 8. The multisignature list must be duplicate-free.
    if let Some(signatures) = &trs.signatures {
        let mut seen = HashSet::with_capacity(signatures.len());
        for signature in signatures {
            if !seen.insert(signature.as_bytes()) {
                return Err(TransactionError::DuplicateSignature);
            }
        }
    }

    // 9. Every multisignature must verify against some eligible co-signer
    //    key — any member key except the requester's own.
    if let Some(signatures) = &trs.signatures {
        let keys = multisignature_keys(trs, sender);
        let requester_hex = trs.requester_public_key.as_ref().map(|k| k.to_hex());

        for signature in signatures {
            let mut verified = false;
            for key in &keys {
                if requester_hex.as_deref() == Some(key.as_str()) {
                    continue;
                }
                let Ok(public_key) = SolisPublicKey::from_hex(key) else {
                    continue;
                };
                if verify_primary(&ctx.registry, trs, &public_key, Some(signature))? {
                    verified = true;
                    break;
                }
            }
            if !verified {
                return Err(TransactionError::FailedMultisignature);
            }
        }
    }

    // 10. The fee is dictated by the handler, not the client.
    let expected_fee = handler.calculate_fee(trs, sender);
    if trs.fee != expected_fee {
        return Err(TransactionError::InvalidFee {
            expected: expected_fee,
            actual: trs.fee,
        });
    }

    // 11. Amount bounds. The typed field already excludes fractional and
    //     scientific forms; the supply cap is checked here.
    if trs.amount > ctx.params.total_supply {
        return Err(TransactionError::InvalidAmount);
    }

    // 12. The timestamp may not resolve to a slot after the current one.
    if slots::slot_number(trs.timestamp) > slots::current_slot() {
        return Err(TransactionError::InvalidTimestamp);
    }

    // 13. Type-specific verification runs last; its error is the caller's
    //     error, verbatim.
    handler.verify(trs, sender).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
