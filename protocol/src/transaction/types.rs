//! # The Transaction Record
//!
//! The fundamental unit of state change on Solis. A transaction is immutable
//! after signing except for field attachment: `id` and `sender_id` are
//! stamped by `process`, and `block_id`/`height`/`confirmations` are attached
//! once the containing block is accepted. Everything that participates in
//! the signing pre-image is fixed the moment the primary signature is
//! produced.
//!
//! The JSON form uses camelCase field names — that is the wire and database
//! dialect — while the Rust field names stay snake_case.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::{SolisPublicKey, SolisSignature};

use super::error::TransactionError;

/// Default asset payload: an empty object, not `null`, so that handlers can
/// always index into it.
fn empty_asset() -> Value {
    Value::Object(serde_json::Map::new())
}

/// A Solis transaction.
///
/// `fee` is computed by the type handler, never chosen by the client; `id`
/// is derived from the canonical bytes and never trusted from input. The
/// canonical byte encoding and id derivation live in
/// [`codec`](super::codec).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Derived identifier: base-10 of the first eight SHA-256 digest bytes,
    /// little-endian. Recomputed on every ingress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Id of the containing block, attached on inclusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,

    /// Height of the containing block, attached on inclusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,

    /// Type tag selecting the handler.
    #[serde(rename = "type")]
    pub tx_type: u8,

    /// Seconds since the chain epoch.
    pub timestamp: i32,

    /// The sender's public key.
    pub sender_public_key: SolisPublicKey,

    /// Public key of the multisignature co-signer submitting on the
    /// sender's behalf, when the sender did not submit directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_public_key: Option<SolisPublicKey>,

    /// Derived sender address, stamped by `process`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,

    /// Recipient address; absent for self-contained types such as
    /// registrations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,

    /// Amount in lux.
    pub amount: u64,

    /// Fee in lux, as computed by the handler.
    pub fee: u64,

    /// Type-specific payload, owned by the handler.
    #[serde(default = "empty_asset")]
    pub asset: Value,

    /// Primary Ed25519 signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SolisSignature>,

    /// Second-factor signature, present when the sender has a registered
    /// second key. Covers the primary signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_signature: Option<SolisSignature>,

    /// Additional multisignature approvals, in submission order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<SolisSignature>>,

    /// Confirmation depth, attached by query layers after inclusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
}

impl Transaction {
    /// A bare unsigned transaction of the given type and sender.
    pub fn unsigned(tx_type: u8, timestamp: i32, sender_public_key: SolisPublicKey) -> Self {
        Self {
            id: None,
            block_id: None,
            height: None,
            tx_type,
            timestamp,
            sender_public_key,
            requester_public_key: None,
            sender_id: None,
            recipient_id: None,
            amount: 0,
            fee: 0,
            asset: empty_asset(),
            signature: None,
            sign_signature: None,
            signatures: None,
            confirmations: None,
        }
    }

    /// `amount + fee` with overflow rejected rather than wrapped.
    ///
    /// Both addends are bounded by `TOTAL_SUPPLY` for any transaction that
    /// passed verification, so failure here means the caller skipped the
    /// pipeline.
    pub fn amount_plus_fee(&self) -> Result<u64, TransactionError> {
        self.amount
            .checked_add(self.fee)
            .ok_or(TransactionError::InvalidAmount)
    }

    /// Returns `true` if this transaction carries a primary signature.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// The id, or an empty string when not yet derived. Logging helper.
    pub fn id_or_empty(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SolisKeypair;

    fn sample() -> Transaction {
        let pk = SolisKeypair::from_seed([1u8; 32]).public_key();
        let mut trs = Transaction::unsigned(0, 141_738, pk);
        trs.recipient_id = Some("58191285901858109S".to_string());
        trs.amount = 1_000;
        trs
    }

    #[test]
    fn unsigned_has_empty_object_asset() {
        let trs = sample();
        assert!(trs.asset.is_object());
        assert!(!trs.is_signed());
    }

    #[test]
    fn amount_plus_fee_checked() {
        let mut trs = sample();
        trs.fee = 10_000_000;
        assert_eq!(trs.amount_plus_fee().unwrap(), 10_001_000);

        trs.amount = u64::MAX;
        trs.fee = 1;
        assert!(matches!(
            trs.amount_plus_fee(),
            Err(TransactionError::InvalidAmount)
        ));
    }

    #[test]
    fn json_uses_camel_case_and_type_keyword() {
        let trs = sample();
        let json = serde_json::to_value(&trs).unwrap();
        assert!(json.get("type").is_some());
        assert!(json.get("senderPublicKey").is_some());
        assert!(json.get("recipientId").is_some());
        // Absent optionals stay off the wire entirely.
        assert!(json.get("signSignature").is_none());
        assert!(json.get("blockId").is_none());
    }

    #[test]
    fn json_roundtrip() {
        let trs = sample();
        let json = serde_json::to_string(&trs).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(trs, back);
    }

    #[test]
    fn missing_asset_defaults_to_object() {
        let pk = SolisKeypair::from_seed([1u8; 32]).public_key();
        let json = format!(
            r#"{{"type":0,"timestamp":5,"senderPublicKey":"{}","amount":1,"fee":0}}"#,
            pk.to_hex()
        );
        let trs: Transaction = serde_json::from_str(&json).unwrap();
        assert!(trs.asset.is_object());
    }
}
