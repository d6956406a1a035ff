//! # Inbound Transaction Normalization
//!
//! Raw transactions arrive as JSON objects from peers and clients, which
//! means every field is adversarial until proven otherwise. Normalization
//! strips null fields, enforces the shape table below, and only then builds
//! a typed [`Transaction`] and hands the asset to the type handler for its
//! own validation.
//!
//! | field                                  | constraint                      |
//! |----------------------------------------|---------------------------------|
//! | `id`                                   | string                          |
//! | `height`, `type`, `timestamp`          | non-negative integer            |
//! | `blockId`, `senderId`, `recipientId`   | string                          |
//! | `senderPublicKey`, `requesterPublicKey`| 64 lowercase hex chars          |
//! | `amount`, `fee`                        | integer in `[0, TOTAL_SUPPLY]`  |
//! | `signature`, `signSignature`           | 128 lowercase hex chars         |
//! | `signatures`                           | array of 128-hex strings        |
//! | `asset`                                | object                          |
//!
//! Required: `type`, `timestamp`, `senderPublicKey`, `signature`. Amounts
//! must be integral JSON numbers — `0.5`, `1e3`, and negative values all
//! fail, because a JSON parser somewhere will happily widen them and two
//! nodes disagreeing about `1e3` is a fork.

use serde_json::{Map, Value};

use crate::crypto::{SolisPublicKey, SolisSignature};

use super::error::TransactionError;
use super::handler::ChainContext;
use super::types::Transaction;

/// Returns `true` if `s` is exactly `len` lowercase hex characters.
fn is_lowercase_hex(s: &str, len: usize) -> bool {
    s.len() == len
        && s.bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// A u64 read from a JSON value that must be an integral, non-negative
/// number. Fractional and scientific forms parse as floats in serde_json
/// and are rejected here by construction.
fn require_u64(field: &str, value: &Value) -> Result<u64, TransactionError> {
    value.as_u64().ok_or_else(|| {
        TransactionError::malformed(format!("{field} must be a non-negative integer"))
    })
}

fn require_str<'v>(field: &str, value: &'v Value) -> Result<&'v str, TransactionError> {
    value
        .as_str()
        .ok_or_else(|| TransactionError::malformed(format!("{field} must be a string")))
}

fn require_public_key(field: &str, value: &Value) -> Result<SolisPublicKey, TransactionError> {
    let s = require_str(field, value)?;
    if !is_lowercase_hex(s, 64) {
        return Err(TransactionError::malformed(format!(
            "{field} must be 64 lowercase hex characters"
        )));
    }
    SolisPublicKey::from_hex(s)
        .map_err(|_| TransactionError::malformed(format!("{field} is not a valid public key")))
}

fn require_signature(field: &str, value: &Value) -> Result<SolisSignature, TransactionError> {
    let s = require_str(field, value)?;
    if !is_lowercase_hex(s, 128) {
        return Err(TransactionError::malformed(format!(
            "{field} must be 128 lowercase hex characters"
        )));
    }
    SolisSignature::from_hex(s)
        .map_err(|_| TransactionError::malformed(format!("{field} is not a valid signature")))
}

fn require_amount(
    field: &str,
    value: &Value,
    total_supply: u64,
) -> Result<u64, TransactionError> {
    let amount = require_u64(field, value)?;
    if amount > total_supply {
        return Err(TransactionError::malformed(format!(
            "{field} exceeds the total supply"
        )));
    }
    Ok(amount)
}

/// Validates the shape of a raw transaction object and produces a typed
/// [`Transaction`], with the asset normalized by its type handler.
///
/// Fields whose value is JSON `null` are treated as absent. Unknown fields
/// are dropped.
pub fn normalize(ctx: &ChainContext, raw: &Value) -> Result<Transaction, TransactionError> {
    let raw = raw
        .as_object()
        .ok_or_else(|| TransactionError::malformed("transaction must be a JSON object"))?;

    // Null-valued fields are absent fields.
    let fields: Map<String, Value> = raw
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let get = |name: &str| fields.get(name);
    let missing =
        |name: &str| TransactionError::malformed(format!("missing required field {name}"));

    // Required fields first.
    let tx_type_raw = require_u64("type", get("type").ok_or_else(|| missing("type"))?)?;
    let tx_type = u8::try_from(tx_type_raw)
        .map_err(|_| TransactionError::malformed("type exceeds the u8 range"))?;

    let timestamp_raw =
        require_u64("timestamp", get("timestamp").ok_or_else(|| missing("timestamp"))?)?;
    let timestamp = i32::try_from(timestamp_raw)
        .map_err(|_| TransactionError::malformed("timestamp exceeds the i32 range"))?;

    let sender_public_key = require_public_key(
        "senderPublicKey",
        get("senderPublicKey").ok_or_else(|| missing("senderPublicKey"))?,
    )?;

    let signature =
        require_signature("signature", get("signature").ok_or_else(|| missing("signature"))?)?;

    // Optional fields, each validated when present.
    let mut trs = Transaction::unsigned(tx_type, timestamp, sender_public_key);
    trs.signature = Some(signature);

    if let Some(v) = get("id") {
        trs.id = Some(require_str("id", v)?.to_string());
    }
    if let Some(v) = get("blockId") {
        trs.block_id = Some(require_str("blockId", v)?.to_string());
    }
    if let Some(v) = get("height") {
        trs.height = Some(require_u64("height", v)?);
    }
    if let Some(v) = get("senderId") {
        trs.sender_id = Some(require_str("senderId", v)?.to_string());
    }
    if let Some(v) = get("recipientId") {
        trs.recipient_id = Some(require_str("recipientId", v)?.to_string());
    }
    if let Some(v) = get("requesterPublicKey") {
        trs.requester_public_key = Some(require_public_key("requesterPublicKey", v)?);
    }
    if let Some(v) = get("amount") {
        trs.amount = require_amount("amount", v, ctx.params.total_supply)?;
    }
    if let Some(v) = get("fee") {
        trs.fee = require_amount("fee", v, ctx.params.total_supply)?;
    }
    if let Some(v) = get("signSignature") {
        trs.sign_signature = Some(require_signature("signSignature", v)?);
    }
    if let Some(v) = get("signatures") {
        let list = v
            .as_array()
            .ok_or_else(|| TransactionError::malformed("signatures must be an array"))?;
        let mut signatures = Vec::with_capacity(list.len());
        for entry in list {
            signatures.push(require_signature("signatures", entry)?);
        }
        trs.signatures = Some(signatures);
    }
    if let Some(v) = get("confirmations") {
        trs.confirmations = Some(require_u64("confirmations", v)?);
    }
    if let Some(v) = get("asset") {
        if !v.is_object() {
            return Err(TransactionError::malformed("asset must be an object"));
        }
        trs.asset = v.clone();
    }

    // The shape is sound; hand the asset to its type handler.
    ctx.handler(tx_type)?.object_normalize(&mut trs)?;
    Ok(trs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChainParams, TOTAL_SUPPLY, TRANSFER_FEE};
    use crate::crypto::SolisKeypair;
    use crate::transaction::handler::TypeRegistry;
    use crate::transaction::transfer::TransferHandler;
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> ChainContext {
        let mut registry = TypeRegistry::new();
        registry.register(Arc::new(TransferHandler)).unwrap();
        ChainContext::new(ChainParams::default(), registry)
    }

    fn valid_raw() -> Value {
        let kp = SolisKeypair::from_seed([21u8; 32]);
        json!({
            "type": 0,
            "timestamp": 141_738,
            "senderPublicKey": kp.public_key().to_hex(),
            "recipientId": "58191285901858109S",
            "amount": 1_000,
            "fee": TRANSFER_FEE,
            "signature": kp.sign(b"x").to_hex(),
        })
    }

    #[test]
    fn accepts_a_well_formed_transfer() {
        let trs = normalize(&context(), &valid_raw()).unwrap();
        assert_eq!(trs.tx_type, 0);
        assert_eq!(trs.timestamp, 141_738);
        assert_eq!(trs.amount, 1_000);
        assert_eq!(trs.recipient_id.as_deref(), Some("58191285901858109S"));
        assert!(trs.is_signed());
    }

    #[test]
    fn rejects_non_object_input() {
        assert!(matches!(
            normalize(&context(), &json!([1, 2, 3])),
            Err(TransactionError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn each_required_field_is_enforced() {
        for field in ["type", "timestamp", "senderPublicKey", "signature"] {
            let mut raw = valid_raw();
            raw.as_object_mut().unwrap().remove(field);
            assert!(
                matches!(
                    normalize(&context(), &raw),
                    Err(TransactionError::MalformedTransaction(_))
                ),
                "expected rejection without {field}"
            );
        }
    }

    #[test]
    fn null_fields_are_stripped_before_validation() {
        let mut raw = valid_raw();
        raw.as_object_mut()
            .unwrap()
            .insert("signSignature".into(), Value::Null);
        let trs = normalize(&context(), &raw).unwrap();
        assert!(trs.sign_signature.is_none());
    }

    #[test]
    fn rejects_fractional_and_scientific_amounts() {
        for bad in [json!(0.5), json!(1e3), json!(-1), json!("1000")] {
            let mut raw = valid_raw();
            raw.as_object_mut().unwrap().insert("amount".into(), bad);
            assert!(matches!(
                normalize(&context(), &raw),
                Err(TransactionError::MalformedTransaction(_))
            ));
        }
    }

    #[test]
    fn amount_bounds_are_inclusive() {
        let mut raw = valid_raw();
        raw.as_object_mut()
            .unwrap()
            .insert("amount".into(), json!(TOTAL_SUPPLY));
        assert!(normalize(&context(), &raw).is_ok());

        raw.as_object_mut()
            .unwrap()
            .insert("amount".into(), json!(TOTAL_SUPPLY + 1));
        assert!(matches!(
            normalize(&context(), &raw),
            Err(TransactionError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn rejects_uppercase_hex_keys() {
        let mut raw = valid_raw();
        let upper = raw["senderPublicKey"].as_str().unwrap().to_uppercase();
        raw.as_object_mut()
            .unwrap()
            .insert("senderPublicKey".into(), json!(upper));
        assert!(matches!(
            normalize(&context(), &raw),
            Err(TransactionError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn rejects_wrong_length_signature() {
        let mut raw = valid_raw();
        raw.as_object_mut()
            .unwrap()
            .insert("signature".into(), json!("abcd"));
        assert!(matches!(
            normalize(&context(), &raw),
            Err(TransactionError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn rejects_non_object_asset() {
        let mut raw = valid_raw();
        raw.as_object_mut()
            .unwrap()
            .insert("asset".into(), json!("not an object"));
        assert!(matches!(
            normalize(&context(), &raw),
            Err(TransactionError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn unknown_type_is_its_own_error() {
        let mut raw = valid_raw();
        raw.as_object_mut().unwrap().insert("type".into(), json!(99));
        assert!(matches!(
            normalize(&context(), &raw),
            Err(TransactionError::UnknownType(99))
        ));
    }

    #[test]
    fn signatures_array_is_validated_per_entry() {
        let kp = SolisKeypair::from_seed([22u8; 32]);
        let mut raw = valid_raw();
        raw.as_object_mut().unwrap().insert(
            "signatures".into(),
            json!([kp.sign(b"a").to_hex(), "zz"]),
        );
        assert!(matches!(
            normalize(&context(), &raw),
            Err(TransactionError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn unknown_fields_are_dropped() {
        let mut raw = valid_raw();
        raw.as_object_mut()
            .unwrap()
            .insert("mystery".into(), json!({ "x": 1 }));
        assert!(normalize(&context(), &raw).is_ok());
    }
}
