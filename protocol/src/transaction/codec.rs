//! # Canonical Byte Encoding & Id Derivation
//!
//! The canonical byte sequence is the consensus pre-image: it feeds the
//! SHA-256 digest that is both signed and truncated into the transaction id.
//! Every node must produce these bytes identically or the chain forks, so
//! the layout is fixed down to the byte order of each field:
//!
//! | field                  | size | encoding                              |
//! |------------------------|------|---------------------------------------|
//! | type                   | 1    | raw                                   |
//! | timestamp              | 4    | big-endian signed                     |
//! | sender public key      | 32   | raw                                   |
//! | requester public key   | 0/32 | raw, omitted entirely when absent     |
//! | recipient              | 8    | big-endian u64, zero when absent      |
//! | amount                 | 8    | big-endian u64                        |
//! | asset bytes            | n    | handler-defined, deterministic        |
//! | signature              | 0/64 | raw, unless skipped                   |
//! | second signature       | 0/64 | raw, unless skipped or absent         |
//!
//! Note the deliberate endian split: the timestamp is serialized big-endian
//! while the id is extracted little-endian from the digest. Both
//! orientations are consensus facts, not choices.

use crate::crypto::sha256_array;

use super::error::TransactionError;
use super::handler::TypeRegistry;
use super::types::Transaction;

/// Length of the 8-byte recipient field.
const RECIPIENT_FIELD_LENGTH: usize = 8;

/// Parses a Solis address into the u64 that backs its 8-byte wire field.
///
/// An address is a base-10 u64 rendering terminated by exactly one suffix
/// character; parsing strips that one character and reads the remainder as
/// decimal. An empty or non-digit remainder is malformed.
pub fn parse_address(address: &str) -> Result<u64, TransactionError> {
    let mut chars = address.chars();
    if chars.next_back().is_none() {
        return Err(TransactionError::malformed("empty address"));
    }
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TransactionError::malformed(format!(
            "address {address:?} is not a decimal string with a suffix character"
        )));
    }
    digits.parse::<u64>().map_err(|_| {
        TransactionError::malformed(format!("address {address:?} exceeds the u64 range"))
    })
}

/// Produces the canonical byte sequence of a transaction.
///
/// `skip_signature` / `skip_second_signature` select the signing pre-images:
/// primary signatures cover the bytes with both skipped, second signatures
/// cover the bytes with only the second skipped, and the id digest covers
/// everything present.
///
/// The buffer is allocated once at its exact final length.
pub fn canonical_bytes(
    registry: &TypeRegistry,
    trs: &Transaction,
    skip_signature: bool,
    skip_second_signature: bool,
) -> Result<Vec<u8>, TransactionError> {
    let handler = registry.get(trs.tx_type)?;
    let asset_bytes = handler
        .get_bytes(trs)
        .map_err(|e| TransactionError::AssetEncodeFailed(e.to_string()))?;

    let include_signature = !skip_signature && trs.signature.is_some();
    let include_second = !skip_second_signature && trs.sign_signature.is_some();

    let mut size = 1 + 4 + 32 + RECIPIENT_FIELD_LENGTH + 8 + asset_bytes.len();
    if trs.requester_public_key.is_some() {
        size += 32;
    }
    if include_signature {
        size += 64;
    }
    if include_second {
        size += 64;
    }

    let mut buf = Vec::with_capacity(size);

    buf.push(trs.tx_type);
    buf.extend_from_slice(&trs.timestamp.to_be_bytes());
    buf.extend_from_slice(trs.sender_public_key.as_bytes());

    if let Some(requester) = &trs.requester_public_key {
        buf.extend_from_slice(requester.as_bytes());
    }

    match &trs.recipient_id {
        Some(recipient) => buf.extend_from_slice(&parse_address(recipient)?.to_be_bytes()),
        None => buf.extend_from_slice(&[0u8; RECIPIENT_FIELD_LENGTH]),
    }

    buf.extend_from_slice(&trs.amount.to_be_bytes());
    buf.extend_from_slice(&asset_bytes);

    if include_signature {
        if let Some(signature) = &trs.signature {
            buf.extend_from_slice(signature.as_bytes());
        }
    }
    if include_second {
        if let Some(sign_signature) = &trs.sign_signature {
            buf.extend_from_slice(sign_signature.as_bytes());
        }
    }

    debug_assert_eq!(buf.len(), size);
    Ok(buf)
}

/// SHA-256 over the selected canonical byte form. This digest is the
/// Ed25519 message for signing and the source of the id.
pub fn canonical_hash(
    registry: &TypeRegistry,
    trs: &Transaction,
    skip_signature: bool,
    skip_second_signature: bool,
) -> Result<[u8; 32], TransactionError> {
    Ok(sha256_array(&canonical_bytes(
        registry,
        trs,
        skip_signature,
        skip_second_signature,
    )?))
}

/// Derives the transaction id: the base-10 rendering of the first eight
/// bytes of the full canonical digest, read as a little-endian u64.
///
/// Derived, never trusted — any id arriving on a transaction is recomputed
/// and compared by `process`.
pub fn transaction_id(
    registry: &TypeRegistry,
    trs: &Transaction,
) -> Result<String, TransactionError> {
    let hash = canonical_hash(registry, trs, false, false)?;
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash[..8]);
    Ok(u64::from_le_bytes(head).to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, AccountStore};
    use crate::crypto::{sha256_array, SolisKeypair};
    use crate::storage::{Block, Row};
    use crate::transaction::handler::{CreateData, TransactionHandler};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;

    /// Handler with no asset bytes, standing in for a plain transfer.
    struct EmptyAsset;

    /// Handler serializing `asset.note` so the codec tests can cover a
    /// non-empty, deterministic asset segment.
    struct NoteAsset;

    macro_rules! passthrough_handler {
        ($name:ident, $tag:expr, $bytes:expr) => {
            #[async_trait]
            impl TransactionHandler for $name {
                fn tx_type(&self) -> u8 {
                    $tag
                }
                fn create(
                    &self,
                    _: &mut Transaction,
                    _: &CreateData,
                ) -> Result<(), TransactionError> {
                    Ok(())
                }
                fn calculate_fee(&self, _: &Transaction, _: &Account) -> u64 {
                    0
                }
                async fn verify(
                    &self,
                    _: &Transaction,
                    _: &Account,
                ) -> Result<(), TransactionError> {
                    Ok(())
                }
                fn get_bytes(&self, trs: &Transaction) -> Result<Vec<u8>, TransactionError> {
                    let encode = $bytes;
                    encode(trs)
                }
                async fn process(
                    &self,
                    _: &Transaction,
                    _: &Account,
                ) -> Result<(), TransactionError> {
                    Ok(())
                }
                fn object_normalize(&self, _: &mut Transaction) -> Result<(), TransactionError> {
                    Ok(())
                }
                fn db_read(&self, _: &Row) -> Result<Option<Value>, TransactionError> {
                    Ok(None)
                }
                async fn apply(
                    &self,
                    _: &Transaction,
                    _: &Block,
                    _: &Account,
                    _: &dyn AccountStore,
                ) -> Result<(), TransactionError> {
                    Ok(())
                }
                async fn undo(
                    &self,
                    _: &Transaction,
                    _: &Block,
                    _: &Account,
                    _: &dyn AccountStore,
                ) -> Result<(), TransactionError> {
                    Ok(())
                }
                async fn apply_unconfirmed(
                    &self,
                    _: &Transaction,
                    _: &Account,
                    _: &dyn AccountStore,
                ) -> Result<(), TransactionError> {
                    Ok(())
                }
                async fn undo_unconfirmed(
                    &self,
                    _: &Transaction,
                    _: &Account,
                    _: &dyn AccountStore,
                ) -> Result<(), TransactionError> {
                    Ok(())
                }
            }
        };
    }

    passthrough_handler!(EmptyAsset, 0, |_trs: &Transaction| Ok(Vec::new()));
    passthrough_handler!(NoteAsset, 9, |trs: &Transaction| {
        let note = trs.asset.get("note").and_then(Value::as_str).unwrap_or("");
        Ok(note.as_bytes().to_vec())
    });

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register(Arc::new(EmptyAsset)).unwrap();
        registry.register(Arc::new(NoteAsset)).unwrap();
        registry
    }

    fn signed_transfer() -> Transaction {
        let kp = SolisKeypair::from_seed([5u8; 32]);
        let mut trs = Transaction::unsigned(0, 141_738, kp.public_key());
        trs.recipient_id = Some("58191285901858109S".to_string());
        trs.amount = 1_000;
        trs.signature = Some(kp.sign(b"placeholder"));
        trs
    }

    #[test]
    fn parse_address_strips_one_suffix_char() {
        assert_eq!(parse_address("58191285901858109S").unwrap(), 58_191_285_901_858_109);
        assert_eq!(parse_address("0S").unwrap(), 0);
    }

    #[test]
    fn parse_address_rejects_bad_forms() {
        for bad in ["", "S", "12a45S", "12345", "184467440737095516160S"] {
            assert!(
                matches!(
                    parse_address(bad),
                    Err(TransactionError::MalformedTransaction(_))
                ),
                "expected rejection of {bad:?}"
            );
        }
    }

    #[test]
    fn type_zero_transfer_is_117_bytes() {
        // 1 (type) + 4 (timestamp) + 32 (sender pk) + 8 (recipient)
        // + 8 (amount) + 64 (signature) = 117, no asset bytes.
        let registry = registry();
        let bytes = canonical_bytes(&registry, &signed_transfer(), false, false).unwrap();
        assert_eq!(bytes.len(), 117);
    }

    #[test]
    fn field_layout_is_exact() {
        let registry = registry();
        let trs = signed_transfer();
        let bytes = canonical_bytes(&registry, &trs, false, false).unwrap();

        assert_eq!(bytes[0], 0, "type tag");
        assert_eq!(&bytes[1..5], &141_738i32.to_be_bytes(), "timestamp BE");
        assert_eq!(&bytes[5..37], trs.sender_public_key.as_bytes());
        assert_eq!(
            &bytes[37..45],
            &58_191_285_901_858_109u64.to_be_bytes(),
            "recipient BE"
        );
        assert_eq!(&bytes[45..53], &1_000u64.to_be_bytes(), "amount BE");
        assert_eq!(&bytes[53..], trs.signature.unwrap().as_bytes());
    }

    #[test]
    fn absent_recipient_encodes_as_zero_field() {
        let registry = registry();
        let mut trs = signed_transfer();
        trs.recipient_id = None;
        let bytes = canonical_bytes(&registry, &trs, false, false).unwrap();
        assert_eq!(&bytes[37..45], &[0u8; 8]);
    }

    #[test]
    fn requester_key_inserts_32_bytes() {
        let registry = registry();
        let mut trs = signed_transfer();
        let without = canonical_bytes(&registry, &trs, false, false).unwrap();

        let requester = SolisKeypair::from_seed([6u8; 32]).public_key();
        trs.requester_public_key = Some(requester);
        let with = canonical_bytes(&registry, &trs, false, false).unwrap();

        assert_eq!(with.len(), without.len() + 32);
        assert_eq!(&with[37..69], requester.as_bytes());
    }

    #[test]
    fn skip_flags_drop_signature_segments() {
        let registry = registry();
        let kp2 = SolisKeypair::from_seed([8u8; 32]);
        let mut trs = signed_transfer();
        trs.sign_signature = Some(kp2.sign(b"second"));

        let full = canonical_bytes(&registry, &trs, false, false).unwrap();
        let no_second = canonical_bytes(&registry, &trs, false, true).unwrap();
        let unsigned = canonical_bytes(&registry, &trs, true, true).unwrap();

        assert_eq!(full.len(), 117 + 64);
        assert_eq!(no_second.len(), 117);
        assert_eq!(unsigned.len(), 117 - 64);
        // The shorter forms are strict prefixes of the full form.
        assert_eq!(&full[..117], no_second.as_slice());
        assert_eq!(&no_second[..53], unsigned.as_slice());
    }

    #[test]
    fn asset_bytes_sit_between_amount_and_signature() {
        let registry = registry();
        let kp = SolisKeypair::from_seed([5u8; 32]);
        let mut trs = Transaction::unsigned(9, 10, kp.public_key());
        trs.asset = serde_json::json!({ "note": "rent" });
        trs.signature = Some(kp.sign(b"x"));

        let bytes = canonical_bytes(&registry, &trs, false, false).unwrap();
        assert_eq!(bytes.len(), 117 + 4);
        assert_eq!(&bytes[53..57], b"rent");
    }

    #[test]
    fn unknown_type_fails() {
        let registry = registry();
        let mut trs = signed_transfer();
        trs.tx_type = 200;
        assert!(matches!(
            canonical_bytes(&registry, &trs, false, false),
            Err(TransactionError::UnknownType(200))
        ));
    }

    #[test]
    fn id_is_little_endian_decimal_of_digest_head() {
        let registry = registry();
        let trs = signed_transfer();

        let bytes = canonical_bytes(&registry, &trs, false, false).unwrap();
        let digest = sha256_array(&bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let expected = u64::from_le_bytes(head).to_string();

        assert_eq!(transaction_id(&registry, &trs).unwrap(), expected);
    }

    #[test]
    fn id_is_a_pure_function_of_the_bytes() {
        let registry = registry();
        let trs = signed_transfer();
        let clone = trs.clone();
        assert_eq!(
            transaction_id(&registry, &trs).unwrap(),
            transaction_id(&registry, &clone).unwrap()
        );
    }
}
