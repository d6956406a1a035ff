//! # Persistence Adapter
//!
//! Maps a transaction to the row set the ledger persists and back. The core
//! `trs` row carries the canonical column list; the type handler appends any
//! rows of its own and reconstructs its asset on the way out.
//!
//! Column conventions: public keys and signatures are raw bytes, identifiers
//! and addresses are text, the multisignature list is one comma-joined hex
//! string, and amounts are unsigned 64-bit integers. `db_read` parses
//! numeric columns from text as well, because rows coming back from a SQL
//! ledger arrive stringly typed.

use crate::crypto::{SolisPublicKey, SolisSignature};
use crate::storage::{Row, RowOp, SqlValue};

use super::error::TransactionError;
use super::handler::ChainContext;
use super::types::Transaction;

/// The table the core row lands in.
const TRS_TABLE: &str = "trs";

fn text_or_null(value: Option<&str>) -> SqlValue {
    match value {
        Some(s) => SqlValue::Text(s.to_string()),
        None => SqlValue::Null,
    }
}

fn public_key_bytes(key: Option<&SolisPublicKey>) -> SqlValue {
    match key {
        Some(key) => SqlValue::Bytes(key.as_bytes().to_vec()),
        None => SqlValue::Null,
    }
}

fn signature_bytes(signature: Option<&SolisSignature>) -> SqlValue {
    match signature {
        Some(signature) => SqlValue::Bytes(signature.as_bytes().to_vec()),
        None => SqlValue::Null,
    }
}

/// Builds the row set to persist for a transaction: the canonical `trs`
/// row first, then whatever the type handler contributes.
///
/// Fail-fast: a transaction without an id or with a negative timestamp has
/// skipped the pipeline and is refused outright.
pub fn db_save(ctx: &ChainContext, trs: &Transaction) -> Result<Vec<RowOp>, TransactionError> {
    let handler = ctx.handler(trs.tx_type)?;

    let id = trs
        .id
        .as_deref()
        .ok_or_else(|| TransactionError::malformed("cannot persist a transaction without an id"))?;
    let timestamp = u64::try_from(trs.timestamp)
        .map_err(|_| TransactionError::malformed("cannot persist a negative timestamp"))?;

    let signatures = trs.signatures.as_ref().map(|signatures| {
        signatures
            .iter()
            .map(SolisSignature::to_hex)
            .collect::<Vec<_>>()
            .join(",")
    });

    let mut values = Row::new();
    values.insert("id".into(), SqlValue::Text(id.to_string()));
    values.insert("blockId".into(), text_or_null(trs.block_id.as_deref()));
    values.insert("type".into(), SqlValue::Int(u64::from(trs.tx_type)));
    values.insert("timestamp".into(), SqlValue::Int(timestamp));
    values.insert(
        "senderPublicKey".into(),
        public_key_bytes(Some(&trs.sender_public_key)),
    );
    values.insert(
        "requesterPublicKey".into(),
        public_key_bytes(trs.requester_public_key.as_ref()),
    );
    values.insert("senderId".into(), text_or_null(trs.sender_id.as_deref()));
    values.insert(
        "recipientId".into(),
        text_or_null(trs.recipient_id.as_deref()),
    );
    values.insert("amount".into(), SqlValue::Int(trs.amount));
    values.insert("fee".into(), SqlValue::Int(trs.fee));
    values.insert("signature".into(), signature_bytes(trs.signature.as_ref()));
    values.insert(
        "signSignature".into(),
        signature_bytes(trs.sign_signature.as_ref()),
    );
    values.insert("signatures".into(), text_or_null(signatures.as_deref()));

    let mut rows = vec![RowOp::new(TRS_TABLE, values)];
    rows.extend(handler.db_save(trs)?);
    Ok(rows)
}

fn read_public_key(field: &str, value: &SqlValue) -> Result<SolisPublicKey, TransactionError> {
    match value {
        SqlValue::Bytes(bytes) => {
            let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                TransactionError::malformed(format!("{field} column is not 32 bytes"))
            })?;
            Ok(SolisPublicKey::from_bytes(bytes))
        }
        SqlValue::Text(s) => SolisPublicKey::from_hex(s)
            .map_err(|_| TransactionError::malformed(format!("{field} column is not a key"))),
        _ => Err(TransactionError::malformed(format!(
            "{field} column has the wrong type"
        ))),
    }
}

fn read_signature(field: &str, value: &SqlValue) -> Result<SolisSignature, TransactionError> {
    match value {
        SqlValue::Bytes(bytes) => {
            let bytes: [u8; 64] = bytes.as_slice().try_into().map_err(|_| {
                TransactionError::malformed(format!("{field} column is not 64 bytes"))
            })?;
            Ok(SolisSignature::from_bytes(bytes))
        }
        SqlValue::Text(s) => SolisSignature::from_hex(s).map_err(|_| {
            TransactionError::malformed(format!("{field} column is not a signature"))
        }),
        _ => Err(TransactionError::malformed(format!(
            "{field} column has the wrong type"
        ))),
    }
}

fn read_u64(field: &str, value: &SqlValue) -> Result<u64, TransactionError> {
    value
        .as_u64()
        .ok_or_else(|| TransactionError::malformed(format!("{field} column is not numeric")))
}

/// A non-null column, or `None`.
fn present<'r>(row: &'r Row, field: &str) -> Option<&'r SqlValue> {
    row.get(field).filter(|v| !v.is_null())
}

/// Materializes a transaction from a ledger row.
///
/// Returns `None` when the row carries no transaction id — joined queries
/// produce such rows for blocks without transactions. The asset is extended
/// from the handler's own columns.
pub fn db_read(ctx: &ChainContext, row: &Row) -> Result<Option<Transaction>, TransactionError> {
    let Some(id) = present(row, "id").and_then(SqlValue::as_text) else {
        return Ok(None);
    };

    let tx_type_raw = read_u64(
        "type",
        present(row, "type").ok_or_else(|| TransactionError::malformed("missing type column"))?,
    )?;
    let tx_type = u8::try_from(tx_type_raw)
        .map_err(|_| TransactionError::malformed("type column exceeds the u8 range"))?;
    let handler = ctx.handler(tx_type)?;

    let timestamp_raw = read_u64(
        "timestamp",
        present(row, "timestamp")
            .ok_or_else(|| TransactionError::malformed("missing timestamp column"))?,
    )?;
    let timestamp = i32::try_from(timestamp_raw)
        .map_err(|_| TransactionError::malformed("timestamp column exceeds the i32 range"))?;

    let sender_public_key = read_public_key(
        "senderPublicKey",
        present(row, "senderPublicKey")
            .ok_or_else(|| TransactionError::malformed("missing senderPublicKey column"))?,
    )?;

    let mut trs = Transaction::unsigned(tx_type, timestamp, sender_public_key);
    trs.id = Some(id.to_string());

    if let Some(v) = present(row, "blockId").and_then(SqlValue::as_text) {
        trs.block_id = Some(v.to_string());
    }
    if let Some(v) = present(row, "height") {
        trs.height = Some(read_u64("height", v)?);
    }
    if let Some(v) = present(row, "requesterPublicKey") {
        trs.requester_public_key = Some(read_public_key("requesterPublicKey", v)?);
    }
    if let Some(v) = present(row, "senderId").and_then(SqlValue::as_text) {
        trs.sender_id = Some(v.to_string());
    }
    if let Some(v) = present(row, "recipientId").and_then(SqlValue::as_text) {
        trs.recipient_id = Some(v.to_string());
    }
    if let Some(v) = present(row, "amount") {
        trs.amount = read_u64("amount", v)?;
    }
    if let Some(v) = present(row, "fee") {
        trs.fee = read_u64("fee", v)?;
    }
    if let Some(v) = present(row, "signature") {
        trs.signature = Some(read_signature("signature", v)?);
    }
    if let Some(v) = present(row, "signSignature") {
        trs.sign_signature = Some(read_signature("signSignature", v)?);
    }
    if let Some(joined) = present(row, "signatures").and_then(SqlValue::as_text) {
        if !joined.is_empty() {
            let mut signatures = Vec::new();
            for part in joined.split(',') {
                signatures.push(SolisSignature::from_hex(part).map_err(|_| {
                    TransactionError::malformed("signatures column holds a bad entry")
                })?);
            }
            trs.signatures = Some(signatures);
        }
    }
    if let Some(v) = present(row, "confirmations") {
        trs.confirmations = Some(read_u64("confirmations", v)?);
    }

    if let Some(asset) = handler.db_read(row)? {
        trs.asset = asset;
    }

    Ok(Some(trs))
}

/// Post-persistence hook: delegates to the handler, a no-op by default.
pub async fn after_save(ctx: &ChainContext, trs: &Transaction) -> Result<(), TransactionError> {
    ctx.handler(trs.tx_type)?.after_save(trs).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
