//! # Transaction Error Taxonomy
//!
//! Every failure the transaction pipeline can report, as one stable enum.
//! Verification failures carry enough context to debug a rejection without
//! re-running the pipeline; store and ledger failures wrap their source.
//!
//! The split between fail-fast and completion-style reporting is a calling
//! convention, not an error-type distinction: shape errors (`get_bytes`,
//! id derivation, normalization, `db_save`) propagate with `?` from sync
//! functions, while the async pipeline operations (`process`, `verify`,
//! `apply*`, `undo*`) resolve exactly once with a `Result` carrying the same
//! taxonomy.

use thiserror::Error;

use crate::account::StoreError;
use crate::storage::LedgerError;

/// Errors reported by the transaction core.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The `type` tag has no registered handler.
    #[error("unknown transaction type {0}")]
    UnknownType(u8),

    /// No sender account was supplied for an operation that requires one.
    #[error("missing sender account")]
    MissingSender,

    /// The transaction's sender public key does not match the account's
    /// registered key (and the transaction is not grandfathered).
    #[error("invalid sender public key for account {address}")]
    InvalidSenderPublicKey { address: String },

    /// The transaction's sender address does not match the sender account.
    #[error("invalid sender address: expected {expected}, got {actual}")]
    InvalidSenderAddress { expected: String, actual: String },

    /// The requester public key is not a member of the sender's
    /// multisignature group.
    #[error("requester public key is not in the sender's multisignature group")]
    InvalidRequesterPublicKey,

    /// The primary signature failed verification.
    #[error("failed to verify signature")]
    FailedSignature,

    /// The second signature is required and missing, present and
    /// unregistered, or cryptographically invalid.
    #[error("failed to verify second signature: {0}")]
    FailedSecondSignature(&'static str),

    /// The multisignature list contains a duplicate entry.
    #[error("encountered duplicate signature in transaction")]
    DuplicateSignature,

    /// A multisignature did not verify against any eligible co-signer key.
    #[error("failed to verify multisignature")]
    FailedMultisignature,

    /// The submitted fee does not equal the handler-computed fee.
    #[error("invalid transaction fee: expected {expected}, got {actual}")]
    InvalidFee { expected: u64, actual: u64 },

    /// The amount is outside `[0, TOTAL_SUPPLY]` or `amount + fee` is not
    /// representable.
    #[error("invalid transaction amount")]
    InvalidAmount,

    /// The timestamp resolves to a slot later than the current one.
    #[error("invalid transaction timestamp: slot is in the future")]
    InvalidTimestamp,

    /// The transaction failed shape validation or normalization.
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// The sender cannot cover `amount + fee`.
    #[error("insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u64, required: u64 },

    /// The transaction is not ready to be applied (multisignature threshold
    /// not yet met).
    #[error("transaction is not ready")]
    NotReady,

    /// A transaction with this id is already confirmed in the ledger.
    #[error("transaction {0} is already confirmed")]
    AlreadyConfirmed(String),

    /// The type handler failed to encode its asset bytes.
    #[error("failed to encode asset bytes: {0}")]
    AssetEncodeFailed(String),

    /// A type handler rejected or failed the transaction; the handler's
    /// error is carried verbatim.
    #[error("{0}")]
    Handler(String),

    /// The account store failed.
    #[error("account store error: {0}")]
    Store(#[from] StoreError),

    /// The transaction ledger failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl TransactionError {
    /// Convenience for handler implementations reporting a domain failure.
    pub fn handler(message: impl Into<String>) -> Self {
        TransactionError::Handler(message.into())
    }

    /// Convenience for shape-validation failures.
    pub fn malformed(message: impl Into<String>) -> Self {
        TransactionError::MalformedTransaction(message.into())
    }
}
