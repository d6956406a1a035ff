//! # Transaction Signing & Signature Verification
//!
//! Four operations, distinguished only by which canonical byte form they
//! cover:
//!
//! - [`sign`] — primary signature over the bytes as they stand (at signing
//!   time no signature fields are present yet, so this is the unsigned form).
//! - [`multisign`] — a co-signer's approval, over the bytes with both
//!   signature fields skipped.
//! - [`verify_primary`] — checks a signature over the both-skipped form.
//! - [`verify_secondary`] — checks the second signature over the form with
//!   only the second skipped; the second signature covers the primary one.
//!
//! In every case the Ed25519 message is the 32-byte SHA-256 digest of the
//! selected form, not the raw bytes. A missing signature verifies to
//! `false`; only byte-encoding failures are errors.

use crate::crypto::{SolisKeypair, SolisPublicKey, SolisSignature};

use super::codec::canonical_hash;
use super::error::TransactionError;
use super::handler::TypeRegistry;
use super::types::Transaction;

/// Produce the primary signature for a transaction.
pub fn sign(
    registry: &TypeRegistry,
    trs: &Transaction,
    keypair: &SolisKeypair,
) -> Result<SolisSignature, TransactionError> {
    let hash = canonical_hash(registry, trs, false, false)?;
    Ok(keypair.sign(&hash))
}

/// Produce a multisignature co-signer approval for a transaction.
pub fn multisign(
    registry: &TypeRegistry,
    trs: &Transaction,
    keypair: &SolisKeypair,
) -> Result<SolisSignature, TransactionError> {
    let hash = canonical_hash(registry, trs, true, true)?;
    Ok(keypair.sign(&hash))
}

/// Verify a primary (or co-signer) signature against a public key.
pub fn verify_primary(
    registry: &TypeRegistry,
    trs: &Transaction,
    public_key: &SolisPublicKey,
    signature: Option<&SolisSignature>,
) -> Result<bool, TransactionError> {
    let Some(signature) = signature else {
        return Ok(false);
    };
    let hash = canonical_hash(registry, trs, true, true)?;
    Ok(public_key.verify(&hash, signature))
}

/// Verify a second-factor signature against a public key.
pub fn verify_secondary(
    registry: &TypeRegistry,
    trs: &Transaction,
    public_key: &SolisPublicKey,
    signature: Option<&SolisSignature>,
) -> Result<bool, TransactionError> {
    let Some(signature) = signature else {
        return Ok(false);
    };
    let hash = canonical_hash(registry, trs, false, true)?;
    Ok(public_key.verify(&hash, signature))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
