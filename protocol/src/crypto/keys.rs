//! # Key Management
//!
//! Ed25519 keypair, public key, and signature types for Solis identities.
//!
//! Every account traces back to one of these keypairs: the address is derived
//! from the public key, the primary signature is produced by the account key,
//! and the optional second signature by a separately registered second key.
//!
//! ## Why Ed25519?
//!
//! - Deterministic signatures (no k-value footguns like ECDSA).
//! - 128-bit security level in 32+32 bytes. Compact and sufficient.
//! - Fast batch verification — a full block is 25 signature checks per
//!   second-signature-heavy worst case, and validators do this every slot.
//!
//! ## Serialization
//!
//! [`SolisPublicKey`] and [`SolisSignature`] serialize as lowercase hex
//! strings, because that is their wire and database form. [`SolisKeypair`]
//! deliberately implements neither `Serialize` nor `Deserialize`: exporting
//! a private key must be an explicit `to_seed_bytes()` call, never a side
//! effect of serializing a struct that happens to contain one.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Errors that can occur during key and signature decoding.
///
/// Deliberately vague about the *why* — error messages that describe key
/// material in detail have a way of ending up in logs.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid public key: expected {PUBLIC_KEY_LENGTH} bytes of hex")]
    InvalidPublicKey,

    #[error("invalid signature: expected {SIGNATURE_LENGTH} bytes of hex")]
    InvalidSignature,

    #[error("invalid seed: expected 32 bytes of hex")]
    InvalidSeed,
}

// ---------------------------------------------------------------------------
// SolisKeypair
// ---------------------------------------------------------------------------

/// A Solis account keypair wrapping an Ed25519 signing key.
///
/// The signing key is the whole identity — the address, the vote weight,
/// the balance — so it never leaves this struct except through
/// [`SolisKeypair::to_seed_bytes`].
#[derive(Clone)]
pub struct SolisKeypair {
    signing_key: SigningKey,
}

impl SolisKeypair {
    /// Generate a fresh keypair from the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    ///
    /// Used for passphrase-derived accounts and for test identities that
    /// must be stable across runs.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Construct a keypair from a hex-encoded 32-byte seed.
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(seed_hex).map_err(|_| KeyError::InvalidSeed)?;
        let seed: [u8; 32] = bytes.try_into().map_err(|_| KeyError::InvalidSeed)?;
        Ok(Self::from_seed(seed))
    }

    /// The public half of this keypair.
    pub fn public_key(&self) -> SolisPublicKey {
        SolisPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message, returning a 64-byte Ed25519 signature.
    ///
    /// The transaction pipeline always passes a 32-byte SHA-256 digest here,
    /// never the raw canonical bytes.
    pub fn sign(&self, message: &[u8]) -> SolisSignature {
        SolisSignature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }

    /// Export the 32-byte seed. Handle with the care the name implies.
    pub fn to_seed_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl fmt::Debug for SolisKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The private half stays private, even in debug output.
        f.debug_struct("SolisKeypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// SolisPublicKey
// ---------------------------------------------------------------------------

/// The public half of a Solis identity, safe to put on the wire.
///
/// Exactly 32 bytes. The hex form is always lowercase — the schema layer
/// rejects uppercase input so that string comparison of keys is exact.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolisPublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

impl SolisPublicKey {
    /// Wrap raw public key bytes.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Decode a public key from its 64-character hex form.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let decoded = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            decoded.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// The raw 32 bytes, as the canonical encoding wants them.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Verify an Ed25519 signature over `message` against this key.
    ///
    /// Returns `false` for any failure — an off-curve key, a malformed
    /// signature, a mismatch. Verification never raises.
    pub fn verify(&self, message: &[u8], signature: &SolisSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(&signature.bytes);
        verifying_key.verify(message, &sig).is_ok()
    }
}

impl fmt::Debug for SolisPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SolisPublicKey({})", self.to_hex())
    }
}

impl fmt::Display for SolisPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for SolisPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SolisPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SolisSignature
// ---------------------------------------------------------------------------

/// An Ed25519 signature. Exactly 64 bytes, hex-encoded on the wire.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SolisSignature {
    bytes: [u8; SIGNATURE_LENGTH],
}

impl SolisSignature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Decode a signature from its 128-character hex form.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let decoded = hex::decode(s).map_err(|_| KeyError::InvalidSignature)?;
        let bytes: [u8; SIGNATURE_LENGTH] =
            decoded.try_into().map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self { bytes })
    }

    /// The raw 64 bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.bytes
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Debug for SolisSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SolisSignature({})", self.to_hex())
    }
}

impl Serialize for SolisSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SolisSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        let kp = SolisKeypair::generate();
        let msg = b"transfer 100 lux to 58191285901858109S";
        let sig = kp.sign(msg);
        assert!(kp.public_key().verify(msg, &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp = SolisKeypair::generate();
        let other = SolisKeypair::generate();
        let sig = kp.sign(b"hello");
        assert!(!other.public_key().verify(b"hello", &sig));
    }

    #[test]
    fn tampered_message_fails_verification() {
        let kp = SolisKeypair::generate();
        let sig = kp.sign(b"amount=100");
        assert!(!kp.public_key().verify(b"amount=101", &sig));
    }

    #[test]
    fn from_seed_is_deterministic() {
        let kp1 = SolisKeypair::from_seed([7u8; 32]);
        let kp2 = SolisKeypair::from_seed([7u8; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.sign(b"x"), kp2.sign(b"x"));
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let pk = SolisKeypair::generate().public_key();
        let recovered = SolisPublicKey::from_hex(&pk.to_hex()).unwrap();
        assert_eq!(pk, recovered);
        assert_eq!(pk.to_hex().len(), 64);
    }

    #[test]
    fn signature_hex_roundtrip() {
        let sig = SolisKeypair::generate().sign(b"payload");
        let recovered = SolisSignature::from_hex(&sig.to_hex()).unwrap();
        assert_eq!(sig, recovered);
        assert_eq!(sig.to_hex().len(), 128);
    }

    #[test]
    fn rejects_short_hex() {
        assert!(SolisPublicKey::from_hex("abcd").is_err());
        assert!(SolisSignature::from_hex("abcd").is_err());
    }

    #[test]
    fn serde_uses_hex_strings() {
        let pk = SolisKeypair::from_seed([1u8; 32]).public_key();
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", pk.to_hex()));
        let back: SolisPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(pk, back);
    }

    #[test]
    fn debug_output_hides_seed() {
        let kp = SolisKeypair::from_seed([9u8; 32]);
        let rendered = format!("{:?}", kp);
        assert!(!rendered.contains(&hex::encode([9u8; 32])));
    }
}
