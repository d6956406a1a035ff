//! # Cryptographic Primitives for Solis
//!
//! Thin, type-safe wrappers around audited implementations:
//!
//! - **Ed25519** (`ed25519-dalek`) for every signature on the chain.
//! - **SHA-256** (`sha2`) for transaction ids, signing pre-images, and
//!   address derivation.
//!
//! Nothing here is novel, and that is the point. If you feel an urge to
//! optimize or replace any of this, go read about consensus forks caused by
//! one-byte hash differences and come back when the urge has passed.

pub mod hash;
pub mod keys;

pub use hash::{sha256, sha256_array};
pub use keys::{KeyError, SolisKeypair, SolisPublicKey, SolisSignature};
