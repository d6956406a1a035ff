//! # Hashing Utilities
//!
//! SHA-256 is the only hash function in the Solis consensus path: it feeds
//! the transaction id derivation, the signing pre-image, and the address
//! derivation. One function, used everywhere, with no negotiation — a second
//! hash function in a consensus codebase is a fork waiting for a trigger.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data as a fixed-size array.
///
/// This is the form the consensus code wants: the id derivation reads the
/// first eight bytes by index and the signature engine signs the whole
/// 32-byte digest.
///
/// # Example
///
/// ```
/// use solis_protocol::crypto::sha256_array;
///
/// let digest = sha256_array(b"solis");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the SHA-256 hash as a `Vec<u8>`.
///
/// For callers that feed the digest into APIs wanting owned, growable data.
/// Everything consensus-critical uses [`sha256_array`].
pub fn sha256(data: &[u8]) -> Vec<u8> {
    sha256_array(data).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // FIPS 180-2 test vector for "abc".
        let digest = sha256_array(b"abc");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_empty_input() {
        let digest = sha256_array(b"");
        assert_eq!(
            hex::encode(digest),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn vec_and_array_agree() {
        let data = b"the forging delegate of slot 42";
        assert_eq!(sha256(data), sha256_array(data).to_vec());
    }
}
