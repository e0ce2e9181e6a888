// src/utils/crypto.rs
//! Hashing utilities shared by the ledger, the proof capability and the wallet.
//!
//! Uses SHA-256 (via `ring`) for all digests.

use ring::digest::{digest, SHA256};

/// Computes a SHA-256 hash of the input data.
///
/// # Arguments
/// * `data` - Binary data to hash (as bytes slice)
///
/// # Returns
/// Fixed-size 32-byte array (`[u8; 32]`) containing the hash.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(digest(&SHA256, data).as_ref());
    out
}

/// Hashes `data` and returns the digest as lowercase hex.
///
/// Used for transaction ids, request digests and registry content hashes.
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(hash_data(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            hash_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_hex_is_lowercase_and_padded() {
        let digest = hash_hex(b"");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
        assert_eq!(hex::decode(&digest).unwrap(), hash_data(b"").to_vec());
    }
}
