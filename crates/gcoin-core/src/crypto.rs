// crates/gcoin-core/src/crypto.rs
//
// Hashing helpers used to derive deterministic 20-byte addresses for
// accounts, asset cards, and invoice escrows.

use sha2::{Digest, Sha256};

/// Derive a 20-byte address from a domain tag and arbitrary seed bytes.
///
/// The address is the trailing 20 bytes of SHA-256(domain || 0x00 || seed).
/// Distinct domains never collide for the same seed.
pub fn derive_address(domain: &str, seed: &[u8]) -> [u8; 20] {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    hasher.update([0u8]);
    hasher.update(seed);
    let digest = hasher.finalize();
    let mut output = [0u8; 20];
    output.copy_from_slice(&digest[12..]);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_address_domain_separation() {
        let a = derive_address("account", b"alice");
        let b = derive_address("invoice", b"alice");
        assert_ne!(a, b);
        assert_eq!(a, derive_address("account", b"alice"));
    }
}
