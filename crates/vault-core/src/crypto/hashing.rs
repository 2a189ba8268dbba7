//! Master key verification hash

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::MasterKey;

/// Length of a hex-encoded SHA-256 digest
pub const MASTER_KEY_HASH_LEN: usize = 64;

/// SHA-256 of the master key's UTF-8 bytes, lowercase hex
///
/// Only ever compared for equality; it carries no salt and is never used as
/// key material.
pub fn hash_master_key(master_key: &MasterKey) -> String {
    hex::encode(Sha256::digest(master_key.as_bytes()))
}

/// Compare a candidate master key against a stored hash in constant time
pub fn verify_master_key(master_key: &MasterKey, stored_hash: &str) -> bool {
    let candidate = hash_master_key(master_key);
    let candidate_bytes = candidate.as_bytes();
    let stored_bytes = stored_hash.as_bytes();

    // Length is public (always 64 for well-formed hashes)
    if candidate_bytes.len() != stored_bytes.len() {
        return false;
    }
    candidate_bytes.ct_eq(stored_bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{derive_key, generate_salt};

    #[test]
    fn test_hash_known_value() {
        // sha256("hunter2")
        assert_eq!(
            hash_master_key(&MasterKey::from("hunter2")),
            "f52fbd32b2b3b86ff88ef6c490628285f482af15ddcb29541f94bcf526a3f6c7"
        );
    }

    #[test]
    fn test_hash_format() {
        let hash = hash_master_key(&MasterKey::from("correct-master-key"));

        assert_eq!(hash.len(), MASTER_KEY_HASH_LEN);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_deterministic_and_distinct() {
        let a = MasterKey::from("key-one");
        let b = MasterKey::from("key-two");

        assert_eq!(hash_master_key(&a), hash_master_key(&a));
        assert_ne!(hash_master_key(&a), hash_master_key(&b));
    }

    #[test]
    fn test_hash_is_not_a_derived_key() {
        let master_key = MasterKey::from("correct-master-key");
        let hash = hash_master_key(&master_key);
        let derived = derive_key(&master_key, &generate_salt().unwrap());

        assert_ne!(hash, hex::encode(derived.as_bytes()));
    }

    #[test]
    fn test_verify_master_key() {
        let stored = hash_master_key(&MasterKey::from("correct-master-key"));

        assert!(verify_master_key(&MasterKey::from("correct-master-key"), &stored));
        assert!(!verify_master_key(&MasterKey::from("wrong-master-key"), &stored));
        assert!(!verify_master_key(&MasterKey::from("correct-master-key"), "abc"));
        assert!(!verify_master_key(&MasterKey::from("correct-master-key"), ""));
    }
}
