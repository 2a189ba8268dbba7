//! Per-operation key derivation using PBKDF2-HMAC-SHA256

use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroize;

use super::secure_memory::{DerivedKey, MasterKey, DERIVED_KEY_LEN};
use crate::error::{Result, VaultError};

/// PBKDF2 iteration count. Part of the stored-data contract: changing it
/// makes every existing envelope undecryptable.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// Fill a fixed-size buffer from the OS random source
fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| VaultError::CryptoUnavailable(format!("OS random source: {}", e)))?;
    Ok(bytes)
}

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    random_bytes()
}

/// Generate a cryptographically secure random GCM nonce
pub fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    random_bytes()
}

/// Derive a 256-bit key from the master key and a salt
///
/// Deterministic for identical `(master_key, salt)`. Deliberately slow; the
/// result must not be cached across calls since every envelope carries its
/// own salt.
pub fn derive_key(master_key: &MasterKey, salt: &[u8; SALT_LEN]) -> DerivedKey {
    let mut key = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha256>(master_key.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    let derived = DerivedKey::new(key);
    key.zeroize();
    derived
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_salt() {
        let salt1 = generate_salt().unwrap();
        let salt2 = generate_salt().unwrap();

        assert_ne!(salt1, salt2);
    }

    #[test]
    fn test_generate_nonce() {
        let nonce1 = generate_nonce().unwrap();
        let nonce2 = generate_nonce().unwrap();

        assert_eq!(nonce1.len(), NONCE_LEN);
        assert_ne!(nonce1, nonce2);
    }

    #[test]
    fn test_derive_key_deterministic() {
        let master_key = MasterKey::from("test-password-123");
        let salt = generate_salt().unwrap();

        let key1 = derive_key(&master_key, &salt);
        let key2 = derive_key(&master_key, &salt);

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_passwords() {
        let salt = generate_salt().unwrap();

        let key1 = derive_key(&MasterKey::from("password1"), &salt);
        let key2 = derive_key(&MasterKey::from("password2"), &salt);

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_salts() {
        let master_key = MasterKey::from("test-password");

        let key1 = derive_key(&master_key, &generate_salt().unwrap());
        let key2 = derive_key(&master_key, &generate_salt().unwrap());

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_known_vector() {
        // Published PBKDF2-HMAC-SHA256 vector: P="password", S="salt", c=1, dkLen=32
        let mut out = [0u8; 32];
        pbkdf2_hmac::<Sha256>(b"password", b"salt", 1, &mut out);
        assert_eq!(
            hex::encode(out),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn test_derive_key_stored_format() {
        // Envelopes on disk depend on this exact derivation
        let key = derive_key(&MasterKey::from("correct-master-key"), &[1u8; SALT_LEN]);
        assert_eq!(
            hex::encode(key.as_bytes()),
            "2e7f2d6253dab0d751bf3f90adaa48b7cd49c531a793220400c04bdcae648044"
        );
    }
}
