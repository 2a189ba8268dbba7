//! Cryptographic core for per-field record encryption
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 key derivation, one fresh salt per envelope
//! - AES-256-GCM envelopes that carry their own salt and nonce
//! - SHA-256 master key hashing for login verification
//! - Secret holders that zeroize on drop
//!
//! Everything here is a pure function of its inputs and safe to call from
//! many threads at once.

mod envelope;
mod hashing;
mod key_derivation;
mod secure_memory;

pub use envelope::{decrypt, encrypt, Envelope, EnvelopeParts, MIN_ENVELOPE_LEN, TAG_LEN};
pub use hashing::{hash_master_key, verify_master_key, MASTER_KEY_HASH_LEN};
pub use key_derivation::{
    derive_key, generate_nonce, generate_salt, NONCE_LEN, PBKDF2_ITERATIONS, SALT_LEN,
};
pub use secure_memory::{DerivedKey, MasterKey, DERIVED_KEY_LEN};
