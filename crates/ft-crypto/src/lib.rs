//! ft-crypto: key material, the capsule cipher, and identity proofs
//!
//! Cipher: AES-128-GCM with a fixed all-zero 96-bit nonce.
//!
//! ```text
//! FreshKey (128-bit, CSPRNG)
//!   ├── share key: first use seals a keyed capsule, then becomes the session key
//!   └── login key: seals the username once; re-deriving the proof is the
//!       same (key, plaintext) pair and so yields the same bytes
//! ```
//!
//! A zero nonce is only sound while a key never encrypts two different
//! plaintexts. `FreshKey` is consumed by its first encryption so new keys
//! cannot be handed to two encryptions by accident.

pub mod cipher;
pub mod identity;
pub mod keys;

pub use cipher::{decrypt, encrypt};
pub use identity::{authenticate, derive_proof, issue_proof, verify};
pub use keys::{generate, FreshKey, SymmetricKey};

/// Key size in bytes (128-bit)
pub const KEY_SIZE: usize = 16;

/// AES-GCM nonce size (96-bit)
pub const NONCE_SIZE: usize = 12;

/// GCM authentication tag size
pub const TAG_SIZE: usize = 16;
