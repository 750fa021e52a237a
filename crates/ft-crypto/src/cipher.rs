//! AES-128-GCM under a fixed zero nonce
//!
//! Ciphertext format (binary):
//! ```text
//! [N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! No nonce is stored: it is always twelve zero bytes. The same key and
//! plaintext therefore always produce the same ciphertext, which identity
//! proofs rely on.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Nonce,
};
use ft_core::CryptoError;

use crate::keys::SymmetricKey;
use crate::{NONCE_SIZE, TAG_SIZE};

const ZERO_NONCE: [u8; NONCE_SIZE] = [0u8; NONCE_SIZE];

/// Encrypt `plaintext` under `key`.
///
/// Returns `[ciphertext][16-byte tag]`.
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes128Gcm::new(key.as_bytes().into());
    cipher
        .encrypt(Nonce::from_slice(&ZERO_NONCE), plaintext)
        .map_err(|e| CryptoError::Encrypt(e.to_string()))
}

/// Decrypt and authenticate the output of [`encrypt`].
pub fn decrypt(key: &SymmetricKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::AuthenticationFailed);
    }
    let cipher = Aes128Gcm::new(key.as_bytes().into());
    cipher
        .decrypt(Nonce::from_slice(&ZERO_NONCE), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}
