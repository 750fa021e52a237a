//! 128-bit symmetric keys: generation, text export/import

use ft_core::CryptoError;
use rand::RngCore;
use zeroize::Zeroize;

use crate::KEY_SIZE;

/// Length of an exported key: 16 bytes as unpadded URL-safe base64.
pub const KEY_TEXT_LEN: usize = 22;

/// 128-bit AES key material. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Portable text form: unpadded URL-safe base64 (the JWK `k` encoding).
    pub fn export_text(&self) -> String {
        ft_codec::encode_url_safe(&self.bytes)
    }

    /// Parse the output of [`SymmetricKey::export_text`].
    pub fn import_text(text: &str) -> Result<Self, CryptoError> {
        let text = text.trim();
        if text.len() != KEY_TEXT_LEN {
            return Err(CryptoError::BadKeyFormat(format!(
                "expected {KEY_TEXT_LEN} characters, got {}",
                text.len()
            )));
        }
        let mut decoded = ft_codec::decode_url_safe(text)
            .map_err(|e| CryptoError::BadKeyFormat(e.to_string()))?;
        if decoded.len() != KEY_SIZE {
            decoded.zeroize();
            return Err(CryptoError::BadKeyFormat(format!(
                "decoded key has {} bytes (expected {KEY_SIZE})",
                decoded.len()
            )));
        }
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self::from_bytes(bytes))
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A key that has not encrypted anything yet.
///
/// Not `Clone`. [`FreshKey::seal`] consumes it and returns the now-used
/// [`SymmetricKey`], so a freshly issued key reaches exactly one first
/// encryption.
pub struct FreshKey(SymmetricKey);

impl FreshKey {
    pub fn export_text(&self) -> String {
        self.0.export_text()
    }

    /// Encrypt `plaintext` as this key's first use.
    pub fn seal(self, plaintext: &[u8]) -> Result<(Vec<u8>, SymmetricKey), CryptoError> {
        let ciphertext = crate::cipher::encrypt(&self.0, plaintext)?;
        Ok((ciphertext, self.0))
    }
}

impl std::fmt::Debug for FreshKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FreshKey").field(&self.0).finish()
    }
}

/// Generate a fresh random 128-bit key.
pub fn generate() -> FreshKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    FreshKey(SymmetricKey::from_bytes(bytes))
}
