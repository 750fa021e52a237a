//! Snapshot ⇄ ciphertext text
//!
//! Encode: snapshot → JSON → compress → encrypt → base64
//! Decode: base64 → decrypt → decompress → JSON → snapshot
//!
//! Decoding stops at the first failing stage and never yields a partial
//! snapshot.

use ft_codec::Compressor;
use ft_core::config::CodecConfig;
use ft_core::{CapsuleError, CapsuleResult, ConversationSnapshot, DecodeError};
use ft_crypto::{FreshKey, SymmetricKey};

use crate::fragment;

#[derive(Debug, Clone, Default)]
pub struct CapsuleCodec {
    compressor: Compressor,
}

impl CapsuleCodec {
    pub fn new(compressor: Compressor) -> Self {
        Self { compressor }
    }

    pub fn from_config(config: &CodecConfig) -> CapsuleResult<Self> {
        Ok(Self::new(Compressor::from_config(config)?))
    }

    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// Encrypt `snapshot` under an existing key; returns ciphertext text.
    pub fn encode_keyless(
        &self,
        snapshot: &ConversationSnapshot,
        key: &SymmetricKey,
    ) -> CapsuleResult<String> {
        let packed = self.pack(snapshot)?;
        let ciphertext = ft_crypto::encrypt(key, &packed)?;
        Ok(ft_codec::encode(&ciphertext))
    }

    /// Encrypt `snapshot` as the first use of `key` and append the key.
    ///
    /// Returns the keyed fragment and the key, which from here on is the
    /// session key for this conversation.
    pub fn encode_keyed(
        &self,
        snapshot: &ConversationSnapshot,
        key: FreshKey,
    ) -> CapsuleResult<(String, SymmetricKey)> {
        let packed = self.pack(snapshot)?;
        let (ciphertext, key) = key.seal(&packed)?;
        let fragment = fragment::join(&ft_codec::encode(&ciphertext), &key.export_text());
        tracing::debug!(fragment_len = fragment.len(), "encoded keyed capsule");
        Ok((fragment, key))
    }

    /// Recover a snapshot from ciphertext text.
    pub fn decode(
        &self,
        ciphertext_text: &str,
        key: &SymmetricKey,
    ) -> CapsuleResult<ConversationSnapshot> {
        let ciphertext = ft_codec::decode(ciphertext_text)?;
        let packed = ft_crypto::decrypt(key, &ciphertext)?;
        let json = self.compressor.decompress(&packed)?;
        let snapshot = ConversationSnapshot::from_json(&json)
            .map_err(|e| DecodeError::MalformedSnapshot(e.to_string()))?;
        tracing::debug!(
            users = snapshot.users.len(),
            posts = snapshot.posts.len(),
            "decoded capsule"
        );
        Ok(snapshot)
    }

    fn pack(&self, snapshot: &ConversationSnapshot) -> CapsuleResult<Vec<u8>> {
        let json = snapshot
            .to_json()
            .map_err(|e| CapsuleError::Serialize(e.to_string()))?;
        Ok(self.compressor.compress(&json)?)
    }
}
