//! One open conversation: its snapshot, its session key, and the load state
//! machine.
//!
//! ```text
//! Empty ──(no fragment)──────────────▶ Default
//! Empty ──(keyed fragment)──decode───▶ Opened   (key kept, keyless fragment installed)
//! Opened/Updated ──(keyless)──decode─▶ Updated  (with the session key)
//! any ──(failure)────────────────────▶ FallbackDefault
//! ```
//!
//! The session key is write-once. Every method takes `&mut self`, so a decode
//! finishes before a later save can read the snapshot.

use ft_core::{CapsuleError, CapsuleResult, ConversationSnapshot, ProtocolError};
use ft_crypto::SymmetricKey;

use crate::codec::CapsuleCodec;
use crate::fragment::parse_fragment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Empty,
    Default,
    Opened,
    Updated,
    FallbackDefault,
}

#[derive(Debug)]
pub struct Session {
    codec: CapsuleCodec,
    key: Option<SymmetricKey>,
    state: LoadState,
    snapshot: ConversationSnapshot,
    default_snapshot: ConversationSnapshot,
    /// Current shareable (keyless) fragment
    fragment: Option<String>,
}

impl Session {
    /// A session with no key and nothing loaded.
    pub fn new(codec: CapsuleCodec, default_snapshot: ConversationSnapshot) -> Self {
        Self {
            codec,
            key: None,
            state: LoadState::Empty,
            snapshot: ConversationSnapshot::default(),
            default_snapshot,
            fragment: None,
        }
    }

    /// Continue a session whose key was obtained earlier (e.g. from a
    /// previous open). Keyless fragments can be applied immediately.
    pub fn with_key(
        codec: CapsuleCodec,
        default_snapshot: ConversationSnapshot,
        key: SymmetricKey,
    ) -> Self {
        let mut session = Self::new(codec, default_snapshot);
        session.key = Some(key);
        session
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn snapshot(&self) -> &ConversationSnapshot {
        &self.snapshot
    }

    pub fn snapshot_mut(&mut self) -> &mut ConversationSnapshot {
        &mut self.snapshot
    }

    pub fn session_key(&self) -> Option<&SymmetricKey> {
        self.key.as_ref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Apply the fragment currently in the URL (`None` if there is none).
    ///
    /// On failure the session falls back to the default snapshot and the
    /// error is returned; the session stays usable.
    pub fn load(&mut self, fragment: Option<&str>) -> CapsuleResult<LoadState> {
        let fragment = fragment
            .map(|f| f.strip_prefix('#').unwrap_or(f))
            .filter(|f| !f.is_empty());

        let result = match fragment {
            None => {
                if self.state == LoadState::Empty {
                    self.snapshot = self.default_snapshot.clone();
                    self.state = LoadState::Default;
                    tracing::info!("no fragment, starting from default snapshot");
                }
                Ok(self.state)
            }
            Some(fragment) => self.apply(fragment),
        };

        if let Err(err) = &result {
            self.fall_back(err);
        }
        result
    }

    /// Encode the current snapshot as a keyless fragment and install it.
    ///
    /// A session that never opened a fragment mints its key here, once.
    pub fn save(&mut self) -> CapsuleResult<String> {
        let fragment = match &self.key {
            Some(key) => self.codec.encode_keyless(&self.snapshot, key)?,
            None => {
                let (keyed, key) = self.codec.encode_keyed(&self.snapshot, ft_crypto::generate())?;
                let keyless = parse_fragment(&keyed).ciphertext.to_string();
                self.key = Some(key);
                keyless
            }
        };
        self.fragment = Some(fragment.clone());
        Ok(fragment)
    }

    /// A keyed fragment of the current snapshot under a new key, for sharing.
    /// The session key is neither used nor exposed.
    pub fn share(&self) -> CapsuleResult<String> {
        crate::api::produce_share_fragment(&self.codec, &self.snapshot)
    }

    pub fn authenticate(&self, candidate_key: &SymmetricKey) -> CapsuleResult<String> {
        crate::api::authenticate(&self.snapshot, candidate_key)
    }

    fn apply(&mut self, fragment: &str) -> CapsuleResult<LoadState> {
        let parsed = parse_fragment(fragment);
        match (parsed.key, &self.key) {
            (Some(_), Some(_)) => Err(ProtocolError::SessionKeyAlreadyBound.into()),
            (Some(_), None) => {
                let (snapshot, key) = crate::api::open_fragment(&self.codec, fragment)?;
                self.snapshot = snapshot;
                self.key = Some(key);
                // The ciphertext part is exactly the keyless encoding of what
                // was just opened; reuse it rather than encrypting again.
                self.fragment = Some(parsed.ciphertext.to_string());
                self.state = LoadState::Opened;
                tracing::info!(
                    users = self.snapshot.users.len(),
                    posts = self.snapshot.posts.len(),
                    "opened keyed fragment"
                );
                Ok(self.state)
            }
            (None, Some(key)) => {
                let snapshot = self.codec.decode(parsed.ciphertext, key)?;
                self.snapshot = snapshot;
                self.fragment = Some(parsed.ciphertext.to_string());
                self.state = LoadState::Updated;
                tracing::info!(posts = self.snapshot.posts.len(), "applied keyless fragment");
                Ok(self.state)
            }
            (None, None) if self.state == LoadState::Empty => {
                Err(ProtocolError::MissingEmbeddedKey.into())
            }
            (None, None) => Err(ProtocolError::NoSessionKey.into()),
        }
    }

    fn fall_back(&mut self, err: &CapsuleError) {
        tracing::warn!(error = %err, "fragment rejected, falling back to default snapshot");
        self.snapshot = self.default_snapshot.clone();
        self.fragment = None;
        self.state = LoadState::FallbackDefault;
    }
}
