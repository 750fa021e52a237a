//! The four calls the presentation layer makes into the core.

use ft_core::{CapsuleResult, ConversationSnapshot, ProtocolError};
use ft_crypto::SymmetricKey;

use crate::codec::CapsuleCodec;
use crate::fragment::parse_fragment;

/// Encode `snapshot` as a keyed fragment under a newly minted key.
pub fn produce_share_fragment(
    codec: &CapsuleCodec,
    snapshot: &ConversationSnapshot,
) -> CapsuleResult<String> {
    let (fragment, _key) = codec.encode_keyed(snapshot, ft_crypto::generate())?;
    tracing::info!(
        posts = snapshot.posts.len(),
        fragment_len = fragment.len(),
        "produced share fragment"
    );
    Ok(fragment)
}

/// Open a keyed fragment; returns the snapshot and the key to keep for the
/// rest of the session.
///
/// Keyless fragments are rejected: they cannot have come from a share.
pub fn open_fragment(
    codec: &CapsuleCodec,
    fragment: &str,
) -> CapsuleResult<(ConversationSnapshot, SymmetricKey)> {
    let parsed = parse_fragment(fragment);
    let key_text = parsed.key.ok_or(ProtocolError::MissingEmbeddedKey)?;
    let key = SymmetricKey::import_text(key_text)?;
    let snapshot = codec.decode(parsed.ciphertext, &key)?;
    Ok((snapshot, key))
}

/// Encode `snapshot` as a keyless fragment under the session key.
pub fn save_snapshot(
    codec: &CapsuleCodec,
    snapshot: &ConversationSnapshot,
    session_key: &SymmetricKey,
) -> CapsuleResult<String> {
    codec.encode_keyless(snapshot, session_key)
}

/// Identify the user whose proof verifies under `candidate_key`.
pub fn authenticate(
    snapshot: &ConversationSnapshot,
    candidate_key: &SymmetricKey,
) -> CapsuleResult<String> {
    Ok(ft_crypto::authenticate(snapshot, candidate_key)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ft_core::{CapsuleError, CryptoError, IdentityError};

    #[test]
    fn test_share_then_open() {
        let codec = CapsuleCodec::default();
        let mut s = ConversationSnapshot::default();
        s.register_user("root", 1, "x".into()).unwrap();

        let fragment = produce_share_fragment(&codec, &s).unwrap();
        let (opened, key) = open_fragment(&codec, &fragment).unwrap();
        assert_eq!(opened, s);
        assert!(fragment.ends_with(&key.export_text()));
    }

    #[test]
    fn test_each_share_mints_a_new_key() {
        let codec = CapsuleCodec::default();
        let s = ConversationSnapshot::default();
        let a = produce_share_fragment(&codec, &s).unwrap();
        let b = produce_share_fragment(&codec, &s).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_open_rejects_keyless() {
        let codec = CapsuleCodec::default();
        let fragment = produce_share_fragment(&codec, &ConversationSnapshot::default()).unwrap();
        let keyless = parse_fragment(&fragment).ciphertext;
        assert_eq!(
            open_fragment(&codec, keyless).unwrap_err(),
            CapsuleError::Protocol(ProtocolError::MissingEmbeddedKey)
        );
    }

    #[test]
    fn test_open_rejects_bad_key_text() {
        let codec = CapsuleCodec::default();
        assert!(matches!(
            open_fragment(&codec, "aGVsbG8=:nope").unwrap_err(),
            CapsuleError::Crypto(CryptoError::BadKeyFormat(_))
        ));
    }

    #[test]
    fn test_authenticate_maps_no_match() {
        let key = SymmetricKey::from_bytes([1; ft_crypto::KEY_SIZE]);
        assert_eq!(
            authenticate(&ConversationSnapshot::default(), &key).unwrap_err(),
            CapsuleError::Identity(IdentityError::NoMatch)
        );
    }
}
