//! Login-key identity proofs
//!
//! A proof is the base64 ciphertext of the username under the user's login
//! key. Verification re-derives it and compares; nothing besides the proof is
//! stored in the snapshot.

use constant_time_eq::constant_time_eq;
use ft_core::{ConversationSnapshot, CryptoError, IdentityError};

use crate::cipher;
use crate::keys::{FreshKey, SymmetricKey};

/// Derive the proof for `username` under `key`. Pure in `(key, username)`.
pub fn derive_proof(key: &SymmetricKey, username: &str) -> Result<String, CryptoError> {
    let ciphertext = cipher::encrypt(key, username.as_bytes())?;
    Ok(ft_codec::encode(&ciphertext))
}

/// Derive the proof for a newly minted login key.
pub fn issue_proof(key: FreshKey, username: &str) -> Result<(String, SymmetricKey), CryptoError> {
    let (ciphertext, key) = key.seal(username.as_bytes())?;
    Ok((ft_codec::encode(&ciphertext), key))
}

/// Whether `proof` is `username`'s proof under `key`.
pub fn verify(key: &SymmetricKey, username: &str, proof: &str) -> bool {
    match derive_proof(key, username) {
        Ok(expected) => constant_time_eq(expected.as_bytes(), proof.as_bytes()),
        Err(_) => false,
    }
}

/// Find the user whose proof verifies under `key`.
///
/// Records are tried in username order; the first match wins.
pub fn authenticate(snapshot: &ConversationSnapshot, key: &SymmetricKey) -> Result<String, IdentityError> {
    let found = snapshot
        .identity_records()
        .find(|record| verify(key, record.username, record.proof))
        .map(|record| record.username.to_string());

    match found {
        Some(username) => {
            tracing::info!(user = %username, "login key matched identity proof");
            Ok(username)
        }
        None => {
            tracing::debug!(candidates = snapshot.users.len(), "login key matched no proof");
            Err(IdentityError::NoMatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate;
    use crate::KEY_SIZE;

    fn snapshot_with(records: &[(&str, String)]) -> ConversationSnapshot {
        let mut s = ConversationSnapshot::default();
        for (name, proof) in records {
            s.register_user(name, 0, proof.clone()).unwrap();
        }
        s
    }

    #[test]
    fn test_proof_is_deterministic() {
        let key = SymmetricKey::from_bytes([4; KEY_SIZE]);
        assert_eq!(
            derive_proof(&key, "alice").unwrap(),
            derive_proof(&key, "alice").unwrap()
        );
        assert_ne!(
            derive_proof(&key, "alice").unwrap(),
            derive_proof(&key, "bob").unwrap()
        );
    }

    #[test]
    fn test_issue_matches_derive() {
        let (proof, key) = issue_proof(generate(), "alice").unwrap();
        assert_eq!(derive_proof(&key, "alice").unwrap(), proof);
        assert!(verify(&key, "alice", &proof));
    }

    #[test]
    fn test_proof_does_not_contain_username() {
        let (proof, _) = issue_proof(generate(), "alice").unwrap();
        assert!(!proof.contains("alice"));
        assert!(!proof.contains("YWxpY2"));
    }

    #[test]
    fn test_verify_wrong_key_or_name() {
        let (proof, key) = issue_proof(generate(), "alice").unwrap();
        let (_, other) = issue_proof(generate(), "alice").unwrap();

        assert!(!verify(&other, "alice", &proof));
        assert!(!verify(&key, "bob", &proof));
        assert!(!verify(&key, "alice", ""));
    }

    #[test]
    fn test_authenticate_finds_owner() {
        let (alice_proof, alice_key) = issue_proof(generate(), "alice").unwrap();
        let (bob_proof, bob_key) = issue_proof(generate(), "bob").unwrap();
        let s = snapshot_with(&[("alice", alice_proof), ("bob", bob_proof)]);

        assert_eq!(authenticate(&s, &alice_key).unwrap(), "alice");
        assert_eq!(authenticate(&s, &bob_key).unwrap(), "bob");
    }

    #[test]
    fn test_authenticate_no_match() {
        let (proof, _) = issue_proof(generate(), "alice").unwrap();
        let s = snapshot_with(&[("alice", proof)]);
        let (_, stranger) = issue_proof(generate(), "x").unwrap();

        assert_eq!(authenticate(&s, &stranger).unwrap_err(), IdentityError::NoMatch);
        assert_eq!(
            authenticate(&ConversationSnapshot::default(), &stranger).unwrap_err(),
            IdentityError::NoMatch
        );
    }
}
