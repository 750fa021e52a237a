//! Base64 transcoding
//!
//! Ciphertext uses the standard alphabet with padding; key material uses the
//! URL-safe alphabet without padding. Neither alphabet contains ':', which
//! keeps the keyed-fragment delimiter unambiguous.
//!
//! The standard alphabet's '+', '/' and '=' are not universally safe inside a
//! URL fragment. Links already in circulation depend on it, so it stays.
//!
//! Decoding is strict: when the final symbol before padding carries unused
//! low bits, they must be zero. Editing that symbol so only those bits change
//! fails here with `MalformedText` and never reaches the cipher.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use ft_core::DecodeError;

/// Encode bytes with the standard base64 alphabet (padded).
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard padded base64.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(text)
        .map_err(|e| DecodeError::MalformedText(e.to_string()))
}

/// Encode bytes with the URL-safe alphabet, no padding.
pub fn encode_url_safe(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe unpadded base64.
pub fn decode_url_safe(text: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| DecodeError::MalformedText(e.to_string()))
}
