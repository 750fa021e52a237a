//! Fragment framing: splitting and joining `ciphertext:key`

/// Separates ciphertext text from key text in a keyed fragment.
pub const DELIMITER: char = ':';

/// A fragment split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFragment<'a> {
    pub ciphertext: &'a str,
    /// Present only for keyed fragments
    pub key: Option<&'a str>,
}

/// Split a fragment on the last delimiter.
///
/// The last occurrence is used so that a ciphertext part containing the
/// delimiter still splits correctly. A leading `#` (as read from a URL) is
/// ignored.
pub fn parse_fragment(fragment: &str) -> ParsedFragment<'_> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    match fragment.rsplit_once(DELIMITER) {
        Some((ciphertext, key)) => ParsedFragment {
            ciphertext,
            key: Some(key),
        },
        None => ParsedFragment {
            ciphertext: fragment,
            key: None,
        },
    }
}

pub fn has_embedded_key(fragment: &str) -> bool {
    parse_fragment(fragment).key.is_some()
}

/// Join ciphertext text and key text into a keyed fragment.
pub fn join(ciphertext: &str, key: &str) -> String {
    let mut out = String::with_capacity(ciphertext.len() + 1 + key.len());
    out.push_str(ciphertext);
    out.push(DELIMITER);
    out.push_str(key);
    out
}

/// `base_url#fragment`, replacing any fragment already on `base_url`.
pub fn share_url(base_url: &str, fragment: &str) -> String {
    let base = base_url.split('#').next().unwrap_or(base_url);
    format!("{base}#{fragment}")
}
