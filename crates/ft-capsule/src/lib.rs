//! ft-capsule: a whole conversation carried in a URL fragment
//!
//! Pipeline: snapshot → JSON → compress → AES-128-GCM (zero nonce) → base64
//!
//! Fragment shapes:
//! ```text
//! keyless:  <ciphertext-text>
//! keyed:    <ciphertext-text>:<key-text>
//! ```
//!
//! A keyed fragment is accepted once, to open a session; the session keeps
//! the key in memory and only ever publishes keyless fragments afterwards.

pub mod api;
pub mod codec;
pub mod fragment;
pub mod session;

pub use api::{authenticate, open_fragment, produce_share_fragment, save_snapshot};
pub use codec::CapsuleCodec;
pub use fragment::{has_embedded_key, parse_fragment, share_url, ParsedFragment, DELIMITER};
pub use session::{LoadState, Session};
