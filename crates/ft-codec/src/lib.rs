//! ft-codec: the two reversible layers under the capsule cipher
//!
//! - `text`: bytes ⇄ base64 text for embedding in a URL fragment
//! - `compress`: UTF-8 text ⇄ compressed bytes (deflate by default)

pub mod compress;
pub mod text;

pub use compress::{CompressionCodec, Compressor};
pub use text::{decode, decode_url_safe, encode, encode_url_safe};
