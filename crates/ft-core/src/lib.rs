pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use error::{
    CapsuleError, CapsuleResult, CompressionError, CryptoError, DecodeError, IdentityError,
    ProtocolError, SnapshotError,
};
pub use provider::{Clock, FixedProvider, IdSource, SystemProvider};
pub use types::{ConversationSnapshot, IdentityProofRecord, Like, Post, User};
