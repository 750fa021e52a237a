use thiserror::Error;

pub type CapsuleResult<T> = Result<T, CapsuleError>;

/// Any failure of the capsule pipeline or the identity protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapsuleError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The snapshot could not be serialized for encoding.
    #[error("snapshot serialization failed: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Text outside the alphabet, or bad padding.
    #[error("malformed text: {0}")]
    MalformedText(String),

    /// The payload authenticated and decompressed but is not a snapshot.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompressionError {
    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    #[error("compression failed: {0}")]
    Encode(String),

    #[error("unknown compression codec: {0}")]
    UnknownCodec(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Tag mismatch: wrong key or corrupted ciphertext.
    #[error("authentication failed: wrong key or corrupted ciphertext")]
    AuthenticationFailed,

    #[error("bad key format: {0}")]
    BadKeyFormat(String),

    #[error("encryption failed: {0}")]
    Encrypt(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("no identity proof matches the supplied key")]
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("fragment carries no embedded key")]
    MissingEmbeddedKey,

    #[error("session has no key bound")]
    NoSessionKey,

    #[error("session key already bound; keyed fragments are only accepted on first open")]
    SessionKeyAlreadyBound,
}

/// Violations of the snapshot's referential contract, or invalid edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("user already exists: {0}")]
    DuplicateUser(String),

    #[error("username must not be empty")]
    EmptyUsername,

    #[error("unknown post: {0}")]
    UnknownPost(String),

    #[error("post id already in use: {0}")]
    DuplicatePost(String),

    #[error("post {post} is keyed as {key}")]
    MismatchedPostId { key: String, post: String },

    #[error("post {post} lists missing reply {reply}")]
    DanglingReply { post: String, reply: String },

    #[error("root post id {0} does not resolve")]
    DanglingRoot(String),

    #[error("post {post} has unknown author {author}")]
    UnknownAuthor { post: String, author: String },

    #[error("post {post} is liked by unknown user {user}")]
    UnknownLiker { post: String, user: String },
}
