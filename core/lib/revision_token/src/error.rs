#[derive(Debug, thiserror::Error)]
pub enum RevisionTokenError {
    #[error("revision token references an unknown or deleted key")]
    UnknownKey,
    #[error("revision token is shorter than the configured minimum length")]
    TooShort,
    #[error("revision token failed authentication")]
    SealBroken,
    #[error("revision token payload is not valid")]
    Malformed,
    #[error("key provider error: {0}")]
    KeyProvider(String),
}

pub type Result<T> = std::result::Result<T, RevisionTokenError>;
