#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("row violates an application invariant: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
