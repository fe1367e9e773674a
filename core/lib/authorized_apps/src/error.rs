#[derive(Debug, thiserror::Error)]
pub enum AuthorizedAppError {
    #[error("app package is not authorized")]
    NotAuthorized,
    #[error(transparent)]
    Db(#[from] enserver_db::DbError),
}

pub type Result<T> = std::result::Result<T, AuthorizedAppError>;
