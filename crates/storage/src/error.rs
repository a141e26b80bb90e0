use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Database unavailable: {0}")]
    Unavailable(sqlx::Error),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            // SQLSTATE class 23: integrity constraint violation
            sqlx::Error::Database(e) if e.code().is_some_and(|c| c.starts_with("23")) => {
                StorageError::ConstraintViolation(e.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => StorageError::Unavailable(error),
            _ => StorageError::Database(error),
        }
    }
}

impl StorageError {
    /// Errors worth a second attempt when acquiring a connection.
    pub fn is_transient(error: &sqlx::Error) -> bool {
        matches!(error, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_))
    }

    pub fn is_statement_timeout(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("57014")
        )
    }
}
