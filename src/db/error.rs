use std::fmt;

/// Result type for database operations
pub type Result<T> = std::result::Result<T, DbError>;

/// Error types for database access
#[derive(Debug)]
pub enum DbError {
    /// Database unreachable or authentication failure
    Connection(String),

    /// Connection pool issues
    Pool(String),

    /// SQL errors, constraint violations, row decoding failures
    Query(String),

    /// Operation did not finish in time
    Timeout(String),

    /// Invalid input such as a malformed connection URL
    Validation(String),
}

impl DbError {
    /// True when the failure is a unique constraint violation
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::Query(msg) if msg.starts_with("23505"))
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Connection(msg) => write!(f, "Connection error: {}", msg),
            DbError::Pool(msg) => write!(f, "Pool error: {}", msg),
            DbError::Query(msg) => write!(f, "Query error: {}", msg),
            DbError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            DbError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for DbError {}

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_error) = err.as_db_error() {
            return DbError::Query(format!("{}: {}", db_error.code().code(), db_error.message()));
        }

        if err.is_closed() {
            return DbError::Connection(err.to_string());
        }

        DbError::Query(format!("{:?}", err))
    }
}

impl From<deadpool_postgres::PoolError> for DbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        DbError::Pool(err.to_string())
    }
}

impl From<deadpool_postgres::BuildError> for DbError {
    fn from(err: deadpool_postgres::BuildError) -> Self {
        DbError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = DbError::Timeout("ping after 3s".to_string());
        assert_eq!(err.to_string(), "Timed out: ping after 3s");
    }

    #[test]
    fn test_unique_violation_detection() {
        let err = DbError::Query("23505: duplicate key value".to_string());
        assert!(err.is_unique_violation());
        assert!(!DbError::Query("42P01: missing table".to_string()).is_unique_violation());
        assert!(!DbError::Pool("23505".to_string()).is_unique_violation());
    }
}
