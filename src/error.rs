//! Error types for adapter operations.
//!
//! Each public operation maps its failures onto one of three classes:
//! parse errors (bad connection string, raised before any I/O),
//! connection errors (session establishment or liveness probe), and
//! query errors (the store rejected or failed a statement).

use thiserror::Error;

/// Result type alias for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors that can occur while parsing a connection string or talking
/// to the store.
#[derive(Debug, Error, Clone)]
pub enum AdapterError {
    /// The connection string does not match the expected format
    #[error("unsupported connection string format: {0}")]
    Parse(String),

    /// Failed to establish a session or the liveness probe failed
    #[error("failed to connect to ClickHouse: {0}")]
    Connection(String),

    /// The store rejected or failed a query
    #[error("query execution failed: {0}")]
    Query(String),
}

impl AdapterError {
    /// True if this error was raised at parse time, before any I/O.
    pub fn is_parse(&self) -> bool {
        matches!(self, AdapterError::Parse(_))
    }

    /// True if this error came from session establishment.
    pub fn is_connection(&self) -> bool {
        matches!(self, AdapterError::Connection(_))
    }

    /// True if this error came from query execution.
    pub fn is_query(&self) -> bool {
        matches!(self, AdapterError::Query(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AdapterError::Parse("bogus://host".to_string());
        assert_eq!(
            err.to_string(),
            "unsupported connection string format: bogus://host"
        );

        let err = AdapterError::Connection("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));

        let err = AdapterError::Query("syntax error".to_string());
        assert!(err.to_string().starts_with("query execution failed"));
    }

    #[test]
    fn test_error_classification() {
        assert!(AdapterError::Parse(String::new()).is_parse());
        assert!(!AdapterError::Parse(String::new()).is_connection());
        assert!(AdapterError::Connection(String::new()).is_connection());
        assert!(AdapterError::Query(String::new()).is_query());
    }
}
