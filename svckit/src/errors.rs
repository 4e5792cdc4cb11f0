use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyspaceError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Error connecting to cluster: {0}")]
    ConnectionError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unknown replication strategy: {0}")]
    UnknownStrategy(String),

    #[error("Changing replication strategy from {live} to {desired} is not supported")]
    StrategyMismatch { live: String, desired: String },
}

impl KeyspaceError {
    /// Terminal message surfaced to the caller for a failed invocation.
    ///
    /// Failures while talking to an already-open session are wrapped in a
    /// generic prefix; everything detected before that point, and strategy
    /// problems, are reported as-is.
    pub fn report(&self) -> String {
        match self {
            KeyspaceError::DatabaseError(_) | KeyspaceError::ParseError(_) => {
                format!("An error occurred: {}", self)
            }
            _ => self.to_string(),
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, KeyspaceError::AuthenticationError(_))
    }
}

impl From<scylla::transport::errors::QueryError> for KeyspaceError {
    fn from(err: scylla::transport::errors::QueryError) -> Self {
        KeyspaceError::DatabaseError(err.to_string())
    }
}
