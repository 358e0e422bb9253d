//! Error types for sybase-query

/// Result type alias using QueryError
pub type Result<T> = std::result::Result<T, QueryError>;

/// Every way a query run can fail
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Missing or malformed command-line arguments
    #[error("{0}")]
    Usage(String),

    /// The query argument is not valid base64 or not UTF-8 once decoded
    #[error("invalid encoded query: {0}")]
    Decode(String),

    /// Query text could not be read from standard input
    #[error("failed to read query from stdin")]
    Input(#[source] std::io::Error),

    /// Query refused before reaching the server
    #[error("query rejected: {0}")]
    Rejected(String),

    /// Driver manager or driver runtime unavailable
    #[error("driver unavailable: {0}")]
    Driver(String),

    /// Network, authentication or unknown database
    #[error("connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    /// Invalid SQL, server rejection or fetch failure
    #[error("{0}")]
    Execution(String),

    /// Result could not be written out
    #[error("failed to write results: {0}")]
    Output(String),
}

/// Failure kind without payload, for callers that branch on the cause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    Decode,
    Input,
    Rejected,
    Driver,
    Connection,
    Execution,
    Output,
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Usage(_) => ErrorKind::Usage,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Input(_) => ErrorKind::Input,
            Self::Rejected(_) => ErrorKind::Rejected,
            Self::Driver(_) => ErrorKind::Driver,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Execution(_) => ErrorKind::Execution,
            Self::Output(_) => ErrorKind::Output,
        }
    }

    pub fn connection(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Connection {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn execution(err: impl ToString) -> Self {
        Self::Execution(err.to_string())
    }
}

impl From<std::io::Error> for QueryError {
    fn from(err: std::io::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueryError::connection("sybase://db01:5000/sales", "Login failed");
        assert_eq!(
            err.to_string(),
            "connection to sybase://db01:5000/sales failed: Login failed"
        );

        let err = QueryError::Rejected("only SELECT statements are allowed".into());
        assert_eq!(
            err.to_string(),
            "query rejected: only SELECT statements are allowed"
        );
    }

    #[test]
    fn test_io_errors_are_output_errors() {
        let err: QueryError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert_eq!(err.kind(), ErrorKind::Output);
    }
}
