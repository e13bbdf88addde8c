use thiserror::Error;

/// Error taxonomy for one relay invocation.
///
/// Every variant is fatal for the current cycle: the top level logs it at
/// error severity and the process exits non-zero. Nothing is retried.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("spot price query failed: {0}")]
    Query(String),

    #[error("malformed price value: {message}")]
    Parse { message: String },

    #[error("couldn't connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("sending metrics to {host}:{port} failed: {source}")]
    Write {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("no AWS credentials found: {0}")]
    Credentials(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Creates a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Creates a new credentials error.
    pub fn credentials<S: Into<String>>(msg: S) -> Self {
        Self::Credentials(msg.into())
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
