//! Error types for the MySQL thin client.

use std::io;
use std::panic::Location;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for MySQL operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad category of an [`Error`], used by callers to decide between retrying,
/// reconnecting and giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed timestamp text or calendar-invalid date.
    Parse,
    /// Session open failure (network, DNS, authentication).
    Connect,
    /// Statement preparation rejected by the server.
    Prepare,
    /// Parameter count/position mismatch.
    Bind,
    /// Statement execution rejected by the server.
    Execute,
    /// Failure while materializing a row or converting a column.
    Fetch,
    /// Typed access on a NULL column.
    NullValue,
    /// Unknown column name or ordinal.
    NotFound,
    /// Operation on a closed statement or result.
    UseAfterClose,
    /// Transport failure.
    Io,
    /// Malformed or unexpected protocol data.
    Protocol,
}

/// Error type for MySQL thin client operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during network communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server closed the connection.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Protocol error.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Packet sequence id did not match the expected one.
    #[error("Packet out of order: expected sequence {expected}, got {actual}")]
    PacketOutOfOrder { expected: u8, actual: u8 },

    /// Buffer too small.
    #[error("Buffer too small: need {needed} bytes, have {available} filed at {location}")]
    BufferTooSmall {
        needed: usize,
        available: usize,
        location: &'static Location<'static>,
    },

    /// Error packet returned by the server outside of a statement context.
    #[error("ERROR {code} ({sql_state}): {message}")]
    Server {
        code: u16,
        sql_state: String,
        message: String,
    },

    /// Timestamp text could not be parsed or normalized.
    #[error("Timestamp parse failed: {message}")]
    Parse { message: String },

    /// Connection could not be established.
    #[error("Connect failed: {message}")]
    Connect { message: String },

    /// Connection timed out during TCP connect.
    #[error("Connection to {host}:{port} timed out after {timeout:?}")]
    ConnectionTimeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    /// DNS resolution failed.
    #[error("Failed to resolve hostname '{hostname}': {message}")]
    DnsResolutionFailed { hostname: String, message: String },

    /// Authentication failed.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The server asked for an authentication plugin this client does not speak.
    #[error("Unsupported authentication plugin: {plugin}")]
    UnsupportedAuthPlugin { plugin: String },

    /// Character set name with no known collation id.
    #[error("Unknown character set: {charset}")]
    UnknownCharset { charset: String },

    /// Invalid connect string.
    #[error("Invalid connect string: {message}")]
    InvalidConnectString { message: String },

    /// Statement preparation was rejected.
    #[error("Prepare failed: ERROR {code} ({sql_state}): {message}")]
    Prepare {
        code: u16,
        sql_state: String,
        message: String,
    },

    /// Parameter binding error.
    #[error("Bind error: {message}")]
    Bind { message: String },

    /// Statement execution was rejected.
    #[error("Execute failed: ERROR {code} ({sql_state}): {message}")]
    Execute {
        code: u16,
        sql_state: String,
        message: String,
    },

    /// Row or column fetch failed.
    #[error("Fetch failed: {message}")]
    Fetch { message: String },

    /// Type conversion error.
    #[error("Type conversion error: {message}")]
    TypeConversion { message: String },

    /// Unsupported MySQL wire type.
    #[error("Unsupported MySQL column type: {type_tag}")]
    UnsupportedType { type_tag: u8 },

    /// Null value error.
    #[error("Unexpected NULL value in column {column}")]
    NullValue { column: String },

    /// Column not found.
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    /// Column index out of bounds.
    #[error("Column index {index} out of bounds (columns: {count})")]
    ColumnIndexOutOfBounds { index: usize, count: usize },

    /// Operation attempted after close.
    #[error("{what} used after close")]
    UseAfterClose { what: &'static str },
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::ConnectionClosed => ErrorKind::Io,
            Error::Protocol { .. }
            | Error::PacketOutOfOrder { .. }
            | Error::BufferTooSmall { .. }
            | Error::Server { .. } => ErrorKind::Protocol,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::Connect { .. }
            | Error::ConnectionTimeout { .. }
            | Error::DnsResolutionFailed { .. }
            | Error::AuthenticationFailed { .. }
            | Error::UnsupportedAuthPlugin { .. }
            | Error::UnknownCharset { .. }
            | Error::InvalidConnectString { .. } => ErrorKind::Connect,
            Error::Prepare { .. } => ErrorKind::Prepare,
            Error::Bind { .. } => ErrorKind::Bind,
            Error::Execute { .. } => ErrorKind::Execute,
            Error::Fetch { .. } | Error::TypeConversion { .. } | Error::UnsupportedType { .. } => {
                ErrorKind::Fetch
            }
            Error::NullValue { .. } => ErrorKind::NullValue,
            Error::ColumnNotFound { .. } | Error::ColumnIndexOutOfBounds { .. } => {
                ErrorKind::NotFound
            }
            Error::UseAfterClose { .. } => ErrorKind::UseAfterClose,
        }
    }

    /// MySQL error code, if the server produced this error.
    pub fn server_code(&self) -> Option<u16> {
        match self {
            Error::Server { code, .. }
            | Error::Prepare { code, .. }
            | Error::Execute { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Record the caller's location on the diagnostic stream.
    #[track_caller]
    fn traced(self) -> Self {
        let location = Location::caller();
        tracing::debug!(
            file = location.file(),
            line = location.line(),
            kind = ?self.kind(),
            "{}",
            self
        );
        self
    }

    /// Create a protocol error.
    #[track_caller]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
        .traced()
    }

    /// Create a timestamp parse error.
    #[track_caller]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
        .traced()
    }

    /// Create a connect error.
    #[track_caller]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
        .traced()
    }

    /// Create a bind error.
    #[track_caller]
    pub fn bind(message: impl Into<String>) -> Self {
        Self::Bind {
            message: message.into(),
        }
        .traced()
    }

    /// Create a client-side execute error (no server error code).
    #[track_caller]
    pub fn execute(message: impl Into<String>) -> Self {
        Self::Execute {
            code: 0,
            sql_state: "HY000".to_string(),
            message: message.into(),
        }
        .traced()
    }

    /// Create a fetch error.
    #[track_caller]
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
        .traced()
    }

    /// Create a type conversion error.
    #[track_caller]
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: message.into(),
        }
        .traced()
    }

    /// Create a null value error.
    #[track_caller]
    pub fn null_value(column: impl Into<String>) -> Self {
        Self::NullValue {
            column: column.into(),
        }
        .traced()
    }

    /// Create a use-after-close error.
    #[track_caller]
    pub fn use_after_close(what: &'static str) -> Self {
        Self::UseAfterClose { what }.traced()
    }

    /// Re-tag a server error raised while preparing a statement.
    #[track_caller]
    pub fn in_prepare(self) -> Self {
        match self {
            Error::Server {
                code,
                sql_state,
                message,
            } => Error::Prepare {
                code,
                sql_state,
                message,
            }
            .traced(),
            other => other,
        }
    }

    /// Re-tag a server error raised while executing a statement.
    #[track_caller]
    pub fn in_execute(self) -> Self {
        match self {
            Error::Server {
                code,
                sql_state,
                message,
            } => Error::Execute {
                code,
                sql_state,
                message,
            }
            .traced(),
            other => other,
        }
    }

    /// Re-tag a server or protocol error raised while reading rows.
    #[track_caller]
    pub fn in_fetch(self) -> Self {
        match self {
            Error::Server {
                code,
                sql_state,
                message,
            } => Error::fetch(format!("ERROR {} ({}): {}", code, sql_state, message)),
            Error::Protocol { message } => Error::fetch(message),
            other => other,
        }
    }

    /// Re-tag a server error raised during the handshake.
    #[track_caller]
    pub fn in_connect(self) -> Self {
        match self {
            Error::Server {
                code,
                sql_state,
                message,
            } => Error::AuthenticationFailed {
                message: format!("ERROR {} ({}): {}", code, sql_state, message),
            }
            .traced(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error() -> Error {
        Error::Server {
            code: 1064,
            sql_state: "42000".to_string(),
            message: "You have an error in your SQL syntax".to_string(),
        }
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::parse("bad").kind(), ErrorKind::Parse);
        assert_eq!(Error::bind("bad").kind(), ErrorKind::Bind);
        assert_eq!(Error::null_value("a").kind(), ErrorKind::NullValue);
        assert_eq!(
            Error::ColumnNotFound {
                name: "x".to_string()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::use_after_close("statement").kind(),
            ErrorKind::UseAfterClose
        );
        assert_eq!(Error::type_conversion("x").kind(), ErrorKind::Fetch);
    }

    #[test]
    fn test_server_error_retagging() {
        let err = server_error().in_prepare();
        assert_eq!(err.kind(), ErrorKind::Prepare);
        assert_eq!(err.server_code(), Some(1064));

        let err = server_error().in_execute();
        assert_eq!(err.kind(), ErrorKind::Execute);
        assert!(err.to_string().contains("42000"));

        let err = server_error().in_fetch();
        assert_eq!(err.kind(), ErrorKind::Fetch);

        let err = server_error().in_connect();
        assert_eq!(err.kind(), ErrorKind::Connect);
    }

    #[test]
    fn test_retagging_keeps_other_errors() {
        let err = Error::ConnectionClosed.in_execute();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_display() {
        let err = Error::ColumnIndexOutOfBounds { index: 3, count: 2 };
        assert_eq!(err.to_string(), "Column index 3 out of bounds (columns: 2)");
        let err = Error::use_after_close("statement");
        assert_eq!(err.to_string(), "statement used after close");
    }
}
