//! Error classification for the pool and the query executor
//!
//! Driver errors are reduced once to an [`ErrorInfo`]; [`classify_error`]
//! decides from that alone whether reconnecting is likely to help.

use std::io;

/// Error codes that indicate a broken or unreachable connection.
pub const TRANSIENT_CODES: &[&str] = &[
    "ECONNRESET",
    "ECONNREFUSED",
    "ECONNABORTED",
    "ETIMEDOUT",
    "EPIPE",
    "EAI_AGAIN",
    "EHOSTUNREACH",
    "ENETUNREACH",
    "EPROTO",
    "PROTOCOL_CONNECTION_LOST",
    "PROTOCOL_SEQUENCE_TIMEOUT",
];

/// SQLSTATE class "connection exception".
const CONNECTION_EXCEPTION_CLASS: &str = "08";

/// Classification result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Connection-level failure, expected to clear after reconnecting
    Transient,
    /// Permanent failure reported by the driver or server (bad query, constraint)
    Fatal,
    /// No structured information (domain errors)
    Unknown,
}

/// Structured error facts used for classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Symbolic error code (`ECONNRESET`, ...)
    pub code: Option<String>,
    /// SQLSTATE reported by the server
    pub sql_state: Option<String>,
    /// Driver considers the connection unusable
    pub fatal: bool,
}

impl ErrorInfo {
    pub fn code(code: &str) -> Self {
        Self {
            code: Some(code.to_owned()),
            ..Self::default()
        }
    }

    pub fn sql_state(state: &str) -> Self {
        Self {
            sql_state: Some(state.to_owned()),
            ..Self::default()
        }
    }

    /// Extract classification facts from a sqlx error.
    pub fn from_sqlx(err: &sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(e) => Self {
                code: io_code(e.kind()).map(str::to_owned),
                sql_state: None,
                fatal: true,
            },
            sqlx::Error::Tls(_) | sqlx::Error::WorkerCrashed => Self {
                fatal: true,
                ..Self::default()
            },
            sqlx::Error::PoolTimedOut => Self::code("ETIMEDOUT"),
            sqlx::Error::Protocol(_) => Self::code("EPROTO"),
            sqlx::Error::Database(db) => Self {
                code: None,
                sql_state: db.code().map(|c| c.into_owned()),
                fatal: false,
            },
            sqlx::Error::Configuration(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => Self::code("EINVAL"),
            _ => Self::default(),
        }
    }
}

fn io_code(kind: io::ErrorKind) -> Option<&'static str> {
    let code = match kind {
        io::ErrorKind::ConnectionReset => "ECONNRESET",
        io::ErrorKind::ConnectionRefused => "ECONNREFUSED",
        io::ErrorKind::ConnectionAborted => "ECONNABORTED",
        io::ErrorKind::TimedOut => "ETIMEDOUT",
        io::ErrorKind::BrokenPipe => "EPIPE",
        io::ErrorKind::HostUnreachable => "EHOSTUNREACH",
        io::ErrorKind::NetworkUnreachable => "ENETUNREACH",
        io::ErrorKind::UnexpectedEof => "PROTOCOL_CONNECTION_LOST",
        _ => return None,
    };
    Some(code)
}

/// Decide whether an error is worth a reconnect-and-retry.
pub fn classify_error(info: &ErrorInfo) -> ErrorClass {
    let code_is_transient = info
        .code
        .as_deref()
        .is_some_and(|code| TRANSIENT_CODES.contains(&code));
    let state_is_connection = info
        .sql_state
        .as_deref()
        .is_some_and(|state| state.starts_with(CONNECTION_EXCEPTION_CLASS));

    if info.fatal || code_is_transient || state_is_connection {
        ErrorClass::Transient
    } else if info.code.is_some() || info.sql_state.is_some() {
        ErrorClass::Fatal
    } else {
        ErrorClass::Unknown
    }
}
