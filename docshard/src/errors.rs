use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds for docshard operations.
///
/// Each error kind describes a specific category of failure, enabling precise
/// error handling. The taxonomy follows the recovery policy of the system:
/// connection errors are retried by the caller, parse errors are substituted
/// with empty structures, protocol errors are reported as text on the same
/// output channel, and startup errors terminate the process.
///
/// # Examples
///
/// ```rust,ignore
/// use docshard::errors::{DocshardError, ErrorKind, DocshardResult};
///
/// fn example() -> DocshardResult<()> {
///     Err(DocshardError::new("Collection file does not exist", ErrorKind::FileNotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // IO and Storage Errors - file/collection operations
    /// Generic IO error
    IOError,
    /// The file was not found
    FileNotFound,
    /// Permission denied for file operation
    PermissionDenied,

    // Data Errors - JSON parsing and value handling
    /// Error parsing a JSON document or collection file
    ParseError,
    /// Invalid data type for operation
    InvalidDataType,
    /// The operation is not valid in the current context
    InvalidOperation,

    // Configuration Errors - fatal at startup
    /// Error loading or reading a configuration file
    ConfigError,
    /// A required configuration key is missing
    MissingRequiredField,

    // Network Errors - sockets and routing
    /// Error on a socket connection
    ConnectionError,
    /// Failed to bind the listening port
    BindError,
    /// Malformed command or handshake line
    ProtocolError,

    // Generic/Internal Errors - used as fallback
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::FileNotFound => write!(f, "File not found"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::ParseError => write!(f, "Parse error"),
            ErrorKind::InvalidDataType => write!(f, "Invalid data type"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::ConfigError => write!(f, "Config error"),
            ErrorKind::MissingRequiredField => write!(f, "Missing required field"),
            ErrorKind::ConnectionError => write!(f, "Connection error"),
            ErrorKind::BindError => write!(f, "Bind error"),
            ErrorKind::ProtocolError => write!(f, "Protocol error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom docshard error type.
///
/// `DocshardError` encapsulates error information including the error message,
/// kind, and optional cause. It supports error chaining and backtraces for
/// debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use docshard::errors::{DocshardError, ErrorKind};
///
/// // Create a simple error
/// let err = DocshardError::new("File not found", ErrorKind::FileNotFound);
///
/// // Create an error with a cause
/// let cause = DocshardError::new("IO failed", ErrorKind::IOError);
/// let err = DocshardError::new_with_cause("Save failed", ErrorKind::IOError, cause);
/// ```
#[derive(Clone)]
pub struct DocshardError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocshardError>>,
    backtrace: Backtrace,
}

impl DocshardError {
    /// Creates a new `DocshardError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocshardError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Backtrace::new(),
        }
    }

    /// Creates a new `DocshardError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for
    /// debugging.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocshardError) -> Self {
        DocshardError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Backtrace::new(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocshardError> {
        self.cause.as_deref()
    }
}

impl Display for DocshardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocshardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace),
        }
    }
}

impl Error for DocshardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for docshard operations.
///
/// `DocshardResult<T>` is shorthand for `Result<T, DocshardError>`.
/// All fallible docshard operations return this type.
pub type DocshardResult<T> = Result<T, DocshardError>;

// From trait implementations for automatic error conversion
impl From<std::io::Error> for DocshardError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            std::io::ErrorKind::AddrInUse => ErrorKind::BindError,
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe => ErrorKind::ConnectionError,
            _ => ErrorKind::IOError,
        };
        DocshardError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<serde_json::Error> for DocshardError {
    fn from(err: serde_json::Error) -> Self {
        DocshardError::new(&format!("JSON error: {}", err), ErrorKind::ParseError)
    }
}

impl From<std::num::ParseIntError> for DocshardError {
    fn from(err: std::num::ParseIntError) -> Self {
        DocshardError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::InvalidDataType,
        )
    }
}

impl From<String> for DocshardError {
    fn from(msg: String) -> Self {
        DocshardError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for DocshardError {
    fn from(msg: &str) -> Self {
        DocshardError::new(msg, ErrorKind::InternalError)
    }
}
