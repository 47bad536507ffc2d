use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for docbind operations.
///
/// Binding errors carry the position information needed to fix the call site:
/// which parameter failed, which placeholder went unsatisfied, or how many
/// parameters were left over.
///
/// # Examples
///
/// ```rust,ignore
/// use docbind::errors::{DocBindError, DocBindResult, ErrorKind};
///
/// fn example() -> DocBindResult<()> {
///     Err(DocBindError::new("Not enough parameters", ErrorKind::InsufficientParameters {
///         placeholder: 1,
///         supplied: 1,
///     }))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Binding Errors
    /// A parameter could not be serialized into the query.
    /// `index` is the zero-based position of the parameter.
    InvalidParameter { index: usize },
    /// The template has more placeholders than parameters were supplied.
    /// `placeholder` is the zero-based index of the first unsatisfied placeholder.
    InsufficientParameters { placeholder: usize, supplied: usize },
    /// More parameters were supplied than the template has placeholders.
    TooManyParameters { placeholders: usize, surplus: usize },

    // Argument Errors
    /// An argument was rejected at the API boundary (e.g. a missing id in a lookup)
    InvalidArgument,
    /// The provided id is not a valid object id
    InvalidId,
    /// The operation is not valid in the current context
    InvalidOperation,

    // Mapping Errors
    /// Error mapping an object to or from a document
    ObjectMappingError,
    /// The bound query text could not be parsed; `offset` is a character offset
    QuerySyntaxError { offset: usize },

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidParameter { index } => write!(f, "Invalid parameter at index {}", index),
            ErrorKind::InsufficientParameters { placeholder, supplied } => write!(
                f,
                "Insufficient parameters: placeholder {} unsatisfied ({} supplied)",
                placeholder, supplied
            ),
            ErrorKind::TooManyParameters { placeholders, surplus } => write!(
                f,
                "Too many parameters: {} surplus for {} placeholders",
                surplus, placeholders
            ),
            ErrorKind::InvalidArgument => write!(f, "Invalid argument"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::QuerySyntaxError { offset } => write!(f, "Query syntax error at offset {}", offset),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom docbind error type.
///
/// `DocBindError` carries a message, a kind, an optional cause and the
/// backtrace captured where it was created.
///
/// # Examples
///
/// ```rust,ignore
/// use docbind::errors::{DocBindError, ErrorKind};
///
/// let cause = DocBindError::new("cyclic structure", ErrorKind::ObjectMappingError);
/// let err = DocBindError::new_with_cause(
///     "Unable to bind parameter",
///     ErrorKind::InvalidParameter { index: 0 },
///     cause,
/// );
/// ```
#[derive(Clone)]
pub struct DocBindError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocBindError>>,
    backtrace: Atomic<Backtrace>,
}

impl DocBindError {
    /// Creates a new `DocBindError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocBindError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `DocBindError` that keeps `cause` in its error chain.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocBindError) -> Self {
        DocBindError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocBindError> {
        self.cause.as_deref()
    }
}

impl Display for DocBindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocBindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for DocBindError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for docbind operations.
pub type DocBindResult<T> = Result<T, DocBindError>;

impl de::Error for DocBindError {
    fn custom<T: Display>(msg: T) -> Self {
        DocBindError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl ser::Error for DocBindError {
    fn custom<T: Display>(msg: T) -> Self {
        DocBindError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl From<std::fmt::Error> for DocBindError {
    fn from(err: std::fmt::Error) -> Self {
        DocBindError::new(&format!("Formatting error: {}", err), ErrorKind::InternalError)
    }
}

impl From<std::num::ParseIntError> for DocBindError {
    fn from(err: std::num::ParseIntError) -> Self {
        DocBindError::new(&format!("Failed to parse integer: {}", err), ErrorKind::InvalidId)
    }
}

impl From<String> for DocBindError {
    fn from(msg: String) -> Self {
        DocBindError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for DocBindError {
    fn from(msg: &str) -> Self {
        DocBindError::new(msg, ErrorKind::InternalError)
    }
}
