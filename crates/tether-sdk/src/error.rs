//! Error types for the Tether SDK

use crate::kind::ElementKind;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, Error>;

/// SDK error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Wrong length or representation for a scalar conversion
    #[error("{expected} (got {} of length {len})", kind_name(.kind))]
    Shape {
        /// What the conversion needed, e.g. "Expected single integer value"
        expected: &'static str,
        /// Kind of the offending object (None for nil / non-vector)
        kind: Option<ElementKind>,
        /// Its length
        len: usize,
    },

    /// Type mismatch during conversion or vector construction
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Value does not fit the target native type
    #[error("Value out of range for {target}: {value}")]
    OutOfRange {
        /// Target native type name
        target: &'static str,
        /// Offending value, formatted
        value: String,
    },

    /// Indexed read or write past the end of a vector
    #[error("Index {index} out of bounds for length {len}")]
    OutOfBounds {
        /// Requested index
        index: usize,
        /// Vector length
        len: usize,
    },

    /// Mutation attempted on a view of a runtime vector
    #[error("Vector is a read-only view; copy it with `writable_from` first")]
    ReadOnly,

    /// The runtime signalled an error inside a safe call
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// No runtime session is installed on this thread
    #[error("No runtime session is active on this thread")]
    NoSession,

    /// A runtime session is already installed on this thread
    #[error("A runtime session is already active on this thread")]
    SessionActive,

    /// Invalid argument
    #[error("Argument error: {0}")]
    Argument(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

fn kind_name(kind: &Option<ElementKind>) -> &'static str {
    kind.map_or("NULL", ElementKind::name)
}

impl Error {
    /// Re-raise this error as a runtime-level error.
    ///
    /// Used at the export boundary, where a native function hands control
    /// back to the runtime and can only report failure by unwinding.
    pub fn raise(self) -> ! {
        crate::unwind::raise(self.to_string())
    }

    /// Shorthand for a type mismatch
    pub(crate) fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Argument(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Argument(s.to_string())
    }
}
