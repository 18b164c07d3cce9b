use serde::{Deserialize, Serialize};

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Nil/empty function config or an unexpected apiVersion/kind.
    InvalidInput,
    /// A required field is missing after defaulting.
    ValidationError,
    /// A `---` line carries something other than whitespace or a comment.
    MalformedSeparator,
    /// The script source locator cannot be parsed.
    InvalidSource,
    /// Registry login was rejected.
    AuthenticationFailed,
    DependencyResolutionFailed,
    /// A document in the batch is not structured data.
    DecodeFailed,
    /// The execution engine reported an error.
    ExecutionFailed,
    SerializationError,
    IoError,
    InternalError,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
    Info,
    Debug,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Debug => write!(f, "debug"),
        }
    }
}
