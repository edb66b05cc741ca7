use std::fmt;

/// Unified error type for the opshell core.
///
/// Every variant corresponds to one failure category surfaced through
/// [`crate::command::CommandOutcome`]; `code()` gives the stable
/// machine-readable string for each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// Malformed input line.
    Parse(String),
    /// Unknown command, namespace, or alias.
    Resolution(String),
    /// The invoked handler failed.
    Handler { code: String, message: String },
    /// A dynamic source's discover/refresh failed.
    Source { namespace: String, message: String },
    /// A schema could not be decomposed into a command.
    Mapping(String),
    /// Internal error.
    Internal(String),
}

impl ShellError {
    /// Construct a handler failure with the default handler code.
    pub fn handler(message: impl Into<String>) -> Self {
        ShellError::Handler {
            code: "handler_error".to_string(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error category.
    pub fn code(&self) -> &str {
        match self {
            ShellError::Parse(_) => "parse_error",
            ShellError::Resolution(_) => "resolution_error",
            ShellError::Handler { code, .. } => code,
            ShellError::Source { .. } => "source_error",
            ShellError::Mapping(_) => "mapping_error",
            ShellError::Internal(_) => "internal_error",
        }
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Parse(msg) => write!(f, "parse error: {msg}"),
            ShellError::Resolution(msg) => write!(f, "resolution error: {msg}"),
            ShellError::Handler { message, .. } => write!(f, "handler error: {message}"),
            ShellError::Source { namespace, message } => {
                write!(f, "dynamic source '{namespace}' failed: {message}")
            }
            ShellError::Mapping(msg) => write!(f, "mapping error: {msg}"),
            ShellError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ShellError {}

/// Result type alias using [`ShellError`].
pub type ShellResult<T> = Result<T, ShellError>;
