//! Error types for the tool layer.
//!
//! Each variant carries a stable error code (SCREAMING_SNAKE_CASE) that is
//! included in the Display output and accessible via [`ToolError::code()`].
//! The host bridge forwards the Display text to callers, so codes are part
//! of the wire contract.

use tiered_search::SearchError;

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// Tool arguments were missing or malformed.
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";

    /// The tool ran but its underlying operation failed.
    pub const EXECUTION_FAILED: &str = "EXECUTION_FAILED";

    /// No tool is registered under the requested name.
    pub const UNKNOWN_TOOL: &str = "UNKNOWN_TOOL";

    /// Invalid or unreadable configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// Reading or writing a local stream failed.
    pub const IO_ERROR: &str = "IO_ERROR";

    /// A host bridge message could not be parsed or encoded.
    pub const PROTOCOL_ERROR: &str = "PROTOCOL_ERROR";
}

/// Errors produced by tools, the registry and the host bridge.
///
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool arguments were missing or malformed.
    #[error("[{}] {}", error_codes::VALIDATION_FAILED, .0)]
    Validation(String),

    /// The tool ran but its underlying operation failed.
    #[error("[{}] {}", error_codes::EXECUTION_FAILED, .0)]
    Execution(String),

    /// No tool is registered under the requested name.
    #[error("[{}] no tool named '{}'", error_codes::UNKNOWN_TOOL, .0)]
    UnknownTool(String),

    /// Invalid or unreadable configuration.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    Config(String),

    /// Reading or writing a local stream failed.
    #[error("[{}] {}", error_codes::IO_ERROR, .0)]
    Io(String),

    /// A host bridge message could not be parsed or encoded.
    #[error("[{}] {}", error_codes::PROTOCOL_ERROR, .0)]
    Protocol(String),
}

impl ToolError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => error_codes::VALIDATION_FAILED,
            Self::Execution(_) => error_codes::EXECUTION_FAILED,
            Self::UnknownTool(_) => error_codes::UNKNOWN_TOOL,
            Self::Config(_) => error_codes::CONFIG_INVALID,
            Self::Io(_) => error_codes::IO_ERROR,
            Self::Protocol(_) => error_codes::PROTOCOL_ERROR,
        }
    }

    /// Returns the message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::Execution(m)
            | Self::UnknownTool(m)
            | Self::Config(m)
            | Self::Io(m)
            | Self::Protocol(m) => m,
        }
    }
}

impl From<SearchError> for ToolError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::InvalidInput(m) => Self::Validation(m),
            SearchError::Config(m) => Self::Config(m),
            other => Self::Execution(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Convenience type alias for tool-layer results.
pub type Result<T> = std::result::Result<T, ToolError>;
