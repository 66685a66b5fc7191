use thiserror::Error;

/// Server error codes the gateway itself produces or inspects.
pub mod code {
    pub const BAD_VALUE: i32 = 2;
    pub const UNAUTHORIZED: i32 = 13;
    pub const TYPE_MISMATCH: i32 = 14;
    pub const NAMESPACE_NOT_FOUND: i32 = 26;
    pub const CURSOR_NOT_FOUND: i32 = 43;
    pub const NAMESPACE_EXISTS: i32 = 48;
    pub const COMMAND_NOT_FOUND: i32 = 59;
    pub const INVALID_OPTIONS: i32 = 72;
    pub const INVALID_NAMESPACE: i32 = 73;
    /// Used when a failed reply carries no numeric code.
    pub const UNKNOWN: i32 = 8;
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// A command the remote store did not complete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperationError {
    #[error("Command failed: {code_name} ({code}): {message}")]
    Command { code: i32, code_name: String, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Failure below the command layer; the command may or may not have reached the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl OperationError {
    pub fn command(code: i32, code_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command { code, code_name: code_name.into(), message: message.into() }
    }

    pub(crate) fn invalid_namespace(ns: &str) -> Self {
        Self::command(code::INVALID_NAMESPACE, "InvalidNamespace", format!("Invalid namespace specified '{ns}'"))
    }

    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Command { code, .. } => Some(*code),
            Self::Transport(_) => None,
        }
    }
}

impl DbError {
    /// True for failures that happened below the command layer.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Operation(OperationError::Transport(_)))
    }

    /// True for any remote-facing failure, structured rejection or transport.
    #[must_use]
    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    /// The server-reported error code, if this is a command rejection.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Operation(op) => op.code(),
            _ => None,
        }
    }
}

impl From<TransportError> for DbError {
    fn from(e: TransportError) -> Self {
        Self::Operation(OperationError::Transport(e))
    }
}

impl From<toml::de::Error> for DbError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}
