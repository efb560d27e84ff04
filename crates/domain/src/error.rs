//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BloxError`]
//! via `#[from]`. Adapter failures that the domain knows nothing about are
//! boxed into [`BloxError::Interpreter`].

/// Top-level error shared by the domain and application layers.
#[derive(Debug, thiserror::Error)]
pub enum BloxError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("protocol violation")]
    Protocol(#[from] ProtocolViolation),

    #[error("action execution failed")]
    Execution(#[from] ExecutionError),

    #[error("timer error")]
    Timer(#[from] TimerError),

    #[error("client channel error")]
    Channel(#[from] ChannelError),

    #[error("failed to serialize message")]
    Serialization(#[from] serde_json::Error),

    /// The interpreter adapter could not run the program at all.
    #[error("interpreter error")]
    Interpreter(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("duplicate device name: {0}")]
    DuplicateName(String),

    #[error("timeout must be a finite, non-negative number of seconds, got {0}")]
    InvalidTimeout(String),
}

/// A lookup by key found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A client sent something the hub refuses to handle.
///
/// Every variant terminates the offending connection; none of them is ever
/// reported back to the client.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("malformed request envelope")]
    Malformed(#[source] serde_json::Error),

    #[error("message id must be positive, got {0}")]
    NonPositiveMsgId(i64),

    #[error("unknown request: {0}")]
    UnknownRequest(String),

    #[error("unsupported frame")]
    UnsupportedFrame,
}

/// The interpreter ran the action but exited with a non-zero status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("action {name} failed with exit code {}", .exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
pub struct ExecutionError {
    pub name: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Timer state-machine misuse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    #[error("timer {name} is already active")]
    AlreadyActive { name: String },
}

/// Send or receive failure on a client channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("client channel closed")]
    Closed,

    #[error("failed to receive from client: {0}")]
    Receive(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_execution_error_with_exit_code() {
        let err = ExecutionError {
            name: "turnOff".to_string(),
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "action turnOff failed with exit code 1");
    }

    #[test]
    fn should_display_execution_error_without_exit_code() {
        let err = ExecutionError {
            name: "turnOff".to_string(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "action turnOff failed with exit code none");
    }

    #[test]
    fn should_convert_validation_error_into_blox_error() {
        let err: BloxError = ValidationError::EmptyName.into();
        assert!(matches!(err, BloxError::Validation(ValidationError::EmptyName)));
    }

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError {
            entity: "Device",
            id: "lamp".to_string(),
        };
        assert_eq!(err.to_string(), "Device not found: lamp");
    }

    #[test]
    fn should_display_non_positive_msg_id() {
        let err = ProtocolViolation::NonPositiveMsgId(0);
        assert_eq!(err.to_string(), "message id must be positive, got 0");
    }
}
