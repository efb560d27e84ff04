//! Process adapter error types.

use blox_domain::error::BloxError;

/// Errors raised while running the interpreter process.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The interpreter could not be started (missing binary, permissions).
    #[error("failed to spawn interpreter {command}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Feeding stdin or collecting output failed.
    #[error("interpreter i/o failed")]
    Io(#[source] std::io::Error),

    /// The process outlived its time budget and was killed.
    #[error("interpreter timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl ProcessError {
    /// Convert into a [`BloxError::Interpreter`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> BloxError {
        BloxError::Interpreter(Box::new(self))
    }
}

impl From<ProcessError> for BloxError {
    fn from(err: ProcessError) -> Self {
        err.into_domain()
    }
}
