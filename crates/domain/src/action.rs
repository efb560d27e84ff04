//! Action — a named snippet of script text run by an external interpreter.

use serde::{Deserialize, Serialize};

use crate::error::{BloxError, ExecutionError, ValidationError};

/// An immutable unit of executable script text.
///
/// The name is only used for diagnostics and for the `callback` field of a
/// timer's wire representation; it does not have to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    name: String,
    code: String,
}

impl Action {
    /// Create an action after checking that it has a name.
    ///
    /// # Errors
    ///
    /// Returns [`BloxError::Validation`] when `name` is empty.
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Result<Self, BloxError> {
        let action = Self {
            name: name.into(),
            code: code.into(),
        };
        action.validate()?;
        Ok(action)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BloxError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), BloxError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The text handed to the interpreter: `input` followed by the code.
    #[must_use]
    pub fn program(&self, input: &str) -> String {
        let mut program = String::with_capacity(input.len() + self.code.len());
        program.push_str(input);
        program.push_str(&self.code);
        program
    }

    /// Build the failure reported when the interpreter exits unsuccessfully.
    #[must_use]
    pub fn failure(&self, exit_code: Option<i32>, stdout: String, stderr: String) -> ExecutionError {
        ExecutionError {
            name: self.name.clone(),
            exit_code,
            stdout,
            stderr,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "action({})", self.name)
    }
}
