//! Action executor — runs an [`Action`] through the interpreter port.

use std::sync::Arc;

use blox_domain::action::Action;
use blox_domain::error::BloxError;

use crate::ports::Interpreter;

/// Runs actions against an [`Interpreter`].
///
/// Cheap to clone; clones share the interpreter.
pub struct ActionExecutor<I> {
    interpreter: Arc<I>,
}

impl<I> Clone for ActionExecutor<I> {
    fn clone(&self) -> Self {
        Self {
            interpreter: Arc::clone(&self.interpreter),
        }
    }
}

impl<I: Interpreter + Send + Sync> ActionExecutor<I> {
    /// Create an executor owning the given interpreter.
    pub fn new(interpreter: I) -> Self {
        Self {
            interpreter: Arc::new(interpreter),
        }
    }

    /// Run `action` with `input` prepended to its code.
    ///
    /// Spawns exactly one interpreter process and never retries.
    ///
    /// # Errors
    ///
    /// Returns [`BloxError::Execution`] carrying the action name, exit code
    /// and captured output when the interpreter exits unsuccessfully, or the
    /// interpreter's own error when it could not be run at all.
    #[tracing::instrument(skip(self, action, input), fields(action = %action.name()))]
    pub async fn execute(&self, action: &Action, input: &str) -> Result<(), BloxError> {
        let output = self.interpreter.run(action.program(input)).await?;
        if output.success() {
            tracing::debug!(stdout_len = output.stdout.len(), "action succeeded");
            return Ok(());
        }
        Err(action
            .failure(output.exit_code, output.stdout, output.stderr)
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ScriptOutput;
    use blox_domain::error::ExecutionError;
    use std::sync::Mutex;

    struct RecordingInterpreter {
        exit_code: Option<i32>,
        programs: Mutex<Vec<String>>,
    }

    impl RecordingInterpreter {
        fn exiting_with(exit_code: Option<i32>) -> Self {
            Self {
                exit_code,
                programs: Mutex::new(Vec::new()),
            }
        }
    }

    impl Interpreter for RecordingInterpreter {
        async fn run(&self, program: String) -> Result<ScriptOutput, BloxError> {
            self.programs.lock().unwrap().push(program);
            Ok(ScriptOutput {
                exit_code: self.exit_code,
                stdout: "out".to_string(),
                stderr: "err".to_string(),
            })
        }
    }

    struct BrokenInterpreter;

    impl Interpreter for BrokenInterpreter {
        async fn run(&self, _program: String) -> Result<ScriptOutput, BloxError> {
            Err(BloxError::Interpreter("lua: not found".into()))
        }
    }

    #[tokio::test]
    async fn should_succeed_when_interpreter_exits_with_zero() {
        let executor = ActionExecutor::new(RecordingInterpreter::exiting_with(Some(0)));
        let action = Action::new("turnOff", "relay.off()").unwrap();

        executor.execute(&action, "").await.unwrap();

        let programs = executor.interpreter.programs.lock().unwrap();
        assert_eq!(programs.as_slice(), ["relay.off()"]);
    }

    #[tokio::test]
    async fn should_prepend_input_to_program() {
        let executor = ActionExecutor::new(RecordingInterpreter::exiting_with(Some(0)));
        let action = Action::new("dim", "relay.dim(level)").unwrap();

        executor.execute(&action, "level = 3\n").await.unwrap();

        let programs = executor.interpreter.programs.lock().unwrap();
        assert_eq!(programs.as_slice(), ["level = 3\nrelay.dim(level)"]);
    }

    #[tokio::test]
    async fn should_report_execution_error_when_exit_code_is_non_zero() {
        let executor = ActionExecutor::new(RecordingInterpreter::exiting_with(Some(1)));
        let action = Action::new("turnOff", "error('x')").unwrap();

        let result = executor.execute(&action, "").await;

        match result {
            Err(BloxError::Execution(ExecutionError {
                name,
                exit_code,
                stdout,
                stderr,
            })) => {
                assert_eq!(name, "turnOff");
                assert_eq!(exit_code, Some(1));
                assert_eq!(stdout, "out");
                assert_eq!(stderr, "err");
            }
            other => panic!("expected execution error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_report_execution_error_when_killed_by_signal() {
        let executor = ActionExecutor::new(RecordingInterpreter::exiting_with(None));
        let action = Action::new("turnOff", "").unwrap();

        let result = executor.execute(&action, "").await;
        assert!(matches!(
            result,
            Err(BloxError::Execution(ExecutionError { exit_code: None, .. }))
        ));
    }

    #[tokio::test]
    async fn should_propagate_interpreter_error() {
        let executor = ActionExecutor::new(BrokenInterpreter);
        let action = Action::new("turnOff", "").unwrap();

        let result = executor.execute(&action, "").await;
        assert!(matches!(result, Err(BloxError::Interpreter(_))));
    }

    #[tokio::test]
    async fn should_run_once_per_call() {
        let executor = ActionExecutor::new(RecordingInterpreter::exiting_with(Some(3)));
        let action = Action::new("flaky", "").unwrap();

        let _ = executor.execute(&action, "").await;

        assert_eq!(executor.interpreter.programs.lock().unwrap().len(), 1);
    }
}
