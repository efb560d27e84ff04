//! Interpreter port — runs a script program in an external process.
//!
//! The application layer only knows that a program text goes in and an exit
//! status plus captured output streams come out. Which interpreter binary is
//! spawned, and how, is the adapter's business.

use std::future::Future;

use blox_domain::error::BloxError;

/// Outcome of one interpreter run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptOutput {
    /// Process exit code, `None` when it was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutput {
    /// `true` when the process exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a program text through an external interpreter.
pub trait Interpreter {
    /// Spawn one interpreter process, feed it `program` on stdin and wait for
    /// it to exit.
    ///
    /// A non-zero exit is **not** an error at this level; it is reported in
    /// the returned [`ScriptOutput`]. Errors mean the program could not be
    /// run at all.
    fn run(&self, program: String) -> impl Future<Output = Result<ScriptOutput, BloxError>> + Send;
}

impl<T: Interpreter + Send + Sync> Interpreter for std::sync::Arc<T> {
    fn run(&self, program: String) -> impl Future<Output = Result<ScriptOutput, BloxError>> + Send {
        (**self).run(program)
    }
}
