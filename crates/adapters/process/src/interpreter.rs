//! [`Interpreter`] implementation backed by `tokio::process`.

use std::io::ErrorKind;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use blox_app::ports::{Interpreter, ScriptOutput};
use blox_domain::error::BloxError;

use crate::config::InterpreterConfig;
use crate::error::ProcessError;

/// Spawns the configured interpreter once per run.
#[derive(Debug, Clone, Default)]
pub struct ProcessInterpreter {
    config: InterpreterConfig,
}

impl ProcessInterpreter {
    #[must_use]
    pub fn new(config: InterpreterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    async fn spawn_and_wait(&self, program: String) -> Result<ScriptOutput, ProcessError> {
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: self.config.command.clone(),
                source,
            })?;

        // Stdin is fed while the output is collected, so neither side can
        // block the other on a full pipe. The timeout covers both.
        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(program.as_bytes()).await {
                // The interpreter may exit without reading all of its input.
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    tracing::debug!("interpreter closed stdin early");
                    Ok(())
                }
                other => other,
            }
        };
        let run = async move { tokio::join!(feed, child.wait_with_output()) };

        let (fed, output) = tokio::time::timeout(self.config.timeout(), run)
            .await
            .map_err(|_| ProcessError::Timeout {
                secs: self.config.timeout_secs,
            })?;
        fed.map_err(ProcessError::Io)?;
        let output = output.map_err(ProcessError::Io)?;

        Ok(ScriptOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl Interpreter for ProcessInterpreter {
    #[tracing::instrument(skip(self, program), fields(command = %self.config.command))]
    async fn run(&self, program: String) -> Result<ScriptOutput, BloxError> {
        tracing::debug!(program_len = program.len(), "spawning interpreter");
        let output = self.spawn_and_wait(program).await.inspect_err(|err| {
            tracing::warn!(error = %err, "interpreter run failed");
        })?;
        tracing::debug!(
            exit_code = ?output.exit_code,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "interpreter exited"
        );
        Ok(output)
    }
}
