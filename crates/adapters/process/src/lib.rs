//! # blox-adapter-process
//!
//! Process adapter — implements the [`Interpreter`](blox_app::ports::Interpreter)
//! port by spawning an external interpreter.
//!
//! ## Responsibilities
//! - Spawn one interpreter process per action run (`lua` unless configured
//!   otherwise)
//! - Pipe the program text to its stdin and capture stdout/stderr
//! - Kill the process when it outlives the configured timeout
//!
//! ## Dependency rule
//! Same as other adapters: depends on `blox-app` and `blox-domain`.

mod config;
mod error;
mod interpreter;

pub use config::InterpreterConfig;
pub use error::ProcessError;
pub use interpreter::ProcessInterpreter;
