//! Interpreter process configuration.

use std::time::Duration;

use serde::Deserialize;

/// How to launch the interpreter that runs action programs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Executable name or path, resolved through `PATH`.
    pub command: String,
    /// Extra arguments; the program itself is always fed on stdin.
    pub args: Vec<String>,
    /// Upper bound on a single run, in seconds.
    pub timeout_secs: u64,
}

impl InterpreterConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            command: "lua".to_string(),
            args: Vec::new(),
            timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_lua_without_args() {
        let config = InterpreterConfig::default();
        assert_eq!(config.command, "lua");
        assert!(config.args.is_empty());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            command = "luajit"
            args = ["-"]
            timeout_secs = 5
        "#;
        let config: InterpreterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.command, "luajit");
        assert_eq!(config.args, ["-"]);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let config: InterpreterConfig = toml::from_str(r#"command = "lua5.4""#).unwrap();
        assert_eq!(config.command, "lua5.4");
        assert_eq!(config.timeout_secs, 30);
    }
}
