//! Configuration loading — TOML file with environment variable overrides.
//!
//! Reads the file named by `BLOX_CONFIG` (default `blox.toml`). Server,
//! logging and interpreter settings all have defaults, but the file itself
//! is required because it is the only source of devices. Environment
//! variables take precedence over file values.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use blox_adapter_process::InterpreterConfig;
use blox_app::registry::Registry;
use blox_domain::action::Action;
use blox_domain::device::Device;
use blox_domain::error::BloxError;
use blox_domain::timer::{Timeout, TimerSpec};

/// Config path used when `BLOX_CONFIG` is not set.
pub const DEFAULT_PATH: &str = "blox.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP/WebSocket server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Interpreter used to run actions.
    pub interpreter: InterpreterConfig,
    /// Devices served by the hub, in file order.
    pub devices: Vec<DeviceConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// One `[[devices]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    /// Defaults to `name`.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Present for timer devices.
    #[serde(default)]
    pub timer: Option<TimerConfig>,
}

/// `[devices.timer]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct TimerConfig {
    /// Seconds to wait, fractions allowed; negative values fail to parse.
    pub timeout_secs: Timeout,
    /// Arm the timer as soon as the daemon is up.
    #[serde(default)]
    pub activate_on_start: bool,
    pub callback: Action,
}

impl Config {
    /// Load configuration from `BLOX_CONFIG` (or `blox.toml`) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed, or
    /// if the result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("BLOX_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file without overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read (including
    /// when it does not exist) and [`ConfigError::Parse`] when it is not
    /// valid configuration TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides looked up through `var` (the process environment in
    /// production).
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("BLOX_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("BLOX_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Some(val) = var("BLOX_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("BLOX_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    /// Check semantic constraints the TOML schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.interpreter.command.trim().is_empty() {
            return Err(ConfigError::Validation(
                "interpreter command must not be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for device in &self.devices {
            if device.name.is_empty() {
                return Err(ConfigError::Validation(
                    "device name must not be empty".to_string(),
                ));
            }
            if !seen.insert(device.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate device name: {}",
                    device.name
                )));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Build the hub registry from the configured devices.
    ///
    /// # Errors
    ///
    /// Returns [`BloxError::Validation`] for empty or duplicate names.
    pub fn build_registry(&self) -> Result<Registry, BloxError> {
        let mut builder = Registry::builder();
        for entry in &self.devices {
            let device = Device::builder()
                .name(&entry.name)
                .display_name(entry.display_name.as_deref().unwrap_or(&entry.name))
                .build()?;
            builder = match &entry.timer {
                Some(timer) => {
                    builder.timer(device, TimerSpec::new(timer.timeout_secs, timer.callback.clone()))
                }
                None => builder.device(device),
            };
        }
        builder.build()
    }

    /// Names of timers to arm at startup.
    pub fn autostart_timers(&self) -> impl Iterator<Item = &str> {
        self.devices
            .iter()
            .filter(|device| device.timer.as_ref().is_some_and(|t| t.activate_on_start))
            .map(|device| device.name.as_str())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8099,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "bloxd=info,blox=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const LAMP: &str = r#"
        [[devices]]
        name = "porch"
        display_name = "Porch"

        [[devices]]
        name = "lamp-timer"
        display_name = "Lamp"

        [devices.timer]
        timeout_secs = 5
        activate_on_start = true
        callback = { name = "turnOff", code = "relay.off()" }
    "#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8099);
        assert_eq!(config.interpreter.command, "lua");
        assert!(config.devices.is_empty());
        assert_eq!(
            config.logging.filter,
            "bloxd=info,blox=info,tower_http=debug"
        );
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.port, 8099);
        assert!(config.devices.is_empty());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 9090

            [logging]
            filter = "debug"

            [interpreter]
            command = "luajit"
            timeout_secs = 3
        "#;
        let config = Config::from_toml(&format!("{toml}{LAMP}")).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.interpreter.command, "luajit");
        assert_eq!(config.interpreter.timeout_secs, 3);
        assert_eq!(config.devices.len(), 2);

        let timer = config.devices[1].timer.as_ref().unwrap();
        assert_eq!(timer.timeout_secs, Timeout::from_secs(5));
        assert!(timer.activate_on_start);
        assert_eq!(timer.callback.name(), "turnOff");
        assert_eq!(timer.callback.code(), "relay.off()");
    }

    #[test]
    fn should_fail_when_file_not_found() {
        let result = Config::from_file("nonexistent-blox.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result = Config::from_toml("invalid {{{");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn should_report_parse_error_when_timer_lacks_callback() {
        let toml = r#"
            [[devices]]
            name = "lamp-timer"

            [devices.timer]
            timeout_secs = 5
        "#;
        assert!(matches!(Config::from_toml(toml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn should_accept_fractional_timer_timeout() {
        let toml = r#"
            [[devices]]
            name = "blink"

            [devices.timer]
            timeout_secs = 2.5
            callback = { name = "toggle", code = "relay.toggle()" }
        "#;
        let registry = Config::from_toml(toml).unwrap().build_registry().unwrap();

        let timer = registry.get("blink").unwrap().as_timer().unwrap();
        assert_eq!(timer.spec().timeout(), std::time::Duration::from_millis(2500));
        assert_eq!(
            serde_json::to_value(timer.snapshot()).unwrap()["timeout"],
            serde_json::json!(2.5)
        );
    }

    #[test]
    fn should_report_parse_error_for_negative_timer_timeout() {
        let toml = r#"
            [[devices]]
            name = "blink"

            [devices.timer]
            timeout_secs = -1
            callback = { name = "toggle", code = "relay.toggle()" }
        "#;
        assert!(matches!(Config::from_toml(toml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_interpreter_command() {
        let mut config = Config::default();
        config.interpreter.command = " ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("interpreter")
        ));
    }

    #[test]
    fn should_reject_duplicate_device_names() {
        let toml = r#"
            [[devices]]
            name = "porch"

            [[devices]]
            name = "porch"
        "#;
        let config = Config::from_toml(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg == "duplicate device name: porch"
        ));
    }

    #[test]
    fn should_reject_empty_device_name() {
        let config = Config::from_toml("[[devices]]\nname = \"\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_valid_config() {
        assert!(Config::from_toml(LAMP).unwrap().validate().is_ok());
    }

    #[test]
    fn should_format_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8099");
    }

    #[test]
    fn should_apply_host_and_port_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("BLOX_HOST", "127.0.0.1"), ("BLOX_PORT", "9000")]));
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn should_apply_bind_override() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("BLOX_BIND", "localhost:7000")]));
        assert_eq!(config.bind_addr(), "localhost:7000");
    }

    #[test]
    fn should_ignore_unparsable_port_override() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("BLOX_PORT", "http")]));
        assert_eq!(config.server.port, 8099);
    }

    #[test]
    fn should_prefer_rust_log_over_blox_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("BLOX_LOG", "warn"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_build_registry_from_devices() {
        let registry = Config::from_toml(LAMP).unwrap().build_registry().unwrap();
        assert_eq!(registry.len(), 2);

        let lamp = registry.get("lamp-timer").unwrap();
        let timer = lamp.as_timer().unwrap();
        assert_eq!(timer.spec().timeout, Timeout::from_secs(5));
        assert_eq!(timer.spec().callback.name(), "turnOff");
        assert!(registry.get("porch").unwrap().as_timer().is_none());
    }

    #[test]
    fn should_default_display_name_to_name() {
        let config = Config::from_toml("[[devices]]\nname = \"garage\"\n").unwrap();
        let registry = config.build_registry().unwrap();
        assert_eq!(registry.get("garage").unwrap().device().display_name, "garage");
    }

    #[test]
    fn should_list_timers_to_activate_on_start() {
        let config = Config::from_toml(LAMP).unwrap();
        let names: Vec<_> = config.autostart_timers().collect();
        assert_eq!(names, ["lamp-timer"]);
    }
}
