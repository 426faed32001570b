//! System configuration parameters
//!
//! All tunable parameters for both nodes, loaded from a JSON file.  Every
//! field has a default, so a missing file or a partial file is fine.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub controller: ControllerConfig,
    pub boiler: BoilerConfig,
}

/// Control node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Control socket ---
    /// Unix socket the line protocol is served on
    pub socket_path: PathBuf,
    /// Permission bits applied to the socket file
    pub socket_mode: u32,
    /// Read timeout for one client request line (milliseconds)
    pub client_timeout_ms: u64,

    // --- Radio ---
    /// Longest wait for radio traffic per cycle (milliseconds)
    pub listen_timeout_ms: u64,
    /// Longest wait for a remote query reply (milliseconds)
    pub query_timeout_ms: u64,
    /// Radio and socket readiness poll interval (milliseconds)
    pub poll_interval_ms: u64,

    // --- Sampling ---
    /// Minimum spacing of local temperature samples; 0 samples every cycle
    pub min_sample_interval_ms: u64,
    /// Append-only telemetry log
    pub telemetry_log: PathBuf,

    // --- Relays ---
    /// GPIO lines of the local relay bank, in channel order
    pub relay_lines: Vec<u32>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/var/lib/autoboiler/autoboiler.socket"),
            socket_mode: 0o777,
            client_timeout_ms: 10_000,
            listen_timeout_ms: 10_000,
            query_timeout_ms: 1_000,
            poll_interval_ms: 10,
            min_sample_interval_ms: 0,
            telemetry_log: PathBuf::from("/var/lib/autoboiler/temperature.jsonl"),
            relay_lines: vec![15, 14],
        }
    }
}

impl ControllerConfig {
    pub fn client_timeout(&self) -> Duration {
        Duration::from_millis(self.client_timeout_ms)
    }

    pub fn listen_timeout(&self) -> Duration {
        Duration::from_millis(self.listen_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn min_sample_interval(&self) -> Duration {
        Duration::from_millis(self.min_sample_interval_ms)
    }
}

/// Remote actuator node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoilerConfig {
    /// Longest wait for radio traffic per cycle (milliseconds)
    pub listen_timeout_ms: u64,
    /// Radio poll interval (milliseconds)
    pub poll_interval_ms: u64,
    /// GPIO lines of the relay bank, in channel order
    pub relay_lines: Vec<u32>,
    /// GPIO lines of the push buttons, in logical-index order
    pub button_lines: Vec<u32>,
    /// Edges closer than this on one line are bounces (milliseconds)
    pub debounce_ms: u64,
}

impl Default for BoilerConfig {
    fn default() -> Self {
        Self {
            listen_timeout_ms: 10_000,
            poll_interval_ms: 10,
            relay_lines: vec![17, 18],
            button_lines: vec![23, 24],
            debounce_ms: 500,
        }
    }
}

impl BoilerConfig {
    pub fn listen_timeout(&self) -> Duration {
        Duration::from_millis(self.listen_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Why a configuration file could not be used.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read config: {e}"),
            Self::Parse(e) => write!(f, "malformed config: {e}"),
            Self::Invalid(problems) => write!(f, "invalid config: {}", problems.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl SystemConfig {
    /// Load from `path`.  A missing file yields the defaults; anything
    /// unreadable, malformed or invalid is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "config: {} not found, using defaults",
                    path.as_ref().display()
                );
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        let problems = config.validate();
        if problems.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    /// Human-readable list of problems; empty when the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let c = &self.controller;
        let b = &self.boiler;

        if c.socket_path.as_os_str().is_empty() {
            problems.push("controller.socket_path is empty".to_owned());
        }
        if c.socket_mode > 0o7777 {
            problems.push(format!(
                "controller.socket_mode {:o} is not a permission mask",
                c.socket_mode
            ));
        }
        for (name, value) in [
            ("controller.poll_interval_ms", c.poll_interval_ms),
            ("controller.listen_timeout_ms", c.listen_timeout_ms),
            ("controller.query_timeout_ms", c.query_timeout_ms),
            ("controller.client_timeout_ms", c.client_timeout_ms),
            ("boiler.poll_interval_ms", b.poll_interval_ms),
            ("boiler.listen_timeout_ms", b.listen_timeout_ms),
        ] {
            if value == 0 {
                problems.push(format!("{name} must be positive"));
            }
        }
        if c.poll_interval_ms > c.listen_timeout_ms {
            problems.push("controller.poll_interval_ms exceeds listen_timeout_ms".to_owned());
        }
        if b.button_lines.len() > usize::from(u8::MAX) + 1 {
            problems.push("boiler.button_lines has more than 256 entries".to_owned());
        }
        // Remote pins are six bits wide.
        if b.relay_lines.len() > 64 {
            problems.push("boiler.relay_lines has more than 64 entries".to_owned());
        }
        problems
    }
}
