//! Configuration management module
//!
//! Handles loading, saving, and validation of the execution configuration
//! that decides how often, on how many workers and with what stagger a
//! performance test runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::timing::{ClockKind, WaitTimerConfig};
use crate::{PerfRunError, Result, APP_NAME, CONFIG_FILE};

/// Execution configuration of one performance test
///
/// All times are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Number of concurrent workers
    pub threads: usize,
    /// Delay between the starts of two consecutive workers
    pub ramp_up: u64,
    /// Time after start during which invocations are not recorded
    pub warm_up: u64,
    /// Run duration; 0 disables time-based execution
    pub duration: u64,
    /// Total invocation count; negative disables count-based execution
    pub invocations: i64,
    /// Clocks the tracker measures latencies with
    pub clocks: Vec<ClockKind>,
    /// Pacing between invocations of a worker
    pub wait_timer: WaitTimerConfig,
}

/// Termination policy derived from a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Stop once the duration has elapsed
    Timed { duration: u64 },
    /// Stop once the invocation count is exhausted
    Counted { invocations: u64 },
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            ramp_up: 0,
            warm_up: 0,
            duration: 0,
            invocations: 1,
            clocks: vec![ClockKind::System],
            wait_timer: WaitTimerConfig::None,
        }
    }
}

impl ExecutionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Count-based configuration
    pub fn counted(invocations: i64) -> Self {
        Self {
            invocations,
            ..Self::default()
        }
    }

    /// Time-based configuration
    pub fn timed(duration: u64) -> Self {
        Self {
            duration,
            invocations: -1,
            ..Self::default()
        }
    }

    /// Set the number of workers
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the ramp-up between worker starts
    pub fn with_ramp_up(mut self, ramp_up: u64) -> Self {
        self.ramp_up = ramp_up;
        self
    }

    /// Set the warm-up period
    pub fn with_warm_up(mut self, warm_up: u64) -> Self {
        self.warm_up = warm_up;
        self
    }

    /// Set the run duration
    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    /// Set the invocation count
    pub fn with_invocations(mut self, invocations: i64) -> Self {
        self.invocations = invocations;
        self
    }

    /// Set the wait timer
    pub fn with_wait_timer(mut self, wait_timer: WaitTimerConfig) -> Self {
        self.wait_timer = wait_timer;
        self
    }

    /// Set the clocks
    pub fn with_clocks(mut self, clocks: Vec<ClockKind>) -> Self {
        self.clocks = clocks;
        self
    }

    /// Ramp-up as a [`Duration`]
    pub fn ramp_up_duration(&self) -> Duration {
        Duration::from_millis(self.ramp_up)
    }

    /// Warm-up as a [`Duration`]
    pub fn warm_up_duration(&self) -> Duration {
        Duration::from_millis(self.warm_up)
    }

    /// Termination policy; a positive duration takes precedence over the
    /// invocation count
    pub fn mode(&self) -> Result<ExecutionMode> {
        if self.duration > 0 {
            Ok(ExecutionMode::Timed {
                duration: self.duration,
            })
        } else if self.invocations >= 0 {
            Ok(ExecutionMode::Counted {
                invocations: self.invocations as u64,
            })
        } else {
            Err(PerfRunError::ConfigError(
                "No useful invocation count or duration defined".to_string(),
            ))
        }
    }

    /// Validate the configuration parameters that do not depend on the
    /// termination policy
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(PerfRunError::ConfigError(
                "Thread count must be greater than 0".to_string(),
            ));
        }

        if self.clocks.is_empty() {
            return Err(PerfRunError::ConfigError(
                "At least one clock must be configured".to_string(),
            ));
        }

        if let WaitTimerConfig::Random { min, max } = self.wait_timer {
            if min > max {
                return Err(PerfRunError::ConfigError(format!(
                    "Random wait timer minimum ({} ms) exceeds maximum ({} ms)",
                    min, max
                )));
            }
        }

        Ok(())
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the given file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PerfRunError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            PerfRunError::ConfigError(msg) => {
                PerfRunError::ConfigError(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Save configuration to the given file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PerfRunError::PersistenceError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            PerfRunError::PersistenceError(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/perfrun/perfrun.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            PerfRunError::ConfigError("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ExecutionConfig::default();
        assert_eq!(config.threads, 1);
        assert_eq!(config.ramp_up, 0);
        assert_eq!(config.warm_up, 0);
        assert_eq!(config.mode().unwrap(), ExecutionMode::Counted { invocations: 1 });
    }

    #[test]
    fn test_duration_takes_precedence() {
        let config = ExecutionConfig::counted(10).with_duration(500);
        assert_eq!(config.mode().unwrap(), ExecutionMode::Timed { duration: 500 });
    }

    #[test]
    fn test_no_mode_is_config_error() {
        let config = ExecutionConfig::counted(-1);
        match config.mode() {
            Err(PerfRunError::ConfigError(msg)) => {
                assert!(msg.contains("No useful invocation count or duration"))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_zero_threads() {
        let config = ExecutionConfig::counted(1).with_threads(0);
        assert!(matches!(config.validate(), Err(PerfRunError::ConfigError(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExecutionConfig::from_toml_str(
            r#"
            threads = 4
            ramp_up = 100
            duration = 2000
            wait_timer = { kind = "constant", delay = 5 }
            "#,
        )
        .unwrap();
        assert_eq!(config.threads, 4);
        assert_eq!(config.invocations, 1);
        assert_eq!(config.clocks, vec![ClockKind::System]);
        assert_eq!(config.wait_timer, WaitTimerConfig::Constant { delay: 5 });
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = ExecutionConfig::timed(1500)
            .with_threads(3)
            .with_ramp_up(250)
            .with_warm_up(100)
            .with_wait_timer(WaitTimerConfig::Random { min: 1, max: 3 });

        config.save_to(&path).unwrap();
        let loaded = ExecutionConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_reports_path_on_bad_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "threads = \"many\"").unwrap();
        let err = ExecutionConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_config_file_path() {
        let path = ExecutionConfig::config_file_path().unwrap();
        assert!(path.to_string_lossy().contains("perfrun.toml"));
    }
}
