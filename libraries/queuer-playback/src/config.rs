/// Queue configuration
use crate::error::{QueueError, Result};
use crate::types::ShufflePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-queue settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Fraction of listeners that must vote to force next/previous, in (0, 1]
    #[serde(default = "default_vote_threshold")]
    pub vote_threshold: f64,

    /// Delay before advancing after the sink reports a playback error
    #[serde(default = "default_error_retry_delay_ms")]
    pub error_retry_delay_ms: u64,

    /// What shuffling does with the current song
    #[serde(default)]
    pub shuffle_policy: ShufflePolicy,

    /// Pending commands per queue before senders wait
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Events buffered per subscriber before it lags
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl QueueConfig {
    pub fn error_retry_delay(&self) -> Duration {
        Duration::from_millis(self.error_retry_delay_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.vote_threshold > 0.0 && self.vote_threshold <= 1.0) {
            return Err(QueueError::Config(format!(
                "vote_threshold must be in (0, 1], got {}",
                self.vote_threshold
            )));
        }
        if self.mailbox_capacity == 0 {
            return Err(QueueError::Config(
                "mailbox_capacity must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(QueueError::Config(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            vote_threshold: default_vote_threshold(),
            error_retry_delay_ms: default_error_retry_delay_ms(),
            shuffle_policy: ShufflePolicy::default(),
            mailbox_capacity: default_mailbox_capacity(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct QueuerConfig {
    #[serde(default)]
    pub queue: QueueConfig,
}

impl QueuerConfig {
    /// Load configuration from `queuer.toml` (if present) and environment
    pub fn load() -> Result<Self> {
        let path = PathBuf::from("queuer.toml");
        Self::build(path.exists().then_some(path.as_path()))
    }

    /// Load configuration from a specific file, then environment
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::build(Some(path))
    }

    fn build(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path));
        }

        // Override with environment variables, e.g. QUEUER_QUEUE__VOTE_THRESHOLD=0.6
        settings = settings.add_source(
            config::Environment::with_prefix("QUEUER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| QueueError::Config(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| QueueError::Config(e.to_string()))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.queue.validate()
    }
}

// Default values
fn default_vote_threshold() -> f64 {
    0.5
}

fn default_error_retry_delay_ms() -> u64 {
    2000
}

fn default_mailbox_capacity() -> usize {
    64
}

fn default_event_capacity() -> usize {
    128
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = QueueConfig::default();
        assert!((config.vote_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.error_retry_delay(), Duration::from_secs(2));
        assert_eq!(config.shuffle_policy, ShufflePolicy::InPlace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        for threshold in [0.0, -0.1, 1.5, f64::NAN] {
            let config = QueueConfig {
                vote_threshold: threshold,
                ..QueueConfig::default()
            };
            assert!(matches!(config.validate(), Err(QueueError::Config(_))));
        }
    }

    #[test]
    fn rejects_zero_capacity() {
        let config = QueueConfig {
            mailbox_capacity: 0,
            ..QueueConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_partial_file_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[queue]\nvote_threshold = 0.75\nshuffle_policy = \"current_to_front\"").unwrap();

        let config = QueuerConfig::load_from(file.path()).unwrap();
        assert!((config.queue.vote_threshold - 0.75).abs() < f64::EPSILON);
        assert_eq!(config.queue.shuffle_policy, ShufflePolicy::CurrentToFront);
        assert_eq!(config.queue.error_retry_delay_ms, 2000);
        assert_eq!(config.queue.mailbox_capacity, 64);
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[queue]\nvote_threshold = 2.0").unwrap();

        assert!(matches!(
            QueuerConfig::load_from(file.path()),
            Err(QueueError::Config(_))
        ));
    }
}
