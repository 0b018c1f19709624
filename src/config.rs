//! Learning parameters and reward table

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Reward for each kind of attempted destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rewards {
    pub step: i32,
    pub wall: i32,
    pub goal: i32,
    pub buff: i32,
    pub debuff: i32,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            step: -1,
            wall: -10,
            goal: 10,
            buff: 5,
            debuff: -5,
        }
    }
}

/// Immutable configuration handed to the agent at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Learning rate α
    pub learning_rate: f64,
    /// Discount factor γ
    pub discount_factor: f64,
    /// Exploration rate ε
    pub exploration_rate: f64,
    /// Steps before an episode is abandoned
    pub max_steps: usize,
    /// Training episodes run by the driver
    pub episodes: usize,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
    /// Exclude the reverse of the last action when selecting
    pub anti_reversal: bool,
    pub rewards: Rewards,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.9,
            exploration_rate: 0.1,
            max_steps: 200,
            episodes: 500,
            seed: None,
            anti_reversal: false,
            rewards: Rewards::default(),
        }
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

impl Config {
    /// Reads a TOML file. Missing keys take their defaults.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("learning_rate", self.learning_rate)?;
        check_unit("discount_factor", self.discount_factor)?;
        check_unit("exploration_rate", self.exploration_rate)?;
        if self.max_steps == 0 {
            return Err(ConfigError::NonPositiveStepLimit);
        }
        if self.episodes == 0 {
            return Err(ConfigError::NonPositiveEpisodes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rewards.wall, -10);
        assert_eq!(config.rewards.goal, 10);
    }

    #[test]
    fn test_rates_outside_unit_interval_rejected() {
        let config = Config {
            learning_rate: 1.5,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange {
                name: "learning_rate",
                ..
            })
        ));

        let config = Config {
            discount_factor: -0.1,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange {
                name: "discount_factor",
                ..
            })
        ));

        let config = Config {
            exploration_rate: f64::NAN,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let config = Config {
            max_steps: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveStepLimit)
        ));

        let config = Config {
            episodes: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveEpisodes)
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "learning_rate = 0.5\nseed = 42\n\n[rewards]\ngoal = 100").unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.learning_rate, 0.5);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.discount_factor, 0.9);
        assert_eq!(config.rewards.goal, 100);
        assert_eq!(config.rewards.step, -1);
    }

    #[test]
    fn test_negative_step_limit_in_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_steps = -3").unwrap();
        assert!(matches!(
            Config::from_toml_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
