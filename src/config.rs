//! Planner configuration.
//!
//! Stored as JSON. Every field has a default, so a partial file (or none at
//! all) is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::motion::synth::SynthesisSettings;
use crate::storage;

/// What to do with `MoveCircular`, which the synthesizer cannot produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircularPolicy {
    /// Record a skipped entry and a warning; the goal continues.
    #[default]
    Skip,
    /// Abort the owning goal.
    Fail,
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Fewer than two samples cannot include both end points.
    #[error("num_waypoints must be at least 2, got {0}")]
    TooFewWaypoints(usize),

    /// Velocity or acceleration is zero, negative or not finite.
    #[error("{field} must be a positive finite number, got {value}")]
    NonPositive {
        /// Offending field name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A zero timeout would fail every provider call.
    #[error("provider_timeout_ms must be positive")]
    ZeroTimeout,
}

/// Configuration for a planning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Waypoints per trajectory, including both end points.
    pub num_waypoints: usize,

    /// Query the provider's collision predicate at every waypoint.
    pub check_collisions: bool,

    /// Velocity used when a motion command has none.
    pub default_velocity: f64,

    /// Acceleration used when a motion command has none.
    pub default_acceleration: f64,

    /// Handling of `MoveCircular`.
    pub circular_policy: CircularPolicy,

    /// Per-call timeout on kinematics provider calls, in milliseconds.
    pub provider_timeout_ms: Option<u64>,

    /// Reference robot model (manufacturer) used by the CLI.
    pub robot: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            num_waypoints: 50,
            check_collisions: true,
            default_velocity: 100.0,
            default_acceleration: 50.0,
            circular_policy: CircularPolicy::Skip,
            provider_timeout_ms: None,
            robot: "generic".into(),
        }
    }
}

impl PlannerConfig {
    /// Check value ranges.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.num_waypoints < 2 {
            return Err(ConfigError::TooFewWaypoints(self.num_waypoints));
        }
        for (field, value) in [
            ("default_velocity", self.default_velocity),
            ("default_acceleration", self.default_acceleration),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.provider_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Sampling options for the synthesizer.
    pub fn synthesis(&self) -> SynthesisSettings {
        SynthesisSettings {
            num_waypoints: self.num_waypoints,
            check_collisions: self.check_collisions,
        }
    }

    /// Provider timeout, when configured.
    pub fn provider_timeout(&self) -> Option<Duration> {
        self.provider_timeout_ms.map(Duration::from_millis)
    }
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<PlannerConfig> {
    let config: PlannerConfig = storage::read_json(path)?;
    config
        .validate()
        .with_context(|| format!("Invalid config in {:?}", path))?;
    Ok(config)
}

/// Write a configuration file atomically.
pub fn write_config(path: &Path, config: &PlannerConfig) -> Result<()> {
    storage::write_json(path, config).context("Failed to write config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let config = PlannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_waypoints, 50);
        assert_eq!(config.circular_policy, CircularPolicy::Skip);
        assert!(config.provider_timeout().is_none());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = PlannerConfig {
            num_waypoints: 1,
            ..PlannerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::TooFewWaypoints(1)));

        let config = PlannerConfig {
            default_acceleration: 0.0,
            ..PlannerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "default_acceleration",
                ..
            })
        ));

        let config = PlannerConfig {
            provider_timeout_ms: Some(0),
            ..PlannerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("planner.json");
        std::fs::write(&path, r#"{"num_waypoints": 20, "circular_policy": "fail"}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.num_waypoints, 20);
        assert_eq!(config.circular_policy, CircularPolicy::Fail);
        assert_eq!(config.default_velocity, 100.0);
        assert_eq!(config.robot, "generic");
    }

    #[test]
    fn write_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("planner.json");
        let config = PlannerConfig {
            check_collisions: false,
            provider_timeout_ms: Some(250),
            robot: "doosan".into(),
            ..PlannerConfig::default()
        };

        write_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn invalid_file_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("planner.json");
        std::fs::write(&path, r#"{"num_waypoints": 0}"#).unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("num_waypoints"));
    }
}
