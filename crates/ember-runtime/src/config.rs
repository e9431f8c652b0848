// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loop configuration, loadable from JSON.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rates and governor modes of a [`GameLoop`](crate::GameLoop).
///
/// Missing JSON fields take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Maximum render frames per second.
    pub render_frame_rate: u32,
    /// Update ticks per second.
    pub update_tick_rate: u32,
    /// Multiplier applied to every delta handed to the game states.
    pub time_speed: f64,
    /// Report every render frame as on time.
    pub render_fixed_step: bool,
    /// Let banked lag shorten render frames.
    pub render_catch_up: bool,
    /// Advance the simulation by exactly one interval per tick.
    pub update_fixed_step: bool,
    /// Run extra update ticks to repay time lost to slow ticks.
    pub update_catch_up: bool,
    /// Upper bound on the update lag that may be banked, in seconds.
    pub max_lag_seconds: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            render_frame_rate: 60,
            update_tick_rate: 40,
            time_speed: 1.0,
            render_fixed_step: false,
            render_catch_up: false,
            update_fixed_step: true,
            update_catch_up: true,
            max_lag_seconds: 0.25,
        }
    }
}

impl LoopConfig {
    /// Load loop configuration from a JSON string. The result is validated.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load loop configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Save loop configuration to a JSON file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks every field is in its valid domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_rate("render_frame_rate", self.render_frame_rate)?;
        validate_rate("update_tick_rate", self.update_tick_rate)?;
        validate_time_speed(self.time_speed)?;
        if !(self.max_lag_seconds.is_finite() && self.max_lag_seconds >= 0.0) {
            return Err(ConfigError::InvalidMaxLag(self.max_lag_seconds));
        }
        Ok(())
    }
}

pub(crate) fn validate_rate(field: &'static str, rate: u32) -> Result<(), ConfigError> {
    if rate == 0 {
        Err(ConfigError::ZeroRate { field })
    } else {
        Ok(())
    }
}

pub(crate) fn validate_time_speed(time_speed: f64) -> Result<(), ConfigError> {
    if time_speed.is_finite() && time_speed >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTimeSpeed(time_speed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_loop() {
        let config = LoopConfig::default();
        assert_eq!(config.render_frame_rate, 60);
        assert_eq!(config.update_tick_rate, 40);
        assert_eq!(config.time_speed, 1.0);
        assert!(!config.render_fixed_step && !config.render_catch_up);
        assert!(config.update_fixed_step && config.update_catch_up);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = LoopConfig::from_json(r#"{ "update_tick_rate": 120, "time_speed": 0.5 }"#)
            .expect("Partial config should parse");
        assert_eq!(config.update_tick_rate, 120);
        assert_eq!(config.time_speed, 0.5);
        assert_eq!(config.render_frame_rate, 60);
    }

    #[test]
    fn invalid_values_fail_fast() {
        assert!(matches!(
            LoopConfig::from_json(r#"{ "render_frame_rate": 0 }"#),
            Err(ConfigError::ZeroRate {
                field: "render_frame_rate"
            })
        ));
        assert!(matches!(
            LoopConfig::from_json(r#"{ "time_speed": -1.0 }"#),
            Err(ConfigError::InvalidTimeSpeed(_))
        ));
        assert!(matches!(
            LoopConfig::from_json(r#"{ "max_lag_seconds": -0.1 }"#),
            Err(ConfigError::InvalidMaxLag(_))
        ));
        assert!(matches!(
            LoopConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_time_speed_is_allowed() {
        assert!(validate_time_speed(0.0).is_ok());
        assert!(validate_time_speed(f64::NAN).is_err());
        assert!(validate_time_speed(f64::INFINITY).is_err());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.json");
        let config = LoopConfig {
            render_frame_rate: 144,
            time_speed: 2.0,
            update_catch_up: false,
            ..LoopConfig::default()
        };

        config.to_file(&path).unwrap();
        let loaded = LoopConfig::from_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = LoopConfig::from_file("/definitely/not/here/loop.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("loop.json"));
    }
}
