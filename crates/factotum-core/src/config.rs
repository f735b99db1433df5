//! Tunable simulation parameters.
//!
//! Every field has a default matching the stock game, so a scene file only
//! needs to mention the values it overrides.

use serde::{Deserialize, Serialize};

/// Errors from [`SimConfig::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A parameter that must be strictly positive was zero, negative or NaN.
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    /// A parameter that may be zero was negative or NaN.
    #[error("{field} must be a non-negative finite number, got {value}")]
    Negative { field: &'static str, value: f32 },

    /// Event buffers need room for at least one event.
    #[error("event_capacity must be at least 1")]
    ZeroEventCapacity,
}

/// Simulation parameters shared by every core component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World-space spacing between adjacent grid cells.
    pub grid_size: f32,
    /// Minimum time between two particles emitted by the same extractor.
    pub spawn_interval: f32,
    /// Distance a particle travels per unit of time.
    pub particle_speed: f32,
    /// Redirect and consume radius is `grid_size / capture_divisor`.
    pub capture_divisor: f32,
    /// How far (in degrees) a rotation may stray from a cardinal and still snap to it.
    pub snap_tolerance_degrees: f32,
    /// Starting `remaining_amount` of every mineral deposit.
    pub mineral_amount: f32,
    /// Ring buffer capacity per event kind.
    pub event_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_size: 2.0,
            spawn_interval: 5.0,
            particle_speed: 1.0,
            capture_divisor: 6.0,
            snap_tolerance_degrees: 1.0,
            mineral_amount: 100.0,
            event_capacity: 256,
        }
    }
}

impl SimConfig {
    /// Radius within which a particle snaps onto a belt or enters a processor.
    pub fn capture_radius(&self) -> f32 {
        self.grid_size / self.capture_divisor
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("grid_size", self.grid_size)?;
        positive("capture_divisor", self.capture_divisor)?;
        positive("snap_tolerance_degrees", self.snap_tolerance_degrees)?;
        non_negative("spawn_interval", self.spawn_interval)?;
        non_negative("particle_speed", self.particle_speed)?;
        non_negative("mineral_amount", self.mineral_amount)?;
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid_size, 2.0);
        assert_eq!(config.spawn_interval, 5.0);
        assert!((config.capture_radius() - 2.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn zero_grid_size_rejected() {
        let config = SimConfig {
            grid_size: 0.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "grid_size",
                ..
            })
        ));
    }

    #[test]
    fn nan_speed_rejected() {
        let config = SimConfig {
            particle_speed: f32::NAN,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "particle_speed",
                ..
            })
        ));
    }

    #[test]
    fn zero_event_capacity_rejected() {
        let config = SimConfig {
            event_capacity: 0,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroEventCapacity));
    }

    #[test]
    fn partial_ron_uses_defaults() {
        let config: SimConfig = ron::from_str("(grid_size: 4.0)").unwrap();
        assert_eq!(config.grid_size, 4.0);
        assert_eq!(config.spawn_interval, 5.0);
        assert_eq!(config.event_capacity, 256);
    }
}
