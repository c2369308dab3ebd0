//! Trapezoidal velocity profile timing.

use serde::{Deserialize, Serialize};

use super::error::{SynthesisError, SynthesisResult};

/// Duration of a move of length `distance` under a trapezoidal profile.
///
/// With `t_a = v / a` and `d_a = a * t_a² / 2`, a move longer than `2 * d_a`
/// reaches cruise speed and takes `2 * t_a + (d - 2 * d_a) / v`. Shorter moves
/// never reach `v` and take `2 * sqrt(d / a)`.
pub fn trapezoidal_duration(distance: f64, velocity: f64, acceleration: f64) -> f64 {
    let t_accel = velocity / acceleration;
    let d_accel = 0.5 * acceleration * t_accel * t_accel;

    if 2.0 * d_accel < distance {
        let d_cruise = distance - 2.0 * d_accel;
        2.0 * t_accel + d_cruise / velocity
    } else {
        let t_peak = (distance / acceleration).sqrt();
        2.0 * t_peak
    }
}

/// Validated velocity/acceleration pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionProfile {
    velocity: f64,
    acceleration: f64,
}

impl MotionProfile {
    /// Both values must be positive and finite.
    pub fn new(velocity: f64, acceleration: f64) -> SynthesisResult<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(velocity) && valid(acceleration) {
            Ok(Self {
                velocity,
                acceleration,
            })
        } else {
            Err(SynthesisError::InvalidProfile {
                velocity,
                acceleration,
            })
        }
    }

    /// Peak velocity.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Acceleration.
    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// Duration for a move of `distance` (same length unit as the profile).
    pub fn duration(&self, distance: f64) -> f64 {
        trapezoidal_duration(distance, self.velocity, self.acceleration)
    }
}
