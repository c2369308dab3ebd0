//! Error types for trajectory synthesis and command planning
//!
//! Each layer has its own `thiserror` enum; the planner converts synthesis
//! and pose errors into a single [`PlanError`] that aborts one goal.

use std::time::Duration;
use thiserror::Error;

use crate::tdl::PoseParseError;

/// Failure reported by a kinematics provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Inverse kinematics found no solution.
    #[error("no inverse kinematics solution")]
    NoSolution,

    /// The call did not finish within the configured timeout.
    #[error("{operation} did not complete within {after:?}")]
    Timeout {
        /// Provider operation name.
        operation: &'static str,
        /// Elapsed budget.
        after: Duration,
    },

    /// Backend-specific failure.
    #[error("kinematics backend failure: {0}")]
    Backend(String),
}

/// Convenience result alias for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Errors raised while synthesizing a single trajectory
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthesisError {
    /// A waypoint puts a joint outside its limits
    #[error(
        "joint {joint} at waypoint {waypoint} is {value:.4} rad, outside [{lower:.4}, {upper:.4}]"
    )]
    JointLimitViolation {
        /// Waypoint index
        waypoint: usize,
        /// Joint index
        joint: usize,
        /// Offending value (rad)
        value: f64,
        /// Lower limit (rad)
        lower: f64,
        /// Upper limit (rad)
        upper: f64,
    },

    /// The collision predicate fired
    #[error("collision detected at waypoint {waypoint}")]
    CollisionDetected {
        /// Waypoint index
        waypoint: usize,
    },

    /// Inverse kinematics failed for a waypoint
    #[error("inverse kinematics failed at waypoint {waypoint}: {source}")]
    IkFailure {
        /// Waypoint index
        waypoint: usize,
        /// Provider failure
        source: ProviderError,
    },

    /// Inverse kinematics found no configuration for a commanded target pose
    #[error("inverse kinematics failed for target pose: {source}")]
    UnreachableTarget {
        /// Provider failure
        source: ProviderError,
    },

    /// Forward kinematics or a collision query failed
    #[error("{operation} failed: {source}")]
    Provider {
        /// Provider operation name
        operation: &'static str,
        /// Provider failure
        source: ProviderError,
    },

    /// Velocity or acceleration is not a positive finite number
    #[error("invalid motion profile: velocity {velocity}, acceleration {acceleration}")]
    InvalidProfile {
        /// Requested velocity
        velocity: f64,
        /// Requested acceleration
        acceleration: f64,
    },
}

/// Convenience result alias for synthesis operations
pub type SynthesisResult<T> = std::result::Result<T, SynthesisError>;

/// Errors that abort planning of the goal they occur in
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// Motion command has no `target_pose` argument
    #[error("{command} has no target_pose")]
    MissingTarget {
        /// Command type
        command: String,
    },

    /// Target pose literal could not be parsed
    #[error("invalid target pose '{literal}': {source}")]
    Pose {
        /// Resolved literal
        literal: String,
        /// Parse failure
        source: PoseParseError,
    },

    /// Trajectory synthesis failed
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// Motion command this planner cannot synthesize
    #[error("{command} is not supported by this planner")]
    Unsupported {
        /// Command type
        command: String,
    },
}

/// Convenience result alias for planning operations
pub type PlanResult<T> = std::result::Result<T, PlanError>;
