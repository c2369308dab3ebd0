//! Motion planning: trajectory synthesis, sequential command planning and
//! plan aggregation, all against an injected [`KinematicsProvider`].

/// Error types for each planning layer.
pub mod error;
/// Kinematics provider trait, contact policy and timeout wrapper.
pub mod kinematics;
/// Plan records and the aggregator.
pub mod plan;
/// Goal-by-goal command planner.
pub mod planner;
/// Trapezoidal velocity profile.
pub mod profile;
/// Reference robot models and the DH backend.
pub mod robot;
/// Joint and Cartesian trajectory synthesis.
pub mod synth;
/// Joint states, poses and trajectories.
pub mod types;

pub use error::{
    PlanError, PlanResult, ProviderError, ProviderResult, SynthesisError, SynthesisResult,
};
pub use kinematics::{Contact, GROUND_LINK, KinematicsProvider, TimeoutProvider, any_collision};
pub use plan::{GoalPlan, MotionPlan, PlanBuilder, PlanRecord};
pub use planner::{CommandPlanner, GoalOutcome, event_duration};
pub use profile::{MotionProfile, trapezoidal_duration};
pub use robot::{DhArm, DhParam, DhSolverSettings, RobotModel};
pub use synth::{SynthesisSettings, TrajectorySynthesizer};
pub use types::{
    CartesianPose, DOF, JointLimit, JointLimits, JointState, Trajectory, TrajectoryKind,
};
