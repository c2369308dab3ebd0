//! TDL Motion – compiles robot task descriptions into motion plans
//!
//! This crate turns TDL programs (`DEFINE` constants, `GOAL` blocks of
//! `SPAWN` commands) into time-parameterized, collision-checked joint-space
//! plans:
//! - A lenient line parser that reports every dropped line
//! - Single-level definition resolution and exact pose unit conversion
//! - A sequential planner that threads one joint cursor through all goals
//! - Joint and Cartesian trajectory synthesis with trapezoidal timing
//! - An injected kinematics provider, with a DH reference backend
//! - JSON configuration and plan reports

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// One-call parse and plan pipeline
pub mod compile;
/// Planner configuration
pub mod config;
/// Trajectory synthesis, planning and aggregation
pub mod motion;
/// Persisted plan reports
pub mod report;
/// TDL front end
pub mod tdl;

mod storage;

// Re-export key types for convenience
pub use compile::{Compilation, CompileError, CompileOptions, bounded_provider, compile};
pub use config::{CircularPolicy, PlannerConfig};
pub use motion::{CommandPlanner, KinematicsProvider, MotionPlan};
pub use tdl::{Program, parse_program};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
