//! Motion plan records and aggregation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::PlanError;
use super::types::Trajectory;
use crate::tdl::ArgValue;

/// One entry in a goal's plan: a trajectory, a timed event, or a skipped motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum PlanRecord {
    /// Synthesized motion.
    Motion {
        /// Issuing command type.
        command: String,
        /// Target pose literal after definition resolution.
        target_pose: String,
        /// The timed waypoints.
        trajectory: Trajectory,
    },
    /// Non-motion command with an estimated duration.
    Event {
        /// Command type.
        command: String,
        /// Arguments as parsed.
        args: BTreeMap<String, ArgValue>,
        /// Estimated duration in seconds.
        duration: f64,
    },
    /// Motion the planner could not synthesize but did not treat as fatal.
    Skipped {
        /// Command type.
        command: String,
        /// Why no trajectory was produced.
        reason: String,
    },
}

impl PlanRecord {
    /// Command type that produced the record.
    pub fn command(&self) -> &str {
        match self {
            PlanRecord::Motion { command, .. }
            | PlanRecord::Event { command, .. }
            | PlanRecord::Skipped { command, .. } => command,
        }
    }

    /// Seconds this record contributes.
    pub fn duration(&self) -> f64 {
        match self {
            PlanRecord::Motion { trajectory, .. } => trajectory.duration(),
            PlanRecord::Event { duration, .. } => *duration,
            PlanRecord::Skipped { .. } => 0.0,
        }
    }

    /// Waypoints this record contributes.
    pub fn num_waypoints(&self) -> usize {
        match self {
            PlanRecord::Motion { trajectory, .. } => trajectory.len(),
            _ => 0,
        }
    }

    /// The trajectory, for motion records.
    pub fn trajectory(&self) -> Option<&Trajectory> {
        match self {
            PlanRecord::Motion { trajectory, .. } => Some(trajectory),
            _ => None,
        }
    }

    /// Whether this is a synthesized motion.
    pub fn is_motion(&self) -> bool {
        matches!(self, PlanRecord::Motion { .. })
    }
}

/// Plan for a single goal that was planned to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalPlan {
    /// Goal name.
    pub name: String,
    /// Sum of record durations, seconds.
    pub duration: f64,
    /// Number of commands declared in the goal.
    pub num_commands: usize,
    /// Records in command order.
    pub trajectories: Vec<PlanRecord>,
}

impl GoalPlan {
    /// Start an empty plan for `name`.
    pub fn new(name: impl Into<String>, num_commands: usize) -> Self {
        Self {
            name: name.into(),
            duration: 0.0,
            num_commands,
            trajectories: Vec::new(),
        }
    }

    /// Append a record, updating the goal duration.
    pub fn push(&mut self, record: PlanRecord) {
        self.duration += record.duration();
        self.trajectories.push(record);
    }

    /// Waypoints across all records.
    pub fn num_waypoints(&self) -> usize {
        self.trajectories.iter().map(PlanRecord::num_waypoints).sum()
    }
}

/// Result of one planning pass over a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionPlan {
    /// False iff at least one goal aborted.
    pub success: bool,
    /// Sum of all record durations, seconds.
    pub total_duration: f64,
    /// Sum of all record waypoint counts.
    pub total_waypoints: usize,
    /// Goals that were planned to completion, in declaration order.
    pub goals: Vec<GoalPlan>,
    /// One message per aborted goal, in declaration order.
    pub errors: Vec<String>,
    /// Non-fatal notes.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl MotionPlan {
    /// First planned goal named `name`.
    pub fn goal(&self, name: &str) -> Option<&GoalPlan> {
        self.goals.iter().find(|goal| goal.name == name)
    }

    /// All records across all goals.
    pub fn records(&self) -> impl Iterator<Item = &PlanRecord> {
        self.goals.iter().flat_map(|goal| goal.trajectories.iter())
    }

    /// Number of motion records.
    pub fn motion_count(&self) -> usize {
        self.records().filter(|record| record.is_motion()).count()
    }

    /// Number of event and skipped records.
    pub fn non_motion_count(&self) -> usize {
        self.records().filter(|record| !record.is_motion()).count()
    }
}

/// Accumulates goal outcomes into a [`MotionPlan`].
#[derive(Debug, Default)]
pub struct PlanBuilder {
    goals: Vec<GoalPlan>,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl PlanBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a goal planned to completion.
    pub fn push_goal(&mut self, goal: GoalPlan) {
        self.goals.push(goal);
    }

    /// Record an aborted goal. Its partial records are discarded.
    pub fn push_failure(&mut self, goal: &str, error: &PlanError) {
        self.errors.push(format!("Failed to plan GOAL: {goal}: {error}"));
    }

    /// Record a non-fatal note.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Compute totals and produce the plan.
    pub fn finish(self) -> MotionPlan {
        let total_duration = self
            .goals
            .iter()
            .flat_map(|goal| goal.trajectories.iter())
            .map(PlanRecord::duration)
            .sum();
        let total_waypoints = self.goals.iter().map(GoalPlan::num_waypoints).sum();
        MotionPlan {
            success: self.errors.is_empty(),
            total_duration,
            total_waypoints,
            goals: self.goals,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}
