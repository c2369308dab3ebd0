//! Value types shared by the synthesizer, the planner and kinematics backends.

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Degrees of freedom of every arm this crate plans for.
pub const DOF: usize = 6;

/// Joint configuration in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointState([f64; DOF]);

impl JointState {
    /// Wrap six joint angles (radians).
    pub const fn new(angles: [f64; DOF]) -> Self {
        Self(angles)
    }

    /// The all-zero configuration.
    pub const fn zeros() -> Self {
        Self([0.0; DOF])
    }

    /// Joint angles as an array.
    pub fn as_array(&self) -> &[f64; DOF] {
        &self.0
    }

    /// Iterate joint angles in order.
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.0.iter()
    }

    /// Linear interpolation `self + t * (goal - self)`.
    pub fn lerp(&self, goal: &JointState, t: f64) -> JointState {
        let mut out = [0.0; DOF];
        for (idx, slot) in out.iter_mut().enumerate() {
            *slot = self.0[idx] + t * (goal.0[idx] - self.0[idx]);
        }
        JointState(out)
    }

    /// Largest absolute per-joint difference to `other`.
    pub fn max_abs_delta(&self, other: &JointState) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (b - a).abs())
            .fold(0.0, f64::max)
    }
}

impl Index<usize> for JointState {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl From<[f64; DOF]> for JointState {
    fn from(angles: [f64; DOF]) -> Self {
        Self(angles)
    }
}

/// End-effector pose: position in metres, XYZ Euler orientation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CartesianPose {
    /// Position `(x, y, z)` in metres.
    pub position: [f64; 3],
    /// Orientation `(rx, ry, rz)` in radians.
    pub orientation: [f64; 3],
}

impl CartesianPose {
    /// Euclidean distance between the two positions, in metres.
    pub fn distance_to(&self, other: &CartesianPose) -> f64 {
        self.position
            .iter()
            .zip(other.position.iter())
            .map(|(a, b)| (b - a) * (b - a))
            .sum::<f64>()
            .sqrt()
    }
}

/// Interpolate each component of two triples independently.
pub(crate) fn lerp3(start: &[f64; 3], goal: &[f64; 3], t: f64) -> [f64; 3] {
    [
        start[0] + t * (goal[0] - start[0]),
        start[1] + t * (goal[1] - start[1]),
        start[2] + t * (goal[2] - start[2]),
    ]
}

/// Inclusive lower/upper bound for one joint, radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimit {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

impl JointLimit {
    /// Symmetric limit `[-bound, bound]`.
    pub const fn symmetric(bound: f64) -> Self {
        Self {
            lower: -bound,
            upper: bound,
        }
    }

    /// Whether `value` lies inside the limit.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Per-joint limits for a six-axis arm.
pub type JointLimits = [JointLimit; DOF];

/// How a trajectory was interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryKind {
    /// Interpolated in joint space.
    Joint,
    /// Interpolated along a Cartesian straight line.
    Linear,
}

/// Timed sequence of joint waypoints. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrajectory")]
pub struct Trajectory {
    waypoints: Vec<JointState>,
    duration: f64,
    num_waypoints: usize,
    #[serde(rename = "type")]
    kind: TrajectoryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cartesian_path: Option<Vec<[f64; 3]>>,
}

/// Wire form of [`Trajectory`], checked before it becomes one.
#[derive(Deserialize)]
struct RawTrajectory {
    waypoints: Vec<JointState>,
    duration: f64,
    #[serde(rename = "type")]
    kind: TrajectoryKind,
    #[serde(default)]
    cartesian_path: Option<Vec<[f64; 3]>>,
}

impl TryFrom<RawTrajectory> for Trajectory {
    type Error = String;

    fn try_from(raw: RawTrajectory) -> Result<Self, Self::Error> {
        let mut trajectory = Trajectory::new(raw.waypoints, raw.duration, raw.kind)
            .ok_or_else(|| "trajectory has no waypoints".to_string())?;
        if let Some(path) = raw.cartesian_path {
            if path.len() != trajectory.len() {
                return Err(format!(
                    "cartesian path has {} points for {} waypoints",
                    path.len(),
                    trajectory.len()
                ));
            }
            trajectory = trajectory.with_cartesian_path(path);
        }
        Ok(trajectory)
    }
}

impl Trajectory {
    /// Build a trajectory; returns `None` when `waypoints` is empty.
    pub fn new(waypoints: Vec<JointState>, duration: f64, kind: TrajectoryKind) -> Option<Self> {
        if waypoints.is_empty() {
            return None;
        }
        Some(Self {
            num_waypoints: waypoints.len(),
            waypoints,
            duration,
            kind,
            cartesian_path: None,
        })
    }

    /// Attach the Cartesian positions the waypoints were solved from.
    pub fn with_cartesian_path(mut self, path: Vec<[f64; 3]>) -> Self {
        self.cartesian_path = Some(path);
        self
    }

    /// Joint waypoints in order.
    pub fn waypoints(&self) -> &[JointState] {
        &self.waypoints
    }

    /// Number of waypoints.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// First waypoint.
    pub fn start(&self) -> &JointState {
        &self.waypoints[0]
    }

    /// Last waypoint.
    pub fn end(&self) -> &JointState {
        &self.waypoints[self.waypoints.len() - 1]
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Interpolation kind.
    pub fn kind(&self) -> TrajectoryKind {
        self.kind
    }

    /// Parallel Cartesian positions for linear trajectories.
    pub fn cartesian_path(&self) -> Option<&[[f64; 3]]> {
        self.cartesian_path.as_deref()
    }
}
