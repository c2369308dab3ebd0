//! Trajectory synthesis.
//!
//! Turns a start configuration and a goal (joint or Cartesian) into a timed,
//! limit-checked and collision-checked [`Trajectory`]. All kinematics are
//! delegated to a [`KinematicsProvider`]; nothing is retried.

use serde::{Deserialize, Serialize};

use super::error::{ProviderError, SynthesisError, SynthesisResult};
use super::kinematics::KinematicsProvider;
use super::profile::MotionProfile;
use super::types::{CartesianPose, JointState, Trajectory, TrajectoryKind, lerp3};

/// Millimetres per metre; linear timing runs in command units (mm, mm/s).
const MM_PER_M: f64 = 1000.0;

/// Sampling and checking options for synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisSettings {
    /// Waypoints per trajectory, including both end points.
    pub num_waypoints: usize,
    /// Query the collision predicate at every waypoint.
    pub check_collisions: bool,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            num_waypoints: 50,
            check_collisions: true,
        }
    }
}

/// Interpolation parameter for sample `index` of `count`.
fn alpha(index: usize, count: usize) -> f64 {
    if count > 1 {
        index as f64 / (count - 1) as f64
    } else {
        1.0
    }
}

/// `count` joint samples from `start` to `goal`, end points exact.
pub fn interpolate_joints(start: &JointState, goal: &JointState, count: usize) -> Vec<JointState> {
    let mut samples: Vec<JointState> = (0..count)
        .map(|i| start.lerp(goal, alpha(i, count)))
        .collect();
    if let Some(first) = samples.first_mut() {
        if count > 1 {
            *first = *start;
        }
    }
    if let Some(last) = samples.last_mut() {
        *last = *goal;
    }
    samples
}

/// `count` Cartesian samples, position and orientation interpolated independently.
pub fn interpolate_cartesian(
    start: &CartesianPose,
    goal: &CartesianPose,
    count: usize,
) -> Vec<CartesianPose> {
    let mut samples: Vec<CartesianPose> = (0..count)
        .map(|i| {
            let t = alpha(i, count);
            CartesianPose {
                position: lerp3(&start.position, &goal.position, t),
                orientation: lerp3(&start.orientation, &goal.orientation, t),
            }
        })
        .collect();
    if let Some(last) = samples.last_mut() {
        *last = *goal;
    }
    samples
}

/// Builds trajectories against a kinematics provider.
pub struct TrajectorySynthesizer<P> {
    provider: P,
    settings: SynthesisSettings,
}

impl<P: KinematicsProvider> TrajectorySynthesizer<P> {
    /// Create a synthesizer.
    pub fn new(provider: P, settings: SynthesisSettings) -> Self {
        Self { provider, settings }
    }

    /// The provider in use.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Active settings.
    pub fn settings(&self) -> &SynthesisSettings {
        &self.settings
    }

    /// Joint-space move from `start` to `goal`.
    ///
    /// Duration follows the profile over the largest per-joint delta in radians.
    pub fn joint_trajectory(
        &self,
        start: &JointState,
        goal: &JointState,
        profile: MotionProfile,
    ) -> SynthesisResult<Trajectory> {
        let waypoints = interpolate_joints(start, goal, self.settings.num_waypoints);

        for (index, waypoint) in waypoints.iter().enumerate() {
            self.check_limits(index, waypoint)?;
        }
        if self.settings.check_collisions {
            for (index, waypoint) in waypoints.iter().enumerate() {
                self.check_collision(index, waypoint)?;
            }
        }

        let distance = start.max_abs_delta(goal);
        let duration = profile.duration(distance);
        tracing::debug!(
            waypoints = waypoints.len(),
            duration,
            "synthesized joint trajectory"
        );
        finish(waypoints, duration, TrajectoryKind::Joint)
    }

    /// Straight-line Cartesian move from the pose at `start` to `goal`.
    ///
    /// Each sample is solved with IK seeded by the previous sample's solution.
    /// Duration follows the profile over the straight-line distance in mm.
    pub fn linear_trajectory(
        &self,
        start: &JointState,
        goal: &CartesianPose,
        profile: MotionProfile,
    ) -> SynthesisResult<Trajectory> {
        let start_pose = self
            .provider
            .forward_kinematics(start)
            .map_err(|source| SynthesisError::Provider {
                operation: "forward_kinematics",
                source,
            })?;

        let samples = interpolate_cartesian(&start_pose, goal, self.settings.num_waypoints);
        let mut waypoints = Vec::with_capacity(samples.len());
        let mut seed = *start;

        for (index, sample) in samples.iter().enumerate() {
            let solution = self
                .provider
                .inverse_kinematics(sample, &seed)
                .map_err(|source| SynthesisError::IkFailure {
                    waypoint: index,
                    source,
                })?;
            self.check_limits(index, &solution)?;
            if self.settings.check_collisions {
                self.check_collision(index, &solution)?;
            }
            waypoints.push(solution);
            seed = solution;
        }

        let distance = start_pose.distance_to(goal) * MM_PER_M;
        let duration = profile.duration(distance);
        tracing::debug!(
            waypoints = waypoints.len(),
            distance_mm = distance,
            duration,
            "synthesized linear trajectory"
        );
        let path = samples.iter().map(|pose| pose.position).collect();
        Ok(finish(waypoints, duration, TrajectoryKind::Linear)?.with_cartesian_path(path))
    }

    /// Solve IK for a single target, seeded by `seed`.
    pub fn solve(&self, target: &CartesianPose, seed: &JointState) -> SynthesisResult<JointState> {
        self.provider
            .inverse_kinematics(target, seed)
            .map_err(|source| SynthesisError::UnreachableTarget { source })
    }

    fn check_limits(&self, waypoint: usize, joints: &JointState) -> SynthesisResult<()> {
        let limits = self.provider.joint_limits();
        for (joint, (value, limit)) in joints.iter().zip(limits.iter()).enumerate() {
            if !limit.contains(*value) {
                return Err(SynthesisError::JointLimitViolation {
                    waypoint,
                    joint,
                    value: *value,
                    lower: limit.lower,
                    upper: limit.upper,
                });
            }
        }
        Ok(())
    }

    fn check_collision(&self, waypoint: usize, joints: &JointState) -> SynthesisResult<()> {
        let colliding = self
            .provider
            .is_in_collision(joints)
            .map_err(|source| SynthesisError::Provider {
                operation: "is_in_collision",
                source,
            })?;
        if colliding {
            Err(SynthesisError::CollisionDetected { waypoint })
        } else {
            Ok(())
        }
    }
}

fn finish(
    waypoints: Vec<JointState>,
    duration: f64,
    kind: TrajectoryKind,
) -> SynthesisResult<Trajectory> {
    // Only reachable with a zero sample count, which settings validation rejects.
    Trajectory::new(waypoints, duration, kind).ok_or_else(|| SynthesisError::Provider {
        operation: "interpolate",
        source: ProviderError::Backend("no waypoints sampled".into()),
    })
}
