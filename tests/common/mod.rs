#![allow(dead_code)]

use std::f64::consts::PI;
use std::sync::Mutex;

use tdl_motion::motion::{
    CartesianPose, JointLimit, JointLimits, JointState, KinematicsProvider, ProviderError,
    ProviderResult,
};

/// Deterministic provider: joints 0-2 are the position in metres and joints
/// 3-5 the orientation in radians. Every call is recorded.
#[derive(Default)]
pub struct FakeArm {
    /// IK fails for targets whose x exceeds this.
    pub max_x: Option<f64>,
    /// Configurations with joint 0 above this collide.
    pub collide_above: Option<f64>,
    pub fk_calls: Mutex<Vec<JointState>>,
    pub ik_seeds: Mutex<Vec<JointState>>,
    pub collision_calls: Mutex<usize>,
}

impl FakeArm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fk_starts(&self) -> Vec<JointState> {
        self.fk_calls.lock().unwrap().clone()
    }

    pub fn seeds(&self) -> Vec<JointState> {
        self.ik_seeds.lock().unwrap().clone()
    }

    pub fn collision_queries(&self) -> usize {
        *self.collision_calls.lock().unwrap()
    }
}

impl KinematicsProvider for FakeArm {
    fn forward_kinematics(&self, joints: &JointState) -> ProviderResult<CartesianPose> {
        self.fk_calls.lock().unwrap().push(*joints);
        let j = joints.as_array();
        Ok(CartesianPose {
            position: [j[0], j[1], j[2]],
            orientation: [j[3], j[4], j[5]],
        })
    }

    fn inverse_kinematics(
        &self,
        target: &CartesianPose,
        seed: &JointState,
    ) -> ProviderResult<JointState> {
        self.ik_seeds.lock().unwrap().push(*seed);
        if self.max_x.is_some_and(|max| target.position[0] > max) {
            return Err(ProviderError::NoSolution);
        }
        let [x, y, z] = target.position;
        let [rx, ry, rz] = target.orientation;
        Ok(JointState::new([x, y, z, rx, ry, rz]))
    }

    fn is_in_collision(&self, joints: &JointState) -> ProviderResult<bool> {
        *self.collision_calls.lock().unwrap() += 1;
        Ok(self.collide_above.is_some_and(|limit| joints[0] > limit))
    }

    fn joint_limits(&self) -> JointLimits {
        [JointLimit::symmetric(2.0 * PI); 6]
    }
}

pub fn deg(value: f64) -> f64 {
    value * (PI / 180.0)
}
