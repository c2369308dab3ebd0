//! Reference robot models and a Denavit–Hartenberg kinematics backend.
//!
//! [`DhArm`] is a self-contained [`KinematicsProvider`]: forward kinematics
//! from standard DH parameters, damped-least-squares inverse kinematics seeded
//! by the caller, and a capsule self-collision check whose contacts are
//! filtered through [`Contact::is_collision`].

use std::f64::consts::PI;

use nalgebra::{Isometry3, Matrix6, Point3, Translation3, UnitQuaternion, Vector3, Vector6};
use serde::{Deserialize, Serialize};

use super::error::{ProviderError, ProviderResult};
use super::kinematics::{Contact, GROUND_LINK, KinematicsProvider, any_collision};
use super::types::{CartesianPose, DOF, JointLimit, JointLimits, JointState};

/// One row of standard DH parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DhParam {
    /// Link length along x (m).
    pub a: f64,
    /// Link twist about x (rad).
    pub alpha: f64,
    /// Link offset along z (m).
    pub d: f64,
    /// Constant added to the joint angle (rad).
    pub theta_offset: f64,
}

impl DhParam {
    const fn new(a: f64, alpha: f64, d: f64) -> Self {
        Self {
            a,
            alpha,
            d,
            theta_offset: 0.0,
        }
    }

    fn transform(&self, q: f64) -> Isometry3<f64> {
        Isometry3::rotation(Vector3::z() * (q + self.theta_offset))
            * Isometry3::translation(self.a, 0.0, self.d)
            * Isometry3::rotation(Vector3::x() * self.alpha)
    }
}

/// Kinematic description of a six-axis arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotModel {
    /// Model name.
    pub name: String,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Joint limits (rad).
    pub joint_limits: JointLimits,
    /// Home configuration (rad).
    pub home: JointState,
    /// DH parameter table, base to flange.
    pub dh: [DhParam; DOF],
    /// Nominal reach (m).
    pub max_reach: f64,
}

impl RobotModel {
    /// Doosan H2017 (20 kg payload, 1.7 m reach).
    pub fn doosan_h2017() -> Self {
        Self {
            name: "H2017".into(),
            manufacturer: "Doosan".into(),
            joint_limits: [JointLimit::symmetric(PI); DOF],
            home: JointState::zeros(),
            dh: [
                DhParam::new(0.0, PI / 2.0, 0.151),
                DhParam::new(0.409, 0.0, 0.0),
                DhParam::new(0.367, 0.0, 0.0),
                DhParam::new(0.0, PI / 2.0, 0.124),
                DhParam::new(0.0, -PI / 2.0, 0.124),
                DhParam::new(0.0, 0.0, 0.126),
            ],
            max_reach: 1.7,
        }
    }

    /// Universal Robots UR10e (12.5 kg payload, 1.3 m reach).
    pub fn ur10e() -> Self {
        Self {
            name: "UR10e".into(),
            manufacturer: "Universal Robots".into(),
            joint_limits: [JointLimit::symmetric(2.0 * PI); DOF],
            home: JointState::new([0.0, -PI / 2.0, 0.0, -PI / 2.0, 0.0, 0.0]),
            dh: [
                DhParam::new(0.0, PI / 2.0, 0.1807),
                DhParam::new(-0.6127, 0.0, 0.0),
                DhParam::new(-0.57155, 0.0, 0.0),
                DhParam::new(0.0, PI / 2.0, 0.17415),
                DhParam::new(0.0, -PI / 2.0, 0.11985),
                DhParam::new(0.0, 0.0, 0.11655),
            ],
            max_reach: 1.3,
        }
    }

    /// Generic arm whose link lengths scale with `reach_m`.
    pub fn generic(reach_m: f64) -> Self {
        let link = reach_m / 3.0;
        Self {
            name: "Generic6DOF".into(),
            manufacturer: "Generic".into(),
            joint_limits: [JointLimit::symmetric(PI); DOF],
            home: JointState::new([0.0, 0.0, PI / 2.0, 0.0, PI / 2.0, 0.0]),
            dh: [
                DhParam::new(0.0, PI / 2.0, link * 0.3),
                DhParam::new(link, 0.0, 0.0),
                DhParam::new(link, 0.0, 0.0),
                DhParam::new(0.0, PI / 2.0, link * 0.3),
                DhParam::new(0.0, -PI / 2.0, link * 0.2),
                DhParam::new(0.0, 0.0, link * 0.2),
            ],
            max_reach: reach_m,
        }
    }

    /// Look up a model by manufacturer and model name, falling back to the
    /// generic arm.
    pub fn lookup(manufacturer: &str, model: Option<&str>) -> Self {
        let manufacturer = manufacturer.to_lowercase();
        let model = model.map(str::to_lowercase).unwrap_or_default();
        let by_default = model.is_empty();

        match manufacturer.as_str() {
            "doosan" if by_default || model.contains("h2017") || model.contains("h-2017") => {
                Self::doosan_h2017()
            }
            "universal" | "universal robots" if by_default || model.contains("ur10e") => {
                Self::ur10e()
            }
            "generic" => Self::generic(1.0),
            _ => {
                tracing::warn!(
                    "No specific model for {} {}, using generic model",
                    manufacturer,
                    model
                );
                Self::generic(1.0)
            }
        }
    }
}

/// Tuning for the numeric IK solver and collision check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DhSolverSettings {
    /// Maximum solver iterations per IK call.
    pub max_iterations: usize,
    /// Pose error norm treated as converged.
    pub tolerance: f64,
    /// Damping factor for the least-squares step.
    pub damping: f64,
    /// Link capsule radius (m) used by the collision check.
    pub link_radius: f64,
}

impl Default for DhSolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-6,
            damping: 0.01,
            link_radius: 0.025,
        }
    }
}

/// [`KinematicsProvider`] backed by a [`RobotModel`].
#[derive(Debug, Clone)]
pub struct DhArm {
    model: RobotModel,
    settings: DhSolverSettings,
}

const JACOBIAN_STEP: f64 = 1e-6;

impl DhArm {
    /// Backend with default solver settings.
    pub fn new(model: RobotModel) -> Self {
        Self::with_settings(model, DhSolverSettings::default())
    }

    /// Backend with explicit solver settings.
    pub fn with_settings(model: RobotModel, settings: DhSolverSettings) -> Self {
        Self { model, settings }
    }

    /// The underlying model.
    pub fn model(&self) -> &RobotModel {
        &self.model
    }

    fn flange(&self, joints: &JointState) -> Isometry3<f64> {
        self.model
            .dh
            .iter()
            .zip(joints.iter())
            .fold(Isometry3::identity(), |acc, (param, q)| {
                acc * param.transform(*q)
            })
    }

    /// Base origin followed by every frame origin along the chain.
    fn frame_origins(&self, joints: &JointState) -> [Point3<f64>; DOF + 1] {
        let mut origins = [Point3::origin(); DOF + 1];
        let mut frame = Isometry3::identity();
        for (idx, (param, q)) in self.model.dh.iter().zip(joints.iter()).enumerate() {
            frame *= param.transform(*q);
            origins[idx + 1] = frame * Point3::origin();
        }
        origins
    }

    /// Every touching pair among the link capsules and the ground plane.
    pub fn contacts(&self, joints: &JointState) -> Vec<Contact> {
        let origins = self.frame_origins(joints);
        let reach = 2.0 * self.settings.link_radius;
        let mut contacts = Vec::new();

        for a in 0..DOF {
            if origins[a + 1].z < -self.settings.link_radius {
                contacts.push(Contact::new(GROUND_LINK, a as i32));
            }
            for b in (a + 1)..DOF {
                let gap = segment_distance(&origins[a], &origins[a + 1], &origins[b], &origins[b + 1]);
                if gap < reach {
                    contacts.push(Contact::new(a as i32, b as i32));
                }
            }
        }
        contacts
    }

    fn jacobian(&self, joints: &JointState, current: &Isometry3<f64>) -> Matrix6<f64> {
        let mut jacobian = Matrix6::zeros();
        for col in 0..DOF {
            let mut bumped = *joints.as_array();
            bumped[col] += JACOBIAN_STEP;
            let moved = self.flange(&JointState::new(bumped));
            let delta = pose_error(current, &moved) / JACOBIAN_STEP;
            jacobian.set_column(col, &delta);
        }
        jacobian
    }
}

fn to_joints(q: &Vector6<f64>) -> JointState {
    let mut angles = [0.0; DOF];
    angles.copy_from_slice(q.as_slice());
    JointState::new(angles)
}

fn to_isometry(pose: &CartesianPose) -> Isometry3<f64> {
    let [x, y, z] = pose.position;
    let [rx, ry, rz] = pose.orientation;
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_euler_angles(rx, ry, rz),
    )
}

/// Twist taking `from` to `to`: translation then rotation vector.
fn pose_error(from: &Isometry3<f64>, to: &Isometry3<f64>) -> Vector6<f64> {
    let dp = to.translation.vector - from.translation.vector;
    let dr = (to.rotation * from.rotation.inverse()).scaled_axis();
    Vector6::new(dp.x, dp.y, dp.z, dr.x, dr.y, dr.z)
}

/// Minimum distance between segments `p1-q1` and `p2-q2`.
fn segment_distance(p1: &Point3<f64>, q1: &Point3<f64>, p2: &Point3<f64>, q2: &Point3<f64>) -> f64 {
    const EPS: f64 = 1e-12;
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(&d1);
    let e = d2.dot(&d2);
    let f = d2.dot(&r);

    let (s, t) = if a <= EPS && e <= EPS {
        (0.0, 0.0)
    } else if a <= EPS {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= EPS {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let s = if denom > EPS {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    ((*p1 + d1 * s) - (*p2 + d2 * t)).norm()
}

impl KinematicsProvider for DhArm {
    fn forward_kinematics(&self, joints: &JointState) -> ProviderResult<CartesianPose> {
        let flange = self.flange(joints);
        let (rx, ry, rz) = flange.rotation.euler_angles();
        let t = flange.translation.vector;
        Ok(CartesianPose {
            position: [t.x, t.y, t.z],
            orientation: [rx, ry, rz],
        })
    }

    fn inverse_kinematics(
        &self,
        target: &CartesianPose,
        seed: &JointState,
    ) -> ProviderResult<JointState> {
        let goal = to_isometry(target);
        let damping_sq = self.settings.damping * self.settings.damping;
        let mut q = Vector6::from_column_slice(seed.as_array());

        for _ in 0..self.settings.max_iterations {
            let joints = to_joints(&q);
            let current = self.flange(&joints);
            let error = pose_error(&current, &goal);
            if error.norm() < self.settings.tolerance {
                return Ok(joints);
            }

            let jacobian = self.jacobian(&joints, &current);
            let jjt = jacobian * jacobian.transpose() + Matrix6::identity() * damping_sq;
            let step = jjt
                .lu()
                .solve(&error)
                .ok_or_else(|| ProviderError::Backend("singular damped Jacobian".into()))?;
            q += jacobian.transpose() * step;
        }

        Err(ProviderError::NoSolution)
    }

    fn is_in_collision(&self, joints: &JointState) -> ProviderResult<bool> {
        Ok(any_collision(&self.contacts(joints)))
    }

    fn joint_limits(&self) -> JointLimits {
        self.model.joint_limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64], tol: f64) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < tol)
    }

    #[test]
    fn generic_zero_configuration_reaches_forward() {
        let arm = DhArm::new(RobotModel::generic(1.0));
        let pose = arm.forward_kinematics(&JointState::zeros()).unwrap();
        let third = 1.0 / 3.0;
        // Two planar links along x, then the wrist offsets.
        assert!(close(
            &pose.position,
            &[2.0 * third, -0.5 * third, 0.1 * third],
            1e-9
        ));
    }

    #[test]
    fn ik_recovers_forward_pose() {
        let arm = DhArm::new(RobotModel::generic(1.0));
        let reference = JointState::new([0.3, -0.4, 0.6, 0.2, 0.5, -0.3]);
        let target = arm.forward_kinematics(&reference).unwrap();
        let seed = JointState::new(reference.as_array().map(|q| q + 0.05));

        let solved = arm.inverse_kinematics(&target, &seed).expect("ik converges");
        let reached = arm.forward_kinematics(&solved).unwrap();
        assert!(close(&reached.position, &target.position, 1e-4));
        assert!(close(&reached.orientation, &target.orientation, 1e-3));
    }

    #[test]
    fn unreachable_target_fails() {
        let arm = DhArm::new(RobotModel::generic(1.0));
        let target = CartesianPose {
            position: [5.0, 0.0, 0.0],
            orientation: [0.0, 0.0, 0.0],
        };
        assert!(arm.inverse_kinematics(&target, &JointState::zeros()).is_err());
    }

    #[test]
    fn catalog_configurations_are_collision_free() {
        for model in [
            RobotModel::doosan_h2017(),
            RobotModel::ur10e(),
            RobotModel::generic(1.0),
        ] {
            let home = model.home;
            let arm = DhArm::new(model);
            assert!(!arm.is_in_collision(&JointState::zeros()).unwrap());
            assert!(!arm.is_in_collision(&home).unwrap());
        }
    }

    #[test]
    fn folded_wrist_collides() {
        let arm = DhArm::new(RobotModel::generic(1.0));
        // Elbow folded fully back puts link 2 on top of link 0's column.
        let folded = JointState::new([0.0, PI / 2.0, PI, 0.0, 0.0, 0.0]);
        let contacts = arm.contacts(&folded);
        assert!(contacts.iter().any(|c| c.is_collision()), "{contacts:?}");
        assert!(arm.is_in_collision(&folded).unwrap());
    }

    #[test]
    fn lookup_falls_back_to_generic() {
        assert_eq!(RobotModel::lookup("Doosan", None).name, "H2017");
        assert_eq!(RobotModel::lookup("universal", Some("UR10e")).name, "UR10e");
        assert_eq!(RobotModel::lookup("acme", Some("x1")).name, "Generic6DOF");
    }

    #[test]
    fn segment_distance_handles_parallel_and_crossing() {
        let o = Point3::origin();
        let x = Point3::new(1.0, 0.0, 0.0);
        let above = Point3::new(0.0, 0.0, 1.0);
        let above_x = Point3::new(1.0, 0.0, 1.0);
        assert!((segment_distance(&o, &x, &above, &above_x) - 1.0).abs() < 1e-12);

        let cross_a = Point3::new(0.5, -1.0, 0.0);
        let cross_b = Point3::new(0.5, 1.0, 0.0);
        assert!(segment_distance(&o, &x, &cross_a, &cross_b) < 1e-12);
    }
}
