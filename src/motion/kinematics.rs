//! Kinematics provider seam.
//!
//! The synthesizer never computes kinematics itself; it asks a
//! [`KinematicsProvider`] for forward/inverse kinematics, collision queries
//! and joint limits. Backends range from the reference [`DhArm`] to fakes used
//! in tests.
//!
//! [`DhArm`]: crate::motion::robot::DhArm

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ProviderError, ProviderResult};
use super::types::{CartesianPose, JointLimits, JointState};

/// Capability the synthesizer needs from a kinematics backend.
pub trait KinematicsProvider {
    /// End-effector pose for a joint configuration.
    fn forward_kinematics(&self, joints: &JointState) -> ProviderResult<CartesianPose>;

    /// Joint configuration reaching `target`, searched from `seed`.
    fn inverse_kinematics(
        &self,
        target: &CartesianPose,
        seed: &JointState,
    ) -> ProviderResult<JointState>;

    /// Whether the configuration is in collision.
    fn is_in_collision(&self, joints: &JointState) -> ProviderResult<bool>;

    /// Per-joint limits in radians.
    fn joint_limits(&self) -> JointLimits;
}

impl<P: KinematicsProvider + ?Sized> KinematicsProvider for &P {
    fn forward_kinematics(&self, joints: &JointState) -> ProviderResult<CartesianPose> {
        (**self).forward_kinematics(joints)
    }

    fn inverse_kinematics(
        &self,
        target: &CartesianPose,
        seed: &JointState,
    ) -> ProviderResult<JointState> {
        (**self).inverse_kinematics(target, seed)
    }

    fn is_in_collision(&self, joints: &JointState) -> ProviderResult<bool> {
        (**self).is_in_collision(joints)
    }

    fn joint_limits(&self) -> JointLimits {
        (**self).joint_limits()
    }
}

impl<P: KinematicsProvider + ?Sized> KinematicsProvider for Arc<P> {
    fn forward_kinematics(&self, joints: &JointState) -> ProviderResult<CartesianPose> {
        (**self).forward_kinematics(joints)
    }

    fn inverse_kinematics(
        &self,
        target: &CartesianPose,
        seed: &JointState,
    ) -> ProviderResult<JointState> {
        (**self).inverse_kinematics(target, seed)
    }

    fn is_in_collision(&self, joints: &JointState) -> ProviderResult<bool> {
        (**self).is_in_collision(joints)
    }

    fn joint_limits(&self) -> JointLimits {
        (**self).joint_limits()
    }
}

impl<P: KinematicsProvider + ?Sized> KinematicsProvider for Box<P> {
    fn forward_kinematics(&self, joints: &JointState) -> ProviderResult<CartesianPose> {
        (**self).forward_kinematics(joints)
    }

    fn inverse_kinematics(
        &self,
        target: &CartesianPose,
        seed: &JointState,
    ) -> ProviderResult<JointState> {
        (**self).inverse_kinematics(target, seed)
    }

    fn is_in_collision(&self, joints: &JointState) -> ProviderResult<bool> {
        (**self).is_in_collision(joints)
    }

    fn joint_limits(&self) -> JointLimits {
        (**self).joint_limits()
    }
}

/// Link index used for contacts with the ground plane.
pub const GROUND_LINK: i32 = -1;

/// A touching pair of bodies reported by a collision backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// First link index, or [`GROUND_LINK`].
    pub link_a: i32,
    /// Second link index, or [`GROUND_LINK`].
    pub link_b: i32,
}

impl Contact {
    /// Contact between two links.
    pub const fn new(link_a: i32, link_b: i32) -> Self {
        Self { link_a, link_b }
    }

    /// Whether this contact counts as a collision.
    ///
    /// Ground contacts and contacts between links whose indices differ by at
    /// most one (neighbours along the chain) never count.
    pub fn is_collision(&self) -> bool {
        if self.link_a == GROUND_LINK || self.link_b == GROUND_LINK {
            return false;
        }
        (self.link_a - self.link_b).abs() > 1
    }
}

/// Whether any contact in the set counts as a collision.
pub fn any_collision<'a>(contacts: impl IntoIterator<Item = &'a Contact>) -> bool {
    contacts.into_iter().any(Contact::is_collision)
}

/// Provider wrapper that bounds every call by a timeout.
///
/// Each call runs on a helper thread; when the budget expires the call is
/// abandoned and reported as [`ProviderError::Timeout`]. The abandoned thread
/// finishes in the background and its result is discarded.
pub struct TimeoutProvider<P> {
    inner: Arc<P>,
    timeout: Duration,
}

impl<P> TimeoutProvider<P>
where
    P: KinematicsProvider + Send + Sync + 'static,
{
    /// Wrap `inner`, bounding each call by `timeout`.
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self::from_arc(Arc::new(inner), timeout)
    }

    /// Wrap a shared provider.
    pub fn from_arc(inner: Arc<P>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Configured per-call budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn call<T, F>(&self, operation: &'static str, f: F) -> ProviderResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&P) -> ProviderResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name(format!("kinematics-{operation}"))
            .spawn(move || {
                // The receiver may be gone after a timeout.
                let _ = tx.send(f(&inner));
            })
            .map_err(|e| ProviderError::Backend(format!("failed to spawn {operation}: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(operation, timeout = ?self.timeout, "kinematics call timed out");
                Err(ProviderError::Timeout {
                    operation,
                    after: self.timeout,
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ProviderError::Backend(format!(
                "{operation} terminated without a result"
            ))),
        }
    }
}

impl<P> KinematicsProvider for TimeoutProvider<P>
where
    P: KinematicsProvider + Send + Sync + 'static,
{
    fn forward_kinematics(&self, joints: &JointState) -> ProviderResult<CartesianPose> {
        let joints = *joints;
        self.call("forward_kinematics", move |p| p.forward_kinematics(&joints))
    }

    fn inverse_kinematics(
        &self,
        target: &CartesianPose,
        seed: &JointState,
    ) -> ProviderResult<JointState> {
        let (target, seed) = (*target, *seed);
        self.call("inverse_kinematics", move |p| {
            p.inverse_kinematics(&target, &seed)
        })
    }

    fn is_in_collision(&self, joints: &JointState) -> ProviderResult<bool> {
        let joints = *joints;
        self.call("is_in_collision", move |p| p.is_in_collision(&joints))
    }

    fn joint_limits(&self) -> JointLimits {
        self.inner.joint_limits()
    }
}
