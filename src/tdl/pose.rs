//! Pose literals and their conversion into planner units.
//!
//! TDL expresses Cartesian poses as `PosX(x, y, z, rx, ry, rz)` in millimetres
//! and degrees, and joint poses as `PosJ(j1, ..., j6)` in degrees. The planner
//! works in metres and radians; [`Pose::to_target`] performs that conversion.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

use super::parser::split_top_level;
use crate::motion::types::{CartesianPose, JointState};

/// Number of components every pose literal carries.
pub const POSE_COMPONENTS: usize = 6;

/// Errors produced while parsing a pose literal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoseParseError {
    /// The literal is not a `Name(...)` call.
    #[error("not a pose constructor: '{0}'")]
    Malformed(String),

    /// The constructor name is neither `PosX` nor `PosJ`.
    #[error("unknown pose constructor '{0}'")]
    UnknownConstructor(String),

    /// The constructor did not receive exactly six components.
    #[error("{constructor} expects 6 components, found {found}")]
    WrongArity {
        /// Constructor name.
        constructor: String,
        /// Number of components found.
        found: usize,
    },

    /// A component is not a finite number.
    #[error("invalid pose component '{0}'")]
    InvalidNumber(String),
}

/// Pose literal in TDL units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Pose {
    /// Cartesian pose: position in millimetres, orientation in degrees.
    Cartesian {
        /// X position (mm).
        x: f64,
        /// Y position (mm).
        y: f64,
        /// Z position (mm).
        z: f64,
        /// Rotation about X (deg).
        rx: f64,
        /// Rotation about Y (deg).
        ry: f64,
        /// Rotation about Z (deg).
        rz: f64,
    },
    /// Joint pose, six angles in degrees.
    Joint {
        /// Joint angles (deg).
        angles: [f64; POSE_COMPONENTS],
    },
}

/// Pose converted to planner units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionTarget {
    /// Cartesian target in metres and radians.
    Cartesian(CartesianPose),
    /// Joint target in radians.
    Joint(JointState),
}

const MM_PER_M: f64 = 1000.0;

fn deg_to_rad(degrees: f64) -> f64 {
    degrees * (PI / 180.0)
}

impl Pose {
    /// Convert into metres and radians.
    pub fn to_target(&self) -> MotionTarget {
        match *self {
            Pose::Cartesian { x, y, z, rx, ry, rz } => MotionTarget::Cartesian(CartesianPose {
                position: [x / MM_PER_M, y / MM_PER_M, z / MM_PER_M],
                orientation: [deg_to_rad(rx), deg_to_rad(ry), deg_to_rad(rz)],
            }),
            Pose::Joint { angles } => MotionTarget::Joint(JointState::new(angles.map(deg_to_rad))),
        }
    }
}

/// Parse a `PosX(...)` or `PosJ(...)` literal.
pub fn parse_pose(literal: &str) -> Result<Pose, PoseParseError> {
    let text = literal.trim();
    let malformed = || PoseParseError::Malformed(text.to_string());

    let open = text.find('(').ok_or_else(malformed)?;
    let inner = text[open + 1..].strip_suffix(')').ok_or_else(malformed)?;
    let constructor = text[..open].trim();
    if constructor.is_empty() {
        return Err(malformed());
    }
    if constructor != "PosX" && constructor != "PosJ" {
        return Err(PoseParseError::UnknownConstructor(constructor.to_string()));
    }

    let pieces = split_top_level(inner);
    if pieces.len() != POSE_COMPONENTS {
        return Err(PoseParseError::WrongArity {
            constructor: constructor.to_string(),
            found: pieces.iter().filter(|p| !p.trim().is_empty()).count(),
        });
    }

    let mut values = [0.0; POSE_COMPONENTS];
    for (slot, piece) in values.iter_mut().zip(pieces) {
        let piece = piece.trim();
        *slot = piece
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| PoseParseError::InvalidNumber(piece.to_string()))?;
    }

    Ok(match constructor {
        "PosX" => {
            let [x, y, z, rx, ry, rz] = values;
            Pose::Cartesian { x, y, z, rx, ry, rz }
        }
        _ => Pose::Joint { angles: values },
    })
}
