use serde::{Deserialize, Serialize};

use super::ast::{ArgValue, Command};

/// Arguments shared by point-to-point motion commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionArgs {
    /// Raw target pose argument (pose literal or `DEFINE` name).
    pub target: Option<String>,
    /// Requested velocity, when given.
    pub velocity: Option<f64>,
    /// Requested acceleration, when given.
    pub acceleration: Option<f64>,
}

impl MotionArgs {
    fn from_command(command: &Command) -> Self {
        Self {
            target: raw_text(command.arg("target_pose")),
            velocity: command.arg("velocity").and_then(ArgValue::as_f64),
            acceleration: command.arg("acceleration").and_then(ArgValue::as_f64),
        }
    }
}

/// Closed set of command kinds the planner knows how to handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandKind {
    /// Straight-line Cartesian move.
    MoveLinear(MotionArgs),
    /// Joint-interpolated move.
    MoveJoint(MotionArgs),
    /// Circular arc through a via pose.
    MoveCircular {
        /// Raw via pose argument.
        via: Option<String>,
        /// Motion arguments for the arc end point.
        motion: MotionArgs,
    },
    /// Explicit wait; the duration is taken verbatim.
    Delay {
        /// Seconds to wait.
        seconds: f64,
    },
    /// Drive a digital output.
    SetDigitalOutput,
    /// Sample a digital input.
    GetDigitalInput,
    /// Close the gripper.
    GraspObject,
    /// Open the gripper.
    ReleaseObject,
    /// Start the welding arc.
    ArcOn,
    /// Stop the welding arc.
    ArcOff,
    /// End-of-program marker.
    End,
    /// Command type this planner does not know; carried through unchanged.
    Unrecognized {
        /// The original command type tag.
        command_type: String,
    },
}

impl CommandKind {
    /// Whether the command moves the arm.
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            CommandKind::MoveLinear(_) | CommandKind::MoveJoint(_) | CommandKind::MoveCircular { .. }
        )
    }
}

/// Classify a parsed command by its type tag.
pub fn classify(command: &Command) -> CommandKind {
    match command.command_type.as_str() {
        "MoveLinear" => CommandKind::MoveLinear(MotionArgs::from_command(command)),
        "MoveJoint" => CommandKind::MoveJoint(MotionArgs::from_command(command)),
        "MoveCircular" => CommandKind::MoveCircular {
            via: raw_text(command.arg("via_pose")),
            motion: MotionArgs::from_command(command),
        },
        "Delay" => CommandKind::Delay {
            seconds: command
                .arg("duration_sec")
                .or_else(|| command.arg("duration"))
                .and_then(ArgValue::as_f64)
                .unwrap_or(0.0),
        },
        "SetDigitalOutput" => CommandKind::SetDigitalOutput,
        "GetDigitalInput" => CommandKind::GetDigitalInput,
        "GraspObject" => CommandKind::GraspObject,
        "ReleaseObject" => CommandKind::ReleaseObject,
        "ArcOn" => CommandKind::ArcOn,
        "ArcOff" => CommandKind::ArcOff,
        "End" => CommandKind::End,
        other => CommandKind::Unrecognized {
            command_type: other.to_string(),
        },
    }
}

fn raw_text(value: Option<&ArgValue>) -> Option<String> {
    value.and_then(ArgValue::as_text).map(str::to_string)
}
