//! Front end for the TDL task-description language.
//!
//! TDL programs are line-oriented: `DEFINE` constants, an optional `HEADER`
//! block, and `GOAL name() { ... }` blocks of `SPAWN Command(args);` lines.
//! This module provides the AST, the parser, pose literal handling and the
//! closed command union the motion planner dispatches on.

/// Abstract syntax tree for parsed TDL programs.
pub mod ast;
/// Classification of raw commands into known command kinds.
pub mod command;
/// Line-oriented parser for TDL source text.
pub mod parser;
/// Pose literal parsing and unit conversion.
pub mod pose;

pub use ast::{ArgValue, Command, Definitions, Goal, ParseOutcome, Program, SkipReason, SkippedLine};
pub use command::{CommandKind, MotionArgs, classify};
pub use parser::{parse_program, parse_program_strict};
pub use pose::{MotionTarget, Pose, PoseParseError, parse_pose};

use thiserror::Error;

/// Convenience result alias for front-end operations.
pub type Result<T> = std::result::Result<T, TdlError>;

/// Errors surfaced by the TDL front end.
#[derive(Debug, Error)]
pub enum TdlError {
    /// A line could not be parsed and strict parsing was requested.
    #[error("invalid TDL syntax at line {line}: {reason}")]
    Syntax {
        /// 1-based source line number.
        line: usize,
        /// Why the line was rejected.
        reason: SkipReason,
    },

    /// A pose literal was not recognized.
    #[error("invalid pose literal: {0}")]
    Pose(#[from] PoseParseError),
}
