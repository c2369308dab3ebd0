//! One-call pipeline from TDL text to a motion plan.

use std::time::Duration;
use thiserror::Error;

use crate::config::{ConfigError, PlannerConfig};
use crate::motion::{
    CommandPlanner, JointState, KinematicsProvider, MotionPlan, TimeoutProvider,
};
use crate::tdl::{Program, SkippedLine, TdlError, parse_program};

/// Errors that stop compilation before planning starts.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Strict parsing rejected the source.
    #[error(transparent)]
    Parse(#[from] TdlError),
}

/// Options for a single compilation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Reject the source if any line would be skipped.
    pub strict: bool,
    /// Initial joint cursor; zeros by default.
    pub start: JointState,
}

/// Output of [`compile`].
#[derive(Debug, Clone)]
pub struct Compilation {
    /// The parsed program.
    pub program: Program,
    /// Lines the parser dropped.
    pub skipped: Vec<SkippedLine>,
    /// The plan.
    pub plan: MotionPlan,
    /// Cursor after the last successful motion.
    pub final_joints: JointState,
}

/// Parse `source` and plan it against `provider`.
///
/// Goal failures are reported inside the plan; only configuration and strict
/// parse errors are returned as `Err`.
pub fn compile<P: KinematicsProvider>(
    source: &str,
    provider: P,
    config: &PlannerConfig,
    options: CompileOptions,
) -> Result<Compilation, CompileError> {
    config.validate()?;

    let outcome = parse_program(source);
    for skipped in &outcome.skipped {
        tracing::warn!(line = skipped.line, reason = %skipped.reason, text = %skipped.text, "skipped line");
    }
    if options.strict {
        if let Some(first) = outcome.skipped.first() {
            return Err(TdlError::Syntax {
                line: first.line,
                reason: first.reason,
            }
            .into());
        }
    }

    tracing::info!(
        goals = outcome.program.goals.len(),
        definitions = outcome.program.definitions.len(),
        commands = outcome.program.command_count(),
        "parsed program"
    );

    let planner = CommandPlanner::new(provider, config.clone());
    let (plan, final_joints) = planner.plan_program_from(&outcome.program, options.start);

    Ok(Compilation {
        program: outcome.program,
        skipped: outcome.skipped,
        plan,
        final_joints,
    })
}

/// Box `provider`, wrapping it in a [`TimeoutProvider`] when `timeout` is set.
pub fn bounded_provider<P>(
    provider: P,
    timeout: Option<Duration>,
) -> Box<dyn KinematicsProvider + Send + Sync>
where
    P: KinematicsProvider + Send + Sync + 'static,
{
    match timeout {
        Some(timeout) => Box::new(TimeoutProvider::new(provider, timeout)),
        None => Box::new(provider),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{DhArm, RobotModel};

    const SOURCE: &str = "\
DEFINE Home = PosJ(0, 0, 90, 0, 90, 0);
GOAL Start() {
    SPAWN MoveJoint(target_pose=Home, velocity=30, acceleration=60);
    SPAWN Delay(duration_sec=0.5);
}
stray line
";

    #[test]
    fn lenient_compile_reports_skips_and_plans() {
        let arm = DhArm::new(RobotModel::generic(1.0));
        let result = compile(SOURCE, &arm, &PlannerConfig::default(), CompileOptions::default())
            .expect("compiles");

        assert_eq!(result.skipped.len(), 1);
        assert!(result.plan.success, "{:?}", result.plan.errors);
        assert_eq!(result.plan.total_waypoints, 50);
        assert_eq!(result.final_joints, arm.model().home);
    }

    #[test]
    fn strict_compile_rejects_skipped_lines() {
        let arm = DhArm::new(RobotModel::generic(1.0));
        let options = CompileOptions {
            strict: true,
            ..CompileOptions::default()
        };
        let err = compile(SOURCE, &arm, &PlannerConfig::default(), options).unwrap_err();
        assert!(matches!(err, CompileError::Parse(TdlError::Syntax { line: 6, .. })));
    }

    #[test]
    fn invalid_config_is_rejected_before_parsing() {
        let arm = DhArm::new(RobotModel::generic(1.0));
        let config = PlannerConfig {
            num_waypoints: 0,
            ..PlannerConfig::default()
        };
        let err = compile(SOURCE, &arm, &config, CompileOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::Config(ConfigError::TooFewWaypoints(0))));
    }

    #[test]
    fn bounded_provider_plans_like_the_bare_backend() {
        let provider = bounded_provider(
            DhArm::new(RobotModel::generic(1.0)),
            Some(Duration::from_secs(5)),
        );
        let result = compile(
            SOURCE,
            provider,
            &PlannerConfig::default(),
            CompileOptions::default(),
        )
        .unwrap();
        assert!(result.plan.success);
    }
}
