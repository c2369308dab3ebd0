//! Sequential command planner.
//!
//! Walks goals and their commands in declaration order and threads a joint
//! cursor through them. The cursor is passed by value into each goal and
//! handed back with the outcome, so it carries across goal boundaries and
//! keeps whatever motion an aborted goal completed before it failed.

use super::error::{PlanError, PlanResult};
use super::kinematics::KinematicsProvider;
use super::plan::{GoalPlan, MotionPlan, PlanBuilder, PlanRecord};
use super::profile::MotionProfile;
use super::synth::TrajectorySynthesizer;
use super::types::{JointState, Trajectory};
use crate::config::{CircularPolicy, PlannerConfig};
use crate::tdl::{Command, CommandKind, Goal, MotionArgs, MotionTarget, Program, classify, parse_pose};

/// Record label for a joint-space move, including MoveLinear's joint-pose fallback.
const JOINT_MOVE: &str = "MoveJoint";

/// Estimated duration of a non-motion command, in seconds.
pub fn event_duration(kind: &CommandKind) -> f64 {
    match kind {
        CommandKind::Delay { seconds } => *seconds,
        CommandKind::SetDigitalOutput | CommandKind::GetDigitalInput => 0.01,
        CommandKind::GraspObject | CommandKind::ReleaseObject => 0.5,
        CommandKind::ArcOn | CommandKind::ArcOff => 0.1,
        _ => 0.0,
    }
}

/// Result of planning one goal.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalOutcome {
    /// The goal plan, or the error that aborted it.
    pub result: PlanResult<GoalPlan>,
    /// Cursor after the last successful motion.
    pub cursor: JointState,
    /// Non-fatal notes raised while planning.
    pub warnings: Vec<String>,
}

/// Plans programs against a kinematics provider.
pub struct CommandPlanner<P> {
    synth: TrajectorySynthesizer<P>,
    config: PlannerConfig,
}

impl<P: KinematicsProvider> CommandPlanner<P> {
    /// Create a planner. The configuration is assumed valid.
    pub fn new(provider: P, config: PlannerConfig) -> Self {
        Self {
            synth: TrajectorySynthesizer::new(provider, config.synthesis()),
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The underlying synthesizer.
    pub fn synthesizer(&self) -> &TrajectorySynthesizer<P> {
        &self.synth
    }

    /// Plan a program starting from the zero configuration.
    pub fn plan_program(&self, program: &Program) -> MotionPlan {
        self.plan_program_from(program, JointState::zeros()).0
    }

    /// Plan a program from `start`, returning the plan and the final cursor.
    pub fn plan_program_from(&self, program: &Program, start: JointState) -> (MotionPlan, JointState) {
        let mut builder = PlanBuilder::new();
        let mut cursor = start;

        for goal in &program.goals {
            let outcome = self.plan_goal(program, goal, cursor);
            cursor = outcome.cursor;
            for warning in outcome.warnings {
                builder.warn(warning);
            }
            match outcome.result {
                Ok(plan) => {
                    tracing::info!(
                        goal = %goal.name,
                        records = plan.trajectories.len(),
                        duration = plan.duration,
                        "planned goal"
                    );
                    builder.push_goal(plan);
                }
                Err(err) => {
                    tracing::warn!(goal = %goal.name, error = %err, "goal aborted");
                    builder.push_failure(&goal.name, &err);
                }
            }
        }

        let plan = builder.finish();
        tracing::info!(
            success = plan.success,
            goals = plan.goals.len(),
            errors = plan.errors.len(),
            total_duration = plan.total_duration,
            total_waypoints = plan.total_waypoints,
            "planning complete"
        );
        (plan, cursor)
    }

    /// Plan one goal from `start`.
    ///
    /// Stops at the first failing command; later commands in the goal are not
    /// attempted.
    pub fn plan_goal(&self, program: &Program, goal: &Goal, start: JointState) -> GoalOutcome {
        let mut cursor = start;
        let mut warnings = Vec::new();
        let mut plan = GoalPlan::new(goal.name.clone(), goal.commands.len());

        for command in &goal.commands {
            match self.plan_command(program, goal, command, cursor, &mut warnings) {
                Ok(record) => {
                    if let Some(trajectory) = record.trajectory() {
                        cursor = *trajectory.end();
                    }
                    plan.push(record);
                }
                Err(err) => {
                    return GoalOutcome {
                        result: Err(err),
                        cursor,
                        warnings,
                    };
                }
            }
        }

        GoalOutcome {
            result: Ok(plan),
            cursor,
            warnings,
        }
    }

    fn plan_command(
        &self,
        program: &Program,
        goal: &Goal,
        command: &Command,
        cursor: JointState,
        warnings: &mut Vec<String>,
    ) -> PlanResult<PlanRecord> {
        let kind = classify(command);
        tracing::debug!(
            goal = %goal.name,
            command = %command.command_type,
            line = command.line,
            "planning command"
        );

        match &kind {
            CommandKind::MoveLinear(args) => {
                let (literal, target) = resolve_target(program, command, args)?;
                let profile = self.profile(args)?;
                match target {
                    MotionTarget::Cartesian(pose) => {
                        let trajectory = self.synth.linear_trajectory(&cursor, &pose, profile)?;
                        Ok(motion_record(&command.command_type, literal, trajectory))
                    }
                    MotionTarget::Joint(joints) => {
                        tracing::warn!(
                            goal = %goal.name,
                            line = command.line,
                            "MoveLinear with a joint pose, planning a joint move"
                        );
                        let trajectory = self.synth.joint_trajectory(&cursor, &joints, profile)?;
                        Ok(motion_record(JOINT_MOVE, literal, trajectory))
                    }
                }
            }
            CommandKind::MoveJoint(args) => {
                let (literal, target) = resolve_target(program, command, args)?;
                let profile = self.profile(args)?;
                let joints = match target {
                    MotionTarget::Joint(joints) => joints,
                    MotionTarget::Cartesian(pose) => self.synth.solve(&pose, &cursor)?,
                };
                let trajectory = self.synth.joint_trajectory(&cursor, &joints, profile)?;
                Ok(motion_record(&command.command_type, literal, trajectory))
            }
            CommandKind::MoveCircular { .. } => match self.config.circular_policy {
                CircularPolicy::Skip => {
                    let reason = "circular motion is not supported by this planner".to_string();
                    tracing::warn!(goal = %goal.name, line = command.line, "{reason}");
                    warnings.push(format!(
                        "GOAL {}: MoveCircular at line {} skipped: {reason}",
                        goal.name, command.line
                    ));
                    Ok(PlanRecord::Skipped {
                        command: command.command_type.clone(),
                        reason,
                    })
                }
                CircularPolicy::Fail => Err(PlanError::Unsupported {
                    command: command.command_type.clone(),
                }),
            },
            other => Ok(PlanRecord::Event {
                command: command.command_type.clone(),
                args: command.args.clone(),
                duration: event_duration(other),
            }),
        }
    }

    fn profile(&self, args: &MotionArgs) -> PlanResult<MotionProfile> {
        Ok(MotionProfile::new(
            args.velocity.unwrap_or(self.config.default_velocity),
            args.acceleration.unwrap_or(self.config.default_acceleration),
        )?)
    }
}

fn resolve_target(
    program: &Program,
    command: &Command,
    args: &MotionArgs,
) -> PlanResult<(String, MotionTarget)> {
    let raw = args.target.as_deref().ok_or_else(|| PlanError::MissingTarget {
        command: command.command_type.clone(),
    })?;
    let literal = program.resolve_definition(raw).to_string();
    match parse_pose(&literal) {
        Ok(pose) => Ok((literal, pose.to_target())),
        Err(source) => Err(PlanError::Pose { literal, source }),
    }
}

fn motion_record(command: &str, target_pose: String, trajectory: Trajectory) -> PlanRecord {
    PlanRecord::Motion {
        command: command.to_string(),
        target_pose,
        trajectory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::error::{ProviderError, ProviderResult, SynthesisError};
    use crate::motion::types::{CartesianPose, JointLimit, JointLimits, TrajectoryKind};
    use crate::tdl::parse_program;
    use std::cell::RefCell;
    use std::f64::consts::PI;

    /// Joints map straight onto position and orientation.
    #[derive(Default)]
    struct Direct {
        ik_seeds: RefCell<Vec<JointState>>,
    }

    impl KinematicsProvider for Direct {
        fn forward_kinematics(&self, joints: &JointState) -> ProviderResult<CartesianPose> {
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
            self.ik_seeds.borrow_mut().push(*seed);
            if target.position[0] > 2.0 {
                return Err(ProviderError::NoSolution);
            }
            let [x, y, z] = target.position;
            let [rx, ry, rz] = target.orientation;
            Ok(JointState::new([x, y, z, rx, ry, rz]))
        }

        fn is_in_collision(&self, _joints: &JointState) -> ProviderResult<bool> {
            Ok(false)
        }

        fn joint_limits(&self) -> JointLimits {
            [JointLimit::symmetric(PI); 6]
        }
    }

    fn planner(config: PlannerConfig) -> CommandPlanner<Direct> {
        CommandPlanner::new(Direct::default(), config)
    }

    fn program(source: &str) -> Program {
        parse_program(source).program
    }

    #[test]
    fn event_durations_follow_lookup() {
        assert_eq!(event_duration(&CommandKind::Delay { seconds: 1.5 }), 1.5);
        assert_eq!(event_duration(&CommandKind::SetDigitalOutput), 0.01);
        assert_eq!(event_duration(&CommandKind::GetDigitalInput), 0.01);
        assert_eq!(event_duration(&CommandKind::GraspObject), 0.5);
        assert_eq!(event_duration(&CommandKind::ReleaseObject), 0.5);
        assert_eq!(event_duration(&CommandKind::ArcOn), 0.1);
        assert_eq!(event_duration(&CommandKind::ArcOff), 0.1);
        assert_eq!(
            event_duration(&CommandKind::Unrecognized {
                command_type: "Beep".into()
            }),
            0.0
        );
    }

    #[test]
    fn events_never_move_the_cursor() {
        let program = program(
            "GOAL Io() {\n\
             SPAWN SetDigitalOutput(port=1, value=true);\n\
             SPAWN Delay(duration_sec=2);\n\
             SPAWN GraspObject(force=10);\n\
             }\n",
        );
        let start = JointState::new([0.1; 6]);
        let (plan, cursor) = planner(PlannerConfig::default()).plan_program_from(&program, start);

        assert!(plan.success);
        assert_eq!(cursor, start);
        assert_eq!(plan.total_waypoints, 0);
        assert!((plan.total_duration - 2.51).abs() < 1e-12);
        let records = &plan.goals[0].trajectories;
        assert_eq!(records.len(), 3);
        assert!(matches!(
            &records[0],
            PlanRecord::Event { command, args, .. }
                if command == "SetDigitalOutput" && args.contains_key("port")
        ));
    }

    #[test]
    fn move_joint_with_cartesian_pose_seeds_ik_from_cursor() {
        let program = program(
            "GOAL A() {\n\
             SPAWN MoveJoint(target_pose=PosJ(10,0,0,0,0,0));\n\
             SPAWN MoveJoint(target_pose=PosX(500,0,0,0,0,0));\n\
             }\n",
        );
        let planner = planner(PlannerConfig::default());
        let (plan, cursor) = planner.plan_program_from(&program, JointState::zeros());

        assert!(plan.success, "{:?}", plan.errors);
        let seeds = planner.synthesizer().provider().ik_seeds.borrow();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0][0], 10.0 * (PI / 180.0));
        assert_eq!(cursor[0], 0.5);
        let record = &plan.goals[0].trajectories[1];
        assert_eq!(record.trajectory().unwrap().kind(), TrajectoryKind::Joint);
    }

    #[test]
    fn move_linear_with_joint_pose_falls_back_to_joint_move() {
        let program = program("GOAL A() {\nSPAWN MoveLinear(target_pose=PosJ(45,0,0,0,0,0));\n}\n");
        let plan = planner(PlannerConfig::default()).plan_program(&program);

        let record = &plan.goals[0].trajectories[0];
        assert_eq!(record.command(), "MoveJoint");
        let trajectory = record.trajectory().unwrap();
        assert_eq!(trajectory.kind(), TrajectoryKind::Joint);
        assert_eq!(trajectory.end()[0], 45.0 * (PI / 180.0));
    }

    #[test]
    fn unreachable_cartesian_move_joint_aborts_without_moving() {
        let program = program(
            "GOAL A() {\n\
             SPAWN MoveJoint(target_pose=PosX(5000,0,0,0,0,0));\n\
             SPAWN MoveJoint(target_pose=PosJ(10,0,0,0,0,0));\n\
             }\n",
        );
        let start = JointState::new([0.2; 6]);
        let outcome = planner(PlannerConfig::default()).plan_goal(&program, &program.goals[0], start);

        assert_eq!(
            outcome.result,
            Err(PlanError::Synthesis(SynthesisError::UnreachableTarget {
                source: ProviderError::NoSolution
            }))
        );
        assert_eq!(outcome.cursor, start);
    }

    #[test]
    fn circular_motion_is_skipped_by_default() {
        let program = program(
            "GOAL Arc() {\n\
             SPAWN MoveCircular(via_pose=PosX(1,0,0,0,0,0), target_pose=PosX(2,0,0,0,0,0));\n\
             SPAWN Delay(duration=1);\n\
             }\n",
        );
        let plan = planner(PlannerConfig::default()).plan_program(&program);

        assert!(plan.success);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("MoveCircular"));
        assert!(matches!(plan.goals[0].trajectories[0], PlanRecord::Skipped { .. }));
        assert_eq!(plan.total_duration, 1.0);
    }

    #[test]
    fn circular_motion_can_abort_the_goal() {
        let program = program(
            "GOAL Arc() {\n\
             SPAWN MoveCircular(target_pose=PosX(2,0,0,0,0,0));\n\
             }\n",
        );
        let config = PlannerConfig {
            circular_policy: CircularPolicy::Fail,
            ..PlannerConfig::default()
        };
        let plan = planner(config).plan_program(&program);

        assert!(!plan.success);
        assert!(plan.goals.is_empty());
        assert!(plan.errors[0].contains("Arc"));
        assert!(plan.errors[0].contains("MoveCircular"));
    }

    #[test]
    fn missing_or_unparseable_targets_abort_the_goal() {
        let program = program(
            "DEFINE ALIAS = OTHER;\n\
             DEFINE OTHER = PosJ(0,0,0,0,0,0);\n\
             GOAL NoTarget() {\nSPAWN MoveJoint(velocity=10);\n}\n\
             GOAL Chained() {\nSPAWN MoveJoint(target_pose=ALIAS);\n}\n",
        );
        let planner = planner(PlannerConfig::default());
        let outcome = planner.plan_goal(&program, &program.goals[0], JointState::zeros());
        assert_eq!(
            outcome.result,
            Err(PlanError::MissingTarget {
                command: "MoveJoint".into()
            })
        );

        // Definitions resolve one level only.
        let outcome = planner.plan_goal(&program, &program.goals[1], JointState::zeros());
        assert!(matches!(
            outcome.result,
            Err(PlanError::Pose { ref literal, .. }) if literal == "OTHER"
        ));
    }

    #[test]
    fn command_velocity_overrides_default() {
        let program = program(
            "GOAL A() {\nSPAWN MoveLinear(target_pose=PosX(1000,0,0,0,0,0), velocity=200, acceleration=100);\n}\n",
        );
        let plan = planner(PlannerConfig::default()).plan_program(&program);
        // 1000 mm at 200 mm/s, 100 mm/s^2: 2*2 + (1000 - 400) / 200.
        assert!((plan.total_duration - 7.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_profile_aborts_the_goal() {
        let program = program("GOAL A() {\nSPAWN MoveJoint(target_pose=PosJ(1,0,0,0,0,0), velocity=0);\n}\n");
        let outcome = planner(PlannerConfig::default()).plan_goal(
            &program,
            &program.goals[0],
            JointState::zeros(),
        );
        assert!(matches!(
            outcome.result,
            Err(PlanError::Synthesis(SynthesisError::InvalidProfile { .. }))
        ));
    }
}
