use std::f64::consts::PI;

use tdl_motion::tdl::{
    ArgValue, CommandKind, MotionTarget, SkipReason, TdlError, classify, parse_pose,
    parse_program, parse_program_strict,
};

const JOB: &str = r#"
HEADER
    NAME: "Bracket weld"
    ROBOT: Doosan H2017
END_HEADER

// Shared poses
DEFINE Approach = PosX(300, 200, 50, 0, 0, 0);
DEFINE Park = PosJ(90, 0, 0, 0, 0, 0);

GOAL Initialize() {
    SPAWN MoveJoint(target_pose=Park, velocity=30, acceleration=60);
    SPAWN SetDigitalOutput(port=1, value=true);
}

GOAL Weld() {
    SPAWN MoveLinear(target_pose=Approach, velocity=50.5); // approach slowly
    SPAWN ArcOn(current=150, label="root pass") WITH WAIT;
    SPAWN MoveCircular(via_pose=PosX(310, 210, 50, 0, 0, 0), target_pose=PosX(320, 200, 50, 0, 0, 0));
    SPAWN ArcOff();
    SPAWN Dwell(time=2);
}
END_GOAL
"#;

#[test]
fn job_file_parses_into_ordered_goals() {
    let outcome = parse_program(JOB);
    assert!(outcome.skipped.is_empty(), "{:?}", outcome.skipped);

    let program = outcome.program;
    assert_eq!(program.header.get("NAME").map(String::as_str), Some("Bracket weld"));
    assert_eq!(program.definitions.len(), 2);

    let names: Vec<&str> = program.goals.iter().map(|goal| goal.name.as_str()).collect();
    assert_eq!(names, vec!["Initialize", "Weld"]);
    assert_eq!(program.command_count(), 7);

    let weld = program.goal("Weld").unwrap();
    let linear = &weld.commands[0];
    assert_eq!(linear.arg("velocity"), Some(&ArgValue::Float(50.5)));
    assert_eq!(linear.arg("target_pose"), Some(&ArgValue::Raw("Approach".into())));

    let arc_on = &weld.commands[1];
    assert!(arc_on.wait);
    assert_eq!(arc_on.arg("label"), Some(&ArgValue::Str("root pass".into())));
    assert_eq!(arc_on.arg("current"), Some(&ArgValue::Int(150)));

    let circular = &weld.commands[2];
    assert_eq!(
        circular.arg("via_pose"),
        Some(&ArgValue::Raw("PosX(310, 210, 50, 0, 0, 0)".into()))
    );
}

#[test]
fn commands_classify_into_closed_union() {
    let program = parse_program(JOB).program;
    let kinds: Vec<CommandKind> = program
        .goal("Weld")
        .unwrap()
        .commands
        .iter()
        .map(classify)
        .collect();

    assert!(matches!(&kinds[0], CommandKind::MoveLinear(args) if args.velocity == Some(50.5)));
    assert_eq!(kinds[1], CommandKind::ArcOn);
    assert!(kinds[2].is_motion());
    assert_eq!(kinds[3], CommandKind::ArcOff);
    assert_eq!(
        kinds[4],
        CommandKind::Unrecognized {
            command_type: "Dwell".into()
        }
    );
}

#[test]
fn definitions_resolve_to_pose_targets() {
    let program = parse_program(JOB).program;

    let approach = program.resolve_definition("Approach");
    assert_eq!(approach, "PosX(300, 200, 50, 0, 0, 0)");
    match parse_pose(approach).unwrap().to_target() {
        MotionTarget::Cartesian(pose) => {
            assert_eq!(pose.position, [0.3, 0.2, 0.05]);
            assert_eq!(pose.orientation, [0.0, 0.0, 0.0]);
        }
        other => panic!("expected Cartesian target, got {other:?}"),
    }

    match parse_pose(program.resolve_definition("Park")).unwrap().to_target() {
        MotionTarget::Joint(joints) => {
            assert_eq!(joints[0], PI / 2.0);
            assert!(joints.iter().skip(1).all(|q| *q == 0.0));
        }
        other => panic!("expected joint target, got {other:?}"),
    }

    assert_eq!(program.resolve_definition("Unknown"), "Unknown");
}

#[test]
fn malformed_lines_are_reported_not_fatal() {
    let source = "\
SPAWN MoveJoint(target_pose=Park);
GOAL broken {
    SPAWN Delay(duration=1);
}
GOAL Good() {
    SPAWN Delay(1);
    SPAWN Delay(duration=1);
}
";
    let outcome = parse_program(source);
    let reasons: Vec<(usize, SkipReason)> = outcome
        .skipped
        .iter()
        .map(|skipped| (skipped.line, skipped.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (1, SkipReason::CommandOutsideGoal),
            (2, SkipReason::MalformedGoalHeader),
            (3, SkipReason::CommandOutsideGoal),
            (6, SkipReason::UnnamedArgument),
        ]
    );
    assert_eq!(outcome.program.goals.len(), 1);
    assert_eq!(outcome.program.goals[0].commands.len(), 2);

    match parse_program_strict(source) {
        Err(TdlError::Syntax { line: 1, reason }) => {
            assert_eq!(reason, SkipReason::CommandOutsideGoal)
        }
        other => panic!("unexpected result {other:?}"),
    }
}
