//! tdl-plan - Command-line front end for the TDL motion planner
//!
//! Provides subcommands for planning TDL programs, inspecting parses and
//! saved plan reports, and writing a default configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tdl_motion::config::{PlannerConfig, load_config, write_config};
use tdl_motion::motion::{DhArm, JointState, MotionPlan, PlanRecord, RobotModel};
use tdl_motion::report::{PlanReport, load_report, write_report};
use tdl_motion::{CompileOptions, bounded_provider, compile, parse_program};

#[derive(Parser)]
#[command(name = "tdl-plan")]
#[command(about = "Compile TDL task descriptions into joint-space motion plans", long_about = None)]
struct Cli {
    /// Planner configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a TDL program
    Plan {
        /// TDL source file
        file: PathBuf,

        /// Robot manufacturer (doosan, universal, generic)
        #[arg(long)]
        robot: Option<String>,

        /// Robot model name
        #[arg(long)]
        model: Option<String>,

        /// Skip collision checks
        #[arg(long)]
        no_collision_check: bool,

        /// Reject the program if any line is skipped
        #[arg(long)]
        strict: bool,

        /// Start from the robot's home configuration instead of zeros
        #[arg(long)]
        from_home: bool,

        /// Write the plan report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a TDL program and print it as JSON
    Parse {
        /// TDL source file
        file: PathBuf,
    },

    /// Summarize a saved plan report
    Show {
        /// Plan report file
        report: PathBuf,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = "tdl-plan.json")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            file,
            robot,
            model,
            no_collision_check,
            strict,
            from_home,
            output,
        } => {
            let mut config = match &cli.config {
                Some(path) => load_config(path)?,
                None => PlannerConfig::default(),
            };
            if let Some(robot) = robot {
                config.robot = robot;
            }
            if no_collision_check {
                config.check_collisions = false;
            }

            let source = read_source(&file)?;
            let robot_model = RobotModel::lookup(&config.robot, model.as_deref());
            let start = if from_home {
                robot_model.home
            } else {
                JointState::zeros()
            };
            println!("Robot: {} {}", robot_model.manufacturer, robot_model.name);

            let provider = bounded_provider(DhArm::new(robot_model.clone()), config.provider_timeout());
            let result = compile(&source, provider, &config, CompileOptions { strict, start })?;

            for skipped in &result.skipped {
                println!(
                    "  skipped line {}: {} ({})",
                    skipped.line, skipped.text, skipped.reason
                );
            }
            print_summary(&result.plan);

            if let Some(output) = output {
                let report = PlanReport::new(&source, robot_model.name, result.skipped, result.plan)
                    .with_source(&file);
                write_report(&output, &report)?;
                println!("Saved plan report to {:?}", output);
                if !report.plan.success {
                    std::process::exit(1);
                }
            } else if !result.plan.success {
                std::process::exit(1);
            }
        }

        Commands::Parse { file } => {
            let source = read_source(&file)?;
            let outcome = parse_program(&source);
            let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize program")?;
            println!("{}", json);
        }

        Commands::Show { report } => {
            let report = load_report(&report)?;
            println!("Report: {}", report.id);
            println!("Generated: {}", report.generated_at);
            if let Some(source) = &report.source {
                let digest = report.source_digest.get(..12).unwrap_or(&report.source_digest);
                println!("Source: {:?} ({})", source, digest);
            }
            println!("Robot: {}", report.robot);
            if !report.skipped.is_empty() {
                println!("Skipped lines: {}", report.skipped.len());
            }
            print_summary(&report.plan);
            print_breakdown(&report.plan);
        }

        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                anyhow::bail!("{:?} already exists (use --force to overwrite)", path);
            }
            let config = match &cli.config {
                Some(existing) => load_config(existing)?,
                None => PlannerConfig::default(),
            };
            write_config(&path, &config)?;
            println!("Wrote planner config to {:?}", path);
        }
    }

    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read TDL file: {:?}", path))
}

fn print_summary(plan: &MotionPlan) {
    println!("Success: {}", plan.success);
    println!("Goals planned: {}", plan.goals.len());
    println!("Total duration: {:.2}s", plan.total_duration);
    println!("Total waypoints: {}", plan.total_waypoints);
    for error in &plan.errors {
        println!("  error: {}", error);
    }
    for warning in &plan.warnings {
        println!("  warning: {}", warning);
    }
}

fn print_breakdown(plan: &MotionPlan) {
    println!("Motion records: {}", plan.motion_count());
    println!("Non-motion records: {}", plan.non_motion_count());
    println!("Goals:");
    for goal in &plan.goals {
        println!(
            "  {} - {} commands, {:.2}s, {} waypoints",
            goal.name,
            goal.num_commands,
            goal.duration,
            goal.num_waypoints()
        );
        for record in &goal.trajectories {
            match record {
                PlanRecord::Motion {
                    command,
                    target_pose,
                    trajectory,
                } => println!(
                    "    {} -> {} ({:?}, {} waypoints, {:.2}s)",
                    command,
                    target_pose,
                    trajectory.kind(),
                    trajectory.len(),
                    trajectory.duration()
                ),
                PlanRecord::Event {
                    command, duration, ..
                } => println!("    {} ({:.2}s)", command, duration),
                PlanRecord::Skipped { command, reason } => {
                    println!("    {} skipped: {}", command, reason)
                }
            }
        }
    }
}
