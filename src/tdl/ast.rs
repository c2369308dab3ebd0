use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::pose::{Pose, parse_pose};

/// Typed value of a named command argument.
///
/// Values are typed opportunistically by the parser. Pose constructors,
/// tuples and bare identifiers (usually `DEFINE` references) are kept as
/// [`ArgValue::Raw`] and resolved when a planner needs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ArgValue {
    /// Signed integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// `true` / `false`.
    Bool(bool),
    /// Quoted string literal with the quotes removed.
    Str(String),
    /// Unresolved literal text (pose constructor, tuple, symbol).
    Raw(String),
}

impl ArgValue {
    /// Numeric view of integer and float values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Int(value) => Some(*value as f64),
            ArgValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Text view of string and raw values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Str(text) | ArgValue::Raw(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Int(value) => write!(f, "{value}"),
            ArgValue::Float(value) => write!(f, "{value}"),
            ArgValue::Bool(value) => write!(f, "{value}"),
            ArgValue::Str(text) => write!(f, "\"{text}\""),
            ArgValue::Raw(text) => f.write_str(text),
        }
    }
}

/// One `SPAWN` instruction: a command type plus its named arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Command type tag, e.g. `MoveLinear`.
    pub command_type: String,
    /// Named arguments. Later duplicates replace earlier ones.
    pub args: BTreeMap<String, ArgValue>,
    /// Whether the command was spawned `WITH WAIT`.
    pub wait: bool,
    /// 1-based source line the command came from.
    pub line: usize,
}

impl Command {
    /// Look up an argument by name.
    pub fn arg(&self, name: &str) -> Option<&ArgValue> {
        self.args.get(name)
    }
}

/// A named, ordered command sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Goal name. Uniqueness is not enforced.
    pub name: String,
    /// Commands in declaration order.
    pub commands: Vec<Command>,
}

/// `DEFINE` table mapping names to literal strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Definitions(BTreeMap<String, String>);

impl Definitions {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a definition, replacing any earlier one with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Stored literal for `name`, if defined.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Resolve a single level of indirection.
    ///
    /// Returns the stored literal when `name` is defined and `name` itself
    /// otherwise. A literal that happens to name another definition is not
    /// chased further.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name.trim()).unwrap_or(name)
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate definitions in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parsed TDL program. Immutable once produced by the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// `HEADER` block fields in key order.
    pub header: BTreeMap<String, String>,
    /// `DEFINE` statements.
    pub definitions: Definitions,
    /// Goals in declaration order.
    pub goals: Vec<Goal>,
}

impl Program {
    /// First goal with the given name.
    pub fn goal(&self, name: &str) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.name == name)
    }

    /// Single-level definition lookup; see [`Definitions::resolve`].
    pub fn resolve_definition<'a>(&'a self, name: &'a str) -> &'a str {
        self.definitions.resolve(name)
    }

    /// Resolve `name` one level and parse the result as a pose literal.
    pub fn resolve_pose(&self, name: &str) -> super::Result<Pose> {
        Ok(parse_pose(self.resolve_definition(name))?)
    }

    /// Total number of commands across all goals.
    pub fn command_count(&self) -> usize {
        self.goals.iter().map(|goal| goal.commands.len()).sum()
    }
}

/// Why the parser dropped a line or part of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// `GOAL` line that does not match `GOAL name()`.
    MalformedGoalHeader,
    /// `DEFINE` line that does not match `DEFINE name = value;`.
    MalformedDefine,
    /// `SPAWN` line without a `Type(args)` call.
    MalformedSpawn,
    /// `SPAWN` line that is not inside a `GOAL` block.
    CommandOutsideGoal,
    /// Argument without a `name=` prefix.
    UnnamedArgument,
    /// Line that matches no known statement form.
    UnrecognizedStatement,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::MalformedGoalHeader => "malformed GOAL header",
            SkipReason::MalformedDefine => "malformed DEFINE statement",
            SkipReason::MalformedSpawn => "malformed SPAWN command",
            SkipReason::CommandOutsideGoal => "command outside of a GOAL block",
            SkipReason::UnnamedArgument => "argument without a name",
            SkipReason::UnrecognizedStatement => "unrecognized statement",
        };
        f.write_str(text)
    }
}

/// A line (or argument) the parser did not turn into program structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    /// Offending text, trimmed.
    pub text: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Result of a lenient parse: the program plus everything that was dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseOutcome {
    /// The parsed program.
    pub program: Program,
    /// Lines or arguments that were skipped, in source order.
    pub skipped: Vec<SkippedLine>,
}
