use std::collections::BTreeMap;

use super::ast::{ArgValue, Command, Goal, ParseOutcome, Program, SkipReason, SkippedLine};
use super::{Result, TdlError};

/// Parse TDL source text leniently.
///
/// Lines that cannot be turned into program structure are never fatal; each
/// one is reported in [`ParseOutcome::skipped`] with the reason it was
/// dropped. Unknown command types are kept as-is.
pub fn parse_program(source: &str) -> ParseOutcome {
    let mut parser = LineParser::default();
    for (index, raw) in source.lines().enumerate() {
        parser.feed(index + 1, raw);
    }
    parser.finish()
}

/// Parse TDL source text, failing on the first line that would be skipped.
pub fn parse_program_strict(source: &str) -> Result<Program> {
    let outcome = parse_program(source);
    match outcome.skipped.first() {
        Some(skipped) => Err(TdlError::Syntax {
            line: skipped.line,
            reason: skipped.reason,
        }),
        None => Ok(outcome.program),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    TopLevel,
    Header,
    Goal(usize),
}

#[derive(Debug)]
struct LineParser {
    program: Program,
    skipped: Vec<SkippedLine>,
    section: Section,
}

impl Default for LineParser {
    fn default() -> Self {
        Self {
            program: Program::default(),
            skipped: Vec::new(),
            section: Section::TopLevel,
        }
    }
}

impl LineParser {
    fn feed(&mut self, line_no: usize, raw: &str) {
        let line = strip_comment(raw).trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        if self.section == Section::Header {
            if line == "END_HEADER" {
                self.section = Section::TopLevel;
            } else if let Some((key, value)) = line.split_once(':') {
                self.program
                    .header
                    .insert(key.trim().to_string(), unquote(value.trim()).to_string());
            } else {
                self.skip(line_no, line, SkipReason::UnrecognizedStatement);
            }
            return;
        }

        if line == "HEADER" {
            self.section = Section::Header;
            return;
        }

        if line == "{" {
            return;
        }

        if line == "}" || line == "END_GOAL" {
            self.section = Section::TopLevel;
            return;
        }

        if let Some(rest) = keyword(line, "DEFINE") {
            match parse_define(rest) {
                Some((name, value)) => self.program.definitions.insert(name, value),
                None => self.skip(line_no, line, SkipReason::MalformedDefine),
            }
            return;
        }

        if let Some(rest) = keyword(line, "GOAL") {
            match parse_goal_header(rest) {
                Some(name) => {
                    self.program.goals.push(Goal {
                        name: name.to_string(),
                        commands: Vec::new(),
                    });
                    self.section = Section::Goal(self.program.goals.len() - 1);
                }
                None => {
                    self.section = Section::TopLevel;
                    self.skip(line_no, line, SkipReason::MalformedGoalHeader);
                }
            }
            return;
        }

        if let Some(rest) = keyword(line, "SPAWN") {
            let Section::Goal(goal_index) = self.section else {
                self.skip(line_no, line, SkipReason::CommandOutsideGoal);
                return;
            };
            match parse_spawn(rest, line_no) {
                Some((command, unnamed)) => {
                    for text in unnamed {
                        self.skip(line_no, text, SkipReason::UnnamedArgument);
                    }
                    self.program.goals[goal_index].commands.push(command);
                }
                None => self.skip(line_no, line, SkipReason::MalformedSpawn),
            }
            return;
        }

        self.skip(line_no, line, SkipReason::UnrecognizedStatement);
    }

    fn skip(&mut self, line: usize, text: &str, reason: SkipReason) {
        tracing::debug!(line, %reason, "skipping TDL input: {}", text);
        self.skipped.push(SkippedLine {
            line,
            text: text.to_string(),
            reason,
        });
    }

    fn finish(self) -> ParseOutcome {
        ParseOutcome {
            program: self.program,
            skipped: self.skipped,
        }
    }
}

/// Strip a leading keyword that is followed by whitespace, `(` or the end.
fn keyword<'a>(line: &'a str, word: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(word)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(ch) if ch.is_whitespace() || ch == '(' => Some(rest),
        Some(_) => None,
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Split off a leading identifier.
fn take_word(text: &str) -> Option<(&str, &str)> {
    let end = text
        .char_indices()
        .find(|(_, ch)| !is_word_char(*ch))
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    if end == 0 {
        None
    } else {
        Some(text.split_at(end))
    }
}

/// `name = value;`
fn parse_define(rest: &str) -> Option<(&str, &str)> {
    let (name, rest) = take_word(rest.trim_start())?;
    let rest = rest.trim_start().strip_prefix('=')?;
    let end = rest.find(';')?;
    let value = rest[..end].trim();
    if value.is_empty() {
        None
    } else {
        Some((name, value))
    }
}

/// `name()` optionally followed by an opening brace.
fn parse_goal_header(rest: &str) -> Option<&str> {
    let (name, rest) = take_word(rest.trim_start())?;
    let rest = rest.trim_start().strip_prefix('(')?;
    rest.trim_start().strip_prefix(')')?;
    Some(name)
}

/// `Type(args) [WITH WAIT];`
fn parse_spawn(rest: &str, line: usize) -> Option<(Command, Vec<&str>)> {
    let mut body = rest.trim();
    body = body.strip_suffix(';').unwrap_or(body).trim_end();
    let wait = match body.strip_suffix("WITH WAIT") {
        Some(stripped) => {
            body = stripped.trim_end();
            true
        }
        None => false,
    };

    let (command_type, rest) = take_word(body)?;
    let rest = rest.trim_start().strip_prefix('(')?;
    let close = matching_paren(rest)?;
    if !rest[close + 1..].trim().is_empty() {
        return None;
    }

    let mut args = BTreeMap::new();
    let mut unnamed = Vec::new();
    for piece in split_top_level(&rest[..close]) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        match split_named(piece) {
            Some((name, value)) => {
                args.insert(name.to_string(), type_value(value));
            }
            None => unnamed.push(piece),
        }
    }

    Some((
        Command {
            command_type: command_type.to_string(),
            args,
            wait,
            line,
        },
        unnamed,
    ))
}

/// Byte index of the `)` closing an already-consumed `(`.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in text.char_indices() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' => depth += 1,
            ')' if depth == 0 => return Some(idx),
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// Split on commas that are not nested inside brackets or quotes.
pub(crate) fn split_top_level(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// `name = value` where `name` is an identifier.
fn split_named(piece: &str) -> Option<(&str, &str)> {
    let (name, rest) = take_word(piece)?;
    let value = rest.trim_start().strip_prefix('=')?;
    Some((name, value.trim()))
}

fn type_value(text: &str) -> ArgValue {
    if let Some(inner) = quoted(text) {
        return ArgValue::Str(inner.to_string());
    }
    if text.eq_ignore_ascii_case("true") {
        return ArgValue::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return ArgValue::Bool(false);
    }
    let numeric = text
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.'));
    if numeric {
        if let Ok(value) = text.parse::<i64>() {
            return ArgValue::Int(value);
        }
        if let Ok(value) = text.parse::<f64>() {
            return ArgValue::Float(value);
        }
    }
    ArgValue::Raw(text.to_string())
}

fn quoted(text: &str) -> Option<&str> {
    for delim in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(delim) && text.ends_with(delim) {
            return Some(&text[1..text.len() - 1]);
        }
    }
    None
}

fn unquote(text: &str) -> &str {
    quoted(text).unwrap_or(text)
}

/// Drop a trailing `//` comment that is not inside quotes.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev_slash = false;
    for (idx, ch) in line.char_indices() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                prev_slash = false;
            }
            '/' if prev_slash => return &line[..idx - 1],
            '/' => prev_slash = true,
            _ => prev_slash = false,
        }
    }
    line
}
