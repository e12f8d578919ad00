//! HPX statement classification.
//!
//! An HPX program is a sequence of lines.  Each non-blank line that does not
//! start with `#` is exactly one statement, recognised by its leading
//! keyword:
//!
//! | Line | Statement |
//! |------|-----------|
//! | `store <name> to <expr>` | bind a variable (`to ask` reads a line) |
//! | `print(<expr>)` | write a value |
//! | `stop` | leave the nearest enclosing loop |
//! | `when <expr>` | open a conditional (`or <expr>` / `complete` arms follow) |
//! | `repeat until <expr>` | loop until the condition holds |
//! | `forever` | loop until `stop` |
//!
//! Classification looks at one line only; block structure is resolved by
//! the interpreter from indentation.

use super::error::ScriptError;
use super::expr::RESERVED_WORDS;

/// Expression tail of `store … to` that reads a line of input instead.
pub const READ_INPUT: &str = "ask";

/// A classified statement, borrowing from its source line.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    Store { name: &'a str, value: StoreValue<'a> },
    Print { expr: &'a str },
    Stop,
    When { cond: &'a str },
    RepeatUntil { cond: &'a str },
    Forever,
}

/// Right-hand side of a `store` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue<'a> {
    ReadInput,
    Expr(&'a str),
}

/// A continuation arm of a conditional.
#[derive(Debug, Clone, PartialEq)]
pub enum ArmHeader<'a> {
    Or { cond: &'a str },
    Complete,
}

impl Stmt<'_> {
    /// Short name used in diagnostics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Stmt::Store { .. } => "store",
            Stmt::Print { .. } => "print",
            Stmt::Stop => "stop",
            Stmt::When { .. } => "when",
            Stmt::RepeatUntil { .. } => "repeat until",
            Stmt::Forever => "forever",
        }
    }
}

/// Returns `true` for lines the dispatcher skips: blank lines and comments.
pub fn is_noop(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

/// Classify one source line.
///
/// `lineno` is the 1-based line number used in diagnostics.  Returns
/// `Ok(None)` for blank and comment lines.
pub fn parse_line(raw: &str, lineno: usize) -> Result<Option<Stmt<'_>>, ScriptError> {
    let line = raw.trim();
    if is_noop(line) {
        return Ok(None);
    }

    if line == "stop" {
        return Ok(Some(Stmt::Stop));
    }
    if line == "forever" {
        return Ok(Some(Stmt::Forever));
    }
    if let Some(rest) = keyword(line, "store") {
        return parse_store(line, rest).map(Some);
    }
    if let Some(rest) = line.strip_prefix("print") {
        if rest.is_empty() || rest.starts_with(|c: char| c == '(' || c.is_whitespace()) {
            return parse_print(line, rest).map(Some);
        }
    }
    if let Some(cond) = keyword(line, "when") {
        return Ok(Some(Stmt::When {
            cond: required_condition(line, cond)?,
        }));
    }
    if let Some(cond) = keyword(line, "repeat").and_then(|rest| keyword(rest, "until")) {
        return Ok(Some(Stmt::RepeatUntil {
            cond: required_condition(line, cond)?,
        }));
    }

    Err(ScriptError::UnknownInstruction {
        text: line.to_owned(),
        line: lineno,
    })
}

/// Recognise an `or <expr>` or `complete` arm header.
///
/// Returns `None` for any other line.
pub fn parse_arm_header(raw: &str) -> Option<ArmHeader<'_>> {
    let line = raw.trim();
    if line == "complete" {
        return Some(ArmHeader::Complete);
    }
    keyword(line, "or").map(|cond| ArmHeader::Or { cond })
}

/// Fail with `MissingCondition` when `cond` is empty.
pub fn required_condition<'a>(line: &str, cond: &'a str) -> Result<&'a str, ScriptError> {
    if cond.is_empty() {
        Err(ScriptError::MissingCondition {
            text: line.to_owned(),
        })
    } else {
        Ok(cond)
    }
}

/// Returns `true` if `name` can be bound by `store`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    starts_ok
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !RESERVED_WORDS.contains(&name)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// If `line` starts with the word `kw`, return the trimmed remainder.
///
/// `kw` must be followed by whitespace or the end of the line, so `forever1`
/// is not `forever` and `order` is not `or`.
fn keyword<'a>(line: &'a str, kw: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(kw)?;
    if rest.is_empty() {
        Some(rest)
    } else if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Parse the part of `store <name> to <expr>` after `store`.
fn parse_store<'a>(line: &'a str, rest: &'a str) -> Result<Stmt<'a>, ScriptError> {
    let invalid = || ScriptError::InvalidStoreStatement {
        text: line.to_owned(),
    };
    let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let (name, after_name) = rest.split_at(name_end);
    if !is_identifier(name) {
        return Err(invalid());
    }
    let expr = keyword(after_name.trim_start(), "to").ok_or_else(invalid)?;
    if expr.is_empty() {
        return Err(invalid());
    }
    let value = if expr == READ_INPUT {
        StoreValue::ReadInput
    } else {
        StoreValue::Expr(expr)
    };
    Ok(Stmt::Store { name, value })
}

/// Parse the part of `print(<expr>)` after `print`.
fn parse_print<'a>(line: &'a str, rest: &'a str) -> Result<Stmt<'a>, ScriptError> {
    let inner = rest
        .trim_start()
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| ScriptError::InvalidPrintStatement {
            text: line.to_owned(),
        })?
        .trim();
    if inner.is_empty() {
        return Err(ScriptError::EmptyExpression);
    }
    Ok(Stmt::Print { expr: inner })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Stmt<'_> {
        parse_line(line, 1).expect("parse failed").expect("noop line")
    }

    #[test]
    fn noop_lines() {
        assert!(parse_line("", 1).unwrap().is_none());
        assert!(parse_line("   \n", 1).unwrap().is_none());
        assert!(parse_line("  # comment", 1).unwrap().is_none());
    }

    #[test]
    fn store_expr() {
        assert_eq!(
            parse("store x to 2 + 3"),
            Stmt::Store {
                name: "x",
                value: StoreValue::Expr("2 + 3")
            }
        );
    }

    #[test]
    fn store_tolerates_extra_spacing() {
        assert_eq!(
            parse("  store   total   to  total + 1\n"),
            Stmt::Store {
                name: "total",
                value: StoreValue::Expr("total + 1")
            }
        );
    }

    #[test]
    fn store_read_input() {
        assert_eq!(
            parse("store name to ask"),
            Stmt::Store {
                name: "name",
                value: StoreValue::ReadInput
            }
        );
        // A call to the builtin is an ordinary expression.
        assert_eq!(
            parse("store name to ask('Name? ')"),
            Stmt::Store {
                name: "name",
                value: StoreValue::Expr("ask('Name? ')")
            }
        );
    }

    #[test]
    fn store_malformed() {
        for line in [
            "store x foo 5",
            "store x to",
            "store x",
            "store",
            "store 1x to 5",
            "store true to 5",
            "store x tom 5",
        ] {
            assert!(
                matches!(parse_line(line, 1), Err(ScriptError::InvalidStoreStatement { .. })),
                "{line}"
            );
        }
    }

    #[test]
    fn print_stmt() {
        assert_eq!(parse("print(x + 1)"), Stmt::Print { expr: "x + 1" });
        assert_eq!(parse("print ( 'hi' )"), Stmt::Print { expr: "'hi'" });
    }

    #[test]
    fn print_empty() {
        assert!(matches!(parse_line("print()", 1), Err(ScriptError::EmptyExpression)));
        assert!(matches!(parse_line("print(   )", 1), Err(ScriptError::EmptyExpression)));
    }

    #[test]
    fn print_malformed() {
        for line in ["print x", "print(x", "print", "print x)"] {
            assert!(
                matches!(parse_line(line, 1), Err(ScriptError::InvalidPrintStatement { .. })),
                "{line}"
            );
        }
    }

    #[test]
    fn control_keywords() {
        assert_eq!(parse("stop"), Stmt::Stop);
        assert_eq!(parse("forever"), Stmt::Forever);
        assert_eq!(parse("when x = 1"), Stmt::When { cond: "x = 1" });
        assert_eq!(parse("repeat until n >= 3"), Stmt::RepeatUntil { cond: "n >= 3" });
    }

    #[test]
    fn missing_conditions() {
        for line in ["when", "repeat until", "repeat until   "] {
            assert!(
                matches!(parse_line(line, 1), Err(ScriptError::MissingCondition { .. })),
                "{line}"
            );
        }
    }

    #[test]
    fn unknown_instruction_reports_line() {
        match parse_line("foo bar", 7) {
            Err(ScriptError::UnknownInstruction { text, line }) => {
                assert_eq!(text, "foo bar");
                assert_eq!(line, 7);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn keywords_are_whole_words() {
        for line in ["stopped", "forever1", "whenever x", "printer(1)", "repeat x", "stop now"] {
            assert!(
                matches!(parse_line(line, 1), Err(ScriptError::UnknownInstruction { .. })),
                "{line}"
            );
        }
    }

    #[test]
    fn arm_headers_are_not_statements() {
        assert!(matches!(parse_line("complete", 2), Err(ScriptError::UnknownInstruction { .. })));
        assert!(matches!(parse_line("or x", 2), Err(ScriptError::UnknownInstruction { .. })));
    }

    #[test]
    fn arm_header() {
        assert_eq!(parse_arm_header("  or x = 2"), Some(ArmHeader::Or { cond: "x = 2" }));
        assert_eq!(parse_arm_header("complete"), Some(ArmHeader::Complete));
        assert_eq!(parse_arm_header("or"), Some(ArmHeader::Or { cond: "" }));
        assert_eq!(parse_arm_header("order"), None);
        assert_eq!(parse_arm_header("completed"), None);
        assert_eq!(parse_arm_header("print(1)"), None);
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("count"));
        assert!(is_identifier("_tmp2"));
        assert!(!is_identifier("2x"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("none"));
    }
}
