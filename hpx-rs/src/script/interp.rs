//! HPX script interpreter.
//!
//! The [`Interpreter`] owns the program's [`Environment`] and its console,
//! and dispatches source lines top to bottom.  Conditionals and loops
//! resolve their body from indentation and dispatch it recursively over the
//! same line slice, then report the last line they consumed so the caller
//! can resume after it.  It implements [`EvalContext`] so the expression
//! evaluator can call back into it for variable lookups and builtins.

use std::ops::Range;

use tracing::{debug, trace};

use super::{
    block::{resolve_block, Block},
    builtins::call_builtin,
    console::{Console, StdConsole},
    env::Environment,
    error::ScriptError,
    expr::{self, EvalContext, EvalError},
    stmt::{parse_arm_header, parse_line, required_condition, ArmHeader, Stmt, StoreValue},
    value::Value,
};

// ── Options ───────────────────────────────────────────────────────────────────

/// What a `stop` that no loop catches means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopPolicy {
    /// The program simply ends; `execute` succeeds.
    #[default]
    Halt,
    /// `execute` fails with [`ScriptError::MisplacedStop`].
    Error,
}

/// Interpreter configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub stop_policy: StopPolicy,
}

// ── ControlFlow ───────────────────────────────────────────────────────────────

/// Non-error control-flow signals that unwind the dispatch call chain.
///
/// Conditionals pass it through untouched; the nearest loop consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Stop,
}

/// One arm of a conditional: `None` marks the `complete` fallback.
#[derive(Debug)]
struct Arm<'a> {
    cond: Option<&'a str>,
    block: Block,
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// The HPX interpreter.
///
/// One interpreter runs one program against one environment on one thread;
/// driving the same interpreter from several threads is unsupported.
pub struct Interpreter<C: Console = StdConsole> {
    env: Environment,
    console: C,
    options: Options,
}

impl<C: Console> Interpreter<C> {
    pub fn new(console: C) -> Self {
        Self::with_options(console, Options::default())
    }

    pub fn with_options(console: C, options: Options) -> Self {
        Interpreter {
            env: Environment::new(),
            console,
            options,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn into_console(self) -> C {
        self.console
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Run a whole program.
    pub fn execute<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<(), ScriptError> {
        match self.run_block(lines, 0..lines.len())? {
            Some(ControlFlow::Stop) => match self.options.stop_policy {
                StopPolicy::Halt => {
                    debug!("stop outside any loop; halting");
                    Ok(())
                }
                StopPolicy::Error => Err(ScriptError::MisplacedStop),
            },
            None => Ok(()),
        }
    }

    /// Run program source held in memory.
    pub fn exec_source(&mut self, src: &str) -> Result<(), ScriptError> {
        self.execute(&crate::loader::split_lines(src))
    }

    /// Evaluate one expression against the current environment.
    pub fn evaluate(&mut self, text: &str) -> Result<Value, ScriptError> {
        expr::evaluate(text, self)
    }

    /// Dispatch every statement in `range`, in order.
    ///
    /// Returns `Some(ControlFlow::Stop)` as soon as a `stop` executes and no
    /// loop inside `range` has caught it.
    pub fn run_block<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        range: Range<usize>,
    ) -> Result<Option<ControlFlow>, ScriptError> {
        let end = range.end;
        let mut i = range.start;
        while i < end {
            let Some(stmt) = parse_line(lines[i].as_ref(), i + 1)? else {
                i += 1;
                continue;
            };
            debug!(line = i + 1, kind = stmt.kind(), "dispatch");

            match stmt {
                Stmt::Store { name, value } => self.exec_store(name, value)?,
                Stmt::Print { expr } => self.exec_print(expr)?,
                Stmt::Stop => return Ok(Some(ControlFlow::Stop)),
                Stmt::When { cond } => {
                    let (flow, last) = self.exec_when(lines, i, cond, end)?;
                    if flow.is_some() {
                        return Ok(flow);
                    }
                    i = last;
                }
                Stmt::RepeatUntil { cond } => i = self.exec_repeat_until(lines, i, cond)?,
                Stmt::Forever => i = self.exec_forever(lines, i)?,
            }
            i += 1;
        }
        Ok(None)
    }

    // ── Simple statements ─────────────────────────────────────────────────────

    fn exec_store(&mut self, name: &str, value: StoreValue<'_>) -> Result<(), ScriptError> {
        let v = match value {
            StoreValue::ReadInput => Value::Str(self.console.read_line(None)?),
            StoreValue::Expr(src) => self.evaluate(src)?,
        };
        self.env.set(name, v);
        Ok(())
    }

    fn exec_print(&mut self, src: &str) -> Result<(), ScriptError> {
        let v = self.evaluate(src)?;
        self.console.write_line(&v.to_string())?;
        Ok(())
    }

    // ── Conditional ───────────────────────────────────────────────────────────

    /// Collect the arms of the conditional opened at `index`, run the first
    /// arm whose condition holds, and return the index of the last line the
    /// construct consumed.
    ///
    /// Arms are only collected within `limit`, the end of the range being
    /// dispatched.  A `stop` raised by the selected body is handed back
    /// unobserved.
    fn exec_when<'a, S: AsRef<str>>(
        &mut self,
        lines: &'a [S],
        index: usize,
        cond: &'a str,
        limit: usize,
    ) -> Result<(Option<ControlFlow>, usize), ScriptError> {
        let mut arms = vec![Arm {
            cond: Some(cond),
            block: resolve_block(lines, index),
        }];

        // Every `or`/`complete` line directly after an arm body joins the
        // conditional, even past a `complete`; arms after it never run.
        while let Some(arm) = arms.last() {
            let next = arm.block.end_index() + 1;
            if next >= limit {
                break;
            }
            let raw = lines[next].as_ref();
            let cond = match parse_arm_header(raw) {
                Some(ArmHeader::Or { cond }) => Some(required_condition(raw.trim(), cond)?),
                Some(ArmHeader::Complete) => None,
                None => break,
            };
            arms.push(Arm {
                cond,
                block: resolve_block(lines, next),
            });
        }

        let last = arms
            .last()
            .map_or(index, |arm| arm.block.end_index());

        for (n, arm) in arms.iter().enumerate() {
            let selected = match arm.cond {
                None => true,
                Some(cond) => self.evaluate(cond)?.as_bool(),
            };
            if selected {
                debug!(line = arm.block.header + 1, arm = n, "conditional arm selected");
                let flow = self.run_block(lines, arm.block.body())?;
                return Ok((flow, last));
            }
        }
        trace!(line = index + 1, "no conditional arm selected");
        Ok((None, last))
    }

    // ── Loops ─────────────────────────────────────────────────────────────────

    /// `repeat until <cond>`: check, then run the body, until the condition
    /// holds or the body stops the loop.
    fn exec_repeat_until<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        index: usize,
        cond: &str,
    ) -> Result<usize, ScriptError> {
        let block = resolve_block(lines, index);
        let mut iterations: u64 = 0;
        while !self.evaluate(cond)?.as_bool() {
            iterations += 1;
            trace!(line = index + 1, iterations, "repeat until iteration");
            if let Some(ControlFlow::Stop) = self.run_block(lines, block.body())? {
                debug!(line = index + 1, iterations, "repeat until stopped");
                return Ok(block.end_index());
            }
        }
        debug!(line = index + 1, iterations, "repeat until condition met");
        Ok(block.end_index())
    }

    /// `forever`: run the body until it stops the loop.
    fn exec_forever<S: AsRef<str>>(&mut self, lines: &[S], index: usize) -> Result<usize, ScriptError> {
        let block = resolve_block(lines, index);
        let mut iterations: u64 = 0;
        loop {
            iterations += 1;
            trace!(line = index + 1, iterations, "forever iteration");
            if let Some(ControlFlow::Stop) = self.run_block(lines, block.body())? {
                debug!(line = index + 1, iterations, "forever stopped");
                return Ok(block.end_index());
            }
        }
    }
}

// ── EvalContext ───────────────────────────────────────────────────────────────

impl<C: Console> EvalContext for Interpreter<C> {
    fn get_var(&self, name: &str) -> Option<Value> {
        self.env.get(name).cloned()
    }

    fn call_fn(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        if name == "ask" {
            if args.len() > 1 {
                return Err(EvalError::Arity {
                    name: name.to_owned(),
                    expected: "at most 1",
                    got: args.len(),
                });
            }
            let prompt = args.first().map(Value::to_string);
            return self
                .console
                .read_line(prompt.as_deref())
                .map(Value::Str)
                .map_err(EvalError::Input);
        }
        call_builtin(name, args).unwrap_or_else(|| Err(EvalError::UnknownFunction(name.to_owned())))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::console::BufferConsole;

    fn run_with(src: &str, input: &[&str]) -> Interpreter<BufferConsole> {
        let mut interp = Interpreter::new(BufferConsole::with_input(input.iter().copied()));
        interp.exec_source(src).expect("exec failed");
        interp
    }

    fn run(src: &str) -> Interpreter<BufferConsole> {
        run_with(src, &[])
    }

    fn output(src: &str) -> Vec<String> {
        run(src).into_console().output
    }

    fn error(src: &str) -> ScriptError {
        Interpreter::new(BufferConsole::new())
            .exec_source(src)
            .expect_err("expected failure")
    }

    #[test]
    fn store_and_read_back() {
        let interp = run("store x to 2 + 3");
        assert_eq!(interp.env().get("x"), Some(&Value::Int(5)));
    }

    #[test]
    fn print_values() {
        let src = "store x to 2\nprint(x * 1.5)\nprint('hi')\nprint(x = 2)\nprint(none)";
        assert_eq!(output(src), vec!["3.0", "hi", "true", "none"]);
    }

    #[test]
    fn rebinding_changes_type() {
        let interp = run("store x to 1\nstore x to 'one'");
        assert_eq!(interp.env().get("x"), Some(&Value::from("one")));
    }

    #[test]
    fn blank_and_comment_lines_skipped() {
        let src = "# header\n\nprint(1)\n   # indented comment\nprint(2)";
        assert_eq!(output(src), vec!["1", "2"]);
    }

    #[test]
    fn store_reads_input() {
        let interp = run_with("store name to ask\nprint('hi ' + name)", &["Ada"]);
        assert_eq!(interp.env().get("name"), Some(&Value::from("Ada")));
        assert_eq!(interp.console().output, vec!["hi Ada"]);
        assert!(interp.console().prompts.is_empty());
    }

    #[test]
    fn ask_builtin_with_prompt() {
        let interp = run_with("store n to whole(ask('Number? '))\nprint(n * 2)", &["21"]);
        assert_eq!(interp.console().prompts, vec!["Number? "]);
        assert_eq!(interp.console().output, vec!["42"]);
    }

    #[test]
    fn ask_without_input_fails() {
        assert!(matches!(
            error("store x to ask()"),
            ScriptError::InvalidExpression {
                cause: EvalError::Input(_),
                ..
            }
        ));
        assert!(matches!(error("store x to ask"), ScriptError::Io(_)));
    }

    #[test]
    fn when_selects_matching_arm() {
        let src = "\
store x to 2
when x = 1
    print('one')
or x = 2
    print('two')
complete
    print('other')
print('after')";
        assert_eq!(output(src), vec!["two", "after"]);
    }

    #[test]
    fn when_first_true_arm_wins() {
        let src = "\
store x to 5
when x > 1
    print('a')
or x > 2
    print('b')";
        assert_eq!(output(src), vec!["a"]);
    }

    #[test]
    fn when_falls_back_to_complete() {
        let src = "store x to 9\nwhen x = 1\n    print('one')\ncomplete\n    print('other')";
        assert_eq!(output(src), vec!["other"]);
    }

    #[test]
    fn when_without_match_is_noop() {
        let src = "store x to 9\nwhen x = 1\n    print('one')\nor x = 2\n    print('two')\nprint('done')";
        assert_eq!(output(src), vec!["done"]);
    }

    #[test]
    fn later_conditions_not_evaluated_after_match() {
        // `missing` is undefined; evaluating the second arm would fail.
        let src = "when true\n    print('yes')\nor missing\n    print('no')";
        assert_eq!(output(src), vec!["yes"]);
    }

    #[test]
    fn when_with_empty_bodies() {
        let src = "when true\nor false\nprint('next')";
        assert_eq!(output(src), vec!["next"]);
    }

    #[test]
    fn arms_after_complete_are_collected_but_never_run() {
        let src = "\
when false
    print(1)
complete
    print(2)
or true
    print(3)
print(4)";
        assert_eq!(output(src), vec!["2", "4"]);
    }

    #[test]
    fn arm_after_complete_still_needs_condition() {
        let src = "when true\n    print(1)\ncomplete\n    print(2)\nor\n    print(3)";
        assert!(matches!(error(src), ScriptError::MissingCondition { .. }));
    }

    #[test]
    fn or_requires_condition() {
        let src = "when false\n    print(1)\nor\n    print(2)";
        assert!(matches!(error(src), ScriptError::MissingCondition { .. }));
    }

    #[test]
    fn repeat_until_counts() {
        let src = "\
store count to 0
repeat until count = 3
    print(count)
    store count to count + 1";
        assert_eq!(output(src), vec!["0", "1", "2"]);
    }

    #[test]
    fn repeat_until_already_true_skips_body() {
        let src = "repeat until true\n    print('never')\nprint('after')";
        assert_eq!(output(src), vec!["after"]);
    }

    #[test]
    fn repeat_until_stop() {
        let src = "\
store n to 0
repeat until n = 100
    store n to n + 1
    when n = 2
        stop
    print(n)
print('end ' + letters(n))";
        assert_eq!(output(src), vec!["1", "end 2"]);
    }

    #[test]
    fn forever_with_stop_runs_once() {
        let src = "forever\n    print('once')\n    stop\n    print('never')\nprint('after')";
        assert_eq!(output(src), vec!["once", "after"]);
    }

    #[test]
    fn stop_escapes_nested_conditional() {
        let src = "\
store i to 0
forever
    store i to i + 1
    when true
        stop
    complete
        print('unreachable')
print(i)";
        assert_eq!(output(src), vec!["1"]);
    }

    #[test]
    fn stop_only_leaves_innermost_loop() {
        let src = "\
store outer to 0
repeat until outer = 2
    store outer to outer + 1
    forever
        print(outer)
        stop
print('done')";
        assert_eq!(output(src), vec!["1", "2", "done"]);
    }

    #[test]
    fn environment_shared_across_blocks() {
        let src = "\
store total to 0
store i to 0
repeat until i = 4
    store i to i + 1
    when i % 2 = 0
        store total to total + i
print(total)";
        assert_eq!(output(src), vec!["6"]);
    }

    #[test]
    fn nested_when_in_when() {
        let src = "\
store a to 1
store b to 2
when a = 1
    when b = 3
        print('x')
    or b = 2
        print('y')
    print('z')
complete
    print('w')";
        assert_eq!(output(src), vec!["y", "z"]);
    }

    #[test]
    fn or_outside_range_is_not_collected() {
        // The dedented `or` belongs to the top level, not to the inner `when`.
        let src = "\
store n to 0
forever
    store n to n + 1
    when n = 1
        stop
or n = 2
    print('bad')";
        assert!(matches!(error(src), ScriptError::UnknownInstruction { line: 6, .. }));
    }

    #[test]
    fn top_level_stop_halts() {
        let interp = run("print(1)\nstop\nprint(2)");
        assert_eq!(interp.console().output, vec!["1"]);
    }

    #[test]
    fn top_level_stop_inside_conditional_halts() {
        assert_eq!(output("when true\n    stop\nprint(2)"), Vec::<String>::new());
    }

    #[test]
    fn strict_policy_rejects_top_level_stop() {
        let options = Options {
            stop_policy: StopPolicy::Error,
        };
        let mut interp = Interpreter::with_options(BufferConsole::new(), options);
        assert!(matches!(
            interp.exec_source("print(1)\nstop"),
            Err(ScriptError::MisplacedStop)
        ));
        assert_eq!(interp.console().output, vec!["1"]);

        let mut interp = Interpreter::with_options(BufferConsole::new(), options);
        interp.exec_source("forever\n    stop").expect("caught stop is fine");
    }

    #[test]
    fn unknown_instruction_line_number() {
        let err = error("print(1)\n\nforever\n    foo bar");
        match err {
            ScriptError::UnknownInstruction { text, line } => {
                assert_eq!(text, "foo bar");
                assert_eq!(line, 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn errors_abort_remaining_program() {
        let mut interp = Interpreter::new(BufferConsole::new());
        let err = interp.exec_source("print(1)\nprint(nope)\nprint(3)").unwrap_err();
        assert!(matches!(err, ScriptError::InvalidExpression { ref text, .. } if text == "nope"));
        assert_eq!(interp.console().output, vec!["1"]);
    }

    #[test]
    fn statement_errors() {
        assert!(matches!(error("print()"), ScriptError::EmptyExpression));
        assert!(matches!(error("store x foo 5"), ScriptError::InvalidStoreStatement { .. }));
        assert!(matches!(error("print 5"), ScriptError::InvalidPrintStatement { .. }));
        assert!(matches!(error("repeat until"), ScriptError::MissingCondition { .. }));
    }

    #[test]
    fn missing_condition_before_any_iteration() {
        let err = error("print('start')\nrepeat until   \n    print('body')");
        assert!(matches!(err, ScriptError::MissingCondition { .. }));
    }

    #[test]
    fn conversion_builtins_visible() {
        let src = "print(whole('7') + decimal('0.5'))\nprint(letters(3) + letters(true))";
        assert_eq!(output(src), vec!["7.5", "3true"]);
    }

    #[test]
    fn only_builtins_are_callable() {
        assert!(matches!(
            error("print(exit(1))"),
            ScriptError::InvalidExpression {
                cause: EvalError::UnknownFunction(_),
                ..
            }
        ));
    }

    #[test]
    fn evaluate_against_environment() {
        let mut interp = Interpreter::new(BufferConsole::new());
        interp.env_mut().set("x", Value::Int(2));
        assert_eq!(interp.evaluate("x = 2").unwrap(), Value::Bool(true));
    }

    #[test]
    fn execute_accepts_string_slices() {
        let lines = vec!["forever".to_owned(), "    print(1)".to_owned(), "    stop".to_owned()];
        let mut interp = Interpreter::new(BufferConsole::new());
        interp.execute(&lines).unwrap();
        assert_eq!(interp.console().output, vec!["1"]);
    }
}
