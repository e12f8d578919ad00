//! Line-oriented I/O boundary.
//!
//! The interpreter never touches stdin/stdout directly.  `print(...)` writes
//! through [`Console::write_line`]; the `ask` builtin and `store x to ask`
//! read through [`Console::read_line`].

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Blocking read-a-line / write-a-line primitives.
pub trait Console {
    /// Read one line of input, after writing `prompt` (without a newline)
    /// when one is given.  The line terminator is stripped.
    fn read_line(&mut self, prompt: Option<&str>) -> io::Result<String>;

    /// Write one line of output.
    fn write_line(&mut self, text: &str) -> io::Result<()>;
}

fn strip_terminator(mut line: String) -> String {
    while line.ends_with(['\n', '\r']) {
        line.pop();
    }
    line
}

// ── StdConsole ────────────────────────────────────────────────────────────────

/// Console backed by the process's stdin and stdout.
#[derive(Debug, Default)]
pub struct StdConsole;

impl StdConsole {
    pub fn new() -> Self {
        StdConsole
    }
}

impl Console for StdConsole {
    fn read_line(&mut self, prompt: Option<&str>) -> io::Result<String> {
        if let Some(prompt) = prompt {
            let mut out = io::stdout().lock();
            out.write_all(prompt.as_bytes())?;
            out.flush()?;
        }
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "end of input while reading a line",
            ));
        }
        Ok(strip_terminator(line))
    }

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{text}")?;
        out.flush()
    }
}

// ── BufferConsole ─────────────────────────────────────────────────────────────

/// In-memory console: input comes from a queue, output and prompts are
/// captured.  Used when embedding the interpreter and in tests.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    input: VecDeque<String>,
    /// Lines produced by `print(...)`.
    pub output: Vec<String>,
    /// Prompts shown by `ask(...)`, in order.
    pub prompts: Vec<String>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Console whose reads are answered from `lines`, in order.
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BufferConsole {
            input: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Drain and return all captured output.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }
}

impl Console for BufferConsole {
    fn read_line(&mut self, prompt: Option<&str>) -> io::Result<String> {
        if let Some(prompt) = prompt {
            self.prompts.push(prompt.to_owned());
        }
        self.input
            .pop_front()
            .map(strip_terminator)
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "input queue is empty"))
    }

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.output.push(text.to_owned());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
