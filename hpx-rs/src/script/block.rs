//! Indentation-based block resolution.
//!
//! A block is never stored: it is a view onto the program's lines, namely
//! the run of lines directly after a header line that are indented deeper
//! than the header.

use std::ops::Range;

/// Number of leading whitespace characters of `line`.
///
/// A whitespace-only line counts all of its characters, terminator included.
pub fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// The body owned by the header line at index `header`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub header: usize,
    /// Exclusive end of the body; equals `header + 1` for an empty body.
    body_end: usize,
}

impl Block {
    /// Line indices of the body.
    pub fn body(&self) -> Range<usize> {
        self.header + 1..self.body_end
    }

    /// Index of the last line the block consumes: the last body line, or the
    /// header itself when the body is empty.  Dispatch resumes right after it.
    pub fn end_index(&self) -> usize {
        self.body_end - 1
    }

    pub fn is_empty(&self) -> bool {
        self.body_end == self.header + 1
    }
}

/// Resolve the block owned by `lines[header]`.
///
/// Every following line indented strictly deeper than the header belongs to
/// the body; the first line that is not (or the end of input) closes it.
/// Blank and comment lines take part in this test like any other line.
///
/// # Panics
///
/// Panics if `header` is out of bounds.
pub fn resolve_block<S: AsRef<str>>(lines: &[S], header: usize) -> Block {
    let base = indent_of(lines[header].as_ref());
    let body_len = lines[header + 1..]
        .iter()
        .take_while(|l| indent_of(l.as_ref()) > base)
        .count();
    Block {
        header,
        body_end: header + 1 + body_len,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
