//! HPX scripting language.
//!
//! This module implements a tree-walking interpreter for HPX, a small
//! language whose block structure comes from indentation alone:
//!
//! - Variables bound with `store <name> to <expr>` in one flat environment
//! - Output with `print(<expr>)`, input with `ask`
//! - Conditionals: `when` … `or` … `complete`
//! - Loops: `repeat until <expr>` and `forever`, left early with `stop`
//! - Python-like expressions with the builtins `whole`, `decimal`, `letters`
//!   and `ask`
//!
//! # Quick start
//!
//! ```rust
//! use hpx::script::{BufferConsole, Interpreter};
//!
//! let mut interp = Interpreter::new(BufferConsole::new());
//! interp
//!     .exec_source("store x to 6\nrepeat until x = 8\n    store x to x + 1\nprint(x * 7)")
//!     .unwrap();
//! assert_eq!(interp.console().output, vec!["56"]);
//! ```

pub mod block;
pub mod builtins;
pub mod console;
pub mod env;
pub mod error;
pub mod expr;
pub mod interp;
pub mod stmt;
pub mod value;

// Re-exports for convenience.
pub use block::{resolve_block, Block};
pub use console::{BufferConsole, Console, StdConsole};
pub use env::Environment;
pub use error::ScriptError;
pub use expr::{evaluate, normalize_equality, EvalContext, EvalError};
pub use interp::{ControlFlow, Interpreter, Options, StopPolicy};
pub use value::Value;
