//! The single error family reported by the interpreter.

use thiserror::Error;

use super::expr::EvalError;

/// Every way running an HPX program can fail.
///
/// None of these are recovered internally: the first one aborts the run and
/// is returned from [`Interpreter::execute`](super::Interpreter::execute).
/// The `stop` signal is ordinary control flow and never appears here unless
/// the strict [`StopPolicy`](super::StopPolicy) is selected.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("print() requires an expression")]
    EmptyExpression,

    #[error("invalid expression `{text}`: {cause}")]
    InvalidExpression {
        text: String,
        #[source]
        cause: EvalError,
    },

    #[error("unknown instruction: `{text}` (line {line})")]
    UnknownInstruction { text: String, line: usize },

    #[error("invalid store statement, use store <name> to <expression>: `{text}`")]
    InvalidStoreStatement { text: String },

    #[error("invalid print statement, use print(<expression>): `{text}`")]
    InvalidPrintStatement { text: String },

    #[error("`{text}` requires a condition")]
    MissingCondition { text: String },

    #[error("`stop` used outside of any loop")]
    MisplacedStop,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
