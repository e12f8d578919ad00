//! Pure builtin functions: the three type conversions.
//!
//! `ask` also counts as a builtin but needs the console, so the interpreter
//! handles it in its `call_fn` before falling back to [`call_builtin`].

use super::expr::EvalError;
use super::value::Value;

/// Dispatch a pure builtin call.
///
/// Returns `None` if `name` is not one of the conversion builtins.
pub fn call_builtin(name: &str, args: Vec<Value>) -> Option<Result<Value, EvalError>> {
    // Inner function returns Result<Option<Value>, EvalError>:
    //   Ok(None)    → not a builtin
    //   Ok(Some(v)) → success
    //   Err(e)      → builtin call failed
    fn inner(name: &str, args: Vec<Value>) -> Result<Option<Value>, EvalError> {
        Ok(Some(match name {
            "whole" => to_whole(single_arg(name, args)?)?,
            "decimal" => to_decimal(single_arg(name, args)?)?,
            "letters" => Value::Str(single_arg(name, args)?.to_string()),
            _ => return Ok(None),
        }))
    }
    inner(name, args).transpose()
}

fn single_arg(name: &str, mut args: Vec<Value>) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::Arity {
            name: name.to_owned(),
            expected: "exactly 1",
            got: args.len(),
        });
    }
    Ok(args.remove(0))
}

fn conversion_error(target: &'static str, v: &Value) -> EvalError {
    EvalError::Conversion {
        target,
        value: v.to_string(),
    }
}

/// Integer conversion: floats truncate toward zero, text must spell an integer.
fn to_whole(v: Value) -> Result<Value, EvalError> {
    match &v {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(x) if x.is_finite() && x.trunc().abs() < 9.2e18 => Ok(Value::Int(x.trunc() as i64)),
        Value::Str(s) => s
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| conversion_error("whole", &v)),
        Value::Float(_) | Value::None => Err(conversion_error("whole", &v)),
    }
}

fn to_decimal(v: Value) -> Result<Value, EvalError> {
    match &v {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s
            .trim()
            .parse()
            .map(Value::Float)
            .map_err(|_| conversion_error("decimal", &v)),
        Value::None => Err(conversion_error("decimal", &v)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
