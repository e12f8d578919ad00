//! Runtime value type for the HPX scripting language.
//!
//! HPX is dynamically typed: a variable may hold an integer and later a
//! piece of text.  Values are only ever produced by expression evaluation or
//! by reading a line of input.

use std::cmp::Ordering;
use std::fmt;

/// Longest text a `*` repetition may produce, in bytes.
pub const MAX_REPEAT_LEN: usize = 1 << 28;

/// An HPX runtime value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    #[default]
    None,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                // Integral floats keep a trailing `.0` so they read as floats;
                // large ones switch to exponent form.
                if x.fract() == 0.0 && x.abs() < 1e16 {
                    write!(f, "{x:.1}")
                } else if x.is_finite() && x.abs() >= 1e16 {
                    write!(f, "{x:e}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(true) => write!(f, "true"),
            Value::Bool(false) => write!(f, "false"),
            Value::None => write!(f, "none"),
        }
    }
}

impl Value {
    /// Truthiness: `0`, `0.0`, `""`, `false` and `none` are falsy.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::None => false,
        }
    }

    /// Name of the type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "whole",
            Value::Float(_) => "decimal",
            Value::Str(_) => "letters",
            Value::Bool(_) => "truth",
            Value::None => "none",
        }
    }

    // ── Arithmetic helpers ────────────────────────────────────────────────────

    /// Numeric view of a value; booleans count as 0/1.
    fn number(&self) -> Option<Number> {
        match self {
            Value::Int(n) => Some(Number::Int(*n)),
            Value::Float(x) => Some(Number::Float(*x)),
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Str(_) | Value::None => None,
        }
    }

    /// Promote both operands to a common numeric type.
    fn numeric_pair(&self, rhs: &Value, op: &str) -> Result<(Number, Number), String> {
        match (self.number(), rhs.number()) {
            (Some(a), Some(b)) => Ok(match (a, b) {
                (Number::Int(_), Number::Int(_)) => (a, b),
                _ => (Number::Float(a.as_f64()), Number::Float(b.as_f64())),
            }),
            _ => Err(self.unsupported(op, rhs)),
        }
    }

    fn unsupported(&self, op: &str, rhs: &Value) -> String {
        format!(
            "unsupported operand types for {op}: {} and {}",
            self.type_name(),
            rhs.type_name()
        )
    }

    pub fn arith_add(&self, rhs: &Value) -> Result<Value, String> {
        if let (Value::Str(a), Value::Str(b)) = (self, rhs) {
            return Ok(Value::Str(format!("{a}{b}")));
        }
        match self.numeric_pair(rhs, "+")? {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map(Value::Int)
                .ok_or_else(|| "integer overflow in +".to_owned()),
            (a, b) => Ok(Value::Float(a.as_f64() + b.as_f64())),
        }
    }

    pub fn arith_sub(&self, rhs: &Value) -> Result<Value, String> {
        match self.numeric_pair(rhs, "-")? {
            (Number::Int(a), Number::Int(b)) => a
                .checked_sub(b)
                .map(Value::Int)
                .ok_or_else(|| "integer overflow in -".to_owned()),
            (a, b) => Ok(Value::Float(a.as_f64() - b.as_f64())),
        }
    }

    pub fn arith_mul(&self, rhs: &Value) -> Result<Value, String> {
        match (self, rhs) {
            (Value::Str(s), other) | (other, Value::Str(s)) if !matches!(other, Value::Str(_)) => {
                match other.number() {
                    Some(Number::Int(n)) => {
                        let count = usize::try_from(n.max(0)).map_err(|_| "repeat count too large".to_owned())?;
                        s.len()
                            .checked_mul(count)
                            .filter(|&len| len <= MAX_REPEAT_LEN)
                            .map(|_| Value::Str(s.repeat(count)))
                            .ok_or_else(|| "repeated text too long".to_owned())
                    }
                    _ => Err(self.unsupported("*", rhs)),
                }
            }
            _ => match self.numeric_pair(rhs, "*")? {
                (Number::Int(a), Number::Int(b)) => a
                    .checked_mul(b)
                    .map(Value::Int)
                    .ok_or_else(|| "integer overflow in *".to_owned()),
                (a, b) => Ok(Value::Float(a.as_f64() * b.as_f64())),
            },
        }
    }

    /// True division: always produces a float.
    pub fn arith_div(&self, rhs: &Value) -> Result<Value, String> {
        let (a, b) = self.numeric_pair(rhs, "/")?;
        if b.as_f64() == 0.0 {
            return Err("division by zero".into());
        }
        Ok(Value::Float(a.as_f64() / b.as_f64()))
    }

    /// Floor division.
    pub fn arith_floor_div(&self, rhs: &Value) -> Result<Value, String> {
        match self.numeric_pair(rhs, "//")? {
            (_, b) if b.as_f64() == 0.0 => Err("division by zero".into()),
            (Number::Int(a), Number::Int(b)) => {
                let q = a
                    .checked_div(b)
                    .ok_or_else(|| "integer overflow in //".to_owned())?;
                let r = a.wrapping_rem(b);
                Ok(Value::Int(if r != 0 && ((r < 0) != (b < 0)) { q - 1 } else { q }))
            }
            (a, b) => Ok(Value::Float((a.as_f64() / b.as_f64()).floor())),
        }
    }

    /// Remainder with the sign of the divisor.
    pub fn arith_rem(&self, rhs: &Value) -> Result<Value, String> {
        match self.numeric_pair(rhs, "%")? {
            (_, b) if b.as_f64() == 0.0 => Err("modulo by zero".into()),
            (Number::Int(a), Number::Int(b)) => {
                let r = a.wrapping_rem(b);
                Ok(Value::Int(if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }))
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                let r = a % b;
                Ok(Value::Float(if r != 0.0 && ((r < 0.0) != (b < 0.0)) { r + b } else { r }))
            }
        }
    }

    pub fn arith_pow(&self, rhs: &Value) -> Result<Value, String> {
        match self.numeric_pair(rhs, "**")? {
            (Number::Int(a), Number::Int(b)) if b >= 0 => u32::try_from(b)
                .ok()
                .and_then(|b| a.checked_pow(b))
                .map(Value::Int)
                .ok_or_else(|| "integer overflow in **".to_owned()),
            (a, b) => Ok(Value::Float(a.as_f64().powf(b.as_f64()))),
        }
    }

    pub fn arith_neg(&self) -> Result<Value, String> {
        match self.number() {
            Some(Number::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| "integer overflow in unary -".to_owned()),
            Some(Number::Float(x)) => Ok(Value::Float(-x)),
            None => Err(format!("bad operand type for unary -: {}", self.type_name())),
        }
    }

    /// Unary plus: numeric identity, booleans become integers.
    pub fn arith_pos(&self) -> Result<Value, String> {
        match self.number() {
            Some(Number::Int(n)) => Ok(Value::Int(n)),
            Some(Number::Float(x)) => Ok(Value::Float(x)),
            None => Err(format!("bad operand type for unary +: {}", self.type_name())),
        }
    }

    // ── Comparison ────────────────────────────────────────────────────────────

    /// Equality never fails: unrelated types simply compare unequal.
    pub fn loose_eq(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::None, Value::None) => true,
            _ => match (self.number(), rhs.number()) {
                (Some(Number::Int(a)), Some(Number::Int(b))) => a == b,
                (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
                _ => false,
            },
        }
    }

    /// Ordering comparison; fails for unrelated types.
    ///
    /// A NaN operand yields `None`, which every ordering operator treats as
    /// "not satisfied".
    pub fn cmp_value(&self, rhs: &Value, op: &str) -> Result<Option<Ordering>, String> {
        match (self, rhs) {
            (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
            _ => match (self.number(), rhs.number()) {
                (Some(Number::Int(a)), Some(Number::Int(b))) => Ok(Some(a.cmp(&b))),
                (Some(a), Some(b)) => Ok(a.as_f64().partial_cmp(&b.as_f64())),
                _ => Err(format!(
                    "'{op}' not supported between {} and {}",
                    self.type_name(),
                    rhs.type_name()
                )),
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
