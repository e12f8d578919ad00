//! HPX expression lexer, AST, parser, and evaluator.
//!
//! Expressions appear in `store … to <expr>`, `print(<expr>)` and every
//! condition.  Before parsing, a lone `=` is rewritten to `==` so that
//! `when x = 5` reads as a comparison (see [`normalize_equality`]).
//!
//! Operator precedence (lowest → highest):
//!   or  →  and  →  not  →  comparison (chainable)  →  additive  →
//!   multiplicative  →  unary  →  power  →  primary
//!
//! The evaluator sees nothing but what its [`EvalContext`] exposes: the
//! program's variables and the builtin functions.

use std::io;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;

use super::error::ScriptError;
use super::value::Value;

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Dependency-injection interface used by the expression evaluator.
///
/// The [`Interpreter`](super::interp::Interpreter) implements this trait to
/// give the evaluator access to the environment and the builtins.
pub trait EvalContext {
    /// Look up a variable.
    fn get_var(&self, name: &str) -> Option<Value>;

    /// Invoke a builtin function.
    fn call_fn(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvalError>;
}

// ── EvalError ─────────────────────────────────────────────────────────────────

/// Why an expression could not be evaluated.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("name '{0}' is not defined")]
    UndefinedName(String),
    #[error("{0}")]
    Type(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("{name}() takes {expected} argument(s) but {got} were given")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },
    #[error("cannot convert {value:?} to {target}")]
    Conversion { target: &'static str, value: String },
    #[error("failed to read input: {0}")]
    Input(#[source] io::Error),
}

// ── Normalization ─────────────────────────────────────────────────────────────

fn equality_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Each match is a whole `=` run plus the `!`, `<` or `>` glued to it.
    RE.get_or_init(|| Regex::new(r"[!<>]?=+").expect("equality pattern is valid"))
}

/// Rewrite every standalone `=` into `==`.
///
/// `!=`, `<=`, `>=` and runs of `=` (`==`, `===`) are kept as written, so
/// the rewrite is idempotent.  Quoted text is not special: `'a=b'` becomes
/// `'a==b'`.
pub fn normalize_equality(src: &str) -> String {
    equality_regex()
        .replace_all(src, |caps: &Captures<'_>| match &caps[0] {
            "=" => "==".to_owned(),
            other => other.to_owned(),
        })
        .into_owned()
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),

    // Arithmetic
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,

    // Comparison
    Eq, // ==
    Ne, // !=
    Lt,
    Le,
    Gt,
    Ge,

    // Logical spellings that are not words
    AmpAmp,   // &&
    PipePipe, // ||
    Bang,

    /// A lone `=` surviving normalization (only possible inside `===`-style runs).
    Assign,

    // Misc
    Comma,
    LParen,
    RParen,
    /// Unrecognised input character; reported as a diagnostic, never as EOF.
    Unknown(char),
    Eof,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer {
    src: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Lexer {
            src: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat_digits(&mut self, s: &mut String) {
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            s.push(c);
            self.pos += 1;
        }
    }

    fn read_number(&mut self, first: char) -> Result<Token, EvalError> {
        let mut s = String::new();
        s.push(first);
        let mut is_float = first == '.';

        self.eat_digits(&mut s);
        if !is_float && self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            s.push('.');
            self.pos += 1;
            self.eat_digits(&mut s);
        }
        // Exponent only when digits actually follow.
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    s.extend(self.advance());
                }
                self.eat_digits(&mut s);
            }
        }

        if is_float {
            s.parse()
                .map(Token::Float)
                .map_err(|_| EvalError::Syntax(format!("invalid number literal {s}")))
        } else {
            s.parse()
                .map(Token::Int)
                .map_err(|_| EvalError::Syntax(format!("integer literal {s} is too large")))
        }
    }

    fn read_string(&mut self, quote: char) -> Result<Token, EvalError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(EvalError::Syntax("unterminated text literal".into())),
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => return Err(EvalError::Syntax("unterminated text literal".into())),
                },
                Some(c) if c == quote => break,
                Some(c) => s.push(c),
            }
        }
        Ok(Token::Str(s))
    }

    fn read_ident(&mut self, first: char) -> Token {
        let mut s = String::new();
        s.push(first);
        while let Some(c) = self.peek().filter(|&c| c.is_alphanumeric() || c == '_') {
            s.push(c);
            self.pos += 1;
        }
        Token::Ident(s)
    }

    fn next_token(&mut self) -> Result<Token, EvalError> {
        self.skip_ws();
        let ch = match self.advance() {
            None => return Ok(Token::Eof),
            Some(c) => c,
        };

        Ok(match ch {
            '0'..='9' => return self.read_number(ch),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => return self.read_number(ch),
            '"' | '\'' => return self.read_string(ch),
            c if c.is_alphabetic() || c == '_' => self.read_ident(c),
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => {
                if self.eat('*') {
                    Token::StarStar
                } else {
                    Token::Star
                }
            }
            '/' => {
                if self.eat('/') {
                    Token::SlashSlash
                } else {
                    Token::Slash
                }
            }
            '%' => Token::Percent,
            '!' => {
                if self.eat('=') {
                    Token::Ne
                } else {
                    Token::Bang
                }
            }
            '&' if self.eat('&') => Token::AmpAmp,
            '|' if self.eat('|') => Token::PipePipe,
            '<' => {
                if self.eat('=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '=' => {
                if self.eat('=') {
                    Token::Eq
                } else {
                    Token::Assign
                }
            }
            ',' => Token::Comma,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c => Token::Unknown(c),
        })
    }

    fn tokenize(mut self) -> Result<Vec<Token>, EvalError> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token()?;
            let done = matches!(t, Token::Eof);
            tokens.push(t);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Rem,
    Pow,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// `a < b <= c`: every adjacent pair must hold.
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    Call(String, Vec<Expr>),
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Deepest bracket / `not` / unary-sign nesting the parser accepts.
pub const MAX_NESTING: usize = 64;

/// Most binary and comparison operators one expression may contain.
pub const MAX_OPERATORS: usize = 512;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    operators: usize,
}

fn is_word(tok: &Token, word: &str) -> bool {
    matches!(tok, Token::Ident(name) if name == word)
}

/// Words with a fixed meaning inside expressions; never usable as names.
pub const RESERVED_WORDS: &[&str] = &[
    "and", "or", "not", "true", "false", "none", "True", "False", "None",
];

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
            operators: 0,
        }
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, EvalError>) -> Result<T, EvalError> {
        if self.depth >= MAX_NESTING {
            return Err(EvalError::Syntax("expression nested too deeply".into()));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Count one more operator node, failing past [`MAX_OPERATORS`].
    fn count_operator(&mut self) -> Result<(), EvalError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(EvalError::Syntax("expression has too many operators".into()));
        }
        Ok(())
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        t
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if is_word(self.peek(), word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        self.nested(Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_and()?;
        while self.eat_word("or") || self.eat(&Token::PipePipe) {
            self.count_operator()?;
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_not()?;
        while self.eat_word("and") || self.eat(&Token::AmpAmp) {
            self.count_operator()?;
            let rhs = self.parse_not()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, EvalError> {
        if self.eat_word("not") || self.eat(&Token::Bang) {
            let inner = self.nested(Self::parse_not)?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, EvalError> {
        let first = self.parse_additive()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Token::Eq => CmpOp::Eq,
                Token::Ne => CmpOp::Ne,
                Token::Lt => CmpOp::Lt,
                Token::Le => CmpOp::Le,
                Token::Gt => CmpOp::Gt,
                Token::Ge => CmpOp::Ge,
                _ => break,
            };
            self.pos += 1;
            self.count_operator()?;
            rest.push((op, self.parse_additive()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            self.count_operator()?;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::SlashSlash => BinOp::FloorDiv,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            self.count_operator()?;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        match self.peek() {
            Token::Minus => {
                self.pos += 1;
                let inner = self.nested(Self::parse_unary)?;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(inner)))
            }
            Token::Plus => {
                self.pos += 1;
                let inner = self.nested(Self::parse_unary)?;
                Ok(Expr::Unary(UnaryOp::Pos, Box::new(inner)))
            }
            _ => self.parse_power(),
        }
    }

    /// `**` binds tighter than a unary minus on its left and is right-associative.
    fn parse_power(&mut self) -> Result<Expr, EvalError> {
        let base = self.parse_primary()?;
        if self.eat(&Token::StarStar) {
            self.count_operator()?;
            let exp = self.nested(Self::parse_unary)?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let tok = self.advance();
        match tok {
            Token::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            Token::Float(x) => Ok(Expr::Literal(Value::Float(x))),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::Ident(name) => match name.as_str() {
                "true" | "True" => Ok(Expr::Literal(Value::Bool(true))),
                "false" | "False" => Ok(Expr::Literal(Value::Bool(false))),
                "none" | "None" => Ok(Expr::Literal(Value::None)),
                "and" | "or" | "not" => Err(EvalError::Syntax(format!("unexpected '{name}'"))),
                _ => {
                    if self.eat(&Token::LParen) {
                        let mut args = Vec::new();
                        if self.peek() != &Token::RParen {
                            args.push(self.parse_expr()?);
                            while self.eat(&Token::Comma) {
                                args.push(self.parse_expr()?);
                            }
                        }
                        if !self.eat(&Token::RParen) {
                            return Err(EvalError::Syntax(format!(
                                "expected ')' after arguments to {name}"
                            )));
                        }
                        Ok(Expr::Call(name, args))
                    } else {
                        Ok(Expr::Var(name))
                    }
                }
            },
            Token::LParen => {
                let inner = self.parse_expr()?;
                if !self.eat(&Token::RParen) {
                    return Err(EvalError::Syntax("expected ')'".into()));
                }
                Ok(inner)
            }
            Token::Assign => Err(EvalError::Syntax("unexpected '='".into())),
            Token::Unknown(c) => Err(EvalError::Syntax(format!("unexpected character '{c}'"))),
            Token::Eof => Err(EvalError::Syntax("unexpected end of expression".into())),
            other => Err(EvalError::Syntax(format!("unexpected token {other:?}"))),
        }
    }
}

/// Parse an (already normalized) expression string into an AST.
pub fn parse_expr(src: &str) -> Result<Expr, EvalError> {
    if src.trim().is_empty() {
        return Err(EvalError::Empty);
    }
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(EvalError::Syntax(format!("unexpected trailing token {other:?}"))),
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Evaluate an [`Expr`] AST node against the given context.
pub fn eval_expr(expr: &Expr, ctx: &mut dyn EvalContext) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),

        Expr::Var(name) => ctx
            .get_var(name)
            .ok_or_else(|| EvalError::UndefinedName(name.clone())),

        Expr::Unary(op, inner) => {
            let v = eval_expr(inner, ctx)?;
            match op {
                UnaryOp::Neg => v.arith_neg().map_err(EvalError::Type),
                UnaryOp::Pos => v.arith_pos().map_err(EvalError::Type),
                UnaryOp::Not => Ok(Value::Bool(!v.as_bool())),
            }
        }

        Expr::Binary(op, lhs, rhs) => {
            // `and`/`or` short-circuit and yield the deciding operand.
            match op {
                BinOp::And => {
                    let l = eval_expr(lhs, ctx)?;
                    if !l.as_bool() {
                        return Ok(l);
                    }
                    return eval_expr(rhs, ctx);
                }
                BinOp::Or => {
                    let l = eval_expr(lhs, ctx)?;
                    if l.as_bool() {
                        return Ok(l);
                    }
                    return eval_expr(rhs, ctx);
                }
                _ => {}
            }
            let l = eval_expr(lhs, ctx)?;
            let r = eval_expr(rhs, ctx)?;
            eval_binop(*op, &l, &r).map_err(EvalError::Type)
        }

        Expr::Compare(first, rest) => {
            let mut l = eval_expr(first, ctx)?;
            for (op, rhs) in rest {
                let r = eval_expr(rhs, ctx)?;
                if !compare(*op, &l, &r).map_err(EvalError::Type)? {
                    return Ok(Value::Bool(false));
                }
                l = r;
            }
            Ok(Value::Bool(true))
        }

        Expr::Call(name, arg_exprs) => {
            let mut args = Vec::with_capacity(arg_exprs.len());
            for ae in arg_exprs {
                args.push(eval_expr(ae, ctx)?);
            }
            ctx.call_fn(name, args)
        }
    }
}

fn eval_binop(op: BinOp, l: &Value, r: &Value) -> Result<Value, String> {
    match op {
        BinOp::Add => l.arith_add(r),
        BinOp::Sub => l.arith_sub(r),
        BinOp::Mul => l.arith_mul(r),
        BinOp::Div => l.arith_div(r),
        BinOp::FloorDiv => l.arith_floor_div(r),
        BinOp::Rem => l.arith_rem(r),
        BinOp::Pow => l.arith_pow(r),
        BinOp::And | BinOp::Or => unreachable!("handled above"),
    }
}

fn compare(op: CmpOp, l: &Value, r: &Value) -> Result<bool, String> {
    use std::cmp::Ordering;
    Ok(match op {
        CmpOp::Eq => l.loose_eq(r),
        CmpOp::Ne => !l.loose_eq(r),
        CmpOp::Lt => l.cmp_value(r, op.symbol())? == Some(Ordering::Less),
        CmpOp::Le => matches!(
            l.cmp_value(r, op.symbol())?,
            Some(Ordering::Less | Ordering::Equal)
        ),
        CmpOp::Gt => l.cmp_value(r, op.symbol())? == Some(Ordering::Greater),
        CmpOp::Ge => matches!(
            l.cmp_value(r, op.symbol())?,
            Some(Ordering::Greater | Ordering::Equal)
        ),
    })
}

/// Convenience: parse and evaluate an expression string (no normalization).
pub fn eval_str(src: &str, ctx: &mut dyn EvalContext) -> Result<Value, EvalError> {
    let expr = parse_expr(src)?;
    eval_expr(&expr, ctx)
}

/// Normalize, parse and evaluate `text`.
///
/// Failures carry the text as the program wrote it, before normalization.
pub fn evaluate(text: &str, ctx: &mut dyn EvalContext) -> Result<Value, ScriptError> {
    let normalized = normalize_equality(text.trim());
    eval_str(&normalized, ctx).map_err(|cause| ScriptError::InvalidExpression {
        text: text.trim().to_owned(),
        cause,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
