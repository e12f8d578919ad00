//! Variable environment.
//!
//! HPX has a single flat namespace: every `store` statement writes into the
//! same table, and the table lives for the whole program run, across nested
//! blocks and loop iterations alike.

use std::collections::HashMap;

use super::value::Value;

/// Global name → value store for one program run.
///
/// Not synchronised; a single environment must not be driven from several
/// threads at once.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind (or rebind) a variable.  The new value may be of any type,
    /// regardless of what the name held before.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Returns `true` if the variable is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
