use std::rc::Rc;

use ahash::AHashMap;

use crate::error::{ErrorKind, LineNo};


/// A persistent scope chain of integer variables.
///
/// Each scope only points at its parent. Updates copy the local scope when it
/// is shared and never touch the parents, so every previously returned
/// environment keeps seeing its own bindings.
#[derive(Debug, Clone, Default)]
pub struct Environment(Rc<Scope>);

#[derive(Debug, Clone, Default)]
struct Scope {
    parent: Option<Environment>,
    base_line_no: LineNo,
    vars: AHashMap<String, i64>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Searches this scope, then its parents.
    pub fn get(&self, key: &str, fallback: i64) -> i64 {
        let mut env = self;
        loop {
            if let Some(&value) = env.0.vars.get(key) {
                return value;
            }
            match &env.0.parent {
                Some(parent) => env = parent,
                None => return fallback,
            }
        }
    }

    /// Binds `key` in the local scope only.
    pub fn set(mut self, key: impl Into<String>, value: i64) -> Self {
        Rc::make_mut(&mut self.0).vars.insert(key.into(), value);
        self
    }

    pub fn set_all<K: Into<String>>(mut self, bindings: impl IntoIterator<Item = (K, i64)>) -> Self {
        let scope = Rc::make_mut(&mut self.0);
        for (key, value) in bindings {
            scope.vars.insert(key.into(), value);
        }
        self
    }

    pub fn push(&self, base_line_no: LineNo) -> Self {
        Self(Rc::new(Scope {
            parent: Some(self.clone()),
            base_line_no,
            vars: AHashMap::new(),
        }))
    }

    pub fn pop(&self) -> Result<Self, ErrorKind> {
        self.0.parent.clone().ok_or(ErrorKind::ScopeUnderflow)
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.0.parent.as_ref()
    }

    /// The line that was executing when this scope was pushed.
    pub fn base_line_no(&self) -> LineNo {
        self.0.base_line_no
    }

    /// Number of bindings in the local scope.
    pub fn len(&self) -> usize {
        self.0.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.vars.is_empty()
    }

    /// Number of scopes above the root.
    pub fn depth(&self) -> usize {
        std::iter::successors(self.parent(), |env| env.parent()).count()
    }
}
