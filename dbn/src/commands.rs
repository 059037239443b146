use std::rc::Rc;

use ahash::AHashMap;

use crate::ast::Stmt;
use crate::builtins::Builtin;
use crate::error::LineNo;

/// A callable command: formal argument names and the body they are bound in.
#[derive(Debug)]
pub struct Procedure {
    pub formals: Vec<String>,
    pub body: Rc<Stmt>,
    pub line_no: LineNo,
}

impl Procedure {
    pub fn new(formals: Vec<String>, body: Rc<Stmt>, line_no: LineNo) -> Self {
        Self {
            formals,
            body,
            line_no,
        }
    }
    pub fn arg_count(&self) -> usize {
        self.formals.len()
    }
}

/// Command name to procedure, case-sensitive, shared between state versions.
#[derive(Debug, Clone)]
pub struct Commands(Rc<AHashMap<String, Rc<Procedure>>>);

impl Default for Commands {
    /// Starts with `Line`, `Paper` and `Pen`.
    fn default() -> Self {
        let inner = Builtin::ALL
            .iter()
            .map(|b| (b.name().to_owned(), Rc::new(b.procedure())))
            .collect();
        Self(Rc::new(inner))
    }
}

impl Commands {
    pub fn empty() -> Self {
        Self(Rc::default())
    }

    pub fn get(&self, name: &str) -> Option<&Rc<Procedure>> {
        self.0.get(name)
    }

    pub fn add(mut self, name: impl Into<String>, proc: Procedure) -> Self {
        Rc::make_mut(&mut self.0).insert(name.into(), Rc::new(proc));
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
