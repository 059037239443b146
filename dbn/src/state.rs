use std::rc::Rc;

use crate::canvas::{Canvas, Color};
use crate::commands::{Commands, Procedure};
use crate::config::Config;
use crate::env::Environment;
use crate::error::{ErrorKind, LineNo, Result};


/// An assignment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LValue {
    Variable(String),
    Dot(i64, i64),
}

impl LValue {
    pub fn kind(&self) -> &'static str {
        match self {
            LValue::Variable(_) => "variable",
            LValue::Dot(..) => "dot",
        }
    }
}

/// Everything a running DBN program can observe.
///
/// Every update consumes the state and returns the next one. Substructures
/// are reference counted, so a clone kept by the caller stays untouched and
/// only the changed part is copied.
#[derive(Debug, Clone)]
pub struct State {
    canvas: Canvas,
    pen: Color,
    env: Environment,
    commands: Commands,
    depth: u32,
    line_no: LineNo,
    recursion_limit: u32,
}

impl Default for State {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl State {
    pub fn new(config: &Config) -> Self {
        Self {
            canvas: Canvas::new(config.paper as i64),
            pen: config.pen,
            env: Environment::new(),
            commands: Commands::default(),
            depth: 0,
            line_no: LineNo::NONE,
            recursion_limit: config.recursion_limit,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }
    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }
    pub fn pen(&self) -> Color {
        self.pen
    }
    pub fn env(&self) -> &Environment {
        &self.env
    }
    pub fn commands(&self) -> &Commands {
        &self.commands
    }
    pub fn depth(&self) -> u32 {
        self.depth
    }
    pub fn line_no(&self) -> LineNo {
        self.line_no
    }

    pub(crate) fn paint_mut(&mut self) -> (&mut Canvas, &mut Color) {
        (&mut self.canvas, &mut self.pen)
    }

    pub fn lookup_variable(&self, name: &str) -> i64 {
        self.env.get(name, 0)
    }

    pub fn lookup_command(&self, name: &str) -> Option<Rc<Procedure>> {
        self.commands.get(name).cloned()
    }

    pub fn set_line_no(mut self, line_no: LineNo) -> Result<Self> {
        if line_no.is_none() {
            return Err(ErrorKind::InvalidLineNumber.into());
        }
        self.line_no = line_no;
        Ok(self)
    }

    pub fn set_variable(mut self, name: impl Into<String>, value: i64) -> Self {
        self.env = self.env.set(name, value);
        self
    }

    pub fn set_variables<K: Into<String>>(
        mut self,
        bindings: impl IntoIterator<Item = (K, i64)>,
    ) -> Self {
        self.env = self.env.set_all(bindings);
        self
    }

    pub fn add_command(mut self, name: impl Into<String>, proc: Procedure) -> Self {
        self.commands = self.commands.add(name, proc);
        self
    }

    pub fn set(mut self, lvalue: LValue, value: i64) -> Self {
        match lvalue {
            LValue::Dot(x, y) => {
                self.canvas.put(x, y, value);
            }
            LValue::Variable(name) => self.env = self.env.set(name, value),
        }
        self
    }

    pub fn push(mut self) -> Result<Self> {
        if self.depth >= self.recursion_limit {
            return Err(ErrorKind::RecursionLimitExceeded {
                limit: self.recursion_limit,
            }
            .into());
        }
        self.env = self.env.push(self.line_no);
        self.depth += 1;
        tracing::debug!(depth = self.depth, line_no = ?self.line_no, "push scope");
        Ok(self)
    }

    pub fn pop(mut self) -> Result<Self> {
        self.env = self.env.pop()?;
        self.depth = self.depth.saturating_sub(1);
        tracing::debug!(depth = self.depth, "pop scope");
        Ok(self)
    }
}
