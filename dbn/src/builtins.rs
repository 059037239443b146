//! `Line`, `Paper` and `Pen`, wrapped as ordinary procedures.
//!
//! Each builtin body is a native statement that reads its formals from the
//! current scope, so calls go through the same path as user commands.

use std::rc::Rc;

use crate::ast;
use crate::canvas::{clip, Canvas, Color};
use crate::commands::Procedure;
use crate::error::{ErrorKind, LineNo, Result};
use crate::state::State;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Line,
    Paper,
    Pen,
}

impl Builtin {
    pub const ALL: [Builtin; 3] = [Builtin::Line, Builtin::Paper, Builtin::Pen];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Line => "Line",
            Builtin::Paper => "Paper",
            Builtin::Pen => "Pen",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn formals(self) -> &'static [&'static str] {
        match self {
            Builtin::Line => &["blX", "blY", "trX", "trY"],
            Builtin::Paper | Builtin::Pen => &["value"],
        }
    }

    pub fn procedure(self) -> Procedure {
        let body = ast::native(match self {
            Builtin::Line => line,
            Builtin::Paper => paper,
            Builtin::Pen => pen,
        });
        Procedure::new(
            self.formals().iter().map(|f| f.to_string()).collect(),
            Rc::new(body),
            LineNo::NONE,
        )
    }

    /// Applies the builtin to a canvas and pen color in place. Nothing is
    /// touched when `args` does not match the builtin's formals.
    pub fn call(
        self,
        canvas: &mut Canvas,
        pen: &mut Color,
        args: &[i64],
    ) -> Result<(), ErrorKind> {
        match (self, args) {
            (Builtin::Line, &[bl_x, bl_y, tr_x, tr_y]) => {
                canvas.line(bl_x, bl_y, tr_x, tr_y, *pen);
            }
            (Builtin::Paper, &[value]) => *canvas = Canvas::new(value),
            (Builtin::Pen, &[value]) => *pen = clip(value),
            _ => {
                return Err(ErrorKind::ArityMismatch {
                    name: self.name().into(),
                    expected: self.formals().len(),
                    found: args.len(),
                })
            }
        }
        Ok(())
    }
}

fn native(builtin: Builtin, mut state: State) -> Result<State> {
    let args: Vec<i64> = builtin
        .formals()
        .iter()
        .map(|formal| state.lookup_variable(formal))
        .collect();
    let (canvas, pen) = state.paint_mut();
    builtin.call(canvas, pen, &args)?;
    Ok(state)
}

fn line(state: State) -> Result<State> {
    native(Builtin::Line, state)
}

fn paper(state: State) -> Result<State> {
    native(Builtin::Paper, state)
}

fn pen(state: State) -> Result<State> {
    native(Builtin::Pen, state)
}
