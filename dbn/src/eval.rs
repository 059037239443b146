//! The tree-walking backend.
//!
//! Three entry points mirror the three ways a node can be used: [`apply`]
//! runs a statement and threads the state, [`evaluate`] produces a value and
//! [`evaluate_lazy`] produces an assignment target.

use crate::ast::{Expr, ExprKind, Stmt, StmtKind};
use crate::commands::Procedure;
use crate::config::Config;
use crate::error::{Error, ErrorKind, Phase, Result};
use crate::state::{LValue, State};

#[cfg(test)]
mod test;

pub fn apply(stmt: &Stmt, state: State) -> Result<State> {
    apply_kind(stmt, state).map_err(|e| e.at(stmt.line_no))
}

fn apply_kind(stmt: &Stmt, state: State) -> Result<State> {
    match &stmt.kind {
        StmtKind::Block(children) => children
            .iter()
            .try_fold(state, |state, child| apply(child, state)),
        StmtKind::Set { target, value } => {
            let state = state.set_line_no(stmt.line_no)?;
            let target = evaluate_lazy(target, &state)?;
            let value = evaluate(value, &state)?;
            Ok(state.set(target, value))
        }
        StmtKind::Repeat {
            var,
            start,
            end,
            body,
        } => {
            let mut state = state.set_line_no(stmt.line_no)?;
            let var = variable(var, &state)?;
            let start = evaluate(start, &state)?;
            let end = evaluate(end, &state)?;
            for value in start.min(end)..=start.max(end) {
                state = state.set_variable(var.as_str(), value);
                state = apply(body, state)?;
            }
            Ok(state)
        }
        StmtKind::Question {
            question,
            left,
            right,
            body,
        } => {
            let state = state.set_line_no(stmt.line_no)?;
            let left = evaluate(left, &state)?;
            let right = evaluate(right, &state)?;
            if question.test(left, right) {
                apply(body, state)
            } else {
                Ok(state)
            }
        }
        StmtKind::Command { name, args } => {
            let state = state.set_line_no(stmt.line_no)?;
            let args = args
                .iter()
                .map(|arg| evaluate(arg, &state))
                .collect::<Result<Vec<_>>>()?;
            let proc = state
                .lookup_command(name)
                .ok_or_else(|| ErrorKind::UndefinedCommand { name: name.clone() })?;
            if proc.arg_count() != args.len() {
                return Err(ErrorKind::ArityMismatch {
                    name: name.clone(),
                    expected: proc.arg_count(),
                    found: args.len(),
                }
                .into());
            }
            tracing::trace!(command = %name, ?args, "call");
            let state = state
                .push()?
                .set_variables(proc.formals.iter().cloned().zip(args));
            apply(&proc.body, state)?.pop()
        }
        StmtKind::CommandDefinition {
            name,
            formals,
            body,
        } => {
            let state = state.set_line_no(stmt.line_no)?;
            let name = variable(name, &state)?;
            let formals = formals
                .iter()
                .map(|formal| variable(formal, &state))
                .collect::<Result<Vec<_>>>()?;
            if let Some(i) = (1..formals.len()).find(|&i| formals[..i].contains(&formals[i])) {
                return Err(ErrorKind::DuplicateFormal {
                    name: formals[i].clone(),
                }
                .into());
            }
            tracing::debug!(command = %name, ?formals, line_no = ?stmt.line_no, "define");
            let proc = Procedure::new(formals, body.clone(), stmt.line_no);
            Ok(state.add_command(name, proc))
        }
        StmtKind::Native(f) => f(state),
    }
}

pub fn evaluate(expr: &Expr, state: &State) -> Result<i64> {
    match &expr.kind {
        ExprKind::Bracket { x, y } => {
            let x = evaluate(x, state)?;
            let y = evaluate(y, state)?;
            Ok(state.canvas().query_pixel(x, y) as i64)
        }
        ExprKind::Operation { op, left, right } => {
            let left = evaluate(left, state)?;
            let right = evaluate(right, state)?;
            Ok(op.apply(left, right)?)
        }
        ExprKind::Number(text) => text
            .trim()
            .parse()
            .map_err(|_| ErrorKind::InvalidNumber { text: text.clone() }.into()),
        ExprKind::Word(name) => Ok(state.lookup_variable(name)),
    }
}

pub fn evaluate_lazy(expr: &Expr, state: &State) -> Result<LValue> {
    match &expr.kind {
        ExprKind::Bracket { x, y } => {
            let x = evaluate(x, state)?;
            let y = evaluate(y, state)?;
            Ok(LValue::Dot(x, y))
        }
        ExprKind::Word(name) => Ok(LValue::Variable(name.clone())),
        kind @ (ExprKind::Operation { .. } | ExprKind::Number(_)) => {
            Err(ErrorKind::UnknownNodeType {
                node: kind.name(),
                phase: Phase::EvaluateLazy,
            }
            .into())
        }
    }
}

/// Lazily evaluates a node that has to name a variable.
fn variable(expr: &Expr, state: &State) -> Result<String> {
    match evaluate_lazy(expr, state)? {
        LValue::Variable(name) => Ok(name),
        lvalue => Err(Error::from(ErrorKind::InvalidLValue {
            found: lvalue.kind(),
        })),
    }
}

/// Runs a whole program on a fresh state built from `config`.
pub fn run(program: &Stmt, config: &Config) -> Result<State> {
    apply(program, State::new(config))
}
