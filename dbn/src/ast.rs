//! Tree form of a parsed DBN program.
//!
//! Statements and values are separate types, so a statement can never be
//! handed to the value evaluator and the other way around. Trees come from an
//! external parser; the constructor functions at the bottom of this module
//! build them by hand.

use std::rc::Rc;

use crate::error::{ErrorKind, LineNo, Result};
use crate::state::State;


/// A source token kept only for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub line_no: u32,
    pub char_no: u32,
    pub end_char_no: u32,
}

#[derive(Debug, Clone)]
pub struct Node<K> {
    pub kind: K,
    pub line_no: LineNo,
    pub tokens: Vec<Token>,
}

pub type Stmt = Node<StmtKind>;
pub type Expr = Node<ExprKind>;

/// Native code run in place of an AST body.
pub type NativeFn = fn(State) -> Result<State>;

#[derive(Debug, Clone)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    Set {
        target: Expr,
        value: Expr,
    },
    Repeat {
        var: Expr,
        start: Expr,
        end: Expr,
        body: Box<Stmt>,
    },
    Question {
        question: Question,
        left: Expr,
        right: Expr,
        body: Box<Stmt>,
    },
    Command {
        name: String,
        args: Vec<Expr>,
    },
    CommandDefinition {
        name: Expr,
        formals: Vec<Expr>,
        body: Rc<Stmt>,
    },
    Native(NativeFn),
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// A pixel `[x y]`.
    Bracket { x: Box<Expr>, y: Box<Expr> },
    Operation {
        op: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Number(String),
    Word(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Question {
    Same,
    NotSame,
    Smaller,
    NotSmaller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Question {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Same" => Question::Same,
            "NotSame" => Question::NotSame,
            "Smaller" => Question::Smaller,
            "NotSmaller" => Question::NotSmaller,
            _ => return None,
        })
    }
    pub fn test(self, left: i64, right: i64) -> bool {
        match self {
            Question::Same => left == right,
            Question::NotSame => left != right,
            Question::Smaller => left < right,
            Question::NotSmaller => left >= right,
        }
    }
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            _ => return None,
        })
    }

    /// Integer arithmetic; `/` rounds half toward positive infinity.
    pub fn apply(self, left: i64, right: i64) -> Result<i64, ErrorKind> {
        Ok(match self {
            Operator::Add => left.wrapping_add(right),
            Operator::Sub => left.wrapping_sub(right),
            Operator::Mul => left.wrapping_mul(right),
            Operator::Div => {
                if right == 0 {
                    return Err(ErrorKind::DivisionByZero);
                }
                let (n, d) = if right < 0 {
                    (-(left as i128), -(right as i128))
                } else {
                    (left as i128, right as i128)
                };
                (2 * n + d).div_euclid(2 * d) as i64
            }
        })
    }
}

impl StmtKind {
    pub fn name(&self) -> &'static str {
        match self {
            StmtKind::Block(_) => "block",
            StmtKind::Set { .. } => "set",
            StmtKind::Repeat { .. } => "repeat",
            StmtKind::Question { .. } => "question",
            StmtKind::Command { .. } => "command",
            StmtKind::CommandDefinition { .. } => "command_definition",
            StmtKind::Native(_) => "native",
        }
    }
}

impl ExprKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Bracket { .. } => "bracket",
            ExprKind::Operation { .. } => "operation",
            ExprKind::Number(_) => "number",
            ExprKind::Word(_) => "word",
        }
    }
}

impl<K> Node<K> {
    pub fn new(kind: K) -> Self {
        Self {
            kind,
            line_no: LineNo::NONE,
            tokens: Vec::new(),
        }
    }
    pub fn with_line(mut self, line_no: u32) -> Self {
        self.line_no = LineNo::new(line_no);
        self
    }
    pub fn with_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.tokens = tokens;
        self
    }
    /// `(line, char)` of the first token.
    pub fn start_location(&self) -> Option<(u32, u32)> {
        self.tokens.first().map(|t| (t.line_no, t.char_no))
    }
    /// `(line, char)` where the last token ends.
    pub fn end_location(&self) -> Option<(u32, u32)> {
        self.tokens.last().map(|t| (t.line_no, t.end_char_no))
    }
}

pub fn block(children: impl IntoIterator<Item = Stmt>) -> Stmt {
    Node::new(StmtKind::Block(children.into_iter().collect()))
}

pub fn set(target: Expr, value: Expr) -> Stmt {
    Node::new(StmtKind::Set { target, value })
}

pub fn repeat(var: Expr, start: Expr, end: Expr, body: Stmt) -> Stmt {
    Node::new(StmtKind::Repeat {
        var,
        start,
        end,
        body: Box::new(body),
    })
}

pub fn question(question: Question, left: Expr, right: Expr, body: Stmt) -> Stmt {
    Node::new(StmtKind::Question {
        question,
        left,
        right,
        body: Box::new(body),
    })
}

pub fn command(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Stmt {
    Node::new(StmtKind::Command {
        name: name.into(),
        args: args.into_iter().collect(),
    })
}

pub fn define(name: Expr, formals: impl IntoIterator<Item = Expr>, body: Stmt) -> Stmt {
    Node::new(StmtKind::CommandDefinition {
        name,
        formals: formals.into_iter().collect(),
        body: Rc::new(body),
    })
}

pub fn native(f: NativeFn) -> Stmt {
    Node::new(StmtKind::Native(f))
}

pub fn bracket(x: Expr, y: Expr) -> Expr {
    Node::new(ExprKind::Bracket {
        x: Box::new(x),
        y: Box::new(y),
    })
}

pub fn op(op: Operator, left: Expr, right: Expr) -> Expr {
    Node::new(ExprKind::Operation {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn number(value: impl ToString) -> Expr {
    Node::new(ExprKind::Number(value.to_string()))
}

pub fn word(name: impl Into<String>) -> Expr {
    Node::new(ExprKind::Word(name.into()))
}
