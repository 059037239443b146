//! Text to [`Instruction`]s.
//!
//! One instruction per line, `OP` or `OP ARG`, optionally preceded by its
//! index as the reference driver prints it (`12 JUMP 4`). `name:` on its own
//! line labels the next instruction, `;` starts a comment and `_` stands for
//! a missing argument. Labels may be used wherever an address is expected and
//! as the argument of `LOAD_INTEGER`.

use ahash::AHashMap;
use dbn::ast::{Operator, Question};

use crate::instruction::{Code, Instruction, Interner};

#[cfg(test)]
mod test;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct DecodeError {
    pub line: usize,
    pub kind: DecodeErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("{op} needs an argument")]
    MissingArgument { op: String },
    #[error("{op} takes no argument")]
    UnexpectedArgument { op: String },
    #[error("expected at most an opcode and one argument")]
    TooManyFields,
    #[error("{text:?} is not an integer")]
    InvalidInteger { text: String },
    #[error("{text:?} is not a count")]
    InvalidCount { text: String },
    #[error("label {name} is not defined")]
    UnknownLabel { name: String },
    #[error("label {name} is already defined")]
    DuplicateLabel { name: String },
}

#[derive(Debug)]
struct Line<'s> {
    line: usize,
    op: &'s str,
    arg: Option<&'s str>,
}

#[derive(Default)]
struct Decoder<'s> {
    base: usize,
    lines: Vec<Line<'s>>,
    labels: AHashMap<&'s str, usize>,
    errors: Vec<DecodeError>,
}

impl<'s> Decoder<'s> {
    fn scan(&mut self, src: &'s str) {
        for (i, raw) in src.lines().enumerate() {
            let line = i + 1;
            let text = raw.split_once(';').map_or(raw, |(code, _)| code).trim();
            if text.is_empty() {
                continue;
            }
            if let Some(name) = label(text) {
                let address = self.base + self.lines.len();
                if self.labels.insert(name, address).is_some() {
                    let name = name.to_owned();
                    self.error(line, DecodeErrorKind::DuplicateLabel { name });
                }
                continue;
            }
            let fields: Vec<&str> = text.split_whitespace().collect();
            let fields = match fields.as_slice() {
                [index, rest @ ..] if !rest.is_empty() && index.parse::<usize>().is_ok() => rest,
                all => all,
            };
            match *fields {
                [op] => self.lines.push(Line { line, op, arg: None }),
                [op, arg] => {
                    let arg = (arg != "_").then_some(arg);
                    self.lines.push(Line { line, op, arg });
                }
                _ => self.error(line, DecodeErrorKind::TooManyFields),
            }
        }
    }

    fn decode(mut self, si: &mut Interner) -> Result<Vec<Instruction>, Vec<DecodeError>> {
        let mut instructions = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            match self.instruction(line, si) {
                Ok(ins) => instructions.push(ins),
                Err(kind) => self.errors.push(DecodeError {
                    line: line.line,
                    kind,
                }),
            }
        }
        if self.errors.is_empty() {
            Ok(instructions)
        } else {
            self.errors.sort_by_key(|e| e.line);
            Err(self.errors)
        }
    }

    fn instruction(&self, line: &Line, si: &mut Interner) -> Result<Instruction, DecodeErrorKind> {
        use Instruction::*;
        let Line { op, arg, .. } = *line;
        Ok(match op {
            "END" => none(op, arg, End)?,
            "SET_LINE_NO" => {
                let text = required(op, arg)?;
                SetLineNo(text.parse().map_err(|_| invalid_integer(text))?)
            }
            "LOAD" => Load(si.get_or_intern(required(op, arg)?)),
            "STORE" => Store(si.get_or_intern(required(op, arg)?)),
            "LOAD_INTEGER" => LoadInteger(self.integer(required(op, arg)?)?),
            "LOAD_STRING" => LoadString(si.get_or_intern(required(op, arg)?)),
            "SET_DOT" => none(op, arg, SetDot)?,
            "GET_DOT" => none(op, arg, GetDot)?,
            "BINARY_ADD" => none(op, arg, Binary(Operator::Add))?,
            "BINARY_SUB" => none(op, arg, Binary(Operator::Sub))?,
            "BINARY_MUL" => none(op, arg, Binary(Operator::Mul))?,
            "BINARY_DIV" => none(op, arg, Binary(Operator::Div))?,
            "COMPARE_SAME" => none(op, arg, Compare(Question::Same))?,
            "COMPARE_SMALLER" => none(op, arg, Compare(Question::Smaller))?,
            "DUP_TOPX" => DupTopX(count(required(op, arg)?)?),
            "POP_TOPX" => PopTopX(count(required(op, arg)?)?),
            "ROT_TWO" => none(op, arg, RotTwo)?,
            "JUMP" => Jump(self.address(required(op, arg)?)?),
            "POP_JUMP_IF_FALSE" => PopJumpIfFalse(self.address(required(op, arg)?)?),
            "POP_JUMP_IF_TRUE" => PopJumpIfTrue(self.address(required(op, arg)?)?),
            "REPEAT_STEP" => none(op, arg, RepeatStep)?,
            "DEFINE_COMMAND" => DefineCommand(count(required(op, arg)?)?),
            "COMMAND" => Command(count(required(op, arg)?)?),
            "RETURN" => none(op, arg, Return)?,
            "LOAD_CODE" => LoadCode(si.get_or_intern(required(op, arg)?)),
            _ => Unhandled(si.get_or_intern(op)),
        })
    }

    /// A literal, or the address a label points at.
    fn integer(&self, text: &str) -> Result<i64, DecodeErrorKind> {
        if let Ok(n) = text.parse() {
            return Ok(n);
        }
        match self.labels.get(text) {
            Some(&address) => Ok(address as i64),
            None => Err(invalid_integer(text)),
        }
    }

    /// Numeric addresses are relative to the start of this unit.
    fn address(&self, text: &str) -> Result<usize, DecodeErrorKind> {
        if let Ok(n) = text.parse::<usize>() {
            return Ok(self.base + n);
        }
        self.labels
            .get(text)
            .copied()
            .ok_or_else(|| DecodeErrorKind::UnknownLabel {
                name: text.to_owned(),
            })
    }

    fn error(&mut self, line: usize, kind: DecodeErrorKind) {
        self.errors.push(DecodeError { line, kind });
    }
}

fn label(text: &str) -> Option<&str> {
    let name = text.strip_suffix(':')?;
    let valid = !name.is_empty() && !name.contains(char::is_whitespace);
    valid.then_some(name)
}

fn required<'a>(op: &str, arg: Option<&'a str>) -> Result<&'a str, DecodeErrorKind> {
    arg.ok_or_else(|| DecodeErrorKind::MissingArgument { op: op.to_owned() })
}

fn none(op: &str, arg: Option<&str>, ins: Instruction) -> Result<Instruction, DecodeErrorKind> {
    match arg {
        None => Ok(ins),
        Some(_) => Err(DecodeErrorKind::UnexpectedArgument { op: op.to_owned() }),
    }
}

fn count(text: &str) -> Result<usize, DecodeErrorKind> {
    text.parse().map_err(|_| DecodeErrorKind::InvalidCount {
        text: text.to_owned(),
    })
}

fn invalid_integer(text: &str) -> DecodeErrorKind {
    DecodeErrorKind::InvalidInteger {
        text: text.to_owned(),
    }
}

pub fn decode(src: &str) -> Result<Code, Vec<DecodeError>> {
    let mut si = Interner::default();
    let instructions = decode_at(src, &mut si, 0)?;
    Ok(Code { si, instructions })
}

/// Decodes a unit that will be placed at `base` in an existing program.
pub fn decode_at(
    src: &str,
    si: &mut Interner,
    base: usize,
) -> Result<Vec<Instruction>, Vec<DecodeError>> {
    let mut decoder = Decoder {
        base,
        ..Default::default()
    };
    decoder.scan(src);
    decoder.decode(si)
}
