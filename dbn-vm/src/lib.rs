//! Bytecode backend for DBN programs.

use std::fmt;

use dbn::ErrorKind;

pub mod decoder;
pub mod frame;
pub mod instruction;
pub mod loader;
mod vm;

pub use self::decoder::{decode, decode_at, DecodeError, DecodeErrorKind};
pub use self::instruction::{Code, Instruction, Value};
pub use self::loader::{CodeLoader, FsLoader, MemoryLoader};
pub use self::vm::{Procedure, Step, Vm};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    #[error(transparent)]
    Runtime(#[from] ErrorKind),
    #[error("no rule to execute opcode {op}")]
    UnhandledOpcode { op: String },
    #[error("stack underflow")]
    StackUnderflow,
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("{address} is not a code address")]
    InvalidAddress { address: i64 },
    #[error("cannot load {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("stopped after {steps} steps")]
    BudgetExhausted { steps: usize },
}

impl VmError {
    pub fn is_user_error(&self) -> bool {
        match self {
            VmError::Runtime(kind) => kind.is_user_error(),
            VmError::Load { .. } => true,
            _ => false,
        }
    }
}

/// A failed step, with the source line and instruction it happened at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: VmError,
    pub line_no: Option<u32>,
    pub pointer: usize,
}

impl Error {
    pub fn is_user_error(&self) -> bool {
        self.kind.is_user_error()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_no {
            Some(line) => write!(f, "line {line}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
