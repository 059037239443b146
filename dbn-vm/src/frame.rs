use ahash::AHashMap;
use dbn::LineNo;
use string_interner::DefaultSymbol;

use crate::instruction::Value;
use crate::VmError;

/// Activation record of one command call.
#[derive(Debug, Default)]
pub struct Frame {
    vars: AHashMap<DefaultSymbol, i64>,
    stack: Vec<Value>,
    pub base_line_no: LineNo,
    pub return_pointer: usize,
}

impl Frame {
    pub fn new(base_line_no: LineNo, return_pointer: usize) -> Self {
        Self {
            base_line_no,
            return_pointer,
            ..Default::default()
        }
    }

    pub fn get(&self, name: DefaultSymbol) -> Option<i64> {
        self.vars.get(&name).copied()
    }
    pub fn bind(&mut self, name: DefaultSymbol, value: i64) {
        self.vars.insert(name, value);
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }
    pub fn push(&mut self, value: impl Into<Value>) {
        self.stack.push(value.into());
    }
    pub fn pop(&mut self) -> Result<Value, VmError> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }
    pub fn pop_int(&mut self) -> Result<i64, VmError> {
        match self.pop()? {
            Value::Int(n) => Ok(n),
            found => Err(VmError::TypeMismatch {
                expected: "integer",
                found: found.kind(),
            }),
        }
    }
    pub fn pop_str(&mut self) -> Result<DefaultSymbol, VmError> {
        match self.pop()? {
            Value::Str(s) => Ok(s),
            found => Err(VmError::TypeMismatch {
                expected: "string",
                found: found.kind(),
            }),
        }
    }

    /// Pushes a copy of the top `n` entries, keeping their order.
    pub fn dup_top(&mut self, n: usize) -> Result<(), VmError> {
        let start = self.split_point(n)?;
        self.stack.extend_from_within(start..);
        Ok(())
    }
    pub fn pop_top(&mut self, n: usize) -> Result<(), VmError> {
        let start = self.split_point(n)?;
        self.stack.truncate(start);
        Ok(())
    }
    pub fn rot_two(&mut self) -> Result<(), VmError> {
        let start = self.split_point(2)?;
        self.stack.swap(start, start + 1);
        Ok(())
    }

    fn split_point(&self, n: usize) -> Result<usize, VmError> {
        self.stack
            .len()
            .checked_sub(n)
            .ok_or(VmError::StackUnderflow)
    }
}
