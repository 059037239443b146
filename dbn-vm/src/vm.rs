use ahash::AHashMap;
use dbn::builtins::Builtin;
use dbn::{Canvas, Color, Config, ErrorKind, LineNo};
use string_interner::DefaultSymbol;

use crate::decoder::{decode, DecodeError};
use crate::frame::Frame;
use crate::instruction::{Code, Instruction, Interner, Value};
use crate::loader::{CodeLoader, FsLoader};
use crate::{Error, VmError};


#[derive(Debug, Clone)]
pub enum Procedure {
    Builtin(Builtin),
    User {
        formals: Vec<DefaultSymbol>,
        body: usize,
        line_no: LineNo,
    },
}

impl Procedure {
    pub fn arg_count(&self) -> usize {
        match self {
            Procedure::Builtin(b) => b.formals().len(),
            Procedure::User { formals, .. } => formals.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Halt,
}

/// A stack machine over one canvas.
///
/// The innermost call frame is held apart from its callers; variable lookups
/// walk from it out through every caller, so commands see the scope they were
/// called from.
pub struct Vm {
    code: Vec<Instruction>,
    si: Interner,
    pointer: usize,
    frame: Frame,
    callers: Vec<Frame>,
    canvas: Canvas,
    pen: Color,
    line_no: LineNo,
    commands: AHashMap<DefaultSymbol, Procedure>,
    terminated: bool,
    loader: Box<dyn CodeLoader>,
    recursion_limit: u32,
}

impl Vm {
    pub fn new(code: Code, config: &Config) -> Self {
        let Code {
            mut si,
            instructions,
        } = code;
        let commands = Builtin::ALL
            .into_iter()
            .map(|b| (si.get_or_intern(b.name()), Procedure::Builtin(b)))
            .collect();
        Self {
            code: instructions,
            si,
            pointer: 0,
            frame: Frame::default(),
            callers: Vec::new(),
            canvas: Canvas::new(config.paper as i64),
            pen: config.pen,
            line_no: LineNo::NONE,
            commands,
            terminated: false,
            loader: Box::new(FsLoader::from_env()),
            recursion_limit: config.recursion_limit,
        }
    }

    pub fn parse(src: &str, config: &Config) -> Result<Self, Vec<DecodeError>> {
        Ok(Self::new(decode(src)?, config))
    }

    pub fn with_loader(mut self, loader: impl CodeLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
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
    pub fn line_no(&self) -> LineNo {
        self.line_no
    }
    pub fn pointer(&self) -> usize {
        self.pointer
    }
    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
    /// Number of command calls in progress.
    pub fn depth(&self) -> usize {
        self.callers.len()
    }
    /// The innermost frame's operand stack, bottom first.
    pub fn stack(&self) -> &[Value] {
        self.frame.stack()
    }
    pub fn resolve(&self, symbol: DefaultSymbol) -> Option<&str> {
        self.si.resolve(symbol)
    }
    pub fn lookup_variable(&self, name: &str) -> i64 {
        self.si.get(name).map_or(0, |name| self.lookup(name))
    }
    pub fn lookup_command(&self, name: &str) -> Option<&Procedure> {
        self.commands.get(&self.si.get(name)?)
    }

    pub fn run(&mut self) -> Result<(), Error> {
        while self.step()? == Step::Continue {}
        Ok(())
    }

    /// Runs at most `steps` instructions.
    pub fn run_with_budget(&mut self, steps: usize) -> Result<(), Error> {
        for _ in 0..steps {
            if self.step()? == Step::Halt {
                return Ok(());
            }
        }
        if self.terminated {
            return Ok(());
        }
        Err(self.fault(VmError::BudgetExhausted { steps }))
    }

    /// Executes one instruction. Running off the end of the code halts; a
    /// jump or call past it fails with `InvalidAddress`.
    pub fn step(&mut self) -> Result<Step, Error> {
        if self.terminated {
            return Ok(Step::Halt);
        }
        let Some(&ins) = self.code.get(self.pointer) else {
            self.terminated = true;
            return Ok(Step::Halt);
        };
        tracing::trace!(pointer = self.pointer, op = ins.opcode(), ?ins, "step");
        self.execute(ins).map_err(|kind| self.fault(kind))?;
        Ok(if self.terminated {
            Step::Halt
        } else {
            Step::Continue
        })
    }

    fn fault(&self, kind: VmError) -> Error {
        Error {
            kind,
            line_no: self.line_no.get(),
            pointer: self.pointer,
        }
    }

    fn execute(&mut self, ins: Instruction) -> Result<(), VmError> {
        use Instruction::*;
        match ins {
            End => {
                self.terminated = true;
                return Ok(());
            }
            SetLineNo(n) => self.line_no = LineNo::try_from(n)?,
            Load(name) => {
                let value = self.lookup(name);
                self.frame.push(value);
            }
            Store(name) => {
                let value = self.frame.pop_int()?;
                self.frame.bind(name, value);
            }
            LoadInteger(n) => self.frame.push(n),
            LoadString(s) => self.frame.push(Value::Str(s)),
            SetDot => {
                let value = self.frame.pop_int()?;
                let y = self.frame.pop_int()?;
                let x = self.frame.pop_int()?;
                self.canvas.put(x, y, value);
            }
            GetDot => {
                let y = self.frame.pop_int()?;
                let x = self.frame.pop_int()?;
                self.frame.push(self.canvas.query_pixel(x, y) as i64);
            }
            Binary(op) => {
                let rhs = self.frame.pop_int()?;
                let lhs = self.frame.pop_int()?;
                self.frame.push(op.apply(lhs, rhs)?);
            }
            Compare(question) => {
                let rhs = self.frame.pop_int()?;
                let lhs = self.frame.pop_int()?;
                self.frame.push(question.test(lhs, rhs) as i64);
            }
            DupTopX(n) => self.frame.dup_top(n)?,
            PopTopX(n) => self.frame.pop_top(n)?,
            RotTwo => self.frame.rot_two()?,
            Jump(target) => return self.goto(target),
            PopJumpIfFalse(target) => return self.branch(target, false),
            PopJumpIfTrue(target) => return self.branch(target, true),
            RepeatStep => {
                let current = self.frame.pop_int()?;
                let bound = self.frame.pop_int()?;
                self.frame.push(bound);
                self.frame.push(current + bound.cmp(&current) as i64);
            }
            DefineCommand(argc) => self.define(argc)?,
            Command(argc) => return self.call(argc),
            Return => return self.ret(),
            LoadCode(path) => return self.load_code(path),
            Unhandled(op) => {
                return Err(VmError::UnhandledOpcode {
                    op: self.name(op),
                })
            }
        }
        self.pointer += 1;
        Ok(())
    }

    fn lookup(&self, name: DefaultSymbol) -> i64 {
        self.frame
            .get(name)
            .or_else(|| self.callers.iter().rev().find_map(|f| f.get(name)))
            .unwrap_or(0)
    }

    fn name(&self, symbol: DefaultSymbol) -> String {
        self.si.resolve(symbol).unwrap_or_default().to_owned()
    }

    /// Moves to `target`, which must name an instruction. Only sequential
    /// execution may run off the end.
    fn goto(&mut self, target: usize) -> Result<(), VmError> {
        if target >= self.code.len() {
            return Err(VmError::InvalidAddress {
                address: i64::try_from(target).unwrap_or(i64::MAX),
            });
        }
        self.pointer = target;
        Ok(())
    }

    fn branch(&mut self, target: usize, when: bool) -> Result<(), VmError> {
        let top = self.frame.pop_int()?;
        if (top != 0) == when {
            self.goto(target)
        } else {
            self.pointer += 1;
            Ok(())
        }
    }

    fn define(&mut self, argc: usize) -> Result<(), VmError> {
        let address = self.frame.pop_int()?;
        let body = usize::try_from(address).map_err(|_| VmError::InvalidAddress { address })?;
        let name = self.frame.pop_str()?;
        let formals = (0..argc)
            .map(|_| self.frame.pop_str())
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(i) = (1..argc).find(|&i| formals[..i].contains(&formals[i])) {
            return Err(ErrorKind::DuplicateFormal {
                name: self.name(formals[i]),
            }
            .into());
        }
        tracing::debug!(command = %self.name(name), argc, body, "define");
        let line_no = self.line_no;
        self.commands.insert(
            name,
            Procedure::User {
                formals,
                body,
                line_no,
            },
        );
        Ok(())
    }

    fn call(&mut self, argc: usize) -> Result<(), VmError> {
        let name = self.frame.pop_str()?;
        let Some(proc) = self.commands.get(&name).cloned() else {
            return Err(ErrorKind::UndefinedCommand {
                name: self.name(name),
            }
            .into());
        };
        if proc.arg_count() != argc {
            return Err(ErrorKind::ArityMismatch {
                name: self.name(name),
                expected: proc.arg_count(),
                found: argc,
            }
            .into());
        }
        let args = (0..argc)
            .map(|_| self.frame.pop_int())
            .collect::<Result<Vec<_>, _>>()?;
        tracing::trace!(command = %self.name(name), ?args, "call");
        // Builtins count toward the limit like any other call.
        if self.depth() >= self.recursion_limit as usize {
            return Err(ErrorKind::RecursionLimitExceeded {
                limit: self.recursion_limit,
            }
            .into());
        }
        match proc {
            Procedure::Builtin(builtin) => {
                builtin.call(&mut self.canvas, &mut self.pen, &args)?;
                self.frame.push(Value::Int(0));
                self.pointer += 1;
            }
            Procedure::User { formals, body, .. } => {
                let return_pointer = self.pointer + 1;
                self.goto(body)?;
                let callee = Frame::new(self.line_no, return_pointer);
                let caller = std::mem::replace(&mut self.frame, callee);
                self.callers.push(caller);
                for (formal, arg) in formals.into_iter().zip(args) {
                    self.frame.bind(formal, arg);
                }
                tracing::debug!(depth = self.depth(), line_no = ?self.line_no, "push frame");
            }
        }
        Ok(())
    }

    fn ret(&mut self) -> Result<(), VmError> {
        let value = self.frame.pop()?;
        let caller = self.callers.pop().ok_or(ErrorKind::ScopeUnderflow)?;
        let done = std::mem::replace(&mut self.frame, caller);
        self.frame.push(value);
        self.pointer = done.return_pointer;
        tracing::debug!(depth = self.depth(), "pop frame");
        Ok(())
    }

    fn load_code(&mut self, path: DefaultSymbol) -> Result<(), VmError> {
        let path = self.name(path);
        let base = self.code.len();
        let return_to = self.pointer + 1;
        tracing::debug!(%path, base, return_to, "load code");
        let unit = self.loader.load(&path, &mut self.si, base, return_to)?;
        self.code.extend(unit);
        self.pointer = base;
        Ok(())
    }
}
