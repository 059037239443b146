use dbn::ast::{Operator, Question};
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

pub type Interner = StringInterner<DefaultBackend>;

/// A decoded program: instructions plus the names they refer to.
#[derive(Debug, Default)]
pub struct Code {
    pub si: Interner,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    End,
    SetLineNo(i64),
    Load(DefaultSymbol),
    Store(DefaultSymbol),
    LoadInteger(i64),
    LoadString(DefaultSymbol),
    SetDot,
    GetDot,
    /// `BINARY_ADD`, `BINARY_SUB`, `BINARY_MUL` and `BINARY_DIV`.
    Binary(Operator),
    /// `COMPARE_SAME` and `COMPARE_SMALLER`.
    Compare(Question),
    DupTopX(usize),
    PopTopX(usize),
    RotTwo,
    Jump(usize),
    PopJumpIfFalse(usize),
    PopJumpIfTrue(usize),
    RepeatStep,
    DefineCommand(usize),
    Command(usize),
    Return,
    LoadCode(DefaultSymbol),
    /// An opcode with no execution rule, kept so it fails only when reached.
    Unhandled(DefaultSymbol),
}

impl Instruction {
    pub fn opcode(&self) -> &'static str {
        use Instruction::*;
        match self {
            End => "END",
            SetLineNo(_) => "SET_LINE_NO",
            Load(_) => "LOAD",
            Store(_) => "STORE",
            LoadInteger(_) => "LOAD_INTEGER",
            LoadString(_) => "LOAD_STRING",
            SetDot => "SET_DOT",
            GetDot => "GET_DOT",
            Binary(Operator::Add) => "BINARY_ADD",
            Binary(Operator::Sub) => "BINARY_SUB",
            Binary(Operator::Mul) => "BINARY_MUL",
            Binary(Operator::Div) => "BINARY_DIV",
            Compare(Question::Same) => "COMPARE_SAME",
            Compare(Question::Smaller) => "COMPARE_SMALLER",
            Compare(Question::NotSame) => "COMPARE_NOT_SAME",
            Compare(Question::NotSmaller) => "COMPARE_NOT_SMALLER",
            DupTopX(_) => "DUP_TOPX",
            PopTopX(_) => "POP_TOPX",
            RotTwo => "ROT_TWO",
            Jump(_) => "JUMP",
            PopJumpIfFalse(_) => "POP_JUMP_IF_FALSE",
            PopJumpIfTrue(_) => "POP_JUMP_IF_TRUE",
            RepeatStep => "REPEAT_STEP",
            DefineCommand(_) => "DEFINE_COMMAND",
            Command(_) => "COMMAND",
            Return => "RETURN",
            LoadCode(_) => "LOAD_CODE",
            Unhandled(_) => "?",
        }
    }

    /// One line of bytecode text, without the index.
    pub fn encode(&self, si: &Interner) -> String {
        use Instruction::*;
        let name = |s| si.resolve(s).unwrap_or("?");
        match *self {
            SetLineNo(n) | LoadInteger(n) => format!("{} {n}", self.opcode()),
            Load(s) | Store(s) | LoadString(s) | LoadCode(s) => {
                format!("{} {}", self.opcode(), name(s))
            }
            DupTopX(n) | PopTopX(n) | DefineCommand(n) | Command(n) => {
                format!("{} {n}", self.opcode())
            }
            Jump(a) | PopJumpIfFalse(a) | PopJumpIfTrue(a) => format!("{} {a}", self.opcode()),
            Unhandled(op) => name(op).to_owned(),
            _ => self.opcode().to_owned(),
        }
    }
}

impl Code {
    /// A numbered listing the decoder reads back.
    pub fn encode(&self) -> String {
        self.instructions
            .iter()
            .enumerate()
            .map(|(i, ins)| format!("{i} {}", ins.encode(&self.si)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A slot on a frame's operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(DefaultSymbol),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}
