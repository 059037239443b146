use std::fmt;

/// The evaluation phase a node was dispatched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Apply,
    Evaluate,
    EvaluateLazy,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Apply => "apply",
            Phase::Evaluate => "evaluate",
            Phase::EvaluateLazy => "evaluate lazily",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("node type {node} cannot {phase}")]
    UnknownNodeType { node: &'static str, phase: Phase },
    #[error("command {name} is not defined")]
    UndefinedCommand { name: String },
    #[error("{name} requires {expected} arguments, but {found} were provided")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("recursion too deep, limit: {limit}")]
    RecursionLimitExceeded { limit: u32 },
    #[error("cannot pop an environment without a parent")]
    ScopeUnderflow,
    #[error("expected a variable, found a {found}")]
    InvalidLValue { found: &'static str },
    #[error("line number -1 is reserved")]
    InvalidLineNumber,
    #[error("you can't divide by 0")]
    DivisionByZero,
    #[error("{text:?} is not a number")]
    InvalidNumber { text: String },
    #[error("formal {name} is listed more than once")]
    DuplicateFormal { name: String },
}

impl ErrorKind {
    /// Errors a script author can cause, as opposed to engine defects.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::UndefinedCommand { .. }
                | ErrorKind::ArityMismatch { .. }
                | ErrorKind::RecursionLimitExceeded { .. }
                | ErrorKind::DivisionByZero
                | ErrorKind::InvalidNumber { .. }
                | ErrorKind::DuplicateFormal { .. }
        )
    }
}

/// A runtime error together with the last source line that was executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub line_no: Option<u32>,
}

impl Error {
    /// Attaches `line_no` unless a more specific line was already recorded.
    pub fn at(mut self, line_no: LineNo) -> Self {
        if self.line_no.is_none() {
            self.line_no = line_no.get();
        }
        self
    }
    pub fn is_user_error(&self) -> bool {
        self.kind.is_user_error()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            line_no: None,
        }
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

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A source line number, where `-1` marks "no line yet".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineNo(i64);

impl LineNo {
    pub const NONE: LineNo = LineNo(-1);

    pub fn new(line: u32) -> Self {
        Self(line as i64)
    }
    pub fn get(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl Default for LineNo {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Debug for LineNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for LineNo {
    fn from(line: u32) -> Self {
        Self::new(line)
    }
}

impl TryFrom<i64> for LineNo {
    type Error = ErrorKind;
    fn try_from(line: i64) -> Result<Self, ErrorKind> {
        u32::try_from(line)
            .map(LineNo::new)
            .map_err(|_| ErrorKind::InvalidLineNumber)
    }
}
