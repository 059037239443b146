//! Execution engine for Design By Numbers, a language for drawing greyscale
//! pictures on a 101x101 canvas.

pub mod ast;
pub mod builtins;
pub mod canvas;
pub mod commands;
pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod state;

pub use self::canvas::{Canvas, Color};
pub use self::config::Config;
pub use self::error::{Error, ErrorKind, LineNo, Result};
pub use self::eval::{apply, evaluate, evaluate_lazy, run};
pub use self::state::{LValue, State};
