//! Where `LOAD_CODE` gets its code from.

use std::path::{Path, PathBuf};

use ahash::AHashMap;

use crate::decoder::decode_at;
use crate::instruction::{Instruction, Interner};
use crate::VmError;

pub const PATH_ENV_VAR: &str = "DBN_LOAD_PATH";

pub trait CodeLoader {
    /// Returns the code for `path`, addressed as if it started at `base` and
    /// handing control back to `return_to` when it finishes.
    fn load(
        &mut self,
        path: &str,
        si: &mut Interner,
        base: usize,
        return_to: usize,
    ) -> Result<Vec<Instruction>, VmError>;
}

/// Decodes `src` as a loadable unit: every `END` and falling off the end both
/// jump back to `return_to`.
pub fn link(
    path: &str,
    src: &str,
    si: &mut Interner,
    base: usize,
    return_to: usize,
) -> Result<Vec<Instruction>, VmError> {
    let mut code = decode_at(src, si, base).map_err(|errors| VmError::Load {
        path: path.to_owned(),
        reason: errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
    })?;
    for ins in &mut code {
        if *ins == Instruction::End {
            *ins = Instruction::Jump(return_to);
        }
    }
    code.push(Instruction::Jump(return_to));
    Ok(code)
}

/// Searches the working directory, then every directory in `DBN_LOAD_PATH`.
#[derive(Debug, Clone)]
pub struct FsLoader {
    search_path: Vec<PathBuf>,
}

impl Default for FsLoader {
    fn default() -> Self {
        Self::from_env()
    }
}

impl FsLoader {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    pub fn from_env() -> Self {
        let mut search_path = vec![PathBuf::from(".")];
        if let Ok(var) = std::env::var(PATH_ENV_VAR) {
            search_path.extend(var.split(':').filter(|p| !p.is_empty()).map(PathBuf::from));
        }
        Self { search_path }
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub fn find(&self, path: &str) -> Option<PathBuf> {
        let path = Path::new(path);
        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }
        self.search_path.iter().find_map(|dir| {
            tracing::trace!(dir = %dir.display(), "searching");
            let candidate = dir.join(path);
            candidate.is_file().then_some(candidate)
        })
    }
}

impl CodeLoader for FsLoader {
    fn load(
        &mut self,
        path: &str,
        si: &mut Interner,
        base: usize,
        return_to: usize,
    ) -> Result<Vec<Instruction>, VmError> {
        let Some(file) = self.find(path) else {
            return Err(VmError::Load {
                path: path.to_owned(),
                reason: format!("not found in {:?}", self.search_path),
            });
        };
        let src = std::fs::read_to_string(&file).map_err(|e| VmError::Load {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        link(path, &src, si, base, return_to)
    }
}

/// Serves units from memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    units: AHashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with(mut self, path: impl Into<String>, src: impl Into<String>) -> Self {
        self.units.insert(path.into(), src.into());
        self
    }
}

impl CodeLoader for MemoryLoader {
    fn load(
        &mut self,
        path: &str,
        si: &mut Interner,
        base: usize,
        return_to: usize,
    ) -> Result<Vec<Instruction>, VmError> {
        let src = self.units.get(path).ok_or_else(|| VmError::Load {
            path: path.to_owned(),
            reason: "no such unit".to_owned(),
        })?;
        link(path, src, si, base, return_to)
    }
}
