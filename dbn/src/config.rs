use crate::canvas::{Color, BLACK, WHITE};

/// Engine settings shared by both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// default = `50`
    pub recursion_limit: u32,
    /// default = `0` (white)
    pub paper: Color,
    /// default = `100` (black)
    pub pen: Color,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recursion_limit: RECURSION_LIMIT,
            paper: WHITE,
            pen: BLACK,
        }
    }
}

pub const RECURSION_LIMIT: u32 = 50;
