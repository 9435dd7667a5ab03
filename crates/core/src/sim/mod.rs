//! Program loading and output rendering.

/// Program text parser.
pub mod parser;
/// Timing grid and state dumps.
pub mod render;

pub use self::parser::{parse_program, Program};
