//! Common types shared across the simulator.

/// Error types for parsing and execution.
pub mod error;
/// Architectural register identifiers.
pub mod reg;

pub use self::error::{EvalError, SimError};
pub use self::reg::Reg;

/// 64-bit machine word. All arithmetic wraps modulo 2^64; overflow never traps.
pub type Word = u64;
