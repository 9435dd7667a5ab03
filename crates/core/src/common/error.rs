//! Simulator error definitions.
//!
//! This module defines the error handling for the simulator. It provides:
//! 1. **Fatal Errors:** `SimError`, covering parse rejections and runtime
//!    invariant violations that abort a run.
//! 2. **Operand Evaluation:** `EvalError`, whose locked-register case is a
//!    recoverable pipeline signal rather than a failure.
//!
//! Recoverable pipeline conditions (stalls, branch resolution, flushes) are
//! not errors; they are `StageEvent` values consumed by the engine and never
//! escape `Cpu::run`.

use std::fmt;

use super::reg::Reg;

/// Fatal simulator error. Once raised, the machine state is not trustworthy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    /// Program text rejected at `line` (1-based).
    Parse {
        /// 1-based line number of the offending line.
        line: usize,
        /// The offending line, trimmed.
        text: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A program file could not be read.
    Io {
        /// Path that failed to load.
        path: String,
        /// Underlying I/O failure description.
        reason: String,
    },

    /// Word index outside the memory.
    ///
    /// The machine has a fixed word-addressed memory; any access past its
    /// end is a hard fault, not a wrap.
    MemoryRange(usize),

    /// A register lock was released more times than it was acquired.
    ///
    /// Lock counters form the hazard scoreboard; going below zero means the
    /// acquire/release pairing in some instruction is broken.
    LockUnderflow(Reg),

    /// An operand slot required by the opcode is empty.
    MissingOperand(&'static str),

    /// The opcode requires a plain register in a slot holding something else.
    ExpectedRegister {
        /// Mnemonic of the instruction.
        opcode: &'static str,
        /// Text of the operand actually found.
        found: String,
    },

    /// A branch target names a label absent from the program.
    UnknownLabel(String),

    /// A stage ran without the results its earlier stages should have left.
    StageOrder {
        /// Mnemonic of the instruction.
        opcode: &'static str,
        /// Name of the stage that found the state missing.
        stage: &'static str,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Parse { line, text, reason } => {
                write!(f, "parse error (line {}: {}) {}", line, text, reason)
            }
            SimError::Io { path, reason } => {
                write!(f, "failed to read program '{}': {}", path, reason)
            }
            SimError::MemoryRange(index) => {
                write!(f, "memory index {} out of range", index)
            }
            SimError::LockUnderflow(reg) => {
                write!(f, "lock underflow on {}", reg)
            }
            SimError::MissingOperand(opcode) => {
                write!(f, "{} is missing an operand", opcode)
            }
            SimError::ExpectedRegister { opcode, found } => {
                write!(f, "{} expects a register operand, found '{}'", opcode, found)
            }
            SimError::UnknownLabel(label) => {
                write!(f, "unknown label '{}'", label)
            }
            SimError::StageOrder { opcode, stage } => {
                write!(f, "{} reached {} without its earlier-stage results", opcode, stage)
            }
        }
    }
}

impl std::error::Error for SimError {}

/// Outcome of evaluating a single operand against the machine state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalError {
    /// The source register has writes pending; retry after writeback.
    Locked(Reg),
    /// The operand names a label absent from the program.
    UnknownLabel(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Locked(reg) => write!(f, "{} has writes pending", reg),
            EvalError::UnknownLabel(label) => write!(f, "unknown label '{}'", label),
        }
    }
}
