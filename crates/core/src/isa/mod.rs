//! Instruction set model.
//!
//! This module defines the five supported MIPS64 opcodes and the decoded
//! instruction form the pipeline executes. It provides:
//! 1. **Opcodes:** `LD`, `SD`, `DADD`, `DADDI`, `BNEZ` with mnemonic mapping.
//! 2. **Instructions:** The immutable decoded record (label, destination,
//!    operands, source text) shared by the whole pipeline.
//! 3. **Execution:** Per-opcode stage behavior in [`exec`].
//!
//! Two assembler conventions are preserved from the source syntax: `SD`
//! carries its memory operand in the destination slot, and `BNEZ` carries
//! the tested register in the destination slot with the target label as
//! operand A.

/// Per-opcode stage behavior.
pub mod exec;
/// Operand representation and evaluation.
pub mod operand;

use std::collections::HashMap;
use std::fmt;

use crate::common::{Reg, SimError};
use self::operand::Operand;

/// Map from label name to instruction-cache index of the labeled instruction.
pub type LabelTable = HashMap<String, usize>;

/// The supported opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// Load double: `LD Rd, d(Rs)`.
    Ld,
    /// Store double: `SD d(Rd), Rs`.
    Sd,
    /// Add: `DADD Rd, Ra, Rb`.
    Dadd,
    /// Add immediate: `DADDI Rd, Ra, #imm`.
    Daddi,
    /// Branch if not zero: `BNEZ Rs, label`.
    Bnez,
}

impl Opcode {
    /// Looks up an opcode by its assembler mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        match mnemonic {
            "LD" => Some(Opcode::Ld),
            "SD" => Some(Opcode::Sd),
            "DADD" => Some(Opcode::Dadd),
            "DADDI" => Some(Opcode::Daddi),
            "BNEZ" => Some(Opcode::Bnez),
            _ => None,
        }
    }

    /// The assembler mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Ld => "LD",
            Opcode::Sd => "SD",
            Opcode::Dadd => "DADD",
            Opcode::Daddi => "DADDI",
            Opcode::Bnez => "BNEZ",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One decoded instruction, immutable after parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// The opcode.
    pub opcode: Opcode,
    /// Label attached to this instruction, if any.
    pub label: Option<String>,
    /// Destination-slot operand (see the module notes on SD and BNEZ).
    pub dest: Operand,
    /// First source operand.
    pub operand_a: Operand,
    /// Second source operand, absent for two-operand forms.
    pub operand_b: Option<Operand>,
    /// The source line this instruction was parsed from.
    pub text: String,
}

impl Instruction {
    /// The destination-slot register, for opcodes that require one there.
    pub fn dest_register(&self) -> Result<Reg, SimError> {
        self.dest
            .as_register()
            .ok_or_else(|| SimError::ExpectedRegister {
                opcode: self.opcode.mnemonic(),
                found: self.dest.to_string(),
            })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.opcode, self.dest, self.operand_a)?;
        if let Some(operand_b) = &self.operand_b {
            write!(f, " {}", operand_b)?;
        }
        if let Some(label) = &self.label {
            write!(f, " (label: {})", label)?;
        }
        Ok(())
    }
}
