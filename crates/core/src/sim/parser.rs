//! Program text parser.
//!
//! This module parses the sectioned program format into initial machine
//! state. It handles:
//! 1. **Sections:** `REGISTERS`, `MEMORY`, `CODE`, in that order. The code
//!    section ends at end-of-file or at the first blank line.
//! 2. **State Lines:** `Rn <decimal>` register initializers (`R0` lines are
//!    accepted and ignored) and `<word-index> <decimal>` memory initializers.
//! 3. **Code Lines:** `[Label:] OPCODE dst[, opA[, opB]]` with optional
//!    trailing commas. A label maps to the index of the instruction that
//!    carries it.
//! 4. **Operands:** `#n` signed immediate, `Rn` register, `d(Rn)` offset,
//!    anything else a label reference.
//!
//! Every rejection carries the 1-based line number and the offending text.

use crate::common::{Reg, SimError};
use crate::core::mem::Memory;
use crate::core::regfile::RegisterFile;
use crate::isa::operand::Operand;
use crate::isa::{Instruction, LabelTable, Opcode};

/// Initial machine state produced by a successful parse.
#[derive(Debug)]
pub struct Program {
    /// Initial register values.
    pub registers: RegisterFile,
    /// Initial memory contents.
    pub ram: Memory,
    /// The instructions, in fetch order.
    pub icache: Vec<Instruction>,
    /// Label name to instruction-cache index.
    pub labels: LabelTable,
}

/// Which section the parser is currently inside.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Start,
    Registers,
    Memory,
    Code,
    Finished,
}

/// Parses a complete program.
pub fn parse_program(source: &str) -> Result<Program, SimError> {
    let mut program = Program {
        registers: RegisterFile::new(),
        ram: Memory::new(),
        icache: Vec::new(),
        labels: LabelTable::new(),
    };
    let mut section = Section::Start;

    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        let number = index + 1;
        let fail = |reason: String| SimError::Parse {
            line: number,
            text: line.to_string(),
            reason,
        };

        match section {
            Section::Start => {
                if line != "REGISTERS" {
                    return Err(fail("REGISTERS header expected".to_string()));
                }
                section = Section::Registers;
            }
            Section::Registers => {
                if line == "MEMORY" {
                    section = Section::Memory;
                    continue;
                }
                parse_register_line(line, &mut program.registers).map_err(fail)?;
            }
            Section::Memory => {
                if line == "CODE" {
                    section = Section::Code;
                    continue;
                }
                parse_memory_line(line, &mut program.ram).map_err(fail)?;
            }
            Section::Code => {
                if line.is_empty() {
                    section = Section::Finished;
                    continue;
                }
                let instruction = parse_instruction(line).map_err(fail)?;
                if let Some(label) = &instruction.label {
                    program
                        .labels
                        .insert(label.clone(), program.icache.len());
                }
                program.icache.push(instruction);
            }
            Section::Finished => {
                // Trailing content after the blank line ending CODE is ignored.
            }
        }
    }

    if section == Section::Start || section == Section::Registers || section == Section::Memory {
        return Err(SimError::Parse {
            line: source.lines().count(),
            text: String::new(),
            reason: "program ended before the CODE section".to_string(),
        });
    }

    Ok(program)
}

/// Parses one `Rn <decimal>` line of the REGISTERS section.
fn parse_register_line(line: &str, registers: &mut RegisterFile) -> Result<(), String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 2 {
        return Err("expected a register name and a value".to_string());
    }
    let reg = match parse_operand(parts[0])? {
        Operand::Register(reg) => reg,
        other => return Err(format!("expected a register name, found '{}'", other)),
    };
    let value: i64 = parts[1]
        .parse()
        .map_err(|_| format!("invalid register value '{}'", parts[1]))?;
    // R0 initializers are accepted; the write is discarded.
    registers.set(reg, value as u64);
    Ok(())
}

/// Parses one `<word-index> <decimal>` line of the MEMORY section.
fn parse_memory_line(line: &str, ram: &mut Memory) -> Result<(), String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 2 {
        return Err("expected a word index and a value".to_string());
    }
    let index: usize = parts[0]
        .parse()
        .map_err(|_| format!("invalid memory index '{}'", parts[0]))?;
    let value: i64 = parts[1]
        .parse()
        .map_err(|_| format!("invalid memory value '{}'", parts[1]))?;
    ram.write(index, value as u64)
        .map_err(|_| format!("memory index {} out of range", index))?;
    Ok(())
}

/// Parses one code line into an instruction.
pub fn parse_instruction(line: &str) -> Result<Instruction, String> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Err("empty instruction".to_string());
    }

    let mut label = None;
    let first: &str = tokens[0];
    if let Some(colon) = first.find(':') {
        label = Some(first[..colon].to_string());
        let rest = &first[colon + 1..];
        if rest.is_empty() {
            tokens.remove(0);
        } else {
            tokens[0] = rest;
        }
    }

    let Some(&mnemonic) = tokens.first() else {
        return Err("label without an instruction".to_string());
    };
    let opcode = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| format!("invalid opcode '{}'", mnemonic))?;

    // Commas are trailing separators; a bare comma token is dropped.
    let operands: Vec<&str> = tokens[1..]
        .iter()
        .map(|token| token.trim_matches(','))
        .filter(|token| !token.is_empty())
        .collect();

    if operands.len() < 2 {
        return Err(format!("{} needs at least two operands", mnemonic));
    }
    if operands.len() > 3 {
        return Err(format!("extra content after operands: '{}'", operands[3]));
    }

    let dest = parse_operand(operands[0])?;
    let operand_a = parse_operand(operands[1])?;
    let operand_b = match operands.get(2) {
        Some(token) => Some(parse_operand(token)?),
        None => None,
    };

    Ok(Instruction {
        opcode,
        label,
        dest,
        operand_a,
        operand_b,
        text: line.to_string(),
    })
}

/// Parses a single operand token.
pub fn parse_operand(token: &str) -> Result<Operand, String> {
    if let Some(immediate) = token.strip_prefix('#') {
        let value: i64 = immediate
            .parse()
            .map_err(|_| format!("invalid immediate '{}'", token))?;
        return Ok(Operand::Immediate(value));
    }

    if let Some(digits) = token.strip_prefix('R') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(Operand::Register(parse_register(token, digits)?));
        }
    }

    if let Some(open) = token.find('(') {
        let close = token
            .find(')')
            .ok_or_else(|| format!("unterminated offset operand '{}'", token))?;
        let displacement: i64 = token[..open]
            .parse()
            .map_err(|_| format!("invalid displacement in '{}'", token))?;
        let base = &token[open + 1..close];
        let digits = base
            .strip_prefix('R')
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| format!("expected a base register in '{}'", token))?;
        return Ok(Operand::Offset(parse_register(token, digits)?, displacement));
    }

    Ok(Operand::Label(token.to_string()))
}

/// Validates a register number already known to be all digits.
fn parse_register(token: &str, digits: &str) -> Result<Reg, String> {
    digits
        .parse::<u8>()
        .ok()
        .and_then(Reg::new)
        .ok_or_else(|| format!("register number out of range in '{}'", token))
}
