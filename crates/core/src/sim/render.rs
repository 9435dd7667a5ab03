//! Timing grid and state dumps.
//!
//! This module renders a finished (or capped) run. It provides:
//! 1. **Timing Grid:** One row per cycle and one 6-character column per
//!    issued instruction, annotated with stage names, `(s)` stalls, and
//!    `(fl)` flushes.
//! 2. **State Dumps:** The `REGISTERS:`/`MEMORY:` report of every non-zero
//!    register and word.
//! 3. **Section Dump:** Re-emission of the program in its input format, so
//!    that parse, dump, parse round-trips the initial state.

use std::fmt::Write as _;

use crate::core::pipeline::signals::StageName;
use crate::core::pipeline::trace::InstRecord;
use crate::core::Cpu;

/// Width of one timing grid column.
const CELL_WIDTH: usize = 6;

/// Renders the non-zero registers, ascending.
pub fn render_registers(cpu: &Cpu) -> String {
    let mut out = String::from("REGISTERS:\n");
    for (index, word) in cpu.registers.non_zero() {
        let _ = writeln!(out, "R{} = {}", index, word);
    }
    out
}

/// Renders the non-zero memory words, ascending, with hex indices.
pub fn render_memory(cpu: &Cpu) -> String {
    let mut out = String::from("MEMORY:\n");
    for (index, word) in cpu.ram.non_zero() {
        let _ = writeln!(out, "{:#x} = {}", index, word);
    }
    out
}

/// Renders the full architectural state report.
pub fn render_state(cpu: &Cpu) -> String {
    let mut out = render_registers(cpu);
    out.push_str(&render_memory(cpu));
    out
}

/// Re-emits the machine state and program in the parseable input format.
pub fn render_sections(cpu: &Cpu) -> String {
    let mut out = String::from("REGISTERS\n");
    for (index, word) in cpu.registers.non_zero() {
        let _ = writeln!(out, "R{} {}", index, word);
    }
    out.push_str("MEMORY\n");
    for (index, word) in cpu.ram.non_zero() {
        let _ = writeln!(out, "{} {}", index, word);
    }
    out.push_str("CODE\n");
    for instruction in &cpu.icache {
        let _ = writeln!(out, "{}", instruction.text);
    }
    out
}

/// Renders the cycle-by-instruction timing grid.
pub fn render_timing(cpu: &Cpu) -> String {
    let mut out = String::new();

    push_cell(&mut out, "");
    for index in 0..cpu.ledger.len() {
        push_cell(&mut out, &format!("I#{}", index + 1));
    }
    out.push('\n');

    for cycle in 1..=cpu.cycle {
        push_cell(&mut out, &format!("c#{}", cycle));
        for record in &cpu.ledger {
            push_cell(&mut out, cell(record, cycle));
        }
        out.push('\n');
    }
    out
}

/// Appends one fixed-width grid cell.
fn push_cell(out: &mut String, text: &str) {
    let _ = write!(out, "{:<width$}", text, width = CELL_WIDTH);
}

/// Classifies one grid cell.
///
/// The three cycles leading up to the recorded decode cycle display as the
/// fetch tail `(s)… IF2 IF3` regardless of where the instruction actually
/// waited, matching the conventional textbook presentation of front-end
/// stalls.
fn cell(record: &InstRecord, cycle: u64) -> &str {
    if cycle < record.cycle_start {
        return "";
    }
    if let Some(finish) = record.cycle_finish {
        if cycle > finish {
            return "";
        }
    }
    if cycle == record.cycle_start {
        return "IF1";
    }
    if let Some(flush) = record.cycle_flush {
        if cycle <= flush {
            return "(fl)";
        }
    }
    if let Some(&decode) = record.stages.get(&StageName::Id) {
        if cycle + 2 < decode {
            return "(s)";
        }
        if cycle + 2 == decode {
            return "IF2";
        }
        if cycle + 1 == decode {
            return "IF3";
        }
    }
    match record.cycles.get(&cycle) {
        Some(stage) => stage.as_str(),
        None => "(s)",
    }
}
