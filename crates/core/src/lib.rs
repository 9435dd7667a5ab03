//! MIPS64 pipeline simulator library.
//!
//! This crate implements a cycle-accurate simulator for a nine-stage
//! pipelined subset of MIPS64, built to illustrate data hazards,
//! forwarding, and branch resolution policies:
//! 1. **ISA:** `LD`, `SD`, `DADD`, `DADDI`, `BNEZ` over 32 64-bit
//!    registers and a 992-word memory.
//! 2. **Pipeline:** IF1-IF3, ID, EX, MEM1-MEM3, WB with a lock-counter
//!    scoreboard for RAW hazards, optional forwarding, and three branch
//!    policies (flush, predict-taken, predict-not-taken).
//! 3. **Timing:** A per-instruction ledger recording stage occupancy each
//!    cycle, rendered as a stall/flush-annotated timing grid.
//! 4. **Front Matter:** Sectioned program text parser, configuration, run
//!    statistics.

/// Common types (words, registers, errors).
pub mod common;
/// Simulator configuration (defaults, modes, branch policies).
pub mod config;
/// CPU state, pipeline, and the execution engine.
pub mod core;
/// Instruction set (opcodes, operands, stage semantics).
pub mod isa;
/// Program parsing and output rendering.
pub mod sim;
/// Run statistics.
pub mod stats;

/// Fatal simulator error.
pub use crate::common::SimError;
/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::{BranchPolicy, Config, Mode};
/// The simulated machine; construct with `Cpu::from_program`.
pub use crate::core::{Cpu, RunOutcome};
