//! MIPS64 pipeline simulator CLI.
//!
//! This binary is the front end for the simulator. It performs:
//! 1. **Program Run:** Parse a sectioned program file, apply one of the
//!    three simulation modes, and run to completion or the cycle cap.
//! 2. **Reports:** Write the final register/memory dump and the timing grid
//!    to files or stdout, with optional run statistics.

use clap::{Parser, Subcommand};
use std::{fs, process};

use mips_core::sim::render;
use mips_core::{Config, Cpu, Mode, RunOutcome};

#[derive(Parser, Debug)]
#[command(
    name = "mipsim",
    version,
    about = "MIPS64 nine-stage pipeline simulator",
    long_about = "Run a program through the nine-stage pipeline and report the final \
architectural state plus a cycle-by-cycle timing diagram.\n\nModes:\n  \
0: No Forwarding/Bypassing\n  1: Predict Branches Taken\n  2: Predict Branches Not Taken\n\n\
Examples:\n  mipsim run -f program.txt\n  mipsim run -f program.txt -m 1 --timing timing.txt --registers regs.txt"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program and report final state and the timing diagram.
    Run {
        /// Program file with REGISTERS/MEMORY/CODE sections.
        #[arg(short, long)]
        file: String,

        /// Simulation mode id (0, 1, or 2).
        #[arg(short, long, default_value_t = 0)]
        mode: u8,

        /// Write the final register/memory dump here instead of stdout.
        #[arg(long)]
        registers: Option<String>,

        /// Write the timing grid here instead of stdout.
        #[arg(long)]
        timing: Option<String>,

        /// Cycle cap (0 = unbounded). Defaults to the configured cap.
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Print run statistics after the reports.
        #[arg(long)]
        stats: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            mode,
            registers,
            timing,
            max_cycles,
            stats,
        } => cmd_run(file, mode, registers, timing, max_cycles, stats),
    }
}

/// Runs the simulator: parses the program, applies the mode, runs to
/// completion or the cap, then emits the reports.
fn cmd_run(
    file: String,
    mode_id: u8,
    registers: Option<String>,
    timing: Option<String>,
    max_cycles: Option<u64>,
    stats: bool,
) {
    let Some(mode) = Mode::from_id(mode_id) else {
        eprintln!("Error: mode must be 0, 1, or 2 (got {})", mode_id);
        for mode in Mode::ALL {
            eprintln!("  {}: {}", mode.id(), mode.description());
        }
        process::exit(1);
    };

    let config = Config::default();
    let mut cpu = match Cpu::from_program_file(&file, &config) {
        Ok(cpu) => cpu,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };
    cpu.apply_mode(mode);

    println!("[*] {}: mode {} ({})", file, mode.id(), mode.description());

    let cap = max_cycles.unwrap_or(config.general.max_cycles);
    match cpu.run(cap) {
        Ok(RunOutcome::Finished) => {
            println!("[*] finished in {} cycles", cpu.cycle);
        }
        Ok(RunOutcome::CycleLimit) => {
            eprintln!(
                "[!] cycle cap reached at {} cycles; partial results follow",
                cpu.cycle
            );
        }
        Err(err) => {
            eprintln!("[!] FATAL: {}", err);
            process::exit(1);
        }
    }

    emit("register dump", render::render_state(&cpu), registers.as_deref());
    emit("timing grid", render::render_timing(&cpu), timing.as_deref());

    if stats {
        cpu.stats.print();
    }
}

/// Writes a report to `path`, or prints it when no path was given.
fn emit(what: &str, content: String, path: Option<&str>) {
    match path {
        Some(path) => {
            if let Err(err) = fs::write(path, &content) {
                eprintln!("Error writing {} to {}: {}", what, path, err);
                process::exit(1);
            }
            println!("[*] wrote {} to {}", what, path);
        }
        None => {
            println!("\n{}", content);
        }
    }
}
