//! Test harness for whole-machine runs.

use mips_core::common::Reg;
use mips_core::{Config, Cpu, Mode, RunOutcome};

/// Builds, configures, and runs a machine, and checks the invariants every
/// program must uphold regardless of mode.
pub struct TestContext {
    pub cpu: Cpu,
}

impl TestContext {
    /// Builds a machine from program text with the default configuration
    /// (no forwarding, flush branch policy).
    pub fn new(source: &str) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = Config::default();
        let cpu = Cpu::from_program(source, &config).expect("program should parse");
        Self { cpu }
    }

    /// Builds a machine and applies one of the three simulation modes.
    pub fn with_mode(source: &str, mode: Mode) -> Self {
        let mut ctx = Self::new(source);
        ctx.cpu.apply_mode(mode);
        ctx
    }

    /// Runs to completion or the cap; fatal faults fail the test.
    pub fn run(&mut self, max_cycles: u64) -> RunOutcome {
        self.cpu.run(max_cycles).expect("run should not fault")
    }

    /// Reads register `Rn`.
    pub fn reg(&self, number: u8) -> u64 {
        self.cpu.registers.get(Reg::new(number).expect("register number"))
    }

    /// Reads the memory word at `index`.
    pub fn mem(&self, index: usize) -> u64 {
        self.cpu.ram.read(index).expect("memory index")
    }

    /// Checks the invariants that hold for every program in every mode.
    pub fn assert_invariants(&self) {
        // R0 stays zero and no lock survives a run.
        assert_eq!(self.cpu.registers.get(Reg::ZERO), 0);
        for reg in Reg::all() {
            assert!(
                !self.cpu.registers.locked(reg),
                "{} still locked after run",
                reg
            );
        }

        // The ledger is ordered by issue time.
        let mut previous_start = 0;
        for record in &self.cpu.ledger {
            assert!(
                record.cycle_start >= previous_start,
                "ledger out of issue order"
            );
            previous_start = record.cycle_start;

            // Recorded stage cycles stay inside the instruction's lifetime,
            // and a flush cycle always equals the finish cycle.
            for (&stage, &cycle) in &record.stages {
                assert!(
                    cycle >= record.cycle_start,
                    "{} recorded before issue",
                    stage
                );
                if let Some(finish) = record.cycle_finish {
                    assert!(cycle <= finish, "{} recorded after completion", stage);
                }
            }
            if let Some(flush) = record.cycle_flush {
                assert_eq!(record.cycle_finish, Some(flush));
            }
        }
    }
}
