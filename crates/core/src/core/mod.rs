//! CPU state and the cycle-by-cycle execution engine.
//!
//! This module owns the whole machine and drives it. It provides:
//! 1. **State:** Register file, memory, instruction cache, label table,
//!    instruction pointer, cycle counter, pipeline, and the append-only
//!    ledger of executed-instruction records.
//! 2. **Cycle Protocol:** Each step transfers instructions downstream,
//!    tests for completion, bumps the cycle counter, and executes every
//!    stage from WB back to IF1 so that writebacks land before the decode
//!    stage reads the register file in the same cycle.
//! 3. **Signal Handling:** RAW hazards stall, branch resolution holds the
//!    fetch stages, and a flush atomically discards everything upstream of
//!    the resolving stage and ends the cycle's execute pass.
//! 4. **Issue:** IF1 allocates one ledger record per fetched instruction;
//!    the ledger is the source of truth for the timing diagram.

/// Word-addressed data memory.
pub mod mem;
/// Pipeline structure and instruction movement.
pub mod pipeline;
/// Register file with hazard locks.
pub mod regfile;

use crate::common::SimError;
use crate::config::{BranchPolicy, Config, Mode};
use crate::isa::exec::{self, StageCtx};
use crate::isa::{Instruction, LabelTable};
use crate::sim::parser;
use crate::stats::SimStats;
use self::mem::Memory;
use self::pipeline::signals::{StageEvent, StageName};
use self::pipeline::trace::InstRecord;
use self::pipeline::{Pipeline, STAGE_COUNT};
use self::regfile::RegisterFile;

/// How a bounded run ended. Fatal errors travel separately as `SimError`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The pipeline drained and no instructions remain.
    Finished,
    /// The cycle cap was reached; partial results are readable.
    CycleLimit,
}

/// The simulated machine.
#[derive(Debug)]
pub struct Cpu {
    /// Architectural registers with hazard locks.
    pub registers: RegisterFile,
    /// Data memory.
    pub ram: Memory,
    /// The program, in fetch order.
    pub icache: Vec<Instruction>,
    /// Label name to instruction-cache index.
    pub labels: LabelTable,
    /// Index of the next instruction to fetch.
    pub ip: usize,
    /// Cycles executed so far.
    pub cycle: u64,
    /// Early writebacks at EX/MEM3 instead of WB.
    pub forwarding: bool,
    /// Branch resolution policy.
    pub branch_policy: BranchPolicy,
    /// One record per issued instruction, in issue order, never removed.
    pub ledger: Vec<InstRecord>,
    /// The nine-stage pipeline.
    pub pipeline: Pipeline,
    /// Run statistics.
    pub stats: SimStats,
}

impl Cpu {
    /// Creates an empty machine with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            registers: RegisterFile::new(),
            ram: Memory::new(),
            icache: Vec::new(),
            labels: LabelTable::new(),
            ip: 0,
            cycle: 0,
            forwarding: config.pipeline.forwarding,
            branch_policy: config.pipeline.branch_policy,
            ledger: Vec::new(),
            pipeline: Pipeline::new(),
            stats: SimStats::default(),
        }
    }

    /// Builds a machine from program text.
    pub fn from_program(source: &str, config: &Config) -> Result<Self, SimError> {
        let program = parser::parse_program(source)?;
        let mut cpu = Cpu::new(config);
        cpu.registers = program.registers;
        cpu.ram = program.ram;
        cpu.icache = program.icache;
        cpu.labels = program.labels;
        Ok(cpu)
    }

    /// Builds a machine from a program file.
    pub fn from_program_file(path: &str, config: &Config) -> Result<Self, SimError> {
        let source = std::fs::read_to_string(path).map_err(|err| SimError::Io {
            path: path.to_string(),
            reason: err.to_string(),
        })?;
        Cpu::from_program(&source, config)
    }

    /// Enables or disables forwarding.
    pub fn set_forwarding(&mut self, forwarding: bool) {
        self.forwarding = forwarding;
    }

    /// Selects the branch resolution policy.
    pub fn set_branch_policy(&mut self, policy: BranchPolicy) {
        self.branch_policy = policy;
    }

    /// Applies one of the three externally exposed modes.
    pub fn apply_mode(&mut self, mode: Mode) {
        let pipeline = mode.pipeline();
        self.forwarding = pipeline.forwarding;
        self.branch_policy = pipeline.branch_policy;
    }

    /// Whether every instruction has been fetched.
    pub fn fetch_done(&self) -> bool {
        self.ip == self.icache.len()
    }

    /// Runs until the pipeline drains or `max_cycles` is reached.
    ///
    /// The cap is inclusive: the `max_cycles`-th cycle executes and then the
    /// run stops. `max_cycles == 0` means unbounded. Recoverable pipeline
    /// signals never escape here; only fatal faults surface as errors.
    pub fn run(&mut self, max_cycles: u64) -> Result<RunOutcome, SimError> {
        loop {
            if self.step()? {
                return Ok(RunOutcome::Finished);
            }
            if max_cycles > 0 && self.cycle >= max_cycles {
                log::warn!("cycle cap reached at c#{}", self.cycle);
                return Ok(RunOutcome::CycleLimit);
            }
        }
    }

    /// Advances the machine by one cycle. Returns `true` once drained.
    pub fn step(&mut self) -> Result<bool, SimError> {
        // Move instructions downstream first; stalls recorded last cycle
        // decide who holds position.
        self.pipeline.transfer(&mut self.ledger);

        if self.pipeline.is_empty() && self.fetch_done() {
            return Ok(true);
        }

        self.cycle += 1;
        self.stats.cycles = self.cycle;
        log::trace!("==== c#{} ====", self.cycle);

        self.execute_cycle()
    }

    /// Runs every stage for the current cycle, WB back to IF1.
    fn execute_cycle(&mut self) -> Result<bool, SimError> {
        self.pipeline.clear_stalls();

        for index in (0..STAGE_COUNT).rev() {
            let rec = if index == 0 {
                // IF1 holds silently while stalled or occupied; otherwise it
                // issues the next instruction and runs its IF1 hook.
                let stage = self.pipeline.stage(0);
                if stage.slot.is_some() || stage.stalled || self.fetch_done() {
                    continue;
                }
                self.issue()
            } else {
                match self.pipeline.slot(index) {
                    Some(rec) => rec,
                    None => continue,
                }
            };

            let stage = StageName::ALL[index];
            let event = self.dispatch(stage, rec)?;
            if self.apply_event(index, rec, event) {
                // A flush ends the execute pass for this cycle.
                break;
            }
        }

        Ok(false)
    }

    /// Allocates a ledger record for the next instruction and puts it in IF1.
    fn issue(&mut self) -> usize {
        let rec = self.ledger.len();
        log::debug!(
            "c#{} issue I#{}: {}",
            self.cycle,
            rec + 1,
            self.icache[self.ip]
        );
        self.ledger.push(InstRecord::new(self.ip, self.cycle));
        self.pipeline.stage_mut(0).slot = Some(rec);
        self.ip += 1;
        self.stats.issued += 1;
        rec
    }

    /// Runs the stage hook of the instruction behind ledger entry `rec`.
    fn dispatch(&mut self, stage: StageName, rec: usize) -> Result<StageEvent, SimError> {
        let Self {
            registers,
            ram,
            icache,
            labels,
            ip,
            forwarding,
            branch_policy,
            ledger,
            ..
        } = self;
        let record = &mut ledger[rec];
        let inst = &icache[record.cache_index];
        let mut ctx = StageCtx {
            regs: registers,
            ram,
            labels,
            ip,
            forwarding: *forwarding,
            policy: *branch_policy,
            state: &mut record.state,
        };
        exec::step(inst, stage, &mut ctx)
    }

    /// Applies a stage's event to the pipeline and the ledger.
    ///
    /// Returns `true` when the event ends the execute pass (a flush).
    fn apply_event(&mut self, index: usize, rec: usize, event: StageEvent) -> bool {
        let stage = StageName::ALL[index];
        let cycle = self.cycle;
        match event {
            StageEvent::Done => {
                self.ledger[rec].record(stage, cycle);
                if stage == StageName::Wb {
                    self.ledger[rec].finish(cycle);
                    self.stats.retired += 1;
                    log::debug!("c#{} retire I#{}", cycle, rec + 1);
                }
                if stage == StageName::Id && self.is_branch(rec) {
                    self.stats.branches += 1;
                }
                false
            }
            StageEvent::RawHazard => {
                log::debug!("c#{} {} stalls I#{}", cycle, stage, rec + 1);
                self.pipeline.stage_mut(index).stalled = true;
                self.stats.data_stalls += 1;
                false
            }
            StageEvent::BranchResolving => {
                log::trace!("c#{} {} branch resolving, fetch held", cycle, stage);
                self.ledger[rec].record(stage, cycle);
                self.pipeline.stall_upstream(index);
                self.stats.control_stalls += 1;
                false
            }
            StageEvent::FlushPipeline => {
                self.ledger[rec].record(stage, cycle);
                if stage == StageName::Id && self.is_branch(rec) {
                    self.stats.branches += 1;
                }
                let discarded = self.pipeline.flush_upstream(index, &mut self.ledger, cycle);
                self.stats.flushes += 1;
                self.stats.flushed += discarded as u64;
                true
            }
        }
    }

    /// Whether ledger entry `rec` is a branch instruction.
    fn is_branch(&self, rec: usize) -> bool {
        self.icache[self.ledger[rec].cache_index].opcode == crate::isa::Opcode::Bnez
    }
}
