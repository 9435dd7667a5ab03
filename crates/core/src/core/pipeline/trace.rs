//! Per-instruction execution ledger.
//!
//! Every issued instruction gets one `InstRecord`, appended to the CPU's
//! ledger in issue order and never removed. The record carries the timing
//! facts the diagram is rendered from (which stage was entered on which
//! cycle, when the instruction started, finished, or was flushed) together
//! with the in-flight scratch state its stage hooks accumulate.

use std::collections::{BTreeMap, HashMap};

use super::signals::StageName;
use crate::isa::exec::ExecState;

/// Ledger entry for one issued instruction.
#[derive(Clone, Debug)]
pub struct InstRecord {
    /// Index of the static instruction in the instruction cache.
    pub cache_index: usize,
    /// Stage currently occupied, or `None` once retired or flushed.
    pub stage: Option<StageName>,
    /// Cycle on which each stage was (last) entered successfully.
    pub stages: HashMap<StageName, u64>,
    /// Stage occupied on each cycle that recorded progress.
    pub cycles: BTreeMap<u64, StageName>,
    /// Cycle the instruction was issued into IF1.
    pub cycle_start: u64,
    /// Cycle the instruction completed WB, once set never changed.
    pub cycle_finish: Option<u64>,
    /// Cycle the instruction was discarded by a flush, if it was.
    pub cycle_flush: Option<u64>,
    /// Scratch state produced by earlier stages for later ones.
    pub state: ExecState,
}

impl InstRecord {
    /// Creates the record for an instruction issued on `cycle`.
    pub fn new(cache_index: usize, cycle: u64) -> Self {
        Self {
            cache_index,
            stage: Some(StageName::If1),
            stages: HashMap::new(),
            cycles: BTreeMap::new(),
            cycle_start: cycle,
            cycle_finish: None,
            cycle_flush: None,
            state: ExecState::default(),
        }
    }

    /// Records successful occupancy of `stage` on `cycle`.
    pub fn record(&mut self, stage: StageName, cycle: u64) {
        self.stages.insert(stage, cycle);
        self.cycles.insert(cycle, stage);
    }

    /// Marks completion at WB on `cycle`.
    pub fn finish(&mut self, cycle: u64) {
        self.cycle_finish = Some(cycle);
    }

    /// Marks the instruction discarded by a flush on `cycle`.
    pub fn flush(&mut self, cycle: u64) {
        self.cycle_flush = Some(cycle);
        self.cycle_finish = Some(cycle);
        self.stage = None;
    }

    /// Whether the instruction was discarded by a flush.
    pub fn is_flushed(&self) -> bool {
        self.cycle_flush.is_some()
    }
}
