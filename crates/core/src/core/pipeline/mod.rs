//! Pipeline structure and instruction movement.
//!
//! This module holds the nine-stage pipeline state and the rules for moving
//! instructions between stages. It provides:
//! 1. **Stages:** One slot and one local stall flag per stage, in a fixed
//!    array ordered IF1..WB; no neighbour pointers, downstream lookups go
//!    by index.
//! 2. **Stall Propagation:** A stage is effectively stalled when its own
//!    flag is set or any downstream stage's flag is; effective stalls hold
//!    everything upstream in place.
//! 3. **Transfer Pass:** The once-per-cycle WB-to-IF1 walk that advances
//!    every unblocked instruction by one stage and retires WB's occupant.
//! 4. **Flush:** Atomic discard of all slots upstream of a resolving branch.
//!
//! Stage slots hold ledger indices; the CPU's ledger owns the records.

/// Stage identity and hook outcome signals.
pub mod signals;
/// Per-instruction execution ledger.
pub mod trace;

use self::signals::StageName;
use self::trace::InstRecord;

/// Number of pipeline stages.
pub const STAGE_COUNT: usize = 9;

/// One pipeline stage: a name, at most one in-flight instruction, and a
/// local stall flag valid for the current cycle.
#[derive(Clone, Debug)]
pub struct Stage {
    /// Fixed stage identity.
    pub name: StageName,
    /// Ledger index of the held instruction, if any.
    pub slot: Option<usize>,
    /// Local stall flag, set by hazard and branch-resolution events.
    pub stalled: bool,
}

/// The nine-stage pipeline.
#[derive(Clone, Debug)]
pub struct Pipeline {
    stages: [Stage; STAGE_COUNT],
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self {
            stages: StageName::ALL.map(|name| Stage {
                name,
                slot: None,
                stalled: false,
            }),
        }
    }

    /// The stage at `index` (0 = IF1, 8 = WB).
    pub fn stage(&self, index: usize) -> &Stage {
        &self.stages[index]
    }

    /// Mutable access to the stage at `index`.
    pub fn stage_mut(&mut self, index: usize) -> &mut Stage {
        &mut self.stages[index]
    }

    /// Ledger index held by the stage at `index`, if any.
    pub fn slot(&self, index: usize) -> Option<usize> {
        self.stages[index].slot
    }

    /// Whether every stage is empty.
    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(|stage| stage.slot.is_none())
    }

    /// Whether the stage at `index` is effectively stalled.
    ///
    /// Stalls propagate upstream: a stage is held by its own flag or by any
    /// flag downstream of it.
    pub fn effectively_stalled(&self, index: usize) -> bool {
        self.stages[index..].iter().any(|stage| stage.stalled)
    }

    /// Clears every local stall flag. Runs at the top of each execute pass.
    pub fn clear_stalls(&mut self) {
        for stage in &mut self.stages {
            stage.stalled = false;
        }
    }

    /// Sets the local stall flag on every stage upstream of `index`.
    pub fn stall_upstream(&mut self, index: usize) {
        for stage in &mut self.stages[..index] {
            stage.stalled = true;
        }
    }

    /// Discards every instruction upstream of `index`, marking the records
    /// flushed on `cycle`. Returns how many instructions were discarded.
    pub fn flush_upstream(
        &mut self,
        index: usize,
        ledger: &mut [InstRecord],
        cycle: u64,
    ) -> usize {
        let mut discarded = 0;
        for stage in &mut self.stages[..index] {
            if let Some(rec) = stage.slot.take() {
                log::debug!("c#{} flush I#{} from {}", cycle, rec + 1, stage.name);
                ledger[rec].flush(cycle);
                discarded += 1;
            }
        }
        discarded
    }

    /// Moves instructions one stage downstream, WB first.
    ///
    /// A stage whose predecessor is effectively stalled keeps that slot in
    /// place. WB's previous occupant retires when overwritten; its record
    /// stays in the ledger with no current stage.
    pub fn transfer(&mut self, ledger: &mut [InstRecord]) {
        for i in (1..STAGE_COUNT).rev() {
            if self.effectively_stalled(i - 1) {
                continue;
            }
            let incoming = self.stages[i - 1].slot.take();
            let outgoing = std::mem::replace(&mut self.stages[i].slot, incoming);
            if let Some(rec) = outgoing {
                // Only WB drops its occupant; everything else was already
                // pulled downstream earlier in this walk.
                ledger[rec].stage = None;
            }
            if let Some(rec) = incoming {
                ledger[rec].stage = Some(self.stages[i].name);
                log::trace!("transfer I#{} -> {}", rec + 1, self.stages[i].name);
            }
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
