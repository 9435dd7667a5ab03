//! Pipeline stage identity and control signals.
//!
//! This module defines the fixed nine-stage layout and the signal vocabulary
//! stage hooks use to talk to the engine. It provides:
//! 1. **Stage Names:** The ordered `IF1..WB` stage identifiers.
//! 2. **Stage Events:** The recoverable outcomes a stage hook can report.

use std::fmt;

/// Identity of one of the nine pipeline stages, in pipeline order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageName {
    /// First instruction fetch stage; the issue point.
    If1,
    /// Second instruction fetch stage.
    If2,
    /// Third instruction fetch stage.
    If3,
    /// Instruction decode; operand evaluation and destination locking.
    Id,
    /// Execute; arithmetic results are produced here.
    Ex,
    /// First memory stage.
    Mem1,
    /// Second memory stage.
    Mem2,
    /// Third memory stage; loads read memory here.
    Mem3,
    /// Writeback; instructions complete here.
    Wb,
}

impl StageName {
    /// All stages in pipeline order, IF1 first.
    pub const ALL: [StageName; 9] = [
        StageName::If1,
        StageName::If2,
        StageName::If3,
        StageName::Id,
        StageName::Ex,
        StageName::Mem1,
        StageName::Mem2,
        StageName::Mem3,
        StageName::Wb,
    ];

    /// Display name of the stage.
    pub fn as_str(self) -> &'static str {
        match self {
            StageName::If1 => "IF1",
            StageName::If2 => "IF2",
            StageName::If3 => "IF3",
            StageName::Id => "ID",
            StageName::Ex => "EX",
            StageName::Mem1 => "MEM1",
            StageName::Mem2 => "MEM2",
            StageName::Mem3 => "MEM3",
            StageName::Wb => "WB",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recoverable outcome of one stage hook invocation.
///
/// Fatal conditions travel separately as `Err(SimError)`; these values are
/// consumed by the engine within the cycle and never escape a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageEvent {
    /// Stage work complete; the instruction may advance next cycle.
    Done,
    /// Read-after-write hazard: hold this stage and retry next cycle.
    RawHazard,
    /// A branch is resolving: every upstream stage holds position.
    BranchResolving,
    /// Control transfer decided: discard everything upstream this cycle.
    FlushPipeline,
}
