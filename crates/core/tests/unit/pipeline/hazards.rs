//! RAW hazard stalls, with and without forwarding.

use mips_core::core::pipeline::signals::StageName;
use mips_core::RunOutcome;

use crate::common::harness::TestContext;
use crate::common::programs;

#[test]
fn load_use_chain_without_forwarding() {
    let mut ctx = TestContext::new(programs::RAW_HAZARD);
    assert_eq!(ctx.run(35), RunOutcome::Finished);

    assert_eq!(ctx.reg(1), 1);
    assert_eq!(ctx.reg(2), 7);
    assert_eq!(ctx.reg(3), 10);
    assert_eq!(ctx.mem(1), 10);

    // Without forwarding each consumer waits for its producer's WB.
    assert_eq!(ctx.cpu.cycle, 19);
    ctx.assert_invariants();
}

#[test]
fn load_use_chain_with_forwarding() {
    let mut ctx = TestContext::new(programs::RAW_HAZARD);
    ctx.cpu.set_forwarding(true);
    assert_eq!(ctx.run(35), RunOutcome::Finished);

    // Forwarding changes timing only, never the final state.
    assert_eq!(ctx.reg(2), 7);
    assert_eq!(ctx.reg(3), 10);
    assert_eq!(ctx.mem(1), 10);
    assert_eq!(ctx.cpu.cycle, 14);
    ctx.assert_invariants();
}

#[test]
fn consumer_decodes_the_cycle_its_producer_writes_back() {
    let mut ctx = TestContext::new(programs::RAW_HAZARD);
    ctx.run(35);

    // The add (ledger entry 2) sits in decode until the load's WB on
    // cycle 9 releases R2; writebacks run ahead of decode within a cycle.
    let add = &ctx.cpu.ledger[1];
    assert_eq!(add.cycle_start, 2);
    assert_eq!(add.stages.get(&StageName::Id), Some(&9));
    assert_eq!(add.stages.get(&StageName::Ex), Some(&10));
    assert_eq!(add.cycle_finish, Some(14));

    // The store waits for the add's WB on cycle 14 the same way.
    let store = &ctx.cpu.ledger[2];
    assert_eq!(store.stages.get(&StageName::Id), Some(&14));
    assert_eq!(store.cycle_finish, Some(19));
}

#[test]
fn stall_statistics() {
    let mut ctx = TestContext::new(programs::RAW_HAZARD);
    ctx.run(35);

    let stats = &ctx.cpu.stats;
    assert_eq!(stats.issued, 3);
    assert_eq!(stats.retired, 3);
    assert_eq!(stats.flushed, 0);
    assert_eq!(stats.flushes, 0);
    // The add retries decode on cycles 5-8, the store on cycles 10-13.
    assert_eq!(stats.data_stalls, 8);
    assert_eq!(stats.control_stalls, 0);
}

#[test]
fn stacked_writers_hold_the_reader_until_both_retire() {
    let source = "REGISTERS
R2 1
R3 2
R4 10
R5 20
MEMORY
CODE
      DADD R1, R2, R3
      DADD R1, R4, R5
      DADD R6, R1, R1
";
    let mut ctx = TestContext::new(source);
    assert_eq!(ctx.run(100), RunOutcome::Finished);

    // The reader saw the second writer's value, not the first's.
    assert_eq!(ctx.reg(1), 30);
    assert_eq!(ctx.reg(6), 60);
    assert_eq!(ctx.cpu.cycle, 15);

    // Both writers held R1; the reader decoded only after the second WB
    // on cycle 10.
    let reader = &ctx.cpu.ledger[2];
    assert_eq!(reader.stages.get(&StageName::Id), Some(&10));
    ctx.assert_invariants();
}

#[test]
fn r0_source_never_stalls() {
    // The load addresses through R0 while R0 is the destination of
    // nothing; no stall can arise from the zero register.
    let source = "REGISTERS
MEMORY
0 5
CODE
      LD R2, 0(R0)
      LD R3, 0(R0)
";
    let mut ctx = TestContext::new(source);
    assert_eq!(ctx.run(100), RunOutcome::Finished);
    assert_eq!(ctx.reg(2), 5);
    assert_eq!(ctx.reg(3), 5);
    assert_eq!(ctx.cpu.stats.data_stalls, 0);
    ctx.assert_invariants();
}
