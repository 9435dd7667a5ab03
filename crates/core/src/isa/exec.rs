//! Per-opcode stage behavior.
//!
//! This module is the semantic table of the instruction set: for each opcode
//! it defines what happens in each of the nine stages. It provides:
//! 1. **Dispatch:** [`step`] routes a (opcode, stage) pair to its hook;
//!    stages an opcode does not override are successful no-ops.
//! 2. **Hazard Reporting:** Operand evaluation on a locked register yields
//!    `StageEvent::RawHazard`; the engine stalls and retries the same stage.
//! 3. **Forwarding:** With forwarding enabled, writebacks happen at EX
//!    (arithmetic) or MEM3 (loads), releasing the destination lock early;
//!    without it they wait for WB.
//! 4. **Branch Policies:** BNEZ's behavior in IF1..ID per policy, using the
//!    fall-through pointer captured at issue and the target resolved in IF2.

use crate::common::{EvalError, SimError, Word};
use crate::config::BranchPolicy;
use crate::core::mem::Memory;
use crate::core::pipeline::signals::{StageEvent, StageName};
use crate::core::regfile::RegisterFile;
use crate::isa::operand::Operand;
use crate::isa::{Instruction, LabelTable, Opcode};

/// Scratch state one in-flight instruction accumulates across its stages.
///
/// Decode resolves operands into these fields; later stages consume them.
/// A field read before its producing stage ran is a fatal ordering fault.
#[derive(Clone, Debug, Default)]
pub struct ExecState {
    /// Resolved memory word index (LD, SD).
    pub address: Option<usize>,
    /// Store value, loaded value, or arithmetic result.
    pub value: Option<Word>,
    /// Resolved first addend (DADD, DADDI).
    pub lhs: Option<Word>,
    /// Resolved second addend (DADD, DADDI).
    pub rhs: Option<Word>,
    /// Instruction-cache index of the fall-through path (BNEZ).
    pub fall_through: Option<usize>,
    /// Instruction-cache index of the branch target (BNEZ).
    pub target: Option<usize>,
}

/// Machine state a stage hook may read and mutate.
pub struct StageCtx<'a> {
    /// Register file with hazard locks.
    pub regs: &'a mut RegisterFile,
    /// Data memory.
    pub ram: &'a mut Memory,
    /// Label table for branch targets.
    pub labels: &'a LabelTable,
    /// Instruction pointer; branches redirect fetch by writing it.
    pub ip: &'a mut usize,
    /// Whether early writebacks are enabled.
    pub forwarding: bool,
    /// Branch resolution policy.
    pub policy: BranchPolicy,
    /// Scratch state of the instruction being stepped.
    pub state: &'a mut ExecState,
}

/// Runs the hook of `inst` for `stage`.
pub fn step(
    inst: &Instruction,
    stage: StageName,
    ctx: &mut StageCtx<'_>,
) -> Result<StageEvent, SimError> {
    match inst.opcode {
        Opcode::Ld => ld(inst, stage, ctx),
        Opcode::Sd => sd(inst, stage, ctx),
        Opcode::Dadd | Opcode::Daddi => add(inst, stage, ctx),
        Opcode::Bnez => bnez(inst, stage, ctx),
    }
}

/// Evaluates `operand`, separating the recoverable locked case from fatal
/// faults. `None` means a RAW hazard was hit.
fn resolve(
    operand: &Operand,
    regs: &RegisterFile,
    labels: &LabelTable,
) -> Result<Option<Word>, SimError> {
    match operand.value(regs, labels) {
        Ok(value) => Ok(Some(value)),
        Err(EvalError::Locked(reg)) => {
            log::trace!("operand {} blocked: {} has writes pending", operand, reg);
            Ok(None)
        }
        Err(EvalError::UnknownLabel(label)) => Err(SimError::UnknownLabel(label)),
    }
}

/// Writes `value` to the destination register and retires its hazard lock.
fn write_back(inst: &Instruction, ctx: &mut StageCtx<'_>, value: Word) -> Result<(), SimError> {
    let rd = inst.dest_register()?;
    ctx.regs.release(rd)?;
    ctx.regs.set(rd, value);
    log::debug!("writeback {} = {}", rd, value);
    Ok(())
}

/// The scratch field a later stage depends on was never produced.
fn stage_order(inst: &Instruction, stage: StageName) -> SimError {
    SimError::StageOrder {
        opcode: inst.opcode.mnemonic(),
        stage: stage.as_str(),
    }
}

/// `LD Rd, d(Rs)`: resolve the address and lock `Rd` at decode, read memory
/// at MEM3, write the register back at MEM3 (forwarding) or WB.
fn ld(
    inst: &Instruction,
    stage: StageName,
    ctx: &mut StageCtx<'_>,
) -> Result<StageEvent, SimError> {
    match stage {
        StageName::Id => {
            let Some(address) = resolve(&inst.operand_a, ctx.regs, ctx.labels)? else {
                return Ok(StageEvent::RawHazard);
            };
            let rd = inst.dest_register()?;
            ctx.state.address = Some(address as usize);
            ctx.regs.acquire(rd);
            Ok(StageEvent::Done)
        }
        StageName::Mem3 => {
            let address = ctx
                .state
                .address
                .ok_or_else(|| stage_order(inst, stage))?;
            let value = ctx.ram.read(address)?;
            ctx.state.value = Some(value);
            if ctx.forwarding {
                write_back(inst, ctx, value)?;
            }
            Ok(StageEvent::Done)
        }
        StageName::Wb => {
            if !ctx.forwarding {
                let value = ctx.state.value.ok_or_else(|| stage_order(inst, stage))?;
                write_back(inst, ctx, value)?;
            }
            Ok(StageEvent::Done)
        }
        _ => Ok(StageEvent::Done),
    }
}

/// `SD d(Rd), Rs`: the destination slot holds the memory operand. Resolve
/// value and address at decode, write memory at WB.
fn sd(
    inst: &Instruction,
    stage: StageName,
    ctx: &mut StageCtx<'_>,
) -> Result<StageEvent, SimError> {
    match stage {
        StageName::Id => {
            let Some(value) = resolve(&inst.operand_a, ctx.regs, ctx.labels)? else {
                return Ok(StageEvent::RawHazard);
            };
            let Some(address) = resolve(&inst.dest, ctx.regs, ctx.labels)? else {
                return Ok(StageEvent::RawHazard);
            };
            ctx.state.value = Some(value);
            ctx.state.address = Some(address as usize);
            Ok(StageEvent::Done)
        }
        StageName::Wb => {
            let address = ctx
                .state
                .address
                .ok_or_else(|| stage_order(inst, stage))?;
            let value = ctx.state.value.ok_or_else(|| stage_order(inst, stage))?;
            ctx.ram.write(address, value)?;
            Ok(StageEvent::Done)
        }
        _ => Ok(StageEvent::Done),
    }
}

/// `DADD Rd, Ra, Rb` and `DADDI Rd, Ra, #imm`: resolve both addends and
/// lock `Rd` at decode, sum at EX, write back at EX (forwarding) or WB.
/// The sum wraps modulo 2^64.
fn add(
    inst: &Instruction,
    stage: StageName,
    ctx: &mut StageCtx<'_>,
) -> Result<StageEvent, SimError> {
    match stage {
        StageName::Id => {
            let operand_b = inst
                .operand_b
                .as_ref()
                .ok_or(SimError::MissingOperand(inst.opcode.mnemonic()))?;
            let Some(lhs) = resolve(&inst.operand_a, ctx.regs, ctx.labels)? else {
                return Ok(StageEvent::RawHazard);
            };
            let Some(rhs) = resolve(operand_b, ctx.regs, ctx.labels)? else {
                return Ok(StageEvent::RawHazard);
            };
            let rd = inst.dest_register()?;
            ctx.state.lhs = Some(lhs);
            ctx.state.rhs = Some(rhs);
            ctx.regs.acquire(rd);
            Ok(StageEvent::Done)
        }
        StageName::Ex => {
            let lhs = ctx.state.lhs.ok_or_else(|| stage_order(inst, stage))?;
            let rhs = ctx.state.rhs.ok_or_else(|| stage_order(inst, stage))?;
            let value = lhs.wrapping_add(rhs);
            ctx.state.value = Some(value);
            if ctx.forwarding {
                write_back(inst, ctx, value)?;
            }
            Ok(StageEvent::Done)
        }
        StageName::Wb => {
            if !ctx.forwarding {
                let value = ctx.state.value.ok_or_else(|| stage_order(inst, stage))?;
                write_back(inst, ctx, value)?;
            }
            Ok(StageEvent::Done)
        }
        _ => Ok(StageEvent::Done),
    }
}

/// `BNEZ Rs, label`: the destination slot holds the tested register and
/// operand A the target.
///
/// IF1 captures the fall-through pointer; IF2 resolves the target (and
/// under predict-taken redirects fetch there); decode evaluates the
/// register and confirms or corrects. Under the flush policy the three
/// fetch stages hold everything upstream until decode resolves.
fn bnez(
    inst: &Instruction,
    stage: StageName,
    ctx: &mut StageCtx<'_>,
) -> Result<StageEvent, SimError> {
    match stage {
        StageName::If1 => {
            ctx.state.fall_through = Some(*ctx.ip);
            match ctx.policy {
                BranchPolicy::Flush => Ok(StageEvent::BranchResolving),
                _ => Ok(StageEvent::Done),
            }
        }
        StageName::If2 => {
            let Some(target) = resolve(&inst.operand_a, ctx.regs, ctx.labels)? else {
                return Ok(StageEvent::RawHazard);
            };
            let target = target as usize;
            ctx.state.target = Some(target);
            match ctx.policy {
                BranchPolicy::Flush => Ok(StageEvent::BranchResolving),
                BranchPolicy::PredictTaken => {
                    log::debug!("predict taken: fetch redirected to index {}", target);
                    *ctx.ip = target;
                    Ok(StageEvent::FlushPipeline)
                }
                BranchPolicy::PredictNotTaken => Ok(StageEvent::Done),
            }
        }
        StageName::If3 => match ctx.policy {
            BranchPolicy::Flush => Ok(StageEvent::BranchResolving),
            _ => Ok(StageEvent::Done),
        },
        StageName::Id => {
            let Some(value) = resolve(&inst.dest, ctx.regs, ctx.labels)? else {
                return Ok(StageEvent::RawHazard);
            };
            let taken = value != 0;
            let target = ctx.state.target.ok_or_else(|| stage_order(inst, stage))?;
            let fall_through = ctx
                .state
                .fall_through
                .ok_or_else(|| stage_order(inst, stage))?;
            match ctx.policy {
                BranchPolicy::Flush => {
                    *ctx.ip = if taken { target } else { fall_through };
                    log::debug!("branch resolved: taken={}, fetch from {}", taken, *ctx.ip);
                    Ok(StageEvent::FlushPipeline)
                }
                BranchPolicy::PredictNotTaken => {
                    if taken {
                        *ctx.ip = target;
                        log::debug!("mispredict: branch taken, fetch from {}", target);
                        Ok(StageEvent::FlushPipeline)
                    } else {
                        Ok(StageEvent::Done)
                    }
                }
                BranchPolicy::PredictTaken => {
                    if taken {
                        Ok(StageEvent::Done)
                    } else {
                        *ctx.ip = fall_through;
                        log::debug!("mispredict: branch not taken, fetch from {}", fall_through);
                        Ok(StageEvent::FlushPipeline)
                    }
                }
            }
        }
        _ => Ok(StageEvent::Done),
    }
}
