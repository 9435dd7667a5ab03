//! Program text parsing.

use mips_core::common::Reg;
use mips_core::isa::operand::Operand;
use mips_core::isa::Opcode;
use mips_core::sim::parser::{parse_instruction, parse_operand, parse_program};
use mips_core::SimError;

use crate::common::programs;

fn r(n: u8) -> Reg {
    Reg::new(n).unwrap()
}

#[test]
fn parses_smallest_program() {
    let program = parse_program(programs::EMPTY).unwrap();
    assert!(program.icache.is_empty());
    assert!(program.labels.is_empty());
    assert_eq!(program.registers.non_zero().count(), 0);
    assert_eq!(program.ram.non_zero().count(), 0);
}

#[test]
fn parses_registers_and_memory() {
    let program = parse_program(
        "REGISTERS
R1 42
R0 9
R7 13
MEMORY
42 31337
CODE
",
    )
    .unwrap();
    assert_eq!(program.registers.get(r(1)), 42);
    assert_eq!(program.registers.get(r(7)), 13);
    // R0 initializers are accepted but the value is discarded.
    assert_eq!(program.registers.get(Reg::ZERO), 0);
    assert_eq!(program.ram.read(42).unwrap(), 31337);
}

#[test]
fn negative_initializers_wrap() {
    let program = parse_program("REGISTERS\nR1 -1\nMEMORY\n0 -2\nCODE\n").unwrap();
    assert_eq!(program.registers.get(r(1)), u64::MAX);
    assert_eq!(program.ram.read(0).unwrap(), u64::MAX - 1);
}

#[test]
fn parses_all_instruction_forms() {
    let listing = "Loop: LD    R2,    0(R1)
      DADD  R4,    R2,    R3
      SD    0(R1), R4
      DADDI R1,    R1,    #-8
      BNEZ  R1,   Loop
      DADDI R1,    R1,    #-8
      BNEZ  R1,    Next
      DADD  R3,    R4,    R5
Next: LD    R6,    0(R5)
      DADD  R4,    R2,    R3
      SD    0(R5), R4
      DADDI R1,    R1,    #-8";
    for line in listing.lines() {
        parse_instruction(line.trim()).unwrap();
    }
}

#[test]
fn decodes_load() {
    let inst = parse_instruction("LD R2, 0(R1)").unwrap();
    assert_eq!(inst.opcode, Opcode::Ld);
    assert_eq!(inst.dest, Operand::Register(r(2)));
    assert_eq!(inst.operand_a, Operand::Offset(r(1), 0));
    assert_eq!(inst.operand_b, None);
    assert_eq!(inst.label, None);
}

#[test]
fn store_keeps_memory_operand_in_destination_slot() {
    let inst = parse_instruction("SD 0(R1), R3").unwrap();
    assert_eq!(inst.opcode, Opcode::Sd);
    assert_eq!(inst.dest, Operand::Offset(r(1), 0));
    assert_eq!(inst.operand_a, Operand::Register(r(3)));
}

#[test]
fn branch_keeps_register_in_destination_slot() {
    let inst = parse_instruction("BNEZ R1, Start").unwrap();
    assert_eq!(inst.opcode, Opcode::Bnez);
    assert_eq!(inst.dest, Operand::Register(r(1)));
    assert_eq!(inst.operand_a, Operand::Label("Start".to_string()));
}

#[test]
fn decodes_add_immediate() {
    let inst = parse_instruction("Top: DADDI R1, R1, #-8").unwrap();
    assert_eq!(inst.opcode, Opcode::Daddi);
    assert_eq!(inst.label.as_deref(), Some("Top"));
    assert_eq!(inst.operand_b, Some(Operand::Immediate(-8)));
}

#[test]
fn labels_map_to_the_labeled_instruction() {
    let program = parse_program(programs::PROVIDED[2]).unwrap();
    assert_eq!(program.labels.get("Loop"), Some(&0));
    assert_eq!(program.labels.get("Next"), Some(&8));
    assert_eq!(program.icache.len(), 12);
}

#[test]
fn operand_grammar() {
    assert_eq!(parse_operand("#-8").unwrap(), Operand::Immediate(-8));
    assert_eq!(parse_operand("#42").unwrap(), Operand::Immediate(42));
    assert_eq!(parse_operand("R4").unwrap(), Operand::Register(r(4)));
    assert_eq!(parse_operand("R31").unwrap(), Operand::Register(r(31)));
    assert_eq!(parse_operand("16(R2)").unwrap(), Operand::Offset(r(2), 16));
    assert_eq!(parse_operand("-8(R1)").unwrap(), Operand::Offset(r(1), -8));
    assert_eq!(
        parse_operand("Loop").unwrap(),
        Operand::Label("Loop".to_string())
    );
    // A register-looking token with a non-numeric tail is a label.
    assert_eq!(
        parse_operand("R1x").unwrap(),
        Operand::Label("R1x".to_string())
    );
}

#[test]
fn operand_rejections() {
    assert!(parse_operand("R32").is_err());
    assert!(parse_operand("#eight").is_err());
    assert!(parse_operand("5(Rx)").is_err());
    assert!(parse_operand("5(R1").is_err());
    assert!(parse_operand("(R1)").is_err());
}

#[test]
fn instruction_rejections() {
    assert!(parse_instruction("NOP R1, R2").is_err());
    assert!(parse_instruction("LD R2").is_err());
    assert!(parse_instruction("DADD R1, R2, R3, R4").is_err());
    assert!(parse_instruction("Loop:").is_err());
}

#[test]
fn program_rejections() {
    // Missing leading header.
    let err = parse_program("MEMORY\nCODE\n").unwrap_err();
    assert!(matches!(err, SimError::Parse { line: 1, .. }));

    // Truncated before CODE.
    assert!(parse_program("REGISTERS\nR1 1\n").is_err());

    // Bad register line.
    let err = parse_program("REGISTERS\nR1\nMEMORY\nCODE\n").unwrap_err();
    assert!(matches!(err, SimError::Parse { line: 2, .. }));

    // Memory index past the end of the 992-word memory.
    assert!(parse_program("REGISTERS\nMEMORY\n992 1\nCODE\n").is_err());

    // Unknown opcode inside CODE.
    let err = parse_program("REGISTERS\nMEMORY\nCODE\nMUL R1, R2, R3\n").unwrap_err();
    match err {
        SimError::Parse { line, reason, .. } => {
            assert_eq!(line, 4);
            assert!(reason.contains("invalid opcode"));
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn blank_line_ends_the_code_section() {
    let program = parse_program("REGISTERS\nMEMORY\nCODE\nLD R1, 0(R0)\n\nnot code\n").unwrap();
    assert_eq!(program.icache.len(), 1);
}
