//! Loading programs from files.

use std::io::Write;

use mips_core::{Config, Cpu, SimError};
use tempfile::NamedTempFile;

use crate::common::programs;

#[test]
fn loads_program_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(programs::BASIC.as_bytes()).unwrap();

    let config = Config::default();
    let cpu = Cpu::from_program_file(file.path().to_str().unwrap(), &config).unwrap();
    assert_eq!(cpu.icache.len(), 3);
    assert_eq!(cpu.ram.read(2).unwrap(), 20);
}

#[test]
fn missing_file_reports_io_error() {
    let config = Config::default();
    let err = Cpu::from_program_file("/nonexistent/program.txt", &config).unwrap_err();
    match err {
        SimError::Io { path, .. } => assert_eq!(path, "/nonexistent/program.txt"),
        other => panic!("expected an I/O error, got {:?}", other),
    }
}

#[test]
fn parse_errors_pass_through_file_loading() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"CODE\n").unwrap();

    let config = Config::default();
    let err = Cpu::from_program_file(file.path().to_str().unwrap(), &config).unwrap_err();
    assert!(matches!(err, SimError::Parse { line: 1, .. }));
}
