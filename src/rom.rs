use std::fs::File;
use std::io::{self, Read};

use log::info;
use thiserror::Error;

use crate::memory::MAX_PROGRAM_SIZE;

/// Everything that can go wrong between a ROM path and a loadable byte
/// vector. All of these surface before the VM runs its first cycle, so a
/// failed load leaves no VM state behind.
#[derive(Debug, Error)]
pub enum LoadFault {
    #[error("ROM file not found: {0}")]
    NotFound(String),
    #[error("ROM contains no bytes")]
    Empty,
    #[error("ROM is {0} bytes; the program area holds at most {MAX_PROGRAM_SIZE}")]
    TooLarge(usize),
    #[error("i/o failure reading ROM: {0}")]
    IOFailure(#[from] io::Error),
}

/// Read a ROM file into memory and validate its size. The format is a flat
/// big-endian stream of two-byte opcodes, no header or footer, so the only
/// thing to check is that it fits the program area.
pub fn read_rom(path: &str) -> Result<Vec<u8>, LoadFault> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadFault::NotFound(path.to_string()),
        _ => LoadFault::IOFailure(e),
    })?;
    let mut rom = Vec::new();
    file.read_to_end(&mut rom)?;
    if rom.is_empty() {
        return Err(LoadFault::Empty);
    }
    if rom.len() > MAX_PROGRAM_SIZE {
        return Err(LoadFault::TooLarge(rom.len()));
    }
    info!("read {} byte ROM from {}", rom.len(), path);
    Ok(rom)
}
