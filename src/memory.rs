use crate::rom::LoadFault;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// how much RAM we have
pub const MEMORY_SIZE: usize = 4096;

/// where the font glyphs live
pub const FONT_ADDR: u16 = 0x050;

/// where the program is loaded
pub const PROGRAM_ADDR: u16 = 0x200;

/// largest program that fits between 0x200 and the top of RAM
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_ADDR as usize;

/// Flat 4K address space. The font table is baked in at construction and the
/// program is written once at load; after that the interpreter is the only
/// writer. Reads past the top of RAM yield 0 and writes there are dropped,
/// which is what the store/load opcodes rely on for their bounds guards.
pub struct MemoryImage {
    bytes: [u8; MEMORY_SIZE],
}

impl MemoryImage {
    pub fn new() -> Self {
        let mut bytes = [0u8; MEMORY_SIZE];
        let font_at = FONT_ADDR as usize;
        bytes[font_at..font_at + FONT.len()].copy_from_slice(&FONT);
        MemoryImage { bytes }
    }

    /// write a program at 0x200, rejecting sizes the address space can't hold
    pub fn load_program(&mut self, rom: &[u8]) -> Result<(), LoadFault> {
        if rom.is_empty() {
            return Err(LoadFault::Empty);
        }
        if rom.len() > MAX_PROGRAM_SIZE {
            return Err(LoadFault::TooLarge(rom.len()));
        }
        let at = PROGRAM_ADDR as usize;
        self.bytes[at..at + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    /// single byte read; out-of-range reads as 0
    pub fn read(&self, addr: u16) -> u8 {
        self.bytes.get(addr as usize).copied().unwrap_or(0)
    }

    /// single byte write; out-of-range writes are dropped
    pub fn write(&mut self, addr: u16, value: u8) {
        if let Some(b) = self.bytes.get_mut(addr as usize) {
            *b = value;
        }
    }

    /// big-endian two-byte read (opcode fetch); caller checks bounds
    pub fn read_word(&self, addr: u16) -> u16 {
        (u16::from(self.read(addr)) << 8) | u16::from(self.read(addr.wrapping_add(1)))
    }
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::new()
    }
}

/// 5-byte-per-glyph hex font, 0-F
const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
