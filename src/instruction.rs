//! Opcode field extraction and decode.
//!
//! Chip-8 opcodes are 16 bits, big-endian. Behaviour is cased on the top
//! nibble and, within a category, on the low nibble or byte. The remaining
//! nibbles carry operands:
//! - `(_, n, n, n)` a 12-bit address
//! - `(_, _, n, n)` a byte compared with or assigned to Vx
//! - `(_, n, _, _)` the register Vx (or the range V0..=Vx)
//! - `(_, _, n, _)` the register Vy
//!
//! Decode is separated from execute so each half can be tested on its own:
//! a fetched word becomes one `Instruction` variant, and the interpreter
//! matches on that exhaustively.

/// Field accessors for a raw 16-bit opcode word.
pub trait OpcodeFields {
    /// component nibbles, most significant first
    fn nibbles(&self) -> (u8, u8, u8, u8);

    /// the low 12 bits (a jump/load target)
    fn addr(&self) -> u16;

    /// the low byte
    fn byte(&self) -> u8;
}

impl OpcodeFields for u16 {
    fn nibbles(&self) -> (u8, u8, u8, u8) {
        (
            ((self & 0xF000) >> 12) as u8,
            ((self & 0x0F00) >> 8) as u8,
            ((self & 0x00F0) >> 4) as u8,
            (self & 0x000F) as u8,
        )
    }

    fn addr(&self) -> u16 {
        self & 0x0FFF
    }

    fn byte(&self) -> u8 {
        (self & 0x00FF) as u8
    }
}

/// One decoded instruction. Register operands are the x/y nibble indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 0nnn machine-code routine; ignored, as are unrecognized words
    Sys,
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1nnn
    Jp(u16),
    /// 2nnn
    Call(u16),
    /// 3xnn
    SeByte(u8, u8),
    /// 4xnn
    SneByte(u8, u8),
    /// 5xy0
    SeReg(u8, u8),
    /// 6xnn
    LdByte(u8, u8),
    /// 7xnn
    AddByte(u8, u8),
    /// 8xy0
    LdReg(u8, u8),
    /// 8xy1
    Or(u8, u8),
    /// 8xy2
    And(u8, u8),
    /// 8xy3
    Xor(u8, u8),
    /// 8xy4
    AddReg(u8, u8),
    /// 8xy5
    Sub(u8, u8),
    /// 8xy6
    Shr(u8),
    /// 8xy7
    Subn(u8, u8),
    /// 8xyE
    Shl(u8),
    /// 9xy0
    SneReg(u8, u8),
    /// Annn
    LdI(u16),
    /// Bnnn
    JpV0(u16),
    /// Cxnn
    Rnd(u8, u8),
    /// Dxyn
    Drw(u8, u8, u8),
    /// Ex9E
    Skp(u8),
    /// ExA1
    Sknp(u8),
    /// Fx07
    LdRegDt(u8),
    /// Fx0A
    LdKey(u8),
    /// Fx15
    LdDtReg(u8),
    /// Fx18
    LdStReg(u8),
    /// Fx1E
    AddI(u8),
    /// Fx29
    LdFont(u8),
    /// Fx33
    LdBcd(u8),
    /// Fx55
    Store(u8),
    /// Fx65
    Load(u8),
}

/// Decode one fetched word. Unrecognized patterns fall through to `Sys`,
/// which the interpreter treats as a two-byte no-op.
pub fn decode(op: u16) -> Instruction {
    use Instruction::*;

    let (_, x, y, n) = op.nibbles();
    match op.nibbles() {
        (0x0, 0x0, 0xE, 0x0) => Cls,
        (0x0, 0x0, 0xE, 0xE) => Ret,
        (0x0, ..) => Sys,
        (0x1, ..) => Jp(op.addr()),
        (0x2, ..) => Call(op.addr()),
        (0x3, ..) => SeByte(x, op.byte()),
        (0x4, ..) => SneByte(x, op.byte()),
        (0x5, .., 0x0) => SeReg(x, y),
        (0x6, ..) => LdByte(x, op.byte()),
        (0x7, ..) => AddByte(x, op.byte()),
        (0x8, .., 0x0) => LdReg(x, y),
        (0x8, .., 0x1) => Or(x, y),
        (0x8, .., 0x2) => And(x, y),
        (0x8, .., 0x3) => Xor(x, y),
        (0x8, .., 0x4) => AddReg(x, y),
        (0x8, .., 0x5) => Sub(x, y),
        (0x8, .., 0x6) => Shr(x),
        (0x8, .., 0x7) => Subn(x, y),
        (0x8, .., 0xE) => Shl(x),
        (0x9, .., 0x0) => SneReg(x, y),
        (0xA, ..) => LdI(op.addr()),
        (0xB, ..) => JpV0(op.addr()),
        (0xC, ..) => Rnd(x, op.byte()),
        (0xD, ..) => Drw(x, y, n),
        (0xE, .., 0x9, 0xE) => Skp(x),
        (0xE, .., 0xA, 0x1) => Sknp(x),
        (0xF, .., 0x0, 0x7) => LdRegDt(x),
        (0xF, .., 0x0, 0xA) => LdKey(x),
        (0xF, .., 0x1, 0x5) => LdDtReg(x),
        (0xF, .., 0x1, 0x8) => LdStReg(x),
        (0xF, .., 0x1, 0xE) => AddI(x),
        (0xF, .., 0x2, 0x9) => LdFont(x),
        (0xF, .., 0x3, 0x3) => LdBcd(x),
        (0xF, .., 0x5, 0x5) => Store(x),
        (0xF, .., 0x6, 0x5) => Load(x),
        _ => Sys,
    }
}
