use log::warn;
use rand::Rng;

use crate::display::FrameBuffer;
use crate::instruction::{decode, Instruction};
use crate::keypad::Keypad;
use crate::memory::{MemoryImage, FONT_ADDR, MEMORY_SIZE, PROGRAM_ADDR};
use crate::rom::LoadFault;
use crate::timer::Timers;

/// how many return addresses the call stack holds
pub const STACK_DEPTH: usize = 16;

/// last address a full two-byte opcode fits at
const LAST_SLOT: u16 = 0xFFE;

/// pc-overflow recoveries granted before the VM halts for good
const MAX_OVERFLOW_RETRIES: u8 = 4;

/// Why the VM stopped. Recorded once, queryable by the host; after any of
/// these the interpreter refuses further cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionFault {
    /// pc pushed past the top of the address space more times than the
    /// retry budget allows (or fetched from past it)
    PcOverflow,
    /// jump target at or past 0xFFF, where no opcode fits
    InvalidJumpTarget(u16),
    /// RET with nothing on the stack
    StackUnderflow,
    /// CALL with all 16 stack slots in use
    StackOverflow,
}

/// Run mode: the wait-for-key instruction parks the VM here instead of
/// re-decoding the same opcode every cycle. pc stays on the wait
/// instruction until a fresh key edge arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Running,
    AwaitingKey(u8),
}

/// What the executed instruction wants done with pc.
enum Flow {
    Next,
    Skip,
    Jump(u16),
    Stay,
}

fn skip_if(cond: bool) -> Flow {
    if cond {
        Flow::Skip
    } else {
        Flow::Next
    }
}

/// The interpreter proper: register file, call stack and control flow,
/// owning the memory image, timers, keypad and framebuffer it mutates.
/// The host drives it with bursts of `cycle()` calls and ticks the timers
/// on its own 60Hz cadence.
pub struct Interpreter {
    memory: MemoryImage,
    v: [u8; 16],
    i: u16,
    pc: u16,
    sp: u8,
    stack: [u16; STACK_DEPTH],
    mode: Mode,
    fault: Option<ExecutionFault>,
    overflow_retries: u8,
    pub timers: Timers,
    pub keypad: Keypad,
    pub frame: FrameBuffer,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            memory: MemoryImage::new(),
            v: [0; 16],
            i: 0,
            pc: PROGRAM_ADDR,
            sp: 0,
            stack: [0; STACK_DEPTH],
            mode: Mode::Running,
            fault: None,
            overflow_retries: 0,
            timers: Timers::new(),
            keypad: Keypad::new(),
            frame: FrameBuffer::new(),
        }
    }

    /// load a chip8 program at 0x200
    pub fn load_program(&mut self, rom: &[u8]) -> Result<(), LoadFault> {
        self.memory.load_program(rom)
    }

    pub fn is_halted(&self) -> bool {
        self.fault.is_some()
    }

    pub fn fault(&self) -> Option<ExecutionFault> {
        self.fault
    }

    /// Run one fetch/decode/execute step. A no-op once halted. While
    /// awaiting a key this polls the keypad instead of fetching, so the
    /// wait instruction is a busy-poll, not a blocking call.
    pub fn cycle(&mut self) {
        if self.is_halted() {
            return;
        }
        if let Mode::AwaitingKey(x) = self.mode {
            if let Some(key) = self.keypad.take_pending() {
                self.v[usize::from(x)] = key;
                self.mode = Mode::Running;
                self.advance(2);
            }
            return;
        }
        let op = match self.fetch() {
            Some(op) => op,
            None => {
                self.halt(ExecutionFault::PcOverflow);
                return;
            }
        };
        let flow = self.execute(decode(op));
        if self.is_halted() {
            return;
        }
        match flow {
            Flow::Next => self.advance(2),
            Flow::Skip => self.advance(4),
            Flow::Jump(target) => self.pc = target,
            Flow::Stay => {}
        }
    }

    /// big-endian word at pc; None if the second byte would be off the end
    fn fetch(&self) -> Option<u16> {
        if usize::from(self.pc) + 1 >= MEMORY_SIZE {
            None
        } else {
            Some(self.memory.read_word(self.pc))
        }
    }

    fn halt(&mut self, fault: ExecutionFault) {
        warn!("vm halted at pc={:#05x}: {:?}", self.pc, fault);
        self.fault = Some(fault);
    }

    /// Move pc forward, applying the overflow recovery policy: the first
    /// few overshoots reset pc into the program (skips land on the last
    /// valid slot instead), after that the VM halts for good. Well-formed
    /// ROMs never get here.
    fn advance(&mut self, step: u16) {
        let next = u32::from(self.pc) + u32::from(step);
        if next <= u32::from(LAST_SLOT) + 1 {
            self.pc = next as u16;
        } else if self.overflow_retries >= MAX_OVERFLOW_RETRIES {
            self.halt(ExecutionFault::PcOverflow);
        } else {
            self.overflow_retries += 1;
            self.pc = if step == 4 { LAST_SLOT } else { PROGRAM_ADDR };
        }
    }

    /// direct jumps halt on a target no opcode fits at; no retry here
    fn jump(&mut self, target: u16) -> Flow {
        if target > LAST_SLOT {
            self.halt(ExecutionFault::InvalidJumpTarget(target));
            Flow::Stay
        } else {
            Flow::Jump(target)
        }
    }

    fn execute(&mut self, instr: Instruction) -> Flow {
        use Instruction::*;

        match instr {
            // machine-code routines and unrecognized words are no-ops
            Sys => Flow::Next,
            Cls => {
                self.frame.clear();
                Flow::Next
            }
            Ret => {
                if self.sp == 0 {
                    self.halt(ExecutionFault::StackUnderflow);
                    Flow::Stay
                } else {
                    self.sp -= 1;
                    self.pc = self.stack[usize::from(self.sp)];
                    Flow::Next
                }
            }
            Jp(addr) => self.jump(addr),
            Call(addr) => {
                if usize::from(self.sp) >= STACK_DEPTH {
                    self.halt(ExecutionFault::StackOverflow);
                    Flow::Stay
                } else {
                    self.stack[usize::from(self.sp)] = self.pc;
                    self.sp += 1;
                    self.jump(addr)
                }
            }
            SeByte(x, nn) => skip_if(self.reg(x) == nn),
            SneByte(x, nn) => skip_if(self.reg(x) != nn),
            SeReg(x, y) => skip_if(self.reg(x) == self.reg(y)),
            SneReg(x, y) => skip_if(self.reg(x) != self.reg(y)),
            LdByte(x, nn) => {
                self.v[usize::from(x)] = nn;
                Flow::Next
            }
            // byte add never touches the flag register
            AddByte(x, nn) => {
                self.v[usize::from(x)] = self.reg(x).wrapping_add(nn);
                Flow::Next
            }
            LdReg(x, y) => {
                self.v[usize::from(x)] = self.reg(y);
                Flow::Next
            }
            Or(x, y) => {
                self.v[usize::from(x)] |= self.reg(y);
                Flow::Next
            }
            And(x, y) => {
                self.v[usize::from(x)] &= self.reg(y);
                Flow::Next
            }
            Xor(x, y) => {
                self.v[usize::from(x)] ^= self.reg(y);
                Flow::Next
            }
            AddReg(x, y) => {
                let sum = u16::from(self.reg(x)) + u16::from(self.reg(y));
                self.v[usize::from(x)] = sum as u8;
                self.v[0xF] = u8::from(sum > 0xFF);
                Flow::Next
            }
            // flags are computed before the wrapped result lands, so
            // Vx == VF still behaves
            Sub(x, y) => {
                let no_borrow = u8::from(self.reg(x) > self.reg(y));
                self.v[usize::from(x)] = self.reg(x).wrapping_sub(self.reg(y));
                self.v[0xF] = no_borrow;
                Flow::Next
            }
            Shr(x) => {
                let lsb = self.reg(x) & 0x1;
                self.v[usize::from(x)] >>= 1;
                self.v[0xF] = lsb;
                Flow::Next
            }
            Subn(x, y) => {
                let no_borrow = u8::from(self.reg(y) > self.reg(x));
                self.v[usize::from(x)] = self.reg(y).wrapping_sub(self.reg(x));
                self.v[0xF] = no_borrow;
                Flow::Next
            }
            Shl(x) => {
                let msb = self.reg(x) >> 7;
                self.v[usize::from(x)] <<= 1;
                self.v[0xF] = msb;
                Flow::Next
            }
            LdI(addr) => {
                self.i = addr;
                Flow::Next
            }
            JpV0(addr) => self.jump(addr + u16::from(self.v[0x0])),
            Rnd(x, nn) => {
                self.v[usize::from(x)] = rand::thread_rng().gen::<u8>() & nn;
                Flow::Next
            }
            Drw(x, y, n) => {
                self.draw_sprite(x, y, n);
                Flow::Next
            }
            Skp(x) => skip_if(self.keypad.is_held(self.reg(x))),
            Sknp(x) => skip_if(!self.keypad.is_held(self.reg(x))),
            LdRegDt(x) => {
                self.v[usize::from(x)] = self.timers.delay();
                Flow::Next
            }
            LdKey(x) => match self.keypad.take_pending() {
                Some(key) => {
                    self.v[usize::from(x)] = key;
                    Flow::Next
                }
                None => {
                    self.mode = Mode::AwaitingKey(x);
                    Flow::Stay
                }
            },
            LdDtReg(x) => {
                self.timers.set_delay(self.reg(x));
                Flow::Next
            }
            LdStReg(x) => {
                self.timers.set_sound(self.reg(x));
                Flow::Next
            }
            // 16-bit add, no overflow flag
            AddI(x) => {
                self.i = self.i.wrapping_add(u16::from(self.reg(x)));
                Flow::Next
            }
            LdFont(x) => {
                self.i = FONT_ADDR + 5 * u16::from(self.reg(x) & 0x0F);
                Flow::Next
            }
            // all-or-nothing: no digit is written unless all three fit
            LdBcd(x) => {
                if usize::from(self.i) + 2 < MEMORY_SIZE {
                    let value = self.reg(x);
                    self.memory.write(self.i, value / 100);
                    self.memory.write(self.i + 1, value / 10 % 10);
                    self.memory.write(self.i + 2, value % 10);
                }
                Flow::Next
            }
            Store(x) => {
                for r in 0..=x {
                    self.memory
                        .write(self.i.wrapping_add(u16::from(r)), self.reg(r));
                }
                Flow::Next
            }
            Load(x) => {
                for r in 0..=x {
                    let addr = self.i.wrapping_add(u16::from(r));
                    if usize::from(addr) < MEMORY_SIZE {
                        self.v[usize::from(r)] = self.memory.read(addr);
                    }
                }
                Flow::Next
            }
        }
    }

    fn reg(&self, x: u8) -> u8 {
        self.v[usize::from(x)]
    }

    /// XOR-blit n sprite rows from I at (Vx, Vy), wrapping both axes.
    /// VF reports whether any lit pixel was erased.
    fn draw_sprite(&mut self, x: u8, y: u8, n: u8) {
        let x0 = usize::from(self.reg(x));
        let y0 = usize::from(self.reg(y));
        self.v[0xF] = 0;
        self.frame.mark_dirty();
        for row in 0..usize::from(n) {
            let bits = self.memory.read(self.i.wrapping_add(row as u16));
            for col in 0..8 {
                if bits & (0x80 >> col) != 0 && self.frame.xor_pixel(x0 + col, y0 + row) {
                    self.v[0xF] = 1;
                }
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypad::KEY_COUNT;

    fn vm_with(rom: &[u8]) -> Interpreter {
        let mut vm = Interpreter::new();
        vm.load_program(rom).unwrap();
        vm
    }

    fn press(vm: &mut Interpreter, key: usize) {
        let mut held = [false; KEY_COUNT];
        held[key] = true;
        vm.keypad.set_held(&held);
    }

    fn release_all(vm: &mut Interpreter) {
        vm.keypad.set_held(&[false; KEY_COUNT]);
    }

    #[test]
    fn test_00e0_cls() {
        let mut vm = vm_with(&[0x00, 0xE0]);
        vm.frame.xor_pixel(5, 5);
        vm.frame.take_dirty();
        vm.cycle();
        assert!(vm.frame.is_dirty());
        assert_eq!(vm.frame.pixel(5, 5), 0);
        assert_eq!(vm.pc, 0x202);
    }

    #[test]
    fn test_00ee_ret() {
        let mut vm = vm_with(&[0x00, 0xEE]);
        vm.stack[0] = 0x400;
        vm.sp = 1;
        vm.cycle();
        assert_eq!(vm.sp, 0);
        // return lands just past the call site
        assert_eq!(vm.pc, 0x402);
    }

    #[test]
    fn test_00ee_underflow_halts() {
        let mut vm = vm_with(&[0x00, 0xEE]);
        vm.cycle();
        assert_eq!(vm.fault(), Some(ExecutionFault::StackUnderflow));
    }

    #[test]
    fn test_1nnn_jp() {
        let mut vm = vm_with(&[0x1A, 0xBC]);
        vm.cycle();
        assert_eq!(vm.pc, 0xABC);
    }

    #[test]
    fn test_1nnn_jp_bad_target_halts_without_retry() {
        let mut vm = vm_with(&[0x1F, 0xFF]);
        vm.cycle();
        assert_eq!(vm.fault(), Some(ExecutionFault::InvalidJumpTarget(0xFFF)));
        assert_eq!(vm.overflow_retries, 0);
    }

    #[test]
    fn test_2nnn_call() {
        let mut vm = vm_with(&[0x24, 0x00]);
        vm.cycle();
        assert_eq!(vm.sp, 1);
        assert_eq!(vm.stack[0], 0x200);
        assert_eq!(vm.pc, 0x400);
    }

    #[test]
    fn test_2nnn_call_overflow_halts_and_freezes() {
        let mut vm = vm_with(&[0x24, 0x00]);
        vm.sp = 16;
        vm.v[0x3] = 0x77;
        vm.cycle();
        assert_eq!(vm.fault(), Some(ExecutionFault::StackOverflow));
        // halted VM mutates nothing further
        let pc = vm.pc;
        vm.cycle();
        vm.cycle();
        assert_eq!(vm.pc, pc);
        assert_eq!(vm.sp, 16);
        assert_eq!(vm.v[0x3], 0x77);
    }

    #[test]
    fn test_3xnn_se() {
        let mut vm = vm_with(&[0x31, 0x11]);
        vm.v[0x1] = 0x11;
        vm.cycle();
        assert_eq!(vm.pc, 0x204);

        let mut vm = vm_with(&[0x31, 0x11]);
        vm.cycle();
        assert_eq!(vm.pc, 0x202);
    }

    #[test]
    fn test_4xnn_sne() {
        let mut vm = vm_with(&[0x41, 0x11]);
        vm.cycle();
        assert_eq!(vm.pc, 0x204);
    }

    #[test]
    fn test_5xy0_9xy0_register_compare() {
        let mut vm = vm_with(&[0x51, 0x20]);
        vm.v[0x1] = 0x42;
        vm.v[0x2] = 0x42;
        vm.cycle();
        assert_eq!(vm.pc, 0x204);

        let mut vm = vm_with(&[0x91, 0x20]);
        vm.v[0x1] = 0x42;
        vm.cycle();
        assert_eq!(vm.pc, 0x204);
    }

    #[test]
    fn test_6xnn_ld() {
        let mut vm = vm_with(&[0x6A, 0x14]);
        vm.cycle();
        assert_eq!(vm.v[0xA], 0x14);
        assert_eq!(vm.pc, 0x202);
    }

    #[test]
    fn test_7xnn_add_wraps_without_flag() {
        let mut vm = vm_with(&[0x7A, 0xFF]);
        vm.v[0xA] = 0x01;
        vm.v[0xF] = 0xAB;
        vm.cycle();
        assert_eq!(vm.v[0xA], 0x00);
        assert_eq!(vm.v[0xF], 0xAB);
    }

    #[test]
    fn test_8xy0_to_8xy3_bitwise() {
        let mut vm = vm_with(&[0x81, 0x20, 0x83, 0x41, 0x85, 0x62, 0x87, 0x83]);
        vm.v[0x2] = 0x0F;
        vm.v[0x3] = 0x60;
        vm.v[0x4] = 0x06;
        vm.v[0x5] = 0x6A;
        vm.v[0x6] = 0x2F;
        vm.v[0x7] = 0x55;
        vm.v[0x8] = 0xFF;
        vm.cycle();
        assert_eq!(vm.v[0x1], 0x0F);
        vm.cycle();
        assert_eq!(vm.v[0x3], 0x66);
        vm.cycle();
        assert_eq!(vm.v[0x5], 0x2A);
        vm.cycle();
        assert_eq!(vm.v[0x7], 0xAA);
    }

    #[test]
    fn test_8xy4_add_carry() {
        let mut vm = vm_with(&[0x81, 0x24]);
        vm.v[0x1] = 0xFF;
        vm.v[0x2] = 0x01;
        vm.cycle();
        assert_eq!(vm.v[0x1], 0x00);
        assert_eq!(vm.v[0xF], 1);

        let mut vm = vm_with(&[0x81, 0x24]);
        vm.v[0x1] = 0x01;
        vm.v[0x2] = 0x01;
        vm.cycle();
        assert_eq!(vm.v[0x1], 0x02);
        assert_eq!(vm.v[0xF], 0);
    }

    #[test]
    fn test_8xy5_sub_borrow() {
        let mut vm = vm_with(&[0x81, 0x25]);
        vm.v[0x1] = 0x03;
        vm.v[0x2] = 0x05;
        vm.cycle();
        assert_eq!(vm.v[0x1], 0xFE);
        assert_eq!(vm.v[0xF], 0);

        let mut vm = vm_with(&[0x81, 0x25]);
        vm.v[0x1] = 0x05;
        vm.v[0x2] = 0x03;
        vm.cycle();
        assert_eq!(vm.v[0x1], 0x02);
        assert_eq!(vm.v[0xF], 1);
    }

    #[test]
    fn test_8xy6_shr() {
        let mut vm = vm_with(&[0x81, 0x06]);
        vm.v[0x1] = 0x05;
        vm.cycle();
        assert_eq!(vm.v[0x1], 0x02);
        assert_eq!(vm.v[0xF], 1);
    }

    #[test]
    fn test_8xy7_subn() {
        let mut vm = vm_with(&[0x81, 0x27]);
        vm.v[0x1] = 0x11;
        vm.v[0x2] = 0x33;
        vm.cycle();
        assert_eq!(vm.v[0x1], 0x22);
        assert_eq!(vm.v[0xF], 1);
    }

    #[test]
    fn test_8xye_shl() {
        let mut vm = vm_with(&[0x81, 0x0E]);
        vm.v[0x1] = 0xFF;
        vm.cycle();
        assert_eq!(vm.v[0x1], 0xFE);
        assert_eq!(vm.v[0xF], 1);
    }

    #[test]
    fn test_annn_ld_i() {
        let mut vm = vm_with(&[0xA5, 0x68]);
        vm.cycle();
        assert_eq!(vm.i, 0x568);
    }

    #[test]
    fn test_bnnn_jp_v0() {
        let mut vm = vm_with(&[0xB3, 0x00]);
        vm.v[0x0] = 0x02;
        vm.cycle();
        assert_eq!(vm.pc, 0x302);
    }

    #[test]
    fn test_bnnn_bad_target_halts() {
        let mut vm = vm_with(&[0xBF, 0xFE]);
        vm.v[0x0] = 0x01;
        vm.cycle();
        assert_eq!(vm.fault(), Some(ExecutionFault::InvalidJumpTarget(0xFFF)));
    }

    #[test]
    fn test_cxnn_rnd_masks() {
        // nn=0 masks every random byte down to zero
        let mut vm = vm_with(&[0xC1, 0x00]);
        vm.v[0x1] = 0xFF;
        vm.cycle();
        assert_eq!(vm.v[0x1], 0x00);
        assert_eq!(vm.pc, 0x202);
    }

    #[test]
    fn test_dxyn_draws_glyph() {
        // draw the font glyph for 0 at (1, 1)
        let mut vm = vm_with(&[0xD0, 0x15]);
        vm.v[0x0] = 1;
        vm.v[0x1] = 1;
        vm.i = FONT_ADDR;
        vm.cycle();
        // top row of the glyph is 0xF0
        for col in 0..4 {
            assert_eq!(vm.frame.pixel(1 + col, 1), 1);
        }
        assert_eq!(vm.frame.pixel(5, 1), 0);
        assert_eq!(vm.v[0xF], 0);
        assert!(vm.frame.is_dirty());
    }

    #[test]
    fn test_dxyn_wraps_and_erases() {
        // 8x1 solid sprite at the bottom-right corner wraps both axes
        let mut vm = vm_with(&[0xD0, 0x11, 0xD0, 0x11]);
        vm.memory.write(0x300, 0xFF);
        vm.i = 0x300;
        vm.v[0x0] = 63;
        vm.v[0x1] = 31;
        vm.cycle();
        assert_eq!(vm.frame.pixel(63, 31), 1);
        assert_eq!(vm.frame.pixel(0, 31), 1);
        assert_eq!(vm.frame.pixel(6, 31), 1);
        assert_eq!(vm.v[0xF], 0);

        // the second identical draw erases everything and reports collision
        vm.cycle();
        assert_eq!(vm.v[0xF], 1);
        assert!(vm
            .frame
            .cells()
            .iter()
            .all(|row| row.iter().all(|c| *c == 0)));
    }

    #[test]
    fn test_ex9e_exa1_level_triggered() {
        let mut vm = vm_with(&[0xE1, 0x9E]);
        vm.v[0x1] = 0x5;
        press(&mut vm, 5);
        vm.cycle();
        assert_eq!(vm.pc, 0x204);

        let mut vm = vm_with(&[0xE1, 0xA1]);
        vm.v[0x1] = 0x5;
        vm.cycle();
        assert_eq!(vm.pc, 0x204);
    }

    #[test]
    fn test_fx07_fx15_fx18_timers() {
        let mut vm = vm_with(&[0xF1, 0x15, 0xF2, 0x07, 0xF3, 0x18]);
        vm.v[0x1] = 0x20;
        vm.v[0x3] = 0x30;
        vm.cycle();
        assert_eq!(vm.timers.delay(), 0x20);
        vm.cycle();
        assert_eq!(vm.v[0x2], 0x20);
        vm.cycle();
        assert_eq!(vm.timers.sound(), 0x30);
    }

    #[test]
    fn test_fx0a_waits_for_fresh_edge() {
        let mut vm = vm_with(&[0xF1, 0x0A]);
        // no key: pc parks on the wait instruction
        vm.cycle();
        vm.cycle();
        vm.cycle();
        assert_eq!(vm.pc, 0x200);

        // the press edge satisfies the wait
        press(&mut vm, 5);
        vm.cycle();
        assert_eq!(vm.v[0x1], 0x5);
        assert_eq!(vm.pc, 0x202);

        // the same press can't satisfy a second wait while still held
        vm.pc = 0x200;
        vm.mode = Mode::Running;
        press(&mut vm, 5);
        vm.cycle();
        vm.cycle();
        assert_eq!(vm.pc, 0x200);

        // release and re-press re-arms it
        release_all(&mut vm);
        press(&mut vm, 5);
        vm.cycle();
        assert_eq!(vm.pc, 0x202);
    }

    #[test]
    fn test_fx0a_consumes_key_already_pending() {
        let mut vm = vm_with(&[0xF1, 0x0A]);
        press(&mut vm, 0xB);
        vm.cycle();
        assert_eq!(vm.v[0x1], 0xB);
        assert_eq!(vm.pc, 0x202);
        assert_eq!(vm.mode, Mode::Running);
    }

    #[test]
    fn test_fx1e_add_i_wraps() {
        let mut vm = vm_with(&[0xF1, 0x1E]);
        vm.i = 0xFFFF;
        vm.v[0x1] = 0x02;
        vm.cycle();
        assert_eq!(vm.i, 0x0001);
        assert_eq!(vm.v[0xF], 0);
    }

    #[test]
    fn test_fx29_font_address() {
        let mut vm = vm_with(&[0xF1, 0x29]);
        vm.v[0x1] = 0x1A; // only the low nibble picks the glyph
        vm.cycle();
        assert_eq!(vm.i, FONT_ADDR + 5 * 0xA);
    }

    #[test]
    fn test_fx33_bcd() {
        let mut vm = vm_with(&[0xF1, 0x33]);
        vm.v[0x1] = 123;
        vm.i = 0x300;
        vm.cycle();
        assert_eq!(vm.memory.read(0x300), 1);
        assert_eq!(vm.memory.read(0x301), 2);
        assert_eq!(vm.memory.read(0x302), 3);
    }

    #[test]
    fn test_fx33_bcd_out_of_bounds_writes_nothing() {
        let mut vm = vm_with(&[0xF1, 0x33]);
        vm.v[0x1] = 123;
        vm.i = 0xFFE;
        vm.cycle();
        assert_eq!(vm.memory.read(0xFFE), 0);
        assert_eq!(vm.memory.read(0xFFF), 0);
        assert!(!vm.is_halted());
        assert_eq!(vm.pc, 0x202);
    }

    #[test]
    fn test_fx55_fx65_inclusive() {
        let mut vm = vm_with(&[0xF2, 0x55, 0xA4, 0x00, 0xF2, 0x65]);
        vm.v[0x0] = 0x11;
        vm.v[0x1] = 0x22;
        vm.v[0x2] = 0x33;
        vm.i = 0x300;
        vm.cycle();
        assert_eq!(vm.memory.read(0x300), 0x11);
        assert_eq!(vm.memory.read(0x301), 0x22);
        assert_eq!(vm.memory.read(0x302), 0x33);
        assert_eq!(vm.memory.read(0x303), 0x00);

        vm.cycle(); // point I somewhere blank
        vm.cycle();
        assert_eq!(vm.v[0x0], 0);
        assert_eq!(vm.v[0x1], 0);
        assert_eq!(vm.v[0x2], 0);
    }

    #[test]
    fn test_0nnn_sys_is_noop() {
        let mut vm = vm_with(&[0x01, 0x23]);
        vm.cycle();
        assert_eq!(vm.pc, 0x202);
        assert!(!vm.is_halted());
    }

    #[test]
    fn test_pc_overflow_retries_then_halts() {
        // LD at 0xFFE overshoots on advance; JP at 0x200 bounces back
        let mut vm = vm_with(&[0x1F, 0xFE]);
        vm.memory.write(0xFFE, 0x60);
        vm.memory.write(0xFFF, 0x00);
        vm.pc = 0xFFE;

        for retry in 1..=4 {
            vm.cycle(); // LD overshoots
            assert_eq!(vm.pc, 0x200, "retry {} resets pc", retry);
            assert_eq!(vm.overflow_retries, retry);
            assert!(!vm.is_halted());
            vm.cycle(); // JP back to 0xFFE
            assert_eq!(vm.pc, 0xFFE);
        }

        // the fifth overshoot is fatal
        vm.cycle();
        assert_eq!(vm.fault(), Some(ExecutionFault::PcOverflow));
    }

    #[test]
    fn test_skip_overflow_resets_to_last_slot() {
        // SE that hits skips from 0xFFC past the end
        let mut vm = vm_with(&[0x00, 0xE0]);
        vm.memory.write(0xFFC, 0x30);
        vm.memory.write(0xFFD, 0x00);
        vm.pc = 0xFFC;
        vm.cycle();
        assert_eq!(vm.pc, 0xFFE);
        assert_eq!(vm.overflow_retries, 1);
    }
}
