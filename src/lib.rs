//! A chip-8 virtual machine with a terminal front end.
//!
//! ## Design
//!
//! * the interpreter core is pure state: memory, registers, stack, timers,
//!   keypad, framebuffer. `Interpreter::cycle()` runs exactly one
//!   fetch/decode/execute step and never blocks
//! * decode is split from execute: a fetched word becomes a tagged
//!   `Instruction`, executed by exhaustive match, so each half tests alone
//! * the host loop owns the cadence: a burst of cycles per video frame,
//!   a timer tick per 60Hz interval of wall clock, a key poll, a render
//!   when the framebuffer says it's dirty
//! * display and input sit behind traits so the terminal plumbing (tui +
//!   crossterm) can be swapped for dummies in tests
//! * malformed programs can't wedge the process: bad jumps and stack
//!   misuse halt the VM, and a runaway pc gets a bounded number of resets
//!   before halting too

pub mod display;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod keypad;
pub mod memory;
pub mod rom;
pub mod timer;
