use std::error::Error;
use std::time::{Duration, Instant};

use log::{info, warn};
use simple_logger::SimpleLogger;

use crisp8::display::{MonoTermDisplay, Screen};
use crisp8::input::{Input, TermInput};
use crisp8::interpreter::Interpreter;
use crisp8::rom;

/// interpreter cycles per video frame unless overridden on the CLI
const DEFAULT_CYCLES_PER_FRAME: u32 = 64;

/// 60Hz cadence for timers and rendering
const TICK_INTERVAL: Duration = Duration::from_micros(16_667);

fn main() -> Result<(), Box<dyn Error>> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .init()?;

    let mut args = std::env::args().skip(1);
    let rom_path = args
        .next()
        .ok_or("usage: crisp8 <rom> [cycles-per-frame]")?;
    let cycles_per_frame = match args.next() {
        Some(n) => n
            .parse::<u32>()
            .map_err(|_| "cycles-per-frame must be a number")?,
        None => DEFAULT_CYCLES_PER_FRAME,
    };

    let rom = rom::read_rom(&rom_path)?;
    let mut vm = Interpreter::new();
    vm.load_program(&rom)?;

    let mut input = TermInput::new()?;
    let mut display = MonoTermDisplay::new()?;

    info!("running {} at {} cycles per frame", rom_path, cycles_per_frame);

    let mut last_tick = Instant::now();
    loop {
        let frame_start = Instant::now();

        for _ in 0..cycles_per_frame {
            vm.cycle();
        }
        if vm.is_halted() {
            warn!("program halted: {:?}", vm.fault());
            break;
        }

        vm.keypad.set_held(&input.held_keys()?);
        if input.quit_requested() {
            break;
        }

        // one tick per elapsed 60Hz interval, however many cycles ran
        while last_tick.elapsed() >= TICK_INTERVAL {
            vm.timers.tick();
            last_tick += TICK_INTERVAL;
        }

        if vm.frame.take_dirty() {
            display.draw(&vm.frame)?;
        }

        let spent = frame_start.elapsed();
        if spent < TICK_INTERVAL {
            spin_sleep::sleep(TICK_INTERVAL - spent);
        }
    }

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..12 {
        println!();
    }
    Ok(())
}
