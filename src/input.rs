use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;

use crate::keypad::KEY_COUNT;

/// canonical chip-8 layout on the left-hand side of a qwerty keyboard:
/// 1234/qwer/asdf/zxcv map onto the 4x4 hex pad
const KEYMAP: [(char, u8); 16] = [
    ('1', 0x1),
    ('2', 0x2),
    ('3', 0x3),
    ('4', 0xC),
    ('q', 0x4),
    ('w', 0x5),
    ('e', 0x6),
    ('r', 0xD),
    ('a', 0x7),
    ('s', 0x8),
    ('d', 0x9),
    ('f', 0xE),
    ('z', 0xA),
    ('x', 0x0),
    ('c', 0xB),
    ('v', 0xF),
];

/// how long a key counts as held after its last press event. terminals only
/// report presses (with autorepeat), so release is inferred by decay.
const KEY_DECAY: Duration = Duration::from_millis(150);

/// reads keypresses for the host loop
pub trait Input {
    /// the set of logical keys currently considered held
    fn held_keys(&mut self) -> Result<[bool; KEY_COUNT], io::Error>;

    /// whether the user asked to leave the emulator
    fn quit_requested(&self) -> bool;
}

/// simple implementation of Input on the raw-mode terminal via crossterm
pub struct TermInput {
    last_seen: [Option<Instant>; KEY_COUNT],
    quit: bool,
}

impl TermInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            last_seen: [None; KEY_COUNT],
            quit: false,
        })
    }

    fn map_key(key: char) -> Option<u8> {
        KEYMAP.iter().find(|(c, _)| *c == key).map(|(_, k)| *k)
    }

    fn drain_events(&mut self) -> Result<(), io::Error> {
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                match evt.code {
                    KeyCode::Char(key) => {
                        if let Some(mapped) = Self::map_key(key) {
                            self.last_seen[usize::from(mapped)] = Some(Instant::now());
                        }
                    }
                    KeyCode::Esc => self.quit = true,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn decay(&self, now: Instant) -> [bool; KEY_COUNT] {
        let mut held = [false; KEY_COUNT];
        for (i, seen) in self.last_seen.iter().enumerate() {
            held[i] = matches!(seen, Some(t) if now.duration_since(*t) < KEY_DECAY);
        }
        held
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TermInput {
    fn held_keys(&mut self) -> Result<[bool; KEY_COUNT], io::Error> {
        self.drain_events()?;
        Ok(self.decay(Instant::now()))
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

/// dummy Input implementation for testing; plays back scripted frames
pub struct DummyInput {
    frames: Vec<[bool; KEY_COUNT]>,
}

impl DummyInput {
    #[allow(dead_code)]
    pub fn new(mut frames: Vec<[bool; KEY_COUNT]>) -> Self {
        frames.reverse();
        DummyInput { frames }
    }
}

impl Input for DummyInput {
    fn held_keys(&mut self) -> Result<[bool; KEY_COUNT], io::Error> {
        Ok(self.frames.pop().unwrap_or([false; KEY_COUNT]))
    }

    fn quit_requested(&self) -> bool {
        false
    }
}
