/// number of logical keys on the hex pad
pub const KEY_COUNT: usize = 16;

/// Tracker for the 16-key hex pad. The host merges the currently-pressed set
/// once per frame; `SKP`/`SKNP` consult the level (`held`) directly, while
/// the wait-for-key instruction consumes edges: a press arms `pending`, a
/// consumption marks it `handled`, and only a release followed by a fresh
/// press re-arms it.
pub struct Keypad {
    held: [bool; KEY_COUNT],
    pending: [bool; KEY_COUNT],
    handled: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Keypad {
            held: [false; KEY_COUNT],
            pending: [false; KEY_COUNT],
            handled: [false; KEY_COUNT],
        }
    }

    /// merge the host's currently-pressed set; 0->1 transitions arm the
    /// pending edge and clear the handled mark, releases disarm it
    pub fn set_held(&mut self, held: &[bool; KEY_COUNT]) {
        for i in 0..KEY_COUNT {
            if held[i] && !self.held[i] {
                self.pending[i] = true;
                self.handled[i] = false;
            } else if !held[i] && self.held[i] {
                self.pending[i] = false;
            }
            self.held[i] = held[i];
        }
    }

    /// level query for the skip instructions
    pub fn is_held(&self, key: u8) -> bool {
        self.held[(key & 0x0F) as usize]
    }

    /// lowest pending unconsumed key, marking it consumed
    pub fn take_pending(&mut self) -> Option<u8> {
        for i in 0..KEY_COUNT {
            if self.pending[i] && !self.handled[i] {
                self.handled[i] = true;
                return Some(i as u8);
            }
        }
        None
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}
