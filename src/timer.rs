/// The two 8-bit countdown timers. The host ticks them at 60Hz wall-clock,
/// independent of how many interpreter cycles ran in the same interval.
#[derive(Default)]
pub struct Timers {
    delay: u8,
    sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Timers::default()
    }

    /// one 60Hz tick; decrements each timer if nonzero, never underflows
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    pub fn delay(&self) -> u8 {
        self.delay
    }

    pub fn set_delay(&mut self, value: u8) {
        self.delay = value;
    }

    pub fn set_sound(&mut self, value: u8) {
        self.sound = value;
    }

    #[allow(dead_code)]
    pub fn sound(&self) -> u8 {
        self.sound
    }
}
