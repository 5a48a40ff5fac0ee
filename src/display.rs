use std::io;

use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// framebuffer width in pixels
pub const WIDTH: usize = 64;

/// framebuffer height in pixels
pub const HEIGHT: usize = 32;

/// The 64x32 one-bit framebuffer, indexed [y][x]. Carries a single dirty
/// flag, not a change list: the flag is set by clear and blit, and the host
/// consumes it after rendering the whole grid.
pub struct FrameBuffer {
    cells: [[u8; WIDTH]; HEIGHT],
    dirty: bool,
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            cells: [[0; WIDTH]; HEIGHT],
            dirty: false,
        }
    }

    /// zero every cell (the CLS opcode)
    pub fn clear(&mut self) {
        self.cells = [[0; WIDTH]; HEIGHT];
        self.dirty = true;
    }

    /// XOR one pixel; returns true if the destination was already lit
    /// (sprite collision). Coordinates wrap, they don't clip.
    pub fn xor_pixel(&mut self, x: usize, y: usize) -> bool {
        let cell = &mut self.cells[y % HEIGHT][x % WIDTH];
        let collision = *cell == 1;
        *cell ^= 1;
        self.dirty = true;
        collision
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.cells[y][x]
    }

    pub fn cells(&self) -> &[[u8; WIDTH]; HEIGHT] {
        &self.cells
    }

    /// force the dirty flag; a sprite draw counts as a present even when no
    /// bit of it is set
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// read and clear the dirty flag; the host calls this after rendering
    pub fn take_dirty(&mut self) -> bool {
        let was = self.dirty;
        self.dirty = false;
        was
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Screen is used by the host loop to put the framebuffer in front of the
/// user. It abstracts the implementation details, so a variety of kinds of
/// screen would work.
pub trait Screen {
    fn draw(&mut self, frame: &FrameBuffer) -> Result<(), io::Error>;
}

/// monochrome screen in a terminal, rendered using TUI over crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(MonoTermDisplay { terminal })
    }

    fn plane(frame: &FrameBuffer, lit: u8) -> Vec<(f64, f64)> {
        let mut coords = Vec::new();
        for (y, row) in frame.cells().iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if *cell == lit {
                    coords.push((x as f64, -1.0 * y as f64));
                }
            }
        }
        coords
    }
}

impl Screen for MonoTermDisplay {
    fn draw(&mut self, frame: &FrameBuffer) -> Result<(), io::Error> {
        // 1:1 ratio between terminal cells, chip8 pixels and the TUI canvas
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + WIDTH as u16, 2 + HEIGHT as u16);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds([0.0, (WIDTH - 1) as f64])
                .y_bounds([-1.0 * (HEIGHT - 1) as f64, 0.0])
                .marker(Marker::Block)
                .paint(|ctx| {
                    // paint both planes so stale pixels are overwritten
                    ctx.draw(&Points {
                        coords: &Self::plane(frame, 0),
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &Self::plane(frame, 1),
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines
pub struct DummyScreen;

impl DummyScreen {
    #[allow(dead_code)]
    pub fn new() -> Self {
        DummyScreen {}
    }
}

impl Screen for DummyScreen {
    fn draw(&mut self, _frame: &FrameBuffer) -> Result<(), io::Error> {
        Ok(())
    }
}
