//! TerminalOverlay: the display session, overlay element, and present path.
//!
//! Maps the display-subsystem boundary onto a terminal: session open/close
//! is raw mode plus the alternate screen, binding the overlay element is
//! the first full draw of the fallback slot, and presenting a slot
//! diff-draws its pixel buffer as shaded character cells (one cell per
//! four pixels). Drawing starts with full redraws on bind and degrades to
//! changed-run updates afterwards, so the per-tick present cost stays
//! bounded.
//!
//! Every terminal failure maps to the fatal [`DisplayError`] tier; there
//! is no retry.

use std::io::{self, Write};

use crossterm::{cursor, style::Print, terminal, QueueableCommand};

use vbitx_core::{Canvas, DisplayError, DisplayLink, Rect};
use vbitx_types::{Slot, FRAME_HEIGHT, FRAME_WIDTH, LEVEL_HIGH, ROW_PITCH};

use crate::resources::SlotResources;

/// Pixels per terminal cell column
pub const PX_PER_CELL: usize = 4;

/// Terminal columns needed for one frame row
pub const CELL_COLS: usize = (FRAME_WIDTH + PX_PER_CELL - 1) / PX_PER_CELL;

/// Shade ramp indexed by lit pixels per cell (0..=4)
const SHADES: [char; 5] = [' ', '\u{2591}', '\u{2592}', '\u{2593}', '\u{2588}'];

pub struct TerminalOverlay {
    stdout: io::Stdout,
    resources: SlotResources,
    /// Last drawn cells, row-major `CELL_COLS x FRAME_HEIGHT`
    cells: Vec<char>,
    bound: bool,
    presents: u64,
    /// Raw mode + alternate screen are live; cleared by the restore in
    /// `close()` so drop does not run it twice.
    session_active: bool,
}

impl TerminalOverlay {
    /// Open the display session and create the three slot resources,
    /// each initialized with the startup canvas.
    pub fn open(canvas: &Canvas) -> Result<Self, DisplayError> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode().map_err(DisplayError::SessionOpen)?;
        let entered = stdout
            .queue(terminal::EnterAlternateScreen)
            .and_then(|s| s.queue(cursor::Hide))
            .and_then(|s| s.queue(terminal::DisableLineWrap))
            .and_then(|s| s.flush());
        if let Err(source) = entered {
            let _ = terminal::disable_raw_mode();
            return Err(DisplayError::SessionOpen(source));
        }

        Ok(Self {
            stdout,
            resources: SlotResources::create(canvas),
            cells: vec![' '; CELL_COLS * FRAME_HEIGHT],
            bound: false,
            presents: 0,
            session_active: true,
        })
    }

    /// Bind the overlay element: a full draw of the fallback slot, so a
    /// coherent frame is on screen before the first tick.
    pub fn bind(&mut self) -> Result<(), DisplayError> {
        self.full_draw(Slot::Fallback)
            .map_err(DisplayError::ElementBind)?;
        self.bound = true;
        Ok(())
    }

    /// Presents executed so far
    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Unbind the element, release the resources as a set, and close the
    /// session, in that order.
    pub fn close(mut self) -> Result<(), DisplayError> {
        let unbound = self
            .stdout
            .queue(terminal::Clear(terminal::ClearType::All))
            .and_then(|s| s.flush());
        unbound.map_err(DisplayError::ElementUnbind)?;
        self.bound = false;

        self.resources.release_all()?;

        self.session_active = false;
        self.restore_terminal().map_err(DisplayError::SessionClose)
    }

    fn restore_terminal(&mut self) -> io::Result<()> {
        self.stdout
            .queue(terminal::EnableLineWrap)
            .and_then(|s| s.queue(cursor::Show))
            .and_then(|s| s.queue(terminal::LeaveAlternateScreen))
            .and_then(|s| s.flush())
            .and_then(|_| terminal::disable_raw_mode())
    }

    fn full_draw(&mut self, slot: Slot) -> io::Result<()> {
        let next = cells_of(self.resources.bytes(slot));
        self.stdout.queue(terminal::Clear(terminal::ClearType::All))?;
        for row in 0..FRAME_HEIGHT {
            self.stdout.queue(cursor::MoveTo(0, row as u16))?;
            let line: String = next[row * CELL_COLS..(row + 1) * CELL_COLS].iter().collect();
            self.stdout.queue(Print(line))?;
        }
        self.stdout.flush()?;
        self.cells = next;
        Ok(())
    }

    fn diff_draw(&mut self, slot: Slot) -> io::Result<()> {
        let next = cells_of(self.resources.bytes(slot));
        for row in 0..FRAME_HEIGHT {
            let prev_row = &self.cells[row * CELL_COLS..(row + 1) * CELL_COLS];
            let next_row = &next[row * CELL_COLS..(row + 1) * CELL_COLS];
            let mut col = 0;
            while col < CELL_COLS {
                if prev_row[col] == next_row[col] {
                    col += 1;
                    continue;
                }
                // Coalesce the changed run into one cursor move.
                let start = col;
                while col < CELL_COLS && prev_row[col] != next_row[col] {
                    col += 1;
                }
                self.stdout.queue(cursor::MoveTo(start as u16, row as u16))?;
                let run: String = next_row[start..col].iter().collect();
                self.stdout.queue(Print(run))?;
            }
        }
        self.stdout.flush()?;
        self.cells = next;
        Ok(())
    }
}

impl Drop for TerminalOverlay {
    /// Restore the terminal if the session is still live, so an error
    /// bailing out of the run loop does not strand the user in raw mode
    /// on the alternate screen. Best effort only; `close()` is the path
    /// that reports restore failures.
    fn drop(&mut self) {
        if self.session_active {
            let _ = self.restore_terminal();
        }
    }
}

impl DisplayLink for TerminalOverlay {
    fn present(&mut self, slot: Slot) -> Result<(), DisplayError> {
        let result = if self.bound && self.presents > 0 {
            self.diff_draw(slot)
        } else {
            self.full_draw(slot)
        };
        self.presents += 1;
        result.map_err(|source| DisplayError::Present { slot, source })
    }

    fn write_slot(&mut self, slot: Slot, canvas: &Canvas, rect: Rect) -> Result<(), DisplayError> {
        self.resources.write(slot, canvas, rect)
    }
}

/// Fold a slot's pixel bytes into shade cells, `PX_PER_CELL` pixels each.
fn cells_of(bytes: &[u8]) -> Vec<char> {
    let mut cells = Vec::with_capacity(CELL_COLS * FRAME_HEIGHT);
    for row in 0..FRAME_HEIGHT {
        for cell in 0..CELL_COLS {
            let start = cell * PX_PER_CELL;
            let width = PX_PER_CELL.min(FRAME_WIDTH - start);
            let lit = bytes[row * ROW_PITCH + start..row * ROW_PITCH + start + width]
                .iter()
                .filter(|&&px| px >= LEVEL_HIGH)
                .count();
            // Scale partial cells onto the full shade ramp.
            let shade = lit * (SHADES.len() - 1) / width;
            cells.push(SHADES[shade]);
        }
    }
    cells
}
