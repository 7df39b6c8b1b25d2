//! Canvas module - the working frame buffer
//!
//! The canvas is a `ROW_PITCH x FRAME_HEIGHT` byte image that the fill
//! logic writes into before the result is pushed to a display-visible
//! resource. Uses a flat array with bounds-checked index math; rows are
//! addressed as `row * ROW_PITCH`, with the first `COLUMN_OFFSET` columns
//! reserved for the blanking interval and the next `CLOCK_COLS` columns
//! for the clock run-in, which is written once at startup and never
//! changes afterwards.
//!
//! Owned exclusively by the rotation engine once the run starts; nothing
//! outside the vsync tick mutates it.

use vbitx_types::{
    Field, LineMask, MaskPair, CLOCK_COLS, CLOCK_RUN_IN, COLUMN_OFFSET, DATA_COLUMN, FRAME_HEIGHT,
    FRAME_WIDTH, PAYLOAD_COLS, ROW_PITCH,
};

use crate::engine::LineEncoder;

/// Total canvas size in bytes
const CANVAS_SIZE: usize = ROW_PITCH * FRAME_HEIGHT;

/// A rectangular region of the canvas, in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    /// The whole visible frame; used for the one-time initial resource write
    pub const FULL_FRAME: Rect = Rect {
        x: 0,
        y: 0,
        w: FRAME_WIDTH,
        h: FRAME_HEIGHT,
    };

    /// The payload columns only; blanking and clock run-in never change
    /// after startup, so steady-state resource writes cover just this
    pub const DATA_REGION: Rect = Rect {
        x: DATA_COLUMN,
        y: 0,
        w: PAYLOAD_COLS,
        h: FRAME_HEIGHT,
    };
}

/// The working frame image, zero-filled on creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    /// Flat pixel bytes, row-major order (`row * ROW_PITCH + col`)
    data: Vec<u8>,
}

impl Canvas {
    /// Create a zeroed canvas (all pixels at the low signal level)
    pub fn new() -> Self {
        Self {
            data: vec![0u8; CANVAS_SIZE],
        }
    }

    /// Calculate flat index from (col, row); `None` when out of bounds
    #[inline(always)]
    fn index(col: usize, row: usize) -> Option<usize> {
        if col >= ROW_PITCH || row >= FRAME_HEIGHT {
            return None;
        }
        Some(row * ROW_PITCH + col)
    }

    /// Pixel at (col, row), `None` when out of bounds
    pub fn pixel(&self, col: usize, row: usize) -> Option<u8> {
        Self::index(col, row).map(|i| self.data[i])
    }

    /// Set pixel at (col, row); returns false when out of bounds
    pub fn set_pixel(&mut self, col: usize, row: usize, value: u8) -> bool {
        match Self::index(col, row) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    /// One whole row including blanking and run-in columns
    pub fn row(&self, row: usize) -> Option<&[u8]> {
        if row >= FRAME_HEIGHT {
            return None;
        }
        let start = row * ROW_PITCH;
        Some(&self.data[start..start + ROW_PITCH])
    }

    /// Mutable payload region of one row: the `PAYLOAD_COLS` pixels
    /// starting at `DATA_COLUMN`. This is the destination handed to the
    /// line encoder; it cannot reach the blanking or run-in columns.
    ///
    /// # Panics
    ///
    /// Panics if `row >= FRAME_HEIGHT`. Row indices come from
    /// [`Field::row_of`] on a line slot below `LINES_PER_FIELD`, which is
    /// always in range.
    pub fn data_region_mut(&mut self, row: usize) -> &mut [u8] {
        assert!(row < FRAME_HEIGHT, "row {row} out of range");
        let start = row * ROW_PITCH + DATA_COLUMN;
        &mut self.data[start..start + PAYLOAD_COLS]
    }

    /// Raw bytes of the whole canvas, for resource writes
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy a rectangular region into `dest`, a buffer with the same
    /// pitch/height as the canvas. Used by display backends to refresh a
    /// slot resource from the working image.
    pub fn copy_rect_into(&self, rect: Rect, dest: &mut [u8]) {
        debug_assert_eq!(dest.len(), CANVAS_SIZE);
        for row in rect.y..(rect.y + rect.h).min(FRAME_HEIGHT) {
            let start = row * ROW_PITCH + rect.x;
            let end = (start + rect.w).min(row * ROW_PITCH + ROW_PITCH);
            dest[start..end].copy_from_slice(&self.data[start..end]);
        }
    }

    /// Write the clock run-in into every enabled row of both fields.
    ///
    /// The pattern is `CLOCK_RUN_IN` rendered LSB-first, one bit per
    /// column, into the `CLOCK_COLS` columns following the blanking
    /// offset. Disabled rows are left at the low level to signal "no
    /// transmission" on that line.
    pub fn write_clock_run_in(&mut self, masks: MaskPair) {
        for field in [Field::Even, Field::Odd] {
            let mask = masks.for_field(field);
            for line in mask.enabled_lines() {
                let row = field.row_of(line);
                for bit in 0..CLOCK_COLS {
                    let level = ((CLOCK_RUN_IN >> bit) & 1) as u8;
                    self.set_pixel(COLUMN_OFFSET + bit, row, level);
                }
            }
        }
    }

    /// Fill one field's enabled lines with encoder output.
    ///
    /// For each enabled line slot the encoder writes exactly one line's
    /// payload pixels at that row's data region; masked-out rows are left
    /// untouched. Returns the number of rows written.
    pub fn fill_field(
        &mut self,
        field: Field,
        mask: LineMask,
        encoder: &mut dyn LineEncoder,
    ) -> usize {
        let mut written = 0;
        for line in mask.enabled_lines() {
            let row = field.row_of(line);
            encoder.encode_line(self.data_region_mut(row));
            written += 1;
        }
        written
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}
