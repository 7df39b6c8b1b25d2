//! Shared types module - frame geometry, field/slot enums, and line masks
//!
//! This module defines the fundamental types used throughout the application.
//! All types are pure data structures with no external dependencies, making
//! them usable in any context (rotation engine, encoder, display backend,
//! tests).
//!
//! # Frame Geometry
//!
//! The overlay frame mirrors the vertical-blanking interval of a PAL signal:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `FRAME_WIDTH` | 370 | Visible pixels per row |
//! | `FRAME_HEIGHT` | 32 | Rows (16 lines per interlaced field) |
//! | `ROW_PITCH` | 384 | Bytes per row (`FRAME_WIDTH` aligned up to 32) |
//! | `COLUMN_OFFSET` | 8 | Blanking columns before active video |
//! | `CLOCK_COLS` | 24 | Clock run-in columns after the blanking offset |
//! | `DATA_COLUMN` | 32 | First payload column (`COLUMN_OFFSET + CLOCK_COLS`) |
//! | `PAYLOAD_COLS` | 336 | Payload pixels per line (42 bytes x 8 bits) |
//!
//! Pixels are one byte each with 2-level palette semantics: 0 = low signal
//! level, 1 = high signal level. Palette index 2 is a reserved blank tone
//! used only for initial buffer content.
//!
//! # Timing
//!
//! The display refreshes one field per tick at the PAL field rate:
//!
//! - `FIELD_RATE_HZ`: 50 fields per second
//! - `FIELD_PERIOD_MS`: 20ms tick budget for one fill cycle
//!
//! # Examples
//!
//! ```
//! use vbitx_types::{Field, LineMask, Slot, LINES_PER_FIELD};
//!
//! // Even field lines occupy even rows.
//! assert_eq!(Field::Even.row_of(3), 6);
//! assert_eq!(Field::Odd.row_of(3), 7);
//!
//! // Mask bit set means the line is skipped.
//! let mask = LineMask::parse("0x1").unwrap();
//! assert!(!mask.is_enabled(0));
//! assert!(mask.is_enabled(1));
//!
//! // The two working slots alternate; the fallback maps to itself.
//! assert_eq!(Slot::A.other(), Slot::B);
//! assert_eq!(Slot::B.other(), Slot::A);
//! assert_eq!(LINES_PER_FIELD, 16);
//! ```

/// Visible pixels per row (370 columns)
pub const FRAME_WIDTH: usize = 370;

/// Frame height in rows (32 = 16 lines per field, two fields)
pub const FRAME_HEIGHT: usize = 32;

/// Line slots per interlaced field (16)
pub const LINES_PER_FIELD: usize = FRAME_HEIGHT / 2;

/// Bytes per canvas row: `FRAME_WIDTH` aligned up to a 32-byte boundary
pub const ROW_PITCH: usize = align_up(FRAME_WIDTH, 32);

/// Blanking columns reserved before active video begins (8)
pub const COLUMN_OFFSET: usize = 8;

/// Clock run-in bit pattern, rendered LSB-first one bit per column
pub const CLOCK_RUN_IN: u32 = 0x275555;

/// Columns occupied by the clock run-in (24)
pub const CLOCK_COLS: usize = 24;

/// First payload column within a row
pub const DATA_COLUMN: usize = COLUMN_OFFSET + CLOCK_COLS;

/// Payload bytes per logical line (42)
pub const PACKET_LEN: usize = 42;

/// Payload pixels per line: one pixel per bit (336)
pub const PAYLOAD_COLS: usize = PACKET_LEN * 8;

/// Low signal level palette index
pub const LEVEL_LOW: u8 = 0;

/// High signal level palette index
pub const LEVEL_HIGH: u8 = 1;

/// Reserved blank/fallback tone, used only for initial buffer content
pub const LEVEL_BLANK: u8 = 2;

/// Number of display slot resources (two working + one fallback)
pub const SLOT_COUNT: usize = 3;

/// PAL field rate (fields per second)
pub const FIELD_RATE_HZ: u32 = 50;

/// Tick budget for one fill cycle in milliseconds
pub const FIELD_PERIOD_MS: u64 = 1000 / FIELD_RATE_HZ as u64;

/// Round `x` up to the next multiple of `to` (power of two)
pub const fn align_up(x: usize, to: usize) -> usize {
    (x + to - 1) & !(to - 1)
}

/// One logical line of payload bytes, opaque to the rotation core
pub type Packet = [u8; PACKET_LEN];

/// Framing byte opening every packet on the wire
pub const FRAMING_CODE: u8 = 0xE4;

/// Returns the idle filler packet sent when no payload is pending.
///
/// Keeps enabled lines carrying a decodable signal between real packets.
/// The content beyond the framing byte is opaque to the core.
pub const fn filler_packet() -> Packet {
    let mut p = [0x20u8; PACKET_LEN];
    p[0] = FRAMING_CODE;
    p[1] = 0x15;
    p[2] = 0x15;
    p
}

/// One half of an interlaced frame
///
/// - **Even**: rows 0, 2, 4, ..., 30
/// - **Odd**: rows 1, 3, 5, ..., 31
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Even,
    Odd,
}

impl Field {
    /// Canvas row carrying line slot `line` (0..16) of this field
    ///
    /// # Examples
    ///
    /// ```
    /// use vbitx_types::Field;
    ///
    /// assert_eq!(Field::Even.row_of(0), 0);
    /// assert_eq!(Field::Odd.row_of(0), 1);
    /// assert_eq!(Field::Even.row_of(15), 30);
    /// assert_eq!(Field::Odd.row_of(15), 31);
    /// ```
    pub fn row_of(&self, line: usize) -> usize {
        debug_assert!(line < LINES_PER_FIELD);
        match self {
            Field::Even => line * 2,
            Field::Odd => line * 2 + 1,
        }
    }

    /// Lowercase name for diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Even => "even",
            Field::Odd => "odd",
        }
    }
}

/// The three display slot resources
///
/// `A` and `B` are the working slots the fill logic alternates between.
/// `Fallback` keeps the coherent startup frame all three resources are
/// initialized with and is the slot shown when a fill overruns its tick
/// budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
    Fallback,
}

impl Slot {
    /// Resource index of this slot (A=0, B=1, Fallback=2)
    pub fn index(&self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
            Slot::Fallback => 2,
        }
    }

    /// Inverse of [`Slot::index`]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Slot::A),
            1 => Some(Slot::B),
            2 => Some(Slot::Fallback),
            _ => None,
        }
    }

    /// The other working slot (A <-> B)
    ///
    /// The fallback slot has no partner and maps to itself; the rotation
    /// engine never asks for it because an observed `Fallback` takes the
    /// skip path before any fill target is chosen.
    pub fn other(&self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
            Slot::Fallback => Slot::Fallback,
        }
    }

    /// The interlaced field this working slot carries (A=even, B=odd)
    pub fn field(&self) -> Option<Field> {
        match self {
            Slot::A => Some(Field::Even),
            Slot::B => Some(Field::Odd),
            Slot::Fallback => None,
        }
    }
}

/// Per-field active-line mask: bit i set means line slot i is skipped
///
/// Matches the command-line mask convention: `0` enables all 16 lines,
/// `0xffff` disables the whole field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineMask(pub u16);

impl LineMask {
    /// All 16 line slots enabled
    pub const ALL_ENABLED: LineMask = LineMask(0);

    /// Whether line slot `line` (0..16) receives generated content
    pub fn is_enabled(&self, line: usize) -> bool {
        debug_assert!(line < LINES_PER_FIELD);
        self.0 & (1 << line) == 0
    }

    /// Iterate the enabled line slot indices in ascending order
    pub fn enabled_lines(&self) -> impl Iterator<Item = usize> + '_ {
        let bits = self.0;
        (0..LINES_PER_FIELD).filter(move |line| bits & (1 << line) == 0)
    }

    /// Number of enabled line slots
    pub fn enabled_count(&self) -> usize {
        LINES_PER_FIELD - (self.0.count_ones() as usize)
    }

    /// Parse a mask from flag text with C `strtol(_, _, 0)` base rules:
    /// `0x`/`0X` prefix is hex, a leading `0` is octal, otherwise decimal.
    ///
    /// # Examples
    ///
    /// ```
    /// use vbitx_types::LineMask;
    ///
    /// assert_eq!(LineMask::parse("0"), Some(LineMask(0)));
    /// assert_eq!(LineMask::parse("0x10"), Some(LineMask(16)));
    /// assert_eq!(LineMask::parse("010"), Some(LineMask(8)));
    /// assert_eq!(LineMask::parse("10"), Some(LineMask(10)));
    /// assert_eq!(LineMask::parse("bogus"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u16::from_str_radix(hex, 16).ok()?
        } else if s.len() > 1 && s.starts_with('0') {
            u16::from_str_radix(&s[1..], 8).ok()?
        } else {
            s.parse::<u16>().ok()?
        };
        Some(LineMask(value))
    }
}

/// Resolved even/odd mask pair
///
/// Command-line rule: if only one of the two masks is given it applies to
/// both fields; if neither is given both default to all-enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaskPair {
    pub even: LineMask,
    pub odd: LineMask,
}

impl MaskPair {
    /// Apply the single-flag-covers-both-fields resolution rule.
    ///
    /// # Examples
    ///
    /// ```
    /// use vbitx_types::{LineMask, MaskPair};
    ///
    /// let both = MaskPair::resolve(Some(LineMask(0x3)), None);
    /// assert_eq!(both.even, LineMask(0x3));
    /// assert_eq!(both.odd, LineMask(0x3));
    ///
    /// let defaults = MaskPair::resolve(None, None);
    /// assert_eq!(defaults.even, LineMask::ALL_ENABLED);
    /// assert_eq!(defaults.odd, LineMask::ALL_ENABLED);
    /// ```
    pub fn resolve(even: Option<LineMask>, odd: Option<LineMask>) -> Self {
        match (even, odd) {
            (Some(e), Some(o)) => MaskPair { even: e, odd: o },
            (Some(e), None) => MaskPair { even: e, odd: e },
            (None, Some(o)) => MaskPair { even: o, odd: o },
            (None, None) => MaskPair::default(),
        }
    }

    /// Mask for one field
    pub fn for_field(&self, field: Field) -> LineMask {
        match field {
            Field::Even => self.even,
            Field::Odd => self.odd,
        }
    }
}
