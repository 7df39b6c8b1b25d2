//! Rotation core - deterministic, display-agnostic, and testable
//!
//! This crate owns the working frame canvas and the buffer-rotation state
//! machine that runs inside the per-field vsync callback. It performs no
//! I/O of its own: the display subsystem and the line encoder are reached
//! only through the [`DisplayLink`] and [`LineEncoder`] traits, so every
//! tick of the state machine can be driven and inspected from a plain
//! unit test.
//!
//! # Module Structure
//!
//! - [`canvas`]: 384x32 working pixel buffer with bounds-checked row and
//!   payload-region accessors, and the clock run-in calibration fill
//! - [`engine`]: the three-slot rotation state machine with its atomic
//!   cursor and overrun fallback path
//! - [`error`]: the fatal-tier [`DisplayError`] surfaced by the display
//!   boundary
//!
//! # Rotation Protocol
//!
//! One tick of [`engine::VsyncEngine::tick`]:
//!
//! 1. Atomically claim the queued slot, leaving `Fallback` in its place.
//! 2. Present the claimed slot. Unconditional and cheap.
//! 3. If the claimed slot *was* `Fallback`, the previous fill overran:
//!    skip this tick's fill entirely. The fallback's coherent startup
//!    frame stays visible.
//! 4. Otherwise fill the other working slot's field into the canvas,
//!    honoring its active-line mask.
//! 5. Push the invalidated canvas region into that slot's resource.
//! 6. Publish the slot as the one to show next tick.
//!
//! The claim-before-fill ordering is the entire anti-tearing argument: a
//! re-entrant or late tick can only ever observe `Fallback` while a fill
//! is in flight, so a half-written buffer is never selected for display.

pub mod canvas;
pub mod engine;
pub mod error;

pub use canvas::{Canvas, Rect};
pub use engine::{DisplayLink, LineEncoder, SlotCursor, VsyncEngine};
pub use error::DisplayError;
