//! Engine module - the vsync buffer-rotation state machine
//!
//! One [`VsyncEngine::tick`] runs per field refresh, invoked by the
//! display subsystem's vsync driver. It must decide, under the 20ms tick
//! budget, which slot resource is shown, which one is filled for the next
//! field, and how to degrade when the previous fill did not finish in
//! time.
//!
//! The rotation cursor is the sole state shared across the callback
//! boundary. It doubles as a re-entrancy guard: claiming it swaps in
//! `Fallback`, so any tick that starts while a fill is in flight observes
//! `Fallback`, re-presents that slot's coherent startup frame, and
//! skips its own fill.
//! A deadline miss therefore costs exactly one repeated field and nothing
//! else; it is not an error and is not reported as one.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use vbitx_types::{MaskPair, Slot};

use crate::canvas::{Canvas, Rect};
use crate::error::DisplayError;

/// Writes one line's pixel representation into a destination region.
///
/// Contract: touches only the bytes of that one line, synchronously, with
/// cost bounded well below the field period. How the payload behind the
/// pixels is produced is opaque to the rotation core.
pub trait LineEncoder {
    fn encode_line(&mut self, dest: &mut [u8]);
}

/// The subset of the display boundary the engine drives every tick.
///
/// Both operations are fatal on failure; there is no retry tier.
pub trait DisplayLink {
    /// Make `slot` the visible overlay source. Unconditional and fast.
    fn present(&mut self, slot: Slot) -> Result<(), DisplayError>;

    /// Copy `rect` of the canvas into `slot`'s off-screen resource.
    fn write_slot(&mut self, slot: Slot, canvas: &Canvas, rect: Rect)
        -> Result<(), DisplayError>;
}

/// Atomic rotation cursor: names the slot shown at the next tick.
///
/// The value is both a selector and an implicit lock. [`claim`] is a
/// test-and-set style transition that leaves [`Slot::Fallback`] behind,
/// so the cursor only ever names a working slot while that slot's content
/// is complete. [`publish`] re-arms it after a finished fill.
///
/// [`claim`]: SlotCursor::claim
/// [`publish`]: SlotCursor::publish
#[derive(Debug)]
pub struct SlotCursor(AtomicU8);

impl SlotCursor {
    pub fn new(initial: Slot) -> Self {
        Self(AtomicU8::new(initial.index() as u8))
    }

    fn decode(raw: u8) -> Slot {
        // Only values stored through this type can appear here.
        Slot::from_index(raw as usize).unwrap_or(Slot::Fallback)
    }

    /// Current value, for observers (tests, diagnostics)
    pub fn load(&self) -> Slot {
        Self::decode(self.0.load(Ordering::Acquire))
    }

    /// Atomically take the queued slot, leaving `Fallback` in its place.
    ///
    /// This is the re-entrancy guard: between a claim and the matching
    /// [`publish`](SlotCursor::publish), any other invocation observes
    /// `Fallback` and takes the skip path.
    pub fn claim(&self) -> Slot {
        Self::decode(self.0.swap(Slot::Fallback.index() as u8, Ordering::AcqRel))
    }

    /// Queue `slot` to be shown at the next tick.
    ///
    /// Release ordering pairs with the acquire in [`claim`](SlotCursor::claim)
    /// so the slot's resource write is visible before the slot can be
    /// selected for display.
    pub fn publish(&self, slot: Slot) {
        self.0.store(slot.index() as u8, Ordering::Release);
    }
}

/// The per-tick rotation state machine.
///
/// Owns the working canvas, the active-line masks, and the line encoder;
/// ownership moves into the vsync driver for the duration of the run, so
/// nothing else can mutate the canvas while ticks are live.
pub struct VsyncEngine<E: LineEncoder> {
    canvas: Canvas,
    masks: MaskPair,
    encoder: E,
    cursor: Arc<SlotCursor>,
    ticks: u64,
    overruns: u64,
}

impl<E: LineEncoder> VsyncEngine<E> {
    /// Build an engine around an already-calibrated canvas.
    ///
    /// The cursor starts at [`Slot::A`]: the first tick presents slot A's
    /// startup content (all three resources are initialized identically),
    /// then fills slot B for the tick after.
    pub fn new(canvas: Canvas, masks: MaskPair, encoder: E) -> Self {
        Self {
            canvas,
            masks,
            encoder,
            cursor: Arc::new(SlotCursor::new(Slot::A)),
            ticks: 0,
            overruns: 0,
        }
    }

    /// Shared handle to the rotation cursor
    pub fn cursor(&self) -> Arc<SlotCursor> {
        Arc::clone(&self.cursor)
    }

    /// Read-only view of the working canvas
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Ticks executed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks that took the overrun skip path
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Run one field refresh.
    ///
    /// Display failures propagate as fatal [`DisplayError`]s; an overrun
    /// is absorbed silently and only visible through [`overruns`].
    ///
    /// [`overruns`]: VsyncEngine::overruns
    pub fn tick(&mut self, link: &mut impl DisplayLink) -> Result<(), DisplayError> {
        // Claim before presenting: from here until publish, any
        // overlapping tick observes Fallback.
        let shown = self.cursor.claim();
        link.present(shown)?;
        self.ticks += 1;

        if shown == Slot::Fallback {
            // Previous fill missed its tick. A stale-but-valid frame
            // stays visible; self-heals next tick.
            self.overruns += 1;
            return Ok(());
        }

        let target = shown.other();
        if let Some(field) = target.field() {
            self.canvas
                .fill_field(field, self.masks.for_field(field), &mut self.encoder);
            link.write_slot(target, &self.canvas, Rect::DATA_REGION)?;
            self.cursor.publish(target);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vbitx_types::{Field, LineMask, DATA_COLUMN};

    struct CountingEncoder {
        calls: usize,
    }

    impl LineEncoder for CountingEncoder {
        fn encode_line(&mut self, dest: &mut [u8]) {
            self.calls += 1;
            dest.fill(1);
        }
    }

    #[derive(Default)]
    struct RecordingLink {
        presented: Vec<Slot>,
        written: Vec<Slot>,
    }

    impl DisplayLink for RecordingLink {
        fn present(&mut self, slot: Slot) -> Result<(), DisplayError> {
            self.presented.push(slot);
            Ok(())
        }

        fn write_slot(
            &mut self,
            slot: Slot,
            _canvas: &Canvas,
            _rect: Rect,
        ) -> Result<(), DisplayError> {
            self.written.push(slot);
            Ok(())
        }
    }

    fn engine() -> VsyncEngine<CountingEncoder> {
        VsyncEngine::new(
            Canvas::new(),
            MaskPair::default(),
            CountingEncoder { calls: 0 },
        )
    }

    #[test]
    fn cursor_claim_leaves_fallback() {
        let cursor = SlotCursor::new(Slot::A);
        assert_eq!(cursor.claim(), Slot::A);
        assert_eq!(cursor.load(), Slot::Fallback);
        cursor.publish(Slot::B);
        assert_eq!(cursor.load(), Slot::B);
    }

    #[test]
    fn ticks_alternate_working_slots() {
        let mut engine = engine();
        let mut link = RecordingLink::default();

        for _ in 0..6 {
            engine.tick(&mut link).unwrap();
        }
        assert_eq!(
            link.presented,
            vec![Slot::A, Slot::B, Slot::A, Slot::B, Slot::A, Slot::B]
        );
        assert_eq!(
            link.written,
            vec![Slot::B, Slot::A, Slot::B, Slot::A, Slot::B, Slot::A]
        );
        assert_eq!(engine.overruns(), 0);
    }

    #[test]
    fn presented_slot_is_never_the_written_slot() {
        let mut engine = engine();
        let mut link = RecordingLink::default();
        for _ in 0..10 {
            engine.tick(&mut link).unwrap();
        }
        for (shown, filled) in link.presented.iter().zip(&link.written) {
            assert_ne!(shown, filled);
        }
    }

    #[test]
    fn overrun_presents_fallback_and_skips_fill() {
        let mut engine = engine();
        let mut link = RecordingLink::default();

        engine.tick(&mut link).unwrap();
        // Simulate a fill still in flight: the claim happened but publish
        // has not, so the cursor holds Fallback at the next tick.
        let mid_fill = engine.cursor();
        let stolen = mid_fill.claim();
        assert_eq!(stolen, Slot::B);

        engine.tick(&mut link).unwrap();
        assert_eq!(*link.presented.last().unwrap(), Slot::Fallback);
        assert_eq!(link.written.len(), 1); // no new write
        assert_eq!(engine.overruns(), 1);

        // The interrupted fill publishes late; alternation resumes.
        mid_fill.publish(stolen);
        engine.tick(&mut link).unwrap();
        assert_eq!(*link.presented.last().unwrap(), Slot::B);
        assert_eq!(*link.written.last().unwrap(), Slot::A);
    }

    #[test]
    fn fill_encodes_one_line_per_enabled_row() {
        let mut engine = VsyncEngine::new(
            Canvas::new(),
            MaskPair {
                even: LineMask(0x1),
                odd: LineMask(0x0),
            },
            CountingEncoder { calls: 0 },
        );
        let mut link = RecordingLink::default();

        // First tick fills slot B = odd field: all 16 lines.
        engine.tick(&mut link).unwrap();
        assert_eq!(engine.encoder.calls, 16);
        // Second tick fills slot A = even field: 15 lines (bit 0 skipped).
        engine.tick(&mut link).unwrap();
        assert_eq!(engine.encoder.calls, 31);
        // Even line 0 is row 0: never written.
        assert_eq!(engine.canvas().pixel(DATA_COLUMN, 0), Some(0));
        assert_eq!(engine.canvas().pixel(DATA_COLUMN, Field::Odd.row_of(0)), Some(1));
    }

    #[test]
    fn display_failure_is_fatal() {
        struct FailingLink;
        impl DisplayLink for FailingLink {
            fn present(&mut self, slot: Slot) -> Result<(), DisplayError> {
                Err(DisplayError::Present {
                    slot,
                    source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"),
                })
            }
            fn write_slot(
                &mut self,
                _slot: Slot,
                _canvas: &Canvas,
                _rect: Rect,
            ) -> Result<(), DisplayError> {
                unreachable!("present already failed")
            }
        }

        let mut engine = engine();
        assert!(engine.tick(&mut FailingLink).is_err());
    }
}
