//! VsyncDriver: the periodic tick thread.
//!
//! Stands in for the display subsystem's per-refresh callback: one thread
//! invokes the engine once per field period. Invocations from this driver
//! are strictly serialized, so every publish lands before the next claim
//! and a slow fill shows up as a late tick, never as re-entrancy. The
//! engine's atomic cursor does not rely on that; the fallback path stays
//! armed for hosts whose callbacks can genuinely overlap.
//!
//! Late ticks are collapsed, not queued: after a slow fill the next tick
//! fires immediately and the schedule restarts from there.
//!
//! `stop()` signals the thread, joins it, and returns ownership of the
//! engine and display link. Nothing can touch either while ticks are
//! live, and no tick can execute after `stop()` returns; the quiescence
//! rule for teardown falls out of the ownership transfer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use vbitx_core::{DisplayError, DisplayLink, LineEncoder, VsyncEngine};

pub struct VsyncDriver<E: LineEncoder, L: DisplayLink> {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Result<(VsyncEngine<E>, L), DisplayError>>,
}

impl<E, L> VsyncDriver<E, L>
where
    E: LineEncoder + Send + 'static,
    L: DisplayLink + Send + 'static,
{
    /// Register the tick callback: moves engine and link onto the driver
    /// thread and starts ticking every `period`.
    pub fn start(mut engine: VsyncEngine<E>, mut link: L, period: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            // Sleep in short slices so stop() never waits a full period.
            const POLL: Duration = Duration::from_millis(1);
            let mut next = Instant::now() + period;
            while !flag.load(Ordering::Acquire) {
                engine.tick(&mut link)?;
                let now = Instant::now();
                if next <= now {
                    // Ran past the boundary; do not queue missed ticks.
                    next = now + period;
                    continue;
                }
                while !flag.load(Ordering::Acquire) {
                    let now = Instant::now();
                    if now >= next {
                        break;
                    }
                    thread::sleep((next - now).min(POLL));
                }
                next += period;
            }
            Ok((engine, link))
        });

        Self { stop, handle }
    }

    /// Unregister the callback: signal, join, and hand back the engine
    /// and link. A display failure inside any tick surfaces here.
    pub fn stop(self) -> Result<(VsyncEngine<E>, L), DisplayError> {
        self.stop.store(true, Ordering::Release);
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(DisplayError::Vsync("tick thread panicked".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vbitx_core::{Canvas, Rect};
    use vbitx_types::{MaskPair, Slot};

    struct NullEncoder;

    impl LineEncoder for NullEncoder {
        fn encode_line(&mut self, dest: &mut [u8]) {
            dest.fill(1);
        }
    }

    #[derive(Default)]
    struct CountingLink {
        presents: u64,
        writes: u64,
    }

    impl DisplayLink for CountingLink {
        fn present(&mut self, _slot: Slot) -> Result<(), DisplayError> {
            self.presents += 1;
            Ok(())
        }

        fn write_slot(
            &mut self,
            _slot: Slot,
            _canvas: &Canvas,
            _rect: Rect,
        ) -> Result<(), DisplayError> {
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn driver_ticks_until_stopped_and_returns_ownership() {
        let engine = VsyncEngine::new(Canvas::new(), MaskPair::default(), NullEncoder);
        let driver = VsyncDriver::start(engine, CountingLink::default(), Duration::from_millis(1));

        thread::sleep(Duration::from_millis(30));
        let (engine, link) = driver.stop().unwrap();

        assert!(engine.ticks() > 0);
        assert_eq!(engine.ticks(), link.presents);
        // Serialized driver, fast fills: every tick completed its write.
        assert_eq!(link.writes, link.presents);
        assert_eq!(engine.overruns(), 0);
    }

    #[test]
    fn no_tick_executes_after_stop_returns() {
        let engine = VsyncEngine::new(Canvas::new(), MaskPair::default(), NullEncoder);
        let driver = VsyncDriver::start(engine, CountingLink::default(), Duration::from_millis(1));

        let (engine, _link) = driver.stop().unwrap();
        let frozen = engine.ticks();
        thread::sleep(Duration::from_millis(10));
        assert_eq!(engine.ticks(), frozen);
    }

    #[test]
    fn display_failure_stops_the_driver_and_surfaces_at_stop() {
        struct FailingLink;
        impl DisplayLink for FailingLink {
            fn present(&mut self, slot: Slot) -> Result<(), DisplayError> {
                Err(DisplayError::Present {
                    slot,
                    source: std::io::Error::new(std::io::ErrorKind::Other, "lost"),
                })
            }
            fn write_slot(
                &mut self,
                _slot: Slot,
                _canvas: &Canvas,
                _rect: Rect,
            ) -> Result<(), DisplayError> {
                Ok(())
            }
        }

        let engine = VsyncEngine::new(Canvas::new(), MaskPair::default(), NullEncoder);
        let driver = VsyncDriver::start(engine, FailingLink, Duration::from_millis(1));
        thread::sleep(Duration::from_millis(5));
        assert!(driver.stop().is_err());
    }
}
