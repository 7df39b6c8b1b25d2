//! Terminal display backend and vsync driver
//!
//! Implements the display-subsystem boundary against a terminal: the
//! "session" is raw mode plus the alternate screen, the three slot
//! resources are off-screen pixel buffers, and "presenting" a slot
//! diff-draws its pixels as shaded character cells. A real signal
//! generator would swap a GPU resource here instead; the rotation core
//! only ever sees the `DisplayLink` trait.
//!
//! The vsync driver runs the engine at the 50 Hz field rate on its own
//! thread and hands ownership of engine and display back on `stop()`,
//! so teardown cannot race a tick still in flight.

pub mod driver;
pub mod overlay;
pub mod resources;

pub use driver::VsyncDriver;
pub use overlay::TerminalOverlay;
pub use resources::SlotResources;
