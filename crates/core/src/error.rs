//! Fatal-tier error type for the display boundary.
//!
//! Every failure from the display subsystem (session, resources, overlay
//! element, vsync registration) is unrecoverable: there is no retry tier,
//! the run is torn down. Deadline misses are *not* errors and never appear
//! here; the engine absorbs them through the fallback slot.

use std::io;

use thiserror::Error;

use vbitx_types::Slot;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("failed to open display session: {0}")]
    SessionOpen(#[source] io::Error),

    #[error("failed to close display session: {0}")]
    SessionClose(#[source] io::Error),

    #[error("slot resource {slot:?} released more than once")]
    ResourceReleased { slot: Slot },

    #[error("failed to bind overlay element: {0}")]
    ElementBind(#[source] io::Error),

    #[error("failed to unbind overlay element: {0}")]
    ElementUnbind(#[source] io::Error),

    #[error("failed to present slot {slot:?}: {source}")]
    Present {
        slot: Slot,
        #[source]
        source: io::Error,
    },

    #[error("vsync driver failed: {0}")]
    Vsync(String),
}
