//! Line encoder - packet bytes to pixel levels
//!
//! Turns one 42-byte packet into the 336 payload pixels of a single VBI
//! line: one pixel per bit, least-significant bit first, matching the
//! clock run-in's bit order. The encoder is deliberately ignorant of what
//! the bytes mean; framing and addressing are the payload source's
//! business.
//!
//! [`PacketEncoder`] implements the rotation core's `LineEncoder` trait.
//! It pulls packets from a [`PacketFeed`] without blocking; when the feed
//! has nothing pending it substitutes the idle filler packet so enabled
//! lines keep carrying a decodable signal.

use arrayvec::ArrayVec;

use vbitx_core::LineEncoder;
use vbitx_types::{filler_packet, Packet, PAYLOAD_COLS};

/// Non-blocking supply of packets on the callback side of the handoff.
///
/// `try_next` must never block: it runs inside the vsync tick, where the
/// only acceptable outcome of an empty feed is falling back to filler.
pub trait PacketFeed {
    fn try_next(&mut self) -> Option<Packet>;
}

/// Fixed-capacity in-memory feed.
///
/// A deterministic stand-in for the live channel feed: benches and tests
/// preload it with known packets. Pops front-to-back.
#[derive(Debug, Default)]
pub struct StaticFeed {
    queue: ArrayVec<Packet, 64>,
}

impl StaticFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a packet; silently drops when full (capacity 64 covers two
    /// full frames of lines).
    pub fn push(&mut self, packet: Packet) {
        let _ = self.queue.try_push(packet);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl PacketFeed for StaticFeed {
    fn try_next(&mut self) -> Option<Packet> {
        if self.queue.is_empty() {
            None
        } else {
            Some(self.queue.remove(0))
        }
    }
}

/// Render `packet` into `dest`, one pixel per bit, LSB first.
pub fn write_bits(packet: &Packet, dest: &mut [u8]) {
    debug_assert_eq!(dest.len(), PAYLOAD_COLS);
    for (i, byte) in packet.iter().enumerate() {
        for bit in 0..8 {
            dest[i * 8 + bit] = (byte >> bit) & 1;
        }
    }
}

/// The line encoder handed to the rotation engine.
pub struct PacketEncoder<F: PacketFeed> {
    feed: F,
    filler: Packet,
    encoded: u64,
    fillers: u64,
}

impl<F: PacketFeed> PacketEncoder<F> {
    pub fn new(feed: F) -> Self {
        Self {
            feed,
            filler: filler_packet(),
            encoded: 0,
            fillers: 0,
        }
    }

    /// Lines encoded so far (payload and filler alike)
    pub fn encoded(&self) -> u64 {
        self.encoded
    }

    /// Lines that fell back to the filler packet
    pub fn fillers(&self) -> u64 {
        self.fillers
    }
}

impl<F: PacketFeed> LineEncoder for PacketEncoder<F> {
    fn encode_line(&mut self, dest: &mut [u8]) {
        let packet = match self.feed.try_next() {
            Some(p) => p,
            None => {
                self.fillers += 1;
                self.filler
            }
        };
        self.encoded += 1;
        write_bits(&packet, dest);
    }
}
