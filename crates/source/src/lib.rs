//! Payload sources and the producer/consumer handoff
//!
//! A [`PayloadSource`] produces logical 42-byte packets on the run-loop
//! side: either the self-contained demo generator or an external
//! line-oriented stream drained until exhausted. Packets cross into the
//! vsync callback through a bounded channel whose consumer end never
//! blocks; the encoder substitutes filler when the channel runs dry, and
//! the producer blocks at the edge when the callback falls behind.
//!
//! The run loop must never touch the canvas, masks, or slot resources
//! directly; this channel is the only path from a source to the screen.

use std::io::{self, BufRead, Read};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use vbitx_encode::PacketFeed;
use vbitx_types::{Packet, FRAMING_CODE, PACKET_LEN};

/// Packets the demo generator emits before completing.
///
/// At 16 lines per field and 50 fields per second the callback consumes
/// 800 packets a second, so this runs the demo for roughly 20 seconds.
pub const DEMO_PACKETS: u64 = 16_000;

/// Default capacity of the handoff channel: two fields' worth of lines.
pub const CHANNEL_CAPACITY: usize = 32;

/// Supplies the next logical line of payload bytes.
///
/// `Ok(None)` means the source completed cleanly (stream exhausted or
/// generator done); the run drains to that point and then tears down.
pub trait PayloadSource {
    fn next_packet(&mut self) -> io::Result<Option<Packet>>;
}

/// Self-contained generator: a deterministic rolling test pattern.
///
/// Each packet carries the framing code, a 16-bit sequence number, and a
/// byte ramp keyed off the sequence, so a receiver (or a test) can check
/// ordering and detect repeated or torn lines.
#[derive(Debug)]
pub struct DemoSource {
    remaining: u64,
    sequence: u16,
}

impl DemoSource {
    pub fn new(total: u64) -> Self {
        Self {
            remaining: total,
            sequence: 0,
        }
    }

    /// Build the packet for sequence number `seq`.
    pub fn packet_for(seq: u16) -> Packet {
        let mut p = [0u8; PACKET_LEN];
        p[0] = FRAMING_CODE;
        p[1] = (seq & 0xff) as u8;
        p[2] = (seq >> 8) as u8;
        for (i, byte) in p.iter_mut().enumerate().skip(3) {
            *byte = (seq as usize).wrapping_add(i) as u8;
        }
        p
    }
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new(DEMO_PACKETS)
    }
}

impl PayloadSource for DemoSource {
    fn next_packet(&mut self) -> io::Result<Option<Packet>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let packet = Self::packet_for(self.sequence);
        self.sequence = self.sequence.wrapping_add(1);
        Ok(Some(packet))
    }
}

/// External line stream: exact 42-byte packets until EOF.
///
/// A short trailing read is discarded and ends the stream, matching the
/// drain-until-exhausted run mode.
#[derive(Debug)]
pub struct StreamSource<R: BufRead> {
    reader: R,
}

impl<R: BufRead> StreamSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> PayloadSource for StreamSource<R> {
    fn next_packet(&mut self) -> io::Result<Option<Packet>> {
        let mut packet = [0u8; PACKET_LEN];
        let mut filled = 0;
        while filled < PACKET_LEN {
            let n = self.reader.read(&mut packet[filled..])?;
            if n == 0 {
                // EOF; partial packets are dropped.
                return Ok(None);
            }
            filled += n;
        }
        Ok(Some(packet))
    }
}

/// Consumer end of the handoff channel; strictly non-blocking.
#[derive(Debug)]
pub struct ChannelFeed {
    rx: Receiver<Packet>,
}

impl PacketFeed for ChannelFeed {
    fn try_next(&mut self) -> Option<Packet> {
        self.rx.try_recv().ok()
    }
}

/// Producer end of the handoff channel.
///
/// `send` blocks while the channel is full, pacing the run loop to the
/// callback's consumption rate. Returns `false` once the consumer is
/// gone (ticks stopped), which the run loop treats as completion.
#[derive(Debug, Clone)]
pub struct PacketSender {
    tx: SyncSender<Packet>,
}

impl PacketSender {
    pub fn send(&self, packet: Packet) -> bool {
        self.tx.send(packet).is_ok()
    }

    /// Non-blocking variant; `Ok(false)` when the channel is full.
    pub fn try_send(&self, packet: Packet) -> Result<bool, ()> {
        match self.tx.try_send(packet) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Disconnected(_)) => Err(()),
        }
    }
}

/// Create the bounded producer/consumer handoff.
pub fn packet_channel(capacity: usize) -> (PacketSender, ChannelFeed) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (PacketSender { tx }, ChannelFeed { rx })
}

/// Drain `source` into the channel until it completes or the consumer
/// goes away. Returns the number of packets forwarded.
pub fn drain(source: &mut dyn PayloadSource, sender: &PacketSender) -> io::Result<u64> {
    let mut forwarded = 0;
    while let Some(packet) = source.next_packet()? {
        if !sender.send(packet) {
            break;
        }
        forwarded += 1;
    }
    Ok(forwarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn demo_source_is_deterministic_and_finite() {
        let mut a = DemoSource::new(3);
        let mut b = DemoSource::new(3);
        for _ in 0..3 {
            assert_eq!(a.next_packet().unwrap(), b.next_packet().unwrap());
        }
        assert_eq!(a.next_packet().unwrap(), None);
        assert_eq!(a.next_packet().unwrap(), None);
    }

    #[test]
    fn demo_packets_carry_sequence_numbers() {
        let mut source = DemoSource::new(300);
        let first = source.next_packet().unwrap().unwrap();
        let second = source.next_packet().unwrap().unwrap();
        assert_eq!(first[0], FRAMING_CODE);
        assert_eq!([first[1], first[2]], [0, 0]);
        assert_eq!([second[1], second[2]], [1, 0]);
        for _ in 0..254 {
            source.next_packet().unwrap();
        }
        let p256 = source.next_packet().unwrap().unwrap();
        assert_eq!([p256[1], p256[2]], [0, 1]);
    }

    #[test]
    fn stream_source_reads_exact_packets_until_eof() {
        let mut bytes = vec![0u8; PACKET_LEN * 2 + 10]; // trailing short read
        bytes[0] = 0xAA;
        bytes[PACKET_LEN] = 0xBB;
        let mut source = StreamSource::new(Cursor::new(bytes));

        assert_eq!(source.next_packet().unwrap().unwrap()[0], 0xAA);
        assert_eq!(source.next_packet().unwrap().unwrap()[0], 0xBB);
        // 10 stray bytes: dropped, stream ends.
        assert_eq!(source.next_packet().unwrap(), None);
    }

    #[test]
    fn channel_feed_never_blocks() {
        let (sender, mut feed) = packet_channel(2);
        assert_eq!(feed.try_next(), None);
        assert!(sender.send([7u8; PACKET_LEN]));
        assert_eq!(feed.try_next().map(|p| p[0]), Some(7));
        assert_eq!(feed.try_next(), None);
    }

    #[test]
    fn try_send_reports_full_and_disconnected() {
        let (sender, feed) = packet_channel(1);
        assert_eq!(sender.try_send([1u8; PACKET_LEN]), Ok(true));
        assert_eq!(sender.try_send([2u8; PACKET_LEN]), Ok(false));
        drop(feed);
        assert_eq!(sender.try_send([3u8; PACKET_LEN]), Err(()));
    }

    #[test]
    fn drain_forwards_until_source_completes() {
        let (sender, mut feed) = packet_channel(16);
        let mut source = DemoSource::new(5);
        let forwarded = drain(&mut source, &sender).unwrap();
        assert_eq!(forwarded, 5);
        let mut seen = 0;
        while feed.try_next().is_some() {
            seen += 1;
        }
        assert_eq!(seen, 5);
    }

    #[test]
    fn drain_stops_when_consumer_is_gone() {
        let (sender, feed) = packet_channel(16);
        drop(feed);
        let mut source = DemoSource::new(5);
        let forwarded = drain(&mut source, &sender).unwrap();
        assert_eq!(forwarded, 0);
    }
}
