//! VBI overlay runner.
//!
//! Session controller with an init -> run -> teardown lifecycle: resolve
//! the active-line masks, calibrate the working canvas, open the display
//! session and its three slot resources, start the vsync driver, drain
//! the selected payload source until it completes, then stop the driver
//! and tear down in reverse order. The driver owns the engine and the
//! display for the whole run; teardown cannot begin until `stop()` has
//! joined the tick thread.

use std::io;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use vbitx::core::{Canvas, VsyncEngine};
use vbitx::encode::PacketEncoder;
use vbitx::source::{
    drain, packet_channel, DemoSource, PayloadSource, StreamSource, CHANNEL_CAPACITY,
};
use vbitx::term::{TerminalOverlay, VsyncDriver};
use vbitx::types::{Field, LineMask, MaskPair, FIELD_PERIOD_MS};

/// Teletext-style VBI overlay renderer.
///
/// Renders encoded data lines into an interlaced overlay synchronized to
/// the field refresh. Without arguments it runs the built-in demo
/// generator; with a trailing `-` it drains 42-byte packets from stdin
/// until the stream is exhausted.
#[derive(Parser, Debug)]
#[command(name = "vbitx", version)]
struct Cli {
    /// Even-field line mask (bit set = line skipped). Applies to both
    /// fields when -o is absent. Accepts 0x hex, leading-0 octal, decimal.
    #[arg(short = 'm', long = "mask-even", value_parser = parse_mask)]
    mask_even: Option<LineMask>,

    /// Odd-field line mask. Applies to both fields when -m is absent.
    #[arg(short = 'o', long = "mask-odd", value_parser = parse_mask)]
    mask_odd: Option<LineMask>,

    /// A single `-` selects stream-drain mode (read packets from stdin).
    #[arg(value_name = "-")]
    mode: Option<String>,
}

fn parse_mask(s: &str) -> Result<LineMask, String> {
    LineMask::parse(s).ok_or_else(|| format!("`{s}` is not a valid 16-bit line mask"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let stream_mode = match cli.mode.as_deref() {
        None => false,
        Some("-") => true,
        Some(other) => bail!("unexpected argument `{other}` (a single `-` selects stream mode)"),
    };
    let masks = MaskPair::resolve(cli.mask_even, cli.mask_odd);
    run(masks, stream_mode)
}

/// True when at least one line in either field will be filled. A fully
/// masked pair leaves the encoder untouched, so no payload is consumed.
fn has_enabled_lines(masks: MaskPair) -> bool {
    masks.even.enabled_count() + masks.odd.enabled_count() > 0
}

fn run(masks: MaskPair, stream_mode: bool) -> Result<()> {
    // Working canvas: zero fill, clock run-in on every enabled row, then
    // one encoded line per enabled row so the first visible frame is
    // complete content rather than bare calibration.
    let (sender, feed) = packet_channel(CHANNEL_CAPACITY);
    let mut encoder = PacketEncoder::new(feed);
    let mut canvas = Canvas::new();
    canvas.write_clock_run_in(masks);
    canvas.fill_field(Field::Even, masks.even, &mut encoder);
    canvas.fill_field(Field::Odd, masks.odd, &mut encoder);

    // All three slot resources start as identical copies of this canvas,
    // so the fallback slot holds a known-good frame before the first fill.
    let mut overlay = TerminalOverlay::open(&canvas).context("opening display session")?;
    overlay.bind().context("binding overlay element")?;

    let engine = VsyncEngine::new(canvas, masks, encoder);
    let driver = VsyncDriver::start(engine, overlay, Duration::from_millis(FIELD_PERIOD_MS));

    let mut source: Box<dyn PayloadSource> = if stream_mode {
        Box::new(StreamSource::new(io::stdin().lock()))
    } else {
        Box::new(DemoSource::default())
    };
    // With every line masked no tick consumes packets; draining would
    // block forever on a full channel, so skip it outright.
    let drained = if has_enabled_lines(masks) {
        drain(source.as_mut(), &sender)
    } else {
        Ok(0)
    };
    drop(sender);

    // Unregister the callback before touching any resource: stop() joins
    // the tick thread and hands the display back.
    let (_engine, overlay) = driver.stop()?;
    overlay.close()?;

    drained.context("reading payload stream")?;
    Ok(())
}
