//! Calibration-fill properties: the clock run-in lands on exactly the
//! mask-enabled rows, and disabled rows never pick up any content.

use vbitx::core::{Canvas, LineEncoder};
use vbitx::types::{
    Field, LineMask, MaskPair, CLOCK_COLS, CLOCK_RUN_IN, COLUMN_OFFSET, FRAME_HEIGHT,
    LINES_PER_FIELD,
};

struct OnesEncoder;

impl LineEncoder for OnesEncoder {
    fn encode_line(&mut self, dest: &mut [u8]) {
        dest.fill(1);
    }
}

fn row_has_run_in(canvas: &Canvas, row: usize) -> bool {
    (0..CLOCK_COLS).any(|bit| canvas.pixel(COLUMN_OFFSET + bit, row) != Some(0))
}

#[test]
fn run_in_lands_on_exactly_the_enabled_rows() {
    let cases = [
        (LineMask(0x0), LineMask(0x0)),
        (LineMask(0x1), LineMask(0x0)),
        (LineMask(0xffff), LineMask(0x0)),
        (LineMask(0x00ff), LineMask(0xff00)),
        (LineMask(0x5555), LineMask(0xaaaa)),
    ];

    for (even, odd) in cases {
        let masks = MaskPair { even, odd };
        let mut canvas = Canvas::new();
        canvas.write_clock_run_in(masks);

        for field in [Field::Even, Field::Odd] {
            let mask = masks.for_field(field);
            for line in 0..LINES_PER_FIELD {
                let row = field.row_of(line);
                assert_eq!(
                    row_has_run_in(&canvas, row),
                    mask.is_enabled(line),
                    "masks=({:#x},{:#x}) {} line {line}",
                    even.0,
                    odd.0,
                    field.as_str()
                );
            }
        }
    }
}

#[test]
fn run_in_pattern_matches_the_constant() {
    let mut canvas = Canvas::new();
    canvas.write_clock_run_in(MaskPair::default());

    for row in 0..FRAME_HEIGHT {
        for bit in 0..CLOCK_COLS {
            let expected = ((CLOCK_RUN_IN >> bit) & 1) as u8;
            assert_eq!(
                canvas.pixel(COLUMN_OFFSET + bit, row),
                Some(expected),
                "row {row} bit {bit}"
            );
        }
    }
}

#[test]
fn disabled_rows_stay_zero_through_fill_cycles() {
    let masks = MaskPair {
        even: LineMask(0x8001), // lines 0 and 15 disabled
        odd: LineMask(0xffff),  // whole odd field disabled
    };
    let mut canvas = Canvas::new();
    canvas.write_clock_run_in(masks);

    let mut encoder = OnesEncoder;
    for _ in 0..5 {
        canvas.fill_field(Field::Even, masks.even, &mut encoder);
        canvas.fill_field(Field::Odd, masks.odd, &mut encoder);
    }

    // Even lines 0 and 15 are rows 0 and 30; the whole odd field is
    // rows 1,3,...,31. All must still read "no transmission".
    for row in [0usize, 30] {
        assert!(canvas.row(row).unwrap().iter().all(|&b| b == 0), "row {row}");
    }
    for line in 0..LINES_PER_FIELD {
        let row = Field::Odd.row_of(line);
        assert!(canvas.row(row).unwrap().iter().all(|&b| b == 0), "row {row}");
    }
    // Enabled even lines did receive content.
    assert!(!canvas.row(2).unwrap().iter().all(|&b| b == 0));
}

#[test]
fn blanking_columns_are_never_touched() {
    let masks = MaskPair::default();
    let mut canvas = Canvas::new();
    canvas.write_clock_run_in(masks);
    let mut encoder = OnesEncoder;
    canvas.fill_field(Field::Even, masks.even, &mut encoder);
    canvas.fill_field(Field::Odd, masks.odd, &mut encoder);

    for row in 0..FRAME_HEIGHT {
        for col in 0..COLUMN_OFFSET {
            assert_eq!(canvas.pixel(col, row), Some(0), "blanking col {col} row {row}");
        }
    }
}
