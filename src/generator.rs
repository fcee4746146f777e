//! Generator-line construction
//!
//! A generator line is the length-W bit vector selecting which of the last W
//! data units participate in one parity check. Sender and receiver rebuild
//! it independently from `(W, fcnt, parity index)`; it is never transmitted,
//! so the construction below is part of the wire contract and must not
//! change.

use bitvec::prelude::*;

use crate::constants::{DENSITY_DECAY, DENSITY_FLOOR, DENSITY_SCALE, MAX_WINDOW};
use crate::prng::prng;

/// One generator line, stored as a flat 64-bit value type. Only the first
/// `effective_window` bits of a line are ever consulted.
pub type GeneratorLine = BitArr!(for 64, in u8);

/// Fraction of the window participating in one parity check.
pub fn parity_density(window: u8) -> f64 {
    DENSITY_SCALE * (DENSITY_DECAY * f64::from(window)).exp() + DENSITY_FLOOR
}

/// Number of ones in a generator line for the given window size.
///
/// `round(W · density(W))`: dense for small windows (D ≈ W), thinning out to
/// roughly W/4 at the largest windows.
pub fn parity_degree(window: u8) -> u8 {
    let degree = (f64::from(window) * parity_density(window)).round() as u8;
    degree.min(window)
}

/// Number of line entries that can refer to a real prior data unit: the
/// first `fcnt − 1` frames, capped by the window.
pub fn effective_window(window: u8, fcnt: u32) -> u8 {
    debug_assert!(fcnt >= 1, "frame counters are 1-based");
    u32::from(window).min(fcnt - 1) as u8
}

/// Build the generator line for parity check `parity_index` of frame `fcnt`.
///
/// Exactly `parity_degree(window)` bits are set, at positions chosen by a
/// PRNG walk: each placed one seeds the position of the next. When the walk
/// lands on a position that is already set, a retry cursor steps forward in
/// strides of 7 until a free position appears; the retry cursor is local to
/// the collision and deliberately does not feed back into the outer walk.
pub fn generator_line(window: u8, fcnt: u32, parity_index: u8) -> GeneratorLine {
    debug_assert!(window <= MAX_WINDOW);

    let mut line = GeneratorLine::ZERO;
    let degree = parity_degree(window);
    let seed = fcnt.wrapping_add(u32::from(parity_index) << 3);

    let mut index = fcnt;
    for _ in 0..degree {
        let mut candidate = prng(window, index, seed);
        let mut retry = index;
        while line[candidate as usize] {
            retry = retry.wrapping_add(7);
            candidate = prng(window, retry, seed);
        }
        line.set(candidate as usize, true);
        index = u32::from(candidate);
    }

    line
}
