//! Deterministic pseudo-random byte generator
//!
//! Encoder and decoder both derive generator lines from frame metadata, so
//! this function must produce bit-identical output on every platform. It is
//! an 8-bit Fibonacci LFSR with feedback polynomial x⁸+x⁶+x⁵+x⁴+1 (period
//! 255), seeded per call and advanced a caller-chosen number of steps.

/// LFSR sequence length before the state repeats.
const PERIOD: u32 = 255;

/// Return a pseudo-random byte in `[0, max)`.
///
/// `max` must be a power of two no larger than 128; the result is the LFSR
/// state masked by `max − 1`. The output is a pure function of the inputs:
/// `index` selects how many steps to advance and `seed` selects the starting
/// state (conditioned to `(seed mod 254) + 1` so the all-zero lock-up state
/// is unreachable).
pub fn prng(max: u8, index: u32, seed: u32) -> u8 {
    debug_assert!(max.is_power_of_two() && max <= 128, "max must be a power of two <= 128");

    let index = index % PERIOD;
    let mut lfsr = ((seed % (PERIOD - 1)) + 1) as u8;

    for _ in 0..index {
        let fed_back = (lfsr ^ (lfsr >> 2) ^ (lfsr >> 3) ^ (lfsr >> 4)) & 1;
        lfsr = (lfsr >> 1) | (fed_back << 7);
    }

    lfsr & (max - 1)
}
