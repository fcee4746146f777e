//! Sliding-window systematic encoder
//!
//! The encoder keeps a circular history of the last W data units. Each call
//! to [`Encoder::encode`] produces the complete frame payload:
//! `header ‖ d[fcnt] ‖ x₀ … x_{R−2}`, where every `x_r` is the XOR of the
//! historical units selected by that parity check's generator line.
//!
//! No transmission happens here; the caller owns the wire.

use tracing::trace;

use crate::generator::{effective_window, generator_line};
use crate::params::{pack_header, CodeRate, WindowLength};

pub struct Encoder {
    max_rate: CodeRate,
    max_window: WindowLength,
    rate: CodeRate,
    window: WindowLength,
    unit_size: usize,
    /// Last `max_window` data units, indexed by `(fcnt − 1) mod W_max`.
    history: Vec<u8>,
    /// Payload scratch, sized for the worst-case configured rate.
    payload: Vec<u8>,
}

impl Encoder {
    /// Allocate an encoder for data units of `unit_size` bytes. `max_rate`
    /// and `max_window` bound what [`Encoder::set`] will later accept and
    /// size the history ring and payload scratch once, up front.
    ///
    /// The initial setting is systematic-only (`R1_2`, `W0`); call `set` to
    /// select the operating point.
    pub fn new(max_rate: CodeRate, max_window: WindowLength, unit_size: usize) -> Encoder {
        assert!(unit_size > 0, "data units must not be empty");
        Encoder {
            max_rate,
            max_window,
            rate: CodeRate::R1_2,
            window: WindowLength::W0,
            unit_size,
            history: vec![0; unit_size * max_window.size() as usize],
            payload: vec![0; 1 + 2 * unit_size * max_rate.denominator() as usize],
        }
    }

    /// Select the coding parameters for subsequent frames. Rejected (with no
    /// state change) if either value exceeds the configured maximum.
    pub fn set(&mut self, rate: CodeRate, window: WindowLength) -> bool {
        if rate > self.max_rate || window > self.max_window {
            return false;
        }
        self.rate = rate;
        self.window = window;
        true
    }

    pub fn rate(&self) -> CodeRate {
        self.rate
    }

    pub fn window(&self) -> WindowLength {
        self.window
    }

    pub fn unit_size(&self) -> usize {
        self.unit_size
    }

    /// Encode one frame. `fcnt` is the 1-based frame counter; passing 0 is a
    /// contract violation. Returns the payload, borrowed from internal
    /// scratch, valid until the next call.
    pub fn encode(&mut self, data_unit: &[u8], fcnt: u32) -> &[u8] {
        assert!(fcnt >= 1, "frame counters are 1-based");
        assert_eq!(data_unit.len(), self.unit_size, "data unit size mismatch");

        let s = self.unit_size;
        let window = self.window.size();
        let denominator = self.rate.denominator() as usize;
        let payload_size = 1 + s * denominator;

        self.payload[..payload_size].fill(0);
        self.payload[0] = pack_header(self.rate, self.window);
        self.payload[1..1 + s].copy_from_slice(data_unit);

        // Parity checks only reach back to units actually sent.
        let window_size = effective_window(window, fcnt) as usize;
        for parity_index in 0..denominator - 1 {
            let line = generator_line(window, fcnt, parity_index as u8);
            let parity_base = 1 + s * (1 + parity_index);
            for offset in 1..=window_size {
                if line[offset - 1] {
                    let unit_base = ((fcnt as usize - 1 - offset) * s) % self.history.len();
                    for i in 0..s {
                        self.payload[parity_base + i] ^= self.history[unit_base + i];
                    }
                }
            }
        }

        if !self.history.is_empty() {
            let unit_base = ((fcnt as usize - 1) * s) % self.history.len();
            self.history[unit_base..unit_base + s].copy_from_slice(data_unit);
        }

        trace!(fcnt, payload_size, "frame encoded");
        &self.payload[..payload_size]
    }
}
