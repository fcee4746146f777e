//! DaRe frame decoder
//!
//! Implements the receive side of the scheme: the systematic slot of every
//! arriving frame is stored directly, and once a gap in the frame counter is
//! seen, parity checks are peeled against the known data units. Checks that
//! still hold two or more unknowns become pending equations; a GF(2)
//! elimination pass over those equations runs after every peel round.
//!
//! The decoder assumes a strictly monotonic frame counter: frames arrive in
//! order or not at all (lower layers drop corrupt and duplicate frames).

mod buffer;
mod solver;
mod stats;
mod storage;

pub use stats::{DecodeResults, RecoveryPhase};

use snafu::{ensure, Snafu};
use tracing::debug;

use crate::generator::{effective_window, generator_line};
use crate::params::unpack_header;

use buffer::EquationBuffer;
use storage::RecoveryStore;

/// XOR `src` into `dst` byte by byte.
pub(crate) fn xor_bytes(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum DecodeError {
    /// Header carries a tag outside the shared enumerations
    #[snafu(display("malformed header byte {header:#04x}"))]
    MalformedHeader { header: u8 },

    /// Payload length disagrees with the header's code rate
    #[snafu(display("payload is {actual} bytes, header implies {expected}"))]
    PayloadSize { expected: usize, actual: usize },

    /// Frame counters must increase strictly; a replay or reorder is a
    /// contract violation and decoding cannot continue
    #[snafu(display("frame counter {fcnt} not beyond the last seen {last}"))]
    NonMonotonicFcnt { fcnt: u32, last: u32 },

    /// Frame counter exceeds the configured horizon
    #[snafu(display("frame counter {fcnt} beyond the horizon of {horizon} frames"))]
    BeyondHorizon { fcnt: u32, horizon: usize },
}

pub struct Decoder {
    unit_size: usize,
    store: RecoveryStore,
    buffers: EquationBuffer,
    last_fcnt: u32,
    try_to_recover: bool,
    /// Scratch for the parity residual currently being peeled.
    parity_scratch: Vec<u8>,
}

impl Decoder {
    /// Allocate a decoder for data units of `unit_size` bytes over a stream
    /// of at most `frame_horizon` frames. All storage is sized here; the
    /// decode path performs no allocation.
    pub fn new(unit_size: usize, frame_horizon: usize) -> Decoder {
        assert!(unit_size > 0, "data units must not be empty");
        Decoder {
            unit_size,
            store: RecoveryStore::new(unit_size, frame_horizon),
            buffers: EquationBuffer::new(unit_size),
            last_fcnt: 0,
            try_to_recover: false,
            parity_scratch: vec![0; unit_size],
        }
    }

    /// Process one received frame payload.
    ///
    /// Stores the systematic data unit. If any frame is known to be
    /// missing, peels the payload's parity checks and whatever buffered
    /// equations they unlock, finishing with an elimination pass.
    pub fn decode(&mut self, payload: &[u8], fcnt: u32) -> Result<(), DecodeError> {
        ensure!(fcnt > self.last_fcnt, NonMonotonicFcntSnafu { fcnt, last: self.last_fcnt });
        ensure!(
            fcnt as usize <= self.store.horizon(),
            BeyondHorizonSnafu { fcnt, horizon: self.store.horizon() }
        );
        ensure!(!payload.is_empty(), PayloadSizeSnafu { expected: 1usize, actual: 0usize });

        let (rate, window_length) =
            unpack_header(payload[0]).map_err(|_| DecodeError::MalformedHeader { header: payload[0] })?;
        let s = self.unit_size;
        let denominator = rate.denominator() as usize;
        let expected = 1 + s * denominator;
        ensure!(payload.len() == expected, PayloadSizeSnafu { expected, actual: payload.len() });

        // Phase 1: the frame's own data unit.
        self.store.store(fcnt, &payload[1..1 + s], fcnt, RecoveryPhase::Direct);

        if self.last_fcnt < fcnt - 1 {
            debug!(fcnt, last_fcnt = self.last_fcnt, "gap detected, recovery active");
            self.try_to_recover = true;
        }
        self.last_fcnt = fcnt;

        if !self.try_to_recover {
            return Ok(());
        }

        let window = window_length.size();
        let window_size = effective_window(window, fcnt) as usize;
        let mut progress = false;

        for parity_index in 0..denominator - 1 {
            let mut line = generator_line(window, fcnt, parity_index as u8);
            let parity_base = 1 + s * (1 + parity_index);
            self.parity_scratch.copy_from_slice(&payload[parity_base..parity_base + s]);

            // Substitute every known unit into the check.
            for offset in 1..=window_size {
                let index = (fcnt as usize - 1) - offset;
                if self.store.is_received(index) && line[offset - 1] {
                    line.set(offset - 1, false);
                    xor_bytes(&mut self.parity_scratch, self.store.unit(index));
                }
            }

            match line[..window_size].count_ones() {
                0 => {} // fully known, nothing new
                1 => {
                    // Phase 2: the residual is the lone unknown itself.
                    let offset = line[..window_size].first_one().expect("one bit set") + 1;
                    self.store.store(
                        fcnt - offset as u32,
                        &self.parity_scratch,
                        fcnt,
                        RecoveryPhase::FreshParity,
                    );
                    progress = true;
                }
                _ => self.buffers.admit(fcnt, window_size as u8, &line, &self.parity_scratch),
            }
        }

        // Phase 3: every recovery may unlock buffered equations, which may
        // unlock more; iterate until a full pass makes no progress.
        while progress {
            progress = false;
            for slot in self.buffers.slots_mut() {
                if !slot.in_use {
                    continue;
                }
                for offset in 1..=slot.window as usize {
                    let index = (slot.fcnt as usize - 1) - offset;
                    if slot.line[offset - 1] && self.store.is_received(index) {
                        slot.line.set(offset - 1, false);
                        xor_bytes(&mut slot.residual, self.store.unit(index));
                    }
                }
                match slot.line[..slot.window as usize].count_ones() {
                    0 => slot.in_use = false,
                    1 => {
                        let offset = slot.line[..slot.window as usize].first_one().expect("one bit set") + 1;
                        self.store.store(
                            slot.fcnt - offset as u32,
                            &slot.residual,
                            fcnt,
                            RecoveryPhase::PeeledBuffer,
                        );
                        slot.in_use = false;
                        progress = true;
                    }
                    _ => {}
                }
            }
        }

        solver::eliminate(&mut self.buffers, &mut self.store, false, fcnt);

        if self.store.recovered() == fcnt && self.try_to_recover {
            debug!(fcnt, "stream complete, recovery idle");
            self.try_to_recover = false;
        }

        Ok(())
    }

    /// End of stream: run one final elimination over whatever equations are
    /// still pending, then drop them. Calling this again without new input
    /// is a no-op.
    pub fn flush(&mut self) {
        let horizon = self.store.horizon() as u32;
        solver::eliminate(&mut self.buffers, &mut self.store, true, horizon);
        self.try_to_recover = false;
    }

    /// Aggregate recovery statistics.
    pub fn results(&self) -> DecodeResults {
        self.store.results()
    }

    /// Recovered bytes of data unit `index` (0-based), if present.
    pub fn data_unit(&self, index: usize) -> Option<&[u8]> {
        self.store.is_received(index).then(|| self.store.unit(index))
    }

    pub fn is_received(&self, index: usize) -> bool {
        self.store.is_received(index)
    }

    /// Frames between a unit's own frame and the frame that recovered it.
    pub fn delay(&self, index: usize) -> Option<u32> {
        self.store.is_received(index).then(|| self.store.delay_of(index))
    }

    /// Number of parity equations currently pending. Never exceeds
    /// [`crate::constants::DECODING_BUFFERS`].
    pub fn pending_equations(&self) -> usize {
        self.buffers.in_use_count()
    }

    pub fn unit_size(&self) -> usize {
        self.unit_size
    }
}
