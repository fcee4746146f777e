//! Bounded set of pending parity equations
//!
//! Each slot holds one equation `residual = ⊕ d[fcnt − 1 − (j+1)]` over the
//! set bits `j` of its generator line. Slots are preallocated; admission and
//! eviction only rewrite slot contents and flip the `in_use` flag, so the
//! decoder does no per-frame heap work here.

use bitvec::prelude::*;
use tracing::debug;

use crate::constants::DECODING_BUFFERS;
use crate::generator::GeneratorLine;

pub(crate) struct PendingEquation {
    pub(crate) in_use: bool,
    /// Frame counter the line offsets are anchored to: bit `j` of the line
    /// selects the unit `j + 1` frames behind `fcnt`, newest first.
    pub(crate) fcnt: u32,
    /// Number of leading line bits that are meaningful.
    pub(crate) window: u8,
    pub(crate) line: GeneratorLine,
    pub(crate) residual: Vec<u8>,
}

pub(crate) struct EquationBuffer {
    slots: Vec<PendingEquation>,
}

impl EquationBuffer {
    pub(crate) fn new(unit_size: usize) -> EquationBuffer {
        let slots = (0..DECODING_BUFFERS)
            .map(|_| PendingEquation {
                in_use: false,
                fcnt: 0,
                window: 0,
                line: GeneratorLine::ZERO,
                residual: vec![0; unit_size],
            })
            .collect();
        EquationBuffer { slots }
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [PendingEquation] {
        &mut self.slots
    }

    pub(crate) fn slots(&self) -> &[PendingEquation] {
        &self.slots
    }

    pub(crate) fn in_use_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.in_use).count()
    }

    pub(crate) fn clear_all(&mut self) {
        for slot in &mut self.slots {
            slot.in_use = false;
        }
    }

    /// Admit a pending equation into the first unused slot. With every slot
    /// occupied, the slot holding the oldest equation by `fcnt` is rewritten
    /// instead: the oldest equation references the oldest data units and has
    /// the weakest chance of ever being solved. The drop is silent.
    pub(crate) fn admit(&mut self, fcnt: u32, window: u8, line: &GeneratorLine, residual: &[u8]) {
        let slot_index = match self.slots.iter().position(|slot| !slot.in_use) {
            Some(free) => free,
            None => {
                let mut oldest = 0;
                for (i, slot) in self.slots.iter().enumerate() {
                    if slot.fcnt < self.slots[oldest].fcnt {
                        oldest = i;
                    }
                }
                debug!(evicted_fcnt = self.slots[oldest].fcnt, "buffer full, evicting oldest equation");
                oldest
            }
        };

        let slot = &mut self.slots[slot_index];
        slot.in_use = true;
        slot.fcnt = fcnt;
        slot.window = window;
        slot.line = GeneratorLine::ZERO;
        slot.line[..window as usize].copy_from_bitslice(&line[..window as usize]);
        slot.residual.copy_from_slice(residual);
    }
}

/// Re-express a reduced solver row as a generator line.
///
/// A solver row spans data-unit indices `oldest + first ..= oldest + last`
/// with bit `t` meaning unit `oldest + first + t`, oldest first. The wire
/// convention anchors a line to a frame counter with index 0 meaning the
/// *newest* referenced unit, one behind `fcnt`. Both admission paths (fresh
/// parity checks and reinserted rows) must produce the same convention, so
/// the reversal lives here and nowhere else.
///
/// Returns the window size and line for an equation anchored at
/// `fcnt = oldest + last + 2`.
pub(crate) fn span_to_line(row: &BitSlice, first: usize, last: usize) -> (u8, GeneratorLine) {
    let window = last - first + 1;
    let mut line = GeneratorLine::ZERO;
    for t in 0..window {
        if row[first + t] {
            line.set(window - 1 - t, true);
        }
    }
    (window as u8, line)
}
