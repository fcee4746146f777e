//! GF(2) elimination over the pending equations
//!
//! When peeling stalls, the remaining equations are row-reduced as a bit
//! matrix over the span of data units they reference. Reduction is coupled:
//! every XOR of two bit rows also XORs the matching residual byte rows, so
//! each row keeps asserting `residual = ⊕ d[referenced units]` throughout.
//! Rows that come out with a single set bit are solved data units; the rest
//! are re-admitted in compacted form (or discarded on flush).

use bitvec::prelude::*;
use tracing::{debug, trace};

use super::buffer::{span_to_line, EquationBuffer};
use super::stats::RecoveryPhase;
use super::storage::RecoveryStore;
use super::xor_bytes;
use crate::constants::MAX_WINDOW;

/// One matrix row: equation bits over `width` columns, coupled residual.
struct Row {
    bits: BitVec,
    residual: Vec<u8>,
}

/// Word-parallel XOR of two equal-length bit rows.
fn xor_bits(dst: &mut BitVec, src: &BitVec) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.as_raw_mut_slice().iter_mut().zip(src.as_raw_slice()) {
        *d ^= *s;
    }
}

/// Row-reduce the in-use equations and extract whatever became solvable.
///
/// `fcnt` anchors the permanent-loss horizon and the recovery delay. With
/// `flush` set (end of stream) nothing is re-admitted and the recovery phase
/// is tagged [`RecoveryPhase::FlushElimination`].
pub(crate) fn eliminate(
    buffers: &mut EquationBuffer,
    store: &mut RecoveryStore,
    flush: bool,
    fcnt: u32,
) {
    let height = buffers.in_use_count();
    if height == 0 {
        return;
    }
    if height == 1 {
        // a lone equation cannot form a solvable system; at flush it is
        // dead weight and gets dropped
        if flush {
            buffers.clear_all();
        }
        return;
    }

    // Span of data-unit indices (0-based) referenced by any equation.
    let mut oldest = usize::MAX;
    let mut newest = 0usize;
    for slot in buffers.slots().iter().filter(|slot| slot.in_use) {
        for offset in 1..=slot.window as usize {
            if slot.line[offset - 1] {
                let index = slot.fcnt as usize - 1 - offset;
                oldest = oldest.min(index);
                newest = newest.max(index);
            }
        }
    }
    let width = newest - oldest + 1;
    trace!(height, width, oldest, newest, "reducing pending equations");

    let mut rows: Vec<Row> = Vec::with_capacity(height);
    for slot in buffers.slots().iter().filter(|slot| slot.in_use) {
        let mut bits = bitvec![0; width];
        for offset in 1..=slot.window as usize {
            if slot.line[offset - 1] {
                bits.set(slot.fcnt as usize - 1 - offset - oldest, true);
            }
        }
        rows.push(Row { bits, residual: slot.residual.clone() });
    }

    // Gauss-Jordan over GF(2), byte rows coupled to every row operation.
    let mut i = 0;
    let mut j = 0;
    while i < height && j < width {
        let Some(pivot) = (i..height).find(|&a| rows[a].bits[j]) else {
            j += 1;
            continue;
        };
        rows.swap(i, pivot);
        let pivot_bits = rows[i].bits.clone();
        let pivot_residual = rows[i].residual.clone();
        for a in 0..height {
            if a != i && rows[a].bits[j] {
                xor_bits(&mut rows[a].bits, &pivot_bits);
                xor_bytes(&mut rows[a].residual, &pivot_residual);
            }
        }
        i += 1;
        j += 1;
    }

    // Extract single-bit rows until none remain; each solved unit cancels
    // its column from every other row.
    let phase = if flush { RecoveryPhase::FlushElimination } else { RecoveryPhase::Elimination };
    loop {
        let Some(e) = rows.iter().position(|row| row.bits.count_ones() == 1) else {
            break;
        };
        let column = rows[e].bits.first_one().expect("row has one bit");
        store.store((oldest + column + 1) as u32, &rows[e].residual, fcnt, phase);
        rows[e].bits.set(column, false);
        let solved = rows[e].residual.clone();
        for row in rows.iter_mut() {
            if row.bits[column] {
                row.bits.set(column, false);
                xor_bytes(&mut row.residual, &solved);
            }
        }
    }

    buffers.clear_all();
    if flush {
        return;
    }

    // Re-admit what still carries information, compacted to its span. An
    // equation whose oldest referenced unit already fell behind the maximum
    // window can never be completed by a future parity check.
    let oldest_receivable = (fcnt as usize - 1).saturating_sub(MAX_WINDOW as usize);
    for row in &rows {
        let Some(first) = row.bits.first_one() else {
            continue;
        };
        let last = row.bits.last_one().expect("row is non-empty");
        if oldest + first < oldest_receivable {
            store.note_permanent_loss(oldest + first);
            continue;
        }
        let (window, line) = span_to_line(&row.bits, first, last);
        buffers.admit((oldest + last + 2) as u32, window, &line, &row.residual);
        debug!(
            fcnt = oldest + last + 2,
            window,
            "reduced equation re-admitted"
        );
    }
}
