//! Encoder → lossy channel → decoder scenarios
//!
//! Loss patterns are fixed, so the exact recovery phase of every data unit
//! is deterministic; the expectations below are frozen and double as
//! interoperability vectors for the scheme.

use rustydare::{CodeRate, Decoder, Encoder, WindowLength};

/// Encode `frames` data units, drop the listed frame counters, decode the
/// rest in order, flush, and return the decoder plus what was sent.
fn run_stream(
    rate: CodeRate,
    window: WindowLength,
    frames: u32,
    drop: &[u32],
    data: impl Fn(u32) -> Vec<u8>,
) -> (Decoder, Vec<Vec<u8>>) {
    let unit_size = data(1).len();
    let mut encoder = Encoder::new(CodeRate::R1_5, WindowLength::W64, unit_size);
    assert!(encoder.set(rate, window));
    let mut decoder = Decoder::new(unit_size, frames as usize);

    let mut sent = Vec::new();
    for fcnt in 1..=frames {
        let unit = data(fcnt);
        let payload = encoder.encode(&unit, fcnt).to_vec();
        sent.push(unit);
        if !drop.contains(&fcnt) {
            decoder.decode(&payload, fcnt).unwrap();
        }
    }
    decoder.flush();
    (decoder, sent)
}

fn assert_recovered_match(decoder: &Decoder, sent: &[Vec<u8>]) {
    for (index, unit) in sent.iter().enumerate() {
        if let Some(recovered) = decoder.data_unit(index) {
            assert_eq!(recovered, unit.as_slice(), "unit {} corrupted", index);
        }
    }
}

#[test]
fn lossless_run_is_pure_phase_one() {
    let (decoder, sent) =
        run_stream(CodeRate::R1_2, WindowLength::W8, 10, &[], |f| vec![f as u8, 0xaa]);
    let results = decoder.results();
    assert_eq!(results.recovered, 10);
    assert_eq!(results.phase_counts, [10, 0, 0, 0, 0]);
    assert_eq!(results.mean_delay, 0.0);
    assert_eq!(results.delay_variance, 0.0);
    assert_recovered_match(&decoder, &sent);
}

#[test]
fn single_dropped_frame_recovers_from_the_next_parity() {
    let (decoder, sent) =
        run_stream(CodeRate::R1_2, WindowLength::W8, 10, &[3], |f| vec![f as u8, f as u8 + 1]);
    let results = decoder.results();
    assert_eq!(results.recovered, 10);
    assert_eq!(results.phase_counts, [9, 1, 0, 0, 0]);
    assert_eq!(decoder.delay(2), Some(1));
    assert_recovered_match(&decoder, &sent);
}

#[test]
fn two_separated_losses_recover_with_extra_parity() {
    let (decoder, sent) =
        run_stream(CodeRate::R1_3, WindowLength::W8, 10, &[3, 5], |f| vec![f as u8, f as u8 + 1]);
    let results = decoder.results();
    assert_eq!(results.recovered, 10);
    assert_eq!(results.phase_counts, [8, 2, 0, 0, 0]);
    assert_eq!(decoder.delay(2), Some(1));
    assert_eq!(decoder.delay(4), Some(1));
    assert_recovered_match(&decoder, &sent);
}

#[test]
fn adjacent_losses_need_the_buffered_equation() {
    let (decoder, sent) =
        run_stream(CodeRate::R1_2, WindowLength::W8, 12, &[3, 4], |f| vec![f as u8, f as u8 + 1]);
    let results = decoder.results();
    assert_eq!(results.recovered, 12);
    // one unit falls out of a fresh parity check, the other out of the
    // buffered equation it unlocks
    assert_eq!(results.phase_counts, [10, 1, 1, 0, 0]);
    assert_eq!(decoder.delay(2), Some(3));
    assert_eq!(decoder.delay(3), Some(2));
    assert_recovered_match(&decoder, &sent);
}

#[test]
fn loss_burst_is_solved_by_elimination() {
    let (decoder, sent) = run_stream(
        CodeRate::R1_2,
        WindowLength::W8,
        12,
        &[3, 4, 5],
        |f| vec![f as u8, f as u8 + 1],
    );
    let results = decoder.results();
    assert_eq!(results.recovered, 12);
    // no parity check comes down to a single unknown on its own; all three
    // units fall out of the GF(2) elimination during normal processing
    assert_eq!(results.phase_counts, [9, 0, 0, 3, 0]);
    assert_recovered_match(&decoder, &sent);
}

#[test]
fn burst_longer_than_the_window_loses_units() {
    let drop: Vec<u32> = (5..=14).collect();
    let (decoder, sent) = run_stream(
        CodeRate::R1_2,
        WindowLength::W4,
        40,
        &drop,
        |f| vec![f as u8, (f >> 1) as u8],
    );
    let results = decoder.results();
    // a burst of 10 against W = 4: later windows cannot reach back across
    // the burst, so most of it is gone for good
    assert_eq!(results.recovered, 32);
    assert_eq!(results.phase_counts, [30, 1, 1, 0, 0]);
    for index in 0..4 {
        assert!(decoder.is_received(index), "unit {} before the burst", index);
    }
    for index in 14..40 {
        assert!(decoder.is_received(index), "unit {} after the burst", index);
    }
    assert_eq!((0..40).filter(|&i| !decoder.is_received(i)).count(), 8);
    assert_recovered_match(&decoder, &sent);
}

#[test]
fn sustained_alternating_loss_at_full_window() {
    let drop: Vec<u32> = (2..200).step_by(2).collect();
    let unit_size = 2;
    let mut encoder = Encoder::new(CodeRate::R1_5, WindowLength::W64, unit_size);
    assert!(encoder.set(CodeRate::R1_2, WindowLength::W64));
    let mut decoder = Decoder::new(unit_size, 300);

    let mut sent = Vec::new();
    for fcnt in 1..=300u32 {
        let unit = vec![fcnt as u8, (fcnt * 7) as u8];
        let payload = encoder.encode(&unit, fcnt).to_vec();
        sent.push(unit);
        if !drop.contains(&fcnt) {
            decoder.decode(&payload, fcnt).unwrap();
        }
        assert!(decoder.pending_equations() <= 50);
    }
    decoder.flush();

    let results = decoder.results();
    assert_eq!(results.recovered, 279);
    assert_eq!(results.phase_counts, [201, 7, 4, 67, 0]);
    assert_eq!(results.phase_counts.iter().sum::<u32>(), results.recovered);
    assert_eq!(results.permanently_lost, 21);
    assert_recovered_match(&decoder, &sent);
}

#[test]
fn header_parameters_may_change_per_frame() {
    // the decoder reads R and W from each header; switch mid-stream and keep
    // recovering
    let unit_size = 2;
    let mut encoder = Encoder::new(CodeRate::R1_5, WindowLength::W64, unit_size);
    let mut decoder = Decoder::new(unit_size, 30);

    let mut sent = Vec::new();
    for fcnt in 1..=30u32 {
        if fcnt == 15 {
            assert!(encoder.set(CodeRate::R1_3, WindowLength::W16));
        } else if fcnt == 1 {
            assert!(encoder.set(CodeRate::R1_2, WindowLength::W8));
        }
        let unit = vec![fcnt as u8, fcnt as u8 ^ 0x5a];
        let payload = encoder.encode(&unit, fcnt).to_vec();
        sent.push(unit);
        if fcnt != 10 && fcnt != 20 {
            decoder.decode(&payload, fcnt).unwrap();
        }
    }
    decoder.flush();

    let results = decoder.results();
    assert_eq!(results.recovered, 30);
    assert_recovered_match(&decoder, &sent);
}

#[test]
fn zero_window_never_recovers_losses() {
    let (decoder, sent) =
        run_stream(CodeRate::R1_2, WindowLength::W0, 10, &[4, 7], |f| vec![f as u8, 0x11]);
    let results = decoder.results();
    assert_eq!(results.recovered, 8);
    assert_eq!(results.phase_counts, [8, 0, 0, 0, 0]);
    assert!(!decoder.is_received(3));
    assert!(!decoder.is_received(6));
    assert_recovered_match(&decoder, &sent);
}
