//! End-to-end channel simulation
//!
//! Drives frames from an encoder through a Bernoulli erasure channel into a
//! decoder and cross-checks every recovered unit against what was sent. The
//! codec itself never touches the RNG; randomness exists only here, in the
//! channel and in the generated data units.

use rand::prelude::*;
use rand_distr::{Bernoulli, Distribution};
use tracing::{debug, info};

use crate::decoder::{DecodeError, DecodeResults, Decoder};
use crate::encoder::Encoder;
use crate::params::{CodeRate, WindowLength};

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub rate: CodeRate,
    pub window: WindowLength,
    /// Data-unit size in bytes.
    pub unit_size: usize,
    /// Number of frames to send.
    pub frames: u32,
    /// Probability that any single frame is erased by the channel.
    pub loss_probability: f64,
    /// Fix the RNG for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            rate: CodeRate::R1_2,
            window: WindowLength::W8,
            unit_size: 2,
            frames: 10_000,
            loss_probability: 0.1,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub results: DecodeResults,
    /// Frames that survived the channel.
    pub frames_delivered: u32,
    /// Recovered units whose bytes disagree with what was sent. Always zero
    /// for a correct codec; reported rather than asserted so a broken build
    /// shows up in the output table instead of a crash.
    pub corrupt: u32,
}

impl SimulationReport {
    /// Recovery ratio in percent, the headline figure of the scheme.
    pub fn recovery_ratio(&self, frames: u32) -> f64 {
        100.0 * f64::from(self.results.recovered) / f64::from(frames)
    }
}

/// Run one simulation: encode `frames` random data units, erase frames at
/// the configured probability, decode the rest, flush, and tally.
pub fn run_simulation(config: &SimulationConfig) -> Result<SimulationReport, DecodeError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let erasure = Bernoulli::new(config.loss_probability).expect("loss probability in [0, 1]");

    let mut encoder = Encoder::new(CodeRate::R1_5, WindowLength::W64, config.unit_size);
    assert!(encoder.set(config.rate, config.window), "configured rate/window beyond maxima");
    let mut decoder = Decoder::new(config.unit_size, config.frames as usize);

    let mut sent: Vec<Vec<u8>> = Vec::with_capacity(config.frames as usize);
    let mut frames_delivered = 0;

    for fcnt in 1..=config.frames {
        let unit: Vec<u8> = (0..config.unit_size).map(|_| rng.random()).collect();
        let payload = encoder.encode(&unit, fcnt).to_vec();
        sent.push(unit);

        if erasure.sample(&mut rng) {
            debug!(fcnt, "frame erased");
            continue;
        }
        decoder.decode(&payload, fcnt)?;
        frames_delivered += 1;
    }
    decoder.flush();

    let mut corrupt = 0;
    for (index, unit) in sent.iter().enumerate() {
        if let Some(recovered) = decoder.data_unit(index) {
            if recovered != unit.as_slice() {
                corrupt += 1;
            }
        }
    }

    let results = decoder.results();
    info!(
        recovered = results.recovered,
        frames_delivered, corrupt, "simulation finished"
    );

    Ok(SimulationReport { results, frames_delivered, corrupt })
}
