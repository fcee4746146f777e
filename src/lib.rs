//! DaRe (Data Recovery) erasure coding for constrained uplink telemetry
//!
//! This crate implements the DaRe forward-erasure-correction layer for lossy,
//! one-way, low-throughput radio links (the canonical deployment is LoRaWAN
//! class-A uplinks, but nothing here depends on the transport).
//!
//! **Encoding**: every frame carries the current data unit plus R−1 parity
//! checks, each the XOR of a pseudo-randomly selected subset of the last W
//! data units. The selection is recomputed from frame metadata on both ends,
//! so no generator line is ever transmitted.
//!
//! **Decoding**: missed data units are rebuilt from later parity-bearing
//! frames by iterative peeling, backed by Gaussian elimination over GF(2)
//! against a bounded buffer of pending parity equations.

pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod generator;
pub mod params;
pub mod prng;
pub mod simulation;
pub mod tracing_init;

pub use decoder::{DecodeError, DecodeResults, Decoder, RecoveryPhase};
pub use encoder::Encoder;
pub use params::{CodeRate, WindowLength};
