//! Hard design constants of the coding scheme
//!
//! Both ends of a link must agree on these values; they are not negotiated
//! and never appear on the wire.

/// Absolute maximum window size. Generator lines are stored as 64 bits, and
/// the permanent-loss horizon is derived from this value independently of
/// the window currently configured on the encoder.
pub const MAX_WINDOW: u8 = 64;

/// Number of pending-equation slots held by the decoder.
pub const DECODING_BUFFERS: usize = 50;

/// Parity density curve `density(W) = SCALE * exp(DECAY * W) + FLOOR`.
///
/// Small windows get dense parity checks (density near 1), large windows
/// thin out towards one-in-four.
pub const DENSITY_SCALE: f64 = 0.75;
pub const DENSITY_DECAY: f64 = -0.0625;
pub const DENSITY_FLOOR: f64 = 0.25;
