//! Error types.

use thiserror::Error;

/// Errors reported by construction-time validation.
///
/// The real-time path never returns an error. Degenerate input
/// (silence, noise, NaN samples) is reported in-band through
/// [`PitchResult::pitched`](crate::PitchResult#structfield.pitched).
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("sample_rate must be > 0, got {0}")]
    InvalidSampleRate(u32),

    #[error("frame_size must be in (1, 32768], got {0}")]
    InvalidFrameSize(usize),

    #[error("threshold must be finite and in [0, 1], got {0}")]
    InvalidThreshold(f32),

    #[error("reference_pitch_hz must be finite and in [430, 450], got {0}")]
    InvalidReferencePitch(f32),

    #[error("fft length must be a power of two, got {0}")]
    InvalidFftLength(usize),
}
