//! Streaming pitch detector.
//!
//! Collects arbitrarily sized sample blocks into a ring buffer, runs
//! the YIN estimator once per hop (half a frame, 50% overlap) and
//! converts the detected frequency into a MIDI note, note name and
//! cent offset. Designed to be driven from a platform audio callback:
//! after construction the `process` path performs no heap allocation,
//! takes no locks and calls no `sin`/`cos`/`exp`.
//!
//! Reset requests and reference-pitch updates arrive through atomics
//! shared with [`DetectorControls`], so a UI or control thread can
//! adjust a detector while the audio thread keeps calling
//! [`PitchDetector::process`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use atomic_float::AtomicF32;

use crate::error::ConfigError;
use crate::note;
use crate::yin::Yin;

/// Lower bound (exclusive) of the reportable pitch range in Hz.
pub const MIN_FREQUENCY_HZ: f32 = 20.0;
/// Upper bound (exclusive) of the reportable pitch range in Hz.
pub const MAX_FREQUENCY_HZ: f32 = 4200.0;
/// Lowest allowed reference pitch in Hz.
pub const MIN_REFERENCE_PITCH_HZ: f32 = 430.0;
/// Highest allowed reference pitch in Hz.
pub const MAX_REFERENCE_PITCH_HZ: f32 = 450.0;
/// Largest supported analysis frame.
pub const MAX_FRAME_SIZE: usize = 32768;

pub const DEFAULT_THRESHOLD: f32 = 0.10;
pub const DEFAULT_REFERENCE_PITCH_HZ: f32 = 440.0;

/// Detector configuration. Validated when the detector is built.
#[derive(Clone, Copy, Debug)]
pub struct DetectorConfig {
    /// Audio sample rate in Hz.
    pub sample_rate_hz: u32,
    /// Analysis frame size in samples. Powers of two keep the FFT at
    /// its minimum size.
    pub frame_size: usize,
    /// YIN acceptance threshold in `[0, 1]`; lower is stricter.
    pub threshold: f32,
    /// Frequency of A4 in Hz, in `[430, 450]`.
    pub reference_pitch_hz: f32,
}

impl DetectorConfig {
    /// Config with the default threshold (0.10) and A4 = 440 Hz.
    pub fn new(sample_rate_hz: u32, frame_size: usize) -> Self {
        DetectorConfig {
            sample_rate_hz,
            frame_size,
            threshold: DEFAULT_THRESHOLD,
            reference_pitch_hz: DEFAULT_REFERENCE_PITCH_HZ,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate_hz));
        }
        if self.frame_size <= 1 || self.frame_size > MAX_FRAME_SIZE {
            return Err(ConfigError::InvalidFrameSize(self.frame_size));
        }
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if !self.reference_pitch_hz.is_finite()
            || !(MIN_REFERENCE_PITCH_HZ..=MAX_REFERENCE_PITCH_HZ).contains(&self.reference_pitch_hz)
        {
            return Err(ConfigError::InvalidReferencePitch(self.reference_pitch_hz));
        }
        Ok(())
    }
}

/// Result of one [`PitchDetector::process`] call.
///
/// While the detector is priming, or when the latest frame had no
/// discernable pitch, `pitched` is false and every other field is
/// zero (the note name is empty).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PitchResult {
    /// True when a pitch inside the reportable range was detected.
    pub pitched: bool,
    /// Fundamental frequency in Hz.
    pub frequency_hz: f32,
    /// Confidence of the estimate, in `[0, 1]`.
    pub probability: f32,
    /// Nearest MIDI note number, clamped to `[0, 127]`.
    pub midi_note: i32,
    /// Offset from the nearest note in cents, roughly `[-50, 50]`.
    pub cents_offset: f32,
    /// Name of the nearest note, e.g. `A4` or `C#-1`.
    pub note_name: &'static str,
}

impl Default for PitchResult {
    fn default() -> Self {
        PitchResult {
            pitched: false,
            frequency_hz: 0.0,
            probability: 0.0,
            midi_note: 0,
            cents_offset: 0.0,
            note_name: "",
        }
    }
}

/// Parameters shared between the audio thread and control threads.
struct SharedParams {
    reference_pitch_hz: AtomicF32,
    reset_pending: AtomicBool,
}

/// Cloneable handle for adjusting a running detector from outside the
/// audio thread.
#[derive(Clone)]
pub struct DetectorControls {
    shared: Arc<SharedParams>,
}

impl DetectorControls {
    /// Requests a reset. The audio thread applies it at the top of its
    /// next [`PitchDetector::process`] call; the ring buffer is never
    /// touched from this thread.
    pub fn reset(&self) {
        self.shared.reset_pending.store(true, Ordering::Release);
    }

    /// Updates the reference pitch. Takes effect no later than the
    /// next hop.
    pub fn set_reference_pitch(&self, reference_pitch_hz: f32) -> Result<(), ConfigError> {
        if !reference_pitch_hz.is_finite()
            || !(MIN_REFERENCE_PITCH_HZ..=MAX_REFERENCE_PITCH_HZ).contains(&reference_pitch_hz)
        {
            return Err(ConfigError::InvalidReferencePitch(reference_pitch_hz));
        }
        self.shared
            .reference_pitch_hz
            .store(reference_pitch_hz, Ordering::Relaxed);
        Ok(())
    }

    /// Currently configured reference pitch in Hz.
    pub fn reference_pitch(&self) -> f32 {
        self.shared.reference_pitch_hz.load(Ordering::Relaxed)
    }
}

/// Streaming monophonic pitch detector.
pub struct PitchDetector {
    sample_rate_hz: u32,
    frame_size: usize,
    yin: Yin,
    /// Circular buffer of the most recent `2 * frame_size` samples.
    ring: Box<[f32]>,
    /// Contiguous scratch frame handed to the estimator.
    frame: Box<[f32]>,
    /// YIN workspace of `frame_size / 2` floats.
    workspace: Box<[f32]>,
    write_pos: usize,
    /// Saturates at `frame_size` once the first full frame arrived.
    samples_ready: usize,
    samples_since_last_hop: usize,
    last_result: PitchResult,
    shared: Arc<SharedParams>,
}

impl PitchDetector {
    /// Builds a detector from a validated config. All buffers and
    /// lookup tables are allocated here; `process` never allocates.
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let yin = Yin::new(config.sample_rate_hz, config.frame_size, config.threshold)?;
        note::warm_tables();
        Ok(PitchDetector {
            sample_rate_hz: config.sample_rate_hz,
            frame_size: config.frame_size,
            yin,
            ring: vec![0.0; 2 * config.frame_size].into_boxed_slice(),
            frame: vec![0.0; config.frame_size].into_boxed_slice(),
            workspace: vec![0.0; config.frame_size / 2].into_boxed_slice(),
            write_pos: 0,
            samples_ready: 0,
            samples_since_last_hop: 0,
            last_result: PitchResult::default(),
            shared: Arc::new(SharedParams {
                reference_pitch_hz: AtomicF32::new(config.reference_pitch_hz),
                reset_pending: AtomicBool::new(false),
            }),
        })
    }

    /// Feeds one block of mono samples and returns the most recent
    /// detection.
    ///
    /// Blocks may have any size, including zero and sizes larger than
    /// a frame. Until a full frame has accumulated the zero (not
    /// pitched) result is returned; afterwards a fresh detection runs
    /// once every `frame_size / 2` consumed samples and the previous
    /// result is repeated verbatim in between.
    pub fn process(&mut self, samples: &[f32]) -> PitchResult {
        if self.shared.reset_pending.swap(false, Ordering::AcqRel) {
            self.ring.fill(0.0);
            self.write_pos = 0;
            self.samples_ready = 0;
            self.samples_since_last_hop = 0;
            self.last_result = PitchResult::default();
        }

        let capacity = self.ring.len();
        for &sample in samples {
            self.ring[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % capacity;
        }
        self.samples_ready = (self.samples_ready + samples.len()).min(self.frame_size);
        self.samples_since_last_hop += samples.len();

        if self.samples_ready < self.frame_size {
            return self.last_result;
        }
        // 50% overlap: a new analysis only runs every half frame.
        if self.samples_since_last_hop < self.frame_size / 2 {
            return self.last_result;
        }
        self.samples_since_last_hop = 0;

        // Unwrap the newest frame_size samples into contiguous scratch.
        let start = (self.write_pos + capacity - self.frame_size) % capacity;
        let first = (capacity - start).min(self.frame_size);
        self.frame[..first].copy_from_slice(&self.ring[start..start + first]);
        self.frame[first..].copy_from_slice(&self.ring[..self.frame_size - first]);

        let frequency = self.yin.detect(&self.frame, &mut self.workspace);
        let probability = self.yin.probability();

        self.last_result = self.compose_result(frequency, probability);
        self.last_result
    }

    /// Requests a reset to the silent state; applied at the top of the
    /// next `process` call. Buffers are kept.
    pub fn reset(&self) {
        self.shared.reset_pending.store(true, Ordering::Release);
    }

    /// Updates the reference pitch; takes effect no later than the
    /// next hop.
    pub fn set_reference_pitch(&self, reference_pitch_hz: f32) -> Result<(), ConfigError> {
        self.controls().set_reference_pitch(reference_pitch_hz)
    }

    /// Currently configured reference pitch in Hz.
    pub fn reference_pitch(&self) -> f32 {
        self.shared.reference_pitch_hz.load(Ordering::Relaxed)
    }

    /// Handle for resetting the detector or changing the reference
    /// pitch from another thread.
    pub fn controls(&self) -> DetectorControls {
        DetectorControls {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Audio sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Analysis frame size in samples.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Name of the FFT backend in use.
    pub fn fft_backend_name(&self) -> &'static str {
        self.yin.fft_backend_name()
    }

    fn compose_result(&self, frequency_hz: f32, probability: f32) -> PitchResult {
        if !(frequency_hz > MIN_FREQUENCY_HZ && frequency_hz < MAX_FREQUENCY_HZ) {
            return PitchResult::default();
        }
        let reference = self.shared.reference_pitch_hz.load(Ordering::Relaxed);
        let midi_note = note::frequency_to_midi(frequency_hz, reference);
        let nearest_hz = note::midi_to_frequency(midi_note, reference);
        PitchResult {
            pitched: true,
            frequency_hz,
            probability,
            midi_note,
            cents_offset: note::cents_between(nearest_hz, frequency_hz),
            note_name: note::midi_note_name(midi_note),
        }
    }
}
