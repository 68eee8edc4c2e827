//! Real-time monophonic pitch detection for mobile music apps.
//!
//! Implements the YIN algorithm described in
//! [YIN, a fundamental frequency estimator for speech and music](https://asa.scitation.org/doi/10.1121/1.1458024)
//! (de Cheveigné & Kawahara, 2002), wrapped in a streaming detector
//! that can be driven straight from an audio callback (iOS Core Audio
//! / AVAudioEngine, Android Oboe/AAudio) with arbitrarily sized sample
//! blocks. The detector reports, per analysis frame, the fundamental
//! frequency, a confidence value, the nearest equal-tempered MIDI note
//! with its name, and the offset from that note in cents.
//!
//! The implementation is built for real-time use:
//! * No memory is allocated after construction; all buffers, twiddle
//!   factors and lookup tables are set up when the detector is built.
//! * The difference function is computed in O(N log N) through an
//!   FFT-based cross-correlation with a pluggable backend (built-in
//!   radix-2, optionally Apple vDSP or FFTW3, see [`fft`]).
//! * Analyses run on overlapping frames with a 50% hop, so results
//!   refresh every `frame_size / 2` samples.
//! * Reset and reference-pitch changes are lock-free atomics that a
//!   control thread can flip while the audio thread keeps processing.
//!
//! # Examples
//! ```
//! use monopitch::{DetectorConfig, PitchDetector};
//!
//! // One frame of a pure 440 Hz tone.
//! let sample_rate = 44100;
//! let frame_size = 2048;
//! let mut chunk = vec![0.0f32; frame_size];
//! for (i, sample) in chunk.iter_mut().enumerate() {
//!     *sample =
//!         (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin();
//! }
//!
//! let config = DetectorConfig::new(sample_rate, frame_size);
//! let mut detector = PitchDetector::new(config).unwrap();
//!
//! // In an audio callback this would be one block per call; feeding a
//! // whole frame at once triggers an analysis immediately.
//! let result = detector.process(&chunk);
//! assert!(result.pitched);
//! assert!((result.frequency_hz - 440.0).abs() <= 2.0);
//! assert_eq!(result.midi_note, 69);
//! assert_eq!(result.note_name, "A4");
//! ```
//!
//! The per-frame estimator is also available directly for callers that
//! do their own frame handling:
//! ```
//! use monopitch::Yin;
//!
//! let frame_size = 2048;
//! let mut frame = vec![0.0f32; frame_size];
//! for (i, sample) in frame.iter_mut().enumerate() {
//!     *sample = (2.0 * std::f32::consts::PI * 261.63 * i as f32 / 44100.0).sin();
//! }
//!
//! let mut yin = Yin::new(44100, frame_size, 0.10).unwrap();
//! let mut workspace = vec![0.0f32; frame_size / 2];
//! let frequency = yin.detect(&frame, &mut workspace);
//! assert!((frequency - 261.63).abs() <= 3.0);
//! assert!(yin.probability() >= 0.9);
//! ```

pub mod detector;
pub mod error;
pub mod fft;
pub mod note;
pub mod yin;

pub use detector::{DetectorConfig, DetectorControls, PitchDetector, PitchResult};
pub use error::ConfigError;
pub use fft::Fft;
pub use yin::Yin;
