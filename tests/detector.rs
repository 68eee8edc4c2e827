//! End-to-end tests for the streaming detector, driven the way a
//! platform audio callback would drive it.

use monopitch::{DetectorConfig, PitchDetector};

fn make_sine(frequency_hz: f32, sample_rate: u32, sample_count: usize) -> Vec<f32> {
    let mut buffer = vec![0.0; sample_count];
    for (i, sample) in buffer.iter_mut().enumerate() {
        *sample =
            (2.0 * std::f32::consts::PI * frequency_hz * i as f32 / sample_rate as f32).sin();
    }
    buffer
}

fn detector(sample_rate: u32, frame_size: usize) -> PitchDetector {
    PitchDetector::new(DetectorConfig::new(sample_rate, frame_size)).unwrap()
}

#[test]
fn detects_reference_sines_within_three_hz() {
    // Frame sizes chosen so at least 10 periods fit.
    for &(frequency, frame_size) in &[
        (82.407f32, 4096usize),
        (261.63, 2048),
        (440.0, 2048),
        (523.25, 2048),
    ] {
        let mut detector = detector(44100, frame_size);
        let sine = make_sine(frequency, 44100, frame_size);
        let result = detector.process(&sine);
        assert!(result.pitched, "{} Hz not detected", frequency);
        assert!(
            (result.frequency_hz - frequency).abs() <= 3.0,
            "{} Hz detected as {} Hz",
            frequency,
            result.frequency_hz
        );
        assert!(result.probability >= 0.9);
    }
}

#[test]
fn a4_yields_midi_69_and_name() {
    let mut detector = detector(44100, 2048);
    let result = detector.process(&make_sine(440.0, 44100, 2048));
    assert!(result.pitched);
    assert!((result.frequency_hz - 440.0).abs() <= 2.0);
    assert_eq!(result.midi_note, 69);
    assert_eq!(result.note_name, "A4");
    assert!(result.cents_offset.abs() <= 5.0);
}

#[test]
fn middle_c_yields_midi_60_and_name() {
    let mut detector = detector(44100, 2048);
    let result = detector.process(&make_sine(261.63, 44100, 2048));
    assert!(result.pitched);
    assert_eq!(result.midi_note, 60);
    assert_eq!(result.note_name, "C4");
}

#[test]
fn reference_pitch_432_centers_a4() {
    let config = DetectorConfig {
        reference_pitch_hz: 432.0,
        ..DetectorConfig::new(44100, 2048)
    };
    let mut detector = PitchDetector::new(config).unwrap();
    let result = detector.process(&make_sine(432.0, 44100, 2048));
    assert!(result.pitched);
    assert_eq!(result.midi_note, 69);
    assert_eq!(result.note_name, "A4");
    assert!(result.cents_offset.abs() <= 0.1);
}

#[test]
fn incremental_blocks_detect_after_priming() {
    let mut detector = detector(44100, 2048);
    let silence = vec![0.0; 256];
    let sine = make_sine(440.0, 44100, 8 * 256);

    let mut result = detector.process(&silence);
    for _ in 1..8 {
        result = detector.process(&silence);
    }
    // A full frame of silence: analysis ran, nothing pitched.
    assert!(!result.pitched);

    for block in sine.chunks(256) {
        result = detector.process(block);
    }
    // The newest full frame is pure sine by now.
    assert!(result.pitched);
    assert!((result.frequency_hz - 440.0).abs() <= 2.0);
}

#[test]
fn reset_then_half_frame_is_unpitched() {
    let mut detector = detector(44100, 2048);
    let sine = make_sine(440.0, 44100, 2048);
    assert!(detector.process(&sine).pitched);

    detector.reset();
    let result = detector.process(&sine[..1024]);
    assert!(!result.pitched);
    assert_eq!(result.frequency_hz, 0.0);
}

#[test]
fn hop_gating_returns_identical_results() {
    let mut detector = detector(44100, 2048);
    let sine = make_sine(440.0, 44100, 4096);
    let detected = detector.process(&sine[..2048]);
    assert!(detected.pitched);

    // Three short blocks totalling fewer than 1024 samples: each call
    // must return the previous result with every field unchanged.
    let mut offset = 2048;
    for &block in &[256usize, 256, 511] {
        let repeated = detector.process(&sine[offset..offset + block]);
        assert_eq!(repeated, detected);
        offset += block;
    }
}

#[test]
fn backend_equivalence_and_override() {
    // FFT_BACKEND=manual must select the built-in backend and detect
    // identically to the default selection on a machine without
    // optional backends compiled in.
    std::env::set_var("FFT_BACKEND", "manual");
    let mut manual = detector(44100, 2048);
    assert_eq!(manual.fft_backend_name(), "radix2");
    std::env::remove_var("FFT_BACKEND");

    let mut auto = detector(44100, 2048);
    let sine = make_sine(440.0, 44100, 2048);
    let manual_result = manual.process(&sine);
    let auto_result = auto.process(&sine);
    assert!(manual_result.pitched && auto_result.pitched);
    assert!((manual_result.frequency_hz - auto_result.frequency_hz).abs() <= 1e-3);
}

#[test]
fn separate_detectors_are_independent() {
    let mut low = detector(44100, 4096);
    let mut high = detector(44100, 2048);
    let low_result = low.process(&make_sine(82.407, 44100, 4096));
    let high_result = high.process(&make_sine(523.25, 44100, 2048));
    assert!((low_result.frequency_hz - 82.407).abs() <= 3.0);
    assert!((high_result.frequency_hz - 523.25).abs() <= 3.0);
}
