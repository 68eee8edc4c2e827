//! Equal-temperament note conversions.
//!
//! Maps frequencies to [MIDI note numbers](https://en.wikipedia.org/wiki/MIDI_tuning_standard)
//! (69 = A4 at the reference pitch), note names and cent offsets. The
//! name table lives in constant storage and the semitone ratio table
//! is built once, so the audio thread does no string formatting and no
//! `powf`.

use once_cell::sync::Lazy;

/// MIDI note number of A4.
pub const A4_MIDI: i32 = 69;

/// Names for all 128 MIDI notes, from C-1 (0) to G9 (127).
pub const NOTE_NAMES: [&str; 128] = [
    "C-1", "C#-1", "D-1", "D#-1", "E-1", "F-1", "F#-1", "G-1", "G#-1", "A-1", "A#-1", "B-1",
    "C0", "C#0", "D0", "D#0", "E0", "F0", "F#0", "G0", "G#0", "A0", "A#0", "B0",
    "C1", "C#1", "D1", "D#1", "E1", "F1", "F#1", "G1", "G#1", "A1", "A#1", "B1",
    "C2", "C#2", "D2", "D#2", "E2", "F2", "F#2", "G2", "G#2", "A2", "A#2", "B2",
    "C3", "C#3", "D3", "D#3", "E3", "F3", "F#3", "G3", "G#3", "A3", "A#3", "B3",
    "C4", "C#4", "D4", "D#4", "E4", "F4", "F#4", "G4", "G#4", "A4", "A#4", "B4",
    "C5", "C#5", "D5", "D#5", "E5", "F5", "F#5", "G5", "G#5", "A5", "A#5", "B5",
    "C6", "C#6", "D6", "D#6", "E6", "F6", "F#6", "G6", "G#6", "A6", "A#6", "B6",
    "C7", "C#7", "D7", "D#7", "E7", "F7", "F#7", "G7", "G#7", "A7", "A#7", "B7",
    "C8", "C#8", "D8", "D#8", "E8", "F8", "F#8", "G8", "G#8", "A8", "A#8", "B8",
    "C9", "C#9", "D9", "D#9", "E9", "F9", "F#9", "G9",
];

/// `2^((midi - 69) / 12)` for every MIDI note. Multiplying by the
/// reference pitch gives the note's equal-tempered frequency.
static SEMITONE_RATIOS: Lazy<[f32; 128]> = Lazy::new(|| {
    let mut ratios = [0.0f32; 128];
    for (midi, ratio) in ratios.iter_mut().enumerate() {
        *ratio = 2.0f32.powf((midi as i32 - A4_MIDI) as f32 / 12.0);
    }
    ratios
});

/// Forces the lazily built ratio table so later lookups on the audio
/// thread are plain loads.
pub(crate) fn warm_tables() {
    Lazy::force(&SEMITONE_RATIOS);
}

/// Nearest MIDI note for a frequency, clamped to `[0, 127]`.
/// Non-positive frequencies map to 0.
pub fn frequency_to_midi(frequency_hz: f32, reference_pitch_hz: f32) -> i32 {
    if frequency_hz <= 0.0 {
        return 0;
    }
    let midi = 12.0 * (frequency_hz / reference_pitch_hz).log2() + A4_MIDI as f32;
    (midi.round() as i32).clamp(0, 127)
}

/// Equal-tempered frequency of a MIDI note at the given reference
/// pitch.
pub fn midi_to_frequency(midi_note: i32, reference_pitch_hz: f32) -> f32 {
    let index = midi_note.clamp(0, 127) as usize;
    reference_pitch_hz * SEMITONE_RATIOS[index]
}

/// Signed distance in [cents](https://en.wikipedia.org/wiki/Cent_%28music%29)
/// from `reference_hz` up to `actual_hz`.
pub fn cents_between(reference_hz: f32, actual_hz: f32) -> f32 {
    if reference_hz <= 0.0 || actual_hz <= 0.0 {
        return 0.0;
    }
    1200.0 * (actual_hz / reference_hz).log2()
}

/// Name of a MIDI note, e.g. `A4` or `C#-1`.
pub fn midi_note_name(midi_note: i32) -> &'static str {
    NOTE_NAMES[midi_note.clamp(0, 127) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_table_matches_pitch_class_and_octave() {
        const PITCH_CLASSES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        for midi in 0..128usize {
            let expected = format!("{}{}", PITCH_CLASSES[midi % 12], (midi / 12) as i32 - 1);
            assert_eq!(NOTE_NAMES[midi], expected);
            assert!(NOTE_NAMES[midi].len() <= 7);
        }
    }

    #[test]
    fn a4_maps_to_69() {
        assert_eq!(frequency_to_midi(440.0, 440.0), 69);
        assert_eq!(midi_note_name(69), "A4");
        assert!((midi_to_frequency(69, 440.0) - 440.0).abs() <= 1e-3);
        assert!((midi_to_frequency(69, 432.0) - 432.0).abs() <= 1e-3);
    }

    #[test]
    fn middle_c_maps_to_60() {
        assert_eq!(frequency_to_midi(261.63, 440.0), 60);
        assert_eq!(midi_note_name(60), "C4");
    }

    #[test]
    fn midi_number_is_clamped() {
        assert_eq!(frequency_to_midi(4.0, 440.0), 0);
        assert_eq!(frequency_to_midi(30000.0, 440.0), 127);
        assert_eq!(frequency_to_midi(-10.0, 440.0), 0);
        assert_eq!(midi_note_name(-3), "C-1");
        assert_eq!(midi_note_name(200), "G9");
    }

    #[test]
    fn cents_are_signed_and_logarithmic() {
        assert!(cents_between(440.0, 440.0).abs() <= 1e-4);
        // One semitone is 100 cents.
        let semitone_up = cents_between(440.0, midi_to_frequency(70, 440.0));
        assert!((semitone_up - 100.0).abs() <= 0.01);
        let semitone_down = cents_between(440.0, midi_to_frequency(68, 440.0));
        assert!((semitone_down + 100.0).abs() <= 0.01);
        assert_eq!(cents_between(0.0, 440.0), 0.0);
    }

    #[test]
    fn midi_mapping_holds_across_reference_pitches() {
        for &reference in &[430.0f32, 432.0, 440.0, 444.0, 450.0] {
            for midi in 20..110 {
                let frequency = midi_to_frequency(midi, reference);
                assert_eq!(frequency_to_midi(frequency, reference), midi);
            }
        }
    }
}
