//! C ABI for the monopitch detector.
//!
//! This is the surface the iOS and Android bridges link against: an
//! opaque handle with paired create/destroy, a flat `#[repr(C)]`
//! result struct and a process call that can be invoked directly from
//! the platform audio callback. Null handles, null sample pointers and
//! non-positive sample counts yield a zeroed result rather than
//! undefined behavior, and panics never unwind across the boundary.

mod crash;
mod logging;

use std::os::raw::{c_char, c_int};
use std::panic::{catch_unwind, AssertUnwindSafe};

use log::{debug, error, info, trace};
use monopitch::{DetectorConfig, PitchDetector, PitchResult};

pub use crash::mp_pitch_detector_install_crash_handlers;
pub use logging::{
    mp_pitch_detector_set_log_callback, MpLogCallback, MP_LOG_LEVEL_DEBUG, MP_LOG_LEVEL_ERROR,
    MP_LOG_LEVEL_INFO, MP_LOG_LEVEL_TRACE,
};

/// Bytes reserved for the note name, including the null terminator.
pub const MP_NOTE_NAME_SIZE: usize = 8;

/// The widest block `mp_pitch_detector_process` accepts, as a multiple
/// of the frame size.
const MAX_PROCESS_SAMPLES_MULTIPLIER: usize = 2;

/// Detection result as seen across the C ABI.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct MpPitchResult {
    /// 1 when a pitch was detected, 0 otherwise.
    pub pitched: c_int,
    /// Fundamental frequency in Hz; 0 when not pitched.
    pub frequency: f32,
    /// Confidence in [0, 1]; 0 when not pitched.
    pub probability: f32,
    /// Nearest MIDI note number in [0, 127]; 0 when not pitched.
    pub midi_note: i32,
    /// Offset from the nearest note in cents; 0 when not pitched.
    pub cents_offset: f32,
    /// Null-terminated ASCII note name, e.g. "A4".
    pub note_name: [c_char; MP_NOTE_NAME_SIZE],
}

impl MpPitchResult {
    fn zeroed() -> Self {
        MpPitchResult {
            pitched: 0,
            frequency: 0.0,
            probability: 0.0,
            midi_note: 0,
            cents_offset: 0.0,
            note_name: [0; MP_NOTE_NAME_SIZE],
        }
    }

    fn from_result(result: &PitchResult) -> Self {
        let mut out = MpPitchResult::zeroed();
        out.pitched = result.pitched as c_int;
        out.frequency = result.frequency_hz;
        out.probability = result.probability;
        out.midi_note = result.midi_note;
        out.cents_offset = result.cents_offset;
        let name = result.note_name.as_bytes();
        let length = name.len().min(MP_NOTE_NAME_SIZE - 1);
        for (slot, &byte) in out.note_name.iter_mut().zip(name[..length].iter()) {
            *slot = byte as c_char;
        }
        out
    }
}

/// Opaque detector handle.
pub struct MpPitchDetector {
    detector: PitchDetector,
    max_process_samples: usize,
}

/// Creates a detector with A4 = 440 Hz. Returns null on invalid
/// arguments (an ERROR diagnostic is emitted).
#[no_mangle]
pub extern "C" fn mp_pitch_detector_create(
    sample_rate: c_int,
    frame_size: c_int,
    threshold: f32,
) -> *mut MpPitchDetector {
    mp_pitch_detector_create_with_reference_pitch(sample_rate, frame_size, threshold, 440.0)
}

/// Creates a detector with an explicit reference pitch in [430, 450]
/// Hz. Returns null on invalid arguments.
#[no_mangle]
pub extern "C" fn mp_pitch_detector_create_with_reference_pitch(
    sample_rate: c_int,
    frame_size: c_int,
    threshold: f32,
    reference_pitch_hz: f32,
) -> *mut MpPitchDetector {
    logging::ensure_logger();
    if sample_rate <= 0 || frame_size <= 1 {
        error!(
            "mp_pitch_detector_create: invalid arguments: sample_rate={} frame_size={}",
            sample_rate, frame_size
        );
        return std::ptr::null_mut();
    }
    let config = DetectorConfig {
        sample_rate_hz: sample_rate as u32,
        frame_size: frame_size as usize,
        threshold,
        reference_pitch_hz,
    };
    match catch_unwind(|| PitchDetector::new(config)) {
        Ok(Ok(detector)) => {
            info!(
                "mp_pitch_detector_create: sample_rate={} frame_size={} threshold={:.3} reference_pitch_hz={:.2} fft_backend={}",
                sample_rate,
                frame_size,
                threshold,
                reference_pitch_hz,
                detector.fft_backend_name()
            );
            Box::into_raw(Box::new(MpPitchDetector {
                detector,
                max_process_samples: frame_size as usize * MAX_PROCESS_SAMPLES_MULTIPLIER,
            }))
        }
        Ok(Err(err)) => {
            error!("mp_pitch_detector_create: {err}");
            std::ptr::null_mut()
        }
        Err(_) => {
            error!("mp_pitch_detector_create: panic during construction");
            std::ptr::null_mut()
        }
    }
}

/// Destroys a detector. Null is ignored; destroying the same handle
/// twice is undefined.
///
/// # Safety
/// `handle` must be null or a pointer previously returned by one of
/// the create functions and not yet destroyed.
#[no_mangle]
pub unsafe extern "C" fn mp_pitch_detector_destroy(handle: *mut MpPitchDetector) {
    if handle.is_null() {
        return;
    }
    debug!("mp_pitch_detector_destroy");
    drop(Box::from_raw(handle));
}

/// Requests a reset to the silent state; applied at the start of the
/// next process call. Safe to call from any thread.
///
/// # Safety
/// `handle` must be null or a live detector handle.
#[no_mangle]
pub unsafe extern "C" fn mp_pitch_detector_reset(handle: *mut MpPitchDetector) {
    let Some(state) = handle.as_ref() else {
        return;
    };
    trace!("mp_pitch_detector_reset");
    state.detector.reset();
}

/// Updates the reference pitch. Returns 1 on success, 0 when the value
/// is out of range or the handle is null. Safe to call while the audio
/// thread is processing.
///
/// # Safety
/// `handle` must be null or a live detector handle.
#[no_mangle]
pub unsafe extern "C" fn mp_pitch_detector_set_reference_pitch(
    handle: *mut MpPitchDetector,
    reference_pitch_hz: f32,
) -> c_int {
    let Some(state) = handle.as_ref() else {
        return 0;
    };
    match state.detector.set_reference_pitch(reference_pitch_hz) {
        Ok(()) => {
            info!("mp_pitch_detector_set_reference_pitch: {:.2}", reference_pitch_hz);
            1
        }
        Err(err) => {
            error!("mp_pitch_detector_set_reference_pitch: {err}");
            0
        }
    }
}

/// Feeds a block of mono samples and returns the most recent
/// detection. A null handle, null sample pointer or non-positive
/// `num_samples` yields a zeroed result without touching the pointer;
/// blocks larger than twice the frame size are rejected with an ERROR
/// diagnostic.
///
/// # Safety
/// `handle` must be null or a live detector handle, and `samples`
/// must be null or point to at least `num_samples` readable floats.
/// Must not be called concurrently with itself on the same handle.
#[no_mangle]
pub unsafe extern "C" fn mp_pitch_detector_process(
    handle: *mut MpPitchDetector,
    samples: *const f32,
    num_samples: c_int,
) -> MpPitchResult {
    let Some(state) = handle.as_mut() else {
        return MpPitchResult::zeroed();
    };
    if samples.is_null() || num_samples <= 0 {
        return MpPitchResult::zeroed();
    }
    if num_samples as usize > state.max_process_samples {
        error!("mp_pitch_detector_process: invalid num_samples={num_samples}");
        return MpPitchResult::zeroed();
    }

    let block = std::slice::from_raw_parts(samples, num_samples as usize);
    match catch_unwind(AssertUnwindSafe(|| state.detector.process(block))) {
        Ok(result) => MpPitchResult::from_result(&result),
        Err(_) => {
            error!("mp_pitch_detector_process: panic in detector");
            MpPitchResult::zeroed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::ffi::CStr;
    use std::sync::Mutex;

    fn make_sine(frequency_hz: f32, sample_rate: f32, sample_count: usize) -> Vec<f32> {
        let mut buffer = vec![0.0; sample_count];
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample =
                (2.0 * std::f32::consts::PI * frequency_hz * (i as f32) / sample_rate).sin();
        }
        buffer
    }

    fn note_name(result: &MpPitchResult) -> String {
        let bytes: Vec<u8> = result
            .note_name
            .iter()
            .take_while(|&&byte| byte != 0)
            .map(|&byte| byte as u8)
            .collect();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn process_a4_through_the_bridge() {
        let handle = mp_pitch_detector_create(44100, 2048, 0.10);
        assert!(!handle.is_null());

        let sine = make_sine(440.0, 44100.0, 2048);
        let result =
            unsafe { mp_pitch_detector_process(handle, sine.as_ptr(), sine.len() as c_int) };
        assert_eq!(result.pitched, 1);
        assert!((result.frequency - 440.0).abs() <= 2.0);
        assert_eq!(result.midi_note, 69);
        assert_eq!(note_name(&result), "A4");

        unsafe { mp_pitch_detector_destroy(handle) };
    }

    #[test]
    fn set_reference_pitch_through_the_bridge() {
        let handle = mp_pitch_detector_create(44100, 2048, 0.10);
        assert!(!handle.is_null());
        assert_eq!(
            unsafe { mp_pitch_detector_set_reference_pitch(handle, 432.0) },
            1
        );
        assert_eq!(
            unsafe { mp_pitch_detector_set_reference_pitch(handle, 500.0) },
            0
        );

        let sine = make_sine(432.0, 44100.0, 2048);
        let result =
            unsafe { mp_pitch_detector_process(handle, sine.as_ptr(), sine.len() as c_int) };
        assert_eq!(result.pitched, 1);
        assert_eq!(result.midi_note, 69);
        assert_eq!(note_name(&result), "A4");
        assert!(result.cents_offset.abs() <= 0.1);

        unsafe { mp_pitch_detector_destroy(handle) };
    }

    #[test]
    fn reset_through_the_bridge() {
        let handle = mp_pitch_detector_create(44100, 2048, 0.10);
        let sine = make_sine(440.0, 44100.0, 2048);
        let result =
            unsafe { mp_pitch_detector_process(handle, sine.as_ptr(), sine.len() as c_int) };
        assert_eq!(result.pitched, 1);

        unsafe { mp_pitch_detector_reset(handle) };
        let result = unsafe { mp_pitch_detector_process(handle, sine.as_ptr(), 1024) };
        assert_eq!(result.pitched, 0);

        unsafe { mp_pitch_detector_destroy(handle) };
    }

    #[test]
    fn null_handle_is_safe() {
        let samples = vec![0.0f32; 2048];
        let result = unsafe {
            mp_pitch_detector_process(std::ptr::null_mut(), samples.as_ptr(), 2048)
        };
        assert_eq!(result.pitched, 0);
        assert_eq!(result.frequency, 0.0);
        assert_eq!(result.midi_note, 0);

        unsafe {
            mp_pitch_detector_reset(std::ptr::null_mut());
            mp_pitch_detector_destroy(std::ptr::null_mut());
            assert_eq!(
                mp_pitch_detector_set_reference_pitch(std::ptr::null_mut(), 440.0),
                0
            );
        }
    }

    #[test]
    fn null_samples_and_bad_counts_are_safe() {
        let handle = mp_pitch_detector_create(44100, 2048, 0.10);
        assert!(!handle.is_null());

        let result = unsafe { mp_pitch_detector_process(handle, std::ptr::null(), 2048) };
        assert_eq!(result.pitched, 0);

        let samples = vec![0.0f32; 2048];
        let result = unsafe { mp_pitch_detector_process(handle, samples.as_ptr(), 0) };
        assert_eq!(result.pitched, 0);
        let result = unsafe { mp_pitch_detector_process(handle, samples.as_ptr(), -5) };
        assert_eq!(result.pitched, 0);

        // Larger than twice the frame: rejected, result zeroed.
        let result = unsafe { mp_pitch_detector_process(handle, samples.as_ptr(), 4097) };
        assert_eq!(result.pitched, 0);

        unsafe { mp_pitch_detector_destroy(handle) };
    }

    #[test]
    fn invalid_arguments_return_null() {
        assert!(mp_pitch_detector_create(0, 2048, 0.10).is_null());
        assert!(mp_pitch_detector_create(44100, 1, 0.10).is_null());
        assert!(mp_pitch_detector_create(44100, 40000, 0.10).is_null());
        assert!(mp_pitch_detector_create(44100, 2048, f32::NAN).is_null());
        assert!(mp_pitch_detector_create(44100, 2048, 1.5).is_null());
        assert!(
            mp_pitch_detector_create_with_reference_pitch(44100, 2048, 0.10, 420.0).is_null()
        );
    }

    static CAPTURED_LOGS: Mutex<Vec<(c_int, String)>> = Mutex::new(Vec::new());

    unsafe extern "C" fn capture_log(level: c_int, message: *const c_char) {
        let message = CStr::from_ptr(message).to_string_lossy().into_owned();
        CAPTURED_LOGS.lock().unwrap().push((level, message));
    }

    #[test]
    fn create_failure_reaches_the_log_callback() {
        mp_pitch_detector_set_log_callback(Some(capture_log));
        assert!(mp_pitch_detector_create(0, 2048, 0.10).is_null());
        mp_pitch_detector_set_log_callback(None);

        let logs = CAPTURED_LOGS.lock().unwrap();
        assert!(logs.iter().any(|(level, message)| {
            *level == MP_LOG_LEVEL_ERROR && message.contains("pitch_detector_create")
        }));
    }

    #[test]
    fn crash_handler_installation_is_idempotent() {
        mp_pitch_detector_install_crash_handlers();
        mp_pitch_detector_install_crash_handlers();
    }
}
