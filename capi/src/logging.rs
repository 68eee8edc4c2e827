//! Log bridge between the `log` facade and a host-registered C
//! callback.
//!
//! Records are always written to stderr with a `[monopitch]` prefix;
//! when a callback has been registered it additionally receives the
//! level (`MP_LOG_LEVEL_*`) and the message as a null-terminated C
//! string. The callback pointer is published with release/acquire, so
//! registration from any thread is visible to subsequent log calls.

use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Callback signature shared with the C header: `(level, message)`.
/// The callback must be thread-safe.
pub type MpLogCallback = Option<unsafe extern "C" fn(level: c_int, message: *const c_char)>;

pub const MP_LOG_LEVEL_TRACE: c_int = 0;
pub const MP_LOG_LEVEL_DEBUG: c_int = 1;
pub const MP_LOG_LEVEL_INFO: c_int = 2;
pub const MP_LOG_LEVEL_ERROR: c_int = 3;

/// Registered callback, stored as a raw address; 0 means none.
static LOG_CALLBACK: AtomicUsize = AtomicUsize::new(0);
static LOGGER_INIT: Once = Once::new();
static LOGGER: BridgeLogger = BridgeLogger;

struct BridgeLogger;

impl Log for BridgeLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let message = format!("{}", record.args());
        eprintln!("[monopitch] {message}");

        let raw = LOG_CALLBACK.load(Ordering::Acquire);
        if raw == 0 {
            return;
        }
        let callback: unsafe extern "C" fn(c_int, *const c_char) =
            unsafe { std::mem::transmute(raw) };
        if let Ok(c_message) = CString::new(message) {
            unsafe { callback(level_to_c(record.level()), c_message.as_ptr()) };
        }
    }

    fn flush(&self) {}
}

fn level_to_c(level: Level) -> c_int {
    match level {
        Level::Error => MP_LOG_LEVEL_ERROR,
        Level::Warn | Level::Info => MP_LOG_LEVEL_INFO,
        Level::Debug => MP_LOG_LEVEL_DEBUG,
        Level::Trace => MP_LOG_LEVEL_TRACE,
    }
}

/// Installs the bridge as the process-wide `log` logger. A host
/// application that already installed its own logger keeps it.
pub(crate) fn ensure_logger() {
    LOGGER_INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Registers (or, with null, removes) the diagnostic log callback.
///
/// The callback may be invoked from any thread, including the audio
/// thread for TRACE/DEBUG events triggered by `reset`, and must be
/// async-signal- and thread-safe.
#[no_mangle]
pub extern "C" fn mp_pitch_detector_set_log_callback(callback: MpLogCallback) {
    ensure_logger();
    let raw = match callback {
        Some(function) => function as usize,
        None => 0,
    };
    LOG_CALLBACK.store(raw, Ordering::Release);
}
