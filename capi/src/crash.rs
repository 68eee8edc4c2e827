//! Crash diagnostics for the native library.
//!
//! Installs a panic hook plus handlers for the fatal POSIX signals.
//! A handler writes a single line to stderr using only `write` (the
//! one async-signal-safe thing it is allowed to do) and then re-raises
//! the signal with its default disposition so the host OS still
//! produces its usual crash report.

#[cfg(unix)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

use log::error;

static INSTALL_ONCE: Once = Once::new();

#[cfg(unix)]
static FATAL_IN_PROGRESS: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
fn write_stderr(message: &[u8]) {
    unsafe {
        let _ = libc::write(
            libc::STDERR_FILENO,
            message.as_ptr() as *const libc::c_void,
            message.len(),
        );
    }
}

#[cfg(unix)]
extern "C" fn fatal_signal_handler(signal_number: libc::c_int) {
    // A second fault while reporting the first one exits directly.
    if FATAL_IN_PROGRESS.swap(true, Ordering::Relaxed) {
        unsafe { libc::_exit(128 + signal_number) };
    }
    let message: &[u8] = match signal_number {
        libc::SIGABRT => b"[monopitch] native fatal signal: SIGABRT\n",
        libc::SIGILL => b"[monopitch] native fatal signal: SIGILL\n",
        libc::SIGFPE => b"[monopitch] native fatal signal: SIGFPE\n",
        libc::SIGSEGV => b"[monopitch] native fatal signal: SIGSEGV\n",
        libc::SIGBUS => b"[monopitch] native fatal signal: SIGBUS\n",
        libc::SIGTRAP => b"[monopitch] native fatal signal: SIGTRAP\n",
        _ => b"[monopitch] native fatal signal\n",
    };
    write_stderr(message);
    unsafe {
        libc::signal(signal_number, libc::SIG_DFL);
        libc::raise(signal_number);
        libc::_exit(128 + signal_number);
    }
}

#[cfg(unix)]
fn install_signal_handlers() {
    let handler = fatal_signal_handler as extern "C" fn(libc::c_int);
    let signals = [
        libc::SIGABRT,
        libc::SIGILL,
        libc::SIGFPE,
        libc::SIGSEGV,
        libc::SIGBUS,
        libc::SIGTRAP,
    ];
    unsafe {
        for signal in signals {
            libc::signal(signal, handler as libc::sighandler_t);
        }
    }
}

#[cfg(not(unix))]
fn install_signal_handlers() {}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!("native panic: {info}");
        previous(info);
    }));
}

/// Installs the panic hook and fatal-signal handlers. Idempotent.
#[no_mangle]
pub extern "C" fn mp_pitch_detector_install_crash_handlers() {
    INSTALL_ONCE.call_once(|| {
        crate::logging::ensure_logger();
        install_panic_hook();
        install_signal_handlers();
    });
}
