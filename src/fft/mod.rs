//! Fixed-size complex FFT with pluggable backends.
//!
//! One built-in radix-2 implementation is always available. Optional
//! backends can be compiled in: the Apple vDSP DFT (`accelerate`
//! feature, Apple targets only) and FFTW3 (`fftw` feature). The
//! backend is picked once at construction, either automatically
//! (`accelerate` > `fftw` > `radix2`) or through the `FFT_BACKEND`
//! environment variable; a requested backend that is unavailable or
//! fails to initialize falls back to `radix2`. After construction the
//! transforms are in place and allocation free.

mod radix2;

#[cfg(all(feature = "accelerate", any(target_os = "macos", target_os = "ios")))]
mod accelerate;
#[cfg(feature = "fftw")]
mod fftw3;

use log::debug;
use num_complex::Complex32;

use crate::error::ConfigError;
use radix2::Radix2Fft;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Requested {
    Auto,
    Radix2,
    Accelerate,
    Fftw,
}

fn parse_requested() -> Requested {
    match std::env::var("FFT_BACKEND") {
        Ok(value) => match value.as_str() {
            "radix2" | "manual" => Requested::Radix2,
            "accelerate" => Requested::Accelerate,
            "fftw" => Requested::Fftw,
            _ => Requested::Auto,
        },
        Err(_) => Requested::Auto,
    }
}

enum Backend {
    Radix2(Radix2Fft),
    #[cfg(all(feature = "accelerate", any(target_os = "macos", target_os = "ios")))]
    Accelerate(accelerate::AccelerateFft),
    #[cfg(feature = "fftw")]
    Fftw(fftw3::FftwFft),
}

/// In-place complex DFT of a fixed power-of-two length.
pub struct Fft {
    len: usize,
    backend: Backend,
}

impl Fft {
    /// Creates a transform of the given power-of-two length, selecting
    /// the backend as described in the module docs.
    pub fn new(len: usize) -> Result<Self, ConfigError> {
        if !len.is_power_of_two() {
            return Err(ConfigError::InvalidFftLength(len));
        }
        let backend = select_backend(len, parse_requested());
        debug!(
            "fft: selected {} backend for length {}",
            backend_name(&backend),
            len
        );
        Ok(Fft { len, backend })
    }

    /// Transform length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Name of the backend in use: `radix2`, `accelerate` or `fftw`.
    pub fn backend_name(&self) -> &'static str {
        backend_name(&self.backend)
    }

    /// In-place forward DFT:
    /// `X[k] = sum_j x[j] * exp(-2*pi*i*j*k / N)`.
    pub fn forward(&mut self, x: &mut [Complex32]) {
        debug_assert_eq!(x.len(), self.len);
        match &mut self.backend {
            Backend::Radix2(fft) => fft.forward(x),
            #[cfg(all(feature = "accelerate", any(target_os = "macos", target_os = "ios")))]
            Backend::Accelerate(fft) => fft.forward(x),
            #[cfg(feature = "fftw")]
            Backend::Fftw(fft) => fft.forward(x),
        }
    }

    /// Exact inverse of [`forward`](Self::forward): running the two in
    /// sequence reproduces the input to within rounding.
    pub fn inverse(&mut self, x: &mut [Complex32]) {
        debug_assert_eq!(x.len(), self.len);
        match &mut self.backend {
            Backend::Radix2(fft) => fft.inverse(x),
            #[cfg(all(feature = "accelerate", any(target_os = "macos", target_os = "ios")))]
            Backend::Accelerate(fft) => fft.inverse(x),
            #[cfg(feature = "fftw")]
            Backend::Fftw(fft) => fft.inverse(x),
        }
    }
}

fn backend_name(backend: &Backend) -> &'static str {
    match backend {
        Backend::Radix2(_) => "radix2",
        #[cfg(all(feature = "accelerate", any(target_os = "macos", target_os = "ios")))]
        Backend::Accelerate(_) => "accelerate",
        #[cfg(feature = "fftw")]
        Backend::Fftw(_) => "fftw",
    }
}

fn select_backend(len: usize, requested: Requested) -> Backend {
    match requested {
        Requested::Radix2 => return Backend::Radix2(Radix2Fft::new(len)),
        Requested::Accelerate => {
            #[cfg(all(feature = "accelerate", any(target_os = "macos", target_os = "ios")))]
            if let Some(fft) = accelerate::AccelerateFft::new(len) {
                return Backend::Accelerate(fft);
            }
            debug!("fft: accelerate backend unavailable, using radix2");
            return Backend::Radix2(Radix2Fft::new(len));
        }
        Requested::Fftw => {
            #[cfg(feature = "fftw")]
            if let Some(fft) = fftw3::FftwFft::new(len) {
                return Backend::Fftw(fft);
            }
            debug!("fft: fftw backend unavailable, using radix2");
            return Backend::Radix2(Radix2Fft::new(len));
        }
        Requested::Auto => {}
    }

    #[cfg(all(feature = "accelerate", any(target_os = "macos", target_os = "ios")))]
    if let Some(fft) = accelerate::AccelerateFft::new(len) {
        return Backend::Accelerate(fft);
    }
    #[cfg(feature = "fftw")]
    if let Some(fft) = fftw3::FftwFft::new(len) {
        return Backend::Fftw(fft);
    }
    Backend::Radix2(Radix2Fft::new(len))
}
