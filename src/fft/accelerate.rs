//! Apple vDSP DFT backend.
//!
//! Uses the `vDSP_DFT_zop` split-complex API from the Accelerate
//! framework. The interleaved buffer is staged through split
//! real/imaginary arrays owned by the backend, so the transform itself
//! allocates nothing.

use std::os::raw::{c_int, c_ulong, c_void};

use num_complex::Complex32;

type VdspDftSetup = *mut c_void;

const VDSP_DFT_FORWARD: c_int = 1;
const VDSP_DFT_INVERSE: c_int = -1;

#[link(name = "Accelerate", kind = "framework")]
extern "C" {
    fn vDSP_DFT_zop_CreateSetup(
        previous: VdspDftSetup,
        length: c_ulong,
        direction: c_int,
    ) -> VdspDftSetup;
    fn vDSP_DFT_Execute(
        setup: VdspDftSetup,
        in_real: *const f32,
        in_imag: *const f32,
        out_real: *mut f32,
        out_imag: *mut f32,
    );
    fn vDSP_DFT_DestroySetup(setup: VdspDftSetup);
}

pub struct AccelerateFft {
    len: usize,
    forward_setup: VdspDftSetup,
    inverse_setup: VdspDftSetup,
    in_real: Box<[f32]>,
    in_imag: Box<[f32]>,
    out_real: Box<[f32]>,
    out_imag: Box<[f32]>,
}

// The setups are only touched through &mut self.
unsafe impl Send for AccelerateFft {}

impl AccelerateFft {
    /// Returns `None` when either DFT setup cannot be created; the
    /// caller then falls back to the built-in backend.
    pub fn new(len: usize) -> Option<Self> {
        let forward_setup = unsafe {
            vDSP_DFT_zop_CreateSetup(std::ptr::null_mut(), len as c_ulong, VDSP_DFT_FORWARD)
        };
        let inverse_setup = unsafe {
            vDSP_DFT_zop_CreateSetup(std::ptr::null_mut(), len as c_ulong, VDSP_DFT_INVERSE)
        };
        if forward_setup.is_null() || inverse_setup.is_null() {
            unsafe {
                if !forward_setup.is_null() {
                    vDSP_DFT_DestroySetup(forward_setup);
                }
                if !inverse_setup.is_null() {
                    vDSP_DFT_DestroySetup(inverse_setup);
                }
            }
            return None;
        }
        Some(AccelerateFft {
            len,
            forward_setup,
            inverse_setup,
            in_real: vec![0.0; len].into_boxed_slice(),
            in_imag: vec![0.0; len].into_boxed_slice(),
            out_real: vec![0.0; len].into_boxed_slice(),
            out_imag: vec![0.0; len].into_boxed_slice(),
        })
    }

    pub fn forward(&mut self, x: &mut [Complex32]) {
        let setup = self.forward_setup;
        self.execute(setup, x);
    }

    pub fn inverse(&mut self, x: &mut [Complex32]) {
        let setup = self.inverse_setup;
        self.execute(setup, x);
        // vDSP's inverse DFT is unnormalized.
        let inv_n = 1.0 / self.len as f32;
        for value in x.iter_mut() {
            *value *= inv_n;
        }
    }

    fn execute(&mut self, setup: VdspDftSetup, x: &mut [Complex32]) {
        debug_assert_eq!(x.len(), self.len);
        for (i, value) in x.iter().enumerate() {
            self.in_real[i] = value.re;
            self.in_imag[i] = value.im;
        }
        unsafe {
            vDSP_DFT_Execute(
                setup,
                self.in_real.as_ptr(),
                self.in_imag.as_ptr(),
                self.out_real.as_mut_ptr(),
                self.out_imag.as_mut_ptr(),
            );
        }
        for (i, value) in x.iter_mut().enumerate() {
            *value = Complex32::new(self.out_real[i], self.out_imag[i]);
        }
    }
}

impl Drop for AccelerateFft {
    fn drop(&mut self) {
        unsafe {
            vDSP_DFT_DestroySetup(self.forward_setup);
            vDSP_DFT_DestroySetup(self.inverse_setup);
        }
    }
}
