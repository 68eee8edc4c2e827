//! FFTW3 backend via the `fftw` crate.
//!
//! Plans are created with `Flag::MEASURE` at construction, over
//! aligned buffers owned by the backend. Each transform copies the
//! caller's interleaved buffer into the aligned input array, executes
//! the plan and copies back; nothing is allocated after construction.

use fftw::array::AlignedVec;
use fftw::plan::{C2CPlan, C2CPlan32};
use fftw::types::{c32, Flag, Sign};
use num_complex::Complex32;

pub struct FftwFft {
    len: usize,
    forward_plan: C2CPlan32,
    inverse_plan: C2CPlan32,
    input: AlignedVec<c32>,
    output: AlignedVec<c32>,
}

impl FftwFft {
    /// Returns `None` when plan creation fails; the caller then falls
    /// back to the built-in backend.
    pub fn new(len: usize) -> Option<Self> {
        let forward_plan = C2CPlan32::aligned(&[len], Sign::Forward, Flag::MEASURE).ok()?;
        let inverse_plan = C2CPlan32::aligned(&[len], Sign::Backward, Flag::MEASURE).ok()?;
        Some(FftwFft {
            len,
            forward_plan,
            inverse_plan,
            input: AlignedVec::new(len),
            output: AlignedVec::new(len),
        })
    }

    pub fn forward(&mut self, x: &mut [Complex32]) {
        self.run(true, x);
    }

    pub fn inverse(&mut self, x: &mut [Complex32]) {
        self.run(false, x);
        // FFTW's backward transform is unnormalized.
        let inv_n = 1.0 / self.len as f32;
        for value in x.iter_mut() {
            *value *= inv_n;
        }
    }

    fn run(&mut self, forward: bool, x: &mut [Complex32]) {
        debug_assert_eq!(x.len(), self.len);
        for (slot, value) in self.input.iter_mut().zip(x.iter()) {
            *slot = c32::new(value.re, value.im);
        }
        let plan = if forward {
            &mut self.forward_plan
        } else {
            &mut self.inverse_plan
        };
        // The plan and both arrays are sized to `len` at construction,
        // so execution cannot fail on a shape mismatch.
        plan.c2c(&mut self.input, &mut self.output)
            .expect("fftw: plan/buffer length mismatch");
        for (value, slot) in x.iter_mut().zip(self.output.iter()) {
            *value = Complex32::new(slot.re, slot.im);
        }
    }
}
