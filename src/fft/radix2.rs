//! Built-in radix-2 Cooley-Tukey FFT.
//!
//! Iterative decimation-in-time with a bit-reversal permutation. The
//! twiddle factors `exp(-2*pi*i*k / N)` are computed once at
//! construction, so the butterfly passes never call `sin`/`cos`.

use core::f32::consts::PI;

use num_complex::Complex32;
#[cfg(feature = "simd")]
use wide::f32x4;

pub struct Radix2Fft {
    len: usize,
    /// `twiddle[k] = exp(-2*pi*i*k / len)` for `k` in `[0, len / 2)`.
    twiddle: Box<[Complex32]>,
}

impl Radix2Fft {
    pub fn new(len: usize) -> Self {
        debug_assert!(len.is_power_of_two());
        let step = -2.0 * PI / len as f32;
        let twiddle = (0..len / 2)
            .map(|k| {
                let angle = step * k as f32;
                Complex32::new(angle.cos(), angle.sin())
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Radix2Fft { len, twiddle }
    }

    /// In-place forward DFT.
    pub fn forward(&self, x: &mut [Complex32]) {
        debug_assert_eq!(x.len(), self.len);
        let n = self.len;
        if n <= 1 {
            return;
        }

        bit_reverse_permute(x);

        // The length-2 stage needs no twiddle factors and reduces to
        // adds and subtracts.
        stage_len2(x);

        let mut len = 4;
        while len <= n {
            // Twiddle factor for butterfly j at this stage is
            // W_len^j = W_n^(j * n / len) = twiddle[j * step].
            let step = n / len;
            let half = len / 2;
            for chunk in x.chunks_exact_mut(len) {
                let (lo, hi) = chunk.split_at_mut(half);
                for j in 0..half {
                    let w = self.twiddle[j * step];
                    let u = lo[j];
                    let v = hi[j] * w;
                    lo[j] = u + v;
                    hi[j] = u - v;
                }
            }
            len <<= 1;
        }
    }

    /// In-place inverse DFT via the conjugate trick: conjugate, run
    /// the forward transform, conjugate again and scale by `1 / N`.
    pub fn inverse(&self, x: &mut [Complex32]) {
        for value in x.iter_mut() {
            *value = value.conj();
        }
        self.forward(x);
        let inv_n = 1.0 / self.len as f32;
        for value in x.iter_mut() {
            *value = value.conj() * inv_n;
        }
    }
}

fn bit_reverse_permute(x: &mut [Complex32]) {
    let n = x.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            x.swap(i, j);
        }
    }
}

#[cfg(feature = "simd")]
fn stage_len2(x: &mut [Complex32]) {
    let n = x.len();
    let mut i = 0;
    // Two butterflies (four complex values) per iteration.
    while i + 3 < n {
        let u = f32x4::from([x[i].re, x[i].im, x[i + 2].re, x[i + 2].im]);
        let v = f32x4::from([x[i + 1].re, x[i + 1].im, x[i + 3].re, x[i + 3].im]);
        let sum = (u + v).to_array();
        let diff = (u - v).to_array();
        x[i] = Complex32::new(sum[0], sum[1]);
        x[i + 1] = Complex32::new(diff[0], diff[1]);
        x[i + 2] = Complex32::new(sum[2], sum[3]);
        x[i + 3] = Complex32::new(diff[2], diff[3]);
        i += 4;
    }
    while i + 1 < n {
        let u = x[i];
        let v = x[i + 1];
        x[i] = u + v;
        x[i + 1] = u - v;
        i += 2;
    }
}

#[cfg(not(feature = "simd"))]
fn stage_len2(x: &mut [Complex32]) {
    for pair in x.chunks_exact_mut(2) {
        let u = pair[0];
        let v = pair[1];
        pair[0] = u + v;
        pair[1] = u - v;
    }
}
