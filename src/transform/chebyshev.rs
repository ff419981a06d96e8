//! Chebyshev transform on the extrema points by a DCT-I, computed as the FFT
//! of the even extension.

use crate::errors::*;
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Maps values at the points `s_k = cos(pi k / (n - 1))` to the coefficients
/// of `f(s) = sum_n a_n T_n(s)` and back.
#[derive(Clone)]
pub struct ChebyshevTransform {
    n: usize,
    fft: Arc<dyn Fft<f64>>,
}

impl ChebyshevTransform {
    pub fn new(n: usize, planner: &mut FftPlanner<f64>) -> Result<ChebyshevTransform> {
        if n < 2 {
            return numeric(format!(
                "a Chebyshev transform needs at least two points, got {}",
                n
            ));
        }
        let fft = planner.plan_fft_forward(2 * (n - 1));
        Ok(ChebyshevTransform { n, fft })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    fn extend(&self, values: &[Complex64]) -> Vec<Complex64> {
        let m = 2 * (self.n - 1);
        let mut buffer = vec![Complex64::new(0., 0.); m];
        buffer[..self.n].copy_from_slice(values);
        for j in 1..self.n - 1 {
            buffer[m - j] = values[j];
        }
        buffer
    }

    /// Replaces point values by Chebyshev coefficients.
    pub fn coefficients(&self, values: &mut [Complex64]) {
        debug_assert_eq!(values.len(), self.n);
        let mut buffer = self.extend(values);
        self.fft.process(&mut buffer);

        let last = self.n - 1;
        let scale = 1. / last as f64;
        for (v, b) in values.iter_mut().zip(buffer) {
            *v = b * scale;
        }
        values[0] *= 0.5;
        values[last] *= 0.5;
    }

    /// Replaces Chebyshev coefficients by point values.
    pub fn synthesize(&self, coefficients: &mut [Complex64]) {
        debug_assert_eq!(coefficients.len(), self.n);
        let last = self.n - 1;
        coefficients[0] *= 2.;
        coefficients[last] *= 2.;

        let mut buffer = self.extend(coefficients);
        self.fft.process(&mut buffer);

        for (c, b) in coefficients.iter_mut().zip(buffer) {
            *c = b * 0.5;
        }
    }
}

impl std::fmt::Debug for ChebyshevTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ChebyshevTransform({})", self.n)
    }
}
