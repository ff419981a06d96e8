// Move unit test into own file
#[cfg(test)]
#[path = "./fft_helper_test.rs"]
mod fft_helper_test;

use super::mesh3d;
use crate::consts::TWOPI;
use ndarray::{s, Array, ArrayView, Axis, Ix1, Ix3, Ix4};

/// Returns the wavenumbers of one periodic axis in standard FFT order.
///
/// For a grid size of `n`, the 0th-mode is at index `0`. For even n the index
/// `n/2` represents both the largest positive and negative frequency and is
/// stored as the negative one. For odd `n` index `(n-1)/2` is the largest
/// positive frequency and `(n+1)/2` the largest negative frequency.
///
/// Example:
///     n = 10 => k = [0, 1, 2, 3, 4, (5, -5), -4, -3, -2, -1] * 2pi/L
///     n = 11 => k = [0, 1, 2, 3, 4, 5, -5, -4, -3, -2, -1] * 2pi/L
///
pub fn get_k_sampling(n: usize, length: f64) -> Array<f64, Ix1> {
    let a = (n / 2) as isize;
    let b = if n % 2 == 0 { n / 2 } else { n / 2 + 1 } as isize;
    let step = TWOPI / length;

    let values: Array<f64, Ix1> = (-a..b).map(|i| (i as f64) * step).collect();

    let mut k = Array::zeros(n);

    k.slice_mut(s![..b]).assign(&values.slice(s![a..]));
    k.slice_mut(s![b..]).assign(&values.slice(s![..a]));

    k
}

/// Returns a meshgrid of k values for a triply periodic FFT.
///
/// The last axis denotes the components of the k-vector:
///     `res[i, j, m, c] -> k_c[i, j, m]`
pub fn get_k_mesh(n: [usize; 3], lengths: [f64; 3]) -> Array<f64, Ix4> {
    let ks: Vec<_> = n
        .iter()
        .zip(lengths.iter())
        .map(|(&n, &l)| get_k_sampling(n, l))
        .collect();
    mesh3d::<f64>(&ks)
}

/// Returns scalar field of inversed norm squared of k-vector-values.
///
/// The inverse norm of k=0 is set to zero, i.e. 1/(k=0)^2 == 0
pub fn get_inverse_norm_squared(k_mesh: ArrayView<f64, Ix4>) -> Array<f64, Ix3> {
    let squared = &k_mesh * &k_mesh;

    squared
        .sum_axis(Axis(3))
        .mapv(|v| if v == 0. { 0. } else { 1. / v })
}
