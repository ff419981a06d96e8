//! Two point boundary value problems `(D^2 - k^2) u = r` on `[-1, 1]`,
//! discretised with the Chebyshev tau method in coefficient space.
//!
//! All vectors hold the coefficients `a_n` of `u(s) = sum_n a_n T_n(s)`. The
//! physical coordinate is `z = z_mid + h s`, so derivatives with respect to
//! `z` carry a factor `1 / h`.

use crate::errors::*;
use nalgebra::linalg::LU;
use nalgebra::{DMatrix, Dyn};
use num_complex::Complex64;

/// Coefficients of the derivative `du/ds`.
pub fn derivative(a: &[Complex64]) -> Vec<Complex64> {
    let n = a.len();
    let mut b = vec![Complex64::new(0., 0.); n];
    if n < 2 {
        return b;
    }

    // b_{n-1} = 0, b_{m} = b_{m+2} + 2 (m + 1) a_{m+1}
    for m in (0..n - 1).rev() {
        let next = if m + 2 < n { b[m + 2] } else { Complex64::new(0., 0.) };
        b[m] = next + a[m + 1] * (2. * (m + 1) as f64);
    }
    b[0] *= 0.5;
    b
}

/// Matrix of the second derivative `d^2/ds^2` acting on coefficients,
/// `(D^2 a)_n = 1/c_n sum_{p >= n + 2, p + n even} p (p^2 - n^2) a_p`.
pub fn second_derivative_matrix(n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |r, p| {
        if p >= r + 2 && (p + r) % 2 == 0 {
            let c = if r == 0 { 2. } else { 1. };
            let (p, r) = (p as f64, r as f64);
            p * (p * p - r * r) / c
        } else {
            0.
        }
    })
}

/// `int_{-1}^{1} T_n(s) ds` for `n = 0..len`.
pub fn integrals(len: usize) -> Vec<f64> {
    (0..len)
        .map(|n| {
            if n % 2 == 0 {
                2. / (1. - (n * n) as f64)
            } else {
                0.
            }
        })
        .collect()
}

/// `u(1)`
pub fn value_top(a: &[Complex64]) -> Complex64 {
    a.iter().sum()
}

/// `u(-1)`
pub fn value_bottom(a: &[Complex64]) -> Complex64 {
    a.iter()
        .enumerate()
        .map(|(n, v)| if n % 2 == 0 { *v } else { -*v })
        .sum()
}

/// `du/ds` at `s = 1`
pub fn slope_top(a: &[Complex64]) -> Complex64 {
    a.iter()
        .enumerate()
        .map(|(n, v)| *v * (n * n) as f64)
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boundary {
    /// `du/dz + k u` at the top and `du/dz - k u` at the bottom, the
    /// conditions of a solution decaying like `exp(-k |z|)` outside.
    Decaying,
    /// `u` at both ends.
    Dirichlet,
}

/// Factorised tau system of `h^-2 D^2 - k^2` with two boundary rows.
pub struct TauSystem {
    n: usize,
    lu: LU<f64, Dyn, Dyn>,
}

impl TauSystem {
    /// `d2` is the second derivative matrix of `n` coefficients, `h` the half
    /// height of the domain.
    pub fn new(d2: &DMatrix<f64>, h: f64, k: f64, boundary: Boundary) -> Result<TauSystem> {
        let n = d2.nrows();
        if n < 2 || d2.ncols() != n {
            return numeric(format!("tau system needs at least two modes, got {}", n));
        }

        let h2 = 1. / (h * h);
        let k2 = k * k;
        let mut a = DMatrix::from_fn(n, n, |r, m| {
            if r + 2 < n {
                d2[(r, m)] * h2 - if r == m { k2 } else { 0. }
            } else {
                0.
            }
        });

        for m in 0..n {
            let sign = if m % 2 == 0 { 1. } else { -1. };
            let slope = (m * m) as f64 / h;
            let (top, bottom) = match boundary {
                Boundary::Decaying => (slope + k, -sign * slope - k * sign),
                Boundary::Dirichlet => (1., sign),
            };
            a[(n - 2, m)] = top;
            a[(n - 1, m)] = bottom;
        }

        let lu = a.lu();
        if !lu.is_invertible() {
            return numeric(format!("singular tau system for k = {}", k));
        }

        Ok(TauSystem { n, lu })
    }

    /// Solves for the coefficients given the right hand side coefficients
    /// and the two boundary values. Only the first `n - 2` right hand side
    /// coefficients enter.
    pub fn solve(
        &self,
        rhs: &[Complex64],
        top: Complex64,
        bottom: Complex64,
    ) -> Result<Vec<Complex64>> {
        let n = self.n;
        let row = |r: usize| {
            if r + 2 < n {
                rhs[r]
            } else if r + 2 == n {
                top
            } else {
                bottom
            }
        };
        let b = DMatrix::from_fn(n, 2, |r, c| if c == 0 { row(r).re } else { row(r).im });

        match self.lu.solve(&b) {
            Some(x) => Ok((0..n).map(|r| Complex64::new(x[(r, 0)], x[(r, 1)])).collect()),
            None => numeric("tau system could not be solved"),
        }
    }
}
