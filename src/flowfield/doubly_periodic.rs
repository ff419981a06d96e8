//! Stokes solver of a slab periodic in x and y and unbounded in z.
//!
//! For every planar wavenumber `(kx, ky)` the pressure and velocity
//! coefficients solve two point boundary value problems in z. Outside the
//! slab the forcing vanishes, so the solution decays like `exp(-k |z|)`,
//! which gives Robin conditions at both ends of the Chebyshev axis.

// Move unit test into own file
#[cfg(test)]
#[path = "./doubly_periodic_test.rs"]
mod doubly_periodic_test;

use super::bvp::{
    derivative, integrals, second_derivative_matrix, slope_top, value_bottom, value_top, Boundary,
    TauSystem,
};
use super::{
    check_finite, check_forcing, check_velocity_field, check_viscosity, StokesSolver,
    ZeroModePolicy,
};
use crate::errors::*;
use crate::mesh::fft_helper::get_k_sampling;
use crate::mesh::GridGeometry;
use crate::transform::{SpectralField, TransformKind};
use log::{debug, warn};
use nalgebra::DMatrix;
use ndarray::{s, Array, Array1, Array4, ArrayView2, ArrayViewMut2, Axis};
use num_complex::Complex64;
use rayon::prelude::*;

const I: Complex64 = Complex64 { re: 0., im: 1. };

pub struct DoublyPeriodicSolver {
    geometry: GridGeometry,
    viscosity: f64,
    policy: ZeroModePolicy,
    kx: Array1<f64>,
    ky: Array1<f64>,
    half_height: f64,
    d2: DMatrix<f64>,
    integrals: Vec<f64>,
}

impl DoublyPeriodicSolver {
    pub fn new(
        geometry: &GridGeometry,
        viscosity: f64,
        policy: ZeroModePolicy,
    ) -> Result<DoublyPeriodicSolver> {
        check_viscosity(viscosity)?;
        check_velocity_field(geometry)?;

        let cheb = match geometry.chebyshev() {
            Some(c) => c,
            None => return configuration("doubly periodic solver needs a Chebyshev z axis"),
        };

        let n = geometry.size().as_array();
        if n[2] < 8 {
            warn!("only {} Chebyshev points along z", n[2]);
        }

        debug!(
            "Doubly periodic solver, {} planar modes, {} Chebyshev modes, zero mode {:?}",
            n[0] * n[1],
            n[2],
            policy
        );

        Ok(DoublyPeriodicSolver {
            geometry: geometry.clone(),
            viscosity,
            policy,
            kx: get_k_sampling(n[0], geometry.length(0)),
            ky: get_k_sampling(n[1], geometry.length(1)),
            half_height: cheb.half_height(),
            d2: second_derivative_matrix(n[2]),
            integrals: integrals(n[2]),
        })
    }

    pub fn policy(&self) -> ZeroModePolicy {
        self.policy
    }

    /// Pressure and velocity of one planar mode with `k > 0`.
    fn solve_mode(
        &self,
        kx: f64,
        ky: f64,
        f: &[Vec<Complex64>; 3],
    ) -> Result<[Vec<Complex64>; 3]> {
        let n = f[0].len();
        let h = self.half_height;
        let eta = self.viscosity;
        let k = (kx * kx + ky * ky).sqrt();

        let system = TauSystem::new(&self.d2, h, k, Boundary::Decaying)?;
        let zero = Complex64::new(0., 0.);

        // lap p = div f
        let dfz = derivative(&f[2]);
        let rhs: Vec<_> = (0..n)
            .map(|m| I * kx * f[0][m] + I * ky * f[1][m] + dfz[m] / h)
            .collect();
        let p = system.solve(&rhs, zero, zero)?;

        let p_top = value_top(&p);
        let p_bottom = value_bottom(&p);
        let dp = derivative(&p);
        let scale = 1. / (2. * k * eta);

        // eta lap u = grad p - f
        let rhs: Vec<_> = (0..n).map(|m| (I * kx * p[m] - f[0][m]) / eta).collect();
        let ux = system.solve(&rhs, -I * kx * p_top * scale, I * kx * p_bottom * scale)?;

        let rhs: Vec<_> = (0..n).map(|m| (I * ky * p[m] - f[1][m]) / eta).collect();
        let uy = system.solve(&rhs, -I * ky * p_top * scale, I * ky * p_bottom * scale)?;

        let rhs: Vec<_> = (0..n).map(|m| (dp[m] / h - f[2][m]) / eta).collect();
        let uz = system.solve(&rhs, p_top * (k * scale), p_bottom * (k * scale))?;

        Ok([ux, uy, uz])
    }

    /// Mean flow, `eta u'' = -f` in x and y. The Dirichlet solution is
    /// shifted by a linear function so that it matches the free space
    /// response `-1/(2 eta) int |z - z'| f(z') dz'`.
    fn solve_zero_mode(&self, f: &[Vec<Complex64>; 3]) -> Result<[Vec<Complex64>; 3]> {
        let n = f[0].len();
        let zero = vec![Complex64::new(0., 0.); n];

        if self.policy == ZeroModePolicy::Zero {
            return Ok([zero.clone(), zero.clone(), zero]);
        }

        let h = self.half_height;
        let eta = self.viscosity;
        let system = TauSystem::new(&self.d2, h, 0., Boundary::Dirichlet)?;

        let mut u = [zero.clone(), zero.clone(), zero];
        for d in 0..2 {
            let rhs: Vec<_> = f[d].iter().map(|v| -*v / eta).collect();
            let mut ud = system.solve(&rhs, Complex64::new(0., 0.), Complex64::new(0., 0.))?;

            // total force along d, the Chebyshev series integrated exactly
            let total: Complex64 = f[d]
                .iter()
                .zip(&self.integrals)
                .map(|(v, w)| *v * *w)
                .sum::<Complex64>()
                * h;
            let offset = -total * h / (2. * eta);
            let slope = -total / (2. * eta) - slope_top(&ud) / h;

            ud[0] += offset;
            if n > 1 {
                // z - z_mid = h T_1
                ud[1] += slope * h;
            }
            u[d] = ud;
        }

        Ok(u)
    }

    fn solve_column(
        &self,
        a: usize,
        b: usize,
        f: ArrayView2<Complex64>,
        mut u: ArrayViewMut2<Complex64>,
    ) -> Result<()> {
        let f = [f.column(0).to_vec(), f.column(1).to_vec(), f.column(2).to_vec()];
        let (kx, ky) = (self.kx[a], self.ky[b]);

        let res = if kx == 0. && ky == 0. {
            self.solve_zero_mode(&f)?
        } else {
            self.solve_mode(kx, ky, &f)?
        };

        for (d, ud) in res.iter().enumerate() {
            for (m, v) in ud.iter().enumerate() {
                u[[m, d]] = *v;
            }
        }
        Ok(())
    }
}

impl StokesSolver for DoublyPeriodicSolver {
    fn solve(&self, forcing: &SpectralField) -> Result<SpectralField> {
        if forcing.kind() != TransformKind::Chebyshev {
            return configuration("doubly periodic solver needs a Chebyshev transform");
        }
        check_forcing(&self.geometry, forcing)?;

        let f = forcing.data();
        let ny = f.dim().1;
        let mut u: Array4<Complex64> = Array::zeros(f.dim());

        // errors are passed as text between threads
        u.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .try_for_each(|(a, mut plane)| {
                for b in 0..ny {
                    self.solve_column(
                        a,
                        b,
                        f.slice(s![a, b, .., ..]),
                        plane.slice_mut(s![b, .., ..]),
                    )
                    .map_err(|e| e.to_string())?;
                }
                Ok::<(), String>(())
            })
            .or_else(numeric)?;

        let u = SpectralField::new(u, TransformKind::Chebyshev, &self.geometry)?;
        check_finite(&u)?;
        Ok(u)
    }

    fn viscosity(&self) -> f64 {
        self.viscosity
    }
}
