// Move unit test into own file
#[cfg(test)]
#[path = "./spectral_solver_test.rs"]
mod spectral_solver_test;

use super::{
    check_finite, check_forcing, check_velocity_field, check_viscosity, StokesSolver,
    ZeroModePolicy,
};
use crate::errors::*;
use crate::mesh::fft_helper::{get_inverse_norm_squared, get_k_mesh};
use crate::mesh::GridGeometry;
use crate::transform::{SpectralField, TransformKind};
use log::debug;
use ndarray::{Array, Array4, Axis, Ix3, Ix4, Zip};
use num_complex::Complex64;

/// Stokes solver of a triply periodic box.
pub struct SpectralSolver {
    geometry: GridGeometry,
    viscosity: f64,
    k_invnormsquared: Array<f64, Ix3>,
    k_mesh: Array<f64, Ix4>,
}

impl SpectralSolver {
    /// The mean flow of a periodic box is always zero, so only
    /// `ZeroModePolicy::Zero` is accepted.
    pub fn new(
        geometry: &GridGeometry,
        viscosity: f64,
        policy: ZeroModePolicy,
    ) -> Result<SpectralSolver> {
        check_viscosity(viscosity)?;
        check_velocity_field(geometry)?;
        if geometry.is_doubly_periodic() {
            return configuration("triply periodic solver on a grid with a Chebyshev axis");
        }
        if policy != ZeroModePolicy::Zero {
            return configuration("a triply periodic box cannot retain the k = 0 mode");
        }

        let n = geometry.size().as_array();
        let lengths = [geometry.length(0), geometry.length(1), geometry.length(2)];
        let mesh = get_k_mesh(n, lengths);

        debug!("Triply periodic solver for box {:?}", lengths);

        Ok(SpectralSolver {
            geometry: geometry.clone(),
            viscosity,
            k_invnormsquared: get_inverse_norm_squared(mesh.view()),
            k_mesh: mesh,
        })
    }
}

impl StokesSolver for SpectralSolver {
    /// Convolves the force density with the Green's function of the Stokes
    /// equation (Oseen tensor), which in Fourier space reads
    /// ```latex
    ///     u_k = 1 / (eta k^2) (I - k k^T / k^2) f_k
    /// ```
    /// Given the continuous Fourier coefficient `F[f][k]` of a function `f`,
    /// a periodicity `T` and a sampling `f_n = f(dx n)` with step width `dx`,
    /// the DFT of `f_n` is given by
    /// ```latex
    ///     DFT[f_n] = N 2 pi / T F[f][2 pi / T k]
    /// ```
    /// The projection is linear, so the normalisation is left to the
    /// backward transform.
    fn solve(&self, forcing: &SpectralField) -> Result<SpectralField> {
        if forcing.kind() != TransformKind::FullyPeriodic {
            return configuration("triply periodic solver needs a fully periodic transform");
        }
        check_forcing(&self.geometry, forcing)?;

        let eta = self.viscosity;
        let mut u: Array4<Complex64> = Array::zeros(forcing.data().dim());

        Zip::from(u.lanes_mut(Axis(3)))
            .and(forcing.data().lanes(Axis(3)))
            .and(self.k_mesh.lanes(Axis(3)))
            .and(&self.k_invnormsquared)
            .par_for_each(|mut u, f, k, &ik| {
                // mean flow
                if ik == 0. {
                    return;
                }

                let kf: Complex64 = f[0] * k[0] + f[1] * k[1] + f[2] * k[2];
                for d in 0..3 {
                    u[d] = (f[d] - kf * (k[d] * ik)) * (ik / eta);
                }
            });

        let u = SpectralField::new(u, TransformKind::FullyPeriodic, &self.geometry)?;
        check_finite(&u)?;
        Ok(u)
    }

    fn viscosity(&self) -> f64 {
        self.viscosity
    }
}
