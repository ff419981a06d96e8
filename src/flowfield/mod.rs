//! Stokes solvers in spectral space.
//!
//! A solver maps the spectral coefficients of a force density to those of the
//! velocity field `u` solving `eta lap u - grad p = -f`, `div u = 0`.

use crate::errors::*;
use crate::mesh::GridGeometry;
use crate::transform::SpectralField;
use ndarray::{s, Array, Array3, Axis, Zip};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

pub mod bvp;
pub mod doubly_periodic;
pub mod spectral_solver;

pub use self::doubly_periodic::DoublyPeriodicSolver;
pub use self::spectral_solver::SpectralSolver;

/// Treatment of the `k = 0` mode of the doubly periodic solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroModePolicy {
    /// The mean flow vanishes (`k0 = 0`).
    Zero,
    /// The mean flow is the free space response to the mean force (`k0 = 1`).
    Retain,
}

impl Default for ZeroModePolicy {
    fn default() -> ZeroModePolicy {
        ZeroModePolicy::Zero
    }
}

impl ZeroModePolicy {
    /// Maps the integer flag `k0` to a policy.
    pub fn from_flag(k0: u8) -> Result<ZeroModePolicy> {
        match k0 {
            0 => Ok(ZeroModePolicy::Zero),
            1 => Ok(ZeroModePolicy::Retain),
            _ => configuration(format!("zero mode flag must be 0 or 1, got {}", k0)),
        }
    }
}

pub trait StokesSolver: Send + Sync {
    /// Returns the velocity coefficients for the given force density
    /// coefficients.
    fn solve(&self, forcing: &SpectralField) -> Result<SpectralField>;

    fn viscosity(&self) -> f64;
}

/// Returns the solver matching the axes of `geometry`.
pub fn solver_for(
    geometry: &GridGeometry,
    viscosity: f64,
    policy: ZeroModePolicy,
) -> Result<Box<dyn StokesSolver>> {
    if geometry.is_doubly_periodic() {
        Ok(Box::new(DoublyPeriodicSolver::new(geometry, viscosity, policy)?))
    } else {
        Ok(Box::new(SpectralSolver::new(geometry, viscosity, policy)?))
    }
}

pub(crate) fn check_viscosity(viscosity: f64) -> Result<()> {
    if viscosity.is_finite() && viscosity > 0. {
        Ok(())
    } else {
        configuration(format!("viscosity must be positive, got {}", viscosity))
    }
}

fn check_velocity_field(geometry: &GridGeometry) -> Result<()> {
    if geometry.dof() == 3 {
        Ok(())
    } else {
        configuration(format!(
            "Stokes solver needs 3 dof per node, the grid has {}",
            geometry.dof()
        ))
    }
}

fn check_forcing(solver: &GridGeometry, forcing: &SpectralField) -> Result<()> {
    if forcing.geometry() != solver {
        return stale("forcing was transformed on a different grid than the solver was set up for");
    }
    Ok(())
}

fn check_finite(u: &SpectralField) -> Result<()> {
    if u.has_non_finite() {
        return numeric("non-finite velocity coefficient");
    }
    Ok(())
}

/// Spectral coefficients of the divergence of a velocity field.
pub fn divergence(u: &SpectralField) -> Result<Array3<Complex64>> {
    let geometry = u.geometry();
    check_velocity_field(geometry)?;

    let n = geometry.size().as_array();
    let lengths = [geometry.length(0), geometry.length(1), geometry.length(2)];
    let i = Complex64::new(0., 1.);

    if !geometry.is_doubly_periodic() {
        let k_mesh = crate::mesh::fft_helper::get_k_mesh(n, lengths);
        let mut div = Array::zeros((n[0], n[1], n[2]));
        Zip::from(&mut div)
            .and(u.data().lanes(Axis(3)))
            .and(k_mesh.lanes(Axis(3)))
            .for_each(|d, u, k| {
                *d = i * (u[0] * k[0] + u[1] * k[1] + u[2] * k[2]);
            });
        return Ok(div);
    }

    let kx = crate::mesh::fft_helper::get_k_sampling(n[0], lengths[0]);
    let ky = crate::mesh::fft_helper::get_k_sampling(n[1], lengths[1]);
    let h = 0.5 * lengths[2];

    let mut div = Array::zeros((n[0], n[1], n[2]));
    for a in 0..n[0] {
        for b in 0..n[1] {
            let column = u.data().slice(s![a, b, .., ..]);
            let uz: Vec<Complex64> = column.column(2).to_vec();
            let duz = bvp::derivative(&uz);
            for c in 0..n[2] {
                div[[a, b, c]] =
                    i * (kx[a] * column[[c, 0]] + ky[b] * column[[c, 1]]) + duz[c] / h;
            }
        }
    }
    Ok(div)
}
