//! Spreading of particle forces onto the grid and interpolation of grid
//! fields back onto the particles.
//!
//! Both directions use the same stencils. `spread` divides by the cell
//! volume, so the grid field is a force density and
//!
//! `<spread(F), u>_grid = sum_p F_p . interpolate(u)_p`
//!
//! holds for the grid inner product `<a, b> = sum a b dV`.


use crate::errors::*;
use crate::mesh::{Grid, GridGeometry};
use crate::particle::ParticleSet;
use log::debug;
use ndarray::{Array, Array2, Array4, ArrayView4, Axis, Zip};
use rayon::prelude::*;

fn check_dof(particles: &ParticleSet, geometry: &GridGeometry) -> Result<()> {
    if particles.dof() != geometry.dof() {
        return configuration(format!(
            "particles carry {} dof, the grid {}",
            particles.dof(),
            geometry.dof()
        ));
    }
    Ok(())
}

/// Spreads the particle values onto a new field on the grid of `geometry`.
pub fn spread(particles: &ParticleSet, geometry: &GridGeometry) -> Result<Array4<f64>> {
    check_dof(particles, geometry)?;
    let locator = particles.locator(geometry)?;

    let shape = geometry.field_shape();
    let dof = geometry.dof();
    let values = particles.values();

    let mut field = (0..particles.len())
        .into_par_iter()
        .fold(
            || Array::zeros(shape),
            |mut acc: Array4<f64>, p| {
                let f = values.row(p);
                locator.stencil(p).for_each(|i, j, k, w| {
                    for d in 0..dof {
                        acc[[i, j, k, d]] += f[d] * w;
                    }
                });
                acc
            },
        )
        .reduce(
            || Array::zeros(shape),
            |mut a, b| {
                a += &b;
                a
            },
        );

    let dv = geometry.cell_volumes();
    Zip::from(&mut field)
        .and_broadcast(&dv)
        .par_for_each(|f, &dv| *f /= dv);

    debug!("Spread {} particles", particles.len());

    Ok(field)
}

/// Interpolates `field` onto the particles. Returns an `n x dof` array.
pub fn interpolate(
    field: &ArrayView4<f64>,
    geometry: &GridGeometry,
    particles: &ParticleSet,
) -> Result<Array2<f64>> {
    check_dof(particles, geometry)?;
    if field.dim() != geometry.field_shape() {
        return configuration(format!(
            "field of shape {:?} does not fit grid of shape {:?}",
            field.dim(),
            geometry.field_shape()
        ));
    }
    let locator = particles.locator(geometry)?;
    let dof = geometry.dof();

    let mut values = Array::zeros((particles.len(), dof));
    values
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(locator.stencils().par_iter())
        .for_each(|(mut u, stencil)| {
            stencil.for_each(|i, j, k, w| {
                for d in 0..dof {
                    u[d] += field[[i, j, k, d]] * w;
                }
            });
        });

    debug!("Interpolated onto {} particles", particles.len());

    Ok(values)
}

impl Grid {
    /// Spreads the particle values into the field of this grid.
    pub fn spread_from(&mut self, particles: &ParticleSet) -> Result<()> {
        let field = spread(particles, self.geometry())?;
        self.set_field(field)
    }

    /// Interpolates the field of this grid onto the particles.
    pub fn interpolate_onto(&self, particles: &ParticleSet) -> Result<Array2<f64>> {
        interpolate(&self.field().view(), self.geometry(), particles)
    }
}

impl ParticleSet {
    /// Replaces the particle values by the interpolated field of `grid`.
    pub fn interpolate_into(&mut self, grid: &Grid) -> Result<()> {
        let values = grid.interpolate_onto(self)?;
        self.set_values(values)
    }
}
