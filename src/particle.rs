//! Point particles carrying a force (before spreading) or a velocity (after
//! interpolation) per degree of freedom.
// Move unit test into own file
#[cfg(test)]
#[path = "./particle_test.rs"]
mod particle_test;

use crate::errors::*;
use crate::kernel::{KernelSpec, KernelTable};
use crate::locator::Locator;
use crate::mesh::GridGeometry;
use log::{debug, info};
use ndarray::{Array, Array2, ArrayView1};

pub fn modulo(f: f64, m: f64) -> f64 {
    let r = f % m;
    if r < 0.0 {
        r + m.abs()
    } else {
        r
    }
}

/// Position, size and kernel of a particle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Particle {
    pub position: [f64; 3],
    /// physical radius, sets the support of the kernel
    pub radius: f64,
    pub kernel: KernelSpec,
}

impl Particle {
    /// Half width of the kernel support of this particle.
    pub fn support_half_width(&self) -> f64 {
        self.kernel.support_half_width(self.radius)
    }
}

/// A set of particles with `dof` values each, stored as an `n x dof` array.
#[derive(Debug, Clone)]
pub struct ParticleSet {
    particles: Vec<Particle>,
    values: Array2<f64>,
    dof: usize,
    revision: u64,
    locator: Option<Locator>,
}

fn check_position(p: &[f64]) -> Result<()> {
    if p.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        configuration(format!("non-finite particle position {:?}", p))
    }
}

impl ParticleSet {
    /// Builds a particle set from flat arrays. `positions` holds three, and
    /// `forces` `dof` entries per particle. Every kernel has to be an entry
    /// of `table`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        table: &KernelTable,
        dof: usize,
        positions: &[f64],
        forces: &[f64],
        radii: &[f64],
        widths: &[usize],
        kernel_radii: &[f64],
        betas: &[f64],
    ) -> Result<ParticleSet> {
        if positions.len() % 3 != 0 {
            return configuration(format!(
                "got {} position coordinates, which is not a multiple of 3",
                positions.len()
            ));
        }
        let n = positions.len() / 3;

        for (name, len) in &[
            ("radii", radii.len()),
            ("kernel widths", widths.len()),
            ("kernel radii", kernel_radii.len()),
            ("kernel betas", betas.len()),
        ] {
            if *len != n {
                return configuration(format!(
                    "got {} {} for {} particles",
                    len, name, n
                ));
            }
        }

        let particles = positions
            .chunks(3)
            .zip(radii)
            .zip(widths.iter().zip(kernel_radii).zip(betas))
            .map(|((p, &radius), ((&w, &c), &beta))| -> Result<Particle> {
                Ok(Particle {
                    position: [p[0], p[1], p[2]],
                    radius,
                    kernel: table.lookup(w, c, beta)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        ParticleSet::from_particles(dof, particles, forces)
    }

    /// Builds a particle set from already validated kernels.
    pub fn from_particles(
        dof: usize,
        particles: Vec<Particle>,
        forces: &[f64],
    ) -> Result<ParticleSet> {
        if dof == 0 {
            return configuration("number of degrees of freedom per particle must be positive");
        }

        for p in &particles {
            check_position(&p.position)?;
            if !(p.radius.is_finite() && p.radius > 0.) {
                return configuration(format!(
                    "particle radius must be positive, got {}",
                    p.radius
                ));
            }
        }

        let mut set = ParticleSet {
            values: Array::zeros((particles.len(), dof)),
            particles,
            dof,
            revision: 0,
            locator: None,
        };
        set.set_forces(forces)?;

        debug!("New particle set of {} particles with {} dof", set.len(), dof);

        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn dof(&self) -> usize {
        self.dof
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Counter that increases with every change of positions.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Forces before spreading, velocities after interpolation.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn value(&self, i: usize) -> ArrayView1<f64> {
        self.values.row(i)
    }

    /// Replaces all forces, `dof` entries per particle.
    pub fn set_forces(&mut self, forces: &[f64]) -> Result<()> {
        if forces.len() != self.len() * self.dof {
            return configuration(format!(
                "got {} force components for {} particles with {} dof",
                forces.len(),
                self.len(),
                self.dof
            ));
        }

        for (v, f) in self.values.iter_mut().zip(forces) {
            *v = *f;
        }
        Ok(())
    }

    /// Overwrites the values with interpolated ones.
    pub fn set_values(&mut self, values: Array2<f64>) -> Result<()> {
        if values.dim() != (self.len(), self.dof) {
            return configuration(format!(
                "values of shape {:?} for {} particles with {} dof",
                values.dim(),
                self.len(),
                self.dof
            ));
        }
        self.values = values;
        Ok(())
    }

    /// Moves all particles. Any locator built before becomes stale.
    pub fn set_positions(&mut self, positions: &[f64]) -> Result<()> {
        if positions.len() != 3 * self.len() {
            return configuration(format!(
                "got {} position coordinates for {} particles",
                positions.len(),
                self.len()
            ));
        }
        check_position(positions)?;

        for (p, x) in self.particles.iter_mut().zip(positions.chunks(3)) {
            p.position = [x[0], x[1], x[2]];
        }
        self.revision += 1;
        Ok(())
    }

    /// Moves a single particle. Any locator built before becomes stale.
    pub fn set_position(&mut self, i: usize, position: [f64; 3]) -> Result<()> {
        check_position(&position)?;
        match self.particles.get_mut(i) {
            Some(p) => p.position = position,
            None => {
                return configuration(format!(
                    "particle index {} out of range for {} particles",
                    i,
                    self.particles.len()
                ))
            }
        }
        self.revision += 1;
        Ok(())
    }

    /// Sum of the values over all particles per degree of freedom.
    pub fn total(&self) -> Vec<f64> {
        self.values.sum_axis(ndarray::Axis(0)).to_vec()
    }

    /// Builds the locator of all particles for the given grid. On failure no
    /// locator is kept.
    pub fn setup(&mut self, geometry: &GridGeometry) -> Result<()> {
        self.locator = None;
        let locator = Locator::build(&self.particles, self.revision, geometry)?;
        info!(
            "Located {} particles, {} support nodes in total",
            self.len(),
            locator.support_size()
        );
        self.locator = Some(locator);
        Ok(())
    }

    /// Returns the locator if it was built for the current positions and the
    /// given grid.
    pub fn locator(&self, geometry: &GridGeometry) -> Result<&Locator> {
        match self.locator {
            None => stale("particles were not set up on a grid"),
            Some(ref l) if !l.is_current(self.revision, geometry) => {
                stale("locator out of date")
            }
            Some(ref l) => Ok(l),
        }
    }
}
