//! Parameter file of the driver.
//!
//! ```toml
//! [grid]
//! size = [32, 32, 32]
//! spacing = [0.5, 0.5, 0.5]
//! geometry = "triply_periodic"
//!
//! [solver]
//! viscosity = 1.0
//!
//! [[particles]]
//! position = [8.0, 8.0, 8.0]
//! force = [1.0, 0.0, 0.0]
//! kernel_width = 6
//! ```
//!
//! For a doubly periodic slab `geometry = "doubly_periodic"` and
//! `z_range = [bottom, top]` have to be given, `size[2]` is then the number
//! of Chebyshev points and `spacing[2]` is ignored.

use crate::errors::*;
use crate::flowfield::{solver_for, StokesSolver, ZeroModePolicy};
use crate::kernel::KernelTable;
use crate::mesh::{Grid, GridGeometry};
use crate::particle::{Particle, ParticleSet};
use crate::pipeline::Pipeline;
use crate::{GridSize, Spacing};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::prelude::*;

fn default_dof() -> usize {
    3
}

fn default_geometry() -> Geometry {
    Geometry::TriplyPeriodic
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    TriplyPeriodic,
    DoublyPeriodic,
}

/// Structure that holds settings, which are defined externally in a TOML
/// file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub grid: GridSettings,
    pub solver: SolverSettings,
    #[serde(default)]
    pub particles: Vec<ParticleSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridSettings {
    pub size: [usize; 3],
    pub spacing: [f64; 3],
    #[serde(default = "default_dof")]
    pub dof: usize,
    #[serde(default = "default_geometry")]
    pub geometry: Geometry,
    #[serde(default)]
    pub z_range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverSettings {
    pub viscosity: f64,
    #[serde(default)]
    pub zero_mode: ZeroModePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticleSettings {
    pub position: [f64; 3],
    pub force: Vec<f64>,
    pub kernel_width: usize,
    /// physical radius, by default the reference radius of the kernel times
    /// the grid spacing along x
    #[serde(default)]
    pub radius: Option<f64>,
}

/// Reads the content of a file `param_file` into a string.
fn read_from_file(filename: &str) -> Result<String> {
    let mut f = File::open(filename).chain_err(|| "Unable to open file.")?;
    let mut content = String::new();

    f.read_to_string(&mut content)
        .chain_err(|| "Unable to read file.")?;

    Ok(content)
}

/// Reads the parameter file and validates its content.
pub fn read_parameter_file(param_file: &str) -> Result<Settings> {
    let toml_string = read_from_file(param_file)
        .chain_err(|| format!("Unable to read parameter file '{}'.", param_file))?;

    Settings::from_toml_str(&toml_string)
}

fn check_settings(settings: &Settings) -> Result<()> {
    let grid = &settings.grid;

    match (grid.geometry, grid.z_range) {
        (Geometry::DoublyPeriodic, None) => {
            return configuration("a doubly periodic grid needs 'z_range = [bottom, top]'")
        }
        (Geometry::DoublyPeriodic, Some([bottom, top])) if !(top > bottom) => {
            return configuration(format!(
                "empty z range [{}, {}]",
                bottom, top
            ))
        }
        (Geometry::TriplyPeriodic, Some(_)) => {
            warn!("'z_range' is ignored for a triply periodic grid")
        }
        _ => {}
    }

    for (i, p) in settings.particles.iter().enumerate() {
        if p.force.len() != grid.dof {
            return configuration(format!(
                "particle {} has {} force components, but the grid has {} dof",
                i,
                p.force.len(),
                grid.dof
            ));
        }
    }

    if settings.particles.is_empty() {
        warn!("No particles given.");
    }

    Ok(())
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Settings> {
        let settings: Settings =
            toml::from_str(s).chain_err(|| "Unable to parse parameter file.")?;

        check_settings(&settings)?;
        Ok(settings)
    }

    pub fn build_geometry(&self) -> Result<GridGeometry> {
        let g = &self.grid;
        let [nx, ny, nz] = g.size;
        let [hx, hy, hz] = g.spacing;

        match (g.geometry, g.z_range) {
            (Geometry::DoublyPeriodic, Some([bottom, top])) => {
                GridGeometry::doubly_periodic(nx, ny, hx, hy, nz, bottom, top - bottom, g.dof)
            }
            (Geometry::DoublyPeriodic, None) => {
                configuration("a doubly periodic grid needs 'z_range = [bottom, top]'")
            }
            (Geometry::TriplyPeriodic, _) => GridGeometry::periodic(
                GridSize {
                    x: nx,
                    y: ny,
                    z: nz,
                },
                Spacing {
                    x: hx,
                    y: hy,
                    z: hz,
                },
                g.dof,
            ),
        }
    }

    pub fn build_grid(&self) -> Result<Grid> {
        Ok(Grid::new(self.build_geometry()?))
    }

    /// Particles with the kernels of `table` selected by width.
    pub fn build_particles(&self, table: &KernelTable) -> Result<ParticleSet> {
        let h = self.grid.spacing[0];

        let particles = self
            .particles
            .iter()
            .map(|p| -> Result<Particle> {
                let kernel = table.by_width(p.kernel_width)?;
                Ok(Particle {
                    position: p.position,
                    radius: p.radius.unwrap_or(kernel.radius * h),
                    kernel,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let forces: Vec<f64> = self
            .particles
            .iter()
            .flat_map(|p| p.force.iter().cloned())
            .collect();

        ParticleSet::from_particles(self.grid.dof, particles, &forces)
    }

    pub fn build_solver(&self) -> Result<Box<dyn StokesSolver>> {
        solver_for(
            &self.build_geometry()?,
            self.solver.viscosity,
            self.solver.zero_mode,
        )
    }

    /// Pipeline with grid and particles set up, ready to spread.
    pub fn build_pipeline(&self, table: &KernelTable) -> Result<Pipeline> {
        let mut pipeline = Pipeline::new(self.solver.viscosity, self.solver.zero_mode)?;
        pipeline.set_grid(self.build_grid()?)?;
        pipeline.set_particles(self.build_particles(table)?)?;
        Ok(pipeline)
    }
}
