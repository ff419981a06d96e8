//! Spread, transform, solve, transform back and interpolate, in this order
//! only.
//!
//! The pipeline owns the grid, the particles and the output of the stage
//! that ran last. Every step checks that the previous one completed and
//! otherwise fails with a stale state error. A failing step discards all
//! intermediate results and leaves the pipeline ready to spread again.

use crate::errors::*;
use crate::flowfield::{check_viscosity, solver_for, StokesSolver, ZeroModePolicy};
use crate::mesh::Grid;
use crate::particle::ParticleSet;
use crate::transform::{SpectralField, TransformEngine};
use log::{debug, info};
use ndarray::{Array2, Array4};

/// Current state of the pipeline together with the output of the last
/// stage.
#[derive(Debug)]
pub enum Stage {
    Constructed,
    GridReady,
    SpeciesSetup,
    /// force density on the grid
    Spread(Array4<f64>),
    /// force density coefficients
    ForwardTransform(SpectralField),
    /// velocity coefficients
    Solve(SpectralField),
    /// velocity on the grid
    BackwardTransform(Array4<f64>),
    /// particle velocities
    Interpolate(Array2<f64>),
    Done,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match *self {
            Stage::Constructed => "constructed",
            Stage::GridReady => "grid ready",
            Stage::SpeciesSetup => "species set up",
            Stage::Spread(_) => "spread",
            Stage::ForwardTransform(_) => "forward transform",
            Stage::Solve(_) => "solve",
            Stage::BackwardTransform(_) => "backward transform",
            Stage::Interpolate(_) => "interpolate",
            Stage::Done => "done",
        }
    }
}

fn out_of_order<T>(step: &str, stage: &Stage) -> Result<T> {
    stale(format!("cannot {} in stage '{}'", step, stage.name()))
}

pub struct Pipeline {
    viscosity: f64,
    policy: ZeroModePolicy,
    grid: Option<Grid>,
    transform: Option<TransformEngine>,
    solver: Option<Box<dyn StokesSolver>>,
    particles: Option<ParticleSet>,
    stage: Stage,
}

impl Pipeline {
    pub fn new(viscosity: f64, policy: ZeroModePolicy) -> Result<Pipeline> {
        check_viscosity(viscosity)?;
        Ok(Pipeline {
            viscosity,
            policy,
            grid: None,
            transform: None,
            solver: None,
            particles: None,
            stage: Stage::Constructed,
        })
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn particles(&self) -> Option<&ParticleSet> {
        self.particles.as_ref()
    }

    /// Installs a new grid and plans transforms and solver for it. Particles
    /// already present have to be set up again.
    pub fn set_grid(&mut self, grid: Grid) -> Result<()> {
        let transform = TransformEngine::new(grid.geometry())?;
        let solver = solver_for(grid.geometry(), self.viscosity, self.policy)?;

        info!(
            "Grid {:?} with {} dof",
            grid.geometry().size().as_array(),
            grid.geometry().dof()
        );

        self.grid = Some(grid);
        self.transform = Some(transform);
        self.solver = Some(solver);
        self.stage = Stage::GridReady;
        Ok(())
    }

    /// Takes ownership of the particles and locates them on the grid.
    pub fn set_particles(&mut self, particles: ParticleSet) -> Result<()> {
        self.particles = Some(particles);
        self.setup()
    }

    /// Locates the particles on the grid.
    pub fn setup(&mut self) -> Result<()> {
        let grid = match (&self.stage, &self.grid) {
            (Stage::Constructed, _) | (_, None) => {
                return out_of_order("set up particles", &self.stage)
            }
            (_, Some(g)) => g,
        };
        let particles = match self.particles {
            Some(ref mut p) => p,
            None => return stale("no particles to set up"),
        };

        // no locator survives a failed setup
        self.stage = Stage::GridReady;
        particles.setup(grid.geometry())?;
        self.stage = Stage::SpeciesSetup;

        info!("{} particles set up", particles.len());
        Ok(())
    }

    /// Replaces the particle forces. Only possible before spreading.
    pub fn set_forces(&mut self, forces: &[f64]) -> Result<()> {
        match (&self.stage, &mut self.particles) {
            (Stage::SpeciesSetup, Some(p)) => p.set_forces(forces),
            (stage, _) => out_of_order("change forces", stage),
        }
    }

    /// Moves the particles and sets them up again.
    pub fn move_particles(&mut self, positions: &[f64]) -> Result<()> {
        match self.particles {
            Some(ref mut p) if self.grid.is_some() => p.set_positions(positions)?,
            _ => return out_of_order("move particles", &self.stage),
        }
        self.setup()
    }

    /// Discards all intermediate results.
    pub fn restart(&mut self) -> Result<()> {
        match self.stage {
            Stage::Constructed | Stage::GridReady => out_of_order("restart", &self.stage),
            _ => {
                debug!("Restart from stage '{}'", self.stage.name());
                self.stage = Stage::SpeciesSetup;
                Ok(())
            }
        }
    }

    fn advance(&mut self, next: Result<Stage>) -> Result<()> {
        match next {
            Ok(stage) => {
                debug!("Stage '{}' completed", stage.name());
                self.stage = stage;
                Ok(())
            }
            Err(e) => {
                self.stage = Stage::SpeciesSetup;
                Err(e)
            }
        }
    }

    fn ready_grid(&self) -> Result<&Grid> {
        match self.grid {
            Some(ref g) => Ok(g),
            None => stale("no grid"),
        }
    }

    fn ready_particles(&self) -> Result<&ParticleSet> {
        match self.particles {
            Some(ref p) => Ok(p),
            None => stale("no particles"),
        }
    }

    fn ready_transform(&self) -> Result<&TransformEngine> {
        match self.transform {
            Some(ref t) => Ok(t),
            None => stale("no transforms planned"),
        }
    }

    pub fn spread(&mut self) -> Result<()> {
        let next = match self.stage {
            Stage::SpeciesSetup => {
                let grid = self.ready_grid()?;
                crate::spread::spread(self.ready_particles()?, grid.geometry()).map(Stage::Spread)
            }
            ref stage => return out_of_order("spread", stage),
        };
        self.advance(next)
    }

    pub fn forward(&mut self) -> Result<()> {
        let next = match self.stage {
            Stage::Spread(ref field) => self
                .ready_transform()?
                .forward(&field.view())
                .map(Stage::ForwardTransform),
            ref stage => return out_of_order("transform forward", stage),
        };
        self.advance(next)
    }

    pub fn solve(&mut self) -> Result<()> {
        let next = match (&self.stage, &self.solver) {
            (Stage::ForwardTransform(f), Some(solver)) => solver.solve(f).map(Stage::Solve),
            (stage, _) => return out_of_order("solve", stage),
        };
        self.advance(next)
    }

    pub fn backward(&mut self) -> Result<()> {
        let next = match self.stage {
            Stage::Solve(ref u) => self
                .ready_transform()?
                .backward(u)
                .map(Stage::BackwardTransform),
            ref stage => return out_of_order("transform backward", stage),
        };
        self.advance(next)
    }

    /// Interpolates the velocity onto the particles. The velocity field is
    /// kept in the grid, the particle forces stay untouched so that a
    /// restarted pipeline spreads them again.
    pub fn interpolate(&mut self) -> Result<()> {
        let field = match std::mem::replace(&mut self.stage, Stage::SpeciesSetup) {
            Stage::BackwardTransform(field) => field,
            stage => {
                let err = out_of_order("interpolate", &stage);
                self.stage = stage;
                return err;
            }
        };

        let next = match (&mut self.grid, &self.particles) {
            (Some(grid), Some(particles)) => grid
                .set_field(field)
                .and_then(|_| grid.interpolate_onto(particles))
                .map(Stage::Interpolate),
            _ => stale("no grid or particles"),
        };
        self.advance(next)
    }

    /// Returns the particle velocities and completes the pipeline.
    pub fn finish(&mut self) -> Result<Array2<f64>> {
        match std::mem::replace(&mut self.stage, Stage::Done) {
            Stage::Interpolate(values) => {
                info!("Velocities of {} particles computed", values.nrows());
                Ok(values)
            }
            stage => {
                let err = out_of_order("finish", &stage);
                self.stage = stage;
                err
            }
        }
    }

    /// Runs all remaining stages and returns the particle velocities.
    pub fn run(&mut self) -> Result<Array2<f64>> {
        loop {
            match self.stage {
                Stage::SpeciesSetup => self.spread()?,
                Stage::Spread(_) => self.forward()?,
                Stage::ForwardTransform(_) => self.solve()?,
                Stage::Solve(_) => self.backward()?,
                Stage::BackwardTransform(_) => self.interpolate()?,
                Stage::Interpolate(_) => return self.finish(),
                ref stage => return out_of_order("run", stage),
            }
        }
    }
}
