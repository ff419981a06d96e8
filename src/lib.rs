//! This crate computes the velocities induced by point forces immersed in a
//! periodic Stokes flow. Forces are spread onto a regular background grid with
//! an exponential-of-semicircle kernel, the grid forcing is transformed to
//! spectral space, the Stokes equations are solved algebraically per
//! wavenumber and the resulting velocity field is transformed back and
//! interpolated onto the particles again.
//!
//! Two geometries are supported: triply periodic boxes and doubly periodic
//! slabs with a Chebyshev collocated, unbounded z direction. The individual
//! stages are exposed on their own (`spread`, `transform`, `flowfield`), the
//! `pipeline` module strings them together in the only valid order.

#![recursion_limit = "1024"]

#[macro_use]
extern crate error_chain;

pub mod consts;
pub mod errors;
pub mod flowfield;
pub mod kernel;
pub mod locator;
pub mod mesh;
pub mod particle;
pub mod pipeline;
pub mod settings;
pub mod spread;
pub mod transform;

#[cfg(test)]
mod test_helper;

use serde::{Deserialize, Serialize};

/// Number of grid points along every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl GridSize {
    pub fn as_array(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }

    /// Total number of grid nodes.
    pub fn nodes(&self) -> usize {
        self.x * self.y * self.z
    }
}

/// Grid spacing along every axis. On a Chebyshev axis the entry is unused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Spacing {
    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}
