//! Background grid description and the grid-valued field buffer.
//!
//! Fields are stored as `Array4<f64>` of shape `(Nx, Ny, Nz, dof)` in
//! standard layout, so the degrees of freedom of a node are contiguous.

use crate::errors::*;
use crate::{GridSize, Spacing};
use log::debug;
use ndarray::{Array, Array4, ArrayView4, Axis, Ix1, Ix4, Zip};
use serde::{Deserialize, Serialize};

pub mod chebyshev;
pub mod fft_helper;

/// Discretisation of one grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    /// Uniform nodes `i * h` with periodic wrap-around.
    Periodic,
    /// Non-periodic axis discretised at Chebyshev extrema points.
    Chebyshev,
}

/// Collocation points and Clenshaw-Curtis weights of a Chebyshev axis. The
/// points are ordered from the top of the axis to the bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct ChebyshevAxis {
    pub points: Vec<f64>,
    pub weights: Vec<f64>,
}

impl ChebyshevAxis {
    /// Chebyshev axis on `[z0, z0 + length]` with `n` points.
    pub fn new(n: usize, z0: f64, length: f64) -> Result<ChebyshevAxis> {
        let (points, weights) = chebyshev::clencurt(n, z0, z0 + length)?;
        Ok(ChebyshevAxis { points, weights })
    }

    pub fn top(&self) -> f64 {
        self.points[0]
    }

    pub fn bottom(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    pub fn half_height(&self) -> f64 {
        0.5 * (self.top() - self.bottom())
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.top() + self.bottom())
    }
}

/// Immutable description of the background grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    size: GridSize,
    spacing: Spacing,
    axes: [AxisKind; 3],
    dof: usize,
    chebyshev: Option<ChebyshevAxis>,
}

impl GridGeometry {
    /// Validates and returns a new grid geometry.
    ///
    /// Only the z axis may be a Chebyshev axis, in which case its points and
    /// weights have to be given and match the extent along z.
    pub fn new(
        size: GridSize,
        spacing: Spacing,
        axes: [AxisKind; 3],
        dof: usize,
        chebyshev: Option<ChebyshevAxis>,
    ) -> Result<GridGeometry> {
        let n = size.as_array();
        let h = spacing.as_array();

        if n.iter().any(|&v| v == 0) {
            return configuration(format!("grid extents must be positive, got {:?}", n));
        }

        if dof == 0 {
            return configuration("number of degrees of freedom per node must be positive");
        }

        if axes[0] != AxisKind::Periodic || axes[1] != AxisKind::Periodic {
            return configuration("only the z axis may be non-periodic");
        }

        for (a, (kind, h)) in axes.iter().zip(h.iter()).enumerate() {
            if *kind == AxisKind::Periodic && !(h.is_finite() && *h > 0.) {
                return configuration(format!(
                    "spacing along axis {} must be positive and finite, got {}",
                    a, h
                ));
            }
        }

        match (axes[2], &chebyshev) {
            (AxisKind::Chebyshev, None) => {
                return configuration("Chebyshev axis lacks collocation points and weights");
            }
            (AxisKind::Chebyshev, Some(c)) => {
                if size.z < 2 {
                    return configuration("a Chebyshev axis needs at least two points");
                }
                if c.points.len() != size.z || c.weights.len() != size.z {
                    return configuration(format!(
                        "Chebyshev axis has {} points and {} weights, but the grid has {} nodes \
                         along z",
                        c.points.len(),
                        c.weights.len(),
                        size.z
                    ));
                }
                if c.points.windows(2).any(|w| !(w[0] > w[1])) {
                    return configuration(
                        "Chebyshev points must be strictly decreasing from top to bottom",
                    );
                }
                if c.weights.iter().any(|w| !(w.is_finite() && *w > 0.)) {
                    return configuration("Chebyshev quadrature weights must be positive");
                }
            }
            (AxisKind::Periodic, Some(_)) => {
                return configuration("collocation points given for a periodic z axis");
            }
            (AxisKind::Periodic, None) => {}
        }

        Ok(GridGeometry {
            size,
            spacing,
            axes,
            dof,
            chebyshev,
        })
    }

    /// Triply periodic grid.
    pub fn periodic(size: GridSize, spacing: Spacing, dof: usize) -> Result<GridGeometry> {
        GridGeometry::new(size, spacing, [AxisKind::Periodic; 3], dof, None)
    }

    /// Grid periodic in x and y with `nz` Chebyshev points on `[z0, z0 +
    /// lz]`.
    pub fn doubly_periodic(
        nx: usize,
        ny: usize,
        hx: f64,
        hy: f64,
        nz: usize,
        z0: f64,
        lz: f64,
        dof: usize,
    ) -> Result<GridGeometry> {
        if !(lz.is_finite() && lz > 0.) {
            return configuration(format!("z extent must be positive, got {}", lz));
        }
        let cheb = ChebyshevAxis::new(nz, z0, lz)?;
        let spacing = Spacing {
            x: hx,
            y: hy,
            z: 0.,
        };
        GridGeometry::new(
            GridSize {
                x: nx,
                y: ny,
                z: nz,
            },
            spacing,
            [AxisKind::Periodic, AxisKind::Periodic, AxisKind::Chebyshev],
            dof,
            Some(cheb),
        )
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn spacing(&self) -> Spacing {
        self.spacing
    }

    pub fn axes(&self) -> [AxisKind; 3] {
        self.axes
    }

    pub fn dof(&self) -> usize {
        self.dof
    }

    pub fn chebyshev(&self) -> Option<&ChebyshevAxis> {
        self.chebyshev.as_ref()
    }

    pub fn is_doubly_periodic(&self) -> bool {
        self.axes[2] == AxisKind::Chebyshev
    }

    /// Shape of a field living on this grid.
    pub fn field_shape(&self) -> (usize, usize, usize, usize) {
        (self.size.x, self.size.y, self.size.z, self.dof)
    }

    /// Length of a periodic axis, `N * h`. On the Chebyshev axis this is the
    /// height of the slab.
    pub fn length(&self, axis: usize) -> f64 {
        match (self.axes[axis], &self.chebyshev) {
            (AxisKind::Chebyshev, Some(c)) => c.top() - c.bottom(),
            _ => self.size.as_array()[axis] as f64 * self.spacing.as_array()[axis],
        }
    }

    /// Coordinate of node `i` along `axis`.
    pub fn coordinate(&self, axis: usize, i: usize) -> f64 {
        match (self.axes[axis], &self.chebyshev) {
            (AxisKind::Chebyshev, Some(c)) => c.points[i],
            _ => i as f64 * self.spacing.as_array()[axis],
        }
    }

    /// One dimensional quadrature weights of every node along `axis`. The
    /// volume of a cell is the product of the three weights.
    pub fn quadrature(&self, axis: usize) -> Array<f64, Ix1> {
        match (self.axes[axis], &self.chebyshev) {
            (AxisKind::Chebyshev, Some(c)) => Array::from(c.weights.clone()),
            _ => Array::from_elem(self.size.as_array()[axis], self.spacing.as_array()[axis]),
        }
    }

    /// Cell volumes with the field layout, broadcastable against a field.
    pub fn cell_volumes(&self) -> Array<f64, Ix4> {
        let qx = self.quadrature(0);
        let qy = self.quadrature(1);
        let qz = self.quadrature(2);

        let mut dv = Array::zeros((self.size.x, self.size.y, self.size.z, 1));
        Zip::indexed(&mut dv).for_each(|(i, j, k, _), v| *v = qx[i] * qy[j] * qz[k]);
        dv
    }

    /// Weighted inner product `sum a * b * dV` of two fields on this grid.
    pub fn inner_product(&self, a: &ArrayView4<f64>, b: &ArrayView4<f64>) -> Result<f64> {
        let shape = self.field_shape();
        if a.dim() != shape || b.dim() != shape {
            return configuration(format!(
                "inner product of fields with shapes {:?} and {:?} on grid {:?}",
                a.dim(),
                b.dim(),
                shape
            ));
        }

        let dv = self.cell_volumes();
        let s = a
            .axis_iter(Axis(0))
            .zip(b.axis_iter(Axis(0)))
            .zip(dv.axis_iter(Axis(0)))
            .map(|((a, b), dv)| {
                let mut s = 0.;
                Zip::from(&a)
                    .and(&b)
                    .and_broadcast(&dv)
                    .for_each(|a, b, dv| s += a * b * dv);
                s
            })
            .sum();

        Ok(s)
    }
}

/// Grid descriptor together with the field buffer it owns.
#[derive(Debug, Clone)]
pub struct Grid {
    geometry: GridGeometry,
    field: Array4<f64>,
}

impl Grid {
    /// Returns a zero initialised grid.
    pub fn new(geometry: GridGeometry) -> Grid {
        debug!(
            "New grid {:?} with {} dof per node, doubly periodic: {}",
            geometry.size.as_array(),
            geometry.dof,
            geometry.is_doubly_periodic()
        );
        let field = Array::zeros(geometry.field_shape());
        Grid { geometry, field }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn field(&self) -> &Array4<f64> {
        &self.field
    }

    /// Replaces the field buffer. Its shape has to match the grid exactly.
    pub fn set_field(&mut self, field: Array4<f64>) -> Result<()> {
        if field.dim() != self.geometry.field_shape() {
            return configuration(format!(
                "field of shape {:?} does not fit grid of shape {:?}",
                field.dim(),
                self.geometry.field_shape()
            ));
        }
        self.field = field;
        Ok(())
    }

    /// Returns the field with the given shape as a flat vector with the
    /// degrees of freedom varying fastest.
    pub fn flat_field(&self) -> Vec<f64> {
        self.field.iter().cloned().collect()
    }
}

/// Samples per-axis values into a mesh with the components along the last
/// axis: `res[i, j, m, c] -> k_c[i, j, m]`.
pub fn mesh3d<T: Clone + Default>(k: &[Array<T, Ix1>]) -> Array<T, Ix4> {
    let sh_x = k[0].len();
    let sh_y = k[1].len();
    let sh_z = k[2].len();

    let mut res = Array::from_elem([sh_x, sh_y, sh_z, 3], T::default());

    // first component varies along first axis of field
    for (kx, mut x) in k[0]
        .iter()
        .zip(res.index_axis_mut(Axis(3), 0).axis_iter_mut(Axis(0)))
    {
        x.fill(kx.clone());
    }

    // second component varies along second axis of field
    for (ky, mut y) in k[1]
        .iter()
        .zip(res.index_axis_mut(Axis(3), 1).axis_iter_mut(Axis(1)))
    {
        y.fill(ky.clone());
    }

    // third component varies along third axis of field
    for (kz, mut z) in k[2]
        .iter()
        .zip(res.index_axis_mut(Axis(3), 2).axis_iter_mut(Axis(2)))
    {
        z.fill(kz.clone());
    }

    res
}
