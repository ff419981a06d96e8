//! Grid nodes and kernel weights in the support of every particle.
//!
//! The kernel is separable, so a stencil stores per axis the node indices in
//! the support and their normalised one dimensional weights. The weight of a
//! node is the product of its three axis weights.

use crate::errors::*;
use crate::kernel::KernelSpec;
use crate::mesh::{AxisKind, ChebyshevAxis, GridGeometry};
use crate::particle::{modulo, Particle};
use itertools::izip;
use log::{debug, warn};
use rayon::prelude::*;

/// Support of a single particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Stencil {
    pub indices: [Vec<usize>; 3],
    pub weights: [Vec<f64>; 3],
}

impl Stencil {
    /// Number of grid nodes in the support.
    pub fn len(&self) -> usize {
        self.indices.iter().map(|i| i.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls `f(i, j, k, weight)` for every node of the support.
    pub fn for_each<F: FnMut(usize, usize, usize, f64)>(&self, mut f: F) {
        for (&i, &wx) in izip!(&self.indices[0], &self.weights[0]) {
            for (&j, &wy) in izip!(&self.indices[1], &self.weights[1]) {
                let wxy = wx * wy;
                for (&k, &wz) in izip!(&self.indices[2], &self.weights[2]) {
                    f(i, j, k, wxy * wz);
                }
            }
        }
    }
}

/// Stencils of all particles of a particle set, tied to the positions and the
/// grid they were computed for.
#[derive(Debug, Clone)]
pub struct Locator {
    stencils: Vec<Stencil>,
    revision: u64,
    geometry: GridGeometry,
}

impl Locator {
    /// Locates all particles on the grid. Fails with a domain error if the
    /// support of a single particle does not fit.
    pub fn build(
        particles: &[Particle],
        revision: u64,
        geometry: &GridGeometry,
    ) -> Result<Locator> {
        let stencils = particles
            .par_iter()
            .map(|p| stencil(p, geometry))
            .collect::<Result<Vec<_>>>()?;

        if let Some(s) = stencils.first() {
            debug!(
                "Support of the first particle: {:?} nodes",
                [s.indices[0].len(), s.indices[1].len(), s.indices[2].len()]
            );
        }

        Ok(Locator {
            stencils,
            revision,
            geometry: geometry.clone(),
        })
    }

    /// Returns true if the locator was built for this revision of the
    /// positions and this grid.
    pub fn is_current(&self, revision: u64, geometry: &GridGeometry) -> bool {
        self.revision == revision && self.geometry == *geometry
    }

    pub fn stencils(&self) -> &[Stencil] {
        &self.stencils
    }

    pub fn stencil(&self, i: usize) -> &Stencil {
        &self.stencils[i]
    }

    /// Total number of support nodes over all particles.
    pub fn support_size(&self) -> usize {
        self.stencils.iter().map(|s| s.len()).sum()
    }
}

fn stencil(p: &Particle, geometry: &GridGeometry) -> Result<Stencil> {
    let alpha = p.support_half_width();
    let n = geometry.size().as_array();
    let h = geometry.spacing().as_array();

    let mut indices: [Vec<usize>; 3] = Default::default();
    let mut weights: [Vec<f64>; 3] = Default::default();

    for a in 0..3 {
        let (i, w) = match (geometry.axes()[a], geometry.chebyshev()) {
            (AxisKind::Chebyshev, Some(cheb)) => {
                chebyshev_axis(p.position[a], alpha, &p.kernel, cheb)?
            }
            _ => periodic_axis(p.position[a], alpha, &p.kernel, h[a], n[a])?,
        };
        indices[a] = i;
        weights[a] = w;
    }

    Ok(Stencil { indices, weights })
}

fn normalise(phi: &mut [f64], x: f64) -> Result<()> {
    let sum: f64 = phi.iter().sum();
    if !(sum > 0.) {
        return domain(format!("kernel support at {} contains no grid node", x));
    }
    for v in phi.iter_mut() {
        *v /= sum;
    }
    Ok(())
}

/// Support along a periodic axis of `n` nodes with spacing `h`.
fn periodic_axis(
    x: f64,
    alpha: f64,
    kernel: &KernelSpec,
    h: f64,
    n: usize,
) -> Result<(Vec<usize>, Vec<f64>)> {
    let width = (2. * alpha / h).round() as usize;
    if width == 0 {
        return domain(format!(
            "kernel support {} is too small for grid spacing {}",
            2. * alpha,
            h
        ));
    }
    if width > n {
        return domain(format!(
            "kernel support of {} points exceeds the periodic extent of {} points",
            width, n
        ));
    }
    if 2 * width > n {
        warn!(
            "kernel support of {} points covers more than half of the {} periodic points",
            width, n
        );
    }

    let x = modulo(x, n as f64 * h);
    let start = if width % 2 == 1 {
        (x / h).round() as isize - ((width - 1) / 2) as isize
    } else {
        (x / h).floor() as isize - (width / 2) as isize + 1
    };

    let mut indices = Vec::with_capacity(width);
    let mut phi = Vec::with_capacity(width);
    for i in start..start + width as isize {
        // the unwrapped node is the nearest image of the wrapped one
        indices.push(modulo(i as f64, n as f64) as usize);
        phi.push(kernel.evaluate(x - i as f64 * h, alpha));
    }
    normalise(&mut phi, x)?;

    Ok((indices, phi))
}

/// Support along the Chebyshev axis: all nodes within the half width.
fn chebyshev_axis(
    z: f64,
    alpha: f64,
    kernel: &KernelSpec,
    cheb: &ChebyshevAxis,
) -> Result<(Vec<usize>, Vec<f64>)> {
    if z - alpha < cheb.bottom() || z + alpha > cheb.top() {
        return domain(format!(
            "kernel support [{}, {}] leaves the domain [{}, {}]",
            z - alpha,
            z + alpha,
            cheb.bottom(),
            cheb.top()
        ));
    }

    let mut indices = Vec::new();
    let mut phi = Vec::new();
    for (k, (&zk, &q)) in cheb.points.iter().zip(&cheb.weights).enumerate() {
        let r = z - zk;
        if r.abs() <= alpha {
            indices.push(k);
            phi.push(kernel.evaluate(r, alpha) * q);
        }
    }
    if indices.is_empty() {
        return domain(format!("kernel support at z = {} contains no grid node", z));
    }
    normalise(&mut phi, z)?;

    Ok((indices, phi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::KernelTable;
    use crate::test_helper::close_floats;
    use crate::{GridSize, Spacing};

    fn periodic(n: usize, h: f64) -> GridGeometry {
        GridGeometry::periodic(
            GridSize { x: n, y: n, z: n },
            Spacing { x: h, y: h, z: h },
            1,
        )
        .unwrap()
    }

    fn particle(width: usize, position: [f64; 3], h: f64) -> Particle {
        let kernel = KernelTable::default().by_width(width).unwrap();
        Particle {
            position,
            radius: kernel.radius * h,
            kernel,
        }
    }

    #[test]
    fn support_width_matches_kernel_width() {
        let g = periodic(16, 0.5);
        for &w in &[4, 5, 6] {
            for &x in &[0.0, 0.1, 0.26, 3.33, 7.9] {
                let p = particle(w, [x, x, x], 0.5);
                let s = stencil(&p, &g).unwrap();
                for a in 0..3 {
                    assert_eq!(s.indices[a].len(), w);
                    let sum: f64 = s.weights[a].iter().sum();
                    assert!(close_floats(sum, 1., 1e-14));
                }
                assert_eq!(s.len(), w * w * w);
            }
        }
    }

    #[test]
    fn odd_width_centred_on_nearest_node() {
        let g = periodic(16, 1.);
        let p = particle(5, [3.4, 3.6, 3.], 1.);
        let s = stencil(&p, &g).unwrap();
        assert_eq!(s.indices[0], vec![1, 2, 3, 4, 5]);
        assert_eq!(s.indices[1], vec![2, 3, 4, 5, 6]);
        // symmetric weights around a node
        let w = &s.weights[2];
        assert!(close_floats(w[0], w[4], 1e-15));
        assert!(close_floats(w[1], w[3], 1e-15));
    }

    #[test]
    fn even_width_centred_on_cell() {
        let g = periodic(16, 1.);
        let p = particle(4, [3.4, 3.9, 0.5], 1.);
        let s = stencil(&p, &g).unwrap();
        assert_eq!(s.indices[0], vec![2, 3, 4, 5]);
        assert_eq!(s.indices[1], vec![2, 3, 4, 5]);
        assert_eq!(s.indices[2], vec![15, 0, 1, 2]);
    }

    #[test]
    fn wraps_around_periodic_boundary() {
        let g = periodic(8, 1.);
        let p = particle(6, [-0.2, 7.9, 8.1], 1.);
        let s = stencil(&p, &g).unwrap();
        assert_eq!(s.indices[0], vec![5, 6, 7, 0, 1, 2]);
        assert_eq!(s.indices[1], vec![5, 6, 7, 0, 1, 2]);
        assert_eq!(s.indices[2], vec![6, 7, 0, 1, 2, 3]);

        // same weights as the unshifted image
        let q = particle(6, [7.8, 7.9, 0.1], 1.);
        let t = stencil(&q, &g).unwrap();
        for a in 0..3 {
            for (u, v) in s.weights[a].iter().zip(&t.weights[a]) {
                assert!(close_floats(*u, *v, 1e-12));
            }
        }
    }

    #[test]
    fn rejects_support_larger_than_box() {
        let g = periodic(4, 1.);
        let p = particle(6, [1., 1., 1.], 1.);
        match stencil(&p, &g) {
            Err(Error(ErrorKind::Domain(_), _)) => {}
            _ => panic!("expected domain error"),
        }
    }

    #[test]
    fn chebyshev_support_and_boundary() {
        let g = GridGeometry::doubly_periodic(8, 8, 0.5, 0.5, 33, 0., 8., 1).unwrap();
        let p = particle(6, [1., 1., 4.], 0.5);
        let s = stencil(&p, &g).unwrap();

        let cheb = g.chebyshev().unwrap();
        for &k in &s.indices[2] {
            assert!((cheb.points[k] - 4.).abs() <= 1.5);
        }
        assert!(!s.indices[2].is_empty());
        let sum: f64 = s.weights[2].iter().sum();
        assert!(close_floats(sum, 1., 1e-14));

        // support reaches above the top
        let p = particle(6, [1., 1., 7.], 0.5);
        match stencil(&p, &g) {
            Err(Error(ErrorKind::Domain(_), _)) => {}
            _ => panic!("expected domain error"),
        }
        let p = particle(6, [1., 1., 1.4], 0.5);
        assert!(stencil(&p, &g).is_err());
    }

    #[test]
    fn staleness() {
        let g = periodic(8, 1.);
        let particles = vec![particle(4, [1., 2., 3.], 1.)];
        let l = Locator::build(&particles, 3, &g).unwrap();
        assert!(l.is_current(3, &g));
        assert!(!l.is_current(4, &g));
        assert!(!l.is_current(3, &periodic(9, 1.)));
        assert_eq!(l.support_size(), 64);
    }
}
