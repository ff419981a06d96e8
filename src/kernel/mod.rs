//! Exponential-of-semicircle (ES) spreading kernel.
//!
//! A kernel of width `w`, shape parameter `beta` and reference radius `c` is
//! scaled to a particle of physical radius `R` by the half support
//! `alpha = w R / (2 c)`. With `R = c h` its support covers `w` grid points.

use crate::consts::KERNEL_MATCH_TOLERANCE;
use crate::errors::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelSpec {
    /// number of support points at the reference radius
    pub width: usize,
    pub beta: f64,
    /// radius in units of the grid spacing that the width refers to
    pub radius: f64,
}

impl KernelSpec {
    /// Half width of the support of a particle with the given physical
    /// radius.
    pub fn support_half_width(&self, physical_radius: f64) -> f64 {
        self.width as f64 * physical_radius / (2. * self.radius)
    }

    /// Evaluates the kernel at distance `r` for half support `alpha`. The
    /// kernel is not normalised, `phi(0) = 1`.
    pub fn evaluate(&self, r: f64, alpha: f64) -> f64 {
        let z = r / alpha;
        if z.abs() > 1. {
            0.
        } else {
            (self.beta * self.width as f64 * ((1. - z * z).sqrt() - 1.)).exp()
        }
    }

    fn matches(&self, width: usize, radius: f64, beta: f64) -> bool {
        self.width == width
            && (self.radius - radius).abs() <= KERNEL_MATCH_TOLERANCE
            && (self.beta - beta).abs() <= KERNEL_MATCH_TOLERANCE
    }
}

/// Immutable set of admissible kernel parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelTable {
    entries: Vec<KernelSpec>,
}

impl Default for KernelTable {
    /// ES kernels with matched `(w, beta, c)` for `w = 4, 5, 6`.
    fn default() -> KernelTable {
        KernelTable {
            entries: vec![
                KernelSpec {
                    width: 4,
                    beta: 1.785,
                    radius: 1.2047,
                },
                KernelSpec {
                    width: 5,
                    beta: 1.886,
                    radius: 1.3437,
                },
                KernelSpec {
                    width: 6,
                    beta: 1.714,
                    radius: 1.5539,
                },
            ],
        }
    }
}

impl KernelTable {
    pub fn new(entries: Vec<KernelSpec>) -> Result<KernelTable> {
        for e in &entries {
            if e.width == 0 || !(e.beta.is_finite() && e.beta > 0.) || !(e.radius > 0.) {
                return configuration(format!("invalid kernel parameters {:?}", e));
            }
        }

        for (i, a) in entries.iter().enumerate() {
            if entries[i + 1..].iter().any(|b| b.width == a.width) {
                return configuration(format!(
                    "kernel width {} is listed more than once",
                    a.width
                ));
            }
        }

        Ok(KernelTable { entries })
    }

    pub fn entries(&self) -> &[KernelSpec] {
        &self.entries
    }

    /// Returns the admissible kernel with the given width.
    pub fn by_width(&self, width: usize) -> Result<KernelSpec> {
        match self.entries.iter().find(|e| e.width == width) {
            Some(e) => Ok(*e),
            None => configuration(format!("no admissible kernel of width {}", width)),
        }
    }

    /// Checks that `(width, radius, beta)` is an admissible triple.
    pub fn lookup(&self, width: usize, radius: f64, beta: f64) -> Result<KernelSpec> {
        match self.entries.iter().find(|e| e.matches(width, radius, beta)) {
            Some(e) => Ok(*e),
            None => configuration(format!(
                "kernel (w = {}, c = {}, beta = {}) is not admissible",
                width, radius, beta
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper::equal_floats;
    use approx::assert_relative_eq;

    #[test]
    fn lookup_matches_within_tolerance() {
        let table = KernelTable::default();
        let k = table.lookup(6, 1.5539, 1.714 + 1e-12).unwrap();
        assert_eq!(k.width, 6);
        assert!(table.lookup(6, 1.5539, 1.8).is_err());
        assert!(table.lookup(3, 1.5539, 1.714).is_err());
        assert!(table.by_width(7).is_err());
        assert_eq!(table.by_width(4).unwrap(), table.entries()[0]);
    }

    #[test]
    fn rejects_invalid_tables() {
        let k = KernelSpec {
            width: 4,
            beta: 1.,
            radius: 1.,
        };
        assert!(KernelTable::new(vec![k, k]).is_err());
        assert!(KernelTable::new(vec![KernelSpec { beta: -1., ..k }]).is_err());
        assert!(KernelTable::new(vec![k]).is_ok());
    }

    #[test]
    fn kernel_shape() {
        let k = KernelTable::default().by_width(6).unwrap();
        let h = 0.5;
        let alpha = k.support_half_width(k.radius * h);
        assert_relative_eq!(alpha, 1.5, max_relative = 1e-15);

        assert!(equal_floats(k.evaluate(0., alpha), 1.));
        assert_eq!(k.evaluate(1.5001, alpha), 0.);
        assert_eq!(k.evaluate(-1.6, alpha), 0.);
        // the support is closed at alpha
        assert!(k.evaluate(alpha, alpha) > 0.);
        assert!(k.evaluate(-alpha, alpha) > 0.);
        assert_eq!(k.evaluate(alpha * (1. + 1e-12), alpha), 0.);

        for &r in &[0.1, 0.3, 0.77, 1.2, 1.49] {
            assert!(equal_floats(k.evaluate(r, alpha), k.evaluate(-r, alpha)));
            assert!(k.evaluate(r, alpha) < k.evaluate(r - 0.05, alpha));
        }
    }
}
