//! Chebyshev extrema points and Clenshaw-Curtis quadrature.

use crate::consts::PI;
use crate::errors::*;

/// Returns the `n` Chebyshev extrema points on `[a, b]` together with their
/// Clenshaw-Curtis weights.
///
/// The points are `z_k = a + (b - a) / 2 * (1 + cos(pi k / (n - 1)))`, so the
/// first point is the top `b` and the last one the bottom `a`. The weights
/// integrate polynomials of degree `n - 1` exactly.
pub fn clencurt(n: usize, a: f64, b: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    if n < 2 {
        return numeric(format!(
            "Clenshaw-Curtis quadrature needs at least two points, got {}",
            n
        ));
    }
    if !(b > a) {
        return configuration(format!("empty interval [{}, {}]", a, b));
    }

    let intervals = n - 1;
    let nf = intervals as f64;
    let half = 0.5 * (b - a);

    let theta: Vec<f64> = (0..n).map(|k| PI * k as f64 / nf).collect();
    let points = theta.iter().map(|t| a + half * (1. + t.cos())).collect();

    let mut weights = vec![0.; n];
    let (edge, modes) = if intervals % 2 == 0 {
        (1. / (nf * nf - 1.), intervals / 2 - 1)
    } else {
        (1. / (nf * nf), (intervals - 1) / 2)
    };
    weights[0] = edge;
    weights[intervals] = edge;

    for k in 1..intervals {
        let mut v = 1.;
        for j in 1..=modes {
            let jf = j as f64;
            v -= 2. * (2. * jf * theta[k]).cos() / (4. * jf * jf - 1.);
        }
        if intervals % 2 == 0 {
            v -= (nf * theta[k]).cos() / (nf * nf - 1.);
        }
        weights[k] = 2. * v / nf;
    }

    for w in &mut weights {
        *w *= half;
    }

    Ok((points, weights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper::close_floats;

    #[test]
    fn simpson_and_trapezoid() {
        let (z, w) = clencurt(3, -1., 1.).unwrap();
        assert!(close_floats(z[0], 1., 1e-15));
        assert!(close_floats(z[1], 0., 1e-15));
        assert!(close_floats(z[2], -1., 1e-15));
        assert!(close_floats(w[0], 1. / 3., 1e-15));
        assert!(close_floats(w[1], 4. / 3., 1e-15));
        assert!(close_floats(w[2], 1. / 3., 1e-15));

        let (_, w) = clencurt(2, 0., 4.).unwrap();
        assert!(close_floats(w[0], 2., 1e-15));
        assert!(close_floats(w[1], 2., 1e-15));
    }

    #[test]
    fn integrates_polynomials_exactly() {
        for &n in &[5, 8, 17, 32] {
            let (a, b) = (-0.5, 2.);
            let (z, w) = clencurt(n, a, b).unwrap();
            for p in 0..n {
                let exact = (b.powi(p as i32 + 1) - a.powi(p as i32 + 1)) / (p as f64 + 1.);
                let quad: f64 = z.iter().zip(&w).map(|(z, w)| w * z.powi(p as i32)).sum();
                assert!(
                    close_floats(quad, exact, 1e-12),
                    "n = {}, p = {}: {} != {}",
                    n,
                    p,
                    quad,
                    exact
                );
            }
        }
    }

    #[test]
    fn weights_positive_and_symmetric() {
        let (_, w) = clencurt(24, 0., 1.).unwrap();
        for k in 0..24 {
            assert!(w[k] > 0.);
            assert!(close_floats(w[k], w[23 - k], 1e-14));
        }
    }

    #[test]
    fn rejects_degenerate_input() {
        assert!(clencurt(1, 0., 1.).is_err());
        assert!(clencurt(4, 1., 1.).is_err());
    }
}
