use super::*;
use crate::consts::TWOPI;
use crate::flowfield::divergence;
use crate::transform::TransformEngine;

const ETA: f64 = 0.75;

fn geometry(nz: usize, z0: f64, lz: f64) -> GridGeometry {
    GridGeometry::doubly_periodic(8, 8, 0.5, 0.5, nz, z0, lz, 3).unwrap()
}

/// Runs forward transform, solver and backward transform on a real forcing.
fn velocity(g: &GridGeometry, policy: ZeroModePolicy, f: &Array4<f64>) -> Array4<f64> {
    let engine = TransformEngine::new(g).unwrap();
    let solver = DoublyPeriodicSolver::new(g, ETA, policy).unwrap();
    let u = solver.solve(&engine.forward(&f.view()).unwrap()).unwrap();
    engine.backward(&u).unwrap()
}

fn uniform_x_forcing(g: &GridGeometry, f0: f64) -> Array4<f64> {
    Array::from_shape_fn(g.field_shape(), |(_, _, _, d)| if d == 0 { f0 } else { 0. })
}

#[test]
fn zero_policy_removes_mean_flow() {
    let g = geometry(16, -1., 4.);
    let u = velocity(&g, ZeroModePolicy::Zero, &uniform_x_forcing(&g, 2.));
    for v in u.iter() {
        assert!(v.abs() < 1e-12, "{}", v);
    }
}

#[test]
fn retained_mean_flow_of_uniform_forcing() {
    let g = geometry(16, -1., 4.);
    let cheb = g.chebyshev().unwrap().clone();
    let (zm, h) = (cheb.midpoint(), cheb.half_height());
    let f0 = 2.;

    let u = velocity(&g, ZeroModePolicy::Retain, &uniform_x_forcing(&g, f0));

    for ((_, _, k, d), v) in u.indexed_iter() {
        let z = cheb.points[k] - zm;
        let expected = if d == 0 {
            -f0 / (2. * ETA) * (z * z + h * h)
        } else {
            0.
        };
        assert!(
            (v - expected).abs() < 1e-11 * (1. + expected.abs()),
            "{} != {} at z = {}",
            v,
            expected,
            z
        );
    }
}

fn gaussian(z: f64, sigma: f64) -> f64 {
    (-z * z / (2. * sigma * sigma)).exp()
}

#[test]
fn retained_mean_flow_outside_the_forcing() {
    let g = geometry(64, -1., 2.);
    let sigma = 0.15;
    let cheb = g.chebyshev().unwrap().clone();

    let f = Array::from_shape_fn(g.field_shape(), |(_, _, k, d)| {
        if d == 1 {
            gaussian(cheb.points[k], sigma)
        } else {
            0.
        }
    });
    let u = velocity(&g, ZeroModePolicy::Retain, &f);

    // -1/(2 eta) int |z - z'| f dz' with all of the force below the top
    let total = sigma * (TWOPI).sqrt();
    let expected = -total / (2. * ETA);
    let last = g.size().z - 1;
    for &k in &[0, last] {
        let v = u[[3, 5, k, 1]];
        assert!((v - expected).abs() < 1e-10, "{} != {}", v, expected);
        assert!(u[[3, 5, k, 0]].abs() < 1e-12);
        assert!(u[[3, 5, k, 2]].abs() < 1e-12);
    }
}

#[test]
fn velocity_is_divergence_free() {
    let g = geometry(64, -1., 2.);
    let sigma = 0.15;
    let cheb = g.chebyshev().unwrap().clone();
    let k = TWOPI / g.length(0);

    let f = Array::from_shape_fn(g.field_shape(), |(i, j, m, d)| {
        let (x, y) = (g.coordinate(0, i), g.coordinate(1, j));
        let e = gaussian(cheb.points[m], sigma);
        match d {
            0 => e * (k * x).cos(),
            1 => 0.5 * e * (k * y).sin(),
            _ => e * (k * (x + y)).cos(),
        }
    });

    let engine = TransformEngine::new(&g).unwrap();
    for &policy in &[ZeroModePolicy::Zero, ZeroModePolicy::Retain] {
        let solver = DoublyPeriodicSolver::new(&g, ETA, policy).unwrap();
        let u = solver.solve(&engine.forward(&f.view()).unwrap()).unwrap();

        let max = u.data().iter().map(|v| v.norm()).fold(0., f64::max);
        assert!(max > 0.);

        let div = divergence(&u).unwrap();
        let err = div.iter().map(|v| v.norm()).fold(0., f64::max);
        assert!(err < 1e-7 * k * max, "divergence {} for velocity {}", err, max);
    }
}

#[test]
fn decays_away_from_a_thin_layer() {
    let g = geometry(64, -1., 2.);
    let cheb = g.chebyshev().unwrap().clone();
    let k = TWOPI / g.length(0);

    // x force in the plane z = 0 varying along x only
    let f = Array::from_shape_fn(g.field_shape(), |(i, _, m, d)| {
        if d == 0 {
            gaussian(cheb.points[m], 0.1) * (k * g.coordinate(0, i)).cos()
        } else {
            0.
        }
    });
    let u = velocity(&g, ZeroModePolicy::Zero, &f);

    // symmetric in z, largest in the layer
    let last = g.size().z - 1;
    let centre = u[[0, 0, last / 2, 0]].abs().max(u[[0, 0, last / 2 + 1, 0]].abs());
    assert!(centre > 0.);
    assert!((u[[0, 0, 0, 0]] - u[[0, 0, last, 0]]).abs() < 1e-10 * centre);
    assert!(u[[0, 0, 0, 0]].abs() < centre);
    // no forcing along y
    assert!(u.index_axis(Axis(3), 1).iter().all(|v| v.abs() < 1e-12 * centre.max(1.)));
    // u_z is odd in z
    assert!((u[[1, 0, 5, 2]] + u[[1, 0, last - 5, 2]]).abs() < 1e-10 * centre);
}

#[test]
fn rejects_invalid_setup() {
    let g = geometry(16, 0., 3.);
    assert!(DoublyPeriodicSolver::new(&g, -1., ZeroModePolicy::Zero).is_err());

    let tp = GridGeometry::periodic(
        crate::GridSize { x: 4, y: 4, z: 4 },
        crate::Spacing {
            x: 1.,
            y: 1.,
            z: 1.,
        },
        3,
    )
    .unwrap();
    match DoublyPeriodicSolver::new(&tp, ETA, ZeroModePolicy::Zero) {
        Err(Error(ErrorKind::Configuration(_), _)) => {}
        _ => panic!("expected configuration error"),
    }

    let scalar = GridGeometry::doubly_periodic(8, 8, 0.5, 0.5, 16, 0., 3., 1).unwrap();
    assert!(DoublyPeriodicSolver::new(&scalar, ETA, ZeroModePolicy::Zero).is_err());

    // forcing from a different slab
    let solver = DoublyPeriodicSolver::new(&g, ETA, ZeroModePolicy::Retain).unwrap();
    let other = geometry(16, 0., 4.);
    let f = SpectralField::new(Array::zeros(other.field_shape()), TransformKind::Chebyshev, &other)
        .unwrap();
    match solver.solve(&f) {
        Err(Error(ErrorKind::StaleState(_), _)) => {}
        _ => panic!("expected stale state error"),
    }
    assert_eq!(solver.policy(), ZeroModePolicy::Retain);
}
