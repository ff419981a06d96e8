#![allow(clippy::float_cmp)]
use super::*;
use crate::mesh::GridGeometry;
use crate::test_helper::equal_floats;
use crate::{GridSize, Spacing};
use std::f64::consts::PI;
use std::f64::EPSILON;

fn two_particles(table: &KernelTable) -> Result<ParticleSet> {
    let k = table.by_width(6).unwrap();
    ParticleSet::new(
        table,
        3,
        &[1., 1., 1., 2., 2., 2.],
        &[1., 0., 0., 0., 1., 0.],
        &[k.radius * 0.5; 2],
        &[6; 2],
        &[k.radius; 2],
        &[k.beta; 2],
    )
}

fn geometry() -> GridGeometry {
    GridGeometry::periodic(
        GridSize { x: 8, y: 8, z: 8 },
        Spacing {
            x: 0.5,
            y: 0.5,
            z: 0.5,
        },
        3,
    )
    .unwrap()
}

#[test]
fn test_modulo() {
    let input = [
        [2. * PI, 2. * PI],
        [2. * PI + EPSILON, 2. * PI],
        [7., 4.],
        [7., -4.],
        [-7., 4.],
        [-7., -4.],
    ];
    let output = [0., 0., 3., 3., 1., 1.];

    for (i, o) in input.iter().zip(output.iter()) {
        let a = modulo(i[0], i[1]);
        assert!(
            equal_floats(a, *o),
            "in: {} mod {}, out: {}, expected: {}",
            i[0],
            i[1],
            a,
            *o
        );
    }
}

#[test]
fn test_new_particle_set() {
    let table = KernelTable::default();
    let set = two_particles(&table).unwrap();

    assert_eq!(set.len(), 2);
    assert_eq!(set.dof(), 3);
    assert_eq!(set.revision(), 0);
    assert_eq!(set.value(1).to_vec(), vec![0., 1., 0.]);
    assert_eq!(set.total(), vec![1., 1., 0.]);
    assert_eq!(set.particles()[1].position, [2., 2., 2.]);
}

#[test]
fn test_inconsistent_input() {
    let table = KernelTable::default();
    let k = table.by_width(4).unwrap();

    // forces not matching dof
    assert!(ParticleSet::new(&table, 3, &[0.; 3], &[0.; 2], &[1.], &[4], &[k.radius], &[k.beta])
        .is_err());
    // incomplete position
    assert!(ParticleSet::new(&table, 1, &[0.; 4], &[0.], &[1.], &[4], &[k.radius], &[k.beta])
        .is_err());
    // missing radius
    assert!(ParticleSet::new(&table, 1, &[0.; 3], &[0.], &[], &[4], &[k.radius], &[k.beta])
        .is_err());
    // non-positive radius
    assert!(ParticleSet::new(&table, 1, &[0.; 3], &[0.], &[0.], &[4], &[k.radius], &[k.beta])
        .is_err());
    // non-finite position
    assert!(ParticleSet::new(
        &table,
        1,
        &[0., std::f64::NAN, 0.],
        &[0.],
        &[1.],
        &[4],
        &[k.radius],
        &[k.beta]
    )
    .is_err());

    // kernel not in the table
    match ParticleSet::new(&table, 1, &[0.; 3], &[0.], &[1.], &[4], &[k.radius], &[2.]) {
        Err(Error(ErrorKind::Configuration(_), _)) => {}
        _ => panic!("expected configuration error"),
    }
}

#[test]
fn test_forces_do_not_change_revision() {
    let table = KernelTable::default();
    let mut set = two_particles(&table).unwrap();

    set.set_forces(&[0., 0., 1., 0., 0., 1.]).unwrap();
    assert_eq!(set.revision(), 0);
    assert!(set.set_forces(&[0.; 5]).is_err());

    set.set_positions(&[0.; 6]).unwrap();
    assert_eq!(set.revision(), 1);
    set.set_position(1, [3., 3., 3.]).unwrap();
    assert_eq!(set.revision(), 2);
    assert!(set.set_position(2, [3., 3., 3.]).is_err());
    assert!(set.set_positions(&[0.; 5]).is_err());
}

#[test]
fn test_locator_lifecycle() {
    let table = KernelTable::default();
    let mut set = two_particles(&table).unwrap();
    let g = geometry();

    match set.locator(&g) {
        Err(Error(ErrorKind::StaleState(_), _)) => {}
        _ => panic!("expected stale state without setup"),
    }

    set.setup(&g).unwrap();
    assert!(set.locator(&g).is_ok());

    // forces may change freely
    set.set_forces(&[1.; 6]).unwrap();
    assert!(set.locator(&g).is_ok());

    // a different grid
    let other = GridGeometry::periodic(
        GridSize { x: 8, y: 8, z: 9 },
        Spacing {
            x: 0.5,
            y: 0.5,
            z: 0.5,
        },
        3,
    )
    .unwrap();
    assert!(set.locator(&other).is_err());

    // moved particles
    set.set_position(0, [1.1, 1., 1.]).unwrap();
    match set.locator(&g) {
        Err(Error(ErrorKind::StaleState(_), _)) => {}
        _ => panic!("expected stale locator"),
    }

    set.setup(&g).unwrap();
    assert!(set.locator(&g).is_ok());
}
