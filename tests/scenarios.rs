//! End-to-end scenarios driven through the public `Simulation` API.

use pic3d::field::{CenterField, DensityField, NodeField};
use pic3d::solver::{solver_for_use_case, FieldSolver, ForwardSolver, StaticSolver};
use pic3d::universe_properties::UseCase;
use pic3d::vector::Vector3;
use pic3d::{Particle, Simulation, UniverseProperties};

fn props(size: (usize, usize, usize), cell_width: f64, dt: f64) -> UniverseProperties {
    UniverseProperties {
        size,
        cell_width: Vector3::splat(cell_width),
        dt,
        use_case: UseCase::Test,
        ..UniverseProperties::default()
    }
}

#[test]
fn single_particle_crosses_plus_x_face_with_no_field() {
    let properties = props((2, 1, 1), 1.0, 1.0);
    let mut sim = Simulation::new(properties, Box::new(StaticSolver));
    sim.init(vec![Particle::new(
        Vector3::new(0.5, 0.5, 0.5),
        Vector3::new(1.0, 0.0, 0.0),
        1.0,
        1.0,
    )]);

    sim.do_cycle();

    let particles = sim.get_particles();
    assert_eq!(particles.len(), 1);
    let p = particles[0];
    assert_eq!(p.position, Vector3::new(1.5, 0.5, 0.5));
    assert_eq!(p.velocity, Vector3::new(1.0, 0.0, 0.0));
}

#[test]
fn periodic_wrap_after_two_cycles() {
    let properties = props((1, 1, 1), 1.0, 0.5);
    let mut sim = Simulation::new(properties, Box::new(StaticSolver));
    sim.init(vec![Particle::new(
        Vector3::new(0.5, 0.5, 0.5),
        Vector3::new(1.0, 0.0, 0.0),
        1.0,
        1.0,
    )]);

    sim.do_cycle();
    sim.do_cycle();

    let particles = sim.get_particles();
    assert_eq!(particles.len(), 1);
    let p = particles[0];
    assert!((p.position.x - 0.5).abs() < 1e-9);
    assert_eq!(p.velocity, Vector3::new(1.0, 0.0, 0.0));
}

/// A solver test double that returns a fixed, uniform `E`/`B` at every node
/// regardless of density or the center grid, used to drive the Boris
/// gyration scenario end-to-end through `Simulation` without needing the
/// forward solver to reproduce a hand-picked field by construction.
struct ConstantFieldSolver {
    e: Vector3,
    b: Vector3,
}

impl FieldSolver for ConstantFieldSolver {
    fn solve_node(
        &self,
        _properties: &UniverseProperties,
        p: (i64, i64, i64),
        _density: &DensityField,
        field: &mut NodeField,
        _centers: &mut CenterField,
    ) {
        let node = field.get_mut(p.0, p.1, p.2);
        node.e = self.e;
        node.b = self.b;
    }
}

#[test]
fn boris_gyration_end_to_end_matches_seed_scenario() {
    let properties = props((1, 1, 1), 100.0, 0.1);
    let solver = ConstantFieldSolver {
        e: Vector3::new(0.2, 0.0, 0.0),
        b: Vector3::new(0.2, 0.0, 0.0),
    };
    let mut sim = Simulation::new(properties, Box::new(solver));
    sim.init(vec![Particle::new(
        Vector3::new(0.5, 0.5, 0.0),
        Vector3::new(0.0, 0.0, 1.0),
        1.0,
        1.0,
    )]);

    for _ in 0..9 {
        sim.do_cycle();
    }

    let p = sim.get_particles()[0];
    assert!((p.position.x - 0.590).abs() < 0.001);
    assert!((p.position.y - 0.589).abs() < 0.001);
    assert!((p.position.z - 0.894).abs() < 0.001);
}

#[test]
fn static_dipole_field_is_finite_outside_the_planet_and_zero_inside() {
    let mut properties = props((2, 2, 2), 1.0, 1.0);
    properties.use_case = UseCase::Dipole;
    properties.object_center = Vector3::zero();
    properties.planet_radius = 1.0;
    properties.b0 = Vector3::splat(3.07e-5);

    let mut sim = Simulation::new(properties, Box::new(StaticSolver));
    sim.init(vec![]);
    sim.do_cycle();

    // node (1,1,1) is the world origin, strictly inside the planet.
    let inside = sim.node_field().get(1, 1, 1);
    assert_eq!(inside.e, Vector3::zero());
    assert_eq!(inside.b, Vector3::zero());

    // node (3,3,3) lies outside the planet radius.
    let outside = sim.node_field().get(3, 3, 3);
    assert_eq!(outside.e, Vector3::zero());
    assert!(outside.b.norm().is_finite());
    assert!(outside.b.norm() > 0.0);
}

#[test]
fn particle_count_is_preserved_over_ten_cycles_with_zero_field() {
    let properties = props((4, 4, 4), 1.0, 0.1);
    let mut sim = Simulation::new(properties, Box::new(StaticSolver));

    let n = 40;
    let particles: Vec<Particle> = (0..n)
        .map(|i| {
            let t = i as f64;
            Particle::new(
                Vector3::new(
                    (0.3 + 0.1 * t) % properties.extent().x,
                    (0.7 + 0.05 * t) % properties.extent().y,
                    (0.2 + 0.15 * t) % properties.extent().z,
                ),
                Vector3::new(0.2, -0.1, 0.05),
                1.0,
                1.0,
            )
        })
        .collect();
    sim.init(particles);

    for _ in 0..10 {
        sim.do_cycle();
    }

    assert_eq!(sim.particle_count(), n);
    assert_eq!(Simulation::cycle(&sim), 10);
}

#[test]
fn forward_solver_drives_e_from_particle_current_end_to_end() {
    let properties = props((2, 2, 2), 1.0, 0.1);
    let mut sim = Simulation::new(properties, Box::new(ForwardSolver));
    sim.init(vec![Particle::new(
        Vector3::new(0.5, 0.5, 0.5),
        Vector3::new(1.0, 0.0, 0.0),
        1.0,
        1.0,
    )]);

    sim.do_cycle();

    // the moving charge projects a nonzero current onto the density grid,
    // which the forward solver folds into E at the surrounding interior
    // nodes; starting from E = 0 everywhere, at least one interior node
    // must now be nonzero and finite.
    let ((i0, i1), (j0, j1), (k0, k1)) = sim.node_field().interior_range();
    let mut any_nonzero = false;
    for i in i0..=i1 {
        for j in j0..=j1 {
            for k in k0..=k1 {
                let e = sim.node_field().get(i, j, k).e;
                assert!(e.x.is_finite() && e.y.is_finite() && e.z.is_finite());
                if e != Vector3::zero() {
                    any_nonzero = true;
                }
            }
        }
    }
    assert!(any_nonzero, "expected the forward solver to produce a nonzero E from particle current");
    assert_eq!(sim.particle_count(), 1);
}

#[test]
fn solver_for_use_case_gives_dipole_the_forward_solver() {
    // Dipole is the only use case the forward (explicit) solver is defined
    // for; every other use case gets the cheaper static solver.
    let dipole = solver_for_use_case(UseCase::Dipole);
    let test_solver = solver_for_use_case(UseCase::Test);

    let properties = props((1, 1, 1), 1.0, 0.1);
    let density = DensityField::new(properties.size);
    let mut field = NodeField::new(properties.size);
    let mut centers = CenterField::new(properties.size);

    // the static solver always zeroes E; the forward solver leaves E
    // untouched when curl B and J are both zero, so E alone doesn't
    // distinguish them directly. Instead check that the static solver
    // overwrites B with the dipole formula even when centers are nonzero,
    // which the forward solver would never do.
    *centers.get_mut(1, 1, 1) = Vector3::splat(9.0);
    test_solver.solve_node(&properties, (1, 1, 1), &density, &mut field, &mut centers);
    assert_eq!(field.get(1, 1, 1).e, Vector3::zero());

    let mut field2 = NodeField::new(properties.size);
    let mut centers2 = CenterField::new(properties.size);
    *centers2.get_mut(1, 1, 1) = Vector3::splat(9.0);
    *centers2.get_mut(0, 1, 1) = Vector3::splat(9.0);
    *centers2.get_mut(1, 0, 1) = Vector3::splat(9.0);
    *centers2.get_mut(1, 1, 0) = Vector3::splat(9.0);
    *centers2.get_mut(0, 0, 1) = Vector3::splat(9.0);
    *centers2.get_mut(0, 1, 0) = Vector3::splat(9.0);
    *centers2.get_mut(1, 0, 0) = Vector3::splat(9.0);
    *centers2.get_mut(0, 0, 0) = Vector3::splat(9.0);
    dipole.solve_node(&properties, (1, 1, 1), &density, &mut field2, &mut centers2);
    // the forward solver's step 5 sets B from the surrounding centers'
    // average, here a uniform 9.0 octet.
    assert_eq!(field2.get(1, 1, 1).b, Vector3::splat(9.0));
}
