//! The five-phase per-cycle pipeline and the `Simulation` driver that owns
//! every grid and runs it.

use crate::cell::CellGrid;
use crate::field::{field_energy, CenterField, DensityField, NodeField};
use crate::interpolate::{
    fractional_offset, interpolate_fields_to_particle, project_particles_to_density, seed_centers_from_nodes,
};
use crate::particle::Particle;
use crate::solver::{initialize_bext, FieldSolver};
use crate::transfer::{export_cell, import_cell, TransferBuffers};
use crate::universe_properties::UniverseProperties;
use crate::Float;
use serde_derive::{Deserialize, Serialize};

/// Everything the field solver and the particle mover read or write each
/// cycle.
struct SimulationState {
    cells: CellGrid,
    field: NodeField,
    centers: CenterField,
    density: DensityField,
    cycle: usize,
}

/// Captures the full state needed to resume a run: particle positions and
/// velocities plus the cycle count. Fields and densities are not snapshotted
/// since they are re-derived from the particle state and the solver on the
/// next cycle's phase 1 and phase 3; the one exception is a prior static
/// `Bext`, which `resume` recomputes from `UniverseProperties` rather than
/// serializing the whole node grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub particles: Vec<Particle>,
    pub cycle: usize,
}

/// Owns the grids and the field-solver strategy for one run and drives the
/// per-cycle pipeline.
pub struct Simulation {
    properties: UniverseProperties,
    solver: Box<dyn FieldSolver + Send + Sync>,
    state: SimulationState,
}

impl Simulation {
    /// Builds an empty simulation sized to `properties.size`, with the
    /// static external field (`Bext`) precomputed once.
    pub fn new(properties: UniverseProperties, solver: Box<dyn FieldSolver + Send + Sync>) -> Simulation {
        let mut field = NodeField::new(properties.size);
        initialize_bext(&mut field, &properties);

        let mut centers = CenterField::new(properties.size);
        seed_centers_from_nodes(&field, &mut centers);

        Simulation {
            properties,
            solver,
            state: SimulationState {
                cells: CellGrid::new(properties.size),
                field,
                centers,
                density: DensityField::new(properties.size),
                cycle: 0,
            },
        }
    }

    /// Seeds the cell grid with an initial particle population. Each
    /// particle is assigned to the cell containing its position.
    pub fn init(&mut self, particles: Vec<Particle>) {
        self.state.cells = CellGrid::new(self.properties.size);
        self.state.cells.populate(&self.properties, particles);
    }

    /// Restores particle state and cycle count from a snapshot; fields are
    /// re-derived on the next cycle rather than carried in the snapshot.
    pub fn resume(&mut self, snapshot: Snapshot) {
        self.init(snapshot.particles);
        self.state.cycle = snapshot.cycle;
    }

    pub fn get_snapshot(&self) -> Snapshot {
        Snapshot {
            particles: self.get_particles(),
            cycle: self.state.cycle,
        }
    }

    /// Flattens every cell's particle list into one vector, in grid-scan
    /// order. Intended for diagnostics and snapshotting, not the hot path.
    pub fn get_particles(&self) -> Vec<Particle> {
        let mut out = Vec::with_capacity(self.state.cells.particle_count());
        for (i, j, k) in self.state.cells.indices() {
            out.extend_from_slice(&self.state.cells.get(i, j, k).particles);
        }
        out
    }

    pub fn particle_count(&self) -> usize {
        self.state.cells.particle_count()
    }

    /// One density-CSV row per cell: the cell's center position and its
    /// current particle occupancy, timestamped with the cycle this was
    /// captured on.
    pub fn density_rows(&self) -> Vec<crate::output::DensityRow> {
        let mut rows = Vec::with_capacity(self.state.cells.particle_count());
        for (i, j, k) in self.state.cells.indices() {
            let center = self.properties.center_of_cell(i as i64, j as i64, k as i64);
            rows.push(crate::output::DensityRow {
                t: self.state.cycle,
                x: center.x,
                y: center.y,
                z: center.z,
                density: self.state.cells.get(i, j, k).particles.len(),
            });
        }
        rows
    }

    pub fn cycle(&self) -> usize {
        self.state.cycle
    }

    pub fn properties(&self) -> &UniverseProperties {
        &self.properties
    }

    /// The node grid (E, B, Bext) as of the last completed cycle, exposed
    /// for diagnostics dumps and tests that need to inspect field state
    /// directly rather than through a particle's interpolated view of it.
    pub fn node_field(&self) -> &NodeField {
        &self.state.field
    }

    pub fn center_field(&self) -> &CenterField {
        &self.state.centers
    }

    /// Sum of momentum magnitude, field energies and kinetic energy across
    /// the whole domain, the quantities the diagnostics log tracks cycle by
    /// cycle to watch for numerical drift.
    pub fn conserved_quantities(&self) -> crate::output::ConservedQuantities {
        let mut momentum = crate::vector::Vector3::zero();
        let mut kinetic = 0.0;
        for (i, j, k) in self.state.cells.indices() {
            for p in &self.state.cells.get(i, j, k).particles {
                momentum += p.momentum();
                kinetic += p.kinetic_energy();
            }
        }

        let e_energy = field_energy(&self.state.field, &self.properties, |n| n.e);
        let b_energy = field_energy(&self.state.field, &self.properties, |n| n.b);

        crate::output::ConservedQuantities {
            cycle: self.state.cycle,
            total_momentum: momentum.norm(),
            e_energy,
            b_energy,
            total_kinetic_energy: kinetic,
        }
    }

    /// Runs exactly one cycle of the pipeline, in strict phase order:
    ///
    /// 1. project particles to the density grid (P -> G)
    /// 2. refresh the periodic ghost layers of the node and center fields
    /// 3. solve the fields on every interior node
    /// 4. for each cell: interpolate fields to each particle (G -> P),
    ///    advance it (Boris), and classify/enqueue migrators
    /// 5. for each cell: drain incoming migrant outboxes
    ///
    /// Returns the cycle count after this step.
    pub fn do_cycle(&mut self) -> usize {
        project_particles_to_density(&self.state.cells, &self.properties, &mut self.state.density);

        self.state.field.update_ghost_layers();
        self.state.centers.update_ghost_layers();

        let ((i0, i1), (j0, j1), (k0, k1)) = self.state.field.interior_range();
        for i in i0..=i1 {
            for j in j0..=j1 {
                for k in k0..=k1 {
                    self.solver.solve_node(
                        &self.properties,
                        (i, j, k),
                        &self.state.density,
                        &mut self.state.field,
                        &mut self.state.centers,
                    );
                }
            }
        }

        self.advance_particles();
        self.migrate_particles();

        self.state.cycle += 1;
        self.state.cycle
    }

    /// Phase 4's per-particle work: interpolate E/B to the particle's
    /// position and advance it with the Boris integrator. Runs one cell's
    /// particles per rayon work item, which is race-free since each cell
    /// exclusively owns its own particle list.
    fn advance_particles(&mut self) {
        let properties = &self.properties;
        let field = &self.state.field;
        self.state.cells.par_apply_with_index(|i, j, k, cell| {
            let idx = (i as i64, j as i64, k as i64);
            for p in cell.particles.iter_mut() {
                let (e, b) = interpolate_fields_to_particle(field, properties, idx, &p.position);
                crate::integrator::boris_step(p, e, b, properties.dt);
            }
            cell.particles.retain(|p| p.is_finite());
        });
    }

    /// Phase 4's classification/enqueue and phase 5's drain, run after every
    /// particle has already been advanced this cycle. Both passes run
    /// sequentially over cells since `export_cell`/`import_cell` mutate the
    /// shared cell grid and transfer buffers in place.
    fn migrate_particles(&mut self) {
        let mut buffers = TransferBuffers::new(self.properties.size);
        let indices: Vec<(usize, usize, usize)> = self.state.cells.indices().collect();

        for &(i, j, k) in &indices {
            export_cell(&self.properties, &mut self.state.cells, (i, j, k), &mut buffers);
        }
        for &(i, j, k) in &indices {
            import_cell(&self.properties, &mut self.state.cells, (i, j, k), &mut buffers);
        }
    }
}

impl Iterator for Simulation {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        Some(self.do_cycle())
    }
}

/// The fractional in-cell offset of `position` relative to the cell it was
/// assigned to at projection time. Exposed for diagnostics callers (e.g. a
/// density-grid CSV dump) that need to recompute the same coupling weights
/// `project_particles_to_density` used internally.
pub fn offset_within_cell(properties: &UniverseProperties, cell_index: (i64, i64, i64), position: &crate::vector::Vector3) -> (Float, Float, Float) {
    let center = properties.center_of_cell(cell_index.0, cell_index.1, cell_index.2);
    fractional_offset(position, &center, &properties.cell_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::StaticSolver;
    use crate::universe_properties::UseCase;
    use crate::vector::Vector3;

    fn props() -> UniverseProperties {
        UniverseProperties {
            size: (4, 4, 4),
            cell_width: Vector3::splat(1.0),
            dt: 0.1,
            use_case: UseCase::Test,
            ..UniverseProperties::default()
        }
    }

    #[test]
    fn particle_count_is_conserved_over_several_cycles() {
        let properties = props();
        let mut sim = Simulation::new(properties, Box::new(StaticSolver));
        let particles: Vec<Particle> = (0..20)
            .map(|n| {
                let t = n as Float;
                Particle::new(
                    Vector3::new(1.5 + 0.01 * t, 1.5, 1.5),
                    Vector3::new(0.3, 0.1, -0.1),
                    1.0,
                    1.0,
                )
            })
            .collect();
        let n = particles.len();
        sim.init(particles);

        for _ in 0..10 {
            sim.do_cycle();
        }

        assert_eq!(sim.particle_count(), n);
        assert_eq!(Simulation::cycle(&sim), 10);
    }

    #[test]
    fn snapshot_round_trips_particle_state_and_cycle() {
        let properties = props();
        let mut sim = Simulation::new(properties, Box::new(StaticSolver));
        sim.init(vec![Particle::new(
            Vector3::new(1.5, 1.5, 1.5),
            Vector3::new(0.2, 0.0, 0.0),
            1.0,
            1.0,
        )]);
        sim.do_cycle();
        sim.do_cycle();
        let snap = sim.get_snapshot();

        let mut resumed = Simulation::new(props(), Box::new(StaticSolver));
        resumed.resume(snap);
        assert_eq!(Simulation::cycle(&resumed), 2);
        assert_eq!(resumed.particle_count(), 1);
    }

    #[test]
    fn iterator_impl_advances_one_cycle_per_next() {
        let properties = props();
        let mut sim = Simulation::new(properties, Box::new(StaticSolver));
        sim.init(vec![]);
        assert_eq!(sim.next(), Some(1));
        assert_eq!(sim.next(), Some(2));
    }
}
