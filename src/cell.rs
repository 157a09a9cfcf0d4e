//! The cell grid: each cell exclusively owns the particles located in its
//! spatial box, stored as an `ndarray::Array3<Cell>`.

use crate::particle::Particle;
use crate::universe_properties::UniverseProperties;
use ndarray::Array3;
use rayon::prelude::*;

/// A cell's owned particle list, a growable buffer with amortised O(1)
/// append since cell occupancy varies over the run.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub particles: Vec<Particle>,
}

impl Cell {
    pub fn new() -> Cell {
        Cell {
            particles: Vec::new(),
        }
    }
}

/// The grid of cells, indexed by `(i, j, k)` with `0 <= i < Nx`.
pub struct CellGrid {
    cells: Array3<Cell>,
}

impl CellGrid {
    pub fn new(size: (usize, usize, usize)) -> CellGrid {
        CellGrid {
            cells: Array3::from_shape_fn(size, |_| Cell::new()),
        }
    }

    pub fn size(&self) -> (usize, usize, usize) {
        self.cells.dim()
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> &Cell {
        &self.cells[[i, j, k]]
    }

    pub fn get_mut(&mut self, i: usize, j: usize, k: usize) -> &mut Cell {
        &mut self.cells[[i, j, k]]
    }

    /// Total number of particles across all cells.
    pub fn particle_count(&self) -> usize {
        self.cells.iter().map(|c| c.particles.len()).sum()
    }

    /// Places `particles` into their owning cells according to
    /// `UniverseProperties::center_of_cell`, assuming all positions already
    /// lie within the universe extent.
    pub fn populate(&mut self, properties: &UniverseProperties, particles: Vec<Particle>) {
        let (nx, ny, nz) = properties.size;
        for p in particles {
            let i = ((p.position.x / properties.cell_width.x) as usize).min(nx - 1);
            let j = ((p.position.y / properties.cell_width.y) as usize).min(ny - 1);
            let k = ((p.position.z / properties.cell_width.z) as usize).min(nz - 1);
            self.cells[[i, j, k]].particles.push(p);
        }
    }

    /// Iterate all cells with their index, in parallel-safe unordered
    /// fashion (sequential here; `simulation.rs` drives the rayon
    /// parallelism over this iteration).
    pub fn indices(&self) -> impl Iterator<Item = (usize, usize, usize)> {
        let (nx, ny, nz) = self.size();
        (0..nx).flat_map(move |i| (0..ny).flat_map(move |j| (0..nz).map(move |k| (i, j, k))))
    }

    /// Applies `f` to every cell's particle list, in parallel, with its
    /// `(i,j,k)` index. Relies on the grid's standard-layout contiguous
    /// storage so the underlying slice can be handed to rayon directly.
    pub fn par_apply_with_index<F>(&mut self, f: F)
    where
        F: Fn(usize, usize, usize, &mut Cell) + Sync,
    {
        let (nx, ny, nz) = self.size();
        let slice = self.cells.as_slice_mut().expect("cell grid must be in standard layout");
        slice.par_iter_mut().enumerate().for_each(|(linear, cell)| {
            let i = linear / (ny * nz);
            let j = (linear / nz) % ny;
            let k = linear % nz;
            f(i, j, k, cell);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vector3;

    #[test]
    fn populate_places_particle_in_owning_cell() {
        let props = UniverseProperties {
            size: (2, 1, 1),
            cell_width: Vector3::splat(1.0),
            ..UniverseProperties::default()
        };
        let mut grid = CellGrid::new(props.size);
        let p = Particle::new(Vector3::new(1.5, 0.5, 0.5), Vector3::zero(), 1., 1.);
        grid.populate(&props, vec![p]);
        assert_eq!(grid.get(0, 0, 0).particles.len(), 0);
        assert_eq!(grid.get(1, 0, 0).particles.len(), 1);
    }

    #[test]
    fn particle_count_sums_over_all_cells() {
        let props = UniverseProperties {
            size: (2, 2, 1),
            cell_width: Vector3::splat(1.0),
            ..UniverseProperties::default()
        };
        let mut grid = CellGrid::new(props.size);
        let ps = vec![
            Particle::new(Vector3::new(0.5, 0.5, 0.5), Vector3::zero(), 1., 1.),
            Particle::new(Vector3::new(1.5, 1.5, 0.5), Vector3::zero(), 1., 1.),
        ];
        grid.populate(&props, ps);
        assert_eq!(grid.particle_count(), 2);
    }
}
