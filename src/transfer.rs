//! The 27-way transfer buffer lattice used to migrate particles between
//! cells each cycle.

use crate::cell::CellGrid;
use crate::particle::Particle;
use crate::universe_properties::UniverseProperties;
use ndarray::Array3;

/// Per-cell, per-direction outbox. `buffers[cell][dx+1][dy+1][dz+1]` holds
/// the particles cell `cell` sent in direction `(dx,dy,dz)` this cycle.
pub struct TransferBuffers {
    buffers: Array3<[[[Vec<Particle>; 3]; 3]; 3]>,
}

impl TransferBuffers {
    pub fn new(size: (usize, usize, usize)) -> TransferBuffers {
        TransferBuffers {
            buffers: Array3::from_shape_fn(size, |_| Default::default()),
        }
    }

    fn buffer_mut(&mut self, cell: (usize, usize, usize), dir: (i64, i64, i64)) -> &mut Vec<Particle> {
        &mut self.buffers[[cell.0, cell.1, cell.2]][(dir.0 + 1) as usize][(dir.1 + 1) as usize]
            [(dir.2 + 1) as usize]
    }

    fn buffer(&self, cell: (usize, usize, usize), dir: (i64, i64, i64)) -> &Vec<Particle> {
        &self.buffers[[cell.0, cell.1, cell.2]][(dir.0 + 1) as usize][(dir.1 + 1) as usize]
            [(dir.2 + 1) as usize]
    }

    /// True if every outbox is empty, the invariant expected outside the
    /// export/import window of one cycle.
    pub fn all_empty(&self) -> bool {
        self.buffers
            .iter()
            .all(|dirs| dirs.iter().all(|d2| d2.iter().all(|d1| d1.iter().all(|v| v.is_empty()))))
    }
}

/// Per-axis direction code: `-1` if `r_a < -half`, `+1` if `r_a > half`,
/// `0` otherwise. The boundary `|r_a| == half` exactly belongs to the
/// lower-index cell (treated as `dir_a = 0`).
fn direction_code(r: f64, half: f64) -> i64 {
    if r < -half {
        -1
    } else if r > half {
        1
    } else {
        0
    }
}

/// For each particle owned by cell `p`, classifies its migration direction,
/// applies periodic wrap to cells crossing a domain face, and enqueues it
/// into the outbox keyed by `(p, direction)`. Particles with no migration
/// direction remain in the cell's local list.
pub fn export_cell(
    properties: &UniverseProperties,
    cells: &mut CellGrid,
    p: (usize, usize, usize),
    buffers: &mut TransferBuffers,
) {
    let (nx, ny, nz) = properties.dims();
    let center = properties.center_of_cell(p.0 as i64, p.1 as i64, p.2 as i64);
    let half = properties.cell_width.scale(0.5);

    let mut keep = Vec::new();
    let particles = std::mem::take(&mut cells.get_mut(p.0, p.1, p.2).particles);

    for mut particle in particles {
        let r = particle.position - center;
        let dir = (
            direction_code(r.x, half.x),
            direction_code(r.y, half.y),
            direction_code(r.z, half.z),
        );

        if dir == (0, 0, 0) {
            keep.push(particle);
            continue;
        }

        let mut target = (p.0 as i64 + dir.0, p.1 as i64 + dir.1, p.2 as i64 + dir.2);

        if target.0 < 0 {
            target.0 = nx - 1;
            particle.position.x += nx as f64 * properties.cell_width.x;
        } else if target.0 >= nx {
            target.0 = 0;
            particle.position.x -= nx as f64 * properties.cell_width.x;
        }
        if target.1 < 0 {
            target.1 = ny - 1;
            particle.position.y += ny as f64 * properties.cell_width.y;
        } else if target.1 >= ny {
            target.1 = 0;
            particle.position.y -= ny as f64 * properties.cell_width.y;
        }
        if target.2 < 0 {
            target.2 = nz - 1;
            particle.position.z += nz as f64 * properties.cell_width.z;
        } else if target.2 >= nz {
            target.2 = 0;
            particle.position.z -= nz as f64 * properties.cell_width.z;
        }

        buffers.buffer_mut(p, dir).push(particle);
    }

    cells.get_mut(p.0, p.1, p.2).particles = keep;
}

/// Drains every outbox whose direction, applied to its source cell, lands
/// on destination cell `p`, appending the particles to `p`'s local list.
/// After import every outbox touched here is empty.
pub fn import_cell(
    properties: &UniverseProperties,
    cells: &mut CellGrid,
    p: (usize, usize, usize),
    buffers: &mut TransferBuffers,
) {
    let (nx, ny, nz) = properties.dims();
    let mut incoming = Vec::new();

    for ddx in -1i64..=1 {
        for ddy in -1i64..=1 {
            for ddz in -1i64..=1 {
                if ddx == 0 && ddy == 0 && ddz == 0 {
                    continue;
                }
                // source cell s such that s + dir == p (mod N)
                let sx = (p.0 as i64 - ddx).rem_euclid(nx);
                let sy = (p.1 as i64 - ddy).rem_euclid(ny);
                let sz = (p.2 as i64 - ddz).rem_euclid(nz);
                let src = (sx as usize, sy as usize, sz as usize);
                let buf = buffers.buffer_mut(src, (ddx, ddy, ddz));
                incoming.append(buf);
            }
        }
    }

    cells.get_mut(p.0, p.1, p.2).particles.extend(incoming);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Particle;
    use crate::vector::Vector3;

    fn props(size: (usize, usize, usize)) -> UniverseProperties {
        UniverseProperties {
            size,
            cell_width: Vector3::splat(1.0),
            ..UniverseProperties::default()
        }
    }

    #[test]
    fn export_then_import_crossing_plus_x_face() {
        let properties = props((2, 1, 1));
        let mut cells = CellGrid::new(properties.size);
        cells.get_mut(0, 0, 0).particles.push(Particle::new(
            Vector3::new(0.9, 0.5, 0.5),
            Vector3::new(1., 0., 0.),
            1.,
            1.,
        ));

        let mut buffers = TransferBuffers::new(properties.size);
        for (i, j, k) in cells.indices().collect::<Vec<_>>() {
            export_cell(&properties, &mut cells, (i, j, k), &mut buffers);
        }
        assert!(!buffers.buffer((0, 0, 0), (1, 0, 0)).is_empty());

        for (i, j, k) in cells.indices().collect::<Vec<_>>() {
            import_cell(&properties, &mut cells, (i, j, k), &mut buffers);
        }

        assert!(buffers.all_empty());
        assert_eq!(cells.get(0, 0, 0).particles.len(), 0);
        assert_eq!(cells.get(1, 0, 0).particles.len(), 1);
    }

    #[test]
    fn periodic_wrap_on_single_cell_grid() {
        let properties = props((1, 1, 1));
        let mut cells = CellGrid::new(properties.size);
        cells.get_mut(0, 0, 0).particles.push(Particle::new(
            Vector3::new(0.9, 0.5, 0.5),
            Vector3::new(1., 0., 0.),
            1.,
            1.,
        ));

        let mut buffers = TransferBuffers::new(properties.size);
        export_cell(&properties, &mut cells, (0, 0, 0), &mut buffers);
        import_cell(&properties, &mut cells, (0, 0, 0), &mut buffers);

        assert_eq!(cells.get(0, 0, 0).particles.len(), 1);
        let p = cells.get(0, 0, 0).particles[0];
        assert!(p.position.x >= 0.0 && p.position.x < 1.0);
    }

    #[test]
    fn count_conservation_over_multiple_cycles() {
        let properties = props((3, 3, 3));
        let mut cells = CellGrid::new(properties.size);
        let mut n = 0;
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    cells.get_mut(i, j, k).particles.push(Particle::new(
                        properties.center_of_cell(i as i64, j as i64, k as i64),
                        Vector3::new(0.3, 0.3, 0.3),
                        1.,
                        1.,
                    ));
                    n += 1;
                }
            }
        }

        for _ in 0..5 {
            let mut buffers = TransferBuffers::new(properties.size);
            for (i, j, k) in cells.indices().collect::<Vec<_>>() {
                export_cell(&properties, &mut cells, (i, j, k), &mut buffers);
            }
            for (i, j, k) in cells.indices().collect::<Vec<_>>() {
                import_cell(&properties, &mut cells, (i, j, k), &mut buffers);
            }
        }

        assert_eq!(cells.particle_count(), n);
    }
}
