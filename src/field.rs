//! The three co-located grids the field solver operates on: node fields
//! (E, B, Bext), the staggered center field (B only) and the node-centered
//! current density. `Field = size+3`, `BcField = size+2`, `CurrentDensity =
//! size+1`, modeled as sibling `ndarray::Array3` grids with explicit index
//! arithmetic between them rather than cyclic pointer references.

use crate::universe_properties::UniverseProperties;
use crate::vector::Vector3;
use crate::Float;
use ndarray::Array3;

/// One cell of extra shift on each side; field nodes are indexed in
/// `[0, Nx+2]` with interior physical nodes at `[1, Nx+1]`.
pub const FIELD_GHOST: usize = 1;
/// Density nodes are indexed in `[0, Nx]`, offset by one cell relative to
/// field-node indices (the "density index offset" from spec section 4.3).
pub const DENSITY_FIELD_SHIFT: i64 = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct FieldNode {
    pub e: Vector3,
    pub b: Vector3,
    pub bext: Vector3,
}

/// Node-defined E, B and static Bext, with a one-cell ghost layer on every
/// face: `size` is `(Nx+3, Ny+3, Nz+3)`.
pub struct NodeField {
    nodes: Array3<FieldNode>,
}

impl NodeField {
    pub fn new(size: (usize, usize, usize)) -> NodeField {
        NodeField {
            nodes: Array3::from_elem((size.0 + 3, size.1 + 3, size.2 + 3), FieldNode::default()),
        }
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        self.nodes.dim()
    }

    pub fn get(&self, i: i64, j: i64, k: i64) -> &FieldNode {
        &self.nodes[[i as usize, j as usize, k as usize]]
    }

    pub fn get_mut(&mut self, i: i64, j: i64, k: i64) -> &mut FieldNode {
        &mut self.nodes[[i as usize, j as usize, k as usize]]
    }

    /// The range of interior (non-ghost) node indices per axis, inclusive.
    pub fn interior_range(&self) -> ((i64, i64), (i64, i64), (i64, i64)) {
        let (nx, ny, nz) = self.nodes.dim();
        (
            (1, nx as i64 - 2),
            (1, ny as i64 - 2),
            (1, nz as i64 - 2),
        )
    }

    /// Copies interior boundary slabs into ghost slabs on all six faces:
    /// `field[0] = field[N-2]`, `field[N-1] = field[1]`. Must run before the
    /// next solver phase reads neighboring values.
    pub fn update_ghost_layers(&mut self) {
        let (nx, ny, nz) = self.nodes.dim();
        for j in 0..ny {
            for k in 0..nz {
                self.nodes[[0, j, k]] = self.nodes[[nx - 2, j, k]];
                self.nodes[[nx - 1, j, k]] = self.nodes[[1, j, k]];
            }
        }
        for i in 0..nx {
            for k in 0..nz {
                self.nodes[[i, 0, k]] = self.nodes[[i, ny - 2, k]];
                self.nodes[[i, ny - 1, k]] = self.nodes[[i, 1, k]];
            }
        }
        for i in 0..nx {
            for j in 0..ny {
                self.nodes[[i, j, 0]] = self.nodes[[i, j, nz - 2]];
                self.nodes[[i, j, nz - 1]] = self.nodes[[i, j, 1]];
            }
        }
    }
}

/// B interpolated to cell centers, staggered with respect to nodes, one
/// ghost layer per face: `size` is `(Nx+2, Ny+2, Nz+2)`.
pub struct CenterField {
    centers: Array3<Vector3>,
}

impl CenterField {
    pub fn new(size: (usize, usize, usize)) -> CenterField {
        CenterField {
            centers: Array3::from_elem((size.0 + 2, size.1 + 2, size.2 + 2), Vector3::zero()),
        }
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        self.centers.dim()
    }

    pub fn get(&self, i: i64, j: i64, k: i64) -> Vector3 {
        self.centers[[i as usize, j as usize, k as usize]]
    }

    pub fn get_mut(&mut self, i: i64, j: i64, k: i64) -> &mut Vector3 {
        &mut self.centers[[i as usize, j as usize, k as usize]]
    }

    pub fn update_ghost_layers(&mut self) {
        let (nx, ny, nz) = self.centers.dim();
        for j in 0..ny {
            for k in 0..nz {
                self.centers[[0, j, k]] = self.centers[[nx - 2, j, k]];
                self.centers[[nx - 1, j, k]] = self.centers[[1, j, k]];
            }
        }
        for i in 0..nx {
            for k in 0..nz {
                self.centers[[i, 0, k]] = self.centers[[i, ny - 2, k]];
                self.centers[[i, ny - 1, k]] = self.centers[[i, 1, k]];
            }
        }
        for i in 0..nx {
            for j in 0..ny {
                self.centers[[i, j, 0]] = self.centers[[i, j, nz - 2]];
                self.centers[[i, j, nz - 1]] = self.centers[[i, j, 1]];
            }
        }
    }
}

/// Node-centered current density J, no ghost layer: `size` is
/// `(Nx+1, Ny+1, Nz+1)`. Re-aggregated (not incrementally updated) each
/// cycle; there is no implicit reset needed since phase 1 overwrites it.
pub struct DensityField {
    nodes: Array3<Vector3>,
}

impl DensityField {
    pub fn new(size: (usize, usize, usize)) -> DensityField {
        DensityField {
            nodes: Array3::from_elem((size.0 + 1, size.1 + 1, size.2 + 1), Vector3::zero()),
        }
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        self.nodes.dim()
    }

    pub fn get(&self, i: i64, j: i64, k: i64) -> Vector3 {
        self.nodes[[i as usize, j as usize, k as usize]]
    }

    pub fn get_mut(&mut self, i: i64, j: i64, k: i64) -> &mut Vector3 {
        &mut self.nodes[[i as usize, j as usize, k as usize]]
    }

    pub fn fill(&mut self, v: Vector3) {
        self.nodes.fill(v);
    }

    pub fn scale_in_place(&mut self, f: Float) {
        self.nodes.mapv_inplace(|v| v.scale(f));
    }

    /// Density at field-node index `p`, i.e. `J[p - (1,1,1)]`.
    pub fn at_field_index(&self, i: i64, j: i64, k: i64) -> Vector3 {
        self.get(
            i - DENSITY_FIELD_SHIFT,
            j - DENSITY_FIELD_SHIFT,
            k - DENSITY_FIELD_SHIFT,
        )
    }
}

/// Sum of squared field-component magnitudes across interior nodes, scaled
/// by cell volume, giving total field energy for a chosen component.
pub fn field_energy<F>(field: &NodeField, properties: &UniverseProperties, select: F) -> f64
where
    F: Fn(&FieldNode) -> Vector3,
{
    let ((i0, i1), (j0, j1), (k0, k1)) = field.interior_range();
    let mut total = 0.0;
    for i in i0..=i1 {
        for j in j0..=j1 {
            for k in k0..=k1 {
                total += select(field.get(i, j, k)).norm_squared();
            }
        }
    }
    total * properties.cell_volume() / (8.0 * std::f64::consts::PI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghost_layers_mirror_opposite_interior_face() {
        let mut field = NodeField::new((2, 1, 1));
        field.get_mut(1, 1, 1).e = Vector3::new(7.0, 0., 0.);
        field.update_ghost_layers();
        // nx = 2+3 = 5, interior x in [1, 3]; ghost at 0 mirrors index 3.
        assert_eq!(field.get(0, 1, 1).e, field.get(3, 1, 1).e);
        assert_eq!(field.get(4, 1, 1).e, field.get(1, 1, 1).e);
    }

    #[test]
    fn density_at_field_index_applies_shift() {
        let mut density = DensityField::new((2, 1, 1));
        density.get_mut(0, 0, 0).x = 42.0;
        assert_eq!(density.at_field_index(1, 1, 1).x, 42.0);
    }
}
