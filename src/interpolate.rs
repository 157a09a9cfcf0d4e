//! Trilinear weight kernel and the two couplings built on top of it:
//! particle-to-grid projection (P→G) and grid-to-particle interpolation
//! (F→P), plus node↔center averaging for the staggered field grids.

use crate::cell::CellGrid;
use crate::field::{CenterField, DensityField, NodeField};
use crate::universe_properties::UniverseProperties;
use crate::vector::Vector3;
use crate::Float;
use rayon::prelude::*;

/// `w_0(t) = 1-t`, `w_1(t) = t`.
fn weight(bit: usize, t: Float) -> Float {
    if bit == 0 {
        1.0 - t
    } else {
        t
    }
}

/// An octet of the eight grid values surrounding a unit cube, indexed
/// `[i][j][k]` with `i,j,k in {0,1}`.
pub type Octet = [[[Vector3; 2]; 2]; 2];

/// `Σ w_i(u) w_j(v) w_k(w) C[i][j][k]`, the trilinear weight kernel.
pub fn trilinear(octet: &Octet, u: Float, v: Float, w: Float) -> Vector3 {
    let mut acc = Vector3::zero();
    for i in 0..2 {
        for j in 0..2 {
            for k in 0..2 {
                let wgt = weight(i, u) * weight(j, v) * weight(k, w);
                acc += octet[i][j][k].scale(wgt);
            }
        }
    }
    acc
}

/// Fractional offset `(u,v,w)` of `position` inside the unit cube whose
/// low corner is `center_of_cell - cell_width/2`.
pub fn fractional_offset(
    position: &Vector3,
    center_of_cell: &Vector3,
    cell_width: &Vector3,
) -> (Float, Float, Float) {
    (
        (position.x - center_of_cell.x) / cell_width.x + 0.5,
        (position.y - center_of_cell.y) / cell_width.y + 0.5,
        (position.z - center_of_cell.z) / cell_width.z + 0.5,
    )
}

/// Projects every cell's particle contributions `q*v` onto the eight
/// surrounding density nodes, then divides by cell volume once, after
/// aggregation. Each cell computes its own 8-corner contribution locally
/// (safe to run in parallel, no shared mutable state), and a sequential
/// reduction sweep afterwards sums overlapping contributions into the
/// shared grid.
pub fn project_particles_to_density(
    cells: &CellGrid,
    properties: &UniverseProperties,
    density: &mut DensityField,
) {
    density.fill(Vector3::zero());

    let indices: Vec<(usize, usize, usize)> = cells.indices().collect();
    let contributions: Vec<((usize, usize, usize), Octet)> = indices
        .into_par_iter()
        .map(|(i, j, k)| {
            let mut octet: Octet = [[[Vector3::zero(); 2]; 2]; 2];
            let cell = cells.get(i, j, k);
            let center = properties.center_of_cell(i as i64, j as i64, k as i64);
            for p in &cell.particles {
                let (u, v, w) = fractional_offset(&p.position, &center, &properties.cell_width);
                for di in 0..2 {
                    for dj in 0..2 {
                        for dk in 0..2 {
                            let wgt = weight(di, u) * weight(dj, v) * weight(dk, w);
                            octet[di][dj][dk] += p.velocity.scale(p.q * wgt);
                        }
                    }
                }
            }
            ((i, j, k), octet)
        })
        .collect();

    for ((i, j, k), octet) in contributions {
        for di in 0..2 {
            for dj in 0..2 {
                for dk in 0..2 {
                    let (ni, nj, nk) = (i as i64 + di as i64, j as i64 + dj as i64, k as i64 + dk as i64);
                    let acc = density.get(ni, nj, nk) + octet[di][dj][dk];
                    *density.get_mut(ni, nj, nk) = acc;
                }
            }
        }
    }

    let volume = properties.cell_volume();
    density.scale_in_place(1.0 / volume);
}

/// Fetches the 2x2x2 octet of field values anchored at the low-corner
/// field-node index of cell `(i,j,k)`, which is `(i+1, j+1, k+1)` due to
/// the one-cell ghost shift between cell and field-node index spaces.
pub fn field_octet_for_cell<F>(field: &NodeField, i: i64, j: i64, k: i64, select: F) -> Octet
where
    F: Fn(i64, i64, i64) -> Vector3,
{
    let mut octet: Octet = [[[Vector3::zero(); 2]; 2]; 2];
    for di in 0..2 {
        for dj in 0..2 {
            for dk in 0..2 {
                octet[di][dj][dk] = select(i + 1 + di as i64, j + 1 + dj as i64, k + 1 + dk as i64);
            }
        }
    }
    let _ = field;
    octet
}

/// Interpolates the total E and (B + Bext) at `position`, owned by cell
/// `(i,j,k)`. Returns `(E, B)`.
pub fn interpolate_fields_to_particle(
    field: &NodeField,
    properties: &UniverseProperties,
    cell_index: (i64, i64, i64),
    position: &Vector3,
) -> (Vector3, Vector3) {
    let (i, j, k) = cell_index;
    let center = properties.center_of_cell(i, j, k);
    let (u, v, w) = fractional_offset(position, &center, &properties.cell_width);

    let e_octet = field_octet_for_cell(field, i, j, k, |a, b, c| field.get(a, b, c).e);
    let b_octet = field_octet_for_cell(field, i, j, k, |a, b, c| {
        let node = field.get(a, b, c);
        node.b + node.bext
    });

    (trilinear(&e_octet, u, v, w), trilinear(&b_octet, u, v, w))
}

/// Fetches the 2x2x2 octet of centers at indices `p - (i,j,k)` for
/// `i,j,k in {0,1}`, used to interpolate node-B from surrounding centers
/// and to compute `curl B` at a node.
pub fn center_octet_below(centers: &CenterField, p: (i64, i64, i64)) -> Octet {
    let mut octet: Octet = [[[Vector3::zero(); 2]; 2]; 2];
    for di in 0..2 {
        for dj in 0..2 {
            for dk in 0..2 {
                octet[di][dj][dk] = centers.get(p.0 - di as i64, p.1 - dj as i64, p.2 - dk as i64);
            }
        }
    }
    octet
}

/// Fetches the 2x2x2 octet of nodes at indices `p + (i,j,k)` for
/// `i,j,k in {0,1}`, used to compute `curl E` at a center.
pub fn node_octet_above<F>(field: &NodeField, p: (i64, i64, i64), select: F) -> Octet
where
    F: Fn(i64, i64, i64) -> Vector3,
{
    let mut octet: Octet = [[[Vector3::zero(); 2]; 2]; 2];
    for di in 0..2 {
        for dj in 0..2 {
            for dk in 0..2 {
                octet[di][dj][dk] = select(p.0 + di as i64, p.1 + dj as i64, p.2 + dk as i64);
            }
        }
    }
    octet
}

/// Interpolates node-B from the eight surrounding centers: the plain
/// (unweighted) `1/8` average named in the forward solver's step 5.
pub fn interp_centers_to_node(octet: &Octet) -> Vector3 {
    let mut acc = Vector3::zero();
    for i in 0..2 {
        for j in 0..2 {
            for k in 0..2 {
                acc += octet[i][j][k];
            }
        }
    }
    acc.scale(1.0 / 8.0)
}

/// Interpolates center-B from the eight surrounding nodes: the same
/// unweighted `1/8` average as `interp_centers_to_node`, run in the other
/// direction. On a uniform field, `interp_nodes_to_center` followed by
/// `interp_centers_to_node` is the identity.
pub fn interp_nodes_to_center(octet: &Octet) -> Vector3 {
    interp_centers_to_node(octet)
}

/// Seeds every center, ghosts included, with the unweighted average of its
/// eight surrounding nodes' dynamic `B`. Called once at startup so the
/// forward solver's first `center_octet_below` read isn't working from an
/// arbitrarily zero-filled grid.
pub fn seed_centers_from_nodes(field: &NodeField, centers: &mut CenterField) {
    let (nx, ny, nz) = centers.dim();
    for i in 0..nx as i64 {
        for j in 0..ny as i64 {
            for k in 0..nz as i64 {
                let octet = node_octet_above(field, (i, j, k), |a, b, c| field.get(a, b, c).b);
                *centers.get_mut(i, j, k) = interp_nodes_to_center(&octet);
            }
        }
    }
}
