//! Field solver strategies. Each use case gets its own strategy object
//! implementing `FieldSolver`, and the step driver holds one strategy for
//! the run rather than branching on a use-case tag inside the solve loop.

use crate::field::{CenterField, DensityField, NodeField};
use crate::interpolate::{center_octet_below, interp_centers_to_node, node_octet_above, Octet};
use crate::universe_properties::UniverseProperties;
use crate::vector::Vector3;
use crate::Float;

/// `dipole(r) = -B0*R^3/|r|^5 * (3 rx rz, 3 ry rz, 2 rz^2 - rx^2 - ry^2)`
/// outside the planet radius `R`; zero inside.
pub fn dipole_field(r: &Vector3, b0: Float, planet_radius: Float) -> Vector3 {
    let dist2 = r.norm_squared();
    if dist2 < planet_radius * planet_radius {
        return Vector3::zero();
    }
    let dist = dist2.sqrt();
    let fac = -b0 * planet_radius.powi(3) / dist.powi(5);
    Vector3::new(
        fac * 3.0 * r.x * r.z,
        fac * 3.0 * r.y * r.z,
        fac * (2.0 * r.z * r.z - r.x * r.x - r.y * r.y),
    )
}

/// Precomputes `Bext` at every node from the dipole formula relative to
/// the object center, run once at initialisation.
pub fn initialize_bext(field: &mut NodeField, properties: &UniverseProperties) {
    let (nx, ny, nz) = field.dim();
    for i in 0..nx as i64 {
        for j in 0..ny as i64 {
            for k in 0..nz as i64 {
                let loc = properties.location_for_field(i, j, k);
                let r = loc - properties.object_center;
                field.get_mut(i, j, k).bext = dipole_field(&r, properties.b0.x, properties.planet_radius);
            }
        }
    }
}

pub trait FieldSolver {
    /// Solves the field update at interior node `p`, given the current
    /// density and center fields. `E`/`B` are updated in place.
    fn solve_node(
        &self,
        properties: &UniverseProperties,
        p: (i64, i64, i64),
        density: &DensityField,
        field: &mut NodeField,
        centers: &mut CenterField,
    );
}

/// The required static solver: `E = 0`, `B = dipole(position)`.
pub struct StaticSolver;

impl FieldSolver for StaticSolver {
    fn solve_node(
        &self,
        properties: &UniverseProperties,
        p: (i64, i64, i64),
        _density: &DensityField,
        field: &mut NodeField,
        _centers: &mut CenterField,
    ) {
        let loc = properties.location_for_field(p.0, p.1, p.2);
        let node = field.get_mut(p.0, p.1, p.2);
        node.e = Vector3::zero();
        node.b = dipole_field(&loc, properties.b0.x, properties.planet_radius);
    }
}

/// The explicit forward time-stepping field solver.
pub struct ForwardSolver;

/// `curl B_x` (and cyclically y, z) from an octet of eight neighbor values,
/// anchored so that offset-0 along an axis is the "high" side and offset-1
/// is the "low" side (the convention produced by `center_octet_below` and
/// `node_octet_above`).
fn curl_from_octet(octet: &Octet, inv_2d: Vector3) -> Vector3 {
    let mut sum_dy_z = 0.0;
    let mut sum_dz_y = 0.0;
    let mut sum_dz_x = 0.0;
    let mut sum_dx_z = 0.0;
    let mut sum_dx_y = 0.0;
    let mut sum_dy_x = 0.0;
    for i in 0..2 {
        for k in 0..2 {
            sum_dy_z += octet[i][1][k].z - octet[i][0][k].z;
        }
    }
    for i in 0..2 {
        for j in 0..2 {
            sum_dz_y += octet[i][j][1].y - octet[i][j][0].y;
        }
    }
    for j in 0..2 {
        for k in 0..2 {
            sum_dz_x += octet[1][j][k].x - octet[0][j][k].x;
        }
    }
    for i in 0..2 {
        for k in 0..2 {
            sum_dx_z += octet[i][1][k].z - octet[i][0][k].z;
        }
    }
    for i in 0..2 {
        for j in 0..2 {
            sum_dx_y += octet[i][j][1].y - octet[i][j][0].y;
        }
    }
    for j in 0..2 {
        for k in 0..2 {
            sum_dy_x += octet[1][j][k].x - octet[0][j][k].x;
        }
    }
    let dby_dz = 0.25 * sum_dx_z * inv_2d.z;
    let dbz_dy = 0.25 * sum_dy_z * inv_2d.y;
    let dbz_dx = 0.25 * sum_dz_x * inv_2d.x;
    let dbx_dz = 0.25 * sum_dz_y * inv_2d.z;
    let dbx_dy = 0.25 * sum_dy_x * inv_2d.y;
    let dby_dx = 0.25 * sum_dx_y * inv_2d.x;

    Vector3::new(dbz_dy - dby_dz, dbx_dz - dbz_dx, dby_dx - dbx_dy)
}

impl FieldSolver for ForwardSolver {
    fn solve_node(
        &self,
        properties: &UniverseProperties,
        p: (i64, i64, i64),
        density: &DensityField,
        field: &mut NodeField,
        centers: &mut CenterField,
    ) {
        let dt = properties.dt;
        let inv = Vector3::new(
            1.0 / properties.cell_width.x,
            1.0 / properties.cell_width.y,
            1.0 / properties.cell_width.z,
        );

        // 1. curl B from the eight centers surrounding node p.
        let b_octet = center_octet_below(centers, p);
        let curl_b = curl_from_octet(&b_octet, inv);

        // 2. E[p] += (curlB + J[p-(1,1,1)]) * dt
        let j = density.at_field_index(p.0, p.1, p.2);
        field.get_mut(p.0, p.1, p.2).e += (curl_b + j).scale(dt);

        // 3. curl E from the eight nodes surrounding center p.
        let e_octet = node_octet_above(field, p, |a, b, c| field.get(a, b, c).e);
        let curl_e = curl_from_octet(&e_octet, inv);

        // 4. Bc[p] -= curlE * dt
        let bc = centers.get_mut(p.0, p.1, p.2);
        *bc -= curl_e.scale(dt);

        // 5. B[p] = 1/8 * sum of surrounding centers.
        let bc_octet = center_octet_below(centers, p);
        field.get_mut(p.0, p.1, p.2).b = interp_centers_to_node(&bc_octet);
    }
}

/// Picks the field solving strategy for a use case. `Dipole` gets the
/// forward (explicit) solver; every other use case gets the static solver,
/// which holds `E = 0` and `B` at the precomputed dipole value. CLI entry
/// points call this instead of matching on `UseCase` themselves.
pub fn solver_for_use_case(use_case: crate::universe_properties::UseCase) -> Box<dyn FieldSolver + Send + Sync> {
    use crate::universe_properties::UseCase;
    match use_case {
        UseCase::Dipole => Box::new(ForwardSolver),
        UseCase::Test => Box::new(StaticSolver),
    }
}
