//! Immutable per-run properties of the simulated universe, and the
//! use-case tag that selects the field-solving strategy. `UseCase` is
//! consumed by `crate::solver` to select a strategy object rather than
//! being matched inline inside solver functions.

use crate::vector::Vector3;
use crate::Float;

/// Earth radius in meters, used as the default planet radius scale.
pub const RE: Float = 6_378_137.0;
/// Reference dipole amplitude at the equator, in Tesla.
pub const B0_DEFAULT: Float = 3.07e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UseCase {
    Dipole,
    Test,
}

impl Default for UseCase {
    fn default() -> Self {
        UseCase::Test
    }
}

impl UseCase {
    /// Unrecognised config values default to `Test`, per the external
    /// interface contract.
    pub fn parse(s: &str) -> UseCase {
        match s {
            "Dipole" => UseCase::Dipole,
            _ => UseCase::Test,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UniverseProperties {
    /// number of cells per axis
    pub size: (usize, usize, usize),
    /// cell width per axis
    pub cell_width: Vector3,
    /// simulation time step
    pub dt: Float,
    pub use_case: UseCase,
    /// radius of the planet for the dipole solver
    pub planet_radius: Float,
    /// center of the dipole object, in world coordinates
    pub object_center: Vector3,
    /// prescribed initial magnetic field amplitude
    pub b0: Vector3,
    /// external field amplitude
    pub b1: Vector3,
    pub speed_of_light: Float,
}

impl Default for UniverseProperties {
    fn default() -> Self {
        UniverseProperties {
            size: (1, 1, 1),
            cell_width: Vector3::splat(1.0),
            dt: 1.0,
            use_case: UseCase::Test,
            planet_radius: 1.0,
            object_center: Vector3::zero(),
            b0: Vector3::zero(),
            b1: Vector3::zero(),
            speed_of_light: 299_792_458.0,
        }
    }
}

impl UniverseProperties {
    /// World-space location of the center of cell `(i, j, k)`.
    pub fn center_of_cell(&self, i: i64, j: i64, k: i64) -> Vector3 {
        Vector3::new(
            (i as Float + 0.5) * self.cell_width.x,
            (j as Float + 0.5) * self.cell_width.y,
            (k as Float + 0.5) * self.cell_width.z,
        )
    }

    /// World-space location of field node `(i, j, k)`. Field nodes have a
    /// one-cell ghost layer, so node `(1,1,1)` sits at the origin.
    pub fn location_for_field(&self, i: i64, j: i64, k: i64) -> Vector3 {
        Vector3::new(
            (i as Float - 1.0) * self.cell_width.x,
            (j as Float - 1.0) * self.cell_width.y,
            (k as Float - 1.0) * self.cell_width.z,
        )
    }

    pub fn cell_volume(&self) -> Float {
        self.cell_width.x * self.cell_width.y * self.cell_width.z
    }

    pub fn dims(&self) -> (i64, i64, i64) {
        (self.size.0 as i64, self.size.1 as i64, self.size.2 as i64)
    }

    pub fn extent(&self) -> Vector3 {
        Vector3::new(
            self.size.0 as Float * self.cell_width.x,
            self.size.1 as Float * self.cell_width.y,
            self.size.2 as Float * self.cell_width.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognised_use_case_defaults_to_test() {
        assert_eq!(UseCase::parse("Dipole"), UseCase::Dipole);
        assert_eq!(UseCase::parse("bogus"), UseCase::Test);
        assert_eq!(UseCase::parse(""), UseCase::Test);
    }

    #[test]
    fn center_of_cell_offsets_by_half_width() {
        let mut props = UniverseProperties::default();
        props.cell_width = Vector3::new(2.0, 2.0, 2.0);
        let c = props.center_of_cell(0, 0, 0);
        assert_eq!(c, Vector3::new(1.0, 1.0, 1.0));
    }
}
