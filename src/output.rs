//! Diagnostic records produced at the end of a cycle: conserved quantities,
//! periodic particle dumps, periodic per-cell density frames, and the final
//! snapshot.

use crate::particle::Particle;
use serde_derive::{Deserialize, Serialize};

/// One row of the tab-separated conserved-quantities log: `Cycle /
/// TotalMoment / E_energy / B_energy / Total_KE`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConservedQuantities {
    pub cycle: usize,
    pub total_momentum: f64,
    pub e_energy: f64,
    pub b_energy: f64,
    pub total_kinetic_energy: f64,
}

pub const CONSERVED_QUANTITIES_HEADER: &str = "Cycle \t Total Moment \t E energy \t B energy \t Total KE \n";

impl ConservedQuantities {
    pub fn to_row(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\n",
            self.cycle, self.total_momentum, self.e_energy, self.b_energy, self.total_kinetic_energy
        )
    }
}

/// One per-cell row of the optional `t,x,y,z,density` CSV frame.
#[derive(Debug, Clone, Copy)]
pub struct DensityRow {
    pub t: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub density: usize,
}

pub const DENSITY_CSV_HEADER: &str = "t,x,y,z,density\n";

impl DensityRow {
    pub fn to_row(&self) -> String {
        format!("{},{},{},{},{}\n", self.t, self.x, self.y, self.z, self.density)
    }
}

/// Everything that may be produced at the end of a cycle, keyed by whether
/// the corresponding output cadence fired this cycle.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutputEntry {
    pub conserved: Option<ConservedQuantitiesEntry>,
    pub particles: Option<Vec<Particle>>,
    pub timestep: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConservedQuantitiesEntry {
    pub cycle: usize,
    pub total_momentum: f64,
    pub e_energy: f64,
    pub b_energy: f64,
    pub total_kinetic_energy: f64,
}

impl ConservedQuantitiesEntry {
    pub fn to_row(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\n",
            self.cycle, self.total_momentum, self.e_energy, self.b_energy, self.total_kinetic_energy
        )
    }
}

impl From<ConservedQuantities> for ConservedQuantitiesEntry {
    fn from(c: ConservedQuantities) -> Self {
        ConservedQuantitiesEntry {
            cycle: c.cycle,
            total_momentum: c.total_momentum,
            e_energy: c.e_energy,
            b_energy: c.b_energy,
            total_kinetic_energy: c.total_kinetic_energy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conserved_quantities_row_is_tab_separated() {
        let row = ConservedQuantities {
            cycle: 3,
            total_momentum: 1.0,
            e_energy: 2.0,
            b_energy: 3.0,
            total_kinetic_energy: 4.0,
        }
        .to_row();
        assert_eq!(row, "3\t1\t2\t3\t4\n");
    }

    #[test]
    fn density_row_is_comma_separated() {
        let row = DensityRow {
            t: 1,
            x: 0.0,
            y: 10.0,
            z: 20.0,
            density: 5,
        }
        .to_row();
        assert_eq!(row, "1,0,10,20,5\n");
    }
}
