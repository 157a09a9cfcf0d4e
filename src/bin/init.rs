//! Picks the initial particle population for a run: distribution-seeded,
//! a file-provided population, resuming a snapshot, or reading particles
//! from stdin.

use crate::errors::*;
use pic3d::settings::Settings;
use pic3d::{Simulation, Snapshot};
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitType {
    /// Seed particles from each species' Maxwellian lattice distribution.
    Distribution,
    /// Read an initial particle population from the file named by
    /// `InitFile` in the parameter file.
    File,
    /// Resume from a snapshot file named by `InitFile`.
    Resume,
    /// Read an initial particle population as JSON from stdin.
    Stdin,
}

pub fn init_simulation(settings: &Settings, init_type: InitType, seed: u64) -> Result<Simulation> {
    let properties = settings.universe_properties();
    let solver = pic3d::solver::solver_for_use_case(settings.use_case);
    let mut simulation = Simulation::new(properties, solver);

    match init_type {
        InitType::Distribution => {
            let mut particles = Vec::new();
            for (n, species) in settings.species.iter().enumerate() {
                particles.extend(pic3d::distribution::maxwellian_from_species(
                    &properties,
                    species,
                    seed.wrapping_add(n as u64),
                ));
            }
            simulation.init(particles);
        }
        InitType::File => {
            let path = settings
                .init_file
                .as_ref()
                .ok_or("File initial condition requested but no 'InitFile' set in parameter file")?;
            let text = std::fs::read_to_string(path).chain_err(|| format!("unable to read '{}'", path))?;
            let particles = serde_json::from_str(&text).chain_err(|| "unable to parse initial condition file")?;
            simulation.init(particles);
        }
        InitType::Resume => {
            let path = settings
                .init_file
                .as_ref()
                .ok_or("Resume requested but no 'InitFile' set in parameter file")?;
            let text = std::fs::read_to_string(path).chain_err(|| format!("unable to read snapshot '{}'", path))?;
            let snapshot: Snapshot = serde_json::from_str(&text).chain_err(|| "unable to parse snapshot")?;
            simulation.resume(snapshot);
        }
        InitType::Stdin => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .chain_err(|| "unable to read initial condition from stdin")?;
            let particles = serde_json::from_str(&text).chain_err(|| "unable to parse initial condition from stdin")?;
            simulation.init(particles);
        }
    }

    Ok(simulation)
}
