//! Core per-cycle particle-in-cell pipeline: project particle contributions
//! onto a staggered node/center grid, solve the field update, interpolate
//! fields back onto particles, advance them with a Boris integrator, and
//! migrate particles across cell boundaries under periodic wrap-around.

#[macro_use]
extern crate derive_more;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate serde_derive;

pub mod cell;
pub mod distribution;
pub mod errors;
pub mod field;
pub mod interpolate;
pub mod integrator;
pub mod output;
pub mod particle;
pub mod settings;
pub mod simulation;
pub mod solver;
pub mod transfer;
pub mod universe_properties;
pub mod vector;

/// Floating point type used throughout the core. All arithmetic is 64-bit
/// per the integrator's numeric rules.
pub type Float = f64;

pub use crate::particle::Particle;
pub use crate::simulation::{Simulation, Snapshot};
pub use crate::universe_properties::{UniverseProperties, UseCase};
