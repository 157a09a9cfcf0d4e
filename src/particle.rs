//! Data structure representing a charged point particle.

use crate::vector::Vector3;
use crate::Float;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A point mass with position, velocity, charge and mass. `velocity_star` is
/// the optional cached auxiliary velocity used by sub-cycling integrator
/// variants; the main pipeline leaves it at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vector3,
    pub velocity: Vector3,
    pub q: Float,
    pub mass: Float,
    pub velocity_star: Vector3,
}

impl Particle {
    pub fn new(position: Vector3, velocity: Vector3, q: Float, mass: Float) -> Particle {
        Particle {
            position,
            velocity,
            q,
            mass,
            velocity_star: Vector3::zero(),
        }
    }

    pub fn charge_over_mass(&self) -> Float {
        self.q / self.mass
    }

    pub fn kinetic_energy(&self) -> Float {
        0.5 * self.mass * self.velocity.norm_squared()
    }

    pub fn momentum(&self) -> Vector3 {
        self.velocity.scale(self.mass)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }

    pub fn update_position(&mut self, dt: Float) {
        self.position += self.velocity.scale(dt);
    }
}

/// Serialize a particle as a flat `[x, y, z, vx, vy, vz, q, mass]` array
/// instead of a nested struct, to keep dumps compact.
impl Serialize for Particle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
            self.q,
            self.mass,
        ]
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Particle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (px, py, pz, vx, vy, vz, q, mass): (Float, Float, Float, Float, Float, Float, Float, Float) =
            Deserialize::deserialize(deserializer)?;
        Ok(Particle {
            position: Vector3::new(px, py, pz),
            velocity: Vector3::new(vx, vy, vz),
            q,
            mass,
            velocity_star: Vector3::zero(),
        })
    }
}
