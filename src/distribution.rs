//! Initial particle distributions used by the CLI benchmark mode and by
//! config-driven initialisation: uniform, clustered, explosion and beam
//! seedings, flattened to a single-species generator since `Particle`
//! carries no species tag.

use crate::particle::Particle;
use crate::universe_properties::UniverseProperties;
use crate::vector::Vector3;
use crate::Float;
use rand::distributions::{Distribution as RandDistribution, Uniform};
use rand::Rng;
use rand_distr::Normal;
use rand_pcg::Pcg64Mcg;

/// The four benchmark distributions selected by the `:X:N` CLI form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Uniform,
    Cluster,
    Explosion,
    Beam,
}

impl Distribution {
    /// Parses the `X` designator of `:X:N`.
    pub fn parse(c: char) -> Option<Distribution> {
        match c {
            'U' => Some(Distribution::Uniform),
            'C' => Some(Distribution::Cluster),
            'E' => Some(Distribution::Explosion),
            'B' => Some(Distribution::Beam),
            _ => None,
        }
    }

    pub fn generate(
        &self,
        properties: &UniverseProperties,
        n: usize,
        q_over_m: Float,
        seed: u64,
    ) -> Vec<Particle> {
        match self {
            Distribution::Uniform => uniform(properties, n, q_over_m, seed),
            Distribution::Cluster => cluster(properties, n, q_over_m, seed),
            Distribution::Explosion => explosion(properties, n, q_over_m, seed),
            Distribution::Beam => beam(properties, n, q_over_m, seed),
        }
    }
}

fn rng_from_seed(seed: u64) -> Pcg64Mcg {
    Pcg64Mcg::new(seed as u128)
}

/// Particles spread uniformly over the universe extent with velocities
/// drawn uniformly from `[-0.2, 0.2]` per axis.
fn uniform(properties: &UniverseProperties, n: usize, q_over_m: Float, seed: u64) -> Vec<Particle> {
    let mut rng = rng_from_seed(seed);
    let extent = properties.extent();
    let pos_x = Uniform::new(0.0, extent.x);
    let pos_y = Uniform::new(0.0, extent.y);
    let pos_z = Uniform::new(0.0, extent.z);
    let vel = Uniform::new(-0.2, 0.2);

    (0..n)
        .map(|_| {
            let position = Vector3::new(pos_x.sample(&mut rng), pos_y.sample(&mut rng), pos_z.sample(&mut rng));
            let velocity = Vector3::new(vel.sample(&mut rng), vel.sample(&mut rng), vel.sample(&mut rng));
            make_particle(position, velocity, properties, q_over_m)
        })
        .collect()
}

/// Particles normally distributed around the universe center with std-dev
/// `extent/5`, velocities uniform in `[-0.2, 0.2]`.
fn cluster(properties: &UniverseProperties, n: usize, q_over_m: Float, seed: u64) -> Vec<Particle> {
    let mut rng = rng_from_seed(seed);
    let extent = properties.extent();
    let center = extent.scale(0.5);
    let sigma = extent.scale(1.0 / 5.0);
    let nx = Normal::new(center.x, sigma.x.abs().max(1e-9)).unwrap();
    let ny = Normal::new(center.y, sigma.y.abs().max(1e-9)).unwrap();
    let nz = Normal::new(center.z, sigma.z.abs().max(1e-9)).unwrap();
    let vel = Uniform::new(-0.2, 0.2);

    (0..n)
        .map(|_| {
            let position = Vector3::new(nx.sample(&mut rng), ny.sample(&mut rng), nz.sample(&mut rng));
            let velocity = Vector3::new(vel.sample(&mut rng), vel.sample(&mut rng), vel.sample(&mut rng));
            make_particle(position, velocity, properties, q_over_m)
        })
        .collect()
}

/// Particles placed within a sphere of radius `extent.x/10` around the
/// universe center, moving radially outward with speed drawn from
/// `Normal(0, 1.5)`.
fn explosion(properties: &UniverseProperties, n: usize, q_over_m: Float, seed: u64) -> Vec<Particle> {
    let mut rng = rng_from_seed(seed);
    let extent = properties.extent();
    let center = extent.scale(0.5);
    let radius = extent.x / 10.0;
    let speed = Normal::new(0.0 as Float, 1.5).unwrap();

    (0..n)
        .map(|_| {
            let dir = random_unit_vector(&mut rng);
            let r = radius * rng.gen::<Float>().cbrt();
            let position = center + dir.scale(r);
            let velocity = dir.scale(speed.sample(&mut rng).abs());
            make_particle(position, velocity, properties, q_over_m)
        })
        .collect()
}

/// A narrow beam near the origin corner, drifting with a velocity scaled
/// to cross the universe within the benchmark's fixed time-step budget.
fn beam(properties: &UniverseProperties, n: usize, q_over_m: Float, seed: u64) -> Vec<Particle> {
    let mut rng = rng_from_seed(seed);
    let extent = properties.extent();
    let spread = extent.scale(1.0 / 100.0);
    let jitter = extent.scale(1.0 / 500.0);
    let drift = extent.scale(0.95 / properties.dt.max(1e-9));

    let px = Normal::new(spread.x, jitter.x.abs().max(1e-9)).unwrap();
    let py = Normal::new(spread.y, jitter.y.abs().max(1e-9)).unwrap();
    let pz = Normal::new(spread.z, jitter.z.abs().max(1e-9)).unwrap();

    (0..n)
        .map(|_| {
            let position = Vector3::new(px.sample(&mut rng), py.sample(&mut rng), pz.sample(&mut rng));
            make_particle(position, drift, properties, q_over_m)
        })
        .collect()
}

fn random_unit_vector(rng: &mut Pcg64Mcg) -> Vector3 {
    loop {
        let v = Vector3::new(
            rng.gen_range(-1.0, 1.0),
            rng.gen_range(-1.0, 1.0),
            rng.gen_range(-1.0, 1.0),
        );
        let n2 = v.norm_squared();
        if n2 > 1e-9 && n2 <= 1.0 {
            return v.scale(1.0 / n2.sqrt());
        }
    }
}

/// Wraps a position into `[0, extent)` and builds a unit-mass particle with
/// the given charge-over-mass ratio.
fn make_particle(mut position: Vector3, velocity: Vector3, properties: &UniverseProperties, q_over_m: Float) -> Particle {
    let extent = properties.extent();
    position.x = position.x.rem_euclid(extent.x);
    position.y = position.y.rem_euclid(extent.y);
    position.z = position.z.rem_euclid(extent.z);
    Particle::new(position, velocity, q_over_m, 1.0)
}

/// Config-driven initial condition: one species placed on a regular
/// sub-cell lattice (`particles_per_cell` per axis) with a Maxwellian
/// velocity (mean `drift_velocity`, standard deviation `thermal_velocity`).
/// Folds the species' macro-particle weight
/// (`rho_init * cell_volume / particles_per_cell`) into `q` alongside its
/// charge-to-mass ratio, since `Particle` carries no separate weight field.
pub fn maxwellian_from_species(
    properties: &UniverseProperties,
    species: &crate::settings::SpeciesSettings,
    seed: u64,
) -> Vec<Particle> {
    let mut rng = rng_from_seed(seed);
    let (nx, ny, nz) = properties.size;
    let (npx, npy, npz) = species.particles_per_cell;
    let n_per_cell = (npx * npy * npz).max(1);
    let weight = species.rho_init * properties.cell_volume() / n_per_cell as Float;
    let q = species.qom * weight;

    let vth = species.thermal_velocity;
    let v0 = species.drift_velocity;
    let nvx = Normal::new(v0.0, vth.0.abs().max(1e-12)).unwrap();
    let nvy = Normal::new(v0.1, vth.1.abs().max(1e-12)).unwrap();
    let nvz = Normal::new(v0.2, vth.2.abs().max(1e-12)).unwrap();

    let mut particles = Vec::with_capacity(nx * ny * nz * n_per_cell);
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                let low = Vector3::new(
                    i as Float * properties.cell_width.x,
                    j as Float * properties.cell_width.y,
                    k as Float * properties.cell_width.z,
                );
                for a in 0..npx.max(1) {
                    for b in 0..npy.max(1) {
                        for c in 0..npz.max(1) {
                            let frac = Vector3::new(
                                (a as Float + 0.5) / npx.max(1) as Float,
                                (b as Float + 0.5) / npy.max(1) as Float,
                                (c as Float + 0.5) / npz.max(1) as Float,
                            );
                            let position = low
                                + Vector3::new(
                                    frac.x * properties.cell_width.x,
                                    frac.y * properties.cell_width.y,
                                    frac.z * properties.cell_width.z,
                                );
                            let velocity =
                                Vector3::new(nvx.sample(&mut rng), nvy.sample(&mut rng), nvz.sample(&mut rng));
                            particles.push(Particle::new(position, velocity, q, 1.0));
                        }
                    }
                }
            }
        }
    }
    particles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_distribution_places_particles_inside_the_universe() {
        let properties = UniverseProperties {
            size: (4, 4, 4),
            cell_width: Vector3::splat(1.0),
            ..UniverseProperties::default()
        };
        let particles = Distribution::Uniform.generate(&properties, 50, 1.0, 42);
        assert_eq!(particles.len(), 50);
        let extent = properties.extent();
        for p in &particles {
            assert!(p.position.x >= 0.0 && p.position.x < extent.x);
            assert!(p.position.y >= 0.0 && p.position.y < extent.y);
            assert!(p.position.z >= 0.0 && p.position.z < extent.z);
        }
    }

    #[test]
    fn maxwellian_from_species_places_one_particle_per_sub_cell_slot() {
        let properties = UniverseProperties {
            size: (2, 2, 2),
            cell_width: Vector3::splat(1.0),
            ..UniverseProperties::default()
        };
        let species = crate::settings::SpeciesSettings {
            particles_per_cell: (2, 1, 1),
            qom: -1.0,
            rho_init: 1.0,
            thermal_velocity: (0.01, 0.01, 0.01),
            drift_velocity: (0.0, 0.0, 0.0),
        };
        let particles = maxwellian_from_species(&properties, &species, 7);
        assert_eq!(particles.len(), 2 * 2 * 2 * 2);
        for p in &particles {
            assert!(p.position.is_finite());
        }
    }

    #[test]
    fn parse_recognises_the_four_benchmark_designators() {
        assert_eq!(Distribution::parse('U'), Some(Distribution::Uniform));
        assert_eq!(Distribution::parse('C'), Some(Distribution::Cluster));
        assert_eq!(Distribution::parse('E'), Some(Distribution::Explosion));
        assert_eq!(Distribution::parse('B'), Some(Distribution::Beam));
        assert_eq!(Distribution::parse('X'), None);
    }
}
