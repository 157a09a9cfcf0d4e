//! Parses the `name = value` configuration format: a line per key, `#`
//! begins a trailing comment, values are scalars or space-separated lists.
//! Unknown keys are logged and ignored rather than rejected.

use crate::errors::{ErrorKind, Result, ResultExt};
use crate::universe_properties::{UniverseProperties, UseCase};
use crate::vector::Vector3;
use crate::Float;
use log::warn;
use std::collections::HashMap;
use std::fs;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
}

impl Value {
    pub fn as_f64(&self) -> Result<Float> {
        match self {
            Value::Scalar(s) => s
                .parse::<Float>()
                .chain_err(|| ErrorKind::ConfigError(format!("expected a number, got '{}'", s))),
            Value::List(_) => bail!(ErrorKind::ConfigError("expected a scalar, got a list".into())),
        }
    }

    pub fn as_usize(&self) -> Result<usize> {
        match self {
            Value::Scalar(s) => s
                .parse::<usize>()
                .chain_err(|| ErrorKind::ConfigError(format!("expected an integer, got '{}'", s))),
            Value::List(_) => bail!(ErrorKind::ConfigError("expected a scalar, got a list".into())),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Scalar(s) => Ok(s.as_str()),
            Value::List(_) => bail!(ErrorKind::ConfigError("expected a scalar, got a list".into())),
        }
    }

    pub fn as_f64_list(&self) -> Result<Vec<Float>> {
        match self {
            Value::List(items) => items
                .iter()
                .map(|s| {
                    s.parse::<Float>()
                        .chain_err(|| ErrorKind::ConfigError(format!("expected a number, got '{}'", s)))
                })
                .collect(),
            Value::Scalar(s) => Ok(vec![s
                .parse::<Float>()
                .chain_err(|| ErrorKind::ConfigError(format!("expected a number, got '{}'", s)))?]),
        }
    }

    pub fn as_usize_list(&self) -> Result<Vec<usize>> {
        match self {
            Value::List(items) => items
                .iter()
                .map(|s| {
                    s.parse::<usize>()
                        .chain_err(|| ErrorKind::ConfigError(format!("expected an integer, got '{}'", s)))
                })
                .collect(),
            Value::Scalar(s) => Ok(vec![s
                .parse::<usize>()
                .chain_err(|| ErrorKind::ConfigError(format!("expected an integer, got '{}'", s)))?]),
        }
    }
}

/// A raw key-value map straight out of the config file, before any
/// key-specific interpretation or validation.
#[derive(Debug, Clone, Default)]
pub struct RawSettings {
    entries: HashMap<String, Value>,
}

impl RawSettings {
    pub fn parse(text: &str) -> RawSettings {
        let mut entries = HashMap::new();

        for line in text.lines() {
            let line = match line.find('#') {
                Some(idx) => &line[..idx],
                None => line,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.splitn(2, '=');
            let key = match parts.next() {
                Some(k) => k.trim(),
                None => continue,
            };
            let rest = match parts.next() {
                Some(r) => r.trim(),
                None => continue,
            };
            if key.is_empty() || rest.is_empty() {
                continue;
            }

            let tokens: Vec<&str> = rest.split_whitespace().collect();
            let value = if tokens.len() <= 1 {
                Value::Scalar(rest.to_string())
            } else {
                Value::List(tokens.iter().map(|s| s.to_string()).collect())
            };

            entries.insert(key.to_string(), value);
        }

        RawSettings { entries }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn require(&self, key: &str) -> Result<&Value> {
        self.get(key)
            .ok_or_else(|| ErrorKind::ConfigError(format!("missing required key '{}'", key)).into())
    }

    pub fn unrecognised_keys<'a>(&'a self, known: &'a [&str]) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .keys()
            .map(|s| s.as_str())
            .filter(move |k| !known.contains(k))
    }
}

/// The fully validated settings for a run, derived from a `RawSettings`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub dt: Float,
    pub ncycles: usize,
    pub extent: (Float, Float, Float),
    pub ncells: (usize, usize, usize),
    pub object_center: (Float, Float, Float),
    pub planet_radius: Float,
    pub b0: (Float, Float, Float),
    pub b1: (Float, Float, Float),
    pub use_case: UseCase,
    pub species: Vec<SpeciesSettings>,
    pub field_output_cycle: usize,
    pub particles_output_cycle: usize,
    pub init_file: Option<String>,
}

impl Settings {
    /// Derives the grid geometry `UniverseProperties` the simulation core
    /// operates on from the validated configuration.
    pub fn universe_properties(&self) -> UniverseProperties {
        let cell_width = Vector3::new(
            self.extent.0 / self.ncells.0 as Float,
            self.extent.1 / self.ncells.1 as Float,
            self.extent.2 / self.ncells.2 as Float,
        );
        UniverseProperties {
            size: self.ncells,
            cell_width,
            dt: self.dt,
            use_case: self.use_case,
            planet_radius: self.planet_radius,
            object_center: Vector3::new(self.object_center.0, self.object_center.1, self.object_center.2),
            b0: Vector3::new(self.b0.0, self.b0.1, self.b0.2),
            b1: Vector3::new(self.b1.0, self.b1.1, self.b1.2),
            ..UniverseProperties::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpeciesSettings {
    pub particles_per_cell: (usize, usize, usize),
    pub qom: Float,
    pub rho_init: Float,
    pub thermal_velocity: (Float, Float, Float),
    pub drift_velocity: (Float, Float, Float),
}

const KNOWN_KEYS: &[&str] = &[
    "dt", "ncycles", "Lx", "Ly", "Lz", "nxc", "nyc", "nzc", "x_center", "y_center", "z_center",
    "L_square", "B0x", "B0y", "B0z", "B1x", "B1y", "B1z", "Case", "ns", "npcelx", "npcely",
    "npcelz", "qom", "rhoINIT", "uth", "vth", "wth", "u0", "v0", "w0", "FieldOutputCycle",
    "ParticlesOutputCycle", "InitFile",
];

fn scalar_or(raw: &RawSettings, key: &str, default: Float) -> Result<Float> {
    match raw.get(key) {
        Some(v) => v.as_f64(),
        None => Ok(default),
    }
}

pub fn read_parameter_file(path: &str) -> Result<Settings> {
    let text = fs::read_to_string(path).chain_err(|| format!("unable to read '{}'", path))?;
    parse_settings(&text)
}

pub fn parse_settings(text: &str) -> Result<Settings> {
    let raw = RawSettings::parse(text);

    for key in raw.unrecognised_keys(KNOWN_KEYS) {
        warn!("ignoring unrecognised configuration key '{}'", key);
    }

    let dt = raw.require("dt")?.as_f64()?;
    if dt <= 0.0 {
        bail!(ErrorKind::ConfigError("'dt' must be positive".into()));
    }

    let ncycles = raw.require("ncycles")?.as_usize()?;

    let lx = raw.require("Lx")?.as_f64()?;
    let ly = raw.require("Ly")?.as_f64()?;
    let lz = raw.require("Lz")?.as_f64()?;

    let nxc = raw.require("nxc")?.as_usize()?;
    let nyc = raw.require("nyc")?.as_usize()?;
    let nzc = raw.require("nzc")?.as_usize()?;
    if nxc == 0 || nyc == 0 || nzc == 0 {
        bail!(ErrorKind::ConfigError("cell counts must be positive".into()));
    }

    let x_center = scalar_or(&raw, "x_center", 0.0)?;
    let y_center = scalar_or(&raw, "y_center", 0.0)?;
    let z_center = scalar_or(&raw, "z_center", 0.0)?;
    let planet_radius = scalar_or(&raw, "L_square", 0.0)?;

    let b0x = scalar_or(&raw, "B0x", 0.0)?;
    let b0y = scalar_or(&raw, "B0y", 0.0)?;
    let b0z = scalar_or(&raw, "B0z", 0.0)?;
    let b1x = scalar_or(&raw, "B1x", 0.0)?;
    let b1y = scalar_or(&raw, "B1y", 0.0)?;
    let b1z = scalar_or(&raw, "B1z", 0.0)?;

    let use_case = match raw.get("Case") {
        Some(v) => UseCase::parse(v.as_str()?),
        None => UseCase::Test,
    };

    let ns = match raw.get("ns") {
        Some(v) => v.as_usize()?,
        None => 0,
    };

    let species = if ns > 0 {
        let npcelx = raw.require("npcelx")?.as_usize_list()?;
        let npcely = raw.require("npcely")?.as_usize_list()?;
        let npcelz = raw.require("npcelz")?.as_usize_list()?;
        let qom = raw.require("qom")?.as_f64_list()?;
        let rho_init = raw.require("rhoINIT")?.as_f64_list()?;
        let uth = raw.require("uth")?.as_f64_list()?;
        let vth = raw.require("vth")?.as_f64_list()?;
        let wth = raw.require("wth")?.as_f64_list()?;
        let u0 = raw.require("u0")?.as_f64_list()?;
        let v0 = raw.require("v0")?.as_f64_list()?;
        let w0 = raw.require("w0")?.as_f64_list()?;

        (0..ns)
            .map(|i| SpeciesSettings {
                particles_per_cell: (npcelx[i], npcely[i], npcelz[i]),
                qom: qom[i],
                rho_init: rho_init[i],
                thermal_velocity: (uth[i], vth[i], wth[i]),
                drift_velocity: (u0[i], v0[i], w0[i]),
            })
            .collect()
    } else {
        Vec::new()
    };

    let field_output_cycle = match raw.get("FieldOutputCycle") {
        Some(v) => v.as_usize()?,
        None => 0,
    };
    let particles_output_cycle = match raw.get("ParticlesOutputCycle") {
        Some(v) => v.as_usize()?,
        None => 0,
    };
    let init_file = match raw.get("InitFile") {
        Some(v) => Some(v.as_str()?.to_string()),
        None => None,
    };

    Ok(Settings {
        dt,
        ncycles,
        extent: (lx, ly, lz),
        ncells: (nxc, nyc, nzc),
        object_center: (x_center, y_center, z_center),
        planet_radius,
        b0: (b0x, b0y, b0z),
        b1: (b1x, b1y, b1z),
        use_case,
        species,
        field_output_cycle,
        particles_output_cycle,
        init_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars_lists_and_comments() {
        let text = "\
            # a full-line comment\n\
            dt = 0.1 # inline comment\n\
            ncycles = 10\n\
            Lx = 320\n\
            Ly = 320\n\
            Lz = 320\n\
            nxc = 32\n\
            nyc = 32\n\
            nzc = 32\n\
            Case = Dipole\n\
            ns = 1\n\
            npcelx = 8\n\
            npcely = 8\n\
            npcelz = 8\n\
            qom = -1.0\n\
            rhoINIT = 1.0\n\
            uth = 0.1\n\
            vth = 0.1\n\
            wth = 0.1\n\
            u0 = 0.0\n\
            v0 = 0.0\n\
            w0 = 0.0\n\
        ";

        let settings = parse_settings(text).unwrap();
        assert_eq!(settings.dt, 0.1);
        assert_eq!(settings.ncycles, 10);
        assert_eq!(settings.ncells, (32, 32, 32));
        assert_eq!(settings.use_case, UseCase::Dipole);
        assert_eq!(settings.species.len(), 1);
        assert_eq!(settings.species[0].qom, -1.0);
    }

    #[test]
    fn missing_required_key_is_a_config_error() {
        let text = "ncycles = 10\n";
        assert!(parse_settings(text).is_err());
    }

    #[test]
    fn universe_properties_derives_cell_width_from_extent_and_cell_count() {
        let text = "dt = 0.1\nncycles = 1\nLx=10\nLy=20\nLz=40\nnxc=10\nnyc=10\nnzc=10\n";
        let settings = parse_settings(text).unwrap();
        let props = settings.universe_properties();
        assert_eq!(props.cell_width, crate::vector::Vector3::new(1.0, 2.0, 4.0));
        assert_eq!(props.size, (10, 10, 10));
    }

    #[test]
    fn unrecognised_case_defaults_to_test() {
        let mut text = String::from("dt = 0.1\nncycles = 1\nLx=1\nLy=1\nLz=1\nnxc=1\nnyc=1\nnzc=1\n");
        text.push_str("Case = Bogus\n");
        let settings = parse_settings(&text).unwrap();
        assert_eq!(settings.use_case, UseCase::Test);
    }
}
