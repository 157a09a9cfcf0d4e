#![recursion_limit = "1024"]

#[macro_use]
extern crate error_chain;

mod errors {
    error_chain! {
        links {
            Core(::pic3d::errors::Error, ::pic3d::errors::ErrorKind);
        }
        foreign_links {
            Io(::std::io::Error);
            Json(::serde_json::Error);
        }
    }
}

mod init;
mod output;
mod timedisplay;

use crate::errors::*;
use crate::init::InitType;
use crate::output::path::OutputPath;
use crate::output::worker::Worker;
use clap::{load_yaml, App};
use colored::*;
use log::{error, info};
use pbr::ProgressBar;
use pic3d::distribution::Distribution;
use pic3d::output::{ConservedQuantitiesEntry, OutputEntry};
use pic3d::settings::{self, Settings};
use pic3d::{Simulation, UniverseProperties};
use std::path::Path;

fn main() {
    env_logger::init();

    if let Err(ref e) = run() {
        error!("{}: {}", "error".red(), e);
        for e in e.iter().skip(1) {
            error!("caused by: {}", e);
        }
        if let Some(backtrace) = e.backtrace() {
            error!("backtrace: {:?}", backtrace);
        }
        std::process::exit(1);
    }
    std::process::exit(0);
}

fn run() -> Result<()> {
    let yaml = load_yaml!("cli.yml");
    let matches = App::from_yaml(yaml).get_matches();

    let descriptor = matches.value_of("parameter_file").unwrap();
    let output_dir = Path::new(matches.value_of("output_directory").unwrap());
    let seed: u64 = matches.value_of("seed").unwrap().parse().chain_err(|| "invalid --seed")?;
    let queue_size: usize = matches
        .value_of("queue_size")
        .unwrap()
        .parse()
        .chain_err(|| "invalid --queue-size")?;
    let show_progress = matches.is_present("progress");
    let resume = matches.is_present("resume");
    let from_stdin = matches.is_present("stdin");

    let path = OutputPath::new(output_dir, "pic3d");
    path.create().chain_err(|| "cannot create output directory")?;

    let worker = Worker::new(queue_size, &path).chain_err(|| "unable to create output thread")?;

    let (settings, simulation) = if let Some(rest) = descriptor.strip_prefix(':') {
        let (distribution, n) = parse_benchmark(rest)?;
        worker
            .write_metadata(format!("{{\"benchmark\":\"{}\",\"particles\":{}}}", rest, n))
            .chain_err(|| "unable to write metadata")?;
        (None, benchmark_simulation(distribution, n, seed)?)
    } else {
        let settings = settings::read_parameter_file(descriptor).chain_err(|| "error reading parameter file")?;
        let settings_json = serde_json::to_string_pretty(&settings_as_json(&settings))
            .chain_err(|| "unable to serialize settings")?;
        worker.write_metadata(settings_json).chain_err(|| "unable to write metadata")?;

        let init_type = if resume {
            InitType::Resume
        } else if from_stdin {
            InitType::Stdin
        } else if settings.init_file.is_some() {
            InitType::File
        } else {
            InitType::Distribution
        };
        let simulation = init::init_simulation(&settings, init_type, seed)
            .chain_err(|| "error during initialization of simulation")?;
        (Some(settings), simulation)
    };

    run_simulation(settings.as_ref(), simulation, worker, show_progress)
}

fn parse_benchmark(rest: &str) -> Result<(Distribution, usize)> {
    let mut parts = rest.splitn(2, ':');
    let tag = parts.next().ok_or("malformed benchmark descriptor")?;
    let n: usize = parts
        .next()
        .ok_or("malformed benchmark descriptor, expected ':X:N'")?
        .parse()
        .chain_err(|| "benchmark particle count must be an integer")?;
    let c = tag.chars().next().ok_or("empty benchmark designator")?;
    let distribution = Distribution::parse(c).ok_or_else(|| format!("unknown benchmark designator '{}'", tag))?;
    Ok((distribution, n))
}

const BENCHMARK_CYCLES: usize = 100;

fn benchmark_simulation(distribution: Distribution, n: usize, seed: u64) -> Result<Simulation> {
    let properties = UniverseProperties {
        size: (16, 16, 16),
        dt: 0.1,
        ..UniverseProperties::default()
    };
    let solver = pic3d::solver::solver_for_use_case(properties.use_case);
    let mut simulation = Simulation::new(properties, solver);
    simulation.init(distribution.generate(&properties, n, -1.0, seed));
    Ok(simulation)
}

/// A minimal JSON projection of `Settings`, since `Settings` itself carries
/// no `Serialize` impl (it is parsed from, not round-tripped to, the
/// bespoke key=value format).
fn settings_as_json(settings: &Settings) -> serde_json::Value {
    serde_json::json!({
        "dt": settings.dt,
        "ncycles": settings.ncycles,
        "extent": settings.extent,
        "ncells": [settings.ncells.0, settings.ncells.1, settings.ncells.2],
        "use_case": format!("{:?}", settings.use_case),
        "species_count": settings.species.len(),
    })
}

fn run_simulation(settings: Option<&Settings>, mut simulation: Simulation, worker: Worker, show_progress: bool) -> Result<()> {
    let ncycles = settings.map(|s| s.ncycles).unwrap_or(BENCHMARK_CYCLES);
    let particles_output_cycle = settings.map(|s| s.particles_output_cycle).unwrap_or(0);
    let field_output_cycle = settings.map(|s| s.field_output_cycle).unwrap_or(0);

    let mut pb = ProgressBar::new(ncycles as u64);
    pb.format("┫██░┣");
    pb.show_bar = show_progress;
    pb.show_counter = show_progress;
    pb.show_percent = show_progress;
    pb.show_speed = show_progress;
    pb.show_time_left = show_progress;

    let start = Simulation::cycle(&simulation);
    let start_time = time::now();

    for _ in 0..ncycles {
        pb.inc();
        let cycle = simulation.do_cycle();

        let conserved = Some(ConservedQuantitiesEntry::from(simulation.conserved_quantities()));
        let particles = if particles_output_cycle > 0 && cycle % particles_output_cycle == 0 {
            info!("cycle {}: saving particles", cycle);
            Some(simulation.get_particles())
        } else {
            None
        };

        let entry = OutputEntry {
            conserved,
            particles,
            timestep: cycle,
        };
        if let Err(_) = worker.append(entry) {
            return worker.emergency_join();
        }

        if field_output_cycle > 0 && cycle % field_output_cycle == 0 {
            if let Err(_) = worker.append_density_frame(simulation.density_rows()) {
                return worker.emergency_join();
            }
        }
    }

    pb.finish_print(&format!("{} {} ", "DONE".green().bold(), ""));
    println!();

    let snapshot = simulation.get_snapshot();
    worker.write_snapshot(snapshot).chain_err(|| "error writing final snapshot")?;

    let output_filepath = worker.get_output_filepath().clone();
    worker.quit()?;

    println!("wrote diagnostics to '{}'", output_filepath.display());
    let duration = time::now() - start_time;
    println!(
        "cycles {}..{}: elapsed time {}",
        start,
        Simulation::cycle(&simulation),
        timedisplay::pretty_print_duration(duration)
    );

    Ok(())
}
