use carsim::core::collision::CollisionPolicy;
use carsim::core::handle_sim::handle_sim;
use carsim::core::track_map::TrackMap;
use carsim::post::snapshot::Snapshot;
use carsim::post::telemetry::TelemetryWriter;
use carsim::pre::read_sim_pars::{read_sim_pars, SimPars};
use carsim::pre::sim_opts::SimOpts;
use clap::Parser;
use log::Level;
use rayon::prelude::*;
use std::time::Instant;

fn parse_collision_mode(mode: &str) -> anyhow::Result<CollisionPolicy> {
    match mode.to_ascii_lowercase().as_str() {
        "rebound" => Ok(CollisionPolicy::Rebound),
        "stop" => Ok(CollisionPolicy::Stop),
        "remove" => Ok(CollisionPolicy::Remove),
        _ => anyhow::bail!(
            "Unknown collision mode {}! Use rebound, stop or remove.",
            mode
        ),
    }
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    simple_logger::init_with_level(if sim_opts.debug {
        Level::Debug
    } else {
        Level::Info
    })?;

    // get simulation parameters
    let sim_pars = if let Some(parfile_path) = &sim_opts.parfile_path {
        println!("INFO: Reading simulation parameters from {:?}", parfile_path);
        read_sim_pars(parfile_path)?
    } else {
        println!("INFO: No parameter file provided, using built-in defaults");
        SimPars::default()
    };

    let policy = parse_collision_mode(&sim_opts.collision_mode)?;

    println!("INFO: Loading track map from {:?}", sim_opts.map_path);
    let map = TrackMap::from_png(&sim_opts.map_path)?;

    println!(
        "INFO: Simulating {} run(s) with up to {} ticks, collision mode {:?}",
        sim_opts.no_sim_runs, sim_opts.tick_limit, policy
    );

    // EXECUTION -----------------------------------------------------------------------------------
    let t_start = Instant::now();

    if sim_opts.no_sim_runs <= 1 {
        let mut controller = sim_pars.controller_pars.build();

        let mut telemetry = match &sim_opts.telemetry_path {
            Some(path) => Some(TelemetryWriter::create(path)?),
            None => None,
        };
        let mut last_snapshot: Option<Snapshot> = None;
        let f_scale = sim_pars.window_pars.scale;
        let snapshot_wanted = sim_opts.snapshot_path.is_some();

        let result = handle_sim(
            &sim_pars,
            &map,
            policy,
            controller.as_mut(),
            sim_opts.tick_limit,
            sim_opts.debug,
            None,
            Some(|tick: u64, car: &carsim::core::car::Car| {
                if let Some(writer) = telemetry.as_mut() {
                    writer.record(tick, &car.state)?;
                }
                if snapshot_wanted {
                    last_snapshot = Some(Snapshot::from_state(&car.state, f_scale));
                }
                Ok(())
            }),
        )?;

        if let Some(writer) = telemetry.as_mut() {
            writer.flush()?;
        }
        if let (Some(path), Some(snapshot)) = (&sim_opts.snapshot_path, &last_snapshot) {
            snapshot.write_to_file(path)?;
            println!("INFO: Snapshot written to {:?}", path);
        }

        println!("INFO: Execution time: {}ms", t_start.elapsed().as_millis());
        result.print_summary();
        let out_path = result.write_summary_to_file(None)?;
        println!("INFO: Summary written to {}", out_path);
    } else {
        // independent runs share the read-only map and run in parallel
        type NoHook = fn(u64, &carsim::core::car::Car) -> anyhow::Result<()>;
        let results: Vec<anyhow::Result<_>> = (0..sim_opts.no_sim_runs)
            .into_par_iter()
            .map(|_| {
                let mut controller = sim_pars.controller_pars.build();
                handle_sim(
                    &sim_pars,
                    &map,
                    policy,
                    controller.as_mut(),
                    sim_opts.tick_limit,
                    false,
                    None,
                    None::<NoHook>,
                )
            })
            .collect();

        println!("INFO: Execution time: {}ms", t_start.elapsed().as_millis());
        let mut finished_runs = 0u32;
        let mut best_lap = f64::INFINITY;
        for result in results {
            let result = result?;
            if result.finished {
                finished_runs += 1;
                if result.lap_time < best_lap {
                    best_lap = result.lap_time;
                }
            }
        }
        println!(
            "RESULT: {}/{} runs reached the finish line",
            finished_runs, sim_opts.no_sim_runs
        );
        if finished_runs > 0 {
            println!("RESULT: best lap time {:.2}s", best_lap);
        }
    }

    Ok(())
}
