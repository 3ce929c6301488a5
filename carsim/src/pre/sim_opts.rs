use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "carsim",
    about = "A tick-based vehicle simulator on raster track maps"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug printing
    #[clap(short, long)]
    pub debug: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set path to the track map PNG
    #[clap(short, long)]
    pub map_path: PathBuf,

    /// Set path to the simulation parameter file (OPTIONAL: defaults are used if not set)
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set the maximum number of simulation ticks per run
    #[clap(short, long, default_value = "60000")]
    pub tick_limit: u64,

    /// Set number of simulation runs
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set the border collision behavior (rebound, stop, remove)
    #[clap(short, long, default_value = "rebound")]
    pub collision_mode: String,

    /// Set path for the per-tick telemetry CSV (OPTIONAL)
    #[clap(long)]
    pub telemetry_path: Option<PathBuf>,

    /// Set path for the final state snapshot JSON (OPTIONAL)
    #[clap(long)]
    pub snapshot_path: Option<PathBuf>,
}
