use crate::post::sim_result::SimResult;

/// Observer updates are throttled to one message per this many ticks.
pub const OBSERVER_TICK_INTERVAL: u64 = 5;

/// SimState is the per-tick message streamed to an external observer
/// (GUI, logger, trainer) over a flume channel.
#[derive(Debug, Clone, Default)]
pub struct SimState {
    pub tick: u64,
    pub position: (f64, f64),
    pub heading_deg: f64,
    pub speed: f64,
    pub power: f64,
    pub radar_dist_cm: Vec<i64>,

    pub alive: bool,
    pub finished: bool,
    pub lap_time: f64,

    // final results payload (sent once when the run ends)
    pub final_result: Option<SimResult>,
}
