use crate::core::car::CarState;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// Snapshot is a restorable record of the vehicle state. Positions are
/// stored de-scaled by the window factor so a snapshot is valid across
/// window sizes. The raw actuation fields are optional; old snapshots
/// without them still load.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Snapshot {
    pub position: [f64; 2],
    pub heading_deg: f64,
    pub speed: f64,
    pub speed_set: f64,
    pub radars: Vec<([i64; 2], i64)>,
    pub da_pairs: Vec<(i64, f64)>,
    pub distance: f64,
    pub time: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steer_deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servo: Option<f64>,
}

impl Snapshot {
    /// Captures the current state; `f_scale` is the window scale factor the
    /// position is divided by.
    pub fn from_state(state: &CarState, f_scale: f64) -> Snapshot {
        let f = if f_scale != 0.0 { f_scale } else { 1.0 };
        Snapshot {
            position: [state.position.0 / f, state.position.1 / f],
            heading_deg: state.heading_deg,
            speed: state.speed,
            speed_set: state.speed_set,
            radars: state
                .radars
                .iter()
                .map(|r| ([r.endpoint.0, r.endpoint.1], r.dist_px))
                .collect(),
            da_pairs: state.da_pairs.clone(),
            distance: state.distance,
            time: state.time,
            power: Some(state.power),
            steer_deg: Some(state.steer_deg),
            throttle: None,
            servo: None,
        }
    }

    /// Restores the captured fields onto a state, re-scaling the position.
    pub fn apply_to(&self, state: &mut CarState, f_scale: f64) {
        let f = if f_scale != 0.0 { f_scale } else { 1.0 };
        state.position = (self.position[0] * f, self.position[1] * f);
        state.heading_deg = self.heading_deg;
        state.speed = self.speed;
        state.speed_set = self.speed_set;
        state.distance = self.distance;
        state.time = self.time;
        if let Some(power) = self.power {
            state.power = power;
        }
        if let Some(steer) = self.steer_deg {
            state.steer_deg = steer;
        }
    }

    /// write_to_file stores the snapshot as JSON.
    pub fn write_to_file(&self, filepath: &Path) -> anyhow::Result<()> {
        let fh = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(filepath)
            .context(format!(
                "Failed to open snapshot file {}!",
                filepath.display()
            ))?;
        serde_json::to_writer_pretty(&fh, self).context(format!(
            "Failed to write snapshot file {}!",
            filepath.display()
        ))?;
        Ok(())
    }

    /// read_from_file loads a snapshot written by `write_to_file`.
    pub fn read_from_file(filepath: &Path) -> anyhow::Result<Snapshot> {
        let fh = OpenOptions::new().read(true).open(filepath).context(format!(
            "Failed to open snapshot file {}!",
            filepath.display()
        ))?;
        let snapshot = serde_json::from_reader(&fh).context(format!(
            "Failed to parse snapshot file {}!",
            filepath.display()
        ))?;
        Ok(snapshot)
    }
}
