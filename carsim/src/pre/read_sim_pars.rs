use crate::core::car::{CarPars, WindowPars};
use crate::core::rebound::ReboundPars;
use crate::core::sensors::SensorPars;
use crate::interfaces::controller::ControllerPars;
use anyhow::Context;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::Path;

/// Spawn configuration: center position in px, a fallback heading and an
/// optional finish-line centroid the initial heading points at.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SpawnPars {
    pub center_x_px: f64,
    pub center_y_px: f64,
    pub angle_deg: f64,
    pub finish_centroid_px: Option<(f64, f64)>,
}

impl Default for SpawnPars {
    fn default() -> SpawnPars {
        SpawnPars {
            center_x_px: 200.0,
            center_y_px: 200.0,
            angle_deg: 0.0,
            finish_centroid_px: None,
        }
    }
}

/// SimPars is used to store all other parameter structs. Every section is
/// optional in the JSON file and falls back to the built-in defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SimPars {
    pub window_pars: WindowPars,
    pub car_pars: CarPars,
    pub rebound_pars: ReboundPars,
    pub sensor_pars: SensorPars,
    pub controller_pars: ControllerPars,
    pub spawn_pars: SpawnPars,
}

/// read_sim_pars reads the JSON file and decodes the JSON string into the
/// simulation parameters struct.
pub fn read_sim_pars(filepath: &Path) -> anyhow::Result<SimPars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open parameter file {}!",
            filepath.display()
        ))?;
    let pars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse parameter file {}!",
        filepath.display()
    ))?;
    Ok(pars)
}
