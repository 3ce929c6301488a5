use crate::core::car::CarState;
use anyhow::Context;
use std::fs::File;
use std::path::Path;

/// TelemetryWriter appends one CSV row per tick: timing, pose, actuation and
/// the radar distances.
pub struct TelemetryWriter {
    writer: csv::Writer<File>,
}

impl TelemetryWriter {
    pub fn create(filepath: &Path) -> anyhow::Result<TelemetryWriter> {
        let mut writer = csv::Writer::from_path(filepath).context(format!(
            "Failed to create telemetry file {}!",
            filepath.display()
        ))?;
        writer.write_record(&[
            "tick", "time_s", "x_px", "y_px", "heading_deg", "speed_px", "power", "steer_deg",
            "dist_left_cm", "dist_front_cm", "dist_right_cm",
        ])?;
        Ok(TelemetryWriter { writer })
    }

    pub fn record(&mut self, tick: u64, state: &CarState) -> anyhow::Result<()> {
        let dist = |i: usize| {
            state
                .radar_dist_cm
                .get(i)
                .map(|d| d.to_string())
                .unwrap_or_default()
        };
        self.writer.write_record(&[
            tick.to_string(),
            format!("{:.3}", state.time),
            format!("{:.2}", state.position.0),
            format!("{:.2}", state.position.1),
            format!("{:.3}", state.heading_deg),
            format!("{:.4}", state.speed),
            format!("{:.1}", state.power),
            format!("{:.3}", state.steer_deg),
            dist(0),
            dist(1),
            dist(2),
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.writer.flush().context("Failed to flush telemetry file!")?;
        Ok(())
    }
}
