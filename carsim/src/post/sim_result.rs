use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::io::Write as IoWrite;

/// SimResult contains all run information that is required for
/// post-processing the results.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SimResult {
    pub finished: bool,
    pub removed: bool,
    pub lap_time: f64,
    pub ticks: u64,
    pub sim_time: f64,
    pub distance_px: f64,
    pub distance_cm: f64,
    pub final_position: (f64, f64),
    pub final_heading_deg: f64,
}

impl SimResult {
    /// print_summary prints the run outcome to the console output.
    pub fn print_summary(&self) {
        println!("RESULT: {}", self.outcome_line());
        println!(
            "RESULT: {} ticks, {:.2}s simulated, {:.1} cm driven",
            self.ticks, self.sim_time, self.distance_cm
        );
        println!(
            "RESULT: final position ({:.1}, {:.1}) heading {:.1}",
            self.final_position.0, self.final_position.1, self.final_heading_deg
        );
    }

    fn outcome_line(&self) -> String {
        if self.finished {
            format!("finish line reached after {:.2}s", self.lap_time)
        } else if self.removed {
            String::from("vehicle removed after border contact")
        } else {
            String::from("tick limit reached before the finish line")
        }
    }

    /// write_summary_to_file writes the run outcome to a text file in
    /// output/. Returns the path to the written file.
    pub fn write_summary_to_file(
        &self,
        path: Option<&std::path::Path>,
    ) -> anyhow::Result<String> {
        let mut content = String::new();
        writeln!(&mut content, "RESULT: {}", self.outcome_line())?;
        writeln!(
            &mut content,
            "RESULT: {} ticks, {:.2}s simulated, {:.1} cm driven",
            self.ticks, self.sim_time, self.distance_cm
        )?;
        writeln!(
            &mut content,
            "RESULT: final position ({:.1}, {:.1}) heading {:.1}",
            self.final_position.0, self.final_position.1, self.final_heading_deg
        )?;

        let out_dir = std::path::Path::new("output");
        std::fs::create_dir_all(out_dir)?;
        let out_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            out_dir.join("last_run.txt")
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&out_path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(out_path.to_string_lossy().into_owned())
    }
}
