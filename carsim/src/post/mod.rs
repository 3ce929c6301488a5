pub mod sim_result;
pub mod snapshot;
pub mod telemetry;
