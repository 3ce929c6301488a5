pub mod actuation;
pub mod car;
pub mod collision;
pub mod dynamics;
pub mod geometry;
pub mod handle_sim;
pub mod kinematics;
pub mod motion;
pub mod rebound;
pub mod sensors;
pub mod track_map;
pub mod units;

/// A 2D point in raster pixels.
pub type Point = (f64, f64);
