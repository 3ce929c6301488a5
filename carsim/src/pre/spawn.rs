use crate::core::car::{Car, CarDims, WindowDims};
use crate::core::collision::CollisionPolicy;
use crate::core::units::UnitConverter;
use crate::core::Point;
use crate::pre::read_sim_pars::SimPars;
use helpers::general::normalize_deg;

/// spawn_heading returns the initial heading: pointing from the spawn center
/// at the finish-line centroid when one is known, otherwise the configured
/// fallback angle. The atan2 result is converted out of screen convention.
pub fn spawn_heading(center: Point, finish_centroid: Option<Point>, fallback_deg: f64) -> f64 {
    match finish_centroid {
        Some(fc) => {
            let a = (fc.1 - center.1).atan2(fc.0 - center.0).to_degrees();
            normalize_deg(360.0 - a)
        }
        None => normalize_deg(fallback_deg),
    }
}

/// spawn_car builds a car from the parameter file: the configured center
/// position is converted to the top-left sprite position, the heading points
/// at the finish line and the initial power comes from the car parameters.
pub fn spawn_car(sim_pars: &SimPars, policy: CollisionPolicy) -> Car {
    let window = WindowDims::from_pars(&sim_pars.window_pars);
    let units = UnitConverter::new(window.width_px);
    let dims = CarDims::from_pars(&sim_pars.car_pars, &units);

    let spawn = &sim_pars.spawn_pars;
    let center = (spawn.center_x_px, spawn.center_y_px);
    let half = dims.cover_px / 2.0;
    let position = (center.0 - half, center.1 - half);

    let heading = spawn_heading(center, spawn.finish_centroid_px, spawn.angle_deg);

    Car::new(
        position,
        heading,
        sim_pars.car_pars.initial_power,
        &sim_pars.car_pars,
        &sim_pars.window_pars,
        policy,
        sim_pars.rebound_pars,
        sim_pars.sensor_pars,
    )
}
