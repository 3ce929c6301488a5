use crate::core::actuation::{clip_steer, servo_to_angle, PowerSequencer};
use crate::core::collision::{collision_step, CollisionPolicy};
use crate::core::dynamics::{step_speed, target_speed, DT_SECONDS};
use crate::core::geometry::{compute_corners, compute_wheels, Corners};
use crate::core::motion::step_motion;
use crate::core::rebound::ReboundPars;
use crate::core::sensors::{collect_radars, distances, linearize_da, max_radar_len, Radar, SensorPars};
use crate::core::track_map::ColorSource;
use crate::core::units::UnitConverter;
use crate::core::Point;
use log::{info, warn};
use serde::Deserialize;

/// Sprite wheels sit this much inside the corner radius.
const WHEEL_INSET_PX: f64 = 6.0;

/// Physical vehicle parameters in real-world cm.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CarPars {
    pub length_cm: f64,
    pub width_cm: f64,
    pub wheelbase_cm: f64,
    pub track_width_cm: f64,
    pub max_power: f64,
    pub initial_power: f64,
}

impl Default for CarPars {
    fn default() -> CarPars {
        CarPars {
            length_cm: 40.0,
            width_cm: 20.0,
            wheelbase_cm: 25.0,
            track_width_cm: 10.0,
            max_power: 100.0,
            initial_power: 20.0,
        }
    }
}

/// Window parameters: a base resolution scaled by a single factor.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WindowPars {
    pub base_width_px: f64,
    pub base_height_px: f64,
    pub scale: f64,
}

impl Default for WindowPars {
    fn default() -> WindowPars {
        WindowPars {
            base_width_px: 1920.0,
            base_height_px: 1080.0,
            scale: 0.8,
        }
    }
}

/// Derived window dimensions in px.
#[derive(Debug, Clone, Copy)]
pub struct WindowDims {
    pub width_px: f64,
    pub height_px: f64,
    pub margin_px: f64,
}

impl WindowDims {
    pub fn from_pars(pars: &WindowPars) -> WindowDims {
        WindowDims {
            width_px: (pars.base_width_px * pars.scale).trunc(),
            height_px: (pars.base_height_px * pars.scale).trunc(),
            margin_px: 10.0 * pars.scale,
        }
    }
}

/// Vehicle dimensions converted to raster px.
#[derive(Debug, Clone, Copy)]
pub struct CarDims {
    pub size_x_px: f64,
    pub size_y_px: f64,
    pub cover_px: f64,
    pub wheelbase_px: f64,
    pub track_width_px: f64,
}

impl CarDims {
    pub fn from_pars(pars: &CarPars, units: &UnitConverter) -> CarDims {
        let size_x = units.real_to_sim(pars.length_cm);
        let size_y = units.real_to_sim(pars.width_cm);
        CarDims {
            size_x_px: size_x,
            size_y_px: size_y,
            cover_px: size_x.max(size_y).trunc(),
            wheelbase_px: units.real_to_sim(pars.wheelbase_cm),
            track_width_px: units.real_to_sim(pars.track_width_cm),
        }
    }
}

/// Plain vehicle state, mutated by the motion/collision/sensor modules.
#[derive(Debug, Clone, Default)]
pub struct CarState {
    /// Top-left sprite position in px.
    pub position: Point,
    /// Sprite center in px; collision and sensor origin.
    pub center: Point,
    pub heading_deg: f64,
    /// Front wheel angle in degrees.
    pub steer_deg: f64,
    /// Speed in px/tick.
    pub speed: f64,
    /// Reference speed for the current power.
    pub speed_set: f64,
    pub power: f64,
    pub time: f64,
    pub distance: f64,

    pub corners: Corners,
    pub left_wheel: Point,
    pub right_wheel: Point,

    pub alive: bool,
    pub finished: bool,
    pub control_enabled: bool,
    pub lap_time: f64,

    pub radars: Vec<Radar>,
    pub radar_dist_cm: Vec<i64>,
    pub da_pairs: Vec<(i64, f64)>,
}

/// Car bundles the state with its configuration and runs the per-tick
/// pipeline: motion, geometry, collision, sensors.
pub struct Car {
    pub state: CarState,
    pub units: UnitConverter,
    pub dims: CarDims,
    pub window: WindowDims,
    pub policy: CollisionPolicy,
    pub rebound_pars: ReboundPars,
    pub sensor_pars: SensorPars,
    sequencer: PowerSequencer,
    lap_callback: Option<Box<dyn FnMut(f64)>>,
}

impl Car {
    /// Builds a car at the given top-left position with the given heading
    /// and initial power.
    pub fn new(
        position: Point,
        heading_deg: f64,
        power: f64,
        car_pars: &CarPars,
        window_pars: &WindowPars,
        policy: CollisionPolicy,
        rebound_pars: ReboundPars,
        sensor_pars: SensorPars,
    ) -> Car {
        let window = WindowDims::from_pars(window_pars);
        let units = UnitConverter::new(window.width_px);
        let dims = CarDims::from_pars(car_pars, &units);

        let mut state = CarState::default();
        state.position = position;
        state.center = (
            position.0.trunc() + dims.cover_px / 2.0,
            position.1.trunc() + dims.cover_px / 2.0,
        );
        state.heading_deg = heading_deg;
        state.power = power;
        state.speed_set = target_speed(&units, power);
        state.alive = true;
        state.control_enabled = true;

        info!(
            "car spawned at ({:.1},{:.1}) heading {:.1} power {:.0}",
            position.0, position.1, heading_deg, power
        );

        Car {
            state,
            units,
            dims,
            window,
            policy,
            rebound_pars,
            sensor_pars,
            sequencer: PowerSequencer::new(car_pars.max_power),
            lap_callback: None,
        }
    }

    /// Registers a callback invoked with the lap time when the finish line
    /// is crossed for the first time. Later crossings stay silent.
    pub fn set_lap_callback<F: FnMut(f64) + 'static>(&mut self, callback: F) {
        self.lap_callback = Some(Box::new(callback));
    }

    /// update runs one simulation tick against the track map: pending power
    /// sequence, motion, corner geometry, collision and the radar fan.
    pub fn update<C: ColorSource>(&mut self, map: &C) {
        let state = &mut self.state;
        let units = self.units;

        if self.sequencer.pending() {
            let speed = &mut state.speed;
            let steer = state.steer_deg;
            state.power = self.sequencer.tick(state.power, &mut |pwr| {
                *speed = step_speed(&units, *speed, pwr, steer, DT_SECONDS);
            });
            state.speed_set = target_speed(&units, state.power);
        }

        step_motion(state, &self.dims, &self.window, DT_SECONDS);

        let half_len = 0.5 * self.dims.size_x_px;
        let half_wid = 0.5 * self.dims.size_y_px;
        state.corners = compute_corners(state.center, state.heading_deg, half_len, half_wid);
        let wheel_radius = half_len.hypot(half_wid) - WHEEL_INSET_PX;
        let (right, left) = compute_wheels(state.center, state.heading_deg, wheel_radius);
        state.right_wheel = right;
        state.left_wheel = left;

        let out = collision_step(
            map,
            &state.corners,
            self.policy,
            state.speed,
            state.heading_deg,
            state.time,
            state.finished,
            &self.rebound_pars,
            self.lap_callback.as_deref_mut().map(|f| f as _),
        );
        state.speed = out.speed;
        state.heading_deg = out.heading_deg;
        state.alive = state.alive && out.alive;
        if out.finished && !state.finished {
            state.finished = true;
            state.lap_time = out.lap_time;
        }
        state.position.0 += out.pos_delta.0;
        state.position.1 += out.pos_delta.1;
        if out.disable_control && state.control_enabled {
            state.control_enabled = false;
            warn!("control disabled after border stop");
        }

        let max_len = max_radar_len(self.window.width_px);
        state.radars = collect_radars(
            map,
            state.center,
            state.heading_deg,
            &self.sensor_pars,
            max_len,
        );
        state.radar_dist_cm = distances(&units, &state.radars);
        state.da_pairs = state
            .radar_dist_cm
            .iter()
            .map(|&d| linearize_da(d))
            .collect();
    }

    /// apply_controls maps raw controller outputs (throttle, servo) onto
    /// steering angle, power and speed. Steering inverts the servo curve
    /// sign so positive servo values steer right in screen space. Ignored
    /// while control is disabled.
    pub fn apply_controls(&mut self, throttle: f64, servo: f64) {
        if !self.state.control_enabled || !self.state.alive {
            return;
        }

        self.state.steer_deg = -servo_to_angle(clip_steer(servo));

        let state = &mut self.state;
        let units = self.units;
        let speed = &mut state.speed;
        let steer = state.steer_deg;
        state.power = self.sequencer.apply_power(throttle, state.power, &mut |pwr| {
            *speed = step_speed(&units, *speed, pwr, steer, DT_SECONDS);
        });
        state.speed_set = target_speed(&units, state.power);
    }

    pub fn is_alive(&self) -> bool {
        self.state.alive
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished
    }

    pub fn lap_time(&self) -> f64 {
        self.state.lap_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track_map::{Rgba, BORDER_COLOR, FINISH_COLOR};
    use approx::assert_relative_eq;

    struct OpenMap;

    impl ColorSource for OpenMap {
        fn color_at(&self, _x: i64, _y: i64) -> Rgba {
            (0, 0, 0, 255)
        }

        fn width(&self) -> u32 {
            1536
        }

        fn height(&self) -> u32 {
            864
        }
    }

    struct FinishAt {
        from_x: i64,
    }

    impl ColorSource for FinishAt {
        fn color_at(&self, x: i64, _y: i64) -> Rgba {
            if x >= self.from_x {
                FINISH_COLOR
            } else {
                (0, 0, 0, 255)
            }
        }

        fn width(&self) -> u32 {
            1536
        }

        fn height(&self) -> u32 {
            864
        }
    }

    struct WallAt {
        from_x: i64,
    }

    impl ColorSource for WallAt {
        fn color_at(&self, x: i64, _y: i64) -> Rgba {
            if x >= self.from_x {
                BORDER_COLOR
            } else {
                (0, 0, 0, 255)
            }
        }

        fn width(&self) -> u32 {
            1536
        }

        fn height(&self) -> u32 {
            864
        }
    }

    fn test_car(policy: CollisionPolicy) -> Car {
        Car::new(
            (100.0, 400.0),
            0.0,
            20.0,
            &CarPars::default(),
            &WindowPars::default(),
            policy,
            ReboundPars::default(),
            SensorPars::default(),
        )
    }

    #[test]
    fn tick_advances_time_and_sensors() {
        let mut car = test_car(CollisionPolicy::Rebound);
        car.update(&OpenMap);
        assert_relative_eq!(car.state.time, 0.01);
        assert_eq!(car.state.radars.len(), 3);
        assert_eq!(car.state.da_pairs.len(), 3);
        assert!(car.is_alive());
    }

    #[test]
    fn controls_set_steer_and_power() {
        let mut car = test_car(CollisionPolicy::Rebound);
        car.apply_controls(40.0, 5.0);
        assert_relative_eq!(car.state.power, 40.0);
        assert_relative_eq!(car.state.steer_deg, -servo_to_angle(5.0));
        assert!(car.state.speed_set > 0.0);
    }

    #[test]
    fn deadzone_throttle_stops_power() {
        let mut car = test_car(CollisionPolicy::Rebound);
        car.apply_controls(40.0, 0.0);
        car.apply_controls(5.0, 0.0);
        assert_relative_eq!(car.state.power, 0.0);
    }

    #[test]
    fn finish_latches_once() {
        let map = FinishAt { from_x: 120 };
        let mut car = test_car(CollisionPolicy::Rebound);
        car.update(&map);
        assert!(car.is_finished());
        let first_lap = car.lap_time();
        assert!(first_lap > 0.0);

        car.update(&map);
        assert_relative_eq!(car.lap_time(), first_lap);
    }

    #[test]
    fn lap_callback_fires_exactly_once() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let map = FinishAt { from_x: 120 };
        let mut car = test_car(CollisionPolicy::Rebound);
        let laps = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&laps);
        car.set_lap_callback(move |t| sink.borrow_mut().push(t));

        car.update(&map);
        car.update(&map);

        assert_eq!(laps.borrow().len(), 1);
        assert!(laps.borrow()[0] > 0.0);
        assert_relative_eq!(laps.borrow()[0], car.lap_time());
    }

    #[test]
    fn stop_policy_disables_control() {
        let map = WallAt { from_x: 120 };
        let mut car = test_car(CollisionPolicy::Stop);
        car.update(&map);
        assert!(!car.state.control_enabled);
        assert_relative_eq!(car.state.speed, 0.0);

        // Further control inputs are ignored.
        car.apply_controls(60.0, 3.0);
        assert_relative_eq!(car.state.power, 20.0);
    }

    #[test]
    fn remove_policy_kills_the_car() {
        let map = WallAt { from_x: 120 };
        let mut car = test_car(CollisionPolicy::Remove);
        car.update(&map);
        assert!(!car.is_alive());
    }

    #[test]
    fn reverse_sequence_advances_across_ticks() {
        let mut car = test_car(CollisionPolicy::Rebound);
        car.apply_controls(40.0, 0.0);
        car.apply_controls(-40.0, 0.0);
        assert_relative_eq!(car.state.power, -30.0);
        car.update(&OpenMap);
        assert_relative_eq!(car.state.power, 0.0);
        car.update(&OpenMap);
        assert_relative_eq!(car.state.power, -40.0);
    }
}
