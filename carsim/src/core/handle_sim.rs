use crate::core::car::Car;
use crate::core::collision::CollisionPolicy;
use crate::core::track_map::ColorSource;
use crate::interfaces::controller::{Controller, SensorView};
use crate::interfaces::sim_interface::{SimState, OBSERVER_TICK_INTERVAL};
use crate::post::sim_result::SimResult;
use crate::pre::read_sim_pars::SimPars;
use crate::pre::spawn::spawn_car;
use flume::Sender;
use log::info;

/// handle_sim creates and simulates one run on the basis of the inserted
/// parameters, and returns the results for post-processing.
///
/// The loop ends when the finish line is crossed, the vehicle is removed or
/// the tick limit runs out. Each tick feeds the controller with the latest
/// sensor readings, applies its outputs and advances the car. When a sender
/// is inserted, throttled state updates go out to the observer, plus one
/// final message carrying the result; pacing to real time is left to the
/// consumer.
pub fn handle_sim<C, F>(
    sim_pars: &SimPars,
    map: &C,
    policy: CollisionPolicy,
    controller: &mut dyn Controller,
    tick_limit: u64,
    print_debug: bool,
    tx: Option<&Sender<SimState>>,
    mut per_tick: Option<F>,
) -> anyhow::Result<SimResult>
where
    C: ColorSource,
    F: FnMut(u64, &Car) -> anyhow::Result<()>,
{
    let mut car = spawn_car(sim_pars, policy);
    let mut tick = 0u64;
    let mut t_print = 0.0;

    while tick < tick_limit && car.is_alive() && !car.is_finished() {
        tick += 1;

        if car.state.control_enabled && car.state.radar_dist_cm.len() >= 3 {
            let view = SensorView {
                dist_cm: &car.state.radar_dist_cm,
                da_pairs: &car.state.da_pairs,
                position: car.state.position,
                heading_deg: car.state.heading_deg,
                speed: car.state.speed,
                power: car.state.power,
            };
            let output = controller.control(&view);
            if let Some(out) = output {
                car.apply_controls(out.throttle, out.servo);
            }
        }

        car.update(map);

        if let Some(cb) = per_tick.as_mut() {
            cb(tick, &car)?;
        }

        if print_debug && car.state.time > t_print + 0.9999 {
            println!(
                "INFO: Simulating... Current sim time is {:.3}s, distance is {:.0}px",
                car.state.time, car.state.distance
            );
            t_print = car.state.time;
        }

        if let Some(tx) = tx {
            if tick % OBSERVER_TICK_INTERVAL == 0 {
                let _ = tx.send(sim_state_of(tick, &car, None));
            }
        }
    }

    let result = SimResult {
        finished: car.is_finished(),
        removed: !car.is_alive(),
        lap_time: car.lap_time(),
        ticks: tick,
        sim_time: car.state.time,
        distance_px: car.state.distance,
        distance_cm: car.units.sim_to_real(car.state.distance),
        final_position: car.state.position,
        final_heading_deg: car.state.heading_deg,
    };

    info!(
        "run over after {} ticks: finished={} removed={}",
        tick, result.finished, result.removed
    );

    if let Some(tx) = tx {
        let _ = tx.send(sim_state_of(tick, &car, Some(result.clone())));
    }

    Ok(result)
}

fn sim_state_of(tick: u64, car: &Car, final_result: Option<SimResult>) -> SimState {
    SimState {
        tick,
        position: car.state.position,
        heading_deg: car.state.heading_deg,
        speed: car.state.speed,
        power: car.state.power,
        radar_dist_cm: car.state.radar_dist_cm.clone(),
        alive: car.is_alive(),
        finished: car.is_finished(),
        lap_time: car.lap_time(),
        final_result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track_map::{Rgba, FINISH_COLOR};

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

    struct FullThrottle;

    impl Controller for FullThrottle {
        fn control(&mut self, _view: &SensorView) -> Option<crate::interfaces::controller::ControlOutput> {
            Some(crate::interfaces::controller::ControlOutput {
                throttle: 60.0,
                servo: 0.0,
            })
        }
    }

    type NoHook = fn(u64, &Car) -> anyhow::Result<()>;

    #[test]
    fn run_ends_at_the_finish_line() {
        let pars = SimPars::default();
        let map = FinishAt { from_x: 600 };
        let result = handle_sim(
            &pars,
            &map,
            CollisionPolicy::Rebound,
            &mut FullThrottle,
            60000,
            false,
            None,
            None::<NoHook>,
        )
        .unwrap();
        assert!(result.finished);
        assert!(result.lap_time > 0.0);
        assert!(result.ticks < 60000);
    }

    #[test]
    fn tick_limit_bounds_the_run() {
        let pars = SimPars::default();
        let result = handle_sim(
            &pars,
            &OpenMap,
            CollisionPolicy::Rebound,
            &mut FullThrottle,
            100,
            false,
            None,
            None::<NoHook>,
        )
        .unwrap();
        assert!(!result.finished);
        assert_eq!(result.ticks, 100);
    }

    #[test]
    fn observer_receives_updates_and_the_final_result() {
        let pars = SimPars::default();
        let (tx, rx) = flume::unbounded();
        let result = handle_sim(
            &pars,
            &OpenMap,
            CollisionPolicy::Rebound,
            &mut FullThrottle,
            50,
            false,
            Some(&tx),
            None::<NoHook>,
        )
        .unwrap();
        drop(tx);

        let messages: Vec<SimState> = rx.iter().collect();
        assert!(messages.len() >= 2);
        let last = messages.last().unwrap();
        assert!(last.final_result.is_some());
        assert_eq!(
            last.final_result.as_ref().unwrap().ticks,
            result.ticks
        );
    }
}
