use crate::core::geometry::{Corners, FINISH_CORNER};
use crate::core::rebound::{rebound_action, ReboundPars};
use crate::core::track_map::ColorSource;
use log::debug;
use serde::Deserialize;

/// Attempts to free a stuck vehicle before giving up.
const MAX_CORRECTION_ATTEMPTS: usize = 6;
/// Push distance per correction attempt in px.
const CORRECTION_STEP_PX: f64 = 4.0;

/// What a border hit does to the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CollisionPolicy {
    /// Physical reflection with speed damping.
    Rebound,
    /// Vehicle stops and loses control.
    Stop,
    /// Vehicle is taken out of the simulation.
    Remove,
}

/// Result of checking all corners for one tick.
#[derive(Debug, Clone, Copy)]
pub struct CollisionOutcome {
    pub speed: f64,
    pub heading_deg: f64,
    pub alive: bool,
    pub finished: bool,
    pub lap_time: f64,
    pub disable_control: bool,
    pub pos_delta: (f64, f64),
}

/// collision_step samples the map color under every corner in geometry
/// order. The finish color only counts at the front-right corner and only
/// while `already_finished` is false, so the lap callback fires at most
/// once per run. The first corner on border color dispatches the policy and
/// ends the scan.
///
/// A rebound is followed by an iterative correction: as long as any corner
/// would still sit in the wall after the displacement, the displacement
/// grows along the collision-point-to-centroid direction, up to six steps
/// of four px.
pub fn collision_step<C: ColorSource>(
    map: &C,
    corners: &Corners,
    policy: CollisionPolicy,
    speed: f64,
    heading_deg: f64,
    time_now: f64,
    already_finished: bool,
    rebound_pars: &ReboundPars,
    mut on_lap_time: Option<&mut dyn FnMut(f64)>,
) -> CollisionOutcome {
    let border = map.border_color();
    let finish = map.finish_color();

    let mut out = CollisionOutcome {
        speed,
        heading_deg,
        alive: true,
        finished: already_finished,
        lap_time: 0.0,
        disable_control: false,
        pos_delta: (0.0, 0.0),
    };

    for (nr, pt) in corners.iter().enumerate() {
        let x = pt.0 as i64;
        let y = pt.1 as i64;
        let c = map.color_at(x, y);

        if nr == FINISH_CORNER && c == finish && !already_finished {
            out.finished = true;
            out.lap_time = time_now;
            if let Some(cb) = on_lap_time.as_mut() {
                cb(time_now);
            }
            debug!("finish line reached at t={:.2} s", time_now);
        }

        if c == border {
            debug!("border hit at corner #{} pos=({},{})", nr, x, y);
            match policy {
                CollisionPolicy::Rebound => {
                    let r = rebound_action(map, nr, *pt, out.heading_deg, out.speed, rebound_pars);
                    out.speed = r.speed;
                    out.heading_deg = r.heading_deg;

                    let (mut prop_dx, mut prop_dy) = r.displacement;
                    let cx = corners.iter().map(|p| p.0).sum::<f64>() / corners.len() as f64;
                    let cy = corners.iter().map(|p| p.1).sum::<f64>() / corners.len() as f64;

                    for _ in 0..MAX_CORRECTION_ATTEMPTS {
                        let still_collide = corners.iter().any(|cp| {
                            let tx = (cp.0 + prop_dx) as i64;
                            let ty = (cp.1 + prop_dy) as i64;
                            map.color_at(tx, ty) == border
                        });
                        if !still_collide {
                            break;
                        }
                        let vx = cx - pt.0;
                        let vy = cy - pt.1;
                        let nrm = vx.hypot(vy);
                        let nrm = if nrm == 0.0 { 1.0 } else { nrm };
                        prop_dx += vx / nrm * CORRECTION_STEP_PX;
                        prop_dy += vy / nrm * CORRECTION_STEP_PX;
                    }

                    out.pos_delta.0 += prop_dx;
                    out.pos_delta.1 += prop_dy;
                }
                CollisionPolicy::Stop => {
                    out.speed = 0.0;
                    out.disable_control = true;
                }
                CollisionPolicy::Remove => {
                    out.alive = false;
                }
            }
            break;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track_map::{Rgba, BORDER_COLOR, FINISH_COLOR};
    use approx::assert_relative_eq;

    /// Free everywhere except a configurable border half-plane and a finish
    /// stripe.
    struct StripeMap {
        border_from_x: i64,
        finish_from_x: i64,
    }

    impl ColorSource for StripeMap {
        fn color_at(&self, x: i64, _y: i64) -> Rgba {
            if x >= self.border_from_x {
                BORDER_COLOR
            } else if x >= self.finish_from_x {
                FINISH_COLOR
            } else {
                (0, 0, 0, 255)
            }
        }

        fn width(&self) -> u32 {
            1000
        }

        fn height(&self) -> u32 {
            1000
        }
    }

    fn corners_at(x: f64) -> Corners {
        // Front corners ahead of the rears on x, like a car heading right.
        [
            (x, 40.0),
            (x, 60.0),
            (x - 30.0, 60.0),
            (x - 30.0, 40.0),
        ]
    }

    #[test]
    fn free_track_changes_nothing() {
        let map = StripeMap {
            border_from_x: 900,
            finish_from_x: 800,
        };
        let out = collision_step(
            &map,
            &corners_at(100.0),
            CollisionPolicy::Rebound,
            5.0,
            0.0,
            1.0,
            false,
            &ReboundPars::default(),
            None,
        );
        assert_relative_eq!(out.speed, 5.0);
        assert!(out.alive && !out.finished && !out.disable_control);
        assert_eq!(out.pos_delta, (0.0, 0.0));
    }

    #[test]
    fn finish_fires_callback_once() {
        let map = StripeMap {
            border_from_x: 900,
            finish_from_x: 100,
        };
        let mut laps = Vec::new();
        let mut cb = |t: f64| laps.push(t);
        let out = collision_step(
            &map,
            &corners_at(150.0),
            CollisionPolicy::Rebound,
            5.0,
            0.0,
            12.5,
            false,
            &ReboundPars::default(),
            Some(&mut cb),
        );
        assert!(out.finished);
        assert_relative_eq!(out.lap_time, 12.5);

        // A second crossing with the latch set stays silent.
        let out2 = collision_step(
            &map,
            &corners_at(150.0),
            CollisionPolicy::Rebound,
            5.0,
            0.0,
            13.0,
            true,
            &ReboundPars::default(),
            Some(&mut cb),
        );
        assert!(out2.finished);
        assert_relative_eq!(out2.lap_time, 0.0);
        assert_eq!(laps, vec![12.5]);
    }

    #[test]
    fn finish_only_counts_at_the_front_right_corner() {
        let map = StripeMap {
            border_from_x: 900,
            finish_from_x: 100,
        };
        // Only the rear corners touch the stripe.
        let corners = [
            (50.0, 40.0),
            (50.0, 60.0),
            (150.0, 60.0),
            (150.0, 40.0),
        ];
        let out = collision_step(
            &map,
            &corners,
            CollisionPolicy::Rebound,
            5.0,
            0.0,
            1.0,
            false,
            &ReboundPars::default(),
            None,
        );
        assert!(!out.finished);
    }

    #[test]
    fn stop_policy_kills_speed_and_control() {
        let map = StripeMap {
            border_from_x: 100,
            finish_from_x: 50,
        };
        let out = collision_step(
            &map,
            &corners_at(150.0),
            CollisionPolicy::Stop,
            5.0,
            42.0,
            1.0,
            false,
            &ReboundPars::default(),
            None,
        );
        assert_relative_eq!(out.speed, 0.0);
        assert!(out.disable_control);
        assert!(out.alive);
        assert_relative_eq!(out.heading_deg, 42.0);
    }

    #[test]
    fn remove_policy_clears_alive() {
        let map = StripeMap {
            border_from_x: 100,
            finish_from_x: 50,
        };
        let out = collision_step(
            &map,
            &corners_at(150.0),
            CollisionPolicy::Remove,
            5.0,
            42.0,
            1.0,
            false,
            &ReboundPars::default(),
            None,
        );
        assert!(!out.alive);
    }

    #[test]
    fn rebound_correction_pushes_away_from_the_wall() {
        let map = StripeMap {
            border_from_x: 140,
            finish_from_x: 0,
        };
        let out = collision_step(
            &map,
            &corners_at(150.0),
            CollisionPolicy::Rebound,
            5.0,
            0.0,
            1.0,
            true,
            &ReboundPars::default(),
            None,
        );
        // The centroid sits left of the front corners, so the correction
        // points towards -x.
        assert!(out.pos_delta.0 < 0.0, "pos_delta={:?}", out.pos_delta);
    }
}
