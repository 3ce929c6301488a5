use crate::core::Point;
use log::debug;
use serde::Deserialize;

/// Distance below which the lateral controller starts reacting, in cm.
const STEER_REACT_DIST_CM: f64 = 130.0;

/// Read-only sensor view handed to a controller each tick.
#[derive(Debug, Clone, Copy)]
pub struct SensorView<'a> {
    /// Radar distances in cm, fan order left/front/right.
    pub dist_cm: &'a [i64],
    /// Raw (digital, analog) sensor pairs matching `dist_cm`.
    pub da_pairs: &'a [(i64, f64)],
    pub position: Point,
    pub heading_deg: f64,
    pub speed: f64,
    pub power: f64,
}

/// Raw actuation request: throttle and servo values before the actuation
/// mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    pub throttle: f64,
    pub servo: f64,
}

/// A controller turns sensor readings into actuation requests. Returning
/// `None` leaves the previous actuation untouched for this tick.
pub trait Controller {
    fn control(&mut self, view: &SensorView) -> Option<ControlOutput>;
}

/// Gains of the proportional controller.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ControllerGains {
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub kp1: f64,
    pub kp2: f64,
}

impl Default for ControllerGains {
    fn default() -> ControllerGains {
        ControllerGains {
            k1: 1.1,
            k2: 1.1,
            k3: 1.1,
            kp1: 1.1,
            kp2: 1.1,
        }
    }
}

/// Proportional rule controller: steers away from the closer side wall and
/// regulates throttle in three bands on the front distance. Throttle and
/// servo values persist between ticks, so the longitudinal branches ramp
/// instead of jumping.
pub struct RuleBasedController {
    gains: ControllerGains,
    throttle: f64,
    servo: f64,
}

impl RuleBasedController {
    pub fn new(gains: ControllerGains) -> RuleBasedController {
        RuleBasedController {
            gains,
            throttle: 0.0,
            servo: 0.0,
        }
    }
}

impl Controller for RuleBasedController {
    fn control(&mut self, view: &SensorView) -> Option<ControlOutput> {
        if view.dist_cm.len() < 3 {
            debug!("controller skipped: {} radar distances", view.dist_cm.len());
            return None;
        }
        let d0 = view.dist_cm[0] as f64;
        let d1 = view.dist_cm[1] as f64;
        let d2 = view.dist_cm[2] as f64;
        let g = &self.gains;

        if d0 < STEER_REACT_DIST_CM || d2 < STEER_REACT_DIST_CM {
            self.servo = -((d2 - d0) * g.kp2);
        }

        if d1 > 100.0 {
            if view.power < 60.0 {
                self.throttle += (d1 * g.k1 - d1) * g.kp1 + 18.0;
                self.throttle = self.throttle.min(60.0);
            }
        } else if d1 > 50.0 {
            if view.power > 18.0 {
                self.throttle -= (d1 * g.k2 - d1) * g.kp1;
                self.throttle = self.throttle.max(18.0);
            }
        } else if d1 < 50.0 {
            // Close to a wall: back off and steer towards the open side.
            // At exactly 50 cm neither branch fires and the previous
            // commands hold.
            self.throttle = -(d1 * g.k3 - d1) * g.kp1 - 18.0;
            self.servo = -(d0 - d2) * g.kp2 - 10.0;
        }

        debug!(
            "controller: dist=({:.0},{:.0},{:.0}) throttle={:.2} servo={:.2}",
            d0, d1, d2, self.throttle, self.servo
        );

        Some(ControlOutput {
            throttle: self.throttle,
            servo: self.servo,
        })
    }
}

/// Weights of a fixed linear policy over the three radar distances.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LinearPolicyPars {
    pub throttle_weights: [f64; 3],
    pub throttle_bias: f64,
    pub servo_weights: [f64; 3],
    pub servo_bias: f64,
}

impl Default for LinearPolicyPars {
    fn default() -> LinearPolicyPars {
        LinearPolicyPars {
            throttle_weights: [0.0, 0.35, 0.0],
            throttle_bias: 0.0,
            servo_weights: [-0.08, 0.0, 0.08],
            servo_bias: 0.0,
        }
    }
}

/// A learned policy with fixed weights, loaded from configuration.
pub struct LearnedController {
    pars: LinearPolicyPars,
}

impl LearnedController {
    pub fn new(pars: LinearPolicyPars) -> LearnedController {
        LearnedController { pars }
    }
}

impl Controller for LearnedController {
    fn control(&mut self, view: &SensorView) -> Option<ControlOutput> {
        if view.dist_cm.len() < 3 {
            return None;
        }
        let p = &self.pars;
        let mut throttle = p.throttle_bias;
        let mut servo = p.servo_bias;
        for i in 0..3 {
            let d = view.dist_cm[i] as f64;
            throttle += p.throttle_weights[i] * d;
            servo += p.servo_weights[i] * d;
        }
        Some(ControlOutput { throttle, servo })
    }
}

/// Controller selection, decided by configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub enum ControllerPars {
    RuleBased(ControllerGains),
    Learned(LinearPolicyPars),
}

impl Default for ControllerPars {
    fn default() -> ControllerPars {
        ControllerPars::RuleBased(ControllerGains::default())
    }
}

impl ControllerPars {
    pub fn build(&self) -> Box<dyn Controller> {
        match *self {
            ControllerPars::RuleBased(gains) => Box::new(RuleBasedController::new(gains)),
            ControllerPars::Learned(pars) => Box::new(LearnedController::new(pars)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn view<'a>(dist: &'a [i64], da: &'a [(i64, f64)], power: f64) -> SensorView<'a> {
        SensorView {
            dist_cm: dist,
            da_pairs: da,
            position: (0.0, 0.0),
            heading_deg: 0.0,
            speed: 0.0,
            power,
        }
    }

    #[test]
    fn skips_without_enough_rays() {
        let mut ctrl = RuleBasedController::new(ControllerGains::default());
        let dist = [100i64, 100];
        assert!(ctrl.control(&view(&dist, &[], 20.0)).is_none());
    }

    #[test]
    fn steers_away_from_the_closer_wall() {
        let mut ctrl = RuleBasedController::new(ControllerGains::default());
        // Left ray much shorter than right: servo goes negative with the
        // sign convention servo = -(d2 - d0) * kp2.
        let dist = [40i64, 120, 120];
        let out = ctrl.control(&view(&dist, &[], 20.0)).unwrap();
        assert!(out.servo < 0.0);

        let mut ctrl = RuleBasedController::new(ControllerGains::default());
        let dist = [120i64, 120, 40];
        let out = ctrl.control(&view(&dist, &[], 20.0)).unwrap();
        assert!(out.servo > 0.0);
    }

    #[test]
    fn open_track_ramps_throttle_up_to_60() {
        let mut ctrl = RuleBasedController::new(ControllerGains::default());
        let dist = [200i64, 200, 200];
        let da = [];
        let mut throttle = 0.0;
        for _ in 0..10 {
            if let Some(out) = ctrl.control(&view(&dist, &da, 20.0)) {
                throttle = out.throttle;
            }
        }
        assert_relative_eq!(throttle, 60.0);
    }

    #[test]
    fn wall_ahead_requests_reverse() {
        let mut ctrl = RuleBasedController::new(ControllerGains::default());
        let dist = [100i64, 30, 100];
        let out = ctrl.control(&view(&dist, &[], 40.0)).unwrap();
        assert!(out.throttle < -18.0, "throttle={}", out.throttle);
    }

    #[test]
    fn boundary_distance_of_50_holds_the_previous_commands() {
        let mut ctrl = RuleBasedController::new(ControllerGains::default());
        let open = [200i64, 200, 200];
        let before = ctrl.control(&view(&open, &[], 20.0)).unwrap();
        let hold = [200i64, 50, 200];
        let out = ctrl.control(&view(&hold, &[], 40.0)).unwrap();
        assert_relative_eq!(out.throttle, before.throttle);
        assert_relative_eq!(out.servo, before.servo);
    }

    #[test]
    fn mid_band_backs_off_towards_18() {
        let mut ctrl = RuleBasedController::new(ControllerGains::default());
        // Start with a high throttle from the open band.
        let open = [200i64, 200, 200];
        ctrl.control(&view(&open, &[], 20.0)).unwrap();
        let mid = [200i64, 80, 200];
        let out = ctrl.control(&view(&mid, &[], 40.0)).unwrap();
        assert!(out.throttle >= 18.0);
        assert!(out.throttle < 60.0);
    }

    #[test]
    fn learned_policy_is_linear_in_the_distances() {
        let pars = LinearPolicyPars {
            throttle_weights: [1.0, 2.0, 3.0],
            throttle_bias: 4.0,
            servo_weights: [0.0, 0.0, 0.0],
            servo_bias: -1.0,
        };
        let mut ctrl = LearnedController::new(pars);
        let dist = [10i64, 20, 30];
        let out = ctrl.control(&view(&dist, &[], 0.0)).unwrap();
        assert_relative_eq!(out.throttle, 10.0 + 40.0 + 90.0 + 4.0);
        assert_relative_eq!(out.servo, -1.0);
    }
}
