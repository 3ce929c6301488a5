use crate::core::geometry::FINISH_CORNER;
use crate::core::track_map::ColorSource;
use crate::core::Point;
use helpers::general::{angle_between_deg, normalize_deg};
use serde::Deserialize;

/// ReboundPars collects the tunable coefficients of the wall response.
/// Defaults are the values fitted against the reference vehicle.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ReboundPars {
    /// Radius of the wall-normal probe circle in px.
    pub probe_radius_px: f64,
    /// Angular step of the probe sweep in degrees.
    pub probe_step_deg: u32,
    /// Angular distance between the two probe points of a pair.
    pub probe_pair_deg: f64,
    /// Scale of the push-back displacement along the reversed heading.
    pub disp_factor: f64,
    /// Speed-proportional displacement magnitude.
    pub disp_speed_factor: f64,
    /// Amplitude of the incidence-dependent turn.
    pub turn_factor: f64,
    /// Constant part of the turn.
    pub turn_offset: f64,
    /// Damping factors for shallow / mid / steep incidence angles.
    pub damp_shallow: f64,
    pub damp_mid: f64,
    pub damp_steep: f64,
}

impl Default for ReboundPars {
    fn default() -> ReboundPars {
        ReboundPars {
            probe_radius_px: 15.0,
            probe_step_deg: 10,
            probe_pair_deg: 15.0,
            disp_factor: -1.7,
            disp_speed_factor: 8.0,
            turn_factor: 7.0,
            turn_offset: 1.0,
            damp_shallow: 0.8,
            damp_mid: 0.5,
            damp_steep: 0.2,
        }
    }
}

/// Outcome of a wall contact at one corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rebound {
    pub speed: f64,
    pub heading_deg: f64,
    pub displacement: (f64, f64),
    /// False when the contact was absorbed without a response (rear corner
    /// while reversing).
    pub damped: bool,
}

/// Estimates the wall tangent direction at the collision point: sweep probe
/// pairs around the corner and take the first pair whose leading point is in
/// the wall while the trailing point is free. Falls back to a +x offset when
/// no transition is found (flat wall through the probe circle).
fn wall_edge_point<C: ColorSource>(map: &C, point: Point, pars: &ReboundPars) -> Point {
    let (x0, y0) = point;
    let border = map.border_color();
    let step = pars.probe_step_deg.max(1);

    let mut vi = 0u32;
    while vi <= 360 {
        let a = (vi as f64).to_radians();
        let a2 = a + pars.probe_pair_deg.to_radians();
        let p1 = (
            x0 + pars.probe_radius_px * a.cos(),
            y0 + pars.probe_radius_px * a.sin(),
        );
        let p2 = (
            x0 + pars.probe_radius_px * a2.cos(),
            y0 + pars.probe_radius_px * a2.sin(),
        );
        if map.color_at(p1.0 as i64, p1.1 as i64) == border
            && map.color_at(p2.0 as i64, p2.1 as i64) != border
        {
            return p1;
        }
        vi += step;
    }

    (x0 + pars.probe_radius_px, y0)
}

/// rebound_action computes the response to a border hit at corner
/// `corner_idx` (geometry order). Speed is damped by the incidence angle,
/// the vehicle is pushed back against its heading proportionally to forward
/// speed, and the heading receives a turn whose sign depends on the corner.
///
/// A rear corner hit while reversing stops the vehicle without any push or
/// turn; this keeps backing out of a wall stable.
pub fn rebound_action<C: ColorSource>(
    map: &C,
    corner_idx: usize,
    point: Point,
    heading_deg: f64,
    speed: f64,
    pars: &ReboundPars,
) -> Rebound {
    if (corner_idx == 2 || corner_idx == 3) && speed < 0.0 {
        return Rebound {
            speed: 0.0,
            heading_deg,
            displacement: (0.0, 0.0),
            damped: false,
        };
    }

    let edge = wall_edge_point(map, point, pars);
    let heading_vec = (
        heading_deg.to_radians().cos(),
        heading_deg.to_radians().sin(),
    );
    let wall_vec = (edge.0 - point.0, edge.1 - point.1);
    let mut ang = angle_between_deg(wall_vec, heading_vec);
    if ang > 90.0 {
        ang = 180.0 - ang;
    }

    let damping = if ang == 0.0 {
        1.0
    } else if ang < 30.0 {
        pars.damp_shallow
    } else if ang < 60.0 {
        pars.damp_mid
    } else {
        pars.damp_steep
    };
    let new_speed = speed * damping;

    let s = pars.disp_speed_factor * speed.max(0.0) * ang.to_radians().sin();
    let back = (360.0 - heading_deg).to_radians();
    let displacement = (
        pars.disp_factor * back.cos() * s,
        pars.disp_factor * back.sin() * s,
    );

    let kt = if corner_idx == FINISH_CORNER { -1.0 } else { 1.0 };
    let turn = pars.turn_factor * (2.0 * ang).to_radians().sin() + pars.turn_offset;
    let new_heading = normalize_deg(heading_deg + kt * turn);

    Rebound {
        speed: new_speed,
        heading_deg: new_heading,
        displacement,
        damped: true,
    }
}
