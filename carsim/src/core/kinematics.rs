use helpers::general::normalize_deg;

const EPS: f64 = 1e-6;

/// tan(δ) diverges towards 90°, so the steering angle is clamped here.
const MAX_STEER_DEG: f64 = 89.0;

/// steer_step computes the new heading after one tick of steering.
///
/// Bicycle model: turn radius R = wheelbase/tan(δ) + track_width/2, heading
/// change Δθ = speed / R. Reverse travel rotates the vehicle the opposite
/// way. All degenerate inputs (no steering, no motion, non-finite values,
/// vanishing or non-finite radius) leave the heading unchanged.
///
/// * `heading_deg` - current vehicle heading [°]
/// * `steer_deg` - front wheel angle [°], sign selects left/right
/// * `speed_px` - speed [px/tick], sign selects forward/reverse
/// * `wheelbase_px` - axle distance [px]
/// * `track_width_px` - lateral wheel distance [px]
pub fn steer_step(
    heading_deg: f64,
    steer_deg: f64,
    speed_px: f64,
    wheelbase_px: f64,
    track_width_px: f64,
) -> f64 {
    if !steer_deg.is_finite() || !speed_px.is_finite() {
        return normalize_deg(heading_deg);
    }
    if steer_deg.abs() < EPS || speed_px.abs() < EPS {
        return normalize_deg(heading_deg);
    }

    let k0 = if steer_deg < 0.0 { -1.0 } else { 1.0 };
    let steer_rad = steer_deg.abs().min(MAX_STEER_DEG).to_radians();

    let tanv = steer_rad.tan();
    if tanv.abs() < EPS {
        return normalize_deg(heading_deg);
    }

    let turn_radius = wheelbase_px / tanv + track_width_px / 2.0;
    if !turn_radius.is_finite() || turn_radius.abs() < EPS {
        return normalize_deg(heading_deg);
    }

    let dtheta_deg = (speed_px.abs() / turn_radius).to_degrees();

    let new_heading = if speed_px > 0.0 {
        heading_deg + k0 * dtheta_deg
    } else {
        heading_deg - k0 * dtheta_deg
    };

    normalize_deg(new_heading)
}
