use crate::core::car::{CarDims, CarState, WindowDims};
use crate::core::kinematics::steer_step;
use helpers::general::screen_angle_rad;
use log::debug;

/// step_motion advances position, heading, distance and time by one tick.
///
/// Order matters: distance and time first, then the steering-induced course
/// change, then the translation along the new heading. The position is
/// clamped into the window with the configured margin and the sprite center
/// is recomputed from the truncated top-left position.
pub fn step_motion(state: &mut CarState, dims: &CarDims, window: &WindowDims, dt: f64) {
    state.distance += state.speed;
    state.time += dt;

    if state.steer_deg != 0.0 {
        state.heading_deg = steer_step(
            state.heading_deg,
            state.steer_deg,
            state.speed,
            dims.wheelbase_px,
            dims.track_width_px,
        );
    }

    let a = screen_angle_rad(state.heading_deg);
    state.position.0 += a.cos() * state.speed;
    state.position.1 += a.sin() * state.speed;

    state.position.0 = state.position.0.max(window.margin_px);
    state.position.0 = state.position.0.min(window.width_px - window.margin_px);
    state.position.1 = state.position.1.max(window.margin_px);
    state.position.1 = state.position.1.min(window.height_px - window.margin_px);

    state.center = (
        state.position.0.trunc() + dims.cover_px / 2.0,
        state.position.1.trunc() + dims.cover_px / 2.0,
    );

    debug!(
        "motion: t={:.2} pos=({:.1},{:.1}) angle={:.2} speed={:.3}",
        state.time, state.position.0, state.position.1, state.heading_deg, state.speed
    );
}
