use crate::core::units::UnitConverter;

// Empirical regression coefficients, fitted against the physical model car.
// Acceleration: a = (c_v*v + c_p2*p² + c_p*p) / 100, in cm/s².
const ACCEL_SPEED_COEFF: f64 = -2.179;
const ACCEL_POWER_QUAD: f64 = 0.155;
const ACCEL_POWER_LINEAR: f64 = 7.015;
const ACCEL_SCALE: f64 = 100.0;

// Top speed on a straight: v_max = (c2*p² + c1*p + c0) / 100, in cm/s.
const VMAX_STRAIGHT_QUAD: f64 = -0.0496;
const VMAX_STRAIGHT_LINEAR: f64 = 9.008;
const VMAX_STRAIGHT_CONST: f64 = 31.8089;
const VMAX_STRAIGHT_SCALE: f64 = 100.0;

// Top speed in a curve: v_max = (c*p^e + c0) / 100, power law with negative
// exponent.
const VMAX_CURVE_COEFF: f64 = -81562.0;
const VMAX_CURVE_EXP: f64 = -2.47;
const VMAX_CURVE_CONST: f64 = 215.5123;
const VMAX_CURVE_SCALE: f64 = 100.0;

/// Steering angles at or above this use the curve regime.
const STEERING_THRESHOLD_DEG: f64 = 5.0;

/// Default integration step: 10 ms per tick.
pub const DT_SECONDS: f64 = 0.01;

/// Maximum achievable speed in cm/s for the given power magnitude and steer
/// angle. Straights and curves were fitted separately; the signed steer
/// angle selects the regime.
fn max_speed_cm_s(power: f64, steer_deg: f64) -> f64 {
    let p = power.abs();
    if steer_deg < STEERING_THRESHOLD_DEG {
        (VMAX_STRAIGHT_QUAD * p * p + VMAX_STRAIGHT_LINEAR * p + VMAX_STRAIGHT_CONST)
            / VMAX_STRAIGHT_SCALE
    } else {
        (VMAX_CURVE_COEFF * p.powf(VMAX_CURVE_EXP) + VMAX_CURVE_CONST) / VMAX_CURVE_SCALE
    }
}

/// Acceleration in cm/s²: linear damping in the current speed plus a
/// quadratic+linear drive term in power.
fn acceleration_cm_s2(speed_cm_s: f64, power: f64) -> f64 {
    let p = power.abs();
    (ACCEL_SPEED_COEFF * speed_cm_s + ACCEL_POWER_QUAD * p * p + ACCEL_POWER_LINEAR * p)
        / ACCEL_SCALE
}

/// target_speed returns the reference speed in px/tick for a power value,
/// using the straight-line regression only. It is a target indicator, not
/// part of the integration.
pub fn target_speed(units: &UnitConverter, power: f64) -> f64 {
    let v_cm_s = (VMAX_STRAIGHT_QUAD * power * power
        + VMAX_STRAIGHT_LINEAR * power
        + VMAX_STRAIGHT_CONST)
        / VMAX_STRAIGHT_SCALE;
    units.real_to_sim(v_cm_s)
}

/// step_speed integrates the speed over one tick (Euler step).
///
/// The computation runs in real-world units. Negative power flips power and
/// speed to positive magnitudes internally and restores the sign at the end
/// (turnback handling). The candidate speed is clamped to v_max, keeping the
/// sign of the pre-step speed (a snap to the boundary, not a bounce).
pub fn step_speed(
    units: &UnitConverter,
    current_speed_px: f64,
    power: f64,
    steer_deg: f64,
    dt: f64,
) -> f64 {
    let mut v = units.sim_to_real(current_speed_px);

    let mut turnback = false;
    let mut p = power;
    if p < 0.0 {
        p = -p;
        v = -v;
        turnback = true;
    }

    let v_new = if p == 0.0 {
        0.0
    } else {
        let vmax = max_speed_cm_s(p, steer_deg);
        let a = acceleration_cm_s2(v, p);

        let candidate = v + a * dt;
        if candidate.abs() <= vmax.abs() {
            candidate
        } else if v >= 0.0 {
            vmax
        } else {
            -vmax
        }
    };

    units.real_to_sim(if turnback { -v_new } else { v_new })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn units() -> UnitConverter {
        UnitConverter::new(1536.0)
    }

    #[test]
    fn speed_never_exceeds_vmax() {
        let u = units();
        for &power in &[20.0, 50.0, 100.0] {
            for &steer in &[0.0, 4.9, 5.0, 10.0] {
                let mut v = 0.0;
                for _ in 0..2000 {
                    v = step_speed(&u, v, power, steer, DT_SECONDS);
                    let vmax_px = u.real_to_sim(max_speed_cm_s(power, steer));
                    assert!(
                        v.abs() <= vmax_px.abs() + 1e-9,
                        "speed {} exceeded vmax {} (power={} steer={})",
                        v,
                        vmax_px,
                        power,
                        steer
                    );
                }
            }
        }
    }

    #[test]
    fn clamps_for_any_speed_and_dt() {
        let u = units();
        for &v0 in &[-500.0, -20.0, 0.0, 3.0, 999.0] {
            for &dt in &[0.001, 0.01, 1.0, 10.0] {
                let v = step_speed(&u, v0, 80.0, 0.0, dt);
                let vmax_px = u.real_to_sim(max_speed_cm_s(80.0, 0.0));
                assert!(v.abs() <= vmax_px.abs() + 1e-9);
            }
        }
    }

    #[test]
    fn zero_power_stops() {
        let u = units();
        for &v0 in &[-10.0, 0.0, 5.0, 80.0] {
            assert_relative_eq!(step_speed(&u, v0, 0.0, 0.0, DT_SECONDS), 0.0);
        }
    }

    #[test]
    fn reverse_power_yields_negative_speed() {
        let u = units();
        let mut v = 0.0;
        for _ in 0..200 {
            v = step_speed(&u, v, -50.0, 0.0, DT_SECONDS);
        }
        assert!(v < 0.0);
    }

    #[test]
    fn curve_regime_is_slower_than_straight() {
        let u = units();
        let mut v_straight = 0.0;
        let mut v_curve = 0.0;
        for _ in 0..2000 {
            v_straight = step_speed(&u, v_straight, 100.0, 0.0, DT_SECONDS);
            v_curve = step_speed(&u, v_curve, 100.0, 10.0, DT_SECONDS);
        }
        assert!(v_curve < v_straight);
    }

    #[test]
    fn target_speed_matches_straight_regression_at_full_power() {
        let u = units();
        let expected_cm_s =
            (VMAX_STRAIGHT_QUAD * 10000.0 + VMAX_STRAIGHT_LINEAR * 100.0 + VMAX_STRAIGHT_CONST)
                / VMAX_STRAIGHT_SCALE;
        assert_relative_eq!(target_speed(&u, 100.0), u.real_to_sim(expected_cm_s));
    }
}
