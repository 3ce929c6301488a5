use crate::core::track_map::ColorSource;
use crate::core::units::{UnitConverter, TRACK_WIDTH_CM};
use crate::core::Point;
use helpers::general::screen_angle_rad;
use serde::Deserialize;

// Calibration of the physical distance sensor pair: digital channel
// `floor(A/d + B)`, analog channel `AV/d + BV` for d in cm.
const DIGITAL_NUMERATOR: f64 = 23962.0;
const DIGITAL_OFFSET: f64 = -20.0;
const ANALOG_NUMERATOR: f64 = 58.5;
const ANALOG_OFFSET: f64 = -0.05;

/// Radar range in real-world cm; the px cap follows from the track scale.
const MAX_RADAR_RANGE_CM: f64 = 130.0;

/// Sensor fan configuration. The defaults give three rays at -60°, 0°, +60°
/// relative to the heading.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SensorPars {
    #[serde(default = "default_sweep")]
    pub sweep_deg: i32,
    #[serde(default = "default_sweep")]
    pub step_deg: i32,
}

fn default_sweep() -> i32 {
    60
}

impl Default for SensorPars {
    fn default() -> SensorPars {
        SensorPars {
            sweep_deg: default_sweep(),
            step_deg: default_sweep(),
        }
    }
}

/// One cast ray: the raster endpoint it stopped at and the integer pixel
/// distance from the cast origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Radar {
    pub endpoint: (i64, i64),
    pub dist_px: i64,
}

/// Pixel cap for a single ray at the given raster width.
pub fn max_radar_len(width_px: f64) -> i64 {
    (width_px * MAX_RADAR_RANGE_CM / TRACK_WIDTH_CM) as i64
}

/// cast_radar marches along one ray in whole-pixel steps until it samples a
/// border pixel or exhausts `max_len_px`. The endpoint is the first border
/// pixel (or the cap position); the distance is the integer euclidean
/// distance from the origin.
pub fn cast_radar<C: ColorSource>(
    map: &C,
    origin: Point,
    heading_deg: f64,
    offset_deg: f64,
    max_len_px: i64,
) -> Radar {
    let a = screen_angle_rad(heading_deg + offset_deg);
    let border = map.border_color();

    let mut length = 0i64;
    let mut x = origin.0 as i64;
    let mut y = origin.1 as i64;
    while map.color_at(x, y) != border && length < max_len_px {
        length += 1;
        x = (origin.0 + a.cos() * length as f64) as i64;
        y = (origin.1 + a.sin() * length as f64) as i64;
    }

    let dx = x as f64 - origin.0;
    let dy = y as f64 - origin.1;
    Radar {
        endpoint: (x, y),
        dist_px: dx.hypot(dy) as i64,
    }
}

/// collect_radars casts the configured fan of rays, sweeping offsets from
/// -sweep to +sweep inclusive in `step` increments.
pub fn collect_radars<C: ColorSource>(
    map: &C,
    origin: Point,
    heading_deg: f64,
    pars: &SensorPars,
    max_len_px: i64,
) -> Vec<Radar> {
    let step = pars.step_deg.max(1);
    let mut radars = Vec::new();
    let mut offset = -pars.sweep_deg;
    while offset <= pars.sweep_deg {
        radars.push(cast_radar(map, origin, heading_deg, offset as f64, max_len_px));
        offset += step;
    }
    radars
}

/// distances converts ray lengths to integer real-world cm.
pub fn distances(units: &UnitConverter, radars: &[Radar]) -> Vec<i64> {
    radars
        .iter()
        .map(|r| units.sim_to_real(r.dist_px as f64) as i64)
        .collect()
}

/// linearize_da maps a distance in cm onto the raw (digital, analog) reading
/// pair of the physical sensor. Zero distance has no hyperbola value and
/// yields the (0, 0.0) sentinel.
pub fn linearize_da(dist_cm: i64) -> (i64, f64) {
    if dist_cm == 0 {
        return (0, 0.0);
    }
    let d = dist_cm as f64;
    let digital = (DIGITAL_NUMERATOR / d + DIGITAL_OFFSET).floor() as i64;
    let analog = ANALOG_NUMERATOR / d + ANALOG_OFFSET;
    (digital, analog)
}
