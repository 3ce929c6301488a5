use crate::core::Point;
use helpers::general::screen_angle_rad;

/// Angular offset of the front corners relative to the heading, in degrees.
/// The rear corners sit at 157°/203°. These offsets come from the sprite
/// proportions of the reference vehicle and are part of the corner ordering
/// contract below.
const FRONT_CORNER_OFFSET_DEG: f64 = 23.0;
const REAR_LEFT_OFFSET_DEG: f64 = 157.0;
const REAR_RIGHT_OFFSET_DEG: f64 = 203.0;

/// Index of the corner used for finish-line detection (the front-right
/// corner, offset +23°).
pub const FINISH_CORNER: usize = 0;

/// The four vehicle corners in their contractual order:
/// 0 = front-right (+23°), 1 = front-left (-23°), 2 = rear-left (+157°),
/// 3 = rear-right (+203°).
///
/// This order is load-bearing: the collision scan handles the first corner
/// that samples a border pixel, so reordering changes which simultaneous
/// hit wins. The rebound torque sign also keys off the front-right corner.
pub type Corners = [Point; 4];

fn offset_point(center: Point, heading_deg: f64, offset_deg: f64, radius: f64) -> Point {
    let a = screen_angle_rad(heading_deg + offset_deg);
    (center.0 + a.cos() * radius, center.1 + a.sin() * radius)
}

/// compute_corners returns the four corner points of a vehicle with the
/// given half length/width, centered at `center` with the given heading.
/// The corner radius is the half diagonal; by symmetry the centroid of the
/// four corners equals `center`.
pub fn compute_corners(center: Point, heading_deg: f64, half_len: f64, half_wid: f64) -> Corners {
    let diag = half_len.hypot(half_wid);
    [
        offset_point(center, heading_deg, FRONT_CORNER_OFFSET_DEG, diag),
        offset_point(center, heading_deg, -FRONT_CORNER_OFFSET_DEG, diag),
        offset_point(center, heading_deg, REAR_LEFT_OFFSET_DEG, diag),
        offset_point(center, heading_deg, REAR_RIGHT_OFFSET_DEG, diag),
    ]
}

/// compute_wheels returns the two front wheel positions: the ±23° corner
/// directions at a reduced radius.
pub fn compute_wheels(center: Point, heading_deg: f64, radius: f64) -> (Point, Point) {
    (
        offset_point(center, heading_deg, FRONT_CORNER_OFFSET_DEG, radius),
        offset_point(center, heading_deg, -FRONT_CORNER_OFFSET_DEG, radius),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn centroid_equals_center() {
        for &heading in &[0.0, 37.5, 90.0, 211.0, 359.0] {
            let corners = compute_corners((100.0, 50.0), heading, 16.0, 8.0);
            let cx: f64 = corners.iter().map(|p| p.0).sum::<f64>() / 4.0;
            let cy: f64 = corners.iter().map(|p| p.1).sum::<f64>() / 4.0;
            assert_relative_eq!(cx, 100.0, epsilon = 1e-9);
            assert_relative_eq!(cy, 50.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn corners_sit_on_the_half_diagonal() {
        let corners = compute_corners((0.0, 0.0), 123.0, 16.0, 8.0);
        let diag = 16.0f64.hypot(8.0);
        for p in corners.iter() {
            assert_relative_eq!(p.0.hypot(p.1), diag, epsilon = 1e-9);
        }
    }

    #[test]
    fn front_corner_points_forward_at_heading_zero() {
        // Heading 0 is towards +x; both front corners must be ahead of the
        // center, both rear corners behind it.
        let corners = compute_corners((0.0, 0.0), 0.0, 16.0, 8.0);
        assert!(corners[0].0 > 0.0 && corners[1].0 > 0.0);
        assert!(corners[2].0 < 0.0 && corners[3].0 < 0.0);
    }

    #[test]
    fn wheels_match_front_corner_directions() {
        let corners = compute_corners((0.0, 0.0), 45.0, 16.0, 8.0);
        let diag = 16.0f64.hypot(8.0);
        let (right, left) = compute_wheels((0.0, 0.0), 45.0, diag - 6.0);
        // Same direction, shorter radius.
        let scale = (diag - 6.0) / diag;
        assert_relative_eq!(right.0, corners[0].0 * scale, epsilon = 1e-9);
        assert_relative_eq!(left.1, corners[1].1 * scale, epsilon = 1e-9);
    }
}
