/// normalize_deg wraps an angle in degrees into the range [0, 360).
/// The result is invariant under adding multiples of 360.
pub fn normalize_deg(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// screen_angle_rad converts a vehicle heading in degrees to the screen-space
/// angle in radians. The raster has its y axis pointing down, so a heading of
/// x° corresponds to (360 - x)° in trigonometric convention.
pub fn screen_angle_rad(heading_deg: f64) -> f64 {
    (360.0 - heading_deg).to_radians()
}

/// angle_between_deg returns the unsigned angle in degrees between two 2D
/// vectors via the normalized dot product. A zero-length vector on either
/// side yields 0.0 instead of a division fault.
pub fn angle_between_deg(v1: (f64, f64), v2: (f64, f64)) -> f64 {
    let den = (v1.0 * v1.0 + v1.1 * v1.1).sqrt() * (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if den == 0.0 || !den.is_finite() {
        return 0.0;
    }
    let cosv = ((v1.0 * v2.0 + v1.1 * v2.1) / den).clamp(-1.0, 1.0);
    cosv.acos().to_degrees()
}
