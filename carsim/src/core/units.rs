/// UnitConverter translates between raster pixels and real-world centimeters.
///
/// The track is 1900 cm wide in the real world and spans the full raster
/// width, so the scale is a single linear factor.
#[derive(Debug, Clone, Copy)]
pub struct UnitConverter {
    width_px: f64,
}

/// Real-world reference width of the track in cm.
pub const TRACK_WIDTH_CM: f64 = 1900.0;

impl UnitConverter {
    pub fn new(width_px: f64) -> UnitConverter {
        UnitConverter { width_px }
    }

    /// Pixels -> cm (1900 cm corresponds to the full raster width).
    pub fn sim_to_real(&self, sim_px: f64) -> f64 {
        sim_px * TRACK_WIDTH_CM / self.width_px
    }

    /// cm -> pixels (inverse of `sim_to_real`).
    pub fn real_to_sim(&self, real_cm: f64) -> f64 {
        real_cm * self.width_px / TRACK_WIDTH_CM
    }
}
