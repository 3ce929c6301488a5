use anyhow::Context;
use log::info;
use png::Decoder;
use png::Transformations;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// An RGBA8 pixel value. Track semantics use exact equality, so no
/// tolerance-based comparison lives here.
pub type Rgba = (u8, u8, u8, u8);

/// Default color of track borders (opaque white).
pub const BORDER_COLOR: Rgba = (255, 255, 255, 255);

/// Default color of the finish line.
pub const FINISH_COLOR: Rgba = (237, 28, 36, 255);

/// ColorSource supplies pixel colors to the collision and sensor modules.
/// Coordinates are raster pixels; implementations decide how out-of-range
/// lookups behave.
pub trait ColorSource {
    fn color_at(&self, x: i64, y: i64) -> Rgba;
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn border_color(&self) -> Rgba {
        BORDER_COLOR
    }

    fn finish_color(&self) -> Rgba {
        FINISH_COLOR
    }
}

/// TrackMap holds the decoded track raster plus the two colors with special
/// semantics. Out-of-bounds lookups return the border color, so code sampling
/// past the raster edge sees a wall instead of panicking.
pub struct TrackMap {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    pub border_color: Rgba,
    pub finish_color: Rgba,
}

impl TrackMap {
    /// Decodes a PNG file into a track map with the default border and
    /// finish colors.
    pub fn from_png(filepath: &Path) -> anyhow::Result<TrackMap> {
        let fh = File::open(filepath).context(format!(
            "Failed to open track map {}!",
            filepath.display()
        ))?;
        let mut decoder = Decoder::new(BufReader::new(fh));
        decoder.set_transformations(Transformations::normalize_to_color8());

        let mut reader = decoder.read_info().context(format!(
            "Failed to decode track map {}!",
            filepath.display()
        ))?;
        let mut data = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut data).context(format!(
            "Failed to read track map frame {}!",
            filepath.display()
        ))?;

        let channels = frame.color_type.samples();
        let pixels = match channels {
            4 => data,
            3 => {
                // Expand RGB to RGBA with full alpha.
                let mut rgba = Vec::with_capacity(data.len() / 3 * 4);
                for px in data.chunks_exact(3) {
                    rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
                rgba
            }
            _ => anyhow::bail!(
                "Unsupported track map color type in {} ({} channels)!",
                filepath.display(),
                channels
            ),
        };

        info!(
            "Loaded track map {} ({}x{})",
            filepath.display(),
            frame.width,
            frame.height
        );

        Ok(TrackMap {
            pixels,
            width: frame.width,
            height: frame.height,
            border_color: BORDER_COLOR,
            finish_color: FINISH_COLOR,
        })
    }

    /// Builds a map from an in-memory RGBA8 raster; used for
    /// parameter-defined colors and in tests.
    pub fn from_raster(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        border_color: Rgba,
        finish_color: Rgba,
    ) -> anyhow::Result<TrackMap> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            anyhow::bail!(
                "Raster buffer has {} bytes, expected {} for {}x{} RGBA!",
                pixels.len(),
                expected,
                width,
                height
            );
        }
        Ok(TrackMap {
            pixels,
            width,
            height,
            border_color,
            finish_color,
        })
    }

    /// Overrides the special colors from CSS color strings, e.g. "#ffffff"
    /// or "rgb(237, 28, 36)".
    pub fn set_colors(&mut self, border: &str, finish: &str) -> anyhow::Result<()> {
        self.border_color = parse_css_color(border)?;
        self.finish_color = parse_css_color(finish)?;
        Ok(())
    }
}

impl ColorSource for TrackMap {
    fn color_at(&self, x: i64, y: i64) -> Rgba {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return self.border_color;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        (
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        )
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn border_color(&self) -> Rgba {
        self.border_color
    }

    fn finish_color(&self) -> Rgba {
        self.finish_color
    }
}

/// Parses a CSS color string into an opaque Rgba value. The alpha channel of
/// the raster is always 255 after normalization, so translucent inputs are
/// rounded the same way.
pub fn parse_css_color(text: &str) -> anyhow::Result<Rgba> {
    let color = text
        .parse::<css_color_parser::Color>()
        .context(format!("Could not parse color {}!", text))?;
    Ok((color.r, color.g, color.b, (color.a * 255.0).round() as u8))
}
