#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Software rasteriser that implements the Karel rendering contract.
//!
//! [`RasterCanvas`] keeps an RGB frame in memory and exports it as a 24-bit
//! BMP. It never displays anything: presenting a frame returns at once, so
//! headless runs and snapshots cost no wall-clock time. Windowed backends
//! copy the buffer out with [`RasterCanvas::to_rgba8`].

mod bmp;
mod font;

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result as AnyResult;
use glam::Vec2;
use karel_rendering::{Canvas, Color};
use log::debug;
use thiserror::Error;

/// Largest width or height accepted for a raster canvas.
pub const MAX_CANVAS_DIMENSION: u32 = 1 << 15;

/// Largest number of pixels accepted for a raster canvas.
pub const MAX_CANVAS_PIXELS: u64 = 1 << 26;

/// Errors reported by the raster backend.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The requested canvas had no pixels.
    #[error("canvas must be at least 1x1 pixels (requested {width}x{height})")]
    Empty {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The requested canvas exceeded [`MAX_CANVAS_DIMENSION`] along an axis
    /// or [`MAX_CANVAS_PIXELS`] in total.
    #[error("canvas of {width}x{height} pixels is too large to rasterise")]
    TooLarge {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// Writing an image file failed.
    #[error("failed to write {}", path.display())]
    Io {
        /// Destination file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// In-memory RGB canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterCanvas {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}

impl RasterCanvas {
    /// Creates a white canvas of the provided size.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::Empty { width, height });
        }
        let pixels = u64::from(width) * u64::from(height);
        if width > MAX_CANVAS_DIMENSION
            || height > MAX_CANVAS_DIMENSION
            || pixels > MAX_CANVAS_PIXELS
        {
            return Err(RasterError::TooLarge { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![[255; 3]; width as usize * height as usize],
        })
    }

    /// Color of a pixel, or `None` outside the canvas.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x < self.width && y < self.height {
            self.pixels.get(y as usize * self.width as usize + x as usize).copied()
        } else {
            None
        }
    }

    /// Copies the current frame out as opaque RGBA bytes, row by row from
    /// the top.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&[red, green, blue]| [red, green, blue, u8::MAX])
            .collect()
    }

    /// Encodes the current frame as BMP bytes.
    #[must_use]
    pub fn encode_bmp(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        // Writing into a vector cannot fail.
        let _ = bmp::write_bmp(&mut bytes, self.width, self.height, &self.pixels);
        bytes
    }

    /// Writes the current frame to a BMP file.
    pub fn write_bmp(&self, path: &Path) -> Result<(), RasterError> {
        let io_error = |source| RasterError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        bmp::write_bmp(&mut writer, self.width, self.height, &self.pixels).map_err(io_error)?;
        writer.flush().map_err(io_error)
    }

    /// Paints every pixel whose centre satisfies `inside`, limited to a
    /// bounding box.
    fn fill_where(&mut self, min: Vec2, max: Vec2, color: Color, inside: impl Fn(Vec2) -> bool) {
        let rgb = color.to_rgb_u8();
        let x_start = min.x.floor().max(0.0) as u32;
        let y_start = min.y.floor().max(0.0) as u32;
        let x_end = (max.x.ceil().max(0.0) as u32).min(self.width);
        let y_end = (max.y.ceil().max(0.0) as u32).min(self.height);
        for y in y_start..y_end {
            for x in x_start..x_end {
                if inside(Vec2::new(x as f32 + 0.5, y as f32 + 0.5)) {
                    self.pixels[y as usize * self.width as usize + x as usize] = rgb;
                }
            }
        }
    }
}

impl Canvas for RasterCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, color: Color) {
        self.pixels.fill(color.to_rgb_u8());
    }

    fn draw_rectangle(&mut self, top_left: Vec2, size: Vec2, color: Color) {
        let bottom_right = top_left + size;
        self.fill_where(top_left, bottom_right, color, |point| {
            point.cmpge(top_left).all() && point.cmplt(bottom_right).all()
        });
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color) {
        let half = thickness.max(1.0) / 2.0;
        let span = to - from;
        let length = span.length();
        if length <= f32::EPSILON {
            self.draw_rectangle(from - Vec2::splat(half), Vec2::splat(half * 2.0), color);
            return;
        }
        let direction = span / length;
        let normal = direction.perp();
        let reach = normal.abs() * half;
        let min = from.min(to) - reach;
        let max = from.max(to) + reach;
        self.fill_where(min, max, color, |point| {
            let offset = point - from;
            let along = offset.dot(direction);
            (0.0..=length).contains(&along) && offset.dot(normal).abs() <= half
        });
    }

    fn draw_circle(&mut self, center: Vec2, diameter: f32, color: Color) {
        let radius = diameter.max(1.0) / 2.0;
        let reach = Vec2::splat(radius);
        self.fill_where(center - reach, center + reach, color, |point| {
            point.distance_squared(center) <= radius * radius
        });
    }

    fn draw_text(&mut self, top_left: Vec2, text: &str, font_size: f32, color: Color) {
        let unit = (font_size / (font::LINE_HEIGHT - 1) as f32).max(1.0);
        for (line_index, line) in text.lines().enumerate() {
            let line_top = top_left.y + (line_index as u32 * font::LINE_HEIGHT) as f32 * unit;
            for (column_index, character) in line.chars().enumerate() {
                let rows = font::glyph(character);
                let glyph_left = top_left.x + (column_index as u32 * font::ADVANCE) as f32 * unit;
                for row in 0..font::GLYPH_HEIGHT {
                    for column in 0..font::GLYPH_WIDTH {
                        if font::is_lit(&rows, column, row) {
                            let corner = Vec2::new(
                                glyph_left + column as f32 * unit,
                                line_top + row as f32 * unit,
                            );
                            self.draw_rectangle(corner, Vec2::splat(unit), color);
                        }
                    }
                }
            }
        }
    }

    fn present(&mut self, _hold: Duration) -> AnyResult<()> {
        Ok(())
    }

    fn show_until_closed(&mut self) -> AnyResult<()> {
        Ok(())
    }

    fn save_bmp(&self, path: &Path) -> AnyResult<()> {
        self.write_bmp(path)?;
        debug!("saved {}x{} frame to {}", self.width, self.height, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Color = Color::from_rgb_u8(0, 0, 0);

    #[test]
    fn rejects_degenerate_sizes() {
        assert!(matches!(
            RasterCanvas::new(0, 4),
            Err(RasterError::Empty { width: 0, height: 4 })
        ));
        assert!(matches!(
            RasterCanvas::new(4, MAX_CANVAS_DIMENSION + 1),
            Err(RasterError::TooLarge { .. })
        ));
    }

    #[test]
    fn rectangle_covers_exact_pixels() {
        let mut canvas = RasterCanvas::new(6, 6).expect("valid size");
        canvas.draw_rectangle(Vec2::new(1.0, 2.0), Vec2::new(2.0, 3.0), BLACK);

        assert_eq!(canvas.pixel(1, 2), Some([0, 0, 0]));
        assert_eq!(canvas.pixel(2, 4), Some([0, 0, 0]));
        assert_eq!(canvas.pixel(3, 4), Some([255, 255, 255]));
        assert_eq!(canvas.pixel(1, 5), Some([255, 255, 255]));
        assert_eq!(canvas.pixel(6, 0), None);
    }

    #[test]
    fn thick_horizontal_line_spans_its_thickness() {
        let mut canvas = RasterCanvas::new(10, 10).expect("valid size");
        canvas.draw_line(Vec2::new(0.0, 5.0), Vec2::new(9.0, 5.0), 3.0, BLACK);

        for y in 4..=5 {
            assert_eq!(canvas.pixel(4, y), Some([0, 0, 0]), "row {y}");
        }
        assert_eq!(canvas.pixel(4, 7), Some([255, 255, 255]));
    }

    #[test]
    fn diagonal_thick_line_paints_a_diamond() {
        let mut canvas = RasterCanvas::new(40, 40).expect("valid size");
        let center = Vec2::new(20.0, 20.0);
        let reach = Vec2::splat(15.0 / std::f32::consts::SQRT_2);
        canvas.draw_line(center - reach, center + reach, 30.0, BLACK);

        assert_eq!(canvas.pixel(20, 20), Some([0, 0, 0]));
        assert_eq!(canvas.pixel(20, 7), Some([0, 0, 0]));
        assert_eq!(canvas.pixel(7, 20), Some([0, 0, 0]));
        assert_eq!(canvas.pixel(8, 8), Some([255, 255, 255]));
        assert_eq!(canvas.pixel(32, 32), Some([255, 255, 255]));
    }

    #[test]
    fn circle_stays_inside_its_radius() {
        let mut canvas = RasterCanvas::new(10, 10).expect("valid size");
        canvas.draw_circle(Vec2::new(5.0, 5.0), 4.0, BLACK);

        assert_eq!(canvas.pixel(5, 5), Some([0, 0, 0]));
        assert_eq!(canvas.pixel(4, 4), Some([0, 0, 0]));
        assert_eq!(canvas.pixel(8, 5), Some([255, 255, 255]));
    }

    #[test]
    fn text_lights_glyph_pixels() {
        let mut canvas = RasterCanvas::new(20, 20).expect("valid size");
        canvas.draw_text(Vec2::ZERO, "L\nL", 8.0, BLACK);

        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(canvas.pixel(4, 0), Some([255, 255, 255]));
        assert_eq!(canvas.pixel(4, 6), Some([0, 0, 0]));
        assert_eq!(canvas.pixel(0, 9), Some([0, 0, 0]));
    }

    #[test]
    fn presenting_never_waits() {
        let mut canvas = RasterCanvas::new(2, 2).expect("valid size");
        let started = std::time::Instant::now();

        canvas
            .present(Duration::from_secs(60))
            .expect("present never fails");
        canvas.show_until_closed().expect("no viewer to wait for");

        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn rgba_copy_is_opaque_and_row_major() {
        let mut canvas = RasterCanvas::new(2, 2).expect("valid size");
        canvas.draw_rectangle(Vec2::new(1.0, 0.0), Vec2::ONE, BLACK);

        let rgba = canvas.to_rgba8();

        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[..8], &[255, 255, 255, 255, 0, 0, 0, 255]);
        assert!(rgba.chunks(4).all(|pixel| pixel[3] == u8::MAX));
    }
}
