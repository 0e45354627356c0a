#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Karel adapters.
//!
//! Backends implement [`Canvas`]; the [`WorldPainter`] turns world queries
//! into drawing calls against any canvas, so the simulator never depends on
//! a concrete pixel sink.

mod painter;

pub use painter::WorldPainter;

use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};

use anyhow::{bail, Result as AnyResult};
use glam::Vec2;
use serde::{Deserialize, Deserializer};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque white, used for the background and the error halo.
    pub const WHITE: Self = Self::from_rgb_u8(255, 255, 255);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Converts the color back into byte RGB values, ignoring alpha.
    #[must_use]
    pub fn to_rgb_u8(self) -> [u8; 3] {
        [
            channel_to_u8(self.red),
            channel_to_u8(self.green),
            channel_to_u8(self.blue),
        ]
    }
}

fn channel_to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Drawing surface implemented by rendering backends.
///
/// Coordinates are pixels with the origin at the top-left corner of the
/// canvas and `y` growing downward.
pub trait Canvas {
    /// Canvas width in pixels.
    fn width(&self) -> u32;

    /// Canvas height in pixels.
    fn height(&self) -> u32;

    /// Fills the whole canvas with a single color.
    fn clear(&mut self, color: Color);

    /// Fills an axis-aligned rectangle.
    fn draw_rectangle(&mut self, top_left: Vec2, size: Vec2, color: Color);

    /// Draws a straight segment as a rectangle of the provided thickness
    /// centred on it, with flat ends at `from` and `to`.
    fn draw_line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color);

    /// Fills a circle.
    fn draw_circle(&mut self, center: Vec2, diameter: f32, color: Color);

    /// Draws text whose first line starts at `top_left`. Newlines start a new
    /// line below the previous one.
    fn draw_text(&mut self, top_left: Vec2, text: &str, font_size: f32, color: Color);

    /// Shows the current frame and holds it for the provided duration.
    ///
    /// Off-screen canvases may return at once; a displaying canvas is
    /// free to show the frame later, as long as frames keep their order.
    fn present(&mut self, hold: Duration) -> AnyResult<()>;

    /// Keeps the final frame visible until the host dismisses it.
    fn show_until_closed(&mut self) -> AnyResult<()>;

    /// Writes the current frame to a BMP image.
    fn save_bmp(&self, path: &Path) -> AnyResult<()>;
}

/// Renderer constants that adapters may override from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Side length of a grid cell in pixels.
    pub pixels_per_cell: u32,
    /// Number of intermediate frames drawn while the robot moves.
    pub animation_steps: u32,
    /// Hold of each intermediate animation frame.
    #[serde(rename = "short_frame_ms", deserialize_with = "duration_from_millis")]
    pub short_frame: Duration,
    /// Hold of each frame that completes a command.
    #[serde(rename = "long_frame_ms", deserialize_with = "duration_from_millis")]
    pub long_frame: Duration,
    /// Extra pixels on the right and bottom edges reserved for axis labels.
    pub margin: u32,
}

impl RenderConfig {
    /// Default cell side length.
    pub const DEFAULT_PIXELS_PER_CELL: u32 = 50;
    /// Default number of animation frames per move.
    pub const DEFAULT_ANIMATION_STEPS: u32 = 10;
    /// Default hold of an animation frame.
    pub const DEFAULT_SHORT_FRAME: Duration = Duration::from_millis(30);
    /// Default hold of a completed command.
    pub const DEFAULT_LONG_FRAME: Duration = Duration::from_millis(300);
    /// Default label margin.
    pub const DEFAULT_MARGIN: u32 = 32;
    /// Largest cell side length accepted from configuration.
    pub const MAX_PIXELS_PER_CELL: u32 = 1_000;
    /// Largest label margin accepted from configuration.
    pub const MAX_MARGIN: u32 = 1_000;
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pixels_per_cell: Self::DEFAULT_PIXELS_PER_CELL,
            animation_steps: Self::DEFAULT_ANIMATION_STEPS,
            short_frame: Self::DEFAULT_SHORT_FRAME,
            long_frame: Self::DEFAULT_LONG_FRAME,
            margin: Self::DEFAULT_MARGIN,
        }
    }
}

fn duration_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

/// Canvas that discards every drawing call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NullCanvas {
    width: u32,
    height: u32,
}

impl NullCanvas {
    /// Creates a null canvas reporting the provided size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Canvas for NullCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, _color: Color) {}

    fn draw_rectangle(&mut self, _top_left: Vec2, _size: Vec2, _color: Color) {}

    fn draw_line(&mut self, _from: Vec2, _to: Vec2, _thickness: f32, _color: Color) {}

    fn draw_circle(&mut self, _center: Vec2, _diameter: f32, _color: Color) {}

    fn draw_text(&mut self, _top_left: Vec2, _text: &str, _font_size: f32, _color: Color) {}

    fn present(&mut self, _hold: Duration) -> AnyResult<()> {
        Ok(())
    }

    fn show_until_closed(&mut self) -> AnyResult<()> {
        Ok(())
    }

    fn save_bmp(&self, path: &Path) -> AnyResult<()> {
        bail!(
            "cannot save {}: the null canvas keeps no pixels",
            path.display()
        )
    }
}

/// Drawing call captured by a [`RecordingCanvas`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Canvas cleared to a color.
    Clear(Color),
    /// Filled rectangle.
    Rectangle {
        /// Top-left corner.
        top_left: Vec2,
        /// Width and height.
        size: Vec2,
        /// Fill color.
        color: Color,
    },
    /// Thick line segment.
    Line {
        /// Segment start.
        from: Vec2,
        /// Segment end.
        to: Vec2,
        /// Stroke thickness.
        thickness: f32,
        /// Stroke color.
        color: Color,
    },
    /// Filled circle.
    Circle {
        /// Circle center.
        center: Vec2,
        /// Circle diameter.
        diameter: f32,
        /// Fill color.
        color: Color,
    },
    /// Text label.
    Text {
        /// Top-left corner of the first line.
        top_left: Vec2,
        /// Text content.
        text: String,
        /// Glyph height in pixels.
        font_size: f32,
        /// Glyph color.
        color: Color,
    },
    /// Frame presented with a hold.
    Present(Duration),
    /// Final frame held until dismissed.
    ShowUntilClosed,
    /// Frame exported to a BMP file.
    SaveBmp(PathBuf),
}

/// Canvas that records every call, used to observe rendering in tests.
///
/// Clones share one log, so a test can keep a handle while the simulator owns
/// the boxed canvas.
#[derive(Clone, Debug, Default)]
pub struct RecordingCanvas {
    width: u32,
    height: u32,
    log: Rc<RefCell<Vec<DrawOp>>>,
}

impl RecordingCanvas {
    /// Creates an empty recording canvas of the provided size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            log: Rc::default(),
        }
    }

    /// Calls recorded so far, in order.
    #[must_use]
    pub fn ops(&self) -> Vec<DrawOp> {
        self.log.borrow().clone()
    }

    /// Holds passed to [`Canvas::present`], in order.
    #[must_use]
    pub fn presented(&self) -> Vec<Duration> {
        self.log
            .borrow()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Present(hold) => Some(*hold),
                _ => None,
            })
            .collect()
    }

    /// Text labels drawn so far, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Paths passed to [`Canvas::save_bmp`], in order.
    #[must_use]
    pub fn saved(&self) -> Vec<PathBuf> {
        self.log
            .borrow()
            .iter()
            .filter_map(|op| match op {
                DrawOp::SaveBmp(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forgets every recorded call.
    pub fn reset(&self) {
        self.log.borrow_mut().clear();
    }

    fn record(&self, op: DrawOp) {
        self.log.borrow_mut().push(op);
    }
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, color: Color) {
        self.record(DrawOp::Clear(color));
    }

    fn draw_rectangle(&mut self, top_left: Vec2, size: Vec2, color: Color) {
        self.record(DrawOp::Rectangle {
            top_left,
            size,
            color,
        });
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color) {
        self.record(DrawOp::Line {
            from,
            to,
            thickness,
            color,
        });
    }

    fn draw_circle(&mut self, center: Vec2, diameter: f32, color: Color) {
        self.record(DrawOp::Circle {
            center,
            diameter,
            color,
        });
    }

    fn draw_text(&mut self, top_left: Vec2, text: &str, font_size: f32, color: Color) {
        self.record(DrawOp::Text {
            top_left,
            text: text.to_owned(),
            font_size,
            color,
        });
    }

    fn present(&mut self, hold: Duration) -> AnyResult<()> {
        self.record(DrawOp::Present(hold));
        Ok(())
    }

    fn show_until_closed(&mut self) -> AnyResult<()> {
        self.record(DrawOp::ShowUntilClosed);
        Ok(())
    }

    fn save_bmp(&self, path: &Path) -> AnyResult<()> {
        self.record(DrawOp::SaveBmp(path.to_path_buf()));
        Ok(())
    }
}
