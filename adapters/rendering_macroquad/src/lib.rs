#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed window for watching Karel programs run.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! Macroquad owns the main thread while its window is open, so programs are
//! driven from the frame loop: [`MacroquadBackend::run`] asks the caller for
//! the next command whenever every presented frame has been shown. Drawing
//! itself happens off screen on a [`RasterCanvas`]; [`WindowCanvas`] queues
//! each presented buffer and the window uploads it as a texture.

mod frames;

pub use frames::{Frame, FrameFeed};

use std::{path::Path, time::Duration};

use anyhow::{Context, Result as AnyResult};
use glam::Vec2;
use karel_rendering::{Canvas, Color};
use karel_rendering_raster::{RasterCanvas, RasterError};
use log::{debug, info};
use macroquad::math::Vec2 as MacroquadVec2;
use macroquad::{
    input::{is_key_pressed, KeyCode},
    texture::{draw_texture_ex, DrawTextureParams, FilterMode, Image, Texture2D},
};

use self::frames::FramePlayer;

/// Fill shown around the world when the window is not the world's shape.
const LETTERBOX: Color = Color::from_rgb_u8(64, 64, 64);

/// Canvas that draws off screen and hands every presented frame to a window.
#[derive(Debug)]
pub struct WindowCanvas {
    raster: RasterCanvas,
    feed: FrameFeed,
}

impl WindowCanvas {
    /// Creates a white canvas of the provided size with an empty feed.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        Ok(Self {
            raster: RasterCanvas::new(width, height)?,
            feed: FrameFeed::new(width, height),
        })
    }

    /// Handle to the frames presented on this canvas.
    #[must_use]
    pub fn feed(&self) -> FrameFeed {
        self.feed.clone()
    }
}

impl Canvas for WindowCanvas {
    fn width(&self) -> u32 {
        self.raster.width()
    }

    fn height(&self) -> u32 {
        self.raster.height()
    }

    fn clear(&mut self, color: Color) {
        self.raster.clear(color);
    }

    fn draw_rectangle(&mut self, top_left: Vec2, size: Vec2, color: Color) {
        self.raster.draw_rectangle(top_left, size, color);
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color) {
        self.raster.draw_line(from, to, thickness, color);
    }

    fn draw_circle(&mut self, center: Vec2, diameter: f32, color: Color) {
        self.raster.draw_circle(center, diameter, color);
    }

    fn draw_text(&mut self, top_left: Vec2, text: &str, font_size: f32, color: Color) {
        self.raster.draw_text(top_left, text, font_size, color);
    }

    fn present(&mut self, hold: Duration) -> AnyResult<()> {
        self.feed.push(Frame {
            rgba: self.raster.to_rgba8(),
            hold,
        });
        Ok(())
    }

    fn show_until_closed(&mut self) -> AnyResult<()> {
        debug!("final frame stays up until the window closes");
        self.feed.request_close();
        Ok(())
    }

    fn save_bmp(&self, path: &Path) -> AnyResult<()> {
        self.raster.save_bmp(path)
    }
}

/// Window backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    window_title: String,
    swap_interval: Option<i32>,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            window_title: "Karel".to_owned(),
            swap_interval: None,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the title of the window.
    #[must_use]
    pub fn with_window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = title.into();
        self
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Opens the window and plays the frames arriving on `feed`.
    ///
    /// Whenever every queued frame has been shown for its hold, `advance` is
    /// called to run the next step of the program; it returns `false` once
    /// the program is over. The last frame then stays up until the viewer
    /// presses Escape or closes the window.
    pub fn run<F>(self, feed: FrameFeed, mut advance: F) -> AnyResult<()>
    where
        F: FnMut() -> bool + 'static,
    {
        let Self {
            window_title,
            swap_interval,
        } = self;

        let (width, height) = feed.size();
        let texture_width = u16::try_from(width)
            .with_context(|| format!("a {width} pixel wide world does not fit a texture"))?;
        let texture_height = u16::try_from(height)
            .with_context(|| format!("a {height} pixel tall world does not fit a texture"))?;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: i32::from(texture_width),
            window_height: i32::from(texture_height),
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        info!("opening a {width}x{height} window");
        macroquad::Window::from_config(config, async move {
            let pixels = usize::from(texture_width) * usize::from(texture_height);
            let blank = vec![u8::MAX; pixels * 4];
            let texture = Texture2D::from_rgba8(texture_width, texture_height, &blank);
            texture.set_filter(FilterMode::Nearest);
            let image_size = Vec2::new(f32::from(texture_width), f32::from(texture_height));
            let background = to_macroquad_color(LETTERBOX);
            let mut player = FramePlayer::default();
            let mut program_running = true;

            loop {
                if is_key_pressed(KeyCode::Escape) {
                    break;
                }

                let idle = feed.is_empty() && !player.is_holding();
                if program_running && idle && !feed.is_closing() {
                    program_running = advance();
                }

                let dt_seconds = macroquad::time::get_frame_time();
                let elapsed = Duration::from_secs_f32(dt_seconds.max(0.0));
                if let Some(frame) = player.tick(&feed, elapsed) {
                    texture.update(&Image {
                        bytes: frame.rgba,
                        width: texture_width,
                        height: texture_height,
                    });
                }

                macroquad::window::clear_background(background);
                let screen = Vec2::new(
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                let (offset, size) = letterbox(image_size, screen);
                draw_texture_ex(
                    texture,
                    offset.x,
                    offset.y,
                    macroquad::color::WHITE,
                    DrawTextureParams {
                        dest_size: Some(MacroquadVec2::new(size.x, size.y)),
                        ..DrawTextureParams::default()
                    },
                );

                macroquad::window::next_frame().await;
            }
        });

        debug!("window closed");
        Ok(())
    }
}

/// Largest placement of an image inside the screen that keeps its aspect
/// ratio, centred. Returns the top-left offset and the drawn size.
fn letterbox(image: Vec2, screen: Vec2) -> (Vec2, Vec2) {
    let scale = (screen / image).min_element().max(0.0);
    let size = image * scale;
    ((screen - size) / 2.0, size)
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
