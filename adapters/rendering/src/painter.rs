use std::time::Duration;

use anyhow::Result as AnyResult;
use glam::Vec2;
use karel_core::{CellCoord, Orientation, RobotError, MIN_SPEED};
use karel_world::{query, World};

use crate::{Canvas, Color, RenderConfig};

// Sizes at the default scale of 50 pixels per cell.
const REFERENCE_CELL: f32 = 50.0;
const MARK_SIZE: f32 = 10.0;
const ROBOT_SIZE: f32 = 30.0;
const BEEPER_SIZE: f32 = 30.0;
const EYE_SIZE: f32 = 4.0;
const EYE_OFFSET: f32 = 2.0;
const LIMB_LENGTH: f32 = 6.0;
const LIMB_WIDTH: f32 = 5.0;
const WALL_THICKNESS: f32 = 3.0;
const FONT_SIZE: f32 = 16.0;
const ERROR_FONT_SIZE: f32 = 20.0;
const ERROR_TEXT_HALF_WIDTH: f32 = 125.0;
const HALO_OFFSET: f32 = 2.0;
const MIN_CANVAS_COLUMNS: u32 = 5;

const EYE_COLOR: Color = Color::from_rgb_u8(50, 50, 50);
const KAREL_COLOR: Color = Color::from_rgb_u8(125, 125, 125);
const MARK_COLOR: Color = Color::from_rgb_u8(150, 150, 255);
const INNER_BEEPER_COLOR: Color = Color::from_rgb_u8(172, 147, 194);
const LIMB_COLOR: Color = Color::from_rgb_u8(105, 105, 105);
const WALL_COLOR: Color = Color::from_rgb_u8(50, 50, 50);
const GRID_COLOR: Color = Color::from_rgb_u8(220, 220, 220);
const ERROR_COLOR: Color = Color::from_rgb_u8(173, 0, 35);

/// Draws Karel's world onto any [`Canvas`].
///
/// The painter is stateless apart from its configuration and the grid size it
/// was created for; every frame is derived from world queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldPainter {
    config: RenderConfig,
    columns: u32,
    rows: u32,
    scale: f32,
}

impl WorldPainter {
    /// Creates a painter for a grid of the provided size.
    #[must_use]
    pub fn new(config: RenderConfig, columns: u32, rows: u32) -> Self {
        Self {
            config,
            columns,
            rows,
            scale: config.pixels_per_cell as f32 / REFERENCE_CELL,
        }
    }

    /// Creates a painter sized for the provided world.
    #[must_use]
    pub fn for_world(config: RenderConfig, world: &World) -> Self {
        Self::new(config, query::width(world), query::height(world))
    }

    /// Renderer constants in use.
    #[must_use]
    pub const fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Canvas size in pixels needed to show the whole grid plus labels.
    ///
    /// Narrow worlds are padded to at least five columns so error messages fit.
    /// Returns `None` when either side does not fit in a `u32`.
    #[must_use]
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        let cell = u64::from(self.config.pixels_per_cell);
        let margin = u64::from(self.config.margin);
        let columns = u64::from(self.columns.max(MIN_CANVAS_COLUMNS));
        let width = u32::try_from(columns * cell + margin).ok()?;
        let height = u32::try_from(u64::from(self.rows) * cell + margin).ok()?;
        Some((width, height))
    }

    /// Pixel position of the centre of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        let size = self.cell_size();
        Vec2::new(
            cell.column() as f32 * size + size / 2.0,
            cell.row() as f32 * size + size / 2.0,
        )
    }

    /// Hold of a frame once the world's speed multiplier is applied.
    #[must_use]
    pub fn scaled_hold(base: Duration, speed: f64) -> Duration {
        let nanos = base.as_nanos() as f64 / speed.max(MIN_SPEED);
        Duration::from_nanos(nanos.round() as u64)
    }

    /// Draws the world with the robot resting at its cell.
    pub fn draw_frame(&self, canvas: &mut dyn Canvas, world: &World) {
        self.draw_world(canvas, world);
        let center = self.cell_center(query::robot_cell(world));
        self.draw_robot(canvas, center, query::orientation(world));
    }

    /// Animates the robot walking between two cells and holds the final frame.
    ///
    /// Draws `animation_steps` interpolated frames, each held for the short
    /// frame duration, followed by the resting frame held for the long one.
    pub fn animate_move(
        &self,
        canvas: &mut dyn Canvas,
        world: &World,
        from: CellCoord,
        to: CellCoord,
    ) -> AnyResult<()> {
        let speed = query::speed(world);
        let orientation = query::orientation(world);
        let start = self.cell_center(from);
        let end = self.cell_center(to);
        let steps = self.config.animation_steps;
        for step in 1..=steps {
            let fraction = step as f32 / steps as f32;
            self.draw_world(canvas, world);
            self.draw_robot(canvas, start.lerp(end, fraction), orientation);
            canvas.present(Self::scaled_hold(self.config.short_frame, speed))?;
        }
        self.draw_frame(canvas, world);
        canvas.present(Self::scaled_hold(self.config.long_frame, speed))
    }

    /// Draws the resting frame and holds it for the long frame duration.
    pub fn show_frame(&self, canvas: &mut dyn Canvas, world: &World) -> AnyResult<()> {
        self.draw_frame(canvas, world);
        canvas.present(Self::scaled_hold(self.config.long_frame, query::speed(world)))
    }

    /// Draws the grid, the axis labels and the contents of every cell.
    pub fn draw_world(&self, canvas: &mut dyn Canvas, world: &World) {
        canvas.clear(Color::WHITE);
        self.draw_grid(canvas);

        for (cell, contents) in query::cells(world) {
            let center = self.cell_center(cell);
            self.draw_mark(canvas, center);
            if contents.beepers() > 0 {
                self.draw_beepers(canvas, center, contents.beepers());
            }
            for side in Orientation::ALL {
                if contents.has_wall(side) {
                    self.draw_wall(canvas, cell, side);
                }
            }
        }
    }

    /// Draws the robot centred at an arbitrary pixel position.
    ///
    /// The eyes sit on the facing side and the limbs on the back side.
    pub fn draw_robot(&self, canvas: &mut dyn Canvas, center: Vec2, orientation: Orientation) {
        let robot = ROBOT_SIZE * self.scale;
        let eye = EYE_SIZE * self.scale;
        let eye_offset = EYE_OFFSET * self.scale;
        let limb = LIMB_LENGTH * self.scale;

        canvas.draw_rectangle(center - Vec2::splat(robot / 2.0), Vec2::splat(robot), KAREL_COLOR);

        let forward = screen_direction(orientation);
        let eye_reach = robot / 2.0 - eye / 2.0;
        canvas.draw_circle(center + forward * (eye_reach - eye_offset), eye, Color::WHITE);
        canvas.draw_circle(center - forward * eye_offset, eye, Color::WHITE);
        canvas.draw_circle(center + forward * eye_reach, eye, EYE_COLOR);

        let back = -forward;
        let across = forward.perp();
        for side in [-1.0, 1.0] {
            let root = center + back * (robot / 2.0) + across * (side * limb);
            canvas.draw_line(root, root + back * limb, LIMB_WIDTH * self.scale, LIMB_COLOR);
        }

        canvas.draw_circle(center, eye, EYE_COLOR);
    }

    /// Overlays a robot error at the centre of the canvas with a white halo.
    pub fn draw_error(&self, canvas: &mut dyn Canvas, error: RobotError) {
        let message = format!("Error: {error}");
        let font_size = ERROR_FONT_SIZE * self.scale;
        let x = (canvas.width() as f32 / 2.0 - ERROR_TEXT_HALF_WIDTH * self.scale).max(HALO_OFFSET);
        let y = canvas.height() as f32 / 2.0 - font_size / 2.0;
        let origin = Vec2::new(x, y);

        for offset in [
            Vec2::new(-HALO_OFFSET, -HALO_OFFSET),
            Vec2::new(HALO_OFFSET, -HALO_OFFSET),
            Vec2::new(-HALO_OFFSET, HALO_OFFSET),
            Vec2::new(HALO_OFFSET, HALO_OFFSET),
        ] {
            canvas.draw_text(origin + offset, &message, font_size, Color::WHITE);
        }
        canvas.draw_text(origin, &message, font_size, ERROR_COLOR);
    }

    fn cell_size(&self) -> f32 {
        self.config.pixels_per_cell as f32
    }

    fn draw_grid(&self, canvas: &mut dyn Canvas) {
        let size = self.cell_size();
        let font_size = FONT_SIZE * self.scale;
        let thickness = WALL_THICKNESS * self.scale;
        let right = self.columns as f32 * size - 1.0;
        let bottom = self.rows as f32 * size - 1.0;

        for row in 0..=self.rows {
            let y = row as f32 * size;
            canvas.draw_line(Vec2::new(0.0, y), Vec2::new(right, y), thickness, GRID_COLOR);
            if row < self.rows {
                let label = (self.rows - row).to_string();
                let position = Vec2::new(right + font_size / 2.0, y + (size - font_size) / 2.0);
                canvas.draw_text(position, &label, font_size, WALL_COLOR);
            }
        }

        for column in 0..=self.columns {
            let x = column as f32 * size;
            canvas.draw_line(Vec2::new(x, 0.0), Vec2::new(x, bottom), thickness, GRID_COLOR);
            if column < self.columns {
                let label = (column + 1).to_string();
                let position = Vec2::new(x + (size - font_size) / 2.0, bottom + font_size / 2.0);
                canvas.draw_text(position, &label, font_size, WALL_COLOR);
            }
        }
    }

    fn draw_mark(&self, canvas: &mut dyn Canvas, center: Vec2) {
        let half = MARK_SIZE * self.scale / 2.0;
        let thickness = WALL_THICKNESS * self.scale;
        canvas.draw_line(
            center - Vec2::new(half, 0.0),
            center + Vec2::new(half, 0.0),
            thickness,
            MARK_COLOR,
        );
        canvas.draw_line(
            center - Vec2::new(0.0, half),
            center + Vec2::new(0.0, half),
            thickness,
            MARK_COLOR,
        );
    }

    /// Beepers are diamonds: a thick diagonal line whose square cap is
    /// rotated by 45 degrees.
    fn draw_beepers(&self, canvas: &mut dyn Canvas, center: Vec2, beepers: u32) {
        let outer = BEEPER_SIZE * self.scale;
        let inner = outer - 2.0 * WALL_THICKNESS * self.scale;
        for (size, color) in [(outer, WALL_COLOR), (inner, INNER_BEEPER_COLOR)] {
            let reach = Vec2::splat((size / 2.0) / std::f32::consts::SQRT_2);
            canvas.draw_line(center - reach, center + reach, size, color);
        }

        if beepers > 1 {
            let font_size = FONT_SIZE * self.scale;
            let label = beepers.to_string();
            let half_width = label.len() as f32 * font_size * 0.3;
            let position = center - Vec2::new(half_width, font_size / 2.0);
            canvas.draw_text(position, &label, font_size, WALL_COLOR);
        }
    }

    fn draw_wall(&self, canvas: &mut dyn Canvas, cell: CellCoord, side: Orientation) {
        let size = self.cell_size();
        let left = cell.column() as f32 * size;
        let top = cell.row() as f32 * size;
        let right = left + size - 1.0;
        let bottom = top + size - 1.0;
        let (from, to) = match side {
            Orientation::North => (Vec2::new(left, top), Vec2::new(right, top)),
            Orientation::South => (Vec2::new(left, bottom), Vec2::new(right, bottom)),
            Orientation::West => (Vec2::new(left, top), Vec2::new(left, bottom)),
            Orientation::East => (Vec2::new(right, top), Vec2::new(right, bottom)),
        };
        canvas.draw_line(from, to, WALL_THICKNESS * self.scale, WALL_COLOR);
    }
}

/// Unit vector pointing toward `orientation` in screen space, where `y` grows
/// downward.
fn screen_direction(orientation: Orientation) -> Vec2 {
    match orientation {
        Orientation::North => Vec2::new(0.0, -1.0),
        Orientation::East => Vec2::new(1.0, 0.0),
        Orientation::South => Vec2::new(0.0, 1.0),
        Orientation::West => Vec2::new(-1.0, 0.0),
    }
}
