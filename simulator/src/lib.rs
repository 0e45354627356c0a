#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Karel the robot: a grid-world simulator for teaching programming.
//!
//! Student programs drive the robot through the free functions in
//! [`facade`], which bind to a lazily created [`Simulator`]. The simulator
//! forwards each action to the authoritative world, then presents the
//! resulting events: it draws frames on a canvas, writes CSV snapshots and
//! reports errors on standard error.
//!
//! The default canvas renders off screen, which keeps the final frame
//! available as a BMP snapshot. The `karel run` command plays the frames in
//! a window.
//!
//! ```no_run
//! use karel::facade::*;
//!
//! load_world("worlds/collect.w");
//! while front_is_clear() {
//!     move_forward();
//!     if beepers_present() {
//!         pick_beeper();
//!     }
//! }
//! finish();
//! ```

pub mod config;
pub mod facade;

pub use config::{Config, ConfigError, OutputConfig};
pub use karel_core::{BeeperBag, Cell, Orientation, PositionAndOrientation, RobotError};
pub use karel_world::loader::{WorldFileError, WorldFileErrorKind};

use std::{
    fmt,
    io::{self, BufRead, BufReader, Write},
    path::Path,
};

use anyhow::{Context, Result as AnyResult};
use karel_core::{Command, Event};
use karel_rendering::{Canvas, NullCanvas, WorldPainter};
use karel_rendering_raster::RasterCanvas;
use karel_system_csv::CsvSnapshot;
use karel_world::{self as world, loader, query, World};
use log::{debug, info, warn};

/// Options applied when a [`Simulator`] is created.
pub struct SimulatorOptions {
    graphics: bool,
    config: Config,
    canvas: Option<Box<dyn Canvas>>,
    prompt_input: Option<Box<dyn BufRead>>,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self {
            graphics: false,
            config: Config::default(),
            canvas: None,
            prompt_input: None,
        }
    }
}

impl fmt::Debug for SimulatorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatorOptions")
            .field("graphics", &self.graphics)
            .field("config", &self.config)
            .field("custom_canvas", &self.canvas.is_some())
            .field("custom_prompt_input", &self.prompt_input.is_some())
            .finish()
    }
}

impl SimulatorOptions {
    /// Returns headless options with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns options for running without a viewer: no animation frames,
    /// no holds and no waiting at the end.
    #[must_use]
    pub fn headless() -> Self {
        Self::default().with_graphics(false)
    }

    /// Configures whether moves are animated and every frame is presented
    /// with its hold.
    ///
    /// Presenting only shows something on a canvas that displays frames,
    /// such as the window canvas `karel run` opens; the default canvas
    /// renders off screen. With graphics disabled the final frame is still
    /// drawn, so BMP snapshots remain available.
    #[must_use]
    pub fn with_graphics(mut self, enabled: bool) -> Self {
        self.graphics = enabled;
        self
    }

    /// Replaces the renderer and output configuration.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Draws onto the provided canvas instead of an off-screen raster canvas.
    #[must_use]
    pub fn with_canvas(mut self, canvas: impl Canvas + 'static) -> Self {
        self.canvas = Some(Box::new(canvas));
        self
    }

    /// Reads prompt-before-action confirmations from the provided input
    /// instead of standard input.
    #[must_use]
    pub fn with_prompt_input(mut self, input: impl BufRead + 'static) -> Self {
        self.prompt_input = Some(Box::new(input));
        self
    }
}

/// Orchestrates the world, the renderer and the accessibility outputs.
pub struct Simulator {
    world: World,
    painter: WorldPainter,
    canvas: Box<dyn Canvas>,
    graphics: bool,
    csv: CsvSnapshot,
    csv_enabled: bool,
    prompt_before_action: bool,
    prompt_input: Box<dyn BufRead>,
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("world", &self.world)
            .field("graphics", &self.graphics)
            .field("csv", &self.csv)
            .field("csv_enabled", &self.csv_enabled)
            .field("prompt_before_action", &self.prompt_before_action)
            .finish_non_exhaustive()
    }
}

impl Simulator {
    /// Creates a simulator around an existing world and draws the first frame.
    #[must_use]
    pub fn new(world: World, options: SimulatorOptions) -> Self {
        let SimulatorOptions {
            graphics,
            config,
            canvas,
            prompt_input,
        } = options;
        let painter = WorldPainter::for_world(config.render, &world);
        let canvas = canvas.unwrap_or_else(|| default_canvas(&painter));
        let prompt_input =
            prompt_input.unwrap_or_else(|| Box::new(BufReader::new(io::stdin())));

        let mut simulator = Self {
            world,
            painter,
            canvas,
            graphics,
            csv: CsvSnapshot::new(config.output.csv_path),
            csv_enabled: config.output.csv,
            prompt_before_action: config.output.prompt_before_action || config.output.csv,
            prompt_input,
        };
        simulator.report(Simulator::show_initial_frame);
        simulator
    }

    /// Creates a simulator with the default 10x10 world.
    #[must_use]
    pub fn with_default_world(options: SimulatorOptions) -> Self {
        Self::new(World::new(), options)
    }

    /// Loads a world file and creates a simulator around it.
    ///
    /// Nothing is drawn when the file is rejected.
    pub fn load(path: impl AsRef<Path>, options: SimulatorOptions) -> Result<Self, WorldFileError> {
        let world = loader::load(path)?;
        Ok(Self::new(world, options))
    }

    /// Moves one cell forward.
    pub fn move_forward(&mut self) {
        self.execute(Command::Move);
    }

    /// Turns a quarter turn counter-clockwise.
    pub fn turn_left(&mut self) {
        self.execute(Command::TurnLeft);
    }

    /// Puts a beeper from the bag onto the current cell.
    pub fn put_beeper(&mut self) {
        self.execute(Command::PutBeeper);
    }

    /// Picks a beeper from the current cell into the bag.
    pub fn pick_beeper(&mut self) {
        self.execute(Command::PickBeeper);
    }

    /// Ends the program. Later commands are ignored.
    pub fn finish(&mut self) {
        self.execute(Command::Finish);
    }

    /// Writes a CSV snapshot after every command and prompts before each one.
    pub fn enable_csv_output(&mut self) {
        self.csv_enabled = true;
        self.prompt_before_action = true;
        if !query::is_finished(&self.world) {
            self.report(Simulator::write_csv);
        }
    }

    /// Waits for a line on the prompt input before every command.
    pub fn enable_prompt_before_action(&mut self) {
        self.prompt_before_action = true;
    }

    /// Saves the current frame as a BMP image.
    pub fn save_world_bmp(&self, path: impl AsRef<Path>) -> AnyResult<()> {
        let path = path.as_ref();
        self.canvas
            .save_bmp(path)
            .with_context(|| format!("failed to save the world to {}", path.display()))
    }

    /// Reports whether nothing blocks the cell in front of the robot.
    #[must_use]
    pub fn front_is_clear(&self) -> bool {
        query::front_is_clear(&self.world)
    }

    /// Negation of [`Simulator::front_is_clear`].
    #[must_use]
    pub fn front_is_blocked(&self) -> bool {
        !self.front_is_clear()
    }

    /// Reports whether nothing blocks the cell to the robot's left.
    #[must_use]
    pub fn left_is_clear(&self) -> bool {
        query::left_is_clear(&self.world)
    }

    /// Negation of [`Simulator::left_is_clear`].
    #[must_use]
    pub fn left_is_blocked(&self) -> bool {
        !self.left_is_clear()
    }

    /// Reports whether nothing blocks the cell to the robot's right.
    #[must_use]
    pub fn right_is_clear(&self) -> bool {
        query::right_is_clear(&self.world)
    }

    /// Negation of [`Simulator::right_is_clear`].
    #[must_use]
    pub fn right_is_blocked(&self) -> bool {
        !self.right_is_clear()
    }

    /// Reports whether the robot carries at least one beeper.
    #[must_use]
    pub fn has_beepers_in_bag(&self) -> bool {
        query::has_beepers_in_bag(&self.world)
    }

    /// Negation of [`Simulator::has_beepers_in_bag`].
    #[must_use]
    pub fn no_beepers_in_bag(&self) -> bool {
        !self.has_beepers_in_bag()
    }

    /// Reports whether the robot stands on at least one beeper.
    #[must_use]
    pub fn beepers_present(&self) -> bool {
        query::beepers_present(&self.world)
    }

    /// Negation of [`Simulator::beepers_present`].
    #[must_use]
    pub fn no_beepers_present(&self) -> bool {
        !self.beepers_present()
    }

    /// Reports whether the robot faces north.
    #[must_use]
    pub fn facing_north(&self) -> bool {
        query::facing(&self.world, Orientation::North)
    }

    /// Negation of [`Simulator::facing_north`].
    #[must_use]
    pub fn not_facing_north(&self) -> bool {
        !self.facing_north()
    }

    /// Reports whether the robot faces east.
    #[must_use]
    pub fn facing_east(&self) -> bool {
        query::facing(&self.world, Orientation::East)
    }

    /// Negation of [`Simulator::facing_east`].
    #[must_use]
    pub fn not_facing_east(&self) -> bool {
        !self.facing_east()
    }

    /// Reports whether the robot faces south.
    #[must_use]
    pub fn facing_south(&self) -> bool {
        query::facing(&self.world, Orientation::South)
    }

    /// Negation of [`Simulator::facing_south`].
    #[must_use]
    pub fn not_facing_south(&self) -> bool {
        !self.facing_south()
    }

    /// Reports whether the robot faces west.
    #[must_use]
    pub fn facing_west(&self) -> bool {
        query::facing(&self.world, Orientation::West)
    }

    /// Negation of [`Simulator::facing_west`].
    #[must_use]
    pub fn not_facing_west(&self) -> bool {
        !self.facing_west()
    }

    /// Authoritative world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Canvas frames are drawn onto.
    #[must_use]
    pub fn canvas(&self) -> &dyn Canvas {
        self.canvas.as_ref()
    }

    /// Number of columns in the grid.
    #[must_use]
    pub fn width(&self) -> u32 {
        query::width(&self.world)
    }

    /// Number of rows in the grid.
    #[must_use]
    pub fn height(&self) -> u32 {
        query::height(&self.world)
    }

    /// Robot column, where 1 is the left-most column.
    #[must_use]
    pub fn x(&self) -> u32 {
        self.position().x
    }

    /// Robot row, where 1 is the bottom row.
    #[must_use]
    pub fn y(&self) -> u32 {
        self.position().y
    }

    /// Direction the robot faces.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        query::orientation(&self.world)
    }

    /// Robot position in user coordinates together with its facing.
    #[must_use]
    pub fn position(&self) -> PositionAndOrientation {
        query::position(&self.world)
    }

    /// Beeper inventory carried by the robot.
    #[must_use]
    pub fn bag(&self) -> BeeperBag {
        query::bag(&self.world)
    }

    /// Cell at user coordinates, where (1, 1) is the bottom-left.
    #[must_use]
    pub fn cell(&self, x: u32, y: u32) -> Option<&Cell> {
        query::cell_at(&self.world, x, y)
    }

    /// Error latched into the robot, if any.
    #[must_use]
    pub fn error(&self) -> Option<RobotError> {
        query::error(&self.world)
    }

    /// Reports whether the program finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        query::is_finished(&self.world)
    }

    /// Animation speed multiplier.
    #[must_use]
    pub fn speed(&self) -> f64 {
        query::speed(&self.world)
    }

    /// Destination of CSV snapshots.
    #[must_use]
    pub fn csv_path(&self) -> &Path {
        self.csv.path()
    }

    /// Reports whether CSV snapshots are written.
    #[must_use]
    pub fn is_csv_enabled(&self) -> bool {
        self.csv_enabled
    }

    /// Reports whether commands wait for confirmation.
    #[must_use]
    pub fn is_prompt_enabled(&self) -> bool {
        self.prompt_before_action
    }

    /// Reports whether moves are animated and every frame is presented with
    /// its hold.
    #[must_use]
    pub fn is_graphics_enabled(&self) -> bool {
        self.graphics
    }

    fn execute(&mut self, command: Command) {
        if query::is_finished(&self.world) {
            debug!("ignoring {command:?}: program already finished");
            return;
        }
        if self.prompt_before_action {
            self.wait_for_confirmation(command);
        }

        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        for event in events {
            self.report(|simulator| simulator.present(event));
        }
    }

    fn present(&mut self, event: Event) -> AnyResult<()> {
        match event {
            Event::RobotMoved { from, to } => {
                if self.graphics {
                    self.painter
                        .animate_move(self.canvas.as_mut(), &self.world, from, to)?;
                } else {
                    self.painter.draw_frame(self.canvas.as_mut(), &self.world);
                }
                self.after_long_frame()
            }
            Event::RobotTurned { .. } | Event::BeeperPut { .. } | Event::BeeperPicked { .. } => {
                self.show_frame()?;
                self.after_long_frame()
            }
            Event::ErrorRaised { error } => {
                eprintln!("Error: {error}");
                self.painter.draw_error(self.canvas.as_mut(), error);
                if self.graphics {
                    let hold = WorldPainter::scaled_hold(
                        self.painter.config().long_frame,
                        query::speed(&self.world),
                    );
                    self.canvas.present(hold)?;
                }
                Ok(())
            }
            Event::Finished => {
                info!("program finished");
                if self.csv_enabled {
                    self.write_csv()?;
                }
                if self.graphics {
                    self.canvas.show_until_closed()?;
                }
                Ok(())
            }
        }
    }

    fn show_initial_frame(&mut self) -> AnyResult<()> {
        self.show_frame()?;
        self.after_long_frame()
    }

    fn show_frame(&mut self) -> AnyResult<()> {
        if self.graphics {
            self.painter.show_frame(self.canvas.as_mut(), &self.world)
        } else {
            self.painter.draw_frame(self.canvas.as_mut(), &self.world);
            Ok(())
        }
    }

    fn after_long_frame(&mut self) -> AnyResult<()> {
        if self.csv_enabled && !query::is_finished(&self.world) {
            self.write_csv()?;
        }
        Ok(())
    }

    fn write_csv(&mut self) -> AnyResult<()> {
        self.csv.write(&self.world).with_context(|| {
            format!("failed to write CSV snapshot to {}", self.csv.path().display())
        })
    }

    fn wait_for_confirmation(&mut self, command: Command) {
        print!("Press Enter to {}: ", command_label(command));
        if let Err(error) = io::stdout().flush() {
            warn!("could not show the confirmation prompt: {error}");
        }
        let mut line = String::new();
        if let Err(error) = self.prompt_input.read_line(&mut line) {
            warn!("could not read confirmation: {error}");
        }
    }

    /// Runs a presentation step, reporting failures without stopping the
    /// program.
    fn report(&mut self, step: impl FnOnce(&mut Self) -> AnyResult<()>) {
        if let Err(error) = step(self) {
            warn!("{error:#}");
            eprintln!("Warning: {error:#}");
        }
    }
}

fn default_canvas(painter: &WorldPainter) -> Box<dyn Canvas> {
    let Some((width, height)) = painter.canvas_size() else {
        warn!("drawing disabled: the canvas size does not fit in 32 bits");
        return Box::new(NullCanvas::default());
    };
    match RasterCanvas::new(width, height) {
        Ok(canvas) => Box::new(canvas),
        Err(error) => {
            warn!("drawing disabled: {error}");
            Box::new(NullCanvas::new(width, height))
        }
    }
}

fn command_label(command: Command) -> &'static str {
    match command {
        Command::Move => "move",
        Command::TurnLeft => "turn left",
        Command::PutBeeper => "put a beeper",
        Command::PickBeeper => "pick a beeper",
        Command::Finish => "finish",
    }
}
