#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Karel programs and validates world files.
//!
//! `karel run` plays the program in a macroquad window unless
//! `--no-graphics` is given, in which case it runs to completion without
//! drawing anything on screen.

mod script;

use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    rc::Rc,
};

use anyhow::{anyhow, Context, Result as AnyResult};
use clap::{Parser, Subcommand};
use karel::{Config, Simulator, SimulatorOptions};
use karel_core::{Command, Orientation};
use karel_rendering::WorldPainter;
use karel_rendering_macroquad::{MacroquadBackend, WindowCanvas};
use karel_world::{loader, query, World};

/// Karel the robot on the command line.
#[derive(Debug, Parser)]
#[command(name = "karel", version, about)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Runs a program script, one command per line.
    Run(RunArgs),
    /// Parses a world file and prints what it contains.
    Check {
        /// World file to validate.
        world: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Program script: move, turn_left, put_beeper, pick_beeper, finish.
    program: PathBuf,
    /// World file to start from instead of the default 10x10 world.
    #[arg(long)]
    world: Option<PathBuf>,
    /// TOML configuration for rendering and outputs.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Writes a CSV snapshot after every command.
    #[arg(long)]
    csv: bool,
    /// Waits for Enter before every command.
    #[arg(long)]
    prompt: bool,
    /// Runs without opening a window.
    #[arg(long)]
    no_graphics: bool,
    /// Saves the final frame as a BMP image.
    #[arg(long, value_name = "OUT.bmp")]
    snapshot: Option<PathBuf>,
}

/// Entry point for the Karel command-line interface.
fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = match cli.command {
        CliCommand::Run(args) => run(&args),
        CliCommand::Check { world } => check(&world),
    };
    match outcome {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &RunArgs) -> AnyResult<ExitCode> {
    let source = fs::read_to_string(&args.program)
        .with_context(|| format!("failed to read program {}", args.program.display()))?;
    let mut commands = script::parse(&source)
        .with_context(|| format!("invalid program {}", args.program.display()))?;
    if commands.last() != Some(&Command::Finish) {
        commands.push(Command::Finish);
    }

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.output.csv |= args.csv;
    config.output.prompt_before_action |= args.prompt;

    let world = match &args.world {
        Some(path) => loader::load(path)?,
        None => World::new(),
    };

    if args.no_graphics {
        let simulator = run_headless(world, config, commands);
        return conclude(args, &simulator);
    }
    let simulator = run_in_window(world, config, commands)?;
    let simulator = simulator.borrow();
    if !simulator.is_finished() {
        eprintln!("Warning: the window closed before the program finished");
    }
    conclude(args, &simulator)
}

fn run_headless(world: World, config: Config, commands: Vec<Command>) -> Simulator {
    let options = SimulatorOptions::headless().with_config(config);
    let mut simulator = Simulator::new(world, options);
    for command in commands {
        execute(&mut simulator, command);
    }
    simulator
}

/// Plays the program in a window, running the next command each time the
/// window has shown every frame of the previous one.
fn run_in_window(
    world: World,
    config: Config,
    commands: Vec<Command>,
) -> AnyResult<Rc<RefCell<Simulator>>> {
    let canvas = WorldPainter::for_world(config.render, &world)
        .canvas_size()
        .ok_or_else(|| anyhow!("the world is too large to draw"))
        .and_then(|(width, height)| Ok(WindowCanvas::new(width, height)?));
    let canvas = match canvas {
        Ok(canvas) => canvas,
        Err(error) => {
            eprintln!("Warning: {error:#}; running without a window");
            let simulator = run_headless(world, config, commands);
            return Ok(Rc::new(RefCell::new(simulator)));
        }
    };

    let feed = canvas.feed();
    let options = SimulatorOptions::new()
        .with_graphics(true)
        .with_config(config)
        .with_canvas(canvas);
    let simulator = Rc::new(RefCell::new(Simulator::new(world, options)));

    let driven = Rc::clone(&simulator);
    let mut pending = commands.into_iter();
    MacroquadBackend::new()
        .with_window_title("Karel")
        .with_vsync(true)
        .run(feed, move || match pending.next() {
            Some(command) => {
                execute(&mut driven.borrow_mut(), command);
                true
            }
            None => false,
        })
        .context("failed to show the world in a window")?;
    Ok(simulator)
}

fn execute(simulator: &mut Simulator, command: Command) {
    match command {
        Command::Move => simulator.move_forward(),
        Command::TurnLeft => simulator.turn_left(),
        Command::PutBeeper => simulator.put_beeper(),
        Command::PickBeeper => simulator.pick_beeper(),
        Command::Finish => simulator.finish(),
    }
}

/// Saves the requested snapshot and prints where Karel ended up.
fn conclude(args: &RunArgs, simulator: &Simulator) -> AnyResult<ExitCode> {
    if let Some(path) = &args.snapshot {
        simulator.save_world_bmp(path)?;
    }

    let position = simulator.position();
    println!(
        "Karel finished at ({}, {}) facing {} with {} beepers in bag",
        position.x,
        position.y,
        display_name(position.orientation),
        simulator.bag()
    );
    Ok(if simulator.error().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn check(path: &Path) -> AnyResult<ExitCode> {
    let world = loader::load(path)?;
    println!("{}: {}", path.display(), describe(&world));
    Ok(ExitCode::SUCCESS)
}

/// One-line summary of a freshly loaded world.
fn describe(world: &World) -> String {
    let position = query::position(world);
    let mut beepers = 0_u64;
    let mut walls = 0_usize;
    for (_, cell) in query::cells(world) {
        beepers += u64::from(cell.beepers());
        walls += Orientation::ALL
            .into_iter()
            .filter(|side| cell.has_wall(*side))
            .count();
    }
    format!(
        "{}x{} world, Karel at ({}, {}) facing {}, bag {}, {} beepers placed, {} wall sides, speed {}",
        query::width(world),
        query::height(world),
        position.x,
        position.y,
        display_name(position.orientation),
        query::bag(world),
        beepers,
        walls,
        query::speed(world)
    )
}

fn display_name(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::North => "North",
        Orientation::East => "East",
        Orientation::South => "South",
        Orientation::West => "West",
    }
}
