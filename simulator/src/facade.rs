//! Student-facing free functions bound to a per-thread [`Simulator`].
//!
//! The simulator is created lazily. [`load_world`] must be the first call to
//! pick a world; any other call made first creates the default 10x10 world,
//! after which [`load_world`] is ignored. Each thread owns its own simulator,
//! so tests running on separate threads never observe each other.

use std::{cell::RefCell, path::Path, process};

use log::debug;

use crate::{Simulator, SimulatorOptions, WorldFileError};

thread_local! {
    static SIMULATOR: RefCell<Option<Simulator>> = const { RefCell::new(None) };
    static PENDING_OPTIONS: RefCell<Option<SimulatorOptions>> = const { RefCell::new(None) };
}

/// Sets the options used when the simulator is created.
///
/// Ignored once the simulator exists.
pub fn configure(options: SimulatorOptions) {
    if is_initialized() {
        debug!("ignoring configure: simulator already initialised");
        return;
    }
    PENDING_OPTIONS.with(|pending| *pending.borrow_mut() = Some(options));
}

/// Reports whether the simulator has been created on this thread.
#[must_use]
pub fn is_initialized() -> bool {
    SIMULATOR.with(|simulator| simulator.borrow().is_some())
}

/// Drops the simulator and any pending options so the next call starts from
/// scratch.
pub fn reset() {
    SIMULATOR.with(|simulator| *simulator.borrow_mut() = None);
    PENDING_OPTIONS.with(|pending| *pending.borrow_mut() = None);
}

/// Loads the world the program runs in.
///
/// Prints the error and exits with status 1 when the file is rejected.
pub fn load_world(path: impl AsRef<Path>) {
    if let Err(error) = try_load_world(path) {
        eprintln!("{error}");
        process::exit(1);
    }
}

/// Loads the world the program runs in, returning load failures.
///
/// Once the simulator exists this is a no-op that returns `Ok`.
pub fn try_load_world(path: impl AsRef<Path>) -> Result<(), WorldFileError> {
    let path = path.as_ref();
    if is_initialized() {
        debug!("ignoring load of {}: world already initialised", path.display());
        return Ok(());
    }
    let simulator = Simulator::load(path, take_options())?;
    SIMULATOR.with(|slot| *slot.borrow_mut() = Some(simulator));
    Ok(())
}

/// Runs `action` with read access to the simulator, creating it if needed.
///
/// Predicates may be called from inside `action`; commands may not.
pub fn with_simulator<R>(action: impl FnOnce(&Simulator) -> R) -> R {
    ensure_initialized();
    SIMULATOR.with(|slot| match slot.borrow().as_ref() {
        Some(simulator) => action(simulator),
        None => unreachable!("simulator initialised above"),
    })
}

fn with_simulator_mut<R>(action: impl FnOnce(&mut Simulator) -> R) -> R {
    ensure_initialized();
    SIMULATOR.with(|slot| match slot.borrow_mut().as_mut() {
        Some(simulator) => action(simulator),
        None => unreachable!("simulator initialised above"),
    })
}

fn ensure_initialized() {
    if is_initialized() {
        return;
    }
    let simulator = Simulator::with_default_world(take_options());
    SIMULATOR.with(|slot| *slot.borrow_mut() = Some(simulator));
}

fn take_options() -> SimulatorOptions {
    PENDING_OPTIONS
        .with(|pending| pending.borrow_mut().take())
        .unwrap_or_default()
}

/// Moves one cell forward.
pub fn move_forward() {
    with_simulator_mut(Simulator::move_forward);
}

/// Turns a quarter turn counter-clockwise.
pub fn turn_left() {
    with_simulator_mut(Simulator::turn_left);
}

/// Puts a beeper from the bag onto the current cell.
pub fn put_beeper() {
    with_simulator_mut(Simulator::put_beeper);
}

/// Picks a beeper from the current cell into the bag.
pub fn pick_beeper() {
    with_simulator_mut(Simulator::pick_beeper);
}

/// Ends the program.
pub fn finish() {
    with_simulator_mut(Simulator::finish);
}

/// Writes a CSV snapshot after every command and prompts before each one.
pub fn enable_csv_output() {
    with_simulator_mut(Simulator::enable_csv_output);
}

/// Waits for Enter before every command.
pub fn enable_prompt_before_action() {
    with_simulator_mut(Simulator::enable_prompt_before_action);
}

macro_rules! predicates {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $name() -> bool {
                with_simulator(Simulator::$name)
            }
        )*
    };
}

predicates! {
    /// Reports whether nothing blocks the cell in front of the robot.
    front_is_clear;
    /// Reports whether something blocks the cell in front of the robot.
    front_is_blocked;
    /// Reports whether nothing blocks the cell to the robot's left.
    left_is_clear;
    /// Reports whether something blocks the cell to the robot's left.
    left_is_blocked;
    /// Reports whether nothing blocks the cell to the robot's right.
    right_is_clear;
    /// Reports whether something blocks the cell to the robot's right.
    right_is_blocked;
    /// Reports whether the robot carries at least one beeper.
    has_beepers_in_bag;
    /// Reports whether the robot's bag is empty.
    no_beepers_in_bag;
    /// Reports whether the robot stands on at least one beeper.
    beepers_present;
    /// Reports whether the robot's cell has no beepers.
    no_beepers_present;
    /// Reports whether the robot faces north.
    facing_north;
    /// Reports whether the robot faces another direction than north.
    not_facing_north;
    /// Reports whether the robot faces east.
    facing_east;
    /// Reports whether the robot faces another direction than east.
    not_facing_east;
    /// Reports whether the robot faces south.
    facing_south;
    /// Reports whether the robot faces another direction than south.
    not_facing_south;
    /// Reports whether the robot faces west.
    facing_west;
    /// Reports whether the robot faces another direction than west.
    not_facing_west;
}
