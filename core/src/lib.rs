#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Karel simulator.
//!
//! This crate defines the message surface that connects the façade, the
//! authoritative world, and the presentation adapters. The simulator submits
//! [`Command`] values describing the student's actions, the world executes
//! those commands via its `apply` entry point, and then reports [`Event`]
//! values that adapters consume to render frames and write snapshots.
//! Adapters never mutate the world; they only read it through queries.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width and height of the world created when no world file is loaded.
pub const DEFAULT_WORLD_DIMENSION: u32 = 10;

/// Largest beeper count a world file may place on a single cell or in the bag.
pub const MAX_BEEPERS: u32 = 1_000_000;

/// Smallest animation speed multiplier accepted by the simulator.
pub const MIN_SPEED: f64 = 0.1;

/// Cardinal directions the robot may face.
///
/// Orientations are ordered cyclically clockwise: North, East, South, West.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    /// Toward the top of the grid (increasing user `y`).
    North,
    /// Toward the right of the grid (increasing user `x`).
    East,
    /// Toward the bottom of the grid (decreasing user `y`).
    South,
    /// Toward the left of the grid (decreasing user `x`).
    West,
}

impl Orientation {
    /// Every orientation in clockwise order starting at North.
    pub const ALL: [Orientation; 4] = [
        Orientation::North,
        Orientation::East,
        Orientation::South,
        Orientation::West,
    ];

    const fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    const fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Orientation reached by rotating a quarter turn counter-clockwise.
    #[must_use]
    pub const fn turned_left(self) -> Self {
        // Adding three instead of subtracting one keeps the index non-negative.
        Self::from_index(self.index() + Self::ALL.len() - 1)
    }

    /// Orientation reached by rotating a quarter turn clockwise.
    #[must_use]
    pub const fn turned_right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Orientation pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Lower-case name used by world files and messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when text does not name a cardinal direction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown direction `{0}`, expected north, east, south or west")]
pub struct ParseOrientationError(pub String);

impl FromStr for Orientation {
    type Err = ParseOrientationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|orientation| value.eq_ignore_ascii_case(orientation.name()))
            .ok_or_else(|| ParseOrientationError(value.to_owned()))
    }
}

/// Location of a single grid cell in internal coordinates.
///
/// Column zero is the left-most column and row zero is the top row, so rows
/// grow downward. World files and every externally visible getter use user
/// coordinates instead; see [`CellCoord::from_user`] and [`CellCoord::to_user`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell, counted from the top.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Converts 1-based, y-up user coordinates into internal coordinates.
    ///
    /// Returns `None` when the user coordinate lies outside a grid of the
    /// provided dimensions.
    #[must_use]
    pub fn from_user(x: u32, y: u32, columns: u32, rows: u32) -> Option<Self> {
        if x == 0 || y == 0 || x > columns || y > rows {
            return None;
        }
        Some(Self::new(x - 1, rows - y))
    }

    /// Converts the coordinate into 1-based, y-up user coordinates.
    #[must_use]
    pub const fn to_user(self, rows: u32) -> (u32, u32) {
        (self.column + 1, rows - self.row)
    }

    /// Cell adjacent to this one in the provided direction.
    ///
    /// Returns `None` when the neighbour would fall off a grid of the
    /// provided dimensions.
    #[must_use]
    pub fn neighbor(self, orientation: Orientation, columns: u32, rows: u32) -> Option<Self> {
        let (column, row) = match orientation {
            Orientation::North => (Some(self.column), self.row.checked_sub(1)),
            Orientation::East => (self.column.checked_add(1), Some(self.row)),
            Orientation::South => (Some(self.column), self.row.checked_add(1)),
            Orientation::West => (self.column.checked_sub(1), Some(self.row)),
        };
        let (column, row) = (column?, row?);
        (column < columns && row < rows).then_some(Self::new(column, row))
    }
}

/// Robot position and facing expressed in user coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionAndOrientation {
    /// 1-based column, where 1 is the left-most cell.
    pub x: u32,
    /// 1-based row, where 1 is the bottom cell.
    pub y: u32,
    /// Direction the robot faces.
    pub orientation: Orientation,
}

impl PositionAndOrientation {
    /// Creates a new position descriptor.
    #[must_use]
    pub const fn new(x: u32, y: u32, orientation: Orientation) -> Self {
        Self { x, y, orientation }
    }
}

impl Default for PositionAndOrientation {
    fn default() -> Self {
        Self::new(1, 1, Orientation::East)
    }
}

/// One square of the grid: a beeper pile plus four independent wall flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    beepers: u32,
    north_wall: bool,
    east_wall: bool,
    south_wall: bool,
    west_wall: bool,
}

impl Cell {
    /// Number of beepers resting on the cell.
    #[must_use]
    pub const fn beepers(&self) -> u32 {
        self.beepers
    }

    /// Replaces the number of beepers resting on the cell.
    pub fn set_beepers(&mut self, beepers: u32) {
        self.beepers = beepers;
    }

    /// Reports whether the cell records a wall on the provided side.
    #[must_use]
    pub const fn has_wall(&self, side: Orientation) -> bool {
        match side {
            Orientation::North => self.north_wall,
            Orientation::East => self.east_wall,
            Orientation::South => self.south_wall,
            Orientation::West => self.west_wall,
        }
    }

    /// Records a wall on the provided side. Adding an existing wall is a no-op.
    pub fn add_wall(&mut self, side: Orientation) {
        *self.wall_mut(side) = true;
    }

    /// Removes the wall recorded on the provided side, if any.
    pub fn remove_wall(&mut self, side: Orientation) {
        *self.wall_mut(side) = false;
    }

    /// Reports whether the cell records a wall on its north side.
    #[must_use]
    pub const fn has_north_wall(&self) -> bool {
        self.north_wall
    }

    /// Reports whether the cell records a wall on its east side.
    #[must_use]
    pub const fn has_east_wall(&self) -> bool {
        self.east_wall
    }

    /// Reports whether the cell records a wall on its south side.
    #[must_use]
    pub const fn has_south_wall(&self) -> bool {
        self.south_wall
    }

    /// Reports whether the cell records a wall on its west side.
    #[must_use]
    pub const fn has_west_wall(&self) -> bool {
        self.west_wall
    }

    fn wall_mut(&mut self, side: Orientation) -> &mut bool {
        match side {
            Orientation::North => &mut self.north_wall,
            Orientation::East => &mut self.east_wall,
            Orientation::South => &mut self.south_wall,
            Orientation::West => &mut self.west_wall,
        }
    }
}

/// Beeper inventory carried by the robot.
///
/// The infinite bag is a saturating sentinel: putting a beeper never
/// decrements it and picking one never increments it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeeperBag {
    /// Unlimited supply of beepers.
    #[default]
    Infinite,
    /// Finite number of beepers.
    Finite(u32),
}

impl BeeperBag {
    /// Reports whether at least one beeper can be taken from the bag.
    #[must_use]
    pub const fn has_beepers(&self) -> bool {
        match self {
            Self::Infinite => true,
            Self::Finite(count) => *count > 0,
        }
    }

    /// Reports whether the bag is the infinite sentinel.
    #[must_use]
    pub const fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// Number of beepers in a finite bag, or `None` for the infinite sentinel.
    #[must_use]
    pub const fn count(&self) -> Option<u32> {
        match self {
            Self::Infinite => None,
            Self::Finite(count) => Some(*count),
        }
    }

    /// Bag after removing one beeper, or `None` when the bag is empty.
    #[must_use]
    pub fn taken(self) -> Option<Self> {
        match self {
            Self::Infinite => Some(Self::Infinite),
            Self::Finite(count) => count.checked_sub(1).map(Self::Finite),
        }
    }

    /// Bag after adding one beeper.
    #[must_use]
    pub fn returned(self) -> Self {
        match self {
            Self::Infinite => Self::Infinite,
            Self::Finite(count) => Self::Finite(count.saturating_add(1)),
        }
    }
}

impl fmt::Display for BeeperBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infinite => f.write_str("INFINITE"),
            Self::Finite(count) => write!(f, "{count}"),
        }
    }
}

/// Runtime errors that latch into the robot and finish the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum RobotError {
    /// A wall or the world edge blocks the cell to the north.
    #[error("Cannot move north")]
    CannotMoveNorth,
    /// A wall or the world edge blocks the cell to the east.
    #[error("Cannot move east")]
    CannotMoveEast,
    /// A wall or the world edge blocks the cell to the south.
    #[error("Cannot move south")]
    CannotMoveSouth,
    /// A wall or the world edge blocks the cell to the west.
    #[error("Cannot move west")]
    CannotMoveWest,
    /// The bag was empty when a beeper was put down.
    #[error("Cannot put beeper\n(No beepers in bag)")]
    CannotPutBeeper,
    /// The current cell had no beeper to pick up.
    #[error("Cannot pick beeper\n(No beepers present)")]
    CannotPickBeeper,
}

impl RobotError {
    /// Movement error raised when moving in the provided direction is blocked.
    #[must_use]
    pub const fn cannot_move(orientation: Orientation) -> Self {
        match orientation {
            Orientation::North => Self::CannotMoveNorth,
            Orientation::East => Self::CannotMoveEast,
            Orientation::South => Self::CannotMoveSouth,
            Orientation::West => Self::CannotMoveWest,
        }
    }
}

/// Commands that express every action a student program can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Advance one cell in the facing direction.
    Move,
    /// Rotate a quarter turn counter-clockwise.
    TurnLeft,
    /// Move a beeper from the bag onto the current cell.
    PutBeeper,
    /// Move a beeper from the current cell into the bag.
    PickBeeper,
    /// End the program; later commands are ignored.
    Finish,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Confirms that the robot advanced between two cells.
    RobotMoved {
        /// Cell the robot occupied before moving.
        from: CellCoord,
        /// Cell the robot occupies after moving.
        to: CellCoord,
    },
    /// Confirms that the robot turned to face a new direction.
    RobotTurned {
        /// Direction the robot faces after turning.
        orientation: Orientation,
    },
    /// Confirms that a beeper left the bag and landed on a cell.
    BeeperPut {
        /// Cell that received the beeper.
        cell: CellCoord,
        /// Beeper count on the cell after the action.
        beepers: u32,
    },
    /// Confirms that a beeper was lifted from a cell into the bag.
    BeeperPicked {
        /// Cell that lost the beeper.
        cell: CellCoord,
        /// Beeper count on the cell after the action.
        beepers: u32,
    },
    /// Reports that a command violated its precondition.
    ErrorRaised {
        /// Error latched into the robot.
        error: RobotError,
    },
    /// Announces that the robot entered its terminal state.
    Finished,
}
