#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the Karel simulator.
//!
//! The [`World`] owns the grid of cells and the robot standing on it. All
//! mutation happens through [`apply`], which validates each command against
//! the current state, transitions it, and reports the outcome as events.
//! Read access goes through the [`query`] module.

pub mod loader;

use karel_core::{
    BeeperBag, Cell, CellCoord, Command, Event, Orientation, RobotError,
    DEFAULT_WORLD_DIMENSION,
};
use log::{debug, warn};

/// Represents the authoritative Karel world: a grid of cells plus the robot.
#[derive(Clone, Debug, PartialEq)]
pub struct World {
    columns: u32,
    rows: u32,
    cells: Vec<Cell>,
    robot: Robot,
}

#[derive(Clone, Debug, PartialEq)]
struct Robot {
    cell: CellCoord,
    orientation: Orientation,
    bag: BeeperBag,
    error: Option<RobotError>,
    finished: bool,
    speed: f64,
}

impl World {
    /// Creates the default world: an empty 10x10 grid with the robot at user
    /// coordinates (1, 1) facing East and carrying an infinite bag.
    #[must_use]
    pub fn new() -> Self {
        Self::empty(DEFAULT_WORLD_DIMENSION, DEFAULT_WORLD_DIMENSION)
    }

    /// Allocates an empty grid with the robot in the default bottom-left spot.
    ///
    /// Callers guarantee both dimensions are at least one.
    pub(crate) fn empty(columns: u32, rows: u32) -> Self {
        debug_assert!(columns >= 1 && rows >= 1, "world needs at least one cell");
        let capacity = columns as usize * rows as usize;
        Self {
            columns,
            rows,
            cells: vec![Cell::default(); capacity],
            robot: Robot {
                cell: CellCoord::new(0, rows - 1),
                orientation: Orientation::East,
                bag: BeeperBag::Infinite,
                error: None,
                finished: false,
                speed: 1.0,
            },
        }
    }

    pub(crate) fn place_robot(&mut self, cell: CellCoord, orientation: Orientation) {
        self.robot.cell = cell;
        self.robot.orientation = orientation;
    }

    pub(crate) fn set_bag(&mut self, bag: BeeperBag) {
        self.robot.bag = bag;
    }

    pub(crate) fn set_speed(&mut self, speed: f64) {
        self.robot.speed = speed;
    }

    /// Mutable access to a cell, used while loading world files and by tests
    /// that need to rearrange walls.
    ///
    /// Returns `None` when the coordinate lies outside the grid.
    pub fn cell_mut(&mut self, cell: CellCoord) -> Option<&mut Cell> {
        let index = self.index(cell)?;
        self.cells.get_mut(index)
    }

    fn cell(&self, cell: CellCoord) -> Option<&Cell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    fn robot_cell(&self) -> &Cell {
        // The robot cell is kept inside the grid by every transition.
        &self.cells[self.robot_index()]
    }

    fn robot_index(&self) -> usize {
        self.robot.cell.row() as usize * self.columns as usize + self.robot.cell.column() as usize
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            Some(cell.row() as usize * self.columns as usize + cell.column() as usize)
        } else {
            None
        }
    }

    /// Reports whether a wall separates `cell` from its neighbour on `side`,
    /// regardless of which of the two cells records it.
    fn wall_between(&self, cell: CellCoord, side: Orientation) -> bool {
        let near = self.cell(cell).is_some_and(|near| near.has_wall(side));
        let far = cell
            .neighbor(side, self.columns, self.rows)
            .and_then(|neighbor| self.cell(neighbor))
            .is_some_and(|far| far.has_wall(side.opposite()));
        near || far
    }

    /// Neighbour of `cell` on `side` when the robot could walk there.
    ///
    /// This is the single clearance rule shared by movement and predicates.
    fn clear_neighbor(&self, cell: CellCoord, side: Orientation) -> Option<CellCoord> {
        let neighbor = cell.neighbor(side, self.columns, self.rows)?;
        (!self.wall_between(cell, side)).then_some(neighbor)
    }

    fn raise(&mut self, error: RobotError, out_events: &mut Vec<Event>) {
        warn!("robot error: {error}");
        self.robot.error = Some(error);
        out_events.push(Event::ErrorRaised { error });
        self.finish(out_events);
    }

    fn finish(&mut self, out_events: &mut Vec<Event>) {
        if self.robot.finished {
            return;
        }
        self.robot.finished = true;
        out_events.push(Event::Finished);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands issued after the robot finished are ignored and emit no events.
/// A command whose precondition fails latches the matching [`RobotError`],
/// emits [`Event::ErrorRaised`] followed by [`Event::Finished`], and leaves
/// the robot where it stood.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.robot.finished {
        debug!("ignoring {command:?}: robot already finished");
        return;
    }

    match command {
        Command::Move => {
            let from = world.robot.cell;
            let facing = world.robot.orientation;
            match world.clear_neighbor(from, facing) {
                Some(to) => {
                    world.robot.cell = to;
                    out_events.push(Event::RobotMoved { from, to });
                }
                None => world.raise(RobotError::cannot_move(facing), out_events),
            }
        }
        Command::TurnLeft => {
            let orientation = world.robot.orientation.turned_left();
            world.robot.orientation = orientation;
            out_events.push(Event::RobotTurned { orientation });
        }
        Command::PutBeeper => match world.robot.bag.taken() {
            Some(bag) => {
                world.robot.bag = bag;
                let cell = world.robot.cell;
                let index = world.robot_index();
                let slot = &mut world.cells[index];
                slot.set_beepers(slot.beepers().saturating_add(1));
                out_events.push(Event::BeeperPut {
                    cell,
                    beepers: slot.beepers(),
                });
            }
            None => world.raise(RobotError::CannotPutBeeper, out_events),
        },
        Command::PickBeeper => {
            let cell = world.robot.cell;
            let index = world.robot_index();
            let slot = &mut world.cells[index];
            match slot.beepers().checked_sub(1) {
                Some(remaining) => {
                    slot.set_beepers(remaining);
                    world.robot.bag = world.robot.bag.returned();
                    out_events.push(Event::BeeperPicked {
                        cell,
                        beepers: remaining,
                    });
                }
                None => world.raise(RobotError::CannotPickBeeper, out_events),
            }
        }
        Command::Finish => world.finish(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
///
/// Every query stays answerable after the robot finished.
pub mod query {
    use super::World;
    use karel_core::{BeeperBag, Cell, CellCoord, Orientation, PositionAndOrientation, RobotError};

    /// Number of columns in the grid.
    #[must_use]
    pub fn width(world: &World) -> u32 {
        world.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub fn height(world: &World) -> u32 {
        world.rows
    }

    /// Cell occupied by the robot, in internal coordinates.
    #[must_use]
    pub fn robot_cell(world: &World) -> CellCoord {
        world.robot.cell
    }

    /// Robot position in user coordinates together with its facing.
    #[must_use]
    pub fn position(world: &World) -> PositionAndOrientation {
        let (x, y) = world.robot.cell.to_user(world.rows);
        PositionAndOrientation::new(x, y, world.robot.orientation)
    }

    /// Direction the robot faces.
    #[must_use]
    pub fn orientation(world: &World) -> Orientation {
        world.robot.orientation
    }

    /// Beeper inventory carried by the robot.
    #[must_use]
    pub fn bag(world: &World) -> BeeperBag {
        world.robot.bag
    }

    /// Animation speed multiplier loaded from the world file.
    #[must_use]
    pub fn speed(world: &World) -> f64 {
        world.robot.speed
    }

    /// Error latched into the robot, if any.
    #[must_use]
    pub fn error(world: &World) -> Option<RobotError> {
        world.robot.error
    }

    /// Reports whether the robot reached its terminal state.
    #[must_use]
    pub fn is_finished(world: &World) -> bool {
        world.robot.finished
    }

    /// Cell at the provided internal coordinate.
    #[must_use]
    pub fn cell(world: &World, cell: CellCoord) -> Option<&Cell> {
        world.cell(cell)
    }

    /// Cell at the provided user coordinate, where (1, 1) is the bottom-left.
    #[must_use]
    pub fn cell_at(world: &World, x: u32, y: u32) -> Option<&Cell> {
        CellCoord::from_user(x, y, world.columns, world.rows).and_then(|cell| world.cell(cell))
    }

    /// Iterates every cell in row-major order starting at the top-left.
    pub fn cells(world: &World) -> impl Iterator<Item = (CellCoord, &Cell)> + '_ {
        let columns = world.columns;
        world.cells.iter().enumerate().map(move |(index, cell)| {
            let index = index as u32;
            (CellCoord::new(index % columns, index / columns), cell)
        })
    }

    /// Reports whether a wall separates `cell` from its neighbour on `side`.
    ///
    /// The wall may be recorded on either cell. The outer boundary is not
    /// reported here unless a cell explicitly records it.
    #[must_use]
    pub fn wall_between(world: &World, cell: CellCoord, side: Orientation) -> bool {
        world.wall_between(cell, side)
    }

    /// Reports whether a robot standing on `cell` could move toward `side`.
    #[must_use]
    pub fn is_clear_from(world: &World, cell: CellCoord, side: Orientation) -> bool {
        world.clear_neighbor(cell, side).is_some()
    }

    /// Reports whether the robot could move toward `side` from where it stands.
    #[must_use]
    pub fn direction_is_clear(world: &World, side: Orientation) -> bool {
        is_clear_from(world, world.robot.cell, side)
    }

    /// Reports whether the robot could move forward.
    #[must_use]
    pub fn front_is_clear(world: &World) -> bool {
        direction_is_clear(world, world.robot.orientation)
    }

    /// Reports whether nothing blocks the cell to the robot's left.
    #[must_use]
    pub fn left_is_clear(world: &World) -> bool {
        direction_is_clear(world, world.robot.orientation.turned_left())
    }

    /// Reports whether nothing blocks the cell to the robot's right.
    #[must_use]
    pub fn right_is_clear(world: &World) -> bool {
        direction_is_clear(world, world.robot.orientation.turned_right())
    }

    /// Reports whether the robot stands on at least one beeper.
    #[must_use]
    pub fn beepers_present(world: &World) -> bool {
        world.robot_cell().beepers() > 0
    }

    /// Reports whether the robot carries at least one beeper.
    #[must_use]
    pub fn has_beepers_in_bag(world: &World) -> bool {
        world.robot.bag.has_beepers()
    }

    /// Reports whether the robot faces the provided direction.
    #[must_use]
    pub fn facing(world: &World, orientation: Orientation) -> bool {
        world.robot.orientation == orientation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karel_core::PositionAndOrientation;

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    #[test]
    fn default_world_matches_expectation() {
        let world = World::new();

        assert_eq!(query::width(&world), 10);
        assert_eq!(query::height(&world), 10);
        assert_eq!(
            query::position(&world),
            PositionAndOrientation::new(1, 1, Orientation::East)
        );
        assert_eq!(query::bag(&world), BeeperBag::Infinite);
        assert_eq!(query::error(&world), None);
        assert!(!query::is_finished(&world));
        assert!(query::cells(&world).all(|(_, cell)| *cell == Cell::default()));
    }

    #[test]
    fn move_emits_event_with_internal_coordinates() {
        let mut world = World::new();
        let events = run(&mut world, Command::Move);

        assert_eq!(
            events,
            vec![Event::RobotMoved {
                from: CellCoord::new(0, 9),
                to: CellCoord::new(1, 9),
            }]
        );
        assert_eq!(query::position(&world).x, 2);
    }

    #[test]
    fn blocked_move_latches_error_and_finishes() {
        let mut world = World::empty(1, 1);
        let events = run(&mut world, Command::Move);

        assert_eq!(
            events,
            vec![
                Event::ErrorRaised {
                    error: RobotError::CannotMoveEast,
                },
                Event::Finished,
            ]
        );
        assert_eq!(query::error(&world), Some(RobotError::CannotMoveEast));
        assert!(query::is_finished(&world));
    }

    #[test]
    fn commands_after_finish_are_ignored() {
        let mut world = World::new();
        assert_eq!(run(&mut world, Command::Finish), vec![Event::Finished]);

        assert!(run(&mut world, Command::Move).is_empty());
        assert!(run(&mut world, Command::TurnLeft).is_empty());
        assert!(run(&mut world, Command::PutBeeper).is_empty());
        assert!(run(&mut world, Command::Finish).is_empty());
        assert_eq!(
            query::position(&world),
            PositionAndOrientation::new(1, 1, Orientation::East)
        );
        assert_eq!(query::error(&world), None);
    }

    #[test]
    fn wall_on_far_cell_blocks_movement() {
        let mut world = World::empty(2, 1);
        world
            .cell_mut(CellCoord::new(1, 0))
            .expect("inside grid")
            .add_wall(Orientation::West);

        assert!(!query::front_is_clear(&world));
        assert!(query::wall_between(&world, CellCoord::new(0, 0), Orientation::East));
        let events = run(&mut world, Command::Move);
        assert_eq!(events[0], Event::ErrorRaised { error: RobotError::CannotMoveEast });
    }

    #[test]
    fn finite_bag_runs_out() {
        let mut world = World::new();
        world.set_bag(BeeperBag::Finite(1));

        assert_eq!(
            run(&mut world, Command::PutBeeper),
            vec![Event::BeeperPut {
                cell: CellCoord::new(0, 9),
                beepers: 1,
            }]
        );
        assert_eq!(query::bag(&world), BeeperBag::Finite(0));
        assert!(!query::has_beepers_in_bag(&world));

        let events = run(&mut world, Command::PutBeeper);
        assert_eq!(
            events[0],
            Event::ErrorRaised {
                error: RobotError::CannotPutBeeper,
            }
        );
    }

    #[test]
    fn picking_refills_finite_bag() {
        let mut world = World::new();
        world.set_bag(BeeperBag::Finite(0));
        world
            .cell_mut(CellCoord::new(0, 9))
            .expect("inside grid")
            .set_beepers(2);

        let events = run(&mut world, Command::PickBeeper);
        assert_eq!(
            events,
            vec![Event::BeeperPicked {
                cell: CellCoord::new(0, 9),
                beepers: 1,
            }]
        );
        assert_eq!(query::bag(&world), BeeperBag::Finite(1));
        assert!(query::beepers_present(&world));
    }

    #[test]
    fn cells_iterate_in_row_major_order() {
        let world = World::empty(3, 2);
        let coords: Vec<_> = query::cells(&world).map(|(coord, _)| coord).collect();

        assert_eq!(coords.len(), 6);
        assert_eq!(coords[0], CellCoord::new(0, 0));
        assert_eq!(coords[2], CellCoord::new(2, 0));
        assert_eq!(coords[3], CellCoord::new(0, 1));
    }
}
