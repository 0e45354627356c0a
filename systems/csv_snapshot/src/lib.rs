#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Accessibility system that mirrors the world into a spreadsheet-friendly CSV.
//!
//! The grid opens with a wall row for the north edge. Every grid row then
//! becomes two CSV rows: a content row describing each cell and the vertical
//! walls beside it, outer edges included, then a wall row describing the
//! horizontal walls beneath it. A legend and the bag count follow the grid.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use karel_core::{CellCoord, Orientation};
use karel_world::{query, World};
use log::info;

/// File name used when no snapshot path is configured.
pub const DEFAULT_CSV_PATH: &str = "karel_world.csv";

const WALL: &str = "w";
const EMPTY_CELL: &str = "o";

const LEGEND: [(&str, &str); 7] = [
    ("kn", "Karel facing north"),
    ("ke", "Karel facing east"),
    ("ks", "Karel facing south"),
    ("kw", "Karel facing west"),
    ("bN", "N beepers on the cell"),
    ("o", "no beepers on the cell"),
    ("w", "wall"),
];

/// Writes CSV snapshots of the world to a fixed path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvSnapshot {
    path: PathBuf,
}

impl CsvSnapshot {
    /// Creates a snapshot writer targeting the provided file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination file of every snapshot.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the destination file with the current world state.
    pub fn write(&self, world: &World) -> io::Result<()> {
        fs::write(&self.path, render(world))?;
        info!("wrote CSV snapshot to {}", self.path.display());
        Ok(())
    }
}

impl Default for CsvSnapshot {
    fn default() -> Self {
        Self::new(DEFAULT_CSV_PATH)
    }
}

/// Renders the full CSV document describing the world.
#[must_use]
pub fn render(world: &World) -> String {
    let rows = query::height(world);
    let mut lines = Vec::with_capacity(rows as usize * 2 + LEGEND.len() + 4);

    lines.push(join(&wall_row(world, 0, Orientation::North)));
    for row in 0..rows {
        lines.push(join(&content_row(world, row)));
        lines.push(join(&wall_row(world, row, Orientation::South)));
    }

    lines.push(String::new());
    lines.push("Legend".to_owned());
    for (symbol, meaning) in LEGEND {
        lines.push(join(&[symbol.to_owned(), meaning.to_owned()]));
    }
    lines.push(join(&["(x,y)".to_owned(), "cell coordinates".to_owned()]));
    lines.push(join(&[
        "Beepers in bag".to_owned(),
        query::bag(world).to_string(),
    ]));

    let mut document = lines.join("\n");
    document.push('\n');
    document
}

/// Cells of one grid row interleaved with the vertical walls around them,
/// from the west edge to the east edge.
fn content_row(world: &World, row: u32) -> Vec<String> {
    let columns = query::width(world);
    let mut fields = Vec::with_capacity(columns as usize * 2 + 1);
    let west_edge = CellCoord::new(0, row);
    fields.push(wall_flag(query::wall_between(world, west_edge, Orientation::West)));
    for column in 0..columns {
        let cell = CellCoord::new(column, row);
        fields.push(cell_content(world, cell));
        fields.push(wall_flag(query::wall_between(world, cell, Orientation::East)));
    }
    fields
}

/// Horizontal walls on one side of a grid row, aligned with the cell columns.
fn wall_row(world: &World, row: u32, side: Orientation) -> Vec<String> {
    let columns = query::width(world);
    let mut fields = Vec::with_capacity(columns as usize * 2 + 1);
    fields.push(String::new());
    for column in 0..columns {
        let cell = CellCoord::new(column, row);
        fields.push(wall_flag(query::wall_between(world, cell, side)));
        fields.push(String::new());
    }
    fields
}

/// Space-joined description of one cell: robot, beepers, coordinates.
fn cell_content(world: &World, cell: CellCoord) -> String {
    let mut parts = Vec::with_capacity(3);
    if query::robot_cell(world) == cell {
        let facing = query::orientation(world).name();
        parts.push(format!("k{}", &facing[..1]));
    }
    let beepers = query::cell(world, cell).map_or(0, |cell| cell.beepers());
    if beepers > 0 {
        parts.push(format!("b{beepers}"));
    } else {
        parts.push(EMPTY_CELL.to_owned());
    }
    let (x, y) = cell.to_user(query::height(world));
    parts.push(format!("({x},{y})"));
    parts.join(" ")
}

fn wall_flag(present: bool) -> String {
    if present {
        WALL.to_owned()
    } else {
        String::new()
    }
}

fn join(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| quote(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}
