//! Parser for the declarative world-file format.
//!
//! A world file is a whitespace-separated stream of records. The first record
//! must be `Dimension: (W, H)`; the remaining records may appear in any order:
//!
//! ```text
//! Dimension: (5, 3)
//! Karel: (1, 1) east
//! BeeperBag: INFINITE
//! Speed: 2
//! Wall: (2, 2) north
//! Beeper: (3, 1) 4
//! ```
//!
//! Coordinates are 1-based with `y` growing upward. `#` starts a comment that
//! runs to the end of the line.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use karel_core::{BeeperBag, CellCoord, Orientation, ParseOrientationError, MAX_BEEPERS, MIN_SPEED};
use log::info;
use thiserror::Error;

use crate::World;

/// Largest width or height a world file may declare.
pub const MAX_DIMENSION: u32 = 1_000;

const DIMENSION_KEYWORD: &str = "Dimension:";
const WALL_KEYWORD: &str = "Wall:";
const BEEPER_KEYWORD: &str = "Beeper:";
const BAG_KEYWORD: &str = "BeeperBag:";
const KAREL_KEYWORD: &str = "Karel:";
const SPEED_KEYWORD: &str = "Speed:";

const DELIMITERS: [char; 3] = ['(', ',', ')'];
const COMMENT: char = '#';

/// Failure to load a world file, tagged with the 1-based line it occurred on.
#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct WorldFileError {
    line: usize,
    kind: WorldFileErrorKind,
}

impl WorldFileError {
    fn new(line: usize, kind: WorldFileErrorKind) -> Self {
        Self { line, kind }
    }

    /// 1-based line number where loading failed.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Specific reason loading failed.
    #[must_use]
    pub fn kind(&self) -> &WorldFileErrorKind {
        &self.kind
    }
}

/// Reasons a world file can be rejected.
#[derive(Debug, Error)]
pub enum WorldFileErrorKind {
    /// The file could not be opened or read.
    #[error("could not read world file {}: {source}", path.display())]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The first record was not a dimension declaration.
    #[error("expected `{DIMENSION_KEYWORD}` as the first record, found {found}")]
    MissingDimension {
        /// Token found instead.
        found: String,
    },
    /// The declared world was narrower or shorter than one cell.
    #[error("cannot load a world less than 1 cell wide or less than 1 cell tall ({columns}x{rows})")]
    NonPositiveDimension {
        /// Declared width.
        columns: i64,
        /// Declared height.
        rows: i64,
    },
    /// The declared world exceeded [`MAX_DIMENSION`] along an axis.
    #[error("cannot load a world larger than {MAX_DIMENSION}x{MAX_DIMENSION} ({columns}x{rows})")]
    DimensionTooLarge {
        /// Declared width.
        columns: i64,
        /// Declared height.
        rows: i64,
    },
    /// A record started with an unrecognised keyword.
    #[error("unknown record `{0}`")]
    UnknownKeyword(String),
    /// A required `(`, `,` or `)` was missing.
    #[error("expected `{expected}` in {context}, found {found}")]
    MissingDelimiter {
        /// Delimiter the parser required.
        expected: char,
        /// Record being parsed.
        context: &'static str,
        /// Token found instead.
        found: String,
    },
    /// A token that should have been an integer was not.
    #[error("expected an integer for {context}, found {found}")]
    InvalidNumber {
        /// Value being parsed.
        context: &'static str,
        /// Token found instead.
        found: String,
    },
    /// The file ended in the middle of a record.
    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEnd {
        /// Value the parser required.
        expected: &'static str,
    },
    /// A direction token did not name a cardinal direction.
    #[error(transparent)]
    UnknownDirection(#[from] ParseOrientationError),
    /// A position fell outside the declared grid.
    #[error("position ({x}, {y}) lies outside the {columns}x{rows} world")]
    OutOfBounds {
        /// Declared user column.
        x: i64,
        /// Declared user row.
        y: i64,
        /// Grid width.
        columns: u32,
        /// Grid height.
        rows: u32,
    },
    /// A beeper count was negative.
    #[error("{context} must not be negative, found {count}")]
    NegativeCount {
        /// Value being parsed.
        context: &'static str,
        /// Declared count.
        count: i64,
    },
    /// A beeper count exceeded [`MAX_BEEPERS`].
    #[error("{context} of {count} exceeds the limit of {MAX_BEEPERS}")]
    TooManyBeepers {
        /// Value being parsed.
        context: &'static str,
        /// Declared count.
        count: i64,
    },
    /// The bag quantity was neither a count nor an infinity marker.
    #[error("unknown BeeperBag quantity `{0}`")]
    InvalidBagQuantity(String),
    /// The speed was not a finite number greater than zero.
    #[error("speed must be a number greater than 0, found `{0}`")]
    InvalidSpeed(String),
}

/// Reads and parses the world file at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<World, WorldFileError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| {
        WorldFileError::new(
            1,
            WorldFileErrorKind::Io {
                path: path.to_path_buf(),
                source,
            },
        )
    })?;
    let world = parse(&source)?;
    info!(
        "loaded {}x{} world from {}",
        world.columns,
        world.rows,
        path.display()
    );
    Ok(world)
}

/// Parses world-file text into a fresh [`World`].
pub fn parse(source: &str) -> Result<World, WorldFileError> {
    let mut parser = Parser::new(tokenize(source));
    let mut world = parser.dimension()?;

    while let Some(keyword) = parser.next() {
        let text = keyword.text;
        if text.eq_ignore_ascii_case(WALL_KEYWORD) {
            let (cell, side) = parser.position_and_orientation(&world, "Wall")?;
            if let Some(target) = world.cell_mut(cell) {
                target.add_wall(side);
            }
        } else if text.eq_ignore_ascii_case(BEEPER_KEYWORD) {
            let cell = parser.position(&world, "Beeper")?;
            let count = parser.beeper_count("Beeper count")?;
            if let Some(target) = world.cell_mut(cell) {
                target.set_beepers(count);
            }
        } else if text.eq_ignore_ascii_case(BAG_KEYWORD) {
            let bag = parser.bag()?;
            world.set_bag(bag);
        } else if text.eq_ignore_ascii_case(KAREL_KEYWORD) {
            let (cell, orientation) = parser.position_and_orientation(&world, "Karel")?;
            world.place_robot(cell, orientation);
        } else if text.eq_ignore_ascii_case(SPEED_KEYWORD) {
            let speed = parser.speed()?;
            world.set_speed(speed);
        } else {
            return Err(WorldFileError::new(
                keyword.line,
                WorldFileErrorKind::UnknownKeyword(text.to_owned()),
            ));
        }
    }

    Ok(world)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Token<'a> {
    text: &'a str,
    line: usize,
}

/// Splits the source into words, treating each delimiter as its own token.
fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        let content = match line.find(COMMENT) {
            Some(start) => &line[..start],
            None => line,
        };
        for word in content.split_whitespace() {
            let mut start = 0;
            for (offset, character) in word.char_indices() {
                if DELIMITERS.contains(&character) {
                    if start < offset {
                        tokens.push(Token {
                            text: &word[start..offset],
                            line: line_number,
                        });
                    }
                    let end = offset + character.len_utf8();
                    tokens.push(Token {
                        text: &word[offset..end],
                        line: line_number,
                    });
                    start = end;
                }
            }
            if start < word.len() {
                tokens.push(Token {
                    text: &word[start..],
                    line: line_number,
                });
            }
        }
    }
    tokens
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    cursor: usize,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token<'a>>) -> Self {
        Self {
            tokens,
            cursor: 0,
            line: 1,
        }
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.cursor).copied()?;
        self.cursor += 1;
        self.line = token.line;
        Some(token)
    }

    fn error(&self, kind: WorldFileErrorKind) -> WorldFileError {
        WorldFileError::new(self.line, kind)
    }

    fn require(&mut self, expected: &'static str) -> Result<Token<'a>, WorldFileError> {
        self.next()
            .ok_or_else(|| self.error(WorldFileErrorKind::UnexpectedEnd { expected }))
    }

    fn delimiter(&mut self, expected: char, context: &'static str) -> Result<(), WorldFileError> {
        let found = match self.next() {
            Some(token) if token.text.len() == 1 && token.text.starts_with(expected) => {
                return Ok(())
            }
            Some(token) => format!("`{}`", token.text),
            None => "end of file".to_owned(),
        };
        Err(self.error(WorldFileErrorKind::MissingDelimiter {
            expected,
            context,
            found,
        }))
    }

    fn integer(&mut self, context: &'static str) -> Result<i64, WorldFileError> {
        let token = self.require(context)?;
        token.text.parse::<i64>().map_err(|_| {
            self.error(WorldFileErrorKind::InvalidNumber {
                context,
                found: format!("`{}`", token.text),
            })
        })
    }

    /// Parses `(a, b)` into a pair of raw integers.
    fn pair(&mut self, context: &'static str) -> Result<(i64, i64), WorldFileError> {
        self.delimiter('(', context)?;
        let first = self.integer(context)?;
        self.delimiter(',', context)?;
        let second = self.integer(context)?;
        self.delimiter(')', context)?;
        Ok((first, second))
    }

    fn dimension(&mut self) -> Result<World, WorldFileError> {
        match self.next() {
            Some(token) if token.text.eq_ignore_ascii_case(DIMENSION_KEYWORD) => {}
            Some(token) => {
                return Err(self.error(WorldFileErrorKind::MissingDimension {
                    found: format!("`{}`", token.text),
                }))
            }
            None => {
                return Err(self.error(WorldFileErrorKind::MissingDimension {
                    found: "end of file".to_owned(),
                }))
            }
        }

        let (columns, rows) = self.pair("Dimension")?;
        if columns < 1 || rows < 1 {
            return Err(self.error(WorldFileErrorKind::NonPositiveDimension { columns, rows }));
        }
        let limit = i64::from(MAX_DIMENSION);
        if columns > limit || rows > limit {
            return Err(self.error(WorldFileErrorKind::DimensionTooLarge { columns, rows }));
        }

        // Both values were checked against `1..=MAX_DIMENSION`.
        Ok(World::empty(columns as u32, rows as u32))
    }

    fn position(
        &mut self,
        world: &World,
        context: &'static str,
    ) -> Result<CellCoord, WorldFileError> {
        let (x, y) = self.pair(context)?;
        let out_of_bounds = || WorldFileErrorKind::OutOfBounds {
            x,
            y,
            columns: world.columns,
            rows: world.rows,
        };
        let (Ok(user_x), Ok(user_y)) = (u32::try_from(x), u32::try_from(y)) else {
            return Err(self.error(out_of_bounds()));
        };
        CellCoord::from_user(user_x, user_y, world.columns, world.rows)
            .ok_or_else(|| self.error(out_of_bounds()))
    }

    fn position_and_orientation(
        &mut self,
        world: &World,
        context: &'static str,
    ) -> Result<(CellCoord, Orientation), WorldFileError> {
        let cell = self.position(world, context)?;
        let token = self.require("a direction")?;
        let orientation = token
            .text
            .parse::<Orientation>()
            .map_err(|error| self.error(error.into()))?;
        Ok((cell, orientation))
    }

    fn beeper_count(&mut self, context: &'static str) -> Result<u32, WorldFileError> {
        let count = self.integer(context)?;
        self.bounded_count(count, context)
    }

    fn bounded_count(&self, count: i64, context: &'static str) -> Result<u32, WorldFileError> {
        if count < 0 {
            return Err(self.error(WorldFileErrorKind::NegativeCount { context, count }));
        }
        match u32::try_from(count) {
            Ok(value) if value <= MAX_BEEPERS => Ok(value),
            _ => Err(self.error(WorldFileErrorKind::TooManyBeepers { context, count })),
        }
    }

    fn bag(&mut self) -> Result<BeeperBag, WorldFileError> {
        let token = self.require("a BeeperBag quantity")?;
        if token.text.eq_ignore_ascii_case("INFINITY")
            || token.text.eq_ignore_ascii_case("INFINITE")
        {
            return Ok(BeeperBag::Infinite);
        }
        let count = token.text.parse::<i64>().map_err(|_| {
            self.error(WorldFileErrorKind::InvalidBagQuantity(token.text.to_owned()))
        })?;
        self.bounded_count(count, "BeeperBag quantity")
            .map(BeeperBag::Finite)
    }

    fn speed(&mut self) -> Result<f64, WorldFileError> {
        let token = self.require("a Speed value")?;
        match token.text.parse::<f64>() {
            Ok(speed) if speed.is_finite() && speed > 0.0 => Ok(speed.max(MIN_SPEED)),
            _ => Err(self.error(WorldFileErrorKind::InvalidSpeed(token.text.to_owned()))),
        }
    }
}
