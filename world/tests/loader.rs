use std::{fs, path::PathBuf, process};

use karel_core::{BeeperBag, Command, Orientation, PositionAndOrientation, RobotError, MAX_BEEPERS};
use karel_world::{
    self as world,
    loader::{self, WorldFileErrorKind},
    query, World,
};

fn parse(source: &str) -> World {
    loader::parse(source).expect("world file should parse")
}

fn run(world: &mut World, command: Command) {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
}

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("karel-world-{}-{name}", process::id()));
    fs::write(&path, contents).expect("write scratch world file");
    path
}

#[test]
fn full_world_file_populates_every_record() {
    let world = parse(
        "Dimension: (5, 4)\n\
         Karel: (2, 3) north\n\
         BeeperBag: 7\n\
         Speed: 2.5\n\
         Wall: (1, 1) East\n\
         Beeper: (4, 2) 3\n",
    );

    assert_eq!(query::width(&world), 5);
    assert_eq!(query::height(&world), 4);
    assert_eq!(
        query::position(&world),
        PositionAndOrientation::new(2, 3, Orientation::North)
    );
    assert_eq!(query::bag(&world), BeeperBag::Finite(7));
    assert!((query::speed(&world) - 2.5).abs() < f64::EPSILON);
    assert!(query::cell_at(&world, 1, 1).expect("inside grid").has_east_wall());
    assert_eq!(query::cell_at(&world, 4, 2).expect("inside grid").beepers(), 3);
    assert_eq!(query::error(&world), None);
    assert!(!query::is_finished(&world));
}

#[test]
fn absent_records_fall_back_to_defaults() {
    let world = parse("Dimension: (3, 2)");

    assert_eq!(query::position(&world), PositionAndOrientation::default());
    assert_eq!(query::bag(&world), BeeperBag::Infinite);
    assert!((query::speed(&world) - 1.0).abs() < f64::EPSILON);
}

#[test]
fn bag_accepts_both_infinity_spellings() {
    for marker in ["INFINITY", "INFINITE", "infinite"] {
        let world = parse(&format!("Dimension: (2, 2)\nBeeperBag: 3\nBeeperBag: {marker}"));
        assert_eq!(query::bag(&world), BeeperBag::Infinite, "marker {marker}");
    }
}

#[test]
fn repeated_beeper_records_keep_the_last_count() {
    let world = parse("Dimension: (2, 2)\nBeeper: (1, 2) 4\nBeeper: (1, 2) 9");
    assert_eq!(query::cell_at(&world, 1, 2).expect("inside grid").beepers(), 9);
}

#[test]
fn walls_accumulate_on_a_cell() {
    let world = parse("Dimension: (2, 2)\nWall: (1, 1) north\nWall: (1, 1) west");
    let cell = query::cell_at(&world, 1, 1).expect("inside grid");

    assert!(cell.has_north_wall());
    assert!(cell.has_west_wall());
    assert!(!cell.has_east_wall());
    assert!(!cell.has_south_wall());
}

#[test]
fn first_record_must_be_dimension() {
    let error = loader::parse("Dim: (5, 5)\nKarel: (1, 1) east").expect_err("bad keyword");

    assert_eq!(error.line(), 1);
    assert!(matches!(error.kind(), WorldFileErrorKind::MissingDimension { .. }));
    let message = error.to_string();
    assert!(message.starts_with("line 1:"), "{message}");
    assert!(message.contains("Dimension:"), "{message}");
}

#[test]
fn empty_file_is_rejected() {
    let error = loader::parse("# only a comment\n").expect_err("no dimension");
    assert!(matches!(error.kind(), WorldFileErrorKind::MissingDimension { .. }));
}

#[test]
fn non_positive_dimension_is_rejected() {
    let error = loader::parse("Dimension: (0, 3)").expect_err("zero width");
    assert!(matches!(
        error.kind(),
        WorldFileErrorKind::NonPositiveDimension { columns: 0, rows: 3 }
    ));

    let error = loader::parse("Dimension: (4, -1)").expect_err("negative height");
    assert!(matches!(error.kind(), WorldFileErrorKind::NonPositiveDimension { .. }));
}

#[test]
fn oversized_dimension_is_rejected() {
    let error = loader::parse("Dimension: (1001, 2)").expect_err("too wide");
    assert!(matches!(error.kind(), WorldFileErrorKind::DimensionTooLarge { .. }));
}

#[test]
fn unknown_keyword_reports_its_line() {
    let error = loader::parse("Dimension: (3, 3)\n\nTreasure: (1, 1)").expect_err("unknown record");

    assert_eq!(error.line(), 3);
    assert!(matches!(
        error.kind(),
        WorldFileErrorKind::UnknownKeyword(keyword) if keyword == "Treasure:"
    ));
}

#[test]
fn missing_parenthesis_is_rejected() {
    let error = loader::parse("Dimension: 3, 3)").expect_err("missing open paren");
    assert!(matches!(
        error.kind(),
        WorldFileErrorKind::MissingDelimiter { expected: '(', .. }
    ));

    let error = loader::parse("Dimension: (3, 3\nSpeed: 1").expect_err("missing close paren");
    assert_eq!(error.line(), 2);
    assert!(matches!(
        error.kind(),
        WorldFileErrorKind::MissingDelimiter { expected: ')', .. }
    ));
}

#[test]
fn unknown_direction_is_rejected() {
    let error = loader::parse("Dimension: (3, 3)\nKarel: (1, 1) up").expect_err("bad direction");

    assert_eq!(error.line(), 2);
    assert!(matches!(error.kind(), WorldFileErrorKind::UnknownDirection(_)));
    assert!(error.to_string().contains("`up`"));
}

#[test]
fn non_numeric_counts_are_rejected() {
    let error = loader::parse("Dimension: (3, 3)\nBeeper: (1, 1) many").expect_err("bad count");
    assert!(matches!(error.kind(), WorldFileErrorKind::InvalidNumber { .. }));

    let error = loader::parse("Dimension: (3, 3)\nBeeperBag: lots").expect_err("bad bag");
    assert!(matches!(error.kind(), WorldFileErrorKind::InvalidBagQuantity(_)));
}

#[test]
fn beeper_counts_are_range_checked() {
    let error = loader::parse("Dimension: (3, 3)\nBeeper: (1, 1) -2").expect_err("negative");
    assert!(matches!(error.kind(), WorldFileErrorKind::NegativeCount { count: -2, .. }));

    let too_many = i64::from(MAX_BEEPERS) + 1;
    let error = loader::parse(&format!("Dimension: (3, 3)\nBeeper: (1, 1) {too_many}"))
        .expect_err("too many");
    assert!(matches!(error.kind(), WorldFileErrorKind::TooManyBeepers { .. }));

    let world = parse(&format!("Dimension: (3, 3)\nBeeperBag: {MAX_BEEPERS}"));
    assert_eq!(query::bag(&world), BeeperBag::Finite(MAX_BEEPERS));
}

#[test]
fn non_positive_speed_is_rejected() {
    for speed in ["0", "-1.5", "fast", "NaN"] {
        let error = loader::parse(&format!("Dimension: (3, 3)\nSpeed: {speed}"))
            .expect_err("invalid speed");
        assert!(
            matches!(error.kind(), WorldFileErrorKind::InvalidSpeed(_)),
            "speed {speed}"
        );
    }
}

#[test]
fn positions_outside_the_grid_are_rejected() {
    for record in ["Karel: (4, 1) east", "Wall: (1, 0) north", "Beeper: (-1, 2) 1"] {
        let error = loader::parse(&format!("Dimension: (3, 3)\n{record}"))
            .expect_err("out of bounds");
        assert_eq!(error.line(), 2);
        assert!(
            matches!(error.kind(), WorldFileErrorKind::OutOfBounds { .. }),
            "record {record}"
        );
    }
}

#[test]
fn truncated_record_reports_end_of_file() {
    let error = loader::parse("Dimension: (3, 3)\nKarel: (1, 1)").expect_err("missing direction");
    assert!(matches!(error.kind(), WorldFileErrorKind::UnexpectedEnd { .. }));
}

#[test]
fn missing_file_is_reported_on_line_one() {
    let path = std::env::temp_dir().join(format!("karel-world-{}-missing.w", process::id()));
    let error = loader::load(&path).expect_err("file does not exist");

    assert_eq!(error.line(), 1);
    assert!(matches!(error.kind(), WorldFileErrorKind::Io { .. }));
}

#[test]
fn loading_twice_yields_identical_state() {
    let path = scratch_file(
        "reload.w",
        "Dimension: (4, 4)\nKarel: (3, 2) south\nBeeperBag: 2\nWall: (3, 2) west\nBeeper: (1, 4) 5\n",
    );

    let first = loader::load(&path).expect("first load");
    let second = loader::load(&path).expect("second load");
    fs::remove_file(&path).expect("remove scratch world file");

    assert_eq!(first, second);
    assert_eq!(query::position(&first), query::position(&second));
    assert_eq!(query::bag(&first), query::bag(&second));
    assert!(query::cells(&first).eq(query::cells(&second)));
}

#[test]
fn two_by_one_world_stops_at_the_east_edge() {
    let mut world = parse("Dimension: (2, 1)\nKarel: (1, 1) East");

    run(&mut world, Command::Move);
    assert_eq!(query::position(&world).x, 2);
    assert_eq!(query::error(&world), None);

    run(&mut world, Command::Move);
    assert_eq!(query::error(&world), Some(RobotError::CannotMoveEast));
    assert_eq!(query::position(&world).x, 2);
    assert!(query::is_finished(&world));

    run(&mut world, Command::TurnLeft);
    assert_eq!(query::orientation(&world), Orientation::East);
}

#[test]
fn wall_blocks_from_both_sides() {
    let mut near = parse("Dimension: (3, 3)\nWall: (2, 2) north\nKarel: (2, 2) north");
    assert!(!query::front_is_clear(&near));
    run(&mut near, Command::Move);
    assert_eq!(query::error(&near), Some(RobotError::CannotMoveNorth));

    let mut far = parse("Dimension: (3, 3)\nWall: (2, 2) north\nKarel: (2, 3) south");
    assert!(!query::front_is_clear(&far));
    run(&mut far, Command::Move);
    assert_eq!(query::error(&far), Some(RobotError::CannotMoveSouth));
}

#[test]
fn side_checks_rotate_correctly_when_facing_north() {
    let world = parse("Dimension: (3, 3)\nKarel: (2, 2) north\nWall: (2, 2) west");

    assert!(!query::left_is_clear(&world));
    assert!(query::right_is_clear(&world));
}
