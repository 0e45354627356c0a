use std::{fs, process};

use karel::{
    facade::{self, *},
    Orientation, RobotError, SimulatorOptions, WorldFileErrorKind,
};
use karel_rendering::NullCanvas;

fn start_headless() {
    facade::reset();
    configure(SimulatorOptions::headless().with_canvas(NullCanvas::new(1, 1)));
}

#[test]
fn first_command_builds_the_default_world() {
    start_headless();
    assert!(!is_initialized());

    turn_left();

    assert!(is_initialized());
    assert!(facing_north());
    assert_eq!(with_simulator(|simulator| simulator.width()), 10);
    assert!(with_simulator(|simulator| !simulator.is_graphics_enabled()));
}

#[test]
fn load_world_after_first_use_is_ignored() {
    start_headless();
    assert!(front_is_clear());

    let path = std::env::temp_dir().join(format!("karel-ignored-{}.w", process::id()));
    fs::write(&path, "Dimension: (1, 1)\n").expect("write world file");
    let result = try_load_world(&path);
    fs::remove_file(&path).expect("remove world file");

    assert!(result.is_ok());
    assert_eq!(with_simulator(|simulator| simulator.height()), 10);
}

#[test]
fn loaded_world_drives_the_free_functions() {
    start_headless();
    let path = std::env::temp_dir().join(format!("karel-facade-{}.w", process::id()));
    fs::write(&path, "Dimension: (2, 1)\nKarel: (1, 1) east\nBeeperBag: 0\nBeeper: (2, 1) 1\n")
        .expect("write world file");
    load_world(&path);
    fs::remove_file(&path).expect("remove world file");

    assert!(no_beepers_in_bag());
    move_forward();
    assert!(beepers_present());
    pick_beeper();
    assert!(has_beepers_in_bag());
    assert!(no_beepers_present());
    assert!(front_is_blocked());
    move_forward();

    let (error, finished) =
        with_simulator(|simulator| (simulator.error(), simulator.is_finished()));
    assert_eq!(error, Some(RobotError::CannotMoveEast));
    assert!(finished);
}

#[test]
fn rejected_world_leaves_the_facade_uninitialised() {
    start_headless();
    let path = std::env::temp_dir().join(format!("karel-facade-bad-{}.w", process::id()));
    fs::write(&path, "Dim: (5, 5)\n").expect("write world file");
    let error = try_load_world(&path).expect_err("rejected world");
    fs::remove_file(&path).expect("remove world file");

    assert_eq!(error.line(), 1);
    assert!(matches!(error.kind(), WorldFileErrorKind::MissingDimension { .. }));
    assert!(!is_initialized());
}

#[test]
fn reset_starts_over() {
    start_headless();
    turn_left();
    finish();
    assert!(with_simulator(|simulator| simulator.is_finished()));

    start_headless();
    assert!(facing_east());
    assert!(not_facing_west());
    assert_eq!(
        with_simulator(|simulator| simulator.orientation()),
        Orientation::East
    );
    assert!(with_simulator(|simulator| !simulator.is_finished()));
}

#[test]
fn every_predicate_has_a_consistent_negation() {
    start_headless();
    put_beeper();

    assert_eq!(front_is_blocked(), !front_is_clear());
    assert_eq!(left_is_blocked(), !left_is_clear());
    assert_eq!(right_is_blocked(), !right_is_clear());
    assert_eq!(no_beepers_in_bag(), !has_beepers_in_bag());
    assert_eq!(no_beepers_present(), !beepers_present());
    assert_eq!(not_facing_north(), !facing_north());
    assert_eq!(not_facing_east(), !facing_east());
    assert_eq!(not_facing_south(), !facing_south());
    assert_eq!(not_facing_west(), !facing_west());
    assert!(right_is_blocked());
    assert!(left_is_clear());
}

#[test]
fn predicates_can_be_called_inside_with_simulator() {
    start_headless();

    let agrees = with_simulator(|simulator| {
        simulator.front_is_clear() == front_is_clear()
            && simulator.facing_east() == facing_east()
            && with_simulator(|inner| inner.width()) == simulator.width()
    });

    assert!(agrees);
}

#[test]
fn with_simulator_creates_the_default_world() {
    start_headless();

    let size = with_simulator(|simulator| (simulator.width(), simulator.height()));

    assert_eq!(size, (10, 10));
    assert!(is_initialized());
}
