use std::{fs, io::Cursor, path::PathBuf, process, time::Duration};

use karel::{Config, Simulator, SimulatorOptions};
use karel_rendering::{DrawOp, RecordingCanvas, RenderConfig};
use karel_world::loader;

fn temp_path(name: &str, extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!("karel-{name}-{}.{extension}", process::id()))
}

fn animated(canvas: &RecordingCanvas) -> SimulatorOptions {
    SimulatorOptions::new()
        .with_graphics(true)
        .with_canvas(canvas.clone())
}

fn error_texts(canvas: &RecordingCanvas) -> Vec<String> {
    canvas
        .texts()
        .into_iter()
        .filter(|text| text.starts_with("Error:"))
        .collect()
}

#[test]
fn animated_move_presents_short_frames_then_a_long_one() {
    let canvas = RecordingCanvas::new(600, 600);
    let mut simulator = Simulator::with_default_world(animated(&canvas));
    assert_eq!(canvas.presented(), vec![RenderConfig::DEFAULT_LONG_FRAME]);
    canvas.reset();

    simulator.move_forward();

    let mut expected = vec![RenderConfig::DEFAULT_SHORT_FRAME; 10];
    expected.push(RenderConfig::DEFAULT_LONG_FRAME);
    assert_eq!(canvas.presented(), expected);
    assert_eq!((simulator.x(), simulator.y()), (2, 1));
}

#[test]
fn speed_divides_every_hold() {
    let world = loader::parse("Dimension: (3, 3)\nSpeed: 2\n").expect("valid world");
    let canvas = RecordingCanvas::new(300, 300);
    let mut simulator = Simulator::new(world, animated(&canvas));
    canvas.reset();

    simulator.turn_left();

    assert_eq!(canvas.presented(), vec![Duration::from_millis(150)]);
}

#[test]
fn headless_runs_draw_without_holding_frames() {
    let canvas = RecordingCanvas::new(600, 600);
    let mut simulator = Simulator::with_default_world(
        SimulatorOptions::headless().with_canvas(canvas.clone()),
    );

    simulator.move_forward();
    simulator.turn_left();
    simulator.finish();

    let ops = canvas.ops();
    assert!(canvas.presented().is_empty());
    assert!(!ops.contains(&DrawOp::ShowUntilClosed));
    assert!(ops.iter().any(|op| matches!(op, DrawOp::Clear(_))));
}

#[test]
fn default_options_present_nothing() {
    let canvas = RecordingCanvas::new(600, 600);
    let mut simulator =
        Simulator::with_default_world(SimulatorOptions::new().with_canvas(canvas.clone()));

    simulator.move_forward();
    simulator.finish();

    assert!(!simulator.is_graphics_enabled());
    assert!(canvas.presented().is_empty());
}

#[test]
fn oversized_canvas_falls_back_to_drawing_nothing() {
    let world = loader::parse("Dimension: (100, 1)\n").expect("valid world");
    let mut config = Config::default();
    config.render.pixels_per_cell = 100_000_000;
    let mut simulator = Simulator::new(world, SimulatorOptions::headless().with_config(config));

    simulator.move_forward();
    assert_eq!((simulator.x(), simulator.y()), (2, 1));
    assert!(simulator.save_world_bmp(temp_path("oversized", "bmp")).is_err());
}

#[test]
fn errors_are_drawn_with_a_halo_and_held() {
    let world = loader::parse("Dimension: (1, 1)\n").expect("valid world");
    let canvas = RecordingCanvas::new(300, 300);
    let mut simulator = Simulator::new(world, animated(&canvas));
    canvas.reset();

    simulator.move_forward();

    assert_eq!(error_texts(&canvas), vec!["Error: Cannot move east"; 5]);
    assert_eq!(
        canvas.ops().last(),
        Some(&DrawOp::ShowUntilClosed),
        "an error finishes the program"
    );
    assert!(canvas.presented().contains(&RenderConfig::DEFAULT_LONG_FRAME));
}

#[test]
fn custom_render_config_drives_the_animation() {
    let config = Config::from_toml_str(
        "[render]\nanimation_steps = 2\nshort_frame_ms = 1\nlong_frame_ms = 4\n",
    )
    .expect("valid config");
    let canvas = RecordingCanvas::new(600, 600);
    let mut simulator = Simulator::with_default_world(animated(&canvas).with_config(config));
    canvas.reset();

    simulator.move_forward();

    assert_eq!(
        canvas.presented(),
        vec![
            Duration::from_millis(1),
            Duration::from_millis(1),
            Duration::from_millis(4)
        ]
    );
}

#[test]
fn csv_output_tracks_every_command_and_prompts() {
    let csv_path = temp_path("snapshot", "csv");
    let mut config = Config::default();
    config.output.csv_path = csv_path.clone();
    let world = loader::parse("Dimension: (2, 1)\n").expect("valid world");
    let mut simulator = Simulator::new(
        world,
        SimulatorOptions::headless()
            .with_config(config)
            .with_canvas(RecordingCanvas::new(200, 200))
            .with_prompt_input(Cursor::new(b"\n\n\n".to_vec())),
    );

    simulator.enable_csv_output();
    assert!(simulator.is_csv_enabled());
    assert!(simulator.is_prompt_enabled());
    let initial = fs::read_to_string(&csv_path).expect("initial snapshot");
    assert!(initial.starts_with(",,,,\n,\"ke o (1,1)\",,\"o (2,1)\",\n"), "{initial}");

    simulator.put_beeper();
    simulator.move_forward();
    let moved = fs::read_to_string(&csv_path).expect("snapshot after moving");
    assert!(moved.starts_with(",,,,\n,\"b1 (1,1)\",,\"ke o (2,1)\",\n"), "{moved}");

    simulator.finish();
    let finished = fs::read_to_string(&csv_path).expect("final snapshot");
    assert_eq!(finished, moved);
    fs::remove_file(&csv_path).expect("remove snapshot");
}

#[test]
fn csv_can_be_enabled_from_configuration() {
    let csv_path = temp_path("configured-snapshot", "csv");
    let mut config = Config::default();
    config.output.csv = true;
    config.output.csv_path = csv_path.clone();

    let simulator = Simulator::with_default_world(
        SimulatorOptions::headless()
            .with_config(config)
            .with_canvas(RecordingCanvas::new(600, 600))
            .with_prompt_input(Cursor::new(Vec::new())),
    );

    assert!(simulator.is_prompt_enabled());
    assert_eq!(simulator.csv_path(), csv_path.as_path());
    let document = fs::read_to_string(&csv_path).expect("snapshot written on start");
    assert!(document.ends_with("Beepers in bag,INFINITE\n"));
    fs::remove_file(&csv_path).expect("remove snapshot");
}

#[test]
fn prompting_consumes_one_line_per_command() {
    let mut simulator = Simulator::with_default_world(
        SimulatorOptions::headless()
            .with_canvas(RecordingCanvas::new(600, 600))
            .with_prompt_input(Cursor::new(b"\n\n".to_vec())),
    );
    simulator.enable_prompt_before_action();

    simulator.turn_left();
    simulator.move_forward();
    // Exhausted input reads as end of file and does not block.
    simulator.move_forward();

    assert_eq!((simulator.x(), simulator.y()), (1, 3));
}

#[test]
fn bmp_snapshot_is_written_by_the_default_canvas() {
    let path = temp_path("frame", "bmp");
    let mut simulator = Simulator::with_default_world(SimulatorOptions::headless());
    simulator.put_beeper();
    simulator.finish();

    simulator.save_world_bmp(&path).expect("save frame");
    let bytes = fs::read(&path).expect("read frame");
    fs::remove_file(&path).expect("remove frame");

    assert_eq!(&bytes[..2], b"BM");
    let width = i32::from_le_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]);
    assert_eq!(width, 532);
}

#[test]
fn bmp_snapshot_reaches_a_custom_canvas() {
    let canvas = RecordingCanvas::new(600, 600);
    let simulator = Simulator::with_default_world(
        SimulatorOptions::headless().with_canvas(canvas.clone()),
    );
    let path = temp_path("recorded", "bmp");

    simulator.save_world_bmp(&path).expect("recording canvas accepts saves");

    assert_eq!(canvas.saved(), vec![path]);
}
