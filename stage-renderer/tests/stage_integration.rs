//! Integration tests for the stage (stage-renderer).
//!
//! Drives a full stage over the recording backend: input routing, camera
//! transforms, freehand drawing, draw order and frame callbacks.

use std::{cell::RefCell, rc::Rc};

use proptest::prelude::*;
use stage_core::{Attrs, ObjectId, PointerEvent, PointerKind, Style, Vec2, WheelEvent};
use stage_renderer::{Command, HostMetrics, RecordingBackend, Stage, StageConfig};

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn stage(config: StageConfig) -> Stage<RecordingBackend> {
    Stage::new(RecordingBackend::new(), config).expect("stage")
}

fn stage_with_ratio(config: StageConfig, ratio: f64) -> Stage<RecordingBackend> {
    let backend = RecordingBackend::with_metrics(HostMetrics {
        pixel_ratio: ratio,
        ..HostMetrics::default()
    });
    Stage::new(backend, config).expect("stage")
}

fn pointer(stage: &mut Stage<RecordingBackend>, kind: PointerKind, x: f64, y: f64) {
    stage
        .dispatch_pointer(&PointerEvent::new(kind, x, y))
        .expect("pointer");
}

/// Render one frame and return only what it drew.
fn draw_frame(stage: &mut Stage<RecordingBackend>) -> Vec<Command> {
    stage.surface_mut().backend_mut().take_commands();
    stage.render().expect("render");
    stage
        .surface_mut()
        .backend_mut()
        .take_commands()
        .into_iter()
        .filter(Command::is_draw)
        .collect()
}

// ==========================================================================
// Primitives
// ==========================================================================

#[test]
fn test_empty_line_draws_nothing_and_single_point_draws_dot() {
    let mut stage = stage(StageConfig::default());
    let layer = stage.layer("main");
    let p = Vec2::new(4.0, -2.0);
    stage
        .scene_mut()
        .add_line(layer, &[], &Style::default(), Attrs::new())
        .expect("empty");
    stage
        .scene_mut()
        .add_line(layer, &[p], &Style::default(), Attrs::new())
        .expect("dot");

    let drawn = draw_frame(&mut stage);
    assert_eq!(drawn.len(), 1);
    assert!(matches!(
        &drawn[0],
        Command::StrokePath { points, closed: false, .. } if points == &vec![p, p]
    ));
}

#[test]
fn test_filled_circle_fills_before_stroking() {
    let mut stage = stage(StageConfig::default());
    let layer = stage.layer("main");
    let style = Style::default()
        .with_fill_color("red")
        .with_line_color("blue");
    stage
        .scene_mut()
        .add_circle(layer, Vec2::new(1.0, 1.0), 3.0, &style, Attrs::new())
        .expect("circle");

    let drawn = draw_frame(&mut stage);
    assert!(matches!(
        drawn.as_slice(),
        [
            Command::FillCircle { color, .. },
            Command::StrokeCircle { style, .. },
        ] if color == "red" && style.color == "blue"
    ));
}

#[test]
fn test_default_stroke_style() {
    let mut stage = stage(StageConfig::default());
    let layer = stage.layer("main");
    let style = Style::from_json(r#"{"lineWidth": 0}"#).expect("style");
    stage
        .scene_mut()
        .add_line(layer, &[Vec2::ZERO, Vec2::new(1.0, 0.0)], &style, Attrs::new())
        .expect("line");

    let drawn = draw_frame(&mut stage);
    let [Command::StrokePath { style, .. }] = drawn.as_slice() else {
        panic!("expected one path, got {drawn:?}");
    };
    assert_eq!(style.color, "black");
    assert!(approx_eq(style.width, 1.0));
    assert!(style.dash.is_empty());
    assert_eq!(style.cap.as_str(), "round");
    assert_eq!(style.join.as_str(), "round");
}

// ==========================================================================
// Draw order
// ==========================================================================

#[test]
fn test_layers_draw_in_creation_order() {
    let mut stage = stage(StageConfig::default());
    let top = stage.layer("top");
    let bottom = stage.layer("bottom");
    for (layer, x) in [(bottom, 2.0), (top, 1.0)] {
        stage
            .scene_mut()
            .add_circle(layer, Vec2::new(x, 0.0), 1.0, &Style::default(), Attrs::new())
            .expect("circle");
    }
    // Re-fetching a layer must not change its position.
    stage.layer("bottom");

    let centers: Vec<f64> = draw_frame(&mut stage)
        .iter()
        .filter_map(|c| match c {
            Command::StrokeCircle { center, .. } => Some(center.x),
            _ => None,
        })
        .collect();
    assert_eq!(centers, vec![1.0, 2.0]);
}

#[test]
fn test_reordering_changes_draw_order() {
    let mut stage = stage(StageConfig::default());
    let layer = stage.layer("main");
    let ids: Vec<ObjectId> = (0..3_i32)
        .map(|i| {
            stage
                .scene_mut()
                .add_circle(
                    layer,
                    Vec2::new(f64::from(i), 0.0),
                    1.0,
                    &Style::default(),
                    Attrs::new(),
                )
                .expect("circle")
        })
        .collect();

    stage.scene_mut().move_to_top(ids[0]);
    assert_eq!(stage.scene().children(layer), &[ids[1], ids[2], ids[0]]);
    stage.scene_mut().move_up(ids[1]);
    assert_eq!(stage.scene().children(layer), &[ids[2], ids[1], ids[0]]);

    let centers: Vec<f64> = draw_frame(&mut stage)
        .iter()
        .filter_map(|c| match c {
            Command::StrokeCircle { center, .. } => Some(center.x),
            _ => None,
        })
        .collect();
    assert_eq!(centers, vec![2.0, 1.0, 0.0]);
}

#[test]
fn test_nested_group_offsets_accumulate() {
    let mut stage = stage(StageConfig::default());
    let layer = stage.layer("main");
    let outer = stage.scene_mut().add_group(layer, Attrs::new()).expect("outer");
    let inner = stage.scene_mut().add_group(outer, Attrs::new()).expect("inner");
    stage
        .scene_mut()
        .set_group_offset(outer, Vec2::new(10.0, 0.0))
        .expect("outer offset");
    stage
        .scene_mut()
        .set_group_offset(inner, Vec2::new(0.0, 5.0))
        .expect("inner offset");
    stage
        .scene_mut()
        .add_line(
            inner,
            &[Vec2::ZERO, Vec2::new(1.0, 1.0)],
            &Style::default(),
            Attrs::new(),
        )
        .expect("line");

    let drawn = draw_frame(&mut stage);
    assert!(matches!(
        drawn.as_slice(),
        [Command::StrokePath { points, .. }]
            if points == &vec![Vec2::new(10.0, 5.0), Vec2::new(11.0, 6.0)]
    ));
}

// ==========================================================================
// Camera
// ==========================================================================

#[test]
fn test_zoom_in_saturates_through_stage() {
    let mut stage = stage(StageConfig::default().with_zoom(true));
    for n in 1..=12 {
        stage
            .dispatch_wheel(&WheelEvent { delta_y: -53.0 })
            .expect("wheel");
        assert_eq!(stage.surface().camera().scale_level(), (8 + n).min(17));
    }
}

#[test]
fn test_clear_rect_matches_visible_region() {
    let mut stage = stage_with_ratio(StageConfig::default().with_size(400.0, 200.0), 2.0);
    stage.surface_mut().set_camera_target(Vec2::new(3.0, 4.0)).expect("target");
    stage.surface_mut().backend_mut().take_commands();
    stage.render().expect("render");

    let Some(Command::ClearRect(rect)) = stage.surface().backend().commands().first() else {
        panic!("frame must start with a clear");
    };
    assert!(approx_eq(rect.x, -(400.0 + 5.0) - 3.0));
    assert!(approx_eq(rect.y, -(200.0 + 5.0) - 4.0));
    assert!(approx_eq(rect.width, 810.0));
    assert!(approx_eq(rect.height, 410.0));
}

#[test]
fn test_drag_pans_by_device_pixels_over_scale() {
    let mut stage = stage_with_ratio(
        StageConfig::default().with_drag(true).with_zoom(true),
        2.0,
    );
    stage
        .dispatch_wheel(&WheelEvent { delta_y: -1.0 })
        .expect("zoom");
    pointer(&mut stage, PointerKind::Down, 100.0, 100.0);
    pointer(&mut stage, PointerKind::Move, 103.0, 94.0);
    pointer(&mut stage, PointerKind::Up, 103.0, 94.0);
    pointer(&mut stage, PointerKind::Move, 200.0, 200.0);

    let target = stage.surface().camera().target;
    assert!(approx_eq(target.x, 4.0));
    assert!(approx_eq(target.y, -8.0));
}

#[test]
fn test_picked_point_draws_under_pointer() {
    let mut stage = stage_with_ratio(StageConfig::default().with_zoom(true), 1.5);
    stage.surface_mut().set_camera_target(Vec2::new(-12.5, 7.0)).expect("target");
    stage
        .dispatch_wheel(&WheelEvent { delta_y: 1.0 })
        .expect("zoom");

    let layer = stage.layer("main");
    let clicked = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&clicked);
    stage.add_pointer_listener(PointerKind::Down, move |_, p| {
        *sink.borrow_mut() = Some(p);
    });
    pointer(&mut stage, PointerKind::Down, 123.0, 456.0);
    let world = clicked.borrow().expect("listener ran");
    stage
        .scene_mut()
        .add_circle(layer, world, 1.0, &Style::default(), Attrs::new())
        .expect("circle");

    let drawn = draw_frame(&mut stage);
    let [Command::StrokeCircle { center, .. }] = drawn.as_slice() else {
        panic!("expected one circle");
    };
    let client = stage.surface().world_to_screen(*center);
    assert!((client.x - 123.0).abs() < 1e-6);
    assert!((client.y - 456.0).abs() < 1e-6);
}

proptest! {
    #[test]
    fn prop_screen_world_round_trip(
        cx in 0.0f64..800.0,
        cy in 0.0f64..600.0,
        tx in -1e3f64..1e3,
        ty in -1e3f64..1e3,
        zooms in -10i32..10,
        ratio in 0.5f64..3.0,
    ) {
        let mut stage = stage_with_ratio(StageConfig::default().with_zoom(true), ratio);
        stage.surface_mut().set_camera_target(Vec2::new(tx, ty)).expect("target");
        for _ in 0..zooms.unsigned_abs() {
            stage
                .dispatch_wheel(&WheelEvent { delta_y: f64::from(-zooms.signum()) })
                .expect("zoom");
        }
        let client = Vec2::new(cx, cy);
        let world = stage.surface_mut().screen_to_world(client);
        let back = stage.surface().world_to_screen(world);
        prop_assert!((back.x - cx).abs() < 1e-6);
        prop_assert!((back.y - cy).abs() < 1e-6);
    }
}

// ==========================================================================
// Freehand drawing
// ==========================================================================

#[test]
fn test_smoothed_stroke_from_pointer_events() {
    let mut stage = stage(StageConfig::default());
    let layer = stage.layer("ink");
    let finished = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&finished);
    let style = Style::default().with_smooth(10.0);
    let line = stage
        .scene_mut()
        .add_draw_line(layer, &[Vec2::ZERO], &style, Attrs::new(), move |scene, id| {
            let points = scene
                .get(id)
                .and_then(|o| o.kind.points())
                .map(<[Vec2]>::len)
                .unwrap_or_default();
            sink.borrow_mut().push((id, points));
        })
        .expect("draw line");
    assert_eq!(stage.scene().listener_count(), 2);

    // Client (400, 300) is the world origin on an 800x600 surface.
    for i in 1..=35_i32 {
        pointer(&mut stage, PointerKind::Move, 400.0 + f64::from(i), 300.0);
    }
    pointer(&mut stage, PointerKind::Up, 435.0, 300.0);
    for i in 36..=60_i32 {
        pointer(&mut stage, PointerKind::Move, 400.0 + f64::from(i), 300.0);
    }
    pointer(&mut stage, PointerKind::Up, 460.0, 300.0);

    let points = stage
        .scene()
        .get(line)
        .and_then(|o| o.kind.points())
        .expect("points")
        .to_vec();
    let expected = [0.0, 10.0, 20.0, 30.0];
    assert_eq!(points.len(), expected.len());
    for (point, x) in points.iter().zip(expected) {
        assert!((point.x - x).abs() < 1e-9);
        assert!(point.y.abs() < 1e-9);
    }
    assert_eq!(*finished.borrow(), vec![(line, 4)]);
    assert_eq!(stage.scene().listener_count(), 0);
}

#[test]
fn test_unsmoothed_stroke_records_every_move() {
    let mut stage = stage(StageConfig::default());
    let layer = stage.layer("ink");
    let line = stage
        .scene_mut()
        .add_draw_line(layer, &[], &Style::default(), Attrs::new(), |_, _| {})
        .expect("draw line");
    pointer(&mut stage, PointerKind::Move, 401.0, 300.0);
    pointer(&mut stage, PointerKind::Move, 401.5, 300.0);
    pointer(&mut stage, PointerKind::Up, 401.5, 300.0);

    let drawn = draw_frame(&mut stage);
    assert!(matches!(
        drawn.as_slice(),
        [Command::StrokePath { points, .. }]
            if points == &vec![Vec2::new(1.0, 0.0), Vec2::new(1.5, 0.0)]
    ));
    assert!(stage.scene().get(line).is_some());
}

// ==========================================================================
// Frame loop
// ==========================================================================

#[test]
fn test_frame_callbacks_get_elapsed_time_until_cancelled() {
    let mut stage = stage(StageConfig::default());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let handle = stage.on_frame(move |_, elapsed| sink.borrow_mut().push(elapsed));

    stage.tick(1000.0).expect("tick");
    stage.tick(1016.0).expect("tick");
    stage.tick(1050.0).expect("tick");
    handle.cancel();
    stage.tick(1066.0).expect("tick");

    assert_eq!(*seen.borrow(), vec![0.0, 16.0, 34.0]);
    assert_eq!(stage.frame_count(), 4);
}

#[test]
fn test_frame_callback_animates_group() {
    let mut stage = stage(StageConfig::default());
    let layer = stage.layer("main");
    let group = stage.scene_mut().add_group(layer, Attrs::new()).expect("group");
    stage
        .scene_mut()
        .add_circle(group, Vec2::ZERO, 2.0, &Style::default(), Attrs::new())
        .expect("circle");
    let mut x = 0.0;
    stage.on_frame(move |scene, elapsed| {
        x += elapsed * 0.5;
        scene
            .set_group_offset(group, Vec2::new(x, 0.0))
            .expect("offset");
    });

    stage.tick(0.0).expect("tick");
    stage.tick(20.0).expect("tick");
    stage.surface_mut().backend_mut().take_commands();
    stage.tick(40.0).expect("tick");
    assert!(stage.surface().backend().commands().iter().any(|c| matches!(
        c,
        Command::StrokeCircle { center, .. } if approx_eq(center.x, 20.0)
    )));
}
