//! The scripted demo session.

use std::{cell::RefCell, fmt, rc::Rc};

use anyhow::Context;
use serde_json::json;
use stage_core::{
    Attrs, ObjectId, PointerEvent, PointerKind, Scene, Style, Vec2, WheelEvent,
};
use stage_renderer::{Command, HostMetrics, RecordingBackend, Stage, StageConfig};

use crate::DemoConfig;

const FRAME_MS: f64 = 16.0;
const ORBIT_RADIUS: f64 = 60.0;
/// Degrees per millisecond.
const ORBIT_SPEED: f64 = 0.09;

/// What the demo did and what its last frame drew.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemoReport {
    /// Frames rendered.
    pub frames: u64,
    /// Objects in the scene at the end.
    pub objects: usize,
    /// Layer names in draw order.
    pub layers: Vec<String>,
    /// Points recorded by each finished freehand stroke.
    pub strokes: Vec<usize>,
    /// Final zoom factor.
    pub scale: f64,
    /// Final camera target.
    pub target: Vec2,
    /// Paths stroked in the last frame.
    pub paths: usize,
    /// Circles stroked in the last frame.
    pub circles: usize,
    /// Circles filled in the last frame.
    pub fills: usize,
}

impl fmt::Display for DemoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames:  {}", self.frames)?;
        writeln!(f, "objects: {}", self.objects)?;
        writeln!(f, "layers:  {}", self.layers.join(" < "))?;
        writeln!(f, "strokes: {:?}", self.strokes)?;
        writeln!(
            f,
            "camera:  scale {} target ({:.1}, {:.1})",
            self.scale, self.target.x, self.target.y
        )?;
        write!(
            f,
            "last frame: {} paths, {} circles, {} fills",
            self.paths, self.circles, self.fills
        )
    }
}

fn background(scene: &mut Scene, layer: ObjectId) -> anyhow::Result<()> {
    let grid = Style::default()
        .with_line_color("#dddddd")
        .with_line_dash(vec![4.0, 4.0]);
    for i in -5..=5_i32 {
        let at = f64::from(i) * 50.0;
        scene.add_line(
            layer,
            &[Vec2::new(at, -250.0), Vec2::new(at, 250.0)],
            &grid,
            Attrs::new(),
        )?;
        scene.add_line(
            layer,
            &[Vec2::new(-250.0, at), Vec2::new(250.0, at)],
            &grid,
            Attrs::new(),
        )?;
    }
    scene.add_circle(
        layer,
        Vec2::ZERO,
        8.0,
        &Style::default().with_fill_color("orange"),
        Attrs::new(),
    )?;
    Ok(())
}

/// Start a freehand stroke on every pointer down.
fn install_pen(
    stage: &mut Stage<RecordingBackend>,
    layer: ObjectId,
    smooth: f64,
) -> Rc<RefCell<Vec<usize>>> {
    let finished = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&finished);
    let style = Style::default()
        .with_line_color("steelblue")
        .with_line_width(3.0)
        .with_smooth(smooth);
    stage.add_pointer_listener(PointerKind::Down, move |scene, position| {
        let sink = Rc::clone(&sink);
        let mut attrs = Attrs::new();
        attrs.insert("tool".to_string(), json!("pen"));
        let started = scene.add_draw_line(layer, &[position], &style, attrs, move |scene, id| {
            let points = scene
                .get(id)
                .and_then(|o| o.kind.points())
                .map_or(0, <[Vec2]>::len);
            tracing::info!(%id, points, "Stroke finished");
            sink.borrow_mut().push(points);
        });
        if let Err(err) = started {
            tracing::warn!("Could not start stroke: {}", err);
        }
    });
    finished
}

/// Run the scripted session.
///
/// # Errors
///
/// Returns an error if the stage or scene rejects an operation.
pub fn run_demo(config: &DemoConfig) -> anyhow::Result<DemoReport> {
    let backend = RecordingBackend::with_metrics(HostMetrics {
        window_width: config.width,
        window_height: config.height,
        pixel_ratio: config.pixel_ratio,
        origin: Vec2::ZERO,
    });
    let stage_config = StageConfig::default()
        .with_size(config.width, config.height)
        .with_zoom(true);
    let mut stage = Stage::new(backend, stage_config).context("creating stage")?;

    let back = stage.layer("background");
    let ink = stage.layer("ink");
    let orbit_layer = stage.layer("orbit");
    background(stage.scene_mut(), back).context("building background")?;

    let strokes = install_pen(&mut stage, ink, config.smooth);

    // A zig-zag stroke across the middle of the surface.
    let center = Vec2::new(config.width * 0.5, config.height * 0.5);
    let press = |kind, p: Vec2| PointerEvent::new(kind, p.x, p.y);
    stage.dispatch_pointer(&press(PointerKind::Down, center))?;
    for step in 1..=120_i32 {
        let t = f64::from(step);
        let p = center + Vec2::new(t * 2.0, (t * 0.2).sin() * 30.0);
        stage.dispatch_pointer(&press(PointerKind::Move, p))?;
    }
    stage.dispatch_pointer(&press(PointerKind::Up, center))?;
    stage.dispatch_pointer(&press(PointerKind::Move, center))?;

    stage.dispatch_wheel(&WheelEvent { delta_y: -100.0 })?;
    stage.dispatch_wheel(&WheelEvent { delta_y: -100.0 })?;
    stage.surface_mut().set_camera_target(Vec2::new(-40.0, 10.0))?;

    let planet = stage.scene_mut().add_group(orbit_layer, Attrs::new())?;
    stage.scene_mut().add_circle(
        planet,
        Vec2::ZERO,
        6.0,
        &Style::default().with_fill_color("teal"),
        Attrs::new(),
    )?;
    let mut angle = 0.0;
    stage.on_frame(move |scene, elapsed| {
        angle += elapsed * ORBIT_SPEED;
        let offset = Vec2::from_angle_degrees(angle) * ORBIT_RADIUS;
        if let Err(err) = scene.set_group_offset(planet, offset) {
            tracing::warn!("Orbit update failed: {}", err);
        }
    });

    for frame in 0..config.frames {
        stage.surface_mut().backend_mut().take_commands();
        stage.tick(f64::from(frame) * FRAME_MS)?;
    }

    let last_frame = stage.surface_mut().backend_mut().take_commands();
    let count = |pred: fn(&Command) -> bool| last_frame.iter().filter(|c| pred(c)).count();
    let camera = stage.surface().camera();
    let strokes = strokes.borrow().clone();
    Ok(DemoReport {
        frames: stage.frame_count(),
        objects: stage.scene().object_count(),
        layers: stage.scene().layer_names().map(str::to_string).collect(),
        strokes,
        scale: camera.scale(),
        target: camera.target,
        paths: count(|c| matches!(c, Command::StrokePath { .. })),
        circles: count(|c| matches!(c, Command::StrokeCircle { .. })),
        fills: count(|c| matches!(c, Command::FillCircle { .. })),
    })
}
