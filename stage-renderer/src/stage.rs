//! The stage: surface, scene and frame callbacks behind one handle.

use serde::{Deserialize, Serialize};
use stage_core::{
    Animations, FrameHandle, ListenerId, ObjectId, PointerEvent, PointerKind, Scene, Vec2,
    WheelEvent,
};

use crate::{backend::RenderBackend, DrawingSurface, RenderResult};

/// Stage construction options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Initial width in css pixels.
    pub width: f64,
    /// Initial height in css pixels.
    pub height: f64,
    /// Pan the camera by dragging with the pointer held down.
    pub drag: bool,
    /// Step the zoom level with the mouse wheel.
    pub zoom: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            drag: false,
            zoom: false,
        }
    }
}

impl StageConfig {
    /// Parse from JSON such as `{"drag": true, "zoom": true}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> RenderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the initial size.
    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Enable or disable drag-to-pan.
    #[must_use]
    pub fn with_drag(mut self, drag: bool) -> Self {
        self.drag = drag;
        self
    }

    /// Enable or disable wheel zoom.
    #[must_use]
    pub fn with_zoom(mut self, zoom: bool) -> Self {
        self.zoom = zoom;
        self
    }
}

/// Top-level coordinator.
///
/// Host input goes in through [`dispatch_pointer`](Self::dispatch_pointer)
/// and [`dispatch_wheel`](Self::dispatch_wheel); the host calls
/// [`tick`](Self::tick) once per animation frame.
pub struct Stage<B> {
    surface: DrawingSurface<B>,
    scene: Scene,
    animations: Animations,
    config: StageConfig,
    frame_count: u64,
}

impl<B: RenderBackend> Stage<B> {
    /// Create a stage drawing into `backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be sized.
    pub fn new(backend: B, config: StageConfig) -> RenderResult<Self> {
        let surface = DrawingSurface::new(backend, config.width, config.height)?;
        tracing::info!(
            backend = surface.backend().backend_type().as_str(),
            drag = config.drag,
            zoom = config.zoom,
            "Stage created"
        );
        Ok(Self {
            surface,
            scene: Scene::new(),
            animations: Animations::default(),
            config,
            frame_count: 0,
        })
    }

    /// Get or create the named layer.
    pub fn layer(&mut self, name: &str) -> ObjectId {
        self.scene.layer(name)
    }

    /// The scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access to the scene.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The drawing surface.
    #[must_use]
    pub fn surface(&self) -> &DrawingSurface<B> {
        &self.surface
    }

    /// Mutable access to the drawing surface.
    pub fn surface_mut(&mut self) -> &mut DrawingSurface<B> {
        &mut self.surface
    }

    /// The configuration the stage was created with.
    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Frames rendered so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Register a world-space pointer listener.
    pub fn add_pointer_listener(
        &mut self,
        kind: PointerKind,
        callback: impl FnMut(&mut Scene, Vec2) + 'static,
    ) -> ListenerId {
        self.scene.add_pointer_listener(kind, callback)
    }

    /// Remove a pointer listener. Returns whether it was registered.
    pub fn remove_pointer_listener(&mut self, id: ListenerId) -> bool {
        self.scene.remove_pointer_listener(id)
    }

    /// Route a client-space pointer event.
    ///
    /// Drag-pan runs first when enabled, so listeners see the position in
    /// the already-panned world.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the panned transform.
    pub fn dispatch_pointer(&mut self, event: &PointerEvent) -> RenderResult<()> {
        if self.config.drag {
            self.surface.handle_drag(event)?;
        }
        let world = self.surface.screen_to_world(event.position);
        tracing::trace!(kind = ?event.kind, x = world.x, y = world.y, "Pointer");
        self.scene.dispatch_pointer(event.kind, world);
        Ok(())
    }

    /// Route a wheel event. Returns whether the zoom level changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the zoomed transform.
    pub fn dispatch_wheel(&mut self, event: &WheelEvent) -> RenderResult<bool> {
        if !self.config.zoom {
            return Ok(false);
        }
        self.surface.handle_wheel(event)
    }

    /// Run `callback` every frame with the elapsed milliseconds since its
    /// previous frame.
    ///
    /// The first frame reports 0, not the time since registration: the
    /// clock only starts at the first [`tick`](Self::tick) it sees.
    pub fn on_frame(&mut self, callback: impl FnMut(&mut Scene, f64) + 'static) -> FrameHandle {
        self.animations.add(Box::new(callback))
    }

    /// Number of live per-frame callbacks.
    #[must_use]
    pub fn frame_callback_count(&self) -> usize {
        self.animations.len()
    }

    /// Clear the visible region and draw every layer.
    ///
    /// # Errors
    ///
    /// Returns the first backend error.
    pub fn render(&mut self) -> RenderResult<()> {
        self.surface.clear()?;
        self.scene.draw(&mut self.surface)?;
        self.frame_count += 1;
        Ok(())
    }

    /// Advance one animation frame at host time `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns the first backend error.
    pub fn tick(&mut self, now_ms: f64) -> RenderResult<()> {
        self.animations.run(&mut self.scene, now_ms);
        self.render()
    }
}

impl<B> std::fmt::Debug for Stage<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("scene", &self.scene)
            .field("config", &self.config)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Command, RecordingBackend};
    use stage_core::{Attrs, Style};
    use std::{cell::RefCell, rc::Rc};

    fn stage(config: StageConfig) -> Stage<RecordingBackend> {
        Stage::new(RecordingBackend::new(), config).expect("stage")
    }

    #[test]
    fn test_config_defaults() {
        let config = StageConfig::default();
        assert!(!config.drag);
        assert!(!config.zoom);
        assert!((config.width - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config = StageConfig::from_json(r#"{"zoom": true}"#).expect("parse");
        assert!(config.zoom);
        assert!(!config.drag);
        assert!((config.height - 600.0).abs() < f64::EPSILON);
        assert!(StageConfig::from_json("{").is_err());
    }

    #[test]
    fn test_layer_is_get_or_create() {
        let mut stage = stage(StageConfig::default());
        let a = stage.layer("ink");
        assert_eq!(stage.layer("ink"), a);
        assert_ne!(stage.layer("grid"), a);
    }

    #[test]
    fn test_wheel_ignored_without_zoom() {
        let mut stage = stage(StageConfig::default());
        assert!(!stage
            .dispatch_wheel(&WheelEvent { delta_y: -1.0 })
            .expect("wheel"));
        assert_eq!(stage.surface().camera().scale_level(), 8);

        let mut stage = self::stage(StageConfig::default().with_zoom(true));
        assert!(stage
            .dispatch_wheel(&WheelEvent { delta_y: -1.0 })
            .expect("wheel"));
        assert_eq!(stage.surface().camera().scale_level(), 9);
    }

    #[test]
    fn test_drag_ignored_without_flag() {
        let mut stage = stage(StageConfig::default());
        stage
            .dispatch_pointer(&PointerEvent::new(PointerKind::Down, 0.0, 0.0))
            .expect("down");
        stage
            .dispatch_pointer(&PointerEvent::new(PointerKind::Move, 30.0, 0.0))
            .expect("move");
        assert_eq!(stage.surface().camera().target, Vec2::ZERO);
    }

    #[test]
    fn test_listener_receives_world_position() {
        let mut stage = stage(StageConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = stage.add_pointer_listener(PointerKind::Down, move |_, p| {
            sink.borrow_mut().push(p);
        });
        stage
            .dispatch_pointer(&PointerEvent::new(PointerKind::Down, 410.0, 290.0))
            .expect("down");
        assert_eq!(*seen.borrow(), vec![Vec2::new(10.0, -10.0)]);

        assert!(stage.remove_pointer_listener(id));
        stage
            .dispatch_pointer(&PointerEvent::new(PointerKind::Down, 0.0, 0.0))
            .expect("down");
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_render_clears_then_draws() {
        let mut stage = stage(StageConfig::default());
        let layer = stage.layer("main");
        stage
            .scene_mut()
            .add_circle(layer, Vec2::ZERO, 5.0, &Style::default(), Attrs::new())
            .expect("circle");
        stage.surface_mut().backend_mut().take_commands();

        stage.render().expect("render");
        let commands = stage.surface().backend().commands();
        assert!(matches!(commands.first(), Some(Command::ClearRect(_))));
        assert!(matches!(commands.get(1), Some(Command::StrokeCircle { .. })));
        assert_eq!(stage.frame_count(), 1);
    }

    #[test]
    fn test_tick_runs_frame_callbacks_before_drawing() {
        let mut stage = stage(StageConfig::default());
        let layer = stage.layer("main");
        let group = stage
            .scene_mut()
            .add_group(layer, Attrs::new())
            .expect("group");
        stage
            .scene_mut()
            .add_circle(group, Vec2::ZERO, 1.0, &Style::default(), Attrs::new())
            .expect("circle");
        stage.on_frame(move |scene, elapsed| {
            scene
                .set_group_offset(group, Vec2::new(elapsed, 0.0))
                .expect("offset");
        });

        stage.tick(100.0).expect("tick");
        stage.surface_mut().backend_mut().take_commands();
        stage.tick(116.0).expect("tick");
        assert!(stage.surface().backend().commands().iter().any(|c| matches!(
            c,
            Command::StrokeCircle { center, .. } if *center == Vec2::new(16.0, 0.0)
        )));
    }

    #[test]
    fn test_cancelled_frame_callback_is_dropped() {
        let mut stage = stage(StageConfig::default());
        let handle = stage.on_frame(|_, _| {});
        assert_eq!(stage.frame_callback_count(), 1);
        handle.cancel();
        stage.tick(0.0).expect("tick");
        assert_eq!(stage.frame_callback_count(), 0);
    }
}
