//! # Easy Stage WASM Bindings
//!
//! Runs a [`Stage`] inside a browser page: creates the `<canvas>`, feeds
//! it DOM mouse and wheel input, and redraws on every animation frame.
//!
//! ## Usage
//!
//! Build for WASM:
//! ```bash
//! wasm-pack build --target web stage-web
//! ```
//!
//! Then import in JavaScript:
//! ```javascript
//! import init, { WebStage } from './pkg/stage_web.js';
//!
//! await init();
//! const stage = new WebStage('board', 800, 600, '{"drag": true, "zoom": true}');
//! const ink = stage.getLayer('ink');
//! stage.addPointerListener('mousedown', () => {
//!     stage.addDrawLine(ink, [], (id) => console.log('done', id), '{"smooth": 10}');
//! });
//! ```
//!
//! JavaScript callbacks never run while the stage is borrowed: pointer
//! and completion callbacks are queued during dispatch and invoked
//! afterwards, so they may call back into the stage freely.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod convert;

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use stage_core::{FrameClock, FrameHandle, ObjectId, PointerEvent, PointerKind, Vec2, WheelEvent};
use stage_renderer::Stage;
use wasm_bindgen::{closure::Closure, prelude::*, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub use backend::CanvasBackend;
pub use convert::WebError;

use convert::{
    canvas_id, id_to_js, js_error, listener_id, object_id, parse_attrs, parse_config,
    parse_style, points_from_flat, points_to_flat,
};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    tracing::info!("Easy Stage WASM initialized");
}

type SharedStage = Rc<RefCell<Stage<CanvasBackend>>>;
type CallQueue = Rc<RefCell<Vec<JsCall>>>;
type FrameCallbacks = Rc<RefCell<Vec<JsFrameCallback>>>;
type LoopClosure = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// A JavaScript callback waiting for the stage borrow to end.
enum JsCall {
    Pointer {
        callback: js_sys::Function,
        position: Vec2,
    },
    Finished {
        callback: js_sys::Function,
        id: ObjectId,
    },
}

impl JsCall {
    fn invoke(self) {
        let result = match self {
            Self::Pointer { callback, position } => {
                let point = js_sys::Array::of2(&position.x.into(), &position.y.into());
                callback.call1(&JsValue::NULL, &point)
            }
            Self::Finished { callback, id } => {
                callback.call1(&JsValue::NULL, &id_to_js(id.get()).into())
            }
        };
        if let Err(err) = result {
            tracing::warn!("JavaScript callback failed: {:?}", err);
        }
    }
}

/// Run queued callbacks until none are left; callbacks may queue more.
fn drain(queue: &CallQueue) {
    loop {
        let calls = std::mem::take(&mut *queue.borrow_mut());
        if calls.is_empty() {
            return;
        }
        for call in calls {
            call.invoke();
        }
    }
}

struct JsFrameCallback {
    callback: js_sys::Function,
    clock: FrameClock,
    handle: FrameHandle,
}

/// One animation frame: JavaScript frame callbacks, then the stage tick.
fn run_frame(stage: &SharedStage, queue: &CallQueue, callbacks: &FrameCallbacks, now: f64) {
    let due: Vec<(js_sys::Function, FrameHandle, f64)> = {
        let mut list = callbacks.borrow_mut();
        list.retain(|c| !c.handle.is_cancelled());
        list.iter_mut()
            .map(|c| (c.callback.clone(), c.handle.clone(), c.clock.tick(now)))
            .collect()
    };
    for (callback, handle, elapsed) in due {
        if handle.is_cancelled() {
            continue;
        }
        if let Err(err) = callback.call1(&JsValue::NULL, &elapsed.into()) {
            tracing::warn!("Frame callback failed: {:?}", err);
        }
    }

    match stage.try_borrow_mut() {
        Ok(mut stage) => {
            if let Err(err) = stage.tick(now) {
                tracing::warn!("Frame render failed: {}", err);
            }
        }
        Err(_) => tracing::warn!("Stage busy, skipping frame"),
    }
    drain(queue);
}

fn request_frame(callback: &Closure<dyn FnMut(f64)>) -> Option<i32> {
    web_sys::window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .ok()
}

/// Cancels a frame loop or a per-frame callback.
#[wasm_bindgen]
pub struct FrameToken {
    handle: FrameHandle,
    request: Rc<Cell<Option<i32>>>,
    closure: Option<LoopClosure>,
}

#[wasm_bindgen]
impl FrameToken {
    /// Stop before the next frame.
    pub fn cancel(&self) {
        self.handle.cancel();
        // `None` means the loop closure is running right now; it drops
        // itself once it sees the cancelled flag.
        if let Some(id) = self.request.take() {
            if let Some(window) = web_sys::window() {
                if let Err(err) = window.cancel_animation_frame(id) {
                    tracing::warn!("cancelAnimationFrame failed: {:?}", err);
                }
            }
            if let Some(closure) = &self.closure {
                closure.borrow_mut().take();
            }
        }
    }

    /// Whether [`cancel`](Self::cancel) was called.
    #[wasm_bindgen(js_name = isCancelled)]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }
}

fn start_loop(stage: SharedStage, queue: CallQueue, callbacks: FrameCallbacks) -> FrameToken {
    let handle = FrameHandle::new();
    let request = Rc::new(Cell::new(None));
    let closure: LoopClosure = Rc::new(RefCell::new(None));

    let handle_cb = handle.clone();
    let request_cb = Rc::clone(&request);
    let closure_cb = Rc::clone(&closure);
    let callback = Closure::wrap(Box::new(move |now: f64| {
        request_cb.set(None);
        if !handle_cb.is_cancelled() {
            run_frame(&stage, &queue, &callbacks, now);
        }
        if handle_cb.is_cancelled() {
            closure_cb.borrow_mut().take();
            return;
        }
        if let Some(next) = closure_cb.borrow().as_ref() {
            request_cb.set(request_frame(next));
        }
    }) as Box<dyn FnMut(f64)>);

    request.set(request_frame(&callback));
    *closure.borrow_mut() = Some(callback);
    tracing::debug!("Frame loop started");
    FrameToken {
        handle,
        request,
        closure: Some(closure),
    }
}

struct DomListener {
    event: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

const POINTER_EVENTS: [(&str, PointerKind); 4] = [
    ("mousedown", PointerKind::Down),
    ("mousemove", PointerKind::Move),
    ("mouseup", PointerKind::Up),
    ("mouseleave", PointerKind::Leave),
];

fn pointer_listener(
    stage: &SharedStage,
    queue: &CallQueue,
    event: &'static str,
    kind: PointerKind,
) -> DomListener {
    let stage = Rc::clone(stage);
    let queue = Rc::clone(queue);
    let closure = Closure::wrap(Box::new(move |dom_event: web_sys::Event| {
        let Some(mouse) = dom_event.dyn_ref::<web_sys::MouseEvent>() else {
            return;
        };
        let event = PointerEvent::new(
            kind,
            f64::from(mouse.client_x()),
            f64::from(mouse.client_y()),
        );
        match stage.try_borrow_mut() {
            Ok(mut stage) => {
                if let Err(err) = stage.dispatch_pointer(&event) {
                    tracing::warn!("Pointer dispatch failed: {}", err);
                }
            }
            Err(_) => tracing::warn!("Stage busy, dropping {:?}", kind),
        }
        drain(&queue);
    }) as Box<dyn FnMut(web_sys::Event)>);
    DomListener { event, closure }
}

fn wheel_listener(stage: &SharedStage) -> DomListener {
    let stage = Rc::clone(stage);
    let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
        let Some(wheel) = event.dyn_ref::<web_sys::WheelEvent>() else {
            return;
        };
        let Ok(mut stage) = stage.try_borrow_mut() else {
            return;
        };
        if stage.config().zoom {
            event.prevent_default();
        }
        if let Err(err) = stage.dispatch_wheel(&WheelEvent {
            delta_y: wheel.delta_y(),
        }) {
            tracing::warn!("Wheel dispatch failed: {}", err);
        }
    }) as Box<dyn FnMut(web_sys::Event)>);
    DomListener {
        event: "wheel",
        closure,
    }
}

fn create_canvas(
    container_id: &str,
) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), WebError> {
    let window = web_sys::window().ok_or(WebError::NoHost("window"))?;
    let document = window.document().ok_or(WebError::NoHost("document"))?;
    let container = document
        .get_element_by_id(container_id)
        .ok_or_else(|| WebError::MissingElement(container_id.to_string()))?;

    let canvas = document
        .create_element("canvas")
        .map_err(|e| WebError::Canvas(format!("{e:?}")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| WebError::Canvas("element is not a canvas".to_string()))?;
    canvas.set_id(&canvas_id(container_id));
    container
        .append_child(&canvas)
        .map_err(|e| WebError::Canvas(format!("{e:?}")))?;

    let ctx = canvas
        .get_context("2d")
        .map_err(|e| WebError::Canvas(format!("{e:?}")))?
        .ok_or_else(|| WebError::Canvas("2D context not available".to_string()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| WebError::Canvas("failed to cast to 2D context".to_string()))?;
    Ok((canvas, ctx))
}

/// A stage attached to a container element in the page.
#[wasm_bindgen]
pub struct WebStage {
    stage: SharedStage,
    queue: CallQueue,
    frame_callbacks: FrameCallbacks,
    frame_loop: FrameToken,
    canvas: HtmlCanvasElement,
    dom_listeners: Vec<DomListener>,
}

#[wasm_bindgen]
impl WebStage {
    /// Create a canvas with id `{containerId}_canvas` inside the container
    /// and start drawing it every animation frame.
    ///
    /// `options` is JSON such as `{"drag": true, "zoom": true}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is missing or the canvas cannot
    /// be set up.
    #[wasm_bindgen(constructor)]
    pub fn new(
        container_id: &str,
        width: f64,
        height: f64,
        options: Option<String>,
    ) -> Result<WebStage, JsValue> {
        let config = parse_config(options.as_deref(), width, height)?;
        let (canvas, ctx) = create_canvas(container_id)?;
        let stage = Stage::new(CanvasBackend::new(canvas.clone(), ctx), config).map_err(js_error)?;
        let stage = Rc::new(RefCell::new(stage));
        let queue: CallQueue = Rc::new(RefCell::new(Vec::new()));
        let frame_callbacks: FrameCallbacks = Rc::new(RefCell::new(Vec::new()));

        let mut dom_listeners: Vec<DomListener> = POINTER_EVENTS
            .iter()
            .map(|&(event, kind)| pointer_listener(&stage, &queue, event, kind))
            .collect();
        dom_listeners.push(wheel_listener(&stage));
        for listener in &dom_listeners {
            canvas.add_event_listener_with_callback(
                listener.event,
                listener.closure.as_ref().unchecked_ref(),
            )?;
        }

        let frame_loop = start_loop(
            Rc::clone(&stage),
            Rc::clone(&queue),
            Rc::clone(&frame_callbacks),
        );
        Ok(Self {
            stage,
            queue,
            frame_callbacks,
            frame_loop,
            canvas,
            dom_listeners,
        })
    }

    /// Get or create a layer; returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if called re-entrantly.
    #[wasm_bindgen(js_name = getLayer)]
    pub fn get_layer(&self, name: &str) -> Result<f64, JsValue> {
        self.with_stage(|stage| Ok(id_to_js(stage.layer(name).get())))
    }

    /// Append a polyline to a group or layer; `points` is `[x0, y0, ...]`.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad parent, coordinates, style or attributes.
    #[wasm_bindgen(js_name = addLine)]
    pub fn add_line(
        &self,
        parent: f64,
        points: &[f64],
        style: Option<String>,
        attrs: Option<String>,
    ) -> Result<f64, JsValue> {
        let parent = object_id(parent)?;
        let points = points_from_flat(points)?;
        let style = parse_style(style.as_deref())?;
        let attrs = parse_attrs(attrs.as_deref())?;
        self.with_stage(|stage| {
            let id = stage
                .scene_mut()
                .add_line(parent, &points, &style, attrs)
                .map_err(js_error)?;
            Ok(id_to_js(id.get()))
        })
    }

    /// Append a circle to a group or layer.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad parent, style or attributes.
    #[wasm_bindgen(js_name = addCircle)]
    pub fn add_circle(
        &self,
        parent: f64,
        x: f64,
        y: f64,
        radius: f64,
        style: Option<String>,
        attrs: Option<String>,
    ) -> Result<f64, JsValue> {
        let parent = object_id(parent)?;
        let style = parse_style(style.as_deref())?;
        let attrs = parse_attrs(attrs.as_deref())?;
        self.with_stage(|stage| {
            let id = stage
                .scene_mut()
                .add_circle(parent, Vec2::new(x, y), radius, &style, attrs)
                .map_err(js_error)?;
            Ok(id_to_js(id.get()))
        })
    }

    /// Append a freehand line that follows the pointer until it is
    /// released, then calls `onFinish(id)` once.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad parent, coordinates, style or attributes.
    #[wasm_bindgen(js_name = addDrawLine)]
    pub fn add_draw_line(
        &self,
        parent: f64,
        points: &[f64],
        on_finish: Option<js_sys::Function>,
        style: Option<String>,
        attrs: Option<String>,
    ) -> Result<f64, JsValue> {
        let parent = object_id(parent)?;
        let points = points_from_flat(points)?;
        let style = parse_style(style.as_deref())?;
        let attrs = parse_attrs(attrs.as_deref())?;
        let queue = Rc::clone(&self.queue);
        self.with_stage(|stage| {
            let id = stage
                .scene_mut()
                .add_draw_line(parent, &points, &style, attrs, move |_, id| {
                    if let Some(callback) = on_finish {
                        queue
                            .borrow_mut()
                            .push(JsCall::Finished { callback, id });
                    }
                })
                .map_err(js_error)?;
            Ok(id_to_js(id.get()))
        })
    }

    /// Append an empty group.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad parent or attributes.
    #[wasm_bindgen(js_name = addGroup)]
    pub fn add_group(&self, parent: f64, attrs: Option<String>) -> Result<f64, JsValue> {
        let parent = object_id(parent)?;
        let attrs = parse_attrs(attrs.as_deref())?;
        self.with_stage(|stage| {
            let id = stage
                .scene_mut()
                .add_group(parent, attrs)
                .map_err(js_error)?;
            Ok(id_to_js(id.get()))
        })
    }

    /// Move a group without touching its children.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a group.
    #[wasm_bindgen(js_name = setGroupOffset)]
    pub fn set_group_offset(&self, id: f64, x: f64, y: f64) -> Result<(), JsValue> {
        let id = object_id(id)?;
        self.with_stage(|stage| {
            stage
                .scene_mut()
                .set_group_offset(id, Vec2::new(x, y))
                .map_err(js_error)
        })
    }

    /// Move an object behind its siblings.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a valid id.
    #[wasm_bindgen(js_name = moveToBottom)]
    pub fn move_to_bottom(&self, id: f64) -> Result<(), JsValue> {
        let id = object_id(id)?;
        self.with_stage(|stage| {
            stage.scene_mut().move_to_bottom(id);
            Ok(())
        })
    }

    /// Move an object in front of its siblings.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a valid id.
    #[wasm_bindgen(js_name = moveToTop)]
    pub fn move_to_top(&self, id: f64) -> Result<(), JsValue> {
        let id = object_id(id)?;
        self.with_stage(|stage| {
            stage.scene_mut().move_to_top(id);
            Ok(())
        })
    }

    /// Swap an object with the sibling behind it.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a valid id.
    #[wasm_bindgen(js_name = moveDown)]
    pub fn move_down(&self, id: f64) -> Result<(), JsValue> {
        let id = object_id(id)?;
        self.with_stage(|stage| {
            stage.scene_mut().move_down(id);
            Ok(())
        })
    }

    /// Swap an object with the sibling in front of it.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a valid id.
    #[wasm_bindgen(js_name = moveUp)]
    pub fn move_up(&self, id: f64) -> Result<(), JsValue> {
        let id = object_id(id)?;
        self.with_stage(|stage| {
            stage.scene_mut().move_up(id);
            Ok(())
        })
    }

    /// An object's attributes as JSON, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a valid id.
    #[wasm_bindgen(js_name = getAttrs)]
    pub fn get_attrs(&self, id: f64) -> Result<Option<String>, JsValue> {
        let id = object_id(id)?;
        self.with_stage(|stage| {
            stage
                .scene()
                .attrs(id)
                .map(|attrs| serde_json::to_string(attrs).map_err(js_error))
                .transpose()
        })
    }

    /// A line's points as `[x0, y0, ...]`, if `id` is a line.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a valid id.
    #[wasm_bindgen(js_name = getPoints)]
    pub fn get_points(&self, id: f64) -> Result<Option<Vec<f64>>, JsValue> {
        let id = object_id(id)?;
        self.with_stage(|stage| {
            Ok(stage
                .scene()
                .get(id)
                .and_then(|object| object.kind.points())
                .map(points_to_flat))
        })
    }

    /// Pan so that `(x, y)` is the camera target.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform cannot be applied.
    #[wasm_bindgen(js_name = setCameraTarget)]
    pub fn set_camera_target(&self, x: f64, y: f64) -> Result<(), JsValue> {
        self.with_stage(|stage| {
            stage
                .surface_mut()
                .set_camera_target(Vec2::new(x, y))
                .map_err(js_error)
        })
    }

    /// Resize the canvas in css pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas cannot be resized.
    pub fn resize(&self, width: f64, height: f64) -> Result<(), JsValue> {
        self.with_stage(|stage| stage.surface_mut().resize(width, height).map_err(js_error))
    }

    /// Resize the canvas to the window's inner size.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas cannot be resized.
    #[wasm_bindgen(js_name = fitToViewport)]
    pub fn fit_to_viewport(&self) -> Result<(), JsValue> {
        self.with_stage(|stage| stage.surface_mut().fit_to_viewport().map_err(js_error))
    }

    /// Convert a client position to world coordinates as `[x, y]`.
    ///
    /// # Errors
    ///
    /// Returns an error if called re-entrantly.
    #[wasm_bindgen(js_name = screenToWorld)]
    pub fn screen_to_world(&self, x: f64, y: f64) -> Result<Vec<f64>, JsValue> {
        self.with_stage(|stage| {
            let world = stage.surface_mut().screen_to_world(Vec2::new(x, y));
            Ok(vec![world.x, world.y])
        })
    }

    /// Call `callback([x, y])` with the world position for every pointer
    /// event of the given kind (`"mousedown"`, `"mousemove"`, ...).
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown event name.
    #[wasm_bindgen(js_name = addPointerListener)]
    pub fn add_pointer_listener(
        &self,
        event: &str,
        callback: js_sys::Function,
    ) -> Result<f64, JsValue> {
        let kind = PointerKind::from_event_name(event)
            .ok_or_else(|| WebError::UnknownEvent(event.to_string()))?;
        let queue = Rc::clone(&self.queue);
        self.with_stage(|stage| {
            let id = stage.add_pointer_listener(kind, move |_, position| {
                queue.borrow_mut().push(JsCall::Pointer {
                    callback: callback.clone(),
                    position,
                });
            });
            Ok(id_to_js(id.get()))
        })
    }

    /// Remove a pointer listener; returns whether it was registered.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a valid id.
    #[wasm_bindgen(js_name = removePointerListener)]
    pub fn remove_pointer_listener(&self, id: f64) -> Result<bool, JsValue> {
        let id = listener_id(id)?;
        self.with_stage(|stage| Ok(stage.remove_pointer_listener(id)))
    }

    /// Call `callback(elapsedMs)` before every redraw until the returned
    /// token is cancelled. `elapsedMs` is 0 on the first call rather than
    /// the time since registration.
    #[wasm_bindgen(js_name = onFrame)]
    pub fn on_frame(&self, callback: js_sys::Function) -> FrameToken {
        let handle = FrameHandle::new();
        self.frame_callbacks.borrow_mut().push(JsFrameCallback {
            callback,
            clock: FrameClock::new(),
            handle: handle.clone(),
        });
        FrameToken {
            handle,
            request: Rc::new(Cell::new(None)),
            closure: None,
        }
    }

    /// Stop the redraw loop.
    pub fn stop(&self) {
        self.frame_loop.cancel();
    }

    /// Number of objects in the scene.
    #[wasm_bindgen(js_name = objectCount)]
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.stage
            .try_borrow()
            .map(|stage| stage.scene().object_count())
            .unwrap_or_default()
    }
}

impl WebStage {
    fn with_stage<T>(
        &self,
        f: impl FnOnce(&mut Stage<CanvasBackend>) -> Result<T, JsValue>,
    ) -> Result<T, JsValue> {
        let result = {
            let mut stage = self
                .stage
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str("Stage is busy"))?;
            f(&mut *stage)
        };
        drain(&self.queue);
        result
    }
}

impl Drop for WebStage {
    fn drop(&mut self) {
        self.frame_loop.cancel();
        for listener in &self.dom_listeners {
            if let Err(err) = self.canvas.remove_event_listener_with_callback(
                listener.event,
                listener.closure.as_ref().unchecked_ref(),
            ) {
                tracing::warn!("Failed to remove {} listener: {:?}", listener.event, err);
            }
        }
    }
}
