//! Pointer input and the listener registry.

use serde::{Deserialize, Serialize};

use crate::{ObjectId, Scene, Vec2};

/// Kind of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
    /// Pointer left the surface.
    Leave,
}

impl PointerKind {
    /// Parse a DOM-style event name (`"mousedown"`, `"pointermove"`, `"up"`, ...).
    #[must_use]
    pub fn from_event_name(name: &str) -> Option<Self> {
        let name = name
            .strip_prefix("mouse")
            .or_else(|| name.strip_prefix("pointer"))
            .unwrap_or(name);
        match name {
            "down" => Some(Self::Down),
            "move" => Some(Self::Move),
            "up" => Some(Self::Up),
            "leave" | "out" => Some(Self::Leave),
            _ => None,
        }
    }
}

/// A raw pointer event in client (screen) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// What happened.
    pub kind: PointerKind,
    /// Client-space position.
    pub position: Vec2,
}

impl PointerEvent {
    /// Create a pointer event.
    #[must_use]
    pub fn new(kind: PointerKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            position: Vec2::new(x, y),
        }
    }
}

/// A wheel event; only the vertical delta matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    /// Negative scrolls up (zoom in), positive scrolls down (zoom out).
    pub delta_y: f64,
}

/// Handle for removing a pointer listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Rebuild an id from its raw value.
    #[must_use]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// Callback receiving the world-space pointer position.
pub type PointerCallback = Box<dyn FnMut(&mut Scene, Vec2)>;

/// Callback fired once when a freehand line is finished.
pub type StrokeFinished = Box<dyn FnOnce(&mut Scene, ObjectId)>;

pub(crate) enum Handler {
    /// `None` while the callback is running.
    Callback(Option<PointerCallback>),
    ExtendStroke(ObjectId),
    FinishStroke {
        stroke: ObjectId,
        move_listener: ListenerId,
        on_finish: Option<StrokeFinished>,
    },
}

/// What the scene must do for one listener during dispatch.
pub(crate) enum Action {
    Callback(PointerCallback),
    ExtendStroke(ObjectId),
    FinishStroke(ObjectId, Option<StrokeFinished>),
}

struct Listener {
    id: ListenerId,
    kind: PointerKind,
    handler: Handler,
}

/// Pointer listeners in registration order.
#[derive(Default)]
pub(crate) struct PointerListeners {
    next: u64,
    entries: Vec<Listener>,
}

impl PointerListeners {
    pub(crate) fn add(&mut self, kind: PointerKind, handler: Handler) -> ListenerId {
        self.next += 1;
        let id = ListenerId(self.next);
        self.entries.push(Listener { id, kind, handler });
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|l| l.id != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot of the listeners for `kind`, taken before dispatch starts.
    pub(crate) fn ids_for(&self, kind: PointerKind) -> Vec<ListenerId> {
        self.entries
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| l.id)
            .collect()
    }

    /// Claim the work for one listener. Returns `None` if it was removed.
    ///
    /// Stroke-finishing listeners unregister themselves and their move
    /// listener here, so they can only ever fire once.
    pub(crate) fn take_action(&mut self, id: ListenerId) -> Option<Action> {
        let index = self.entries.iter().position(|l| l.id == id)?;
        match &mut self.entries[index].handler {
            Handler::Callback(slot) => slot.take().map(Action::Callback),
            Handler::ExtendStroke(stroke) => Some(Action::ExtendStroke(*stroke)),
            Handler::FinishStroke { .. } => {
                let listener = self.entries.remove(index);
                let Handler::FinishStroke {
                    stroke,
                    move_listener,
                    on_finish,
                } = listener.handler
                else {
                    return None;
                };
                self.remove(move_listener);
                Some(Action::FinishStroke(stroke, on_finish))
            }
        }
    }

    /// Put a callback back after it ran, unless it was removed meanwhile.
    pub(crate) fn restore(&mut self, id: ListenerId, callback: PointerCallback) {
        if let Some(listener) = self.entries.iter_mut().find(|l| l.id == id) {
            if let Handler::Callback(slot) = &mut listener.handler {
                *slot = Some(callback);
            }
        }
    }
}

impl std::fmt::Debug for PointerListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerListeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
