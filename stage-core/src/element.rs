//! Drawable objects - the nodes of the scene arena.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{StrokeStyle, Style, Vec2};

/// Free-form attributes attached to an object by the caller.
pub type Attrs = serde_json::Map<String, serde_json::Value>;

/// Unique identifier of an object within one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Rebuild an id from its raw value, e.g. one handed out to JavaScript.
    #[must_use]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out increasing object ids, starting at 1. Ids are never reused.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Create an allocator whose first id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// An open polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Points in the parent's coordinate space.
    pub points: Vec<Vec2>,
    /// Resolved stroke.
    pub stroke: StrokeStyle,
}

impl Line {
    /// Create a line, copying the given points.
    #[must_use]
    pub fn new(points: &[Vec2], style: &Style) -> Self {
        Self {
            points: points.to_vec(),
            stroke: style.stroke(),
        }
    }
}

/// A circle with optional fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    /// Center in the parent's coordinate space.
    pub center: Vec2,
    /// Radius in world units.
    pub radius: f64,
    /// Resolved stroke.
    pub stroke: StrokeStyle,
    /// Fill color; drawn beneath the stroke.
    pub fill: Option<String>,
}

impl Circle {
    /// Create a circle from a style record.
    #[must_use]
    pub fn new(center: Vec2, radius: f64, style: &Style) -> Self {
        Self {
            center,
            radius,
            stroke: style.stroke(),
            fill: style.fill(),
        }
    }
}

/// A line that grows from live pointer input until the pointer is released.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawLine {
    /// The line being drawn.
    pub line: Line,
    /// Minimum spacing between recorded points.
    pub smooth: Option<f64>,
    /// Whether pointer input still extends the line.
    pub active: bool,
}

impl DrawLine {
    /// Start a freehand line.
    #[must_use]
    pub fn new(points: &[Vec2], style: &Style) -> Self {
        Self {
            line: Line::new(points, style),
            smooth: style.smoothing(),
            active: true,
        }
    }

    /// Feed a pointer position. Returns whether a point was appended.
    ///
    /// Without smoothing every position is recorded. With smoothing `s`,
    /// a point is recorded only once the pointer is more than `s` away
    /// from the last one, and it lands exactly `s` along the direction
    /// of travel so that segments stay uniform.
    pub fn extend(&mut self, position: Vec2) -> bool {
        if !self.active {
            return false;
        }
        let (Some(smooth), Some(&last)) = (self.smooth, self.line.points.last()) else {
            self.line.points.push(position);
            return true;
        };
        let delta = position - last;
        let distance = delta.length();
        if distance <= smooth {
            return false;
        }
        self.line.points.push(last + delta * (smooth / distance));
        true
    }
}

/// An ordered container of children sharing one positional offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    children: Vec<ObjectId>,
    /// Offset added to every descendant when drawing.
    pub offset: Vec2,
}

impl Group {
    /// Empty group with zero offset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Children in draw order (back to front).
    #[must_use]
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Append a child at the top of the z-order.
    pub fn push(&mut self, id: ObjectId) {
        self.children.push(id);
    }

    fn position(&self, id: ObjectId) -> Option<usize> {
        self.children.iter().position(|c| *c == id)
    }

    /// Move a child to the back. Unknown ids are ignored.
    pub fn move_to_bottom(&mut self, id: ObjectId) {
        if let Some(i) = self.position(id) {
            let child = self.children.remove(i);
            self.children.insert(0, child);
        }
    }

    /// Move a child to the front. Unknown ids are ignored.
    pub fn move_to_top(&mut self, id: ObjectId) {
        if let Some(i) = self.position(id) {
            let child = self.children.remove(i);
            self.children.push(child);
        }
    }

    /// Swap a child with the one beneath it. No-op at the bottom.
    pub fn move_down(&mut self, id: ObjectId) {
        if let Some(i) = self.position(id).filter(|i| *i > 0) {
            self.children.swap(i, i - 1);
        }
    }

    /// Swap a child with the one above it. No-op at the top.
    pub fn move_up(&mut self, id: ObjectId) {
        if let Some(i) = self.position(id).filter(|i| i + 1 < self.children.len()) {
            self.children.swap(i, i + 1);
        }
    }
}

/// The shape-specific part of an object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// Static polyline.
    Line(Line),
    /// Circle.
    Circle(Circle),
    /// Freehand line driven by pointer input.
    DrawLine(DrawLine),
    /// Nested container with its own offset.
    Group(Group),
    /// Top-level container owned by the stage; its offset stays zero.
    Layer(Group),
}

impl ObjectKind {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Line(_) => "line",
            Self::Circle(_) => "circle",
            Self::DrawLine(_) => "draw-line",
            Self::Group(_) => "group",
            Self::Layer(_) => "layer",
        }
    }

    /// The child list, for groups and layers.
    #[must_use]
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Self::Group(g) | Self::Layer(g) => Some(g),
            _ => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Self::Group(g) | Self::Layer(g) => Some(g),
            _ => None,
        }
    }

    /// The point list, for lines and freehand lines.
    #[must_use]
    pub fn points(&self) -> Option<&[Vec2]> {
        match self {
            Self::Line(line) | Self::DrawLine(DrawLine { line, .. }) => Some(&line.points),
            _ => None,
        }
    }
}

/// A node in the scene arena.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawObject {
    /// Identity, stable for the object's lifetime.
    pub id: ObjectId,
    /// Owning group; `None` for layers.
    pub parent: Option<ObjectId>,
    /// Caller-supplied attributes.
    pub attrs: Attrs,
    /// Shape data.
    pub kind: ObjectKind,
}
