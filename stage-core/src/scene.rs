//! Scene graph: an arena of drawable objects organised into named layers.

use std::collections::HashMap;

use crate::{
    event::{Action, Handler, PointerListeners},
    Attrs, CanvasError, CanvasResult, Circle, DrawLine, DrawObject, Group, IdAllocator, Line,
    ListenerId, ObjectId, ObjectKind, Painter, PointerKind, StrokeFinished, Style, Vec2,
};

/// All objects of one stage, the layer registry and the pointer listeners.
#[derive(Debug, Default)]
pub struct Scene {
    ids: IdAllocator,
    objects: HashMap<ObjectId, DrawObject>,
    layers: HashMap<String, ObjectId>,
    /// Layers in creation order, which is also draw order.
    layer_order: Vec<(String, ObjectId)>,
    listeners: PointerListeners,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the layer called `name`, creating it on first access.
    pub fn layer(&mut self, name: &str) -> ObjectId {
        if let Some(id) = self.layers.get(name) {
            return *id;
        }
        let id = self.ids.allocate();
        self.objects.insert(
            id,
            DrawObject {
                id,
                parent: None,
                attrs: Attrs::new(),
                kind: ObjectKind::Layer(Group::new()),
            },
        );
        self.layers.insert(name.to_string(), id);
        self.layer_order.push((name.to_string(), id));
        tracing::debug!(layer = name, %id, "Created layer");
        id
    }

    /// Look up an existing layer without creating it.
    #[must_use]
    pub fn find_layer(&self, name: &str) -> Option<ObjectId> {
        self.layers.get(name).copied()
    }

    /// Layer names in draw order.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layer_order.iter().map(|(name, _)| name.as_str())
    }

    /// Get an object by id.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&DrawObject> {
        self.objects.get(&id)
    }

    /// Children of a group or layer in draw order; empty for anything else.
    #[must_use]
    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.objects
            .get(&id)
            .and_then(|o| o.kind.as_group())
            .map_or(&[][..], Group::children)
    }

    /// Owning group of an object; `None` for layers and unknown ids.
    #[must_use]
    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.objects.get(&id).and_then(|o| o.parent)
    }

    /// The layer an object ultimately belongs to, found by walking parents.
    #[must_use]
    pub fn layer_of(&self, id: ObjectId) -> Option<ObjectId> {
        let mut current = self.objects.get(&id)?;
        while let Some(parent) = current.parent {
            current = self.objects.get(&parent)?;
        }
        matches!(current.kind, ObjectKind::Layer(_)).then_some(current.id)
    }

    /// Number of objects, layers included.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene has no objects at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Caller attributes of an object.
    #[must_use]
    pub fn attrs(&self, id: ObjectId) -> Option<&Attrs> {
        self.objects.get(&id).map(|o| &o.attrs)
    }

    /// Mutable caller attributes of an object.
    pub fn attrs_mut(&mut self, id: ObjectId) -> Option<&mut Attrs> {
        self.objects.get_mut(&id).map(|o| &mut o.attrs)
    }

    /// Mutable point list of a line or freehand line.
    pub fn line_points_mut(&mut self, id: ObjectId) -> Option<&mut Vec<Vec2>> {
        match &mut self.objects.get_mut(&id)?.kind {
            ObjectKind::Line(line) | ObjectKind::DrawLine(DrawLine { line, .. }) => {
                Some(&mut line.points)
            }
            _ => None,
        }
    }

    /// Mutable circle data.
    pub fn circle_mut(&mut self, id: ObjectId) -> Option<&mut Circle> {
        match &mut self.objects.get_mut(&id)?.kind {
            ObjectKind::Circle(circle) => Some(circle),
            _ => None,
        }
    }

    /// Reposition a group without touching its children.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown, not a group, or a layer.
    pub fn set_group_offset(&mut self, id: ObjectId, offset: Vec2) -> CanvasResult<()> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(CanvasError::ObjectNotFound(id))?;
        match &mut object.kind {
            ObjectKind::Group(group) => {
                group.offset = offset;
                Ok(())
            }
            ObjectKind::Layer(_) => Err(CanvasError::InvalidOperation(format!(
                "layer {id} has no offset"
            ))),
            _ => Err(CanvasError::NotAGroup(id)),
        }
    }

    fn insert(&mut self, parent: ObjectId, attrs: Attrs, kind: ObjectKind) -> CanvasResult<ObjectId> {
        let container = self
            .objects
            .get(&parent)
            .ok_or(CanvasError::ObjectNotFound(parent))?;
        if container.kind.as_group().is_none() {
            return Err(CanvasError::NotAGroup(parent));
        }

        let id = self.ids.allocate();
        tracing::trace!(%id, %parent, kind = kind.name(), "Adding object");
        if let Some(group) = self
            .objects
            .get_mut(&parent)
            .and_then(|o| o.kind.as_group_mut())
        {
            group.push(id);
        }
        self.objects.insert(
            id,
            DrawObject {
                id,
                parent: Some(parent),
                attrs,
                kind,
            },
        );
        Ok(id)
    }

    /// Append a polyline to `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown or not a group/layer.
    pub fn add_line(
        &mut self,
        parent: ObjectId,
        points: &[Vec2],
        style: &Style,
        attrs: Attrs,
    ) -> CanvasResult<ObjectId> {
        self.insert(parent, attrs, ObjectKind::Line(Line::new(points, style)))
    }

    /// Append a circle to `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown or not a group/layer.
    pub fn add_circle(
        &mut self,
        parent: ObjectId,
        center: Vec2,
        radius: f64,
        style: &Style,
        attrs: Attrs,
    ) -> CanvasResult<ObjectId> {
        self.insert(
            parent,
            attrs,
            ObjectKind::Circle(Circle::new(center, radius, style)),
        )
    }

    /// Append an empty group to `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown or not a group/layer.
    pub fn add_group(&mut self, parent: ObjectId, attrs: Attrs) -> CanvasResult<ObjectId> {
        self.insert(parent, attrs, ObjectKind::Group(Group::new()))
    }

    /// Append a freehand line that follows the pointer until it is released.
    ///
    /// Pointer moves extend the line (honouring `style.smooth`); the next
    /// pointer up stops it and calls `on_finish` exactly once.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown or not a group/layer.
    pub fn add_draw_line(
        &mut self,
        parent: ObjectId,
        points: &[Vec2],
        style: &Style,
        attrs: Attrs,
        on_finish: impl FnOnce(&mut Scene, ObjectId) + 'static,
    ) -> CanvasResult<ObjectId> {
        let id = self.insert(
            parent,
            attrs,
            ObjectKind::DrawLine(DrawLine::new(points, style)),
        )?;

        let move_listener = self
            .listeners
            .add(PointerKind::Move, Handler::ExtendStroke(id));
        self.listeners.add(
            PointerKind::Up,
            Handler::FinishStroke {
                stroke: id,
                move_listener,
                on_finish: Some(Box::new(on_finish)),
            },
        );
        tracing::debug!(%id, layer = ?self.layer_of(id), "Freehand line started");
        Ok(id)
    }

    fn reorder(&mut self, id: ObjectId, op: fn(&mut Group, ObjectId)) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(group) = self
            .objects
            .get_mut(&parent)
            .and_then(|o| o.kind.as_group_mut())
        {
            op(group, id);
        }
    }

    /// Move an object behind all its siblings.
    pub fn move_to_bottom(&mut self, id: ObjectId) {
        self.reorder(id, Group::move_to_bottom);
    }

    /// Move an object in front of all its siblings.
    pub fn move_to_top(&mut self, id: ObjectId) {
        self.reorder(id, Group::move_to_top);
    }

    /// Swap an object with the sibling just behind it.
    pub fn move_down(&mut self, id: ObjectId) {
        self.reorder(id, Group::move_down);
    }

    /// Swap an object with the sibling just in front of it.
    pub fn move_up(&mut self, id: ObjectId) {
        self.reorder(id, Group::move_up);
    }

    /// Register a callback for world-space pointer events of `kind`.
    pub fn add_pointer_listener(
        &mut self,
        kind: PointerKind,
        callback: impl FnMut(&mut Scene, Vec2) + 'static,
    ) -> ListenerId {
        self.listeners
            .add(kind, Handler::Callback(Some(Box::new(callback))))
    }

    /// Remove a pointer listener. Returns whether it was registered.
    pub fn remove_pointer_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Number of registered pointer listeners, freehand lines included.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Run the listeners registered for `kind` with a world-space position.
    ///
    /// Listeners added while dispatching wait for the next event; listeners
    /// removed while dispatching do not run.
    pub fn dispatch_pointer(&mut self, kind: PointerKind, position: Vec2) {
        for id in self.listeners.ids_for(kind) {
            match self.listeners.take_action(id) {
                Some(Action::Callback(mut callback)) => {
                    callback(self, position);
                    self.listeners.restore(id, callback);
                }
                Some(Action::ExtendStroke(stroke)) => self.extend_stroke(stroke, position),
                Some(Action::FinishStroke(stroke, on_finish)) => {
                    self.finish_stroke(stroke, on_finish);
                }
                None => {}
            }
        }
    }

    fn extend_stroke(&mut self, id: ObjectId, position: Vec2) {
        if let Some(ObjectKind::DrawLine(line)) = self.objects.get_mut(&id).map(|o| &mut o.kind) {
            if line.extend(position) {
                tracing::trace!(%id, x = position.x, y = position.y, "Stroke extended");
            }
        }
    }

    fn finish_stroke(
        &mut self,
        id: ObjectId,
        on_finish: Option<StrokeFinished>,
    ) {
        if let Some(ObjectKind::DrawLine(line)) = self.objects.get_mut(&id).map(|o| &mut o.kind) {
            line.active = false;
            tracing::debug!(%id, points = line.line.points.len(), "Freehand line finished");
        }
        if let Some(on_finish) = on_finish {
            on_finish(self, id);
        }
    }

    /// Draw every layer in creation order.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the painter.
    pub fn draw<P: Painter + ?Sized>(&self, painter: &mut P) -> CanvasResult<()> {
        for (_, layer) in &self.layer_order {
            self.draw_object(*layer, Vec2::ZERO, painter)?;
        }
        Ok(())
    }

    fn draw_object<P: Painter + ?Sized>(
        &self,
        id: ObjectId,
        offset: Vec2,
        painter: &mut P,
    ) -> CanvasResult<()> {
        let Some(object) = self.objects.get(&id) else {
            return Ok(());
        };
        match &object.kind {
            ObjectKind::Line(line) | ObjectKind::DrawLine(DrawLine { line, .. }) => {
                let points: Vec<Vec2> = line.points.iter().map(|p| *p + offset).collect();
                painter.polyline(&points, false, &line.stroke)
            }
            ObjectKind::Circle(circle) => {
                let center = circle.center + offset;
                if let Some(fill) = &circle.fill {
                    painter.circle_fill(center, circle.radius, fill)?;
                }
                painter.circle(center, circle.radius, &circle.stroke)
            }
            ObjectKind::Group(group) | ObjectKind::Layer(group) => {
                let offset = offset + group.offset;
                for child in group.children() {
                    self.draw_object(*child, offset, painter)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StrokeStyle;
    use std::{cell::RefCell, rc::Rc};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Polyline(Vec<Vec2>),
        Circle(Vec2, f64),
        Fill(Vec2, String),
    }

    #[derive(Default)]
    struct MockPainter {
        calls: Vec<Call>,
    }

    impl Painter for MockPainter {
        fn segment(&mut self, from: Vec2, to: Vec2, _: &StrokeStyle) -> CanvasResult<()> {
            self.calls.push(Call::Polyline(vec![from, to]));
            Ok(())
        }

        fn polyline(&mut self, points: &[Vec2], _: bool, _: &StrokeStyle) -> CanvasResult<()> {
            self.calls.push(Call::Polyline(points.to_vec()));
            Ok(())
        }

        fn circle(&mut self, center: Vec2, radius: f64, _: &StrokeStyle) -> CanvasResult<()> {
            self.calls.push(Call::Circle(center, radius));
            Ok(())
        }

        fn circle_fill(&mut self, center: Vec2, _: f64, color: &str) -> CanvasResult<()> {
            self.calls.push(Call::Fill(center, color.to_string()));
            Ok(())
        }
    }

    fn v(x: f64, y: f64) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn test_layer_get_or_create() {
        let mut scene = Scene::new();
        let a = scene.layer("background");
        let b = scene.layer("ink");
        assert_eq!(scene.layer("background"), a);
        assert_ne!(a, b);
        assert_eq!(scene.layer_names().collect::<Vec<_>>(), vec!["background", "ink"]);
        assert_eq!(scene.object_count(), 2);
        assert!(scene.find_layer("missing").is_none());
    }

    #[test]
    fn test_ids_are_per_scene() {
        let mut first = Scene::new();
        let mut second = Scene::new();
        assert_eq!(first.layer("a").get(), 1);
        assert_eq!(second.layer("a").get(), 1);
    }

    #[test]
    fn test_add_requires_group_parent() {
        let mut scene = Scene::new();
        let layer = scene.layer("main");
        let line = scene
            .add_line(layer, &[v(0.0, 0.0)], &Style::default(), Attrs::new())
            .expect("add line");

        let err = scene.add_group(line, Attrs::new());
        assert!(matches!(err, Err(CanvasError::NotAGroup(id)) if id == line));

        let missing = ObjectId::from_raw(999);
        let err = scene.add_group(missing, Attrs::new());
        assert!(matches!(err, Err(CanvasError::ObjectNotFound(id)) if id == missing));
    }

    #[test]
    fn test_reorder_within_parent() {
        let mut scene = Scene::new();
        let layer = scene.layer("main");
        let style = Style::default();
        let a = scene.add_circle(layer, v(0.0, 0.0), 1.0, &style, Attrs::new()).expect("a");
        let b = scene.add_circle(layer, v(1.0, 0.0), 1.0, &style, Attrs::new()).expect("b");
        let c = scene.add_circle(layer, v(2.0, 0.0), 1.0, &style, Attrs::new()).expect("c");

        scene.move_to_top(a);
        assert_eq!(scene.children(layer), &[b, c, a]);

        scene.move_up(b);
        assert_eq!(scene.children(layer), &[c, b, a]);

        scene.move_to_bottom(a);
        scene.move_down(a);
        assert_eq!(scene.children(layer), &[a, c, b]);

        // layers have no parent and unknown ids are ignored
        scene.move_to_top(layer);
        scene.move_up(ObjectId::from_raw(42));
        assert_eq!(scene.children(layer), &[a, c, b]);
    }

    #[test]
    fn test_layer_of_walks_parents() {
        let mut scene = Scene::new();
        let layer = scene.layer("main");
        let outer = scene.add_group(layer, Attrs::new()).expect("outer");
        let inner = scene.add_group(outer, Attrs::new()).expect("inner");
        let line = scene
            .add_line(inner, &[], &Style::default(), Attrs::new())
            .expect("line");
        assert_eq!(scene.layer_of(line), Some(layer));
        assert_eq!(scene.parent(line), Some(inner));
        assert_eq!(scene.layer_of(layer), Some(layer));
    }

    #[test]
    fn test_draw_accumulates_group_offsets() {
        let mut scene = Scene::new();
        let layer = scene.layer("main");
        let outer = scene.add_group(layer, Attrs::new()).expect("outer");
        let inner = scene.add_group(outer, Attrs::new()).expect("inner");
        scene.set_group_offset(outer, v(10.0, 0.0)).expect("offset");
        scene.set_group_offset(inner, v(0.0, 5.0)).expect("offset");
        scene
            .add_circle(inner, v(1.0, 1.0), 2.0, &Style::default(), Attrs::new())
            .expect("circle");
        scene
            .add_line(outer, &[v(0.0, 0.0), v(1.0, 0.0)], &Style::default(), Attrs::new())
            .expect("line");

        let mut painter = MockPainter::default();
        scene.draw(&mut painter).expect("draw");
        assert_eq!(
            painter.calls,
            vec![
                Call::Circle(v(11.0, 6.0), 2.0),
                Call::Polyline(vec![v(10.0, 0.0), v(11.0, 0.0)]),
            ]
        );
    }

    #[test]
    fn test_layer_offset_is_rejected() {
        let mut scene = Scene::new();
        let layer = scene.layer("main");
        assert!(matches!(
            scene.set_group_offset(layer, v(1.0, 1.0)),
            Err(CanvasError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_fill_drawn_before_stroke_and_layers_in_order() {
        let mut scene = Scene::new();
        let top = scene.layer("top");
        let bottom = scene.layer("bottom");
        scene
            .add_circle(top, v(0.0, 0.0), 3.0, &Style::default().with_fill_color("red"), Attrs::new())
            .expect("filled");
        scene
            .add_line(bottom, &[v(5.0, 5.0)], &Style::default(), Attrs::new())
            .expect("line");

        let mut painter = MockPainter::default();
        scene.draw(&mut painter).expect("draw");
        assert_eq!(
            painter.calls,
            vec![
                Call::Fill(v(0.0, 0.0), "red".to_string()),
                Call::Circle(v(0.0, 0.0), 3.0),
                Call::Polyline(vec![v(5.0, 5.0)]),
            ]
        );
    }

    #[test]
    fn test_draw_line_follows_pointer_and_finishes_once() {
        let mut scene = Scene::new();
        let layer = scene.layer("ink");
        let finished = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&finished);
        let stroke = scene
            .add_draw_line(layer, &[], &Style::default(), Attrs::new(), move |scene, id| {
                let count = scene.get(id).and_then(|o| o.kind.points()).map_or(0, <[Vec2]>::len);
                sink.borrow_mut().push((id, count));
            })
            .expect("stroke");
        assert_eq!(scene.listener_count(), 2);

        scene.dispatch_pointer(PointerKind::Move, v(1.0, 1.0));
        scene.dispatch_pointer(PointerKind::Move, v(2.0, 2.0));
        scene.dispatch_pointer(PointerKind::Up, v(2.0, 2.0));
        scene.dispatch_pointer(PointerKind::Move, v(3.0, 3.0));
        scene.dispatch_pointer(PointerKind::Up, v(3.0, 3.0));

        assert_eq!(*finished.borrow(), vec![(stroke, 2)]);
        assert_eq!(scene.listener_count(), 0);
        assert_eq!(
            scene.get(stroke).and_then(|o| o.kind.points()),
            Some(&[v(1.0, 1.0), v(2.0, 2.0)][..])
        );
    }

    #[test]
    fn test_listener_can_start_stroke_on_pointer_down() {
        let mut scene = Scene::new();
        let layer = scene.layer("ink");
        scene.add_pointer_listener(PointerKind::Down, move |scene, at| {
            let style = Style::default().with_smooth(10.0);
            let _ = scene.add_draw_line(layer, &[at], &style, Attrs::new(), |_, _| {});
        });

        scene.dispatch_pointer(PointerKind::Down, v(0.0, 0.0));
        for x in 1..=25 {
            scene.dispatch_pointer(PointerKind::Move, v(f64::from(x), 0.0));
        }
        scene.dispatch_pointer(PointerKind::Up, v(25.0, 0.0));

        let stroke = scene.children(layer)[0];
        let points = scene.get(stroke).and_then(|o| o.kind.points()).expect("points");
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        assert_eq!(xs.len(), 3);
        for (x, expected) in xs.iter().zip([0.0, 10.0, 20.0]) {
            assert!((x - expected).abs() < 1e-9);
        }
        assert_eq!(scene.listener_count(), 1);
    }

    #[test]
    fn test_listener_removed_during_dispatch_does_not_run() {
        let mut scene = Scene::new();
        let hits = Rc::new(RefCell::new(0));
        let second_id = Rc::new(RefCell::new(None));

        let slot = Rc::clone(&second_id);
        scene.add_pointer_listener(PointerKind::Move, move |scene, _| {
            if let Some(id) = slot.borrow_mut().take() {
                scene.remove_pointer_listener(id);
            }
        });
        let counter = Rc::clone(&hits);
        let id = scene.add_pointer_listener(PointerKind::Move, move |_, _| {
            *counter.borrow_mut() += 1;
        });
        *second_id.borrow_mut() = Some(id);

        scene.dispatch_pointer(PointerKind::Move, v(0.0, 0.0));
        scene.dispatch_pointer(PointerKind::Move, v(0.0, 0.0));
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(scene.listener_count(), 1);
    }

    #[test]
    fn test_listener_only_sees_its_kind() {
        let mut scene = Scene::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = scene.add_pointer_listener(PointerKind::Leave, move |_, at| sink.borrow_mut().push(at));

        scene.dispatch_pointer(PointerKind::Move, v(1.0, 1.0));
        scene.dispatch_pointer(PointerKind::Leave, v(2.0, 2.0));
        assert!(scene.remove_pointer_listener(id));
        scene.dispatch_pointer(PointerKind::Leave, v(3.0, 3.0));

        assert_eq!(*seen.borrow(), vec![v(2.0, 2.0)]);
    }

    #[test]
    fn test_attrs_and_mutators() {
        let mut scene = Scene::new();
        let layer = scene.layer("main");
        let mut attrs = Attrs::new();
        attrs.insert("name".to_string(), serde_json::json!("spoke"));
        let line = scene
            .add_line(layer, &[v(0.0, 0.0)], &Style::default(), attrs)
            .expect("line");
        let circle = scene
            .add_circle(layer, v(0.0, 0.0), 1.0, &Style::default(), Attrs::new())
            .expect("circle");

        assert_eq!(scene.attrs(line).and_then(|a| a.get("name")), Some(&serde_json::json!("spoke")));
        scene.line_points_mut(line).expect("points").push(v(4.0, 4.0));
        scene.circle_mut(circle).expect("circle").radius = 9.0;
        assert!(scene.line_points_mut(circle).is_none());

        assert_eq!(scene.get(line).and_then(|o| o.kind.points()).map(<[Vec2]>::len), Some(2));
        assert!(matches!(
            scene.get(circle).map(|o| &o.kind),
            Some(ObjectKind::Circle(c)) if (c.radius - 9.0).abs() < f64::EPSILON
        ));
    }
}
