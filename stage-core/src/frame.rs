//! Per-frame callbacks and their cancellation handles.

use std::{cell::Cell, rc::Rc};

use crate::Scene;

/// Callback run once per frame with the elapsed milliseconds.
pub type FrameCallback = Box<dyn FnMut(&mut Scene, f64)>;

/// Cancels a scheduled frame loop or per-frame callback.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct FrameHandle {
    cancelled: Rc<Cell<bool>>,
}

impl FrameHandle {
    /// A fresh, live handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the loop. Takes effect before its next frame.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Whether [`cancel`](Self::cancel) was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Tracks frame timestamps to produce elapsed times.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    previous: Option<f64>,
}

impl FrameClock {
    /// Clock that has not ticked yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `now_ms`; returns milliseconds since the previous
    /// frame, or `0.0` on the first one.
    pub fn tick(&mut self, now_ms: f64) -> f64 {
        let elapsed = self.previous.map_or(0.0, |prev| (now_ms - prev).max(0.0));
        self.previous = Some(now_ms);
        elapsed
    }
}

struct Animation {
    handle: FrameHandle,
    clock: FrameClock,
    callback: FrameCallback,
}

/// The set of per-frame callbacks, run in registration order.
#[derive(Default)]
pub struct Animations {
    entries: Vec<Animation>,
}

impl Animations {
    /// Register a callback; the returned handle cancels it.
    pub fn add(&mut self, callback: FrameCallback) -> FrameHandle {
        let handle = FrameHandle::new();
        self.entries.push(Animation {
            handle: handle.clone(),
            clock: FrameClock::new(),
            callback,
        });
        handle
    }

    /// Number of live callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|a| !a.handle.is_cancelled()).count()
    }

    /// Whether no live callbacks remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop cancelled callbacks and run the rest for a frame at `now_ms`.
    pub fn run(&mut self, scene: &mut Scene, now_ms: f64) {
        self.entries.retain(|a| !a.handle.is_cancelled());
        for animation in &mut self.entries {
            // a callback may cancel a later one during this frame
            if animation.handle.is_cancelled() {
                continue;
            }
            let elapsed = animation.clock.tick(now_ms);
            (animation.callback)(scene, elapsed);
        }
    }
}

impl std::fmt::Debug for Animations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animations")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_first_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert!(clock.tick(1000.0).abs() < f64::EPSILON);
        assert!((clock.tick(1016.5) - 16.5).abs() < f64::EPSILON);
        assert!((clock.tick(1050.0) - 33.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_handle_clones_share_flag() {
        let handle = FrameHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_cancelled());
        handle.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_cancelled_animation_stops_running() {
        let mut scene = Scene::new();
        let mut animations = Animations::default();
        let ticks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&ticks);
        let handle = animations.add(Box::new(move |_, _| counter.set(counter.get() + 1)));

        animations.run(&mut scene, 0.0);
        animations.run(&mut scene, 16.0);
        handle.cancel();
        animations.run(&mut scene, 32.0);

        assert_eq!(ticks.get(), 2);
        assert!(animations.is_empty());
    }

    #[test]
    fn test_animation_receives_elapsed_time() {
        let mut scene = Scene::new();
        let mut animations = Animations::default();
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        animations.add(Box::new(move |_, dt| sink.borrow_mut().push(dt)));

        for now in [100.0, 116.0, 150.0] {
            animations.run(&mut scene, now);
        }
        assert_eq!(*seen.borrow(), vec![0.0, 16.0, 34.0]);
    }
}
