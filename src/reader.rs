//! Reader-mode swipe gesture classification.
//!
//! Resolves the scroll-vs-swipe ambiguity with fixed pixel thresholds, then
//! classifies navigation intent on release by displacement ratio or release
//! velocity. A deterministic decision table; there is no hidden state beyond
//! the sticky per-gesture lock.

/// Accumulated vertical displacement that locks the gesture to scrolling.
pub const SCROLL_LOCK_PX: f32 = 20.0;
/// Accumulated horizontal displacement that locks the gesture to dragging.
pub const DRAG_LOCK_PX: f32 = 40.0;
/// Fraction of the viewport width that counts as a navigation drag.
pub const NAV_RATIO: f32 = 0.25;
/// Release velocity (px/s) that counts as a navigation fling.
pub const NAV_VELOCITY: f32 = 500.0;
/// Damping factor applied to drags past the first/last item.
pub const RUBBER_BAND: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureLock {
    Undecided,
    Scroll,
    Drag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIntent {
    Prev,
    Next,
    Stay,
}

#[derive(Debug, Clone)]
pub struct SwipeTracker {
    viewport_width: f32,
    at_first: bool,
    at_last: bool,
    lock: GestureLock,
    dx: f32,
    dy: f32,
    last_dx: f32,
    last_t_ms: f64,
    velocity: f32,
}

impl SwipeTracker {
    pub fn new(viewport_width: f32) -> Self {
        SwipeTracker {
            viewport_width: viewport_width.max(1.0),
            at_first: false,
            at_last: false,
            lock: GestureLock::Undecided,
            dx: 0.0,
            dy: 0.0,
            last_dx: 0.0,
            last_t_ms: 0.0,
            velocity: 0.0,
        }
    }

    /// Mark list-boundary position; drags past a boundary are damped and
    /// never navigate past it.
    pub fn with_bounds(mut self, at_first: bool, at_last: bool) -> Self {
        self.at_first = at_first;
        self.at_last = at_last;
        self
    }

    pub fn lock(&self) -> GestureLock {
        self.lock
    }

    pub fn begin(&mut self, t_ms: f64) {
        self.lock = GestureLock::Undecided;
        self.dx = 0.0;
        self.dy = 0.0;
        self.last_dx = 0.0;
        self.last_t_ms = t_ms;
        self.velocity = 0.0;
    }

    /// Feed accumulated displacement for the gesture so far.
    pub fn update(&mut self, dx: f32, dy: f32, t_ms: f64) {
        let dt = (t_ms - self.last_t_ms) as f32;
        if dt > 0.0 {
            self.velocity = (dx - self.last_dx) / dt * 1000.0;
        }
        self.last_dx = dx;
        self.last_t_ms = t_ms;
        self.dx = dx;
        self.dy = dy;

        if self.lock == GestureLock::Undecided {
            // Whichever threshold is crossed first wins, and the lock is
            // sticky for the rest of the gesture.
            if dy.abs() >= SCROLL_LOCK_PX && dy.abs() > dx.abs() {
                self.lock = GestureLock::Scroll;
            } else if dx.abs() >= DRAG_LOCK_PX {
                self.lock = GestureLock::Drag;
            }
        }
    }

    /// Offset to render the dragged card at: the raw drag, rubber-banded at
    /// list boundaries.
    pub fn offset(&self) -> f32 {
        if self.lock != GestureLock::Drag {
            return 0.0;
        }
        let out_of_bounds =
            (self.dx > 0.0 && self.at_first) || (self.dx < 0.0 && self.at_last);
        if out_of_bounds {
            self.dx * RUBBER_BAND
        } else {
            self.dx
        }
    }

    /// Classify the gesture on pointer release.
    pub fn release(&mut self) -> NavIntent {
        let intent = self.classify();
        self.lock = GestureLock::Undecided;
        intent
    }

    fn classify(&self) -> NavIntent {
        if self.lock != GestureLock::Drag {
            return NavIntent::Stay;
        }
        let far_enough = self.dx.abs() >= self.viewport_width * NAV_RATIO;
        let fast_enough = self.velocity.abs() >= NAV_VELOCITY
            && self.velocity.signum() == self.dx.signum();
        if !far_enough && !fast_enough {
            return NavIntent::Stay;
        }
        // Dragging right reveals the previous item, left the next.
        if self.dx > 0.0 {
            if self.at_first {
                NavIntent::Stay
            } else {
                NavIntent::Prev
            }
        } else if self.at_last {
            NavIntent::Stay
        } else {
            NavIntent::Next
        }
    }
}
