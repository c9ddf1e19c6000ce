//! Pointer drag gestures: heading/token drag-and-drop and the split-pane
//! divider.
//!
//! A gesture registers its global move/up listeners through a
//! [`ListenerGuard`], so they are released however the gesture ends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Pointer travel, in pixels, before a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 4.0;

pub const MIN_PANE_RATIO: f64 = 0.2;
pub const MAX_PANE_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DragPayload {
    Heading(String),
    Token(String),
    Divider,
}

/// Counts global pointer listeners currently installed.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    active: Arc<AtomicUsize>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> ListenerGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        ListenerGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Installed listener; unregisters on drop.
#[derive(Debug)]
pub struct ListenerGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Pointer is down but hasn't moved past the threshold.
    Pressed,
    Active,
}

/// How a gesture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome<P> {
    /// Released without passing the threshold.
    Click(P),
    Dropped { payload: P, at: Point },
    Cancelled,
}

#[derive(Debug)]
pub struct DragGesture<P> {
    payload: P,
    origin: Point,
    last: Point,
    phase: Phase,
    _listeners: ListenerGuard,
}

impl<P> DragGesture<P> {
    /// Pointer down: installs the move/up listeners.
    pub fn start(payload: P, origin: Point, registry: &ListenerRegistry) -> Self {
        Self {
            payload,
            origin,
            last: origin,
            phase: Phase::Pressed,
            _listeners: registry.register(),
        }
    }

    /// Pointer move. Returns whether the gesture is active afterwards.
    pub fn move_to(&mut self, to: Point) -> bool {
        self.last = to;
        if self.phase == Phase::Pressed && self.origin.distance(to) > DRAG_THRESHOLD {
            self.phase = Phase::Active;
        }
        self.is_active()
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Horizontal travel since pointer down.
    pub fn dx(&self) -> f64 {
        self.last.x - self.origin.x
    }

    /// Pointer up. Listeners are released with the gesture.
    pub fn release(mut self, at: Point) -> DragOutcome<P> {
        self.move_to(at);
        match self.phase {
            Phase::Pressed => DragOutcome::Click(self.payload),
            Phase::Active => DragOutcome::Dropped {
                payload: self.payload,
                at,
            },
        }
    }

    pub fn cancel(self) -> DragOutcome<P> {
        DragOutcome::Cancelled
    }
}

/// Resizable two-pane layout (passage | questions).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPane {
    ratio: f64,
    width: f64,
}

impl Default for SplitPane {
    fn default() -> Self {
        Self {
            ratio: 0.5,
            width: 0.0,
        }
    }
}

impl SplitPane {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Left pane share of the width.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn set_width(&mut self, width: f64) {
        self.width = width;
    }

    pub fn set_ratio(&mut self, ratio: f64) {
        self.ratio = if ratio.is_nan() {
            0.5
        } else {
            ratio.clamp(MIN_PANE_RATIO, MAX_PANE_RATIO)
        };
    }

    /// Follow an active divider drag that began at ratio `from`.
    pub fn follow(&mut self, from: f64, gesture: &DragGesture<DragPayload>) {
        if !gesture.is_active() || self.width <= 0.0 {
            return;
        }
        self.set_ratio(from + gesture.dx() / self.width);
    }
}
