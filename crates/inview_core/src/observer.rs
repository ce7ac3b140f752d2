//! Viewport visibility observation
//!
//! `ViewportTracker` is the host-side half of the reveal pipeline: the host
//! tells it where the viewport and the watched elements are, and it pushes
//! boolean visibility transitions into registered sinks. Sinks receive only
//! transitions - repeated evaluations with the same result are swallowed -
//! so downstream state machines can treat every call as an edge.
//!
//! A watch registered with `once: true` stops being observed after its first
//! `true`: the element is considered permanently seen, matching the
//! reveal-once policy of gated content.
//!
//! The `VisibilityObserver` trait keeps the capability polymorphic. Tests
//! drive machine sinks directly (or through a tracker with hand-fed bounds),
//! so no render surface is ever required.

use crate::bounds::Bounds;
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

new_key_type! {
    /// Handle to a registered visibility watch
    pub struct WatchId;
}

/// Errors from visibility observation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverError {
    /// The watch id does not refer to a live watch
    #[error("unknown or expired watch id")]
    UnknownWatch,
}

/// How a watch decides it is visible
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WatchOptions {
    /// Minimum fraction of the element's area that must be inside the
    /// viewport (clamped to 0.0..=1.0). A threshold of zero means any
    /// overlap counts.
    pub threshold: f32,
    /// Stop observing after the first `true` (the element stays "seen")
    pub once: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            once: false,
        }
    }
}

impl WatchOptions {
    /// Watch continuously at the given threshold
    pub fn continuous(threshold: f32) -> Self {
        Self {
            threshold,
            once: false,
        }
    }

    /// Watch until the first `true`, then latch
    pub fn once(threshold: f32) -> Self {
        Self {
            threshold,
            once: true,
        }
    }
}

/// Callback receiving visibility transitions for one watch
pub type VisibilitySink = Box<dyn FnMut(bool) + Send>;

/// A polymorphic source of visibility transitions
///
/// Implemented by `ViewportTracker` for real viewports; tests can provide
/// their own implementation (or skip the trait entirely and invoke machine
/// sinks by hand) to inject deterministic transitions.
pub trait VisibilityObserver {
    /// Register a watch for the given element bounds
    ///
    /// The sink is evaluated immediately, so an element that is already
    /// sufficiently visible reports `true` without waiting for a viewport
    /// change.
    fn watch(&mut self, bounds: Bounds, options: WatchOptions, sink: VisibilitySink) -> WatchId;

    /// Remove a watch; unknown ids are ignored
    fn unwatch(&mut self, id: WatchId);
}

struct Watch {
    bounds: Bounds,
    threshold: f32,
    once: bool,
    /// Last value pushed to the sink; `None` until the first evaluation
    last: Option<bool>,
    /// Set when a `once` watch has reported `true`
    latched: bool,
    sink: VisibilitySink,
}

impl Watch {
    fn is_visible_in(&self, viewport: &Bounds) -> bool {
        if self.threshold <= 0.0 {
            self.bounds.intersects(viewport)
        } else {
            self.bounds.fraction_inside(viewport) >= self.threshold
        }
    }
}

/// Tracks element visibility against a movable viewport
///
/// The host feeds it viewport changes (scroll, resize) and element bounds
/// changes (layout); the tracker re-evaluates affected watches and notifies
/// their sinks on transitions.
pub struct ViewportTracker {
    viewport: Bounds,
    watches: SlotMap<WatchId, Watch>,
    /// Watches currently reporting visible (latched `once` watches included)
    visible: FxHashSet<WatchId>,
}

impl ViewportTracker {
    /// Create a tracker for the given viewport
    pub fn new(viewport: Bounds) -> Self {
        Self {
            viewport,
            watches: SlotMap::with_key(),
            visible: FxHashSet::default(),
        }
    }

    /// Current viewport bounds
    pub fn viewport(&self) -> Bounds {
        self.viewport
    }

    /// Move or resize the viewport and re-evaluate every watch
    pub fn set_viewport(&mut self, viewport: Bounds) {
        self.viewport = viewport;
        let ids: Vec<WatchId> = self.watches.keys().collect();
        for id in ids {
            self.evaluate(id);
        }
    }

    /// Update a watched element's bounds (layout change) and re-evaluate it
    pub fn move_watch(&mut self, id: WatchId, bounds: Bounds) -> Result<(), ObserverError> {
        match self.watches.get_mut(id) {
            Some(watch) => {
                watch.bounds = bounds;
                self.evaluate(id);
                Ok(())
            }
            None => Err(ObserverError::UnknownWatch),
        }
    }

    /// Check if a watch currently reports visible
    ///
    /// Latched `once` watches keep reporting visible for their lifetime.
    pub fn is_visible(&self, id: WatchId) -> bool {
        self.visible.contains(&id)
    }

    /// Number of watches currently reporting visible
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Number of registered watches
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    /// Re-evaluate one watch and push a transition to its sink if changed
    fn evaluate(&mut self, id: WatchId) {
        let viewport = self.viewport;
        let transition = {
            let Some(watch) = self.watches.get_mut(id) else {
                return;
            };
            // Latched once-watches are locked: never re-observed
            if watch.latched {
                return;
            }

            let visible = watch.is_visible_in(&viewport);
            if watch.last == Some(visible) {
                None
            } else {
                watch.last = Some(visible);
                if visible && watch.once {
                    watch.latched = true;
                }
                (watch.sink)(visible);
                Some(visible)
            }
        };

        if let Some(visible) = transition {
            tracing::trace!(?id, visible, "visibility transition");
            if visible {
                self.visible.insert(id);
            } else {
                self.visible.remove(&id);
            }
        }
    }
}

impl VisibilityObserver for ViewportTracker {
    fn watch(&mut self, bounds: Bounds, options: WatchOptions, sink: VisibilitySink) -> WatchId {
        let id = self.watches.insert(Watch {
            bounds,
            threshold: options.threshold.clamp(0.0, 1.0),
            once: options.once,
            last: None,
            latched: false,
            sink,
        });
        self.evaluate(id);
        id
    }

    fn unwatch(&mut self, id: WatchId) {
        self.watches.remove(id);
        self.visible.remove(&id);
    }
}
