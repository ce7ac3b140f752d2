//! Inview Core
//!
//! Foundational primitives for the Inview reveal orchestration library:
//!
//! - **Bounds**: axis-aligned element geometry with intersection math
//! - **Visibility Observation**: a polymorphic capability reporting whether
//!   an element is sufficiently inside the viewport
//!
//! The visibility capability is deliberately small: watchers register a
//! bounds region with a threshold, and receive deduplicated boolean
//! transitions through a sink callback. Reveal state machines consume those
//! transitions without knowing anything about the surface that produced them,
//! which keeps them unit-testable without a render target.
//!
//! # Example
//!
//! ```rust
//! use inview_core::{Bounds, ViewportTracker, VisibilityObserver, WatchOptions};
//!
//! let mut tracker = ViewportTracker::new(Bounds::new(0.0, 0.0, 1280.0, 720.0));
//! let id = tracker.watch(
//!     Bounds::new(100.0, 2000.0, 600.0, 80.0),
//!     WatchOptions::default(),
//!     Box::new(|visible| println!("headline visible: {visible}")),
//! );
//!
//! // Scrolling moves the viewport; watchers are re-evaluated and notified
//! // only when their visibility actually changes.
//! tracker.set_viewport(Bounds::new(0.0, 1600.0, 1280.0, 720.0));
//! assert!(tracker.is_visible(id));
//! ```

pub mod bounds;
pub mod observer;

pub use bounds::Bounds;
pub use observer::{
    ObserverError, ViewportTracker, VisibilityObserver, VisibilitySink, WatchId, WatchOptions,
};
