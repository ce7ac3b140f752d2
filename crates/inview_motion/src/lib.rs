//! Inview Motion
//!
//! Viewport-gated reveal state machines in the two shapes a landing page
//! actually needs:
//!
//! - [`StaggerReveal`]: reveal an ordered sequence of text segments with a
//!   fixed delay between each, starting when the host element becomes
//!   visible, signalling completion exactly once per cycle
//! - [`FadeGate`]: reveal a content block once, gated on an external
//!   "can start" signal AND viewport visibility, latched forever after
//!
//! Both machines schedule their timed events through a weak
//! [`inview_animation::SchedulerHandle`] and consume visibility transitions
//! through sinks compatible with [`inview_core::VisibilityObserver`]. They
//! cancel every outstanding timer and fade on teardown.
//!
//! The typical two-stage composition (headline staggers in, then the body
//! fades in) is wired by [`sequence::gate_after`].
//!
//! # Example
//!
//! ```rust
//! use inview_animation::TimerScheduler;
//! use inview_motion::prelude::*;
//! use std::time::Duration;
//!
//! let scheduler = TimerScheduler::new();
//! let headline = stagger_text(scheduler.handle(), ["Hello,", "world"])
//!     .tag(TextTag::H1)
//!     .stagger_delay(0.1)
//!     .once(true);
//!
//! // The host wires this sink to its visibility source
//! let mut sink = headline.visibility_sink();
//! sink(true);
//!
//! scheduler.advance(Duration::from_millis(100));
//! assert_eq!(headline.shown_count(), 2);
//! ```

pub mod gate;
pub mod reveal;
pub mod sequence;
pub mod text;

pub use gate::{FadeGate, GateState};
pub use reveal::{RevealState, StaggerReveal};
pub use sequence::gate_after;
pub use text::{stagger_text, SegmentView, StaggerText, TextSnapshot, TextTag};

pub mod prelude {
    //! Common imports for hosts building reveal sequences
    pub use crate::gate::{FadeGate, GateState};
    pub use crate::reveal::{RevealState, StaggerReveal};
    pub use crate::sequence::gate_after;
    pub use crate::text::{stagger_text, SegmentView, StaggerText, TextSnapshot, TextTag};
    pub use inview_animation::{SchedulerHandle, TimerScheduler};
    pub use inview_core::{Bounds, ViewportTracker, VisibilityObserver, WatchOptions};
}

use std::time::Duration;

/// Upper bound applied when converting caller-supplied seconds; keeps
/// `Duration::from_secs_f32` away from its overflow panic.
const MAX_SECONDS: f32 = 1.0e9;

/// Convert caller-supplied seconds to a `Duration`, clamping negative (and
/// NaN) input to zero.
pub(crate) fn clamped_secs(seconds: f32) -> Duration {
    // max() rather than clamp(): NaN.max(0.0) is 0.0, clamp would keep NaN
    Duration::from_secs_f32(seconds.max(0.0).min(MAX_SECONDS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_secs() {
        assert_eq!(clamped_secs(-1.0), Duration::ZERO);
        assert_eq!(clamped_secs(f32::NAN), Duration::ZERO);
        assert_eq!(clamped_secs(0.5), Duration::from_millis(500));
    }
}
