//! Fade-gate state machine
//!
//! `FadeGate` reveals a wrapped content block exactly once, gated on two
//! independent boolean inputs: an external "can start" signal and viewport
//! visibility. The moment both have been true, the gate transitions to
//! `Visible` and latches - later flips of either input are ignored for the
//! lifetime of the instance.
//!
//! ```text
//! Hidden --(seen visible & can_start)--> Visible   (terminal)
//! ```
//!
//! Visibility uses a reveal-once intersection policy: the watch advertised
//! by [`FadeGate::watch_options`] latches at the observer after the first
//! `true`, and the gate additionally remembers having been seen, so the two
//! halves agree even when transitions are delivered by hand.

use crate::clamped_secs;
use inview_animation::{Easing, FadeAnimation, FadeId, SchedulerHandle};
use inview_core::{VisibilitySink, WatchOptions};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DEFAULT_FADE_DURATION: Duration = Duration::from_secs(1);
const DEFAULT_THRESHOLD: f32 = 0.5;

/// Lifecycle state of a fade gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    /// Gate conditions not yet met; content hidden
    Hidden,
    /// Revealed; terminal
    Visible,
}

impl GateState {
    pub fn is_hidden(&self) -> bool {
        matches!(self, GateState::Hidden)
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, GateState::Visible)
    }
}

struct GateCore {
    handle: SchedulerHandle,
    state: GateState,
    can_start: bool,
    /// Latched on the first `true` visibility transition
    seen_visible: bool,
    fade_duration: Duration,
    threshold: f32,
    fade: Option<FadeId>,
    classes: Vec<String>,
}

impl GateCore {
    /// One-way transition; the guard clause makes the latch auditable
    fn try_reveal(&mut self) {
        if self.state.is_visible() {
            return;
        }
        if self.can_start && self.seen_visible {
            self.state = GateState::Visible;
            let fade = FadeAnimation::new(self.fade_duration.as_millis() as u32)
                .with_easing(Easing::EaseOut)
                .started();
            self.fade = self.handle.register_fade(fade);
            tracing::debug!("gate revealed");
        }
    }
}

impl Drop for GateCore {
    fn drop(&mut self) {
        if let Some(id) = self.fade.take() {
            self.handle.remove_fade(id);
        }
    }
}

/// Reveal-once gate over a content block
///
/// Cheap to clone; clones share the same gate state, which is how a
/// completion callback elsewhere (see [`crate::sequence::gate_after`]) can
/// release the gate it captured.
///
/// # Example
///
/// ```ignore
/// let body = FadeGate::new(scheduler.handle()).class("hero-body");
/// tracker.watch(bounds, body.watch_options(), body.visibility_sink());
///
/// // Somewhere else, when the headline finishes:
/// body.set_can_start(true);
/// ```
#[derive(Clone)]
pub struct FadeGate {
    core: Arc<Mutex<GateCore>>,
}

impl FadeGate {
    /// Create a gate; `can_start` defaults to true, the fade to 1s
    pub fn new(handle: SchedulerHandle) -> Self {
        Self {
            core: Arc::new(Mutex::new(GateCore {
                handle,
                state: GateState::Hidden,
                can_start: true,
                seen_visible: false,
                fade_duration: DEFAULT_FADE_DURATION,
                threshold: DEFAULT_THRESHOLD,
                fade: None,
                classes: Vec::new(),
            })),
        }
    }

    // ========================================================================
    // Builder configuration
    // ========================================================================

    /// Opacity fade length on reveal, in seconds (negative clamps to zero)
    pub fn fade_duration(self, seconds: f32) -> Self {
        self.core.lock().unwrap().fade_duration = clamped_secs(seconds);
        self
    }

    /// Fraction of the element that must be in view (default 0.5)
    pub fn visibility_threshold(self, threshold: f32) -> Self {
        self.core.lock().unwrap().threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Initial `can_start` value
    pub fn can_start(self, flag: bool) -> Self {
        self.set_can_start(flag);
        self
    }

    /// Append a styling class passed through untouched to the snapshot
    pub fn class(self, class: impl Into<String>) -> Self {
        self.core.lock().unwrap().classes.push(class.into());
        self
    }

    // ========================================================================
    // Runtime inputs
    // ========================================================================

    /// Flip the external "can start" signal
    ///
    /// Ignored once the gate has revealed.
    pub fn set_can_start(&self, flag: bool) {
        let mut guard = self.core.lock().unwrap();
        if guard.state.is_visible() {
            return;
        }
        guard.can_start = flag;
        guard.try_reveal();
    }

    /// Report a visibility transition from the host
    ///
    /// A `true` latches "seen"; `false` carries no information the gate
    /// cares about.
    pub fn set_visible(&self, visible: bool) {
        let mut guard = self.core.lock().unwrap();
        if guard.state.is_visible() {
            return;
        }
        if visible {
            guard.seen_visible = true;
        }
        guard.try_reveal();
    }

    /// A sink suitable for [`inview_core::VisibilityObserver::watch`]
    pub fn visibility_sink(&self) -> VisibilitySink {
        let weak = Arc::downgrade(&self.core);
        Box::new(move |visible| {
            if let Some(core) = weak.upgrade() {
                let gate = FadeGate { core };
                gate.set_visible(visible);
            }
        })
    }

    /// Watch options for this gate: reveal-once at the configured threshold
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            threshold: self.core.lock().unwrap().threshold,
            once: true,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> GateState {
        self.core.lock().unwrap().state
    }

    /// Whether the gate has (permanently) revealed
    pub fn revealed(&self) -> bool {
        self.state().is_visible()
    }

    /// Current presentation opacity: 0.0 while hidden, the fade's value
    /// while revealing, 1.0 once settled
    pub fn opacity(&self) -> f32 {
        let guard = self.core.lock().unwrap();
        if guard.state.is_hidden() {
            return 0.0;
        }
        match guard.fade {
            Some(id) => guard.handle.fade_value(id).unwrap_or(1.0),
            None => 1.0,
        }
    }

    /// Styling classes, untouched
    pub fn classes(&self) -> Vec<String> {
        self.core.lock().unwrap().classes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inview_animation::TimerScheduler;

    #[test]
    fn test_hidden_until_both_inputs() {
        let scheduler = TimerScheduler::new();

        // can_start defaults true: visibility alone reveals
        let gate = FadeGate::new(scheduler.handle());
        assert!(!gate.revealed());
        gate.set_visible(true);
        assert!(gate.revealed());

        // With can_start held false, visibility is not enough
        let gate = FadeGate::new(scheduler.handle()).can_start(false);
        gate.set_visible(true);
        assert!(!gate.revealed());
        assert_eq!(gate.opacity(), 0.0);

        gate.set_can_start(true);
        assert!(gate.revealed());
    }

    #[test]
    fn test_seen_visibility_is_latched() {
        let scheduler = TimerScheduler::new();
        let gate = FadeGate::new(scheduler.handle()).can_start(false);

        // Seen while blocked, then scrolled away before release
        gate.set_visible(true);
        gate.set_visible(false);
        assert!(!gate.revealed());

        // The earlier sighting still counts
        gate.set_can_start(true);
        assert!(gate.revealed());
    }

    #[test]
    fn test_reveal_is_permanent() {
        let scheduler = TimerScheduler::new();
        let gate = FadeGate::new(scheduler.handle());
        gate.set_visible(true);
        assert!(gate.revealed());

        // Neither input can take it back
        gate.set_can_start(false);
        gate.set_visible(false);
        assert!(gate.revealed());
        assert_eq!(gate.state(), GateState::Visible);
    }

    #[test]
    fn test_opacity_fades_in() {
        let scheduler = TimerScheduler::new();
        let gate = FadeGate::new(scheduler.handle()).fade_duration(1.0);

        assert_eq!(gate.opacity(), 0.0);
        gate.set_visible(true);

        scheduler.advance(Duration::from_millis(500));
        let mid = gate.opacity();
        assert!(mid > 0.0 && mid < 1.0);

        scheduler.advance(Duration::from_millis(500));
        assert!((gate.opacity() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_watch_options_reveal_once() {
        let scheduler = TimerScheduler::new();
        let gate = FadeGate::new(scheduler.handle()).visibility_threshold(0.75);

        let options = gate.watch_options();
        assert!(options.once);
        assert!((options.threshold - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_classes_pass_through() {
        let scheduler = TimerScheduler::new();
        let gate = FadeGate::new(scheduler.handle())
            .class("hero-body")
            .class("mt-8");
        assert_eq!(gate.classes(), vec!["hero-body", "mt-8"]);
    }

    #[test]
    fn test_sink_after_drop_is_inert() {
        let scheduler = TimerScheduler::new();
        let gate = FadeGate::new(scheduler.handle());
        let mut sink = gate.visibility_sink();

        drop(gate);
        sink(true);
        assert_eq!(scheduler.fade_count(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let scheduler = TimerScheduler::new();
        let gate = FadeGate::new(scheduler.handle()).can_start(false);
        let shared = gate.clone();

        gate.set_visible(true);
        shared.set_can_start(true);
        assert!(gate.revealed());
        assert!(shared.revealed());
    }
}
