//! Staggered reveal state machine
//!
//! `StaggerReveal` sequences the reveal of N text segments with a fixed
//! delay between each, starting when the host element becomes visible and
//! signalling completion exactly once per revealing cycle.
//!
//! The machine is a three-state automaton:
//!
//! ```text
//! Hidden --(visible)--> Revealing --(all segments shown)--> Complete
//! Revealing --(visibility lost, !once)--> Hidden
//! Complete  --(visibility lost, !once)--> Hidden
//! Complete  --(repeat_delay elapsed, !once)--> Hidden --> Revealing
//! ```
//!
//! Every reveal is an independently scheduled timer: segment `i` fires at
//! `i x stagger_delay` after entering `Revealing`, and completion fires
//! after the last segment plus its transition duration. The caller's thread
//! is never blocked. Leaving `Revealing` early - visibility loss,
//! reconfiguration, drop - cancels every pending timer and removes every
//! registered fade; timer callbacks hold only a weak reference to the
//! machine, so a callback collected just before teardown lands on nothing.

use crate::clamped_secs;
use inview_animation::{Easing, FadeAnimation, FadeId, SchedulerHandle, TimerId};
use inview_core::{VisibilitySink, WatchOptions};
use smallvec::SmallVec;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

/// Completion callback, fired once per revealing cycle
pub type CompleteCallback = Arc<dyn Fn() + Send + Sync>;

const DEFAULT_STAGGER_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_SEGMENT_DURATION: Duration = Duration::from_millis(500);

/// Lifecycle state of a staggered reveal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealState {
    /// Not visible (or reset); no segments shown
    Hidden,
    /// Segment timers are in flight
    Revealing,
    /// Every segment revealed and completion signalled
    Complete,
}

impl RevealState {
    pub fn is_hidden(&self) -> bool {
        matches!(self, RevealState::Hidden)
    }

    pub fn is_revealing(&self) -> bool {
        matches!(self, RevealState::Revealing)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, RevealState::Complete)
    }
}

struct RevealCore {
    handle: SchedulerHandle,
    segments: Vec<String>,
    stagger_delay: Duration,
    /// Per-segment opacity transition length; zero means segments snap in
    segment_duration: Duration,
    once: bool,
    repeat_delay: Option<Duration>,
    on_complete: Option<CompleteCallback>,

    state: RevealState,
    /// Last visibility reported by the host
    visible: bool,
    shown: Vec<bool>,
    fades: Vec<Option<FadeId>>,
    /// Timers owned by the current cycle (segments, completion, repeat)
    pending: SmallVec<[TimerId; 8]>,
    /// Bumped on every reset; timer callbacks from an older cycle drop out
    cycle: u64,
    cycles_completed: u64,
}

impl Drop for RevealCore {
    fn drop(&mut self) {
        for id in self.pending.drain(..) {
            self.handle.cancel(id);
        }
        for fade in self.fades.iter_mut() {
            if let Some(id) = fade.take() {
                self.handle.remove_fade(id);
            }
        }
    }
}

/// Staggered reveal of an ordered segment sequence
///
/// Built against a [`SchedulerHandle`]; driven by visibility transitions
/// (`set_visible` or a [`visibility_sink`](StaggerReveal::visibility_sink)
/// wired to an observer); queried by the host renderer for per-segment
/// presentation state.
///
/// # Example
///
/// ```ignore
/// let reveal = StaggerReveal::new(scheduler.handle(), ["Hi,", "there"])
///     .stagger_delay(0.1)
///     .once(true)
///     .on_complete(|| tracing::debug!("headline done"));
///
/// tracker.watch(bounds, reveal.watch_options(), reveal.visibility_sink());
/// ```
pub struct StaggerReveal {
    core: Arc<Mutex<RevealCore>>,
}

impl StaggerReveal {
    /// Create a reveal over the given segments
    ///
    /// Defaults: 0.1s stagger delay, 0.5s per-segment transition, not
    /// `once`, no repeat.
    pub fn new<I, S>(handle: SchedulerHandle, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let count = segments.len();
        Self {
            core: Arc::new(Mutex::new(RevealCore {
                handle,
                segments,
                stagger_delay: DEFAULT_STAGGER_DELAY,
                segment_duration: DEFAULT_SEGMENT_DURATION,
                once: false,
                repeat_delay: None,
                on_complete: None,
                state: RevealState::Hidden,
                visible: false,
                shown: vec![false; count],
                fades: vec![None; count],
                pending: SmallVec::new(),
                cycle: 0,
                cycles_completed: 0,
            })),
        }
    }

    // ========================================================================
    // Builder configuration
    // ========================================================================

    /// Delay between successive segment reveals, in seconds (negative clamps
    /// to zero)
    pub fn stagger_delay(self, seconds: f32) -> Self {
        self.set_stagger_delay(seconds);
        self
    }

    /// Per-segment opacity transition length, in seconds; zero snaps
    /// segments in with no fade
    pub fn segment_duration(self, seconds: f32) -> Self {
        reconfigure(&self.core, |core| {
            core.segment_duration = clamped_secs(seconds);
        });
        self
    }

    /// Latch once revealed: visibility loss never resets the machine
    pub fn once(self, once: bool) -> Self {
        reconfigure(&self.core, |core| core.once = once);
        self
    }

    /// Loop: this long after completion, hide and reveal again (ignored when
    /// `once` is set)
    pub fn repeat_delay(self, seconds: f32) -> Self {
        self.set_repeat_delay(Some(seconds));
        self
    }

    /// Completion callback, fired exactly once per revealing cycle
    pub fn on_complete<F>(self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.set_on_complete(callback);
        self
    }

    // ========================================================================
    // Runtime inputs
    // ========================================================================

    /// Report a visibility transition from the host
    pub fn set_visible(&self, visible: bool) {
        set_visible_impl(&self.core, visible);
    }

    /// A sink suitable for [`inview_core::VisibilityObserver::watch`]
    ///
    /// Holds only a weak reference: transitions arriving after the machine
    /// is dropped are ignored.
    pub fn visibility_sink(&self) -> VisibilitySink {
        let weak = Arc::downgrade(&self.core);
        Box::new(move |visible| {
            if let Some(core) = weak.upgrade() {
                set_visible_impl(&core, visible);
            }
        })
    }

    /// Watch options matching this machine's configuration (half the element
    /// in view; observer-level latch when `once`)
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            threshold: 0.5,
            once: self.core.lock().unwrap().once,
        }
    }

    /// Replace the completion callback
    pub fn set_on_complete<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.core.lock().unwrap().on_complete = Some(Arc::new(callback));
    }

    /// Change the stagger delay; an in-flight cycle (or repeat timer)
    /// restarts under the new schedule
    pub fn set_stagger_delay(&self, seconds: f32) {
        reconfigure(&self.core, |core| {
            core.stagger_delay = clamped_secs(seconds);
        });
    }

    /// Change or clear the repeat delay; an in-flight repeat timer restarts
    /// under the new value
    pub fn set_repeat_delay(&self, seconds: Option<f32>) {
        reconfigure(&self.core, |core| {
            core.repeat_delay = seconds.map(clamped_secs);
        });
    }

    /// Replace the segment sequence
    ///
    /// New content means a new reveal: whatever phase was in flight is
    /// cancelled, and if the element is visible the cycle restarts from
    /// segment 0.
    pub fn set_segments<I, S>(&self, segments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let restart = {
            let mut guard = self.core.lock().unwrap();
            if !guard.state.is_hidden() {
                reset_locked(&mut guard);
            }
            guard.segments = segments.into_iter().map(Into::into).collect();
            let count = guard.segments.len();
            guard.shown = vec![false; count];
            guard.fades = vec![None; count];
            guard.visible
        };
        if restart {
            begin_cycle(&self.core);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current lifecycle state
    pub fn state(&self) -> RevealState {
        self.core.lock().unwrap().state
    }

    /// The segment sequence, in reveal order
    pub fn segments(&self) -> Vec<String> {
        self.core.lock().unwrap().segments.clone()
    }

    pub fn segment_count(&self) -> usize {
        self.core.lock().unwrap().segments.len()
    }

    /// Number of segments revealed in the current cycle
    pub fn shown_count(&self) -> usize {
        self.core
            .lock()
            .unwrap()
            .shown
            .iter()
            .filter(|s| **s)
            .count()
    }

    pub fn is_segment_shown(&self, index: usize) -> bool {
        self.core
            .lock()
            .unwrap()
            .shown
            .get(index)
            .copied()
            .unwrap_or(false)
    }

    /// Current presentation opacity of a segment (0.0 until revealed, then
    /// its fade's value, 1.0 once settled)
    pub fn segment_opacity(&self, index: usize) -> f32 {
        let guard = self.core.lock().unwrap();
        if !guard.shown.get(index).copied().unwrap_or(false) {
            return 0.0;
        }
        match guard.fades.get(index).copied().flatten() {
            Some(id) => guard.handle.fade_value(id).unwrap_or(1.0),
            None => 1.0,
        }
    }

    /// Number of completed revealing cycles (grows past 1 in repeat mode)
    pub fn cycles_completed(&self) -> u64 {
        self.core.lock().unwrap().cycles_completed
    }
}

// ============================================================================
// Transition machinery
// ============================================================================

fn set_visible_impl(core: &Arc<Mutex<RevealCore>>, visible: bool) {
    let begin = {
        let mut guard = core.lock().unwrap();
        guard.visible = visible;
        if visible {
            guard.state.is_hidden()
        } else {
            // `once` means the reveal never regresses, whatever the viewport
            // does
            if !guard.once && !guard.state.is_hidden() {
                tracing::debug!("visibility lost, resetting reveal");
                reset_locked(&mut guard);
            }
            false
        }
    };
    if begin {
        begin_cycle(core);
    }
}

/// Enter `Revealing` from `Hidden` and schedule the whole cycle upfront:
/// one timer per segment plus the completion timer.
fn begin_cycle(core: &Arc<Mutex<RevealCore>>) {
    let completion = {
        let mut guard = core.lock().unwrap();
        if !guard.state.is_hidden() {
            return;
        }
        guard.state = RevealState::Revealing;
        let count = guard.segments.len();
        guard.shown = vec![false; count];
        guard.fades = vec![None; count];
        tracing::debug!(segments = count, cycle = guard.cycle, "reveal cycle started");

        if count == 0 {
            // No-op reveal: immediately complete with a single callback
            guard.state = RevealState::Complete;
            guard.cycles_completed += 1;
            schedule_repeat_locked(Arc::downgrade(core), &mut guard);
            guard.on_complete.clone()
        } else {
            let weak = Arc::downgrade(core);
            let cycle = guard.cycle;
            for index in 0..count {
                let w = weak.clone();
                let delay = guard.stagger_delay * index as u32;
                if let Some(id) = guard
                    .handle
                    .schedule(delay, move || on_segment(&w, cycle, index))
                {
                    guard.pending.push(id);
                }
            }
            // Completion lands strictly after the last segment's reveal:
            // equal deadlines fire in scheduling order
            let w = weak;
            let complete_at =
                guard.stagger_delay * (count as u32 - 1) + guard.segment_duration;
            if let Some(id) = guard
                .handle
                .schedule(complete_at, move || on_cycle_complete(&w, cycle))
            {
                guard.pending.push(id);
            }
            None
        }
    };
    // User callback runs with no machine lock held
    if let Some(callback) = completion {
        callback();
    }
}

/// Timer callback: segment `index` of `cycle` becomes shown
fn on_segment(weak: &Weak<Mutex<RevealCore>>, cycle: u64, index: usize) {
    let Some(core) = weak.upgrade() else {
        return;
    };
    let mut guard = core.lock().unwrap();
    // A timer collected just before a reset can still fire; stale cycles
    // drop out here
    if guard.cycle != cycle || !guard.state.is_revealing() {
        return;
    }
    guard.shown[index] = true;
    if !guard.segment_duration.is_zero() {
        let fade = FadeAnimation::new(guard.segment_duration.as_millis() as u32)
            .with_easing(Easing::EaseOut)
            .started();
        guard.fades[index] = guard.handle.register_fade(fade);
    }
    tracing::trace!(index, cycle, "segment revealed");
}

/// Timer callback: the cycle's last segment has finished its transition
fn on_cycle_complete(weak: &Weak<Mutex<RevealCore>>, cycle: u64) {
    let Some(core) = weak.upgrade() else {
        return;
    };
    let callback = {
        let mut guard = core.lock().unwrap();
        if guard.cycle != cycle || !guard.state.is_revealing() {
            return;
        }
        debug_assert!(guard.shown.iter().all(|s| *s));
        guard.state = RevealState::Complete;
        guard.cycles_completed += 1;
        guard.pending.clear();
        schedule_repeat_locked(Arc::downgrade(&core), &mut guard);
        tracing::debug!(cycle, "reveal cycle complete");
        guard.on_complete.clone()
    };
    if let Some(callback) = callback {
        callback();
    }
}

/// Timer callback: repeat delay elapsed after completion
fn on_repeat(weak: &Weak<Mutex<RevealCore>>, cycle: u64) {
    let Some(core) = weak.upgrade() else {
        return;
    };
    {
        let mut guard = core.lock().unwrap();
        if guard.cycle != cycle || !guard.state.is_complete() {
            return;
        }
        tracing::debug!(cycle, "repeat delay elapsed, restarting reveal");
        reset_locked(&mut guard);
        if !guard.visible {
            return;
        }
    }
    begin_cycle(&core);
}

/// Schedule the repeat timer if the configuration asks for one
fn schedule_repeat_locked(weak: Weak<Mutex<RevealCore>>, guard: &mut RevealCore) {
    if guard.once {
        if guard.repeat_delay.is_some() {
            tracing::debug!("repeat_delay has no effect while once is set");
        }
        return;
    }
    let Some(delay) = guard.repeat_delay else {
        return;
    };
    let cycle = guard.cycle;
    if let Some(id) = guard
        .handle
        .schedule(delay, move || on_repeat(&weak, cycle))
    {
        guard.pending.push(id);
    }
}

/// Cancel everything in flight and return to `Hidden`
fn reset_locked(guard: &mut RevealCore) {
    for id in guard.pending.drain(..) {
        guard.handle.cancel(id);
    }
    for fade in guard.fades.iter_mut() {
        if let Some(id) = fade.take() {
            guard.handle.remove_fade(id);
        }
    }
    for shown in guard.shown.iter_mut() {
        *shown = false;
    }
    guard.state = RevealState::Hidden;
    guard.cycle += 1;
}

/// Apply a configuration change, then restart whatever phase was in flight
/// under the new configuration (the safe interpretation of mid-cycle
/// changes: cancelled and rescheduled, never half-old half-new).
fn reconfigure(core: &Arc<Mutex<RevealCore>>, apply: impl FnOnce(&mut RevealCore)) {
    let restart = {
        let mut guard = core.lock().unwrap();
        apply(&mut guard);
        match guard.state {
            RevealState::Hidden => false,
            RevealState::Revealing => {
                reset_locked(&mut guard);
                guard.visible
            }
            RevealState::Complete => {
                // Only a repeat timer can be pending here; cancel it and
                // reschedule under the new configuration
                let g: &mut RevealCore = &mut guard;
                for id in g.pending.drain(..) {
                    g.handle.cancel(id);
                }
                guard.cycle += 1;
                schedule_repeat_locked(Arc::downgrade(core), &mut guard);
                false
            }
        }
    };
    if restart {
        begin_cycle(core);
    }
}
