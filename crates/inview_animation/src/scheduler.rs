//! Timer and fade scheduler
//!
//! Owns every pending timed event and active fade, and advances them against
//! a virtual clock. Components never talk to the scheduler directly: they
//! hold a weak [`SchedulerHandle`] obtained from [`TimerScheduler::handle`]
//! and register work through it. Once the scheduler is dropped, every handle
//! operation becomes a no-op.
//!
//! Two ways to drive the clock:
//! - `advance(dt)` adds `dt` to the virtual clock and fires what came due.
//!   Deterministic; this is what tests use.
//! - `tick()` measures real elapsed time and calls `advance`. The optional
//!   background thread (`start_background()`) does this at 120fps so reveal
//!   schedules keep running while the host event loop is idle.
//!
//! Due timers fire in (deadline, insertion) order, with the scheduler lock
//! released: a callback may schedule follow-up work, including work already
//! due in the same tick (repeat cycles restart this way).

use crate::fade::FadeAnimation;
use slotmap::{new_key_type, SlotMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

new_key_type! {
    /// Handle to a pending one-shot timer
    pub struct TimerId;
    /// Handle to a registered fade
    pub struct FadeId;
}

/// One-shot timer callback
type TimerCallback = Box<dyn FnOnce() + Send>;

/// Rounds of follow-up collection allowed within one `advance` call.
/// A zero-delay repeat cycle would otherwise spin here forever.
const MAX_CASCADE: usize = 64;

struct TimerEntry {
    /// Absolute virtual-clock deadline
    deadline: Duration,
    /// Insertion order; breaks deadline ties so equal-deadline timers fire
    /// in the order they were scheduled
    seq: u64,
    callback: TimerCallback,
}

struct SchedulerInner {
    timers: SlotMap<TimerId, TimerEntry>,
    fades: SlotMap<FadeId, FadeAnimation>,
    /// Virtual clock, advanced only by `advance`
    now: Duration,
    next_seq: u64,
    /// Wall-clock anchor for `tick()` / background mode
    last_frame: Instant,
}

/// Callback for waking up the main thread from the scheduler thread
///
/// Called when timers fired or fades progressed and the host should redraw.
pub type WakeCallback = Arc<dyn Fn() + Send + Sync>;

/// The scheduler that owns all pending timers and active fades
///
/// Typically created once by the host and shared with components via
/// [`SchedulerHandle`]. Dropping it cancels everything outstanding and stops
/// the background thread.
pub struct TimerScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
    /// Stop signal for the background thread
    stop_flag: Arc<AtomicBool>,
    /// Set by the clock whenever timers fired or fades progressed; the host
    /// checks and clears it to decide whether to redraw
    needs_redraw: Arc<AtomicBool>,
    /// Background thread handle (if running)
    thread_handle: Option<JoinHandle<()>>,
    /// Optional callback to wake up the main thread
    wake_callback: Option<WakeCallback>,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                timers: SlotMap::with_key(),
                fades: SlotMap::with_key(),
                now: Duration::ZERO,
                next_seq: 0,
                last_frame: Instant::now(),
            })),
            stop_flag: Arc::new(AtomicBool::new(false)),
            needs_redraw: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
            wake_callback: None,
        }
    }

    /// Set a wake callback invoked when timed work progressed
    ///
    /// Invoked from whichever thread advanced the clock. Use this to wake up
    /// an event loop from the background scheduler thread.
    pub fn set_wake_callback<F>(&mut self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.wake_callback = Some(Arc::new(callback));
    }

    /// Get a weak handle for components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Advance the virtual clock by `dt`, firing everything that comes due
    ///
    /// Fades are ticked once; due timers are collected, removed and fired in
    /// (deadline, insertion) order with the lock released. Callbacks that
    /// schedule already-due follow-up timers get those fired within the same
    /// call. Returns true if timers are still pending or fades still
    /// playing.
    pub fn advance(&self, dt: Duration) -> bool {
        let (fired, active) = advance_clock(&self.inner, dt);
        if fired {
            self.needs_redraw.store(true, Ordering::Release);
            if let Some(ref callback) = self.wake_callback {
                callback();
            }
        }
        active
    }

    /// Advance by real elapsed time since the previous `tick`
    pub fn tick(&self) -> bool {
        let dt = {
            let mut inner = self.inner.lock().unwrap();
            let now = Instant::now();
            let dt = now - inner.last_frame;
            inner.last_frame = now;
            dt
        };
        self.advance(dt)
    }

    /// Start driving the clock on a background thread
    ///
    /// Runs at 120fps until `stop_background()` or drop. Sets the
    /// `needs_redraw` flag and invokes the wake callback whenever timers
    /// fired or fades progressed, so the host event loop can stay asleep in
    /// between.
    pub fn start_background(&mut self) {
        if self.thread_handle.is_some() {
            return; // Already running
        }

        let inner = Arc::clone(&self.inner);
        let stop_flag = Arc::clone(&self.stop_flag);
        let needs_redraw = Arc::clone(&self.needs_redraw);
        let wake_callback = self.wake_callback.clone();

        // Anchor the frame clock here so startup time is not counted as
        // elapsed animation time.
        inner.lock().unwrap().last_frame = Instant::now();

        self.thread_handle = Some(thread::spawn(move || {
            let frame_duration = Duration::from_micros(1_000_000 / 120); // 120fps

            while !stop_flag.load(Ordering::Relaxed) {
                let start = Instant::now();

                let dt = {
                    let mut guard = inner.lock().unwrap();
                    let now = Instant::now();
                    let dt = now - guard.last_frame;
                    guard.last_frame = now;
                    dt
                };

                let (fired, active) = advance_clock(&inner, dt);

                if fired || active {
                    needs_redraw.store(true, Ordering::Release);

                    if let Some(ref callback) = wake_callback {
                        // Only log occasionally to avoid spam
                        static COUNTER: std::sync::atomic::AtomicU64 =
                            std::sync::atomic::AtomicU64::new(0);
                        let count = COUNTER.fetch_add(1, Ordering::Relaxed);
                        if count % 120 == 0 {
                            // Log once per second at 120fps
                            tracing::debug!(fired, active, "scheduler thread: waking event loop");
                        }
                        callback();
                    }
                }

                // Sleep for remaining frame time
                let elapsed = start.elapsed();
                if elapsed < frame_duration {
                    thread::sleep(frame_duration - elapsed);
                }
            }
        }));
    }

    /// Stop the background thread
    pub fn stop_background(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
        self.stop_flag.store(false, Ordering::Relaxed);
    }

    /// Check if the background thread is running
    pub fn is_background_running(&self) -> bool {
        self.thread_handle.is_some()
    }

    /// Check and clear the needs_redraw flag
    ///
    /// Atomic swap: returns the previous value and clears the flag in one
    /// operation.
    pub fn take_needs_redraw(&self) -> bool {
        self.needs_redraw.swap(false, Ordering::Acquire)
    }

    /// Manually request a redraw
    pub fn request_redraw(&self) {
        self.needs_redraw.store(true, Ordering::Release);
    }

    /// Current virtual-clock time
    pub fn now(&self) -> Duration {
        self.inner.lock().unwrap().now
    }

    /// Number of pending timers
    pub fn timer_count(&self) -> usize {
        self.inner.lock().unwrap().timers.len()
    }

    /// Number of registered fades (playing or settled)
    pub fn fade_count(&self) -> usize {
        self.inner.lock().unwrap().fades.len()
    }

    /// Check if timers are pending or fades still playing
    pub fn has_active_work(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        !inner.timers.is_empty() || inner.fades.iter().any(|(_, f)| f.is_playing())
    }
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TimerScheduler {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            stop_flag: Arc::clone(&self.stop_flag),
            needs_redraw: Arc::clone(&self.needs_redraw),
            // Cloned scheduler doesn't own the background thread
            thread_handle: None,
            wake_callback: self.wake_callback.clone(),
        }
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        // Stop background thread when scheduler is dropped
        self.stop_background();
    }
}

/// Advance the clock, tick fades once, and fire due timers in order.
/// Returns (anything fired, anything still active).
fn advance_clock(inner: &Arc<Mutex<SchedulerInner>>, dt: Duration) -> (bool, bool) {
    let mut fired_any = false;
    let mut first_round = true;

    for round in 0.. {
        // Check before collecting, so deferred timers stay queued for the
        // next tick instead of being dropped mid-flight.
        if round >= MAX_CASCADE {
            tracing::warn!(round, "timer cascade exceeded limit, deferring to next tick");
            break;
        }

        let due = {
            let mut guard = inner.lock().unwrap();
            if first_round {
                guard.now += dt;
                let dt_ms = dt.as_secs_f32() * 1000.0;
                for (_, fade) in guard.fades.iter_mut() {
                    fade.tick(dt_ms);
                }
                first_round = false;
            }

            let now = guard.now;
            let due_ids: Vec<TimerId> = guard
                .timers
                .iter()
                .filter(|(_, entry)| entry.deadline <= now)
                .map(|(id, _)| id)
                .collect();

            let mut due: Vec<TimerEntry> = due_ids
                .into_iter()
                .filter_map(|id| guard.timers.remove(id))
                .collect();
            due.sort_by_key(|entry| (entry.deadline, entry.seq));
            due
        };

        if due.is_empty() {
            break;
        }

        fired_any = true;
        for entry in due {
            (entry.callback)();
        }
    }

    let guard = inner.lock().unwrap();
    let active = !guard.timers.is_empty() || guard.fades.iter().any(|(_, f)| f.is_playing());
    (fired_any, active)
}

/// A weak handle to the scheduler
///
/// This is what components hold. It won't keep the scheduler alive, and all
/// operations degrade to `None`/no-op once the scheduler is gone - a late
/// callback can never fire into a destroyed context.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl SchedulerHandle {
    // =========================================================================
    // Timer Operations
    // =========================================================================

    /// Schedule a one-shot callback after `delay` of virtual time
    pub fn schedule<F>(&self, delay: Duration, callback: F) -> Option<TimerId>
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.upgrade().map(|inner| {
            let mut guard = inner.lock().unwrap();
            let seq = guard.next_seq;
            guard.next_seq += 1;
            let deadline = guard.now + delay;
            guard.timers.insert(TimerEntry {
                deadline,
                seq,
                callback: Box::new(callback),
            })
        })
    }

    /// Cancel a pending timer; fired or unknown ids are ignored
    pub fn cancel(&self, id: TimerId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.lock().unwrap().timers.remove(id);
        }
    }

    /// Current virtual-clock time
    pub fn now(&self) -> Option<Duration> {
        self.inner.upgrade().map(|inner| inner.lock().unwrap().now)
    }

    // =========================================================================
    // Fade Operations
    // =========================================================================

    /// Register a fade and return its ID
    pub fn register_fade(&self, fade: FadeAnimation) -> Option<FadeId> {
        self.inner
            .upgrade()
            .map(|inner| inner.lock().unwrap().fades.insert(fade))
    }

    /// Get the current eased value of a fade
    pub fn fade_value(&self, id: FadeId) -> Option<f32> {
        self.inner
            .upgrade()
            .and_then(|inner| inner.lock().unwrap().fades.get(id).map(|f| f.value()))
    }

    /// Get fade progress (0.0 to 1.0)
    pub fn fade_progress(&self, id: FadeId) -> Option<f32> {
        self.inner
            .upgrade()
            .and_then(|inner| inner.lock().unwrap().fades.get(id).map(|f| f.progress()))
    }

    /// Check if a fade is still progressing
    ///
    /// Returns `false` if the fade (or the scheduler) is gone.
    pub fn is_fade_playing(&self, id: FadeId) -> bool {
        self.inner
            .upgrade()
            .and_then(|inner| inner.lock().unwrap().fades.get(id).map(|f| f.is_playing()))
            .unwrap_or(false)
    }

    /// Remove a fade
    pub fn remove_fade(&self, id: FadeId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.lock().unwrap().fades.remove(id);
        }
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let scheduler = TimerScheduler::new();
        let handle = scheduler.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        for (delay_ms, label) in [(10u64, "b"), (5, "a"), (20, "c")] {
            let log = Arc::clone(&log);
            handle
                .schedule(Duration::from_millis(delay_ms), move || {
                    log.lock().unwrap().push(label)
                })
                .unwrap();
        }

        scheduler.advance(Duration::from_millis(50));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_equal_deadlines_fire_in_insertion_order() {
        let scheduler = TimerScheduler::new();
        let handle = scheduler.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            handle
                .schedule(Duration::ZERO, move || log.lock().unwrap().push(label))
                .unwrap();
        }

        scheduler.advance(Duration::ZERO);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_timer_does_not_fire_early() {
        let scheduler = TimerScheduler::new();
        let handle = scheduler.handle();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        handle
            .schedule(Duration::from_millis(100), move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert!(scheduler.advance(Duration::from_millis(99)));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        assert!(!scheduler.advance(Duration::from_millis(1)));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // One-shot: does not fire again
        scheduler.advance(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel() {
        let scheduler = TimerScheduler::new();
        let handle = scheduler.handle();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        let id = handle
            .schedule(Duration::from_millis(10), move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        handle.cancel(id);

        scheduler.advance(Duration::from_millis(50));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.timer_count(), 0);
    }

    #[test]
    fn test_callback_can_schedule_due_follow_up() {
        let scheduler = TimerScheduler::new();
        let handle = scheduler.handle();
        let log = Arc::new(Mutex::new(Vec::new()));

        let log2 = Arc::clone(&log);
        let handle2 = handle.clone();
        handle
            .schedule(Duration::from_millis(10), move || {
                log2.lock().unwrap().push("outer");
                let log3 = Arc::clone(&log2);
                // Already due: must fire within the same advance
                handle2.schedule(Duration::ZERO, move || {
                    log3.lock().unwrap().push("inner");
                });
            })
            .unwrap();

        scheduler.advance(Duration::from_millis(10));
        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_zero_delay_cascade_is_bounded() {
        let scheduler = TimerScheduler::new();
        let handle = scheduler.handle();
        let count = Arc::new(AtomicUsize::new(0));

        fn reschedule(handle: &SchedulerHandle, count: &Arc<AtomicUsize>) {
            let h = handle.clone();
            let c = Arc::clone(count);
            handle.schedule(Duration::ZERO, move || {
                c.fetch_add(1, Ordering::SeqCst);
                reschedule(&h, &c);
            });
        }

        reschedule(&handle, &count);
        // Must terminate; the tail of the cascade is deferred to a later tick
        scheduler.advance(Duration::ZERO);
        assert!(count.load(Ordering::SeqCst) <= MAX_CASCADE + 1);
        assert!(scheduler.has_active_work());
    }

    #[test]
    fn test_handle_weak_reference() {
        let handle = {
            let scheduler = TimerScheduler::new();
            scheduler.handle()
        };

        // Scheduler is dropped, handle should not be alive
        assert!(!handle.is_alive());

        // Operations should safely no-op
        assert!(handle.schedule(Duration::ZERO, || {}).is_none());
        assert!(handle.register_fade(FadeAnimation::new(100)).is_none());
        assert!(handle.now().is_none());
    }

    #[test]
    fn test_fades_advance_with_the_clock() {
        let scheduler = TimerScheduler::new();
        let handle = scheduler.handle();

        let id = handle
            .register_fade(
                FadeAnimation::new(1000)
                    .with_easing(crate::Easing::Linear)
                    .started(),
            )
            .unwrap();

        scheduler.advance(Duration::from_millis(250));
        assert!((handle.fade_value(id).unwrap() - 0.25).abs() < 1e-3);
        assert!(handle.is_fade_playing(id));

        scheduler.advance(Duration::from_millis(750));
        assert!((handle.fade_value(id).unwrap() - 1.0).abs() < 1e-3);
        assert!(!handle.is_fade_playing(id));

        handle.remove_fade(id);
        assert_eq!(scheduler.fade_count(), 0);
    }

    #[test]
    fn test_needs_redraw_flag() {
        let scheduler = TimerScheduler::new();
        let handle = scheduler.handle();

        assert!(!scheduler.take_needs_redraw());

        handle.schedule(Duration::from_millis(5), || {}).unwrap();
        scheduler.advance(Duration::from_millis(5));

        assert!(scheduler.take_needs_redraw());
        assert!(!scheduler.take_needs_redraw());
    }

    #[test]
    fn test_virtual_clock_accumulates() {
        let scheduler = TimerScheduler::new();

        scheduler.advance(Duration::from_millis(16));
        scheduler.advance(Duration::from_millis(16));
        assert_eq!(scheduler.now(), Duration::from_millis(32));
    }
}
