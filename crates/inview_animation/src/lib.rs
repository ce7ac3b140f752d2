//! Inview Animation System
//!
//! Cancellable timer scheduling and timed opacity fades.
//!
//! # Features
//!
//! - **Timer Scheduling**: one-shot callbacks with cancellable handles,
//!   fired in deterministic (deadline, insertion) order
//! - **Virtual Clock**: `advance(dt)` drives everything explicitly, making
//!   reveal sequencing unit-testable without wall time
//! - **Fades**: fixed-duration eased opacity progressions
//! - **Background Mode**: optional thread that keeps the clock running in
//!   real time and wakes the host event loop when something changed
//!
//! Components hold a weak [`SchedulerHandle`]; once the scheduler is dropped
//! every handle operation degrades to a no-op, so a stale callback can never
//! fire into a destroyed context.

pub mod easing;
pub mod fade;
pub mod scheduler;

pub use easing::Easing;
pub use fade::FadeAnimation;
pub use scheduler::{FadeId, SchedulerHandle, TimerId, TimerScheduler, WakeCallback};
