//! Timed opacity fades
//!
//! A fade is a fixed-duration progression between two values with an easing
//! curve, advanced by the scheduler's clock. Reveal machines register one
//! fade per revealed element.

use crate::easing::Easing;

/// A fixed-duration value progression (typically opacity 0.0 to 1.0)
#[derive(Clone, Copy, Debug)]
pub struct FadeAnimation {
    /// Duration in milliseconds
    duration_ms: u32,
    /// Elapsed time in milliseconds
    current_ms: f32,
    /// Value at progress 0.0
    from: f32,
    /// Value at progress 1.0
    to: f32,
    easing: Easing,
    playing: bool,
}

impl FadeAnimation {
    /// Create a fade from 0.0 to 1.0 over the given duration
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            current_ms: 0.0,
            from: 0.0,
            to: 1.0,
            easing: Easing::default(),
            playing: false,
        }
    }

    /// Set the value range (builder)
    pub fn with_range(mut self, from: f32, to: f32) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Set the easing curve (builder)
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Start immediately (builder)
    pub fn started(mut self) -> Self {
        self.start();
        self
    }

    /// Restart the fade from the beginning
    pub fn start(&mut self) {
        self.current_ms = 0.0;
        self.playing = true;
    }

    /// Stop without resetting elapsed time
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Check if the fade is still progressing
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Progress from 0.0 to 1.0
    ///
    /// A zero-duration fade reports 1.0: it has nothing to play.
    pub fn progress(&self) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (self.current_ms / self.duration_ms as f32).clamp(0.0, 1.0)
    }

    /// Current eased value
    pub fn value(&self) -> f32 {
        let eased = self.easing.apply(self.progress());
        self.from + (self.to - self.from) * eased
    }

    /// Advance by delta time (in milliseconds)
    pub fn tick(&mut self, dt_ms: f32) {
        if !self.playing {
            return;
        }

        self.current_ms += dt_ms;

        if self.current_ms >= self.duration_ms as f32 {
            self.current_ms = self.duration_ms as f32;
            self.playing = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_progression() {
        let mut fade = FadeAnimation::new(1000).with_easing(Easing::Linear).started();

        assert!(fade.is_playing());
        assert_eq!(fade.value(), 0.0);

        fade.tick(500.0);
        assert!((fade.value() - 0.5).abs() < 1e-4);
        assert!(fade.is_playing());

        fade.tick(500.0);
        assert!((fade.value() - 1.0).abs() < 1e-4);
        assert!(!fade.is_playing());

        // Ticking past the end stays clamped
        fade.tick(500.0);
        assert!((fade.value() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let fade = FadeAnimation::new(0).started();
        assert_eq!(fade.progress(), 1.0);
        assert_eq!(fade.value(), 1.0);
    }

    #[test]
    fn test_custom_range() {
        let mut fade = FadeAnimation::new(100)
            .with_range(1.0, 0.0)
            .with_easing(Easing::Linear)
            .started();

        assert_eq!(fade.value(), 1.0);
        fade.tick(100.0);
        assert_eq!(fade.value(), 0.0);
    }

    #[test]
    fn test_does_not_tick_unless_started() {
        let mut fade = FadeAnimation::new(100);
        fade.tick(50.0);
        assert_eq!(fade.progress(), 0.0);
        assert!(!fade.is_playing());
    }
}
