//! Animated text component
//!
//! `StaggerText` wraps a [`StaggerReveal`] with the presentation the host
//! renderer needs: the rendering target (heading vs. paragraph), styling
//! classes passed through untouched, and the accessibility contract - the
//! full joined text is always exposed as a single static node, while the
//! per-segment animated spans are marked decorative.

use crate::reveal::StaggerReveal;
use inview_animation::SchedulerHandle;
use std::ops::{Deref, DerefMut};

/// Rendering target for the text component
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextTag {
    H1,
    H2,
    H3,
    #[default]
    Paragraph,
    Span,
}

impl TextTag {
    /// The host markup tag name
    pub fn as_str(&self) -> &'static str {
        match self {
            TextTag::H1 => "h1",
            TextTag::H2 => "h2",
            TextTag::H3 => "h3",
            TextTag::Paragraph => "p",
            TextTag::Span => "span",
        }
    }
}

/// Presentation state of one segment
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentView {
    pub text: String,
    pub shown: bool,
    pub opacity: f32,
}

/// What the host renderer draws for a text component
#[derive(Clone, Debug)]
pub struct TextSnapshot {
    pub tag: TextTag,
    /// Styling classes, untouched
    pub classes: Vec<String>,
    /// The full joined text, always present for assistive technology
    pub sr_text: String,
    /// The animated spans are presentation only
    pub aria_hidden: bool,
    pub segments: Vec<SegmentView>,
}

/// Create an animated text component over the given segments
///
/// ```ignore
/// let headline = stagger_text(scheduler.handle(), ["Hi,", "I'm", "Quinn."])
///     .tag(TextTag::H1)
///     .class("hero-title")
///     .stagger_delay(0.1)
///     .once(true);
/// ```
pub fn stagger_text<I, S>(handle: SchedulerHandle, segments: I) -> StaggerText
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    StaggerText {
        inner: StaggerReveal::new(handle, segments),
        tag: TextTag::default(),
        classes: Vec::new(),
    }
}

/// Animated text: a staggered reveal plus host markup
pub struct StaggerText {
    inner: StaggerReveal,
    tag: TextTag,
    classes: Vec<String>,
}

impl StaggerText {
    /// Create from prose, splitting on whitespace so each word staggers in
    pub fn from_words(handle: SchedulerHandle, text: &str) -> Self {
        stagger_text(handle, text.split_whitespace().map(str::to_owned))
    }

    /// Set the rendering target
    pub fn tag(mut self, tag: TextTag) -> Self {
        self.tag = tag;
        self
    }

    /// Append a styling class passed through untouched
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    // Reveal configuration, delegated so the builder chain stays fluent

    pub fn stagger_delay(mut self, seconds: f32) -> Self {
        self.inner = self.inner.stagger_delay(seconds);
        self
    }

    pub fn segment_duration(mut self, seconds: f32) -> Self {
        self.inner = self.inner.segment_duration(seconds);
        self
    }

    pub fn once(mut self, once: bool) -> Self {
        self.inner = self.inner.once(once);
        self
    }

    pub fn repeat_delay(mut self, seconds: f32) -> Self {
        self.inner = self.inner.repeat_delay(seconds);
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner = self.inner.on_complete(callback);
        self
    }

    /// The full joined text for assistive technology
    pub fn sr_text(&self) -> String {
        self.inner.segments().join(" ")
    }

    /// Capture the current presentation for the host renderer
    pub fn snapshot(&self) -> TextSnapshot {
        let segments = self
            .inner
            .segments()
            .into_iter()
            .enumerate()
            .map(|(index, text)| SegmentView {
                text,
                shown: self.inner.is_segment_shown(index),
                opacity: self.inner.segment_opacity(index),
            })
            .collect();

        TextSnapshot {
            tag: self.tag,
            classes: self.classes.clone(),
            sr_text: self.sr_text(),
            // The animated spans duplicate sr_text; screen readers get the
            // static node only
            aria_hidden: true,
            segments,
        }
    }
}

impl Deref for StaggerText {
    type Target = StaggerReveal;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for StaggerText {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reveal::RevealState;
    use inview_animation::TimerScheduler;
    use std::time::Duration;

    #[test]
    fn test_sr_text_is_always_present() {
        let scheduler = TimerScheduler::new();
        let text = stagger_text(scheduler.handle(), ["Hi,", "I'm", "Quinn."]);

        // Nothing revealed yet, but the static node carries everything
        assert_eq!(text.sr_text(), "Hi, I'm Quinn.");
        let snapshot = text.snapshot();
        assert_eq!(snapshot.sr_text, "Hi, I'm Quinn.");
        assert!(snapshot.aria_hidden);
        assert!(snapshot.segments.iter().all(|s| !s.shown));
    }

    #[test]
    fn test_snapshot_tracks_reveal() {
        let scheduler = TimerScheduler::new();
        let text = stagger_text(scheduler.handle(), ["A", "B"])
            .stagger_delay(0.5)
            .segment_duration(0.0);

        text.set_visible(true);
        scheduler.advance(Duration::ZERO);

        let snapshot = text.snapshot();
        assert!(snapshot.segments[0].shown);
        assert_eq!(snapshot.segments[0].opacity, 1.0);
        assert!(!snapshot.segments[1].shown);
        assert_eq!(snapshot.segments[1].opacity, 0.0);

        scheduler.advance(Duration::from_millis(500));
        assert_eq!(text.state(), RevealState::Complete);
        assert!(text.snapshot().segments.iter().all(|s| s.shown));
    }

    #[test]
    fn test_markup_pass_through() {
        let scheduler = TimerScheduler::new();
        let text = stagger_text(scheduler.handle(), ["x"])
            .tag(TextTag::H1)
            .class("hero-title")
            .class("text-6xl");

        let snapshot = text.snapshot();
        assert_eq!(snapshot.tag.as_str(), "h1");
        assert_eq!(snapshot.classes, vec!["hero-title", "text-6xl"]);
    }

    #[test]
    fn test_from_words_splits_prose() {
        let scheduler = TimerScheduler::new();
        let text = StaggerText::from_words(scheduler.handle(), "builder of  small things");

        assert_eq!(text.segment_count(), 4);
        assert_eq!(text.sr_text(), "builder of small things");
    }
}
