//! Two-stage hero reveal
//!
//! The headline staggers in word by word once it scrolls into view; the body
//! block fades in only after the headline finishes AND the body itself is in
//! view. Drives the scheduler clock manually and prints what a host renderer
//! would draw each step.
//!
//! Run with: cargo run -p inview_motion --example hero

use inview_motion::prelude::*;
use std::time::Duration;

fn print_frame(t_ms: u64, headline: &StaggerText, body: &FadeGate) {
    let snapshot = headline.snapshot();
    let words: Vec<String> = snapshot
        .segments
        .iter()
        .map(|s| {
            if s.shown {
                format!("{}({:.2})", s.text, s.opacity)
            } else {
                "_".to_string()
            }
        })
        .collect();
    println!(
        "t={t_ms:>5}ms  <{} class=\"{}\">  {}  | body: {:?} opacity {:.2}",
        snapshot.tag.as_str(),
        snapshot.classes.join(" "),
        words.join(" "),
        body.state(),
        body.opacity(),
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,inview_motion=debug")),
        )
        .init();

    let scheduler = TimerScheduler::new();

    let headline = stagger_text(scheduler.handle(), ["Hi,", "I'm", "Quinn."])
        .tag(TextTag::H1)
        .class("hero-title")
        .stagger_delay(0.1)
        .once(true);
    let body = FadeGate::new(scheduler.handle())
        .class("hero-body")
        .fade_duration(1.0);

    // Body waits for the headline to finish, then for its own visibility
    gate_after(&headline, &body);

    let mut tracker = ViewportTracker::new(Bounds::new(0.0, 0.0, 1280.0, 720.0));
    tracker.watch(
        Bounds::new(40.0, 120.0, 600.0, 80.0),
        headline.watch_options(),
        headline.visibility_sink(),
    );
    tracker.watch(
        Bounds::new(40.0, 900.0, 600.0, 300.0),
        body.watch_options(),
        body.visibility_sink(),
    );

    println!("full text for assistive tech: {:?}", headline.sr_text());

    // The headline is above the fold; play its reveal
    let mut t_ms = 0u64;
    for _ in 0..8 {
        print_frame(t_ms, &headline, &body);
        scheduler.advance(Duration::from_millis(100));
        t_ms += 100;
    }

    // Scroll the body into view; the gate is already released
    println!("-- scroll --");
    tracker.set_viewport(Bounds::new(0.0, 600.0, 1280.0, 720.0));
    for _ in 0..6 {
        print_frame(t_ms, &headline, &body);
        scheduler.advance(Duration::from_millis(250));
        t_ms += 250;
    }
    print_frame(t_ms, &headline, &body);
}
