//! Two-stage reveal composition
//!
//! The canonical hero pattern: the headline staggers in, and only once it
//! has completed does the body block start fading - and then only when the
//! body is itself in view.

use crate::gate::FadeGate;
use crate::reveal::StaggerReveal;

/// Open `gate` when `reveal` completes its cycle
///
/// Forces the gate's `can_start` signal to false, then wires the reveal's
/// completion callback to release it. The gate still waits for its own
/// visibility, so the composed behavior is "headline done AND body in view".
///
/// Replaces any completion callback previously set on the reveal.
pub fn gate_after(reveal: &StaggerReveal, gate: &FadeGate) {
    gate.set_can_start(false);
    let gate = gate.clone();
    reveal.set_on_complete(move || gate.set_can_start(true));
}
