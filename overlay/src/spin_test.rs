#![allow(clippy::float_cmp)]

use std::f64::consts::TAU;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::recording::{Call, RecordingRenderer};

fn items(labels: &[&str]) -> Vec<WheelItem> {
    labels.iter().map(|l| WheelItem::new(*l)).collect()
}

fn plan(turns: f64, offset: f64) -> SpinPlan {
    SpinPlan { turns, offset }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Trigger at t=0 and run frames every 16 ms until the spin completes.
fn run_to_result(
    engine: &mut SpinEngine,
    timers: &mut TimerQueue,
    renderer: &mut RecordingRenderer,
    labels: &[&str],
    p: SpinPlan,
) -> SpinOutcome {
    assert!(engine.trigger(items(labels), p, 0.0, timers, renderer));
    let mut now = 0.0;
    loop {
        now += 16.0;
        if let Some(outcome) = engine.tick(now, timers, renderer) {
            return outcome;
        }
        assert!(now < 10_000.0, "spin never finished");
    }
}

// =============================================================
// Easing and winner math
// =============================================================

#[test]
fn ease_out_cubic_endpoints() {
    assert_eq!(ease_out_cubic(0.0), 0.0);
    assert_eq!(ease_out_cubic(1.0), 1.0);
    assert!(approx(ease_out_cubic(0.5), 0.875));
}

#[test]
fn ease_out_cubic_clamps_out_of_range() {
    assert_eq!(ease_out_cubic(-1.0), 0.0);
    assert_eq!(ease_out_cubic(2.0), 1.0);
}

#[test]
fn winner_at_zero_rotation_is_first_slice() {
    assert_eq!(winner_index(0.0, 4), Some(0));
}

#[test]
fn winner_counts_back_from_pointer() {
    // 0.3 turn clockwise puts 0.7 of a turn under the pointer: slice 2 of 4.
    assert_eq!(winner_index(0.3 * TAU, 4), Some(2));
    // Just past a full turn wraps to the last slice.
    assert_eq!(winner_index(TAU + 0.01, 4), Some(3));
}

#[test]
fn winner_handles_negative_rotation() {
    assert_eq!(winner_index(-0.3 * TAU, 4), Some(1));
}

#[test]
fn winner_none_for_empty_wheel() {
    assert_eq!(winner_index(1.0, 0), None);
    assert_eq!(winner_index(f64::NAN, 3), None);
}

#[test]
fn winner_single_item_always_wins() {
    for k in 0..20 {
        assert_eq!(winner_index(f64::from(k) * 0.77, 1), Some(0));
    }
}

#[test]
fn winner_always_in_bounds() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let p = SpinPlan::random(&mut rng);
        let idx = winner_index(p.total_rotation(), 7).expect("non-empty");
        assert!(idx < 7);
    }
}

#[test]
fn plan_total_rotation_bounds() {
    assert!(approx(plan(0.0, 0.0).total_rotation(), 3.0 * TAU));
    assert!(approx(plan(0.5, 0.25).total_rotation(), 4.5 * TAU + 0.25 * TAU));
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..100 {
        let total = SpinPlan::random(&mut rng).total_rotation();
        assert!((3.0 * TAU..7.0 * TAU).contains(&total));
    }
}

// =============================================================
// Lifecycle
// =============================================================

#[test]
fn trigger_starts_spin_and_shows_wheel() {
    let mut engine = SpinEngine::new();
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();

    assert!(engine.trigger(items(&["a", "b"]), plan(0.0, 0.0), 0.0, &mut timers, &mut r));
    assert_eq!(engine.phase(), Phase::Spinning);
    assert!(engine.is_busy());
    assert!(engine.is_spinning());
    assert!(engine.session().is_some());
    assert_eq!(r.count(&Call::Visible(true)), 1);
    assert_eq!(r.draws(), 1);
}

#[test]
fn trigger_rejected_while_busy() {
    let mut engine = SpinEngine::new();
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();

    assert!(engine.trigger(items(&["a", "b"]), plan(0.0, 0.0), 0.0, &mut timers, &mut r));
    let session = engine.session().map(|s| s.id);
    assert!(!engine.trigger(items(&["x", "y", "z"]), plan(0.9, 0.9), 10.0, &mut timers, &mut r));
    assert_eq!(engine.items().len(), 2);
    assert_eq!(engine.session().map(|s| s.id), session);
}

#[test]
fn trigger_rejected_with_no_items() {
    let mut engine = SpinEngine::new();
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();
    assert!(!engine.trigger(Vec::new(), plan(0.0, 0.0), 0.0, &mut timers, &mut r));
    assert_eq!(engine.phase(), Phase::Idle);
    assert!(r.calls.is_empty());
}

#[test]
fn rotation_follows_easing_mid_spin() {
    let mut engine = SpinEngine::new();
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();
    let p = plan(0.0, 0.0);
    engine.trigger(items(&["a", "b"]), p, 0.0, &mut timers, &mut r);

    assert!(engine.tick(2000.0, &mut timers, &mut r).is_none());
    assert!(approx(engine.rotation(), p.total_rotation() * 0.875));
    assert_eq!(engine.phase(), Phase::Spinning);
}

#[test]
fn completing_frame_returns_outcome_and_switches_phase() {
    let mut engine = SpinEngine::new();
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();

    let outcome = run_to_result(&mut engine, &mut timers, &mut r, &["a", "b", "c", "d"], plan(0.0, 0.3));
    assert_eq!(outcome.index, 2);
    assert_eq!(outcome.label, "c");
    assert_eq!(engine.phase(), Phase::ShowingResult);
    assert!(engine.is_busy());
    assert!(engine.rotation() >= 0.0 && engine.rotation() < TAU);
    assert_eq!(r.count(&Call::ShowResult("c".into())), 1);
    assert_eq!(engine.last_result(), Some(&outcome));
}

#[test]
fn outcome_carries_action_payload() {
    let mut engine = SpinEngine::new();
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();
    let action = serde_json::json!({"action": "ban", "user": "x"});
    let wheel = vec![WheelItem::new("only").with_action(action.clone())];

    engine.trigger(wheel, plan(0.2, 0.2), 0.0, &mut timers, &mut r);
    let outcome = engine.tick(SPIN_DURATION_MS, &mut timers, &mut r).expect("finished");
    assert_eq!(outcome.action, Some(action));
}

#[test]
fn no_outcome_after_completion() {
    let mut engine = SpinEngine::new();
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();
    run_to_result(&mut engine, &mut timers, &mut r, &["a", "b"], plan(0.1, 0.1));
    assert!(engine.tick(9000.0, &mut timers, &mut r).is_none());
}

#[test]
fn result_timers_scheduled_on_completion() {
    let mut engine = SpinEngine::new();
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();
    engine.trigger(items(&["a", "b"]), plan(0.0, 0.0), 0.0, &mut timers, &mut r);
    engine.tick(SPIN_DURATION_MS, &mut timers, &mut r);

    assert_eq!(timers.pending_of(TimerKind::ResultFade), 1);
    assert_eq!(timers.pending_of(TimerKind::WidgetHide), 1);
    assert_eq!(timers.next_deadline(), Some(SPIN_DURATION_MS + RESULT_DISPLAY_MS));
}

/// Drive fired timers through the engine until `until_ms`.
fn drain(engine: &mut SpinEngine, timers: &mut TimerQueue, r: &mut RecordingRenderer, until_ms: f64) {
    while let Some(due) = timers.next_deadline() {
        if due > until_ms {
            break;
        }
        for fired in timers.pop_due(due) {
            assert!(engine.on_timer(fired.id, due, timers, r));
        }
    }
}

#[test]
fn full_lifecycle_returns_to_idle() {
    let mut engine = SpinEngine::new();
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();
    engine.trigger(items(&["a", "b"]), plan(0.0, 0.0), 0.0, &mut timers, &mut r);
    engine.tick(SPIN_DURATION_MS, &mut timers, &mut r);

    // Fade at +3000, clear at +3500, hide at +4000.
    drain(&mut engine, &mut timers, &mut r, SPIN_DURATION_MS + 3000.0);
    assert_eq!(r.count(&Call::FadeResult), 1);
    assert_eq!(engine.phase(), Phase::ShowingResult);

    drain(&mut engine, &mut timers, &mut r, SPIN_DURATION_MS + 3500.0);
    assert_eq!(engine.phase(), Phase::Idle);
    assert!(engine.session().is_none());
    assert_eq!(r.count(&Call::Visible(false)), 0);

    drain(&mut engine, &mut timers, &mut r, SPIN_DURATION_MS + 4000.0);
    assert_eq!(r.count(&Call::Visible(false)), 1);
    assert!(timers.is_empty());
}

#[test]
fn new_spin_cancels_stale_hide_timer() {
    let mut engine = SpinEngine::new();
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();
    engine.trigger(items(&["a", "b"]), plan(0.0, 0.0), 0.0, &mut timers, &mut r);
    engine.tick(SPIN_DURATION_MS, &mut timers, &mut r);
    drain(&mut engine, &mut timers, &mut r, SPIN_DURATION_MS + 3500.0);
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(timers.pending_of(TimerKind::WidgetHide), 1);

    // Idle again before the hide fires: the new spin must not be hidden.
    let start = SPIN_DURATION_MS + 3600.0;
    assert!(engine.trigger(items(&["c", "d"]), plan(0.0, 0.0), start, &mut timers, &mut r));
    assert!(timers.is_empty());
    assert!(timers.pop_due(start + 1000.0).is_empty());
    assert_eq!(r.count(&Call::Visible(false)), 0);
}

#[test]
fn next_spin_starts_from_resting_angle() {
    let mut engine = SpinEngine::new();
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();
    engine.trigger(items(&["a", "b"]), plan(0.0, 0.25), 0.0, &mut timers, &mut r);
    engine.tick(SPIN_DURATION_MS, &mut timers, &mut r);
    let rest = engine.rotation();
    assert!(approx(rest, 0.25 * TAU));

    drain(&mut engine, &mut timers, &mut r, 20_000.0);
    engine.trigger(items(&["a", "b"]), plan(0.0, 0.0), 30_000.0, &mut timers, &mut r);
    assert_eq!(engine.session().map(|s| s.start_rotation), Some(rest));
}

#[test]
fn unknown_timer_is_ignored() {
    let mut engine = SpinEngine::new();
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();
    let foreign = timers.schedule(TimerKind::Reconnect, 0.0, 0.0);
    assert!(!engine.on_timer(foreign, 0.0, &mut timers, &mut r));
    assert!(r.calls.is_empty());
}

#[test]
fn custom_timing_is_honored() {
    let timing = SpinTiming { spin_ms: 100.0, result_display_ms: 10.0, fade_ms: 5.0, hide_ms: 20.0 };
    let mut engine = SpinEngine::with_timing(timing);
    let mut timers = TimerQueue::new();
    let mut r = RecordingRenderer::default();
    engine.trigger(items(&["a"]), plan(0.0, 0.0), 0.0, &mut timers, &mut r);
    assert!(engine.tick(100.0, &mut timers, &mut r).is_some());
    assert_eq!(timers.next_deadline(), Some(110.0));
    assert_eq!(engine.pending_timers().len(), 2);
}
