//! Scenario tests: baseline handling and bounded termination.

use core_reconcile::{NoProgress, ReconcileError, ReconcileOptions, Reconciler};
use core_text::{Buffer, BufferSnapshot};
use std::time::{Duration, Instant};

#[test]
fn buffer_snapshots_feed_the_engine() {
    let base = Buffer::from_str("base", "fn main() {\n}\n").unwrap();
    let current = Buffer::from_str("code", "fn main() {\n    run();\n}\n").unwrap();
    let r = Reconciler::default()
        .run(&base.snapshot(), &current.snapshot(), &NoProgress)
        .unwrap();
    assert_eq!(r.text(), "fn main() {\n    run();\n}\n");
    assert_eq!(r.added().iter().copied().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn fresh_empty_document_is_a_baseline() {
    let base = Buffer::empty("base");
    let current = Buffer::from_str("code", "typed\ntext").unwrap();
    let r = Reconciler::default()
        .run(&base.snapshot(), &current.snapshot(), &NoProgress)
        .unwrap();
    assert_eq!(r.lines(), &[String::new()]);
    assert!(r.stats().short_circuit);
}

#[test]
fn large_disjoint_inputs_terminate_quickly() {
    // No line in current ever occurs in base: every step is a replacement and
    // every lookahead would scan to the end without the comparison budget.
    let n = 2_000;
    let base = BufferSnapshot::from_lines((0..n).map(|i| format!("base {i}")));
    let current = BufferSnapshot::from_lines((0..n).map(|i| format!("code {i}")));
    let start = Instant::now();
    let r = Reconciler::default()
        .run(&base, &current, &NoProgress)
        .unwrap();
    assert!(start.elapsed() < Duration::from_secs(20));
    assert_eq!(r.line_count(), 2 * n);
    let reconciler = Reconciler::default();
    let limit = reconciler.safety_limit(n, n);
    assert!(r.stats().steps <= limit);
    assert!(r.stats().probes <= reconciler.lookahead_budget(limit));
    assert!(r.stats().budget_exhausted);
}

#[test]
fn lookahead_budget_scales_with_input_not_its_square() {
    let reconciler = Reconciler::default();
    for n in [500usize, 4_000] {
        let base = BufferSnapshot::from_lines((0..n).map(|i| format!("old {i}")));
        let current = BufferSnapshot::from_lines((0..n).map(|i| format!("new {i}")));
        let r = reconciler.run(&base, &current, &NoProgress).unwrap();
        let limit = reconciler.safety_limit(n, n);
        assert!(
            r.stats().probes <= limit * core_reconcile::DEFAULT_LOOKAHEAD_PER_LINE,
            "n={n} probes={}",
            r.stats().probes
        );
        assert_eq!(r.added().len(), n);
        assert_eq!(r.removed().len(), n);
    }
}

#[test]
fn small_edits_stay_within_budget() {
    let base = BufferSnapshot::from_lines((0..300).map(|i| format!("line {i}")));
    let mut edited: Vec<String> = base.as_slice().to_vec();
    edited.insert(150, "inserted".into());
    edited.remove(20);
    let r = Reconciler::default()
        .run(&base, &BufferSnapshot::from_lines(edited), &NoProgress)
        .unwrap();
    assert!(!r.stats().budget_exhausted);
    assert_eq!(r.added().len(), 1);
    assert_eq!(r.removed().len(), 1);
}

#[test]
fn adversarial_ceiling_degrades_to_previous_base() {
    let base = BufferSnapshot::from_lines((0..50).map(|i| format!("b{i}")));
    let current = BufferSnapshot::from_lines((0..50).map(|i| format!("c{i}")));
    let reconciler = Reconciler::new(ReconcileOptions {
        max_emitted: Some(10),
        ..ReconcileOptions::default()
    });
    match reconciler.run(&base, &current, &NoProgress) {
        Err(ReconcileError::SafetyLimitExceeded { limit, emitted }) => {
            assert_eq!(limit, 10);
            assert_eq!(emitted, 11);
        }
        other => panic!("expected overrun, got {other:?}"),
    }
    let degraded = reconciler.run_or_base(&base, &current, &NoProgress);
    assert_eq!(degraded.lines(), base.as_slice());
}
