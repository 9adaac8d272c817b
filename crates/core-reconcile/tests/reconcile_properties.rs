//! Property tests for reconciliation invariants.

use core_reconcile::{LineTag, NoProgress, ReconcileOptions, Reconciler};
use core_text::BufferSnapshot;
use proptest::prelude::*;

fn lines_strategy(min: usize) -> impl Strategy<Value = Vec<String>> {
    // Small alphabet so matches, insertions and deletions all occur.
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", "e", ""]), min..24)
        .prop_map(|v| v.into_iter().map(String::from).collect())
}

fn untagged(lines: &[String], skip: impl Fn(usize) -> bool) -> Vec<String> {
    lines
        .iter()
        .enumerate()
        .filter(|(idx, _)| !skip(idx + 1))
        .map(|(_, l)| l.clone())
        .collect()
}

proptest! {
    // Dropping removed lines reproduces current; dropping added lines reproduces base.
    #[test]
    fn projections_recover_both_inputs(base in lines_strategy(2), current in lines_strategy(0)) {
        let b = BufferSnapshot::from_lines(base.clone());
        let c = BufferSnapshot::from_lines(current.clone());
        let r = Reconciler::default().run(&b, &c, &NoProgress).unwrap();
        prop_assert_eq!(untagged(r.lines(), |n| r.removed().contains(&n)), current);
        prop_assert_eq!(untagged(r.lines(), |n| r.added().contains(&n)), base);
    }

    #[test]
    fn tags_disjoint_and_in_range(base in lines_strategy(2), current in lines_strategy(0)) {
        let b = BufferSnapshot::from_lines(base);
        let c = BufferSnapshot::from_lines(current);
        let r = Reconciler::default().run(&b, &c, &NoProgress).unwrap();
        prop_assert!(r.added().is_disjoint(r.removed()));
        let len = r.line_count();
        prop_assert!(r.added().iter().chain(r.removed().iter()).all(|n| *n >= 1 && *n <= len));
        let s = r.stats();
        prop_assert_eq!(len, s.matched + s.added + s.removed);
        prop_assert!(s.steps <= b.len() + c.len());
    }

    #[test]
    fn identity_has_no_tags(base in lines_strategy(2)) {
        let b = BufferSnapshot::from_lines(base.clone());
        let r = Reconciler::default().run(&b, &b.clone(), &NoProgress).unwrap();
        prop_assert_eq!(r.lines(), base.as_slice());
        prop_assert!(r.added().is_empty() && r.removed().is_empty());
    }

    #[test]
    fn windowed_lookahead_keeps_invariants(
        base in lines_strategy(2),
        current in lines_strategy(0),
        window in 1usize..4,
    ) {
        let b = BufferSnapshot::from_lines(base.clone());
        let c = BufferSnapshot::from_lines(current.clone());
        let r = Reconciler::new(ReconcileOptions { lookahead_window: Some(window), ..ReconcileOptions::default() })
            .run(&b, &c, &NoProgress)
            .unwrap();
        prop_assert_eq!(untagged(r.lines(), |n| r.tag(n) == LineTag::Removed), current);
        prop_assert_eq!(untagged(r.lines(), |n| r.tag(n) == LineTag::Added), base);
    }

    // A starved comparison budget changes the alignment, never its validity.
    #[test]
    fn tight_lookahead_budget_keeps_invariants(
        base in lines_strategy(2),
        current in lines_strategy(0),
        per_line in 0usize..3,
    ) {
        let b = BufferSnapshot::from_lines(base.clone());
        let c = BufferSnapshot::from_lines(current.clone());
        let reconciler = Reconciler::new(ReconcileOptions { lookahead_per_line: per_line, ..ReconcileOptions::default() });
        let r = reconciler.run(&b, &c, &NoProgress).unwrap();
        let budget = reconciler.lookahead_budget(reconciler.safety_limit(b.len(), c.len()));
        prop_assert!(r.stats().probes <= budget);
        prop_assert_eq!(untagged(r.lines(), |n| r.tag(n) == LineTag::Removed), current);
        prop_assert_eq!(untagged(r.lines(), |n| r.tag(n) == LineTag::Added), base);
    }
}
