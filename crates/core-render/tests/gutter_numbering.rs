use core_reconcile::{LineTag, NoProgress, Reconciler};
use core_render::gutter_rows;
use core_text::BufferSnapshot;
use proptest::prelude::*;

fn lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", ""]), 0..24)
        .prop_map(|v| v.into_iter().map(String::from).collect())
}

proptest! {
    // Old numbering walks the baseline, new numbering walks the edited text.
    #[test]
    fn counters_recover_both_inputs(base in lines(), current in lines()) {
        prop_assume!(base.len() > 1);
        let base = BufferSnapshot::from_lines(base);
        let current = BufferSnapshot::from_lines(current);
        let result = Reconciler::default().run(&base, &current, &NoProgress).unwrap();
        let rows = gutter_rows(result.line_count(), &result);

        let old: Vec<usize> = rows.iter().filter_map(|r| r.old_number).collect();
        let new: Vec<usize> = rows.iter().filter_map(|r| r.new_number).collect();
        prop_assert_eq!(old, (1..=base.len()).collect::<Vec<_>>());
        prop_assert_eq!(new, (1..=current.len()).collect::<Vec<_>>());

        for r in &rows {
            let expected = match r.tag {
                LineTag::Added => '+',
                LineTag::Removed => '-',
                LineTag::Unchanged => ' ',
            };
            prop_assert_eq!(r.marker, expected);
        }
    }
}
