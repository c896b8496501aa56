//! Property tests for record assembly over arbitrary line sequences.

use petition_core::assemble::{assemble, Assembly, LineState};
use petition_core::classify::{Classifier, LineClass};
use petition_core::TablePatterns;
use proptest::prelude::*;

const PRIMARY: &[&str] = &[
    "ICP101 Intro to CS   MAT201 Calculus I   2021",
    "MAE111 Cálculo I      MAT101   Cálculo Diferencial      2019",
];

const PARTIAL: &[&str] = &[
    "ICP102 Data Structures   Linear Algebra   2022",
    "ICP141 Fundamentos da Computação          Matemática Discreta          2020",
];

const FRAGMENT: &[&str] = &["MAT201", "201", "                    CTC450", "Página 2 de 3"];

const EMPTY: &[&str] = &["", "   "];

fn table_line() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        prop::sample::select(PRIMARY),
        prop::sample::select(PARTIAL),
        prop::sample::select(FRAGMENT),
        prop::sample::select(EMPTY),
    ]
}

fn table_page() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(table_line(), 0..40)
}

fn classifier() -> Classifier {
    Classifier::new(&TablePatterns::default()).unwrap()
}

fn anchors(assembly: &Assembly) -> Vec<usize> {
    assembly.records.iter().map(|p| p.line).collect()
}

// ============================================================================
// Line states
// ============================================================================

#[test]
fn proptest_every_line_settles_once() {
    let classifier = classifier();
    proptest!(|(lines in table_page())| {
        let assembly = assemble(&lines[..], &classifier);

        prop_assert_eq!(assembly.states.len(), lines.len());
        prop_assert!(assembly.is_settled());

        let summary = assembly.summary();
        let total = summary.primary + summary.partial + summary.consumed + summary.unused
            + summary.empty;
        prop_assert_eq!(total, lines.len());
        prop_assert_eq!(assembly.records.len(), summary.primary + summary.partial);
    });
}

#[test]
fn proptest_consumed_fragments_sit_next_to_their_anchor() {
    let classifier = classifier();
    proptest!(|(lines in table_page())| {
        let assembly = assemble(&lines[..], &classifier);

        for (index, state) in assembly.states.iter().enumerate() {
            if let LineState::FragmentConsumed { by } = *state {
                prop_assert_eq!(index.abs_diff(by), 1);
                prop_assert_eq!(&assembly.classes[index], &LineClass::Fragment);
                prop_assert!(matches!(assembly.classes[by], LineClass::Partial(_)));
                prop_assert_eq!(assembly.states[by], LineState::PartialResolved);
            }
        }
    });
}

#[test]
fn proptest_only_fragments_are_consumed_or_unused() {
    let classifier = classifier();
    proptest!(|(lines in table_page())| {
        let assembly = assemble(&lines[..], &classifier);

        for (class, state) in assembly.classes.iter().zip(&assembly.states) {
            let expected_fragment = matches!(
                state,
                LineState::FragmentConsumed { .. } | LineState::FragmentUnused
            );
            prop_assert_eq!(expected_fragment, *class == LineClass::Fragment);
        }
    });
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn proptest_records_follow_anchor_order() {
    let classifier = classifier();
    proptest!(|(lines in table_page())| {
        let assembly = assemble(&lines[..], &classifier);
        let anchors = anchors(&assembly);

        prop_assert!(anchors.windows(2).all(|w| w[0] < w[1]));
        for line in anchors {
            prop_assert!(matches!(
                assembly.states[line],
                LineState::PrimaryEmitted | LineState::PartialResolved
            ));
        }
    });
}

#[test]
fn proptest_assembly_is_idempotent() {
    let classifier = classifier();
    proptest!(|(lines in table_page())| {
        let first = assemble(&lines[..], &classifier);
        let second = assemble(&lines[..], &classifier);

        prop_assert_eq!(&first.records, &second.records);
        prop_assert_eq!(&first.states, &second.states);
    });
}

#[test]
fn proptest_primary_rows_keep_their_fields() {
    let classifier = classifier();
    proptest!(|(
        dest in "(ICP|MAE)[0-9]{3}",
        dest_name in "[A-Za-z][a-z]{1,12}( [A-Z][a-z]{1,8})?",
        origin in "(MAT|INF|CTC)[0-9]{3,5}",
        origin_name in "[A-Za-z][a-z]{1,12}( [A-Z][a-z]{1,8})?",
        year in "(19|20)[0-9]{2}"
    )| {
        let line = format!("{dest} {dest_name}   {origin} {origin_name}   {year}");
        let assembly = assemble(&[line.as_str()], &classifier);

        prop_assert_eq!(assembly.records.len(), 1);
        let record = &assembly.records[0];
        prop_assert_eq!(&record.destination.code, &dest);
        prop_assert_eq!(&record.destination.name, &dest_name);
        prop_assert_eq!(&record.origin.code, &origin);
        prop_assert_eq!(&record.origin.name, &origin_name);
        prop_assert_eq!(record.year.as_deref(), Some(year.as_str()));
    });
}
