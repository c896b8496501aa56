use crate::assemble::LineState;
use crate::classify::{LineClass, RowFields};
use crate::types::{CourseRef, DisciplinePair};

/// Complete a PARTIAL row by borrowing its missing origin code from the
/// adjacent lines.
///
/// Line `index - 1` and line `index + 1` are checked independently. A
/// neighbor contributes when it is a FRAGMENT that is either unclaimed or
/// already claimed by this same anchor; contributions are joined left then
/// right with a single space. Claimed neighbors are marked
/// [`LineState::FragmentConsumed`] with `by: index`.
///
/// Rows (PRIMARY or PARTIAL) are never borrowed from, and neither is a
/// fragment claimed by another anchor. Calling this twice for the same anchor
/// returns the same pair and leaves `states` unchanged the second time.
///
/// `lines`, `classes` and `states` are parallel slices.
pub fn resolve_partial<S: AsRef<str>>(
    index: usize,
    fields: &RowFields,
    lines: &[S],
    classes: &[LineClass],
    states: &mut [LineState],
) -> DisciplinePair {
    debug_assert_eq!(lines.len(), classes.len());
    debug_assert_eq!(lines.len(), states.len());

    let left = index
        .checked_sub(1)
        .and_then(|prev| claim_fragment(index, prev, lines, classes, states));
    let right = Some(index + 1)
        .filter(|&next| next < lines.len())
        .and_then(|next| claim_fragment(index, next, lines, classes, states));

    if left.is_some() && right.is_some() {
        log::debug!("line {index}: origin code taken from fragments on both sides");
    }

    let code = [left, right]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    DisciplinePair {
        destination: fields.destination.clone(),
        origin: CourseRef::new(code, fields.origin.name.clone()),
        line: index,
        year: Some(fields.year.clone()),
    }
}

fn claim_fragment<'a, S: AsRef<str>>(
    anchor: usize,
    neighbor: usize,
    lines: &'a [S],
    classes: &[LineClass],
    states: &mut [LineState],
) -> Option<&'a str> {
    if classes[neighbor] != LineClass::Fragment {
        return None;
    }

    match states[neighbor] {
        LineState::Unvisited => {
            states[neighbor] = LineState::FragmentConsumed { by: anchor };
        }
        LineState::FragmentConsumed { by } if by == anchor => {}
        _ => return None,
    }

    Some(lines[neighbor].as_ref().trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::patterns::TablePatterns;

    const PARTIAL: &str = "ICP102 Data Structures   Linear Algebra   2022";

    fn setup(lines: &[&str]) -> (Vec<LineClass>, Vec<LineState>) {
        let classifier = Classifier::new(&TablePatterns::default()).unwrap();
        let classes = classifier.classify_all(lines);
        let states = vec![LineState::Unvisited; lines.len()];
        (classes, states)
    }

    fn fields_at(classes: &[LineClass], index: usize) -> RowFields {
        match &classes[index] {
            LineClass::Partial(fields) => fields.clone(),
            other => panic!("expected Partial at {index}, got {:?}", other),
        }
    }

    #[test]
    fn test_left_neighbor() {
        let lines = ["MAT201", PARTIAL, ""];
        let (classes, mut states) = setup(&lines);
        let pair = resolve_partial(1, &fields_at(&classes, 1), &lines, &classes, &mut states);

        assert_eq!(pair.origin, CourseRef::new("MAT201", "Linear Algebra"));
        assert_eq!(pair.destination, CourseRef::new("ICP102", "Data Structures"));
        assert_eq!(states[0], LineState::FragmentConsumed { by: 1 });
        assert_eq!(states[2], LineState::Unvisited);
    }

    #[test]
    fn test_right_neighbor() {
        let lines = ["", PARTIAL, "  INF110  "];
        let (classes, mut states) = setup(&lines);
        let pair = resolve_partial(1, &fields_at(&classes, 1), &lines, &classes, &mut states);

        assert_eq!(pair.origin.code, "INF110");
        assert_eq!(states[2], LineState::FragmentConsumed { by: 1 });
    }

    #[test]
    fn test_both_neighbors_are_concatenated() {
        // Fragments on both sides are both taken, left first. This mirrors the
        // documented behavior for ambiguous fragments and is kept on purpose.
        let lines = ["MAT", PARTIAL, "201"];
        let (classes, mut states) = setup(&lines);
        let pair = resolve_partial(1, &fields_at(&classes, 1), &lines, &classes, &mut states);

        assert_eq!(pair.origin.code, "MAT 201");
        assert_eq!(states[0], LineState::FragmentConsumed { by: 1 });
        assert_eq!(states[2], LineState::FragmentConsumed { by: 1 });
    }

    #[test]
    fn test_no_neighbors_leaves_code_empty() {
        let lines = [PARTIAL];
        let (classes, mut states) = setup(&lines);
        let pair = resolve_partial(0, &fields_at(&classes, 0), &lines, &classes, &mut states);

        assert_eq!(pair.origin.code, "");
        assert_eq!(pair.origin.name, "Linear Algebra");
        assert_eq!(pair.year.as_deref(), Some("2022"));
    }

    #[test]
    fn test_row_neighbors_are_never_consumed() {
        let lines = [
            "ICP101 Intro to CS   MAT201 Calculus I   2021",
            PARTIAL,
            "ICP103 Algorithms   Discrete Math   2022",
        ];
        let (classes, mut states) = setup(&lines);
        let pair = resolve_partial(1, &fields_at(&classes, 1), &lines, &classes, &mut states);

        assert_eq!(pair.origin.code, "");
        assert_eq!(states[0], LineState::Unvisited);
        assert_eq!(states[2], LineState::Unvisited);
    }

    #[test]
    fn test_fragment_claimed_by_other_anchor_is_skipped() {
        let lines = [PARTIAL, "MAT201", PARTIAL];
        let (classes, mut states) = setup(&lines);

        let first = resolve_partial(0, &fields_at(&classes, 0), &lines, &classes, &mut states);
        let second = resolve_partial(2, &fields_at(&classes, 2), &lines, &classes, &mut states);

        assert_eq!(first.origin.code, "MAT201");
        assert_eq!(second.origin.code, "");
        assert_eq!(states[1], LineState::FragmentConsumed { by: 0 });
    }

    #[test]
    fn test_resolving_twice_is_idempotent() {
        let lines = ["MAT", PARTIAL, "201"];
        let (classes, mut states) = setup(&lines);
        let fields = fields_at(&classes, 1);

        let first = resolve_partial(1, &fields, &lines, &classes, &mut states);
        let snapshot = states.clone();
        let second = resolve_partial(1, &fields, &lines, &classes, &mut states);

        assert_eq!(first, second);
        assert_eq!(states, snapshot);
    }
}
