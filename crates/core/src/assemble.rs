//! Single-pass record assembly over the lines of the table page.
//!
//! Every line index owns one [`LineState`]. The pass walks indices left to
//! right, emitting a record for each PRIMARY line and for each PARTIAL line
//! (after the resolver has borrowed its missing code from the neighbors).
//! Bare fragments are left `Unvisited` when first seen because the next line
//! may still be a PARTIAL row that claims them; whatever is still unvisited
//! when the pass ends becomes [`LineState::FragmentUnused`].
//!
//! ```text
//! Unvisited ─┬─ empty ─────────────────► EmptySkipped
//!            ├─ primary ───────────────► PrimaryEmitted
//!            ├─ partial ───────────────► PartialResolved
//!            ├─ claimed by a partial ──► FragmentConsumed { by }
//!            └─ pass end ──────────────► FragmentUnused
//! ```

use serde::Serialize;

use crate::classify::{Classifier, LineClass};
use crate::resolve::resolve_partial;
use crate::types::DisciplinePair;

/// Terminal (or initial) state of one line index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineState {
    Unvisited,
    PrimaryEmitted,
    PartialResolved,
    /// Borrowed by the PARTIAL row at index `by`.
    FragmentConsumed {
        by: usize,
    },
    FragmentUnused,
    EmptySkipped,
}

impl LineState {
    pub fn label(&self) -> &'static str {
        match self {
            LineState::Unvisited => "unvisited",
            LineState::PrimaryEmitted => "primary-emitted",
            LineState::PartialResolved => "partial-resolved",
            LineState::FragmentConsumed { .. } => "fragment-consumed",
            LineState::FragmentUnused => "fragment-unused",
            LineState::EmptySkipped => "empty-skipped",
        }
    }
}

/// Output of [`assemble`]: the records plus the per-line bookkeeping.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub records: Vec<DisciplinePair>,
    pub classes: Vec<LineClass>,
    pub states: Vec<LineState>,
}

/// Per-state line counts, used for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblySummary {
    pub primary: usize,
    pub partial: usize,
    pub consumed: usize,
    pub unused: usize,
    pub empty: usize,
}

impl Assembly {
    /// `true` once every line has reached a terminal state.
    pub fn is_settled(&self) -> bool {
        !self.states.contains(&LineState::Unvisited)
    }

    pub fn summary(&self) -> AssemblySummary {
        let mut summary = AssemblySummary::default();
        for state in &self.states {
            match state {
                LineState::PrimaryEmitted => summary.primary += 1,
                LineState::PartialResolved => summary.partial += 1,
                LineState::FragmentConsumed { .. } => summary.consumed += 1,
                LineState::FragmentUnused => summary.unused += 1,
                LineState::EmptySkipped => summary.empty += 1,
                LineState::Unvisited => {}
            }
        }
        summary
    }
}

/// Reconstruct discipline records from the ordered lines of a table page.
///
/// Records come out in the order of their anchor lines. The pass looks at
/// most one line behind and one line ahead of each PARTIAL row and never
/// revisits a line it has already decided.
pub fn assemble<S: AsRef<str>>(lines: &[S], classifier: &Classifier) -> Assembly {
    let classes = classifier.classify_all(lines);
    let mut states = vec![LineState::Unvisited; lines.len()];
    let mut records = Vec::new();

    for index in 0..lines.len() {
        if matches!(states[index], LineState::FragmentConsumed { .. }) {
            continue;
        }

        match &classes[index] {
            LineClass::Empty => states[index] = LineState::EmptySkipped,
            LineClass::Primary(fields) => {
                records.push(DisciplinePair {
                    destination: fields.destination.clone(),
                    origin: fields.origin.clone(),
                    line: index,
                    year: Some(fields.year.clone()),
                });
                states[index] = LineState::PrimaryEmitted;
            }
            LineClass::Partial(fields) => {
                let pair = resolve_partial(index, fields, lines, &classes, &mut states);
                records.push(pair);
                states[index] = LineState::PartialResolved;
            }
            // Decided at pass end; the next PARTIAL line may still claim it.
            LineClass::Fragment => {}
        }
    }

    for (index, state) in states.iter_mut().enumerate() {
        if *state == LineState::Unvisited {
            log::trace!("line {index}: unused fragment {:?}", lines[index].as_ref().trim());
            *state = LineState::FragmentUnused;
        }
    }

    let assembly = Assembly {
        records,
        classes,
        states,
    };

    let summary = assembly.summary();
    log::debug!(
        "assembled {} records from {} lines ({} primary, {} partial, {} consumed, {} unused)",
        assembly.records.len(),
        lines.len(),
        summary.primary,
        summary.partial,
        summary.consumed,
        summary.unused,
    );

    assembly
}

/// Split page text into the line sequence the assembler works on.
///
/// Every `\n` separates two lines, so a trailing newline yields a final
/// empty line and empty text yields one empty line. A `\r` before the
/// newline is dropped.
pub fn page_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::TablePatterns;
    use crate::types::CourseRef;

    fn classifier() -> Classifier {
        Classifier::new(&TablePatterns::default()).unwrap()
    }

    fn run(lines: &[&str]) -> Assembly {
        assemble(lines, &classifier())
    }

    #[test]
    fn test_single_primary_line() {
        let assembly = run(&["ICP101 Intro to CS   MAT201 Calculus I   2021"]);

        assert_eq!(assembly.records.len(), 1);
        let pair = &assembly.records[0];
        assert_eq!(pair.destination, CourseRef::new("ICP101", "Intro to CS"));
        assert_eq!(pair.origin, CourseRef::new("MAT201", "Calculus I"));
        assert_eq!(pair.line, 0);
        assert_eq!(assembly.states, vec![LineState::PrimaryEmitted]);
    }

    #[test]
    fn test_partial_with_left_fragment_and_trailing_empty() {
        let assembly = run(&["MAT201", "ICP102 Data Structures   Linear Algebra   2022", ""]);

        assert_eq!(assembly.records.len(), 1);
        assert_eq!(assembly.records[0].origin.code, "MAT201");
        assert_eq!(assembly.records[0].origin.name, "Linear Algebra");
        assert_eq!(
            assembly.states,
            vec![
                LineState::FragmentConsumed { by: 1 },
                LineState::PartialResolved,
                LineState::EmptySkipped,
            ]
        );
    }

    #[test]
    fn test_lonely_fragment_produces_nothing() {
        let assembly = run(&[
            "ICP101 Intro to CS   MAT201 Calculus I   2021",
            "",
            "Assinatura do coordenador",
            "",
        ]);

        assert_eq!(assembly.records.len(), 1);
        assert_eq!(assembly.states[2], LineState::FragmentUnused);
        assert!(assembly.is_settled());
    }

    #[test]
    fn test_fragment_only_page() {
        let assembly = run(&["some noise"]);
        assert!(assembly.records.is_empty());
        assert_eq!(assembly.states, vec![LineState::FragmentUnused]);
    }

    #[test]
    fn test_empty_input() {
        let assembly = run(&[]);
        assert!(assembly.records.is_empty());
        assert!(assembly.states.is_empty());
        assert!(assembly.is_settled());
    }

    #[test]
    fn test_fragment_partial_fragment_consumes_each_once() {
        let assembly = run(&["MAT", "ICP102 Data Structures   Linear Algebra   2022", "201"]);

        assert_eq!(assembly.records.len(), 1);
        // Both sides contribute: left then right.
        assert_eq!(assembly.records[0].origin.code, "MAT 201");
        assert_eq!(
            assembly.states,
            vec![
                LineState::FragmentConsumed { by: 1 },
                LineState::PartialResolved,
                LineState::FragmentConsumed { by: 1 },
            ]
        );
    }

    #[test]
    fn test_shared_fragment_goes_to_first_partial() {
        let partial_a = "ICP102 Data Structures   Linear Algebra   2022";
        let partial_b = "ICP103 Algorithms   Discrete Math   2022";
        let assembly = run(&[partial_a, "MAT201", partial_b]);

        assert_eq!(assembly.records.len(), 2);
        assert_eq!(assembly.records[0].origin.code, "MAT201");
        assert_eq!(assembly.records[1].origin.code, "");
        assert_eq!(assembly.states[1], LineState::FragmentConsumed { by: 0 });
    }

    #[test]
    fn test_realistic_table_page() {
        let lines = [
            "Disciplinas a Serem Dispensadas no IC/UFRJ      Disciplinas Cursadas na IES de Origem",
            "Código  Nome                                   Código   Nome                      Ano",
            "",
            "ICP131 Programação de Computadores I      INF1001  Algoritmos I             2019",
            "                                          CTC450",
            "ICP132 Programação de Computadores II     Estruturas de Dados          2020",
            "",
            "MAE111 Cálculo I                          MAT101   Cálculo Diferencial      2019",
            "ICP141 Fundamentos da Computação          Matemática Discreta          2020",
            "                                          MAT115",
            "                    Página 2 de 3",
        ];
        let assembly = run(&lines);

        let got: Vec<(&str, &str, &str, &str)> = assembly
            .records
            .iter()
            .map(|p| {
                (
                    p.destination.code.as_str(),
                    p.destination.name.as_str(),
                    p.origin.code.as_str(),
                    p.origin.name.as_str(),
                )
            })
            .collect();

        assert_eq!(
            got,
            vec![
                ("ICP131", "Programação de Computadores I", "INF1001", "Algoritmos I"),
                ("ICP132", "Programação de Computadores II", "CTC450", "Estruturas de Dados"),
                ("MAE111", "Cálculo I", "MAT101", "Cálculo Diferencial"),
                ("ICP141", "Fundamentos da Computação", "MAT115", "Matemática Discreta"),
            ]
        );
        assert_eq!(assembly.states[0], LineState::FragmentUnused);
        assert_eq!(assembly.states[10], LineState::FragmentUnused);
        assert!(assembly.is_settled());
    }

    #[test]
    fn test_order_follows_anchor_lines() {
        let assembly = run(&[
            "ICP103 Algorithms   Discrete Math   2022",
            "ICP101 Intro to CS   MAT201 Calculus I   2021",
            "MAT105",
            "ICP102 Data Structures   Linear Algebra   2022",
        ]);

        let anchors: Vec<usize> = assembly.records.iter().map(|p| p.line).collect();
        assert_eq!(anchors, vec![0, 1, 3]);
        assert_eq!(assembly.records[2].origin.code, "MAT105");
    }

    #[test]
    fn test_every_line_reaches_one_terminal_state() {
        let lines = [
            "noise",
            "",
            "MAT",
            "ICP102 Data Structures   Linear Algebra   2022",
            "201",
            "more noise",
            "ICP101 Intro to CS   MAT201 Calculus I   2021",
            "   ",
        ];
        let assembly = run(&lines);

        assert_eq!(assembly.states.len(), lines.len());
        assert!(assembly.is_settled());

        let summary = assembly.summary();
        assert_eq!(
            summary,
            AssemblySummary {
                primary: 1,
                partial: 1,
                consumed: 2,
                unused: 2,
                empty: 2,
            }
        );
        assert_eq!(
            summary.primary + summary.partial + summary.consumed + summary.unused + summary.empty,
            lines.len()
        );
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let lines = [
            "MAT",
            "ICP102 Data Structures   Linear Algebra   2022",
            "201",
            "ICP101 Intro to CS   MAT201 Calculus I   2021",
        ];
        let c = classifier();
        let first = assemble(&lines, &c);
        let second = assemble(&lines, &c);

        assert_eq!(first.records, second.records);
        assert_eq!(first.states, second.states);
    }

    #[test]
    fn test_page_lines_splits_on_newlines() {
        assert_eq!(page_lines("a\r\nb\n\nc"), vec!["a", "b", "", "c"]);
        assert_eq!(page_lines(""), vec![""]);
    }

    #[test]
    fn test_page_lines_keeps_trailing_empty_line() {
        let text = "ICP101 Intro to CS   MAT201 Calculus I   2021\n";
        assert_eq!(page_lines(text).len(), 2);

        let assembly = assemble(&page_lines(text), &classifier());
        assert_eq!(
            assembly.states,
            vec![LineState::PrimaryEmitted, LineState::EmptySkipped]
        );
    }

    #[test]
    fn test_line_state_serializes_snake_case() {
        let json = serde_json::to_string(&LineState::FragmentConsumed { by: 3 }).unwrap();
        assert_eq!(json, r#"{"fragment_consumed":{"by":3}}"#);
    }
}
