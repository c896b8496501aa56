use regex::Regex;

use crate::patterns::TablePatterns;
use crate::types::CourseRef;
use crate::PetitionError;

/// Fields captured from a row line.
///
/// For a PARTIAL row the origin code is empty until the fragment resolver
/// fills it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFields {
    pub destination: CourseRef,
    pub origin: CourseRef,
    pub year: String,
}

/// Category of a single table-page line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Blank after trimming.
    Empty,
    /// All four fields are present on the line.
    Primary(RowFields),
    /// Everything but the origin code is present.
    Partial(RowFields),
    /// Anything else: candidate continuation text.
    Fragment,
}

impl LineClass {
    /// `true` for lines that anchor their own record.
    pub fn is_row(&self) -> bool {
        matches!(self, LineClass::Primary(_) | LineClass::Partial(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            LineClass::Empty => "empty",
            LineClass::Primary(_) => "primary",
            LineClass::Partial(_) => "partial",
            LineClass::Fragment => "fragment",
        }
    }
}

/// Compiled row patterns.
///
/// The full pattern is always tried before the partial one: the partial
/// pattern is a relaxation of the full one and matches every PRIMARY line.
#[derive(Debug, Clone)]
pub struct Classifier {
    full: Regex,
    partial: Regex,
}

impl Classifier {
    pub fn new(patterns: &TablePatterns) -> Result<Self, PetitionError> {
        let full = Regex::new(&patterns.full_row()?).map_err(|source| PetitionError::Pattern {
            field: "table.full_row",
            source,
        })?;
        let partial =
            Regex::new(&patterns.partial_row()?).map_err(|source| PetitionError::Pattern {
                field: "table.partial_row",
                source,
            })?;

        Ok(Classifier { full, partial })
    }

    /// Classify one raw line. Surrounding whitespace is ignored.
    pub fn classify(&self, line: &str) -> LineClass {
        let line = line.trim();
        if line.is_empty() {
            return LineClass::Empty;
        }

        if let Some(caps) = self.full.captures(line) {
            return LineClass::Primary(RowFields {
                destination: CourseRef::new(group(&caps, 1), group(&caps, 2)),
                origin: CourseRef::new(group(&caps, 3), group(&caps, 4)),
                year: group(&caps, 5),
            });
        }

        if let Some(caps) = self.partial.captures(line) {
            return LineClass::Partial(RowFields {
                destination: CourseRef::new(group(&caps, 1), group(&caps, 2)),
                origin: CourseRef::new(String::new(), group(&caps, 3)),
                year: group(&caps, 4),
            });
        }

        LineClass::Fragment
    }

    /// Classify every line of a page, preserving indices.
    pub fn classify_all<S: AsRef<str>>(&self, lines: &[S]) -> Vec<LineClass> {
        lines.iter().map(|l| self.classify(l.as_ref())).collect()
    }
}

fn group(caps: &regex::Captures<'_>, index: usize) -> String {
    caps.get(index)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
