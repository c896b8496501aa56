use std::fmt;

use serde::{Deserialize, Serialize};

/// Personal fields read from the cover page of a petition.
///
/// Every field is optional: a label that cannot be found on the page leaves
/// its field as `None` without affecting the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentHeader {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Institutional registration number.
    pub dre: Option<String>,
    pub date: Option<String>,
    pub origin_institution: Option<String>,
}

impl StudentHeader {
    /// `true` when no cover field was recovered.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.dre.is_none()
            && self.date.is_none()
            && self.origin_institution.is_none()
    }
}

/// One course as it appears in a table row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub code: String,
    pub name: String,
}

impl CourseRef {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        CourseRef {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for CourseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.code, self.name)
        }
    }
}

/// A requested equivalence: the local course to be credited and the course
/// taken at the origin institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisciplinePair {
    pub destination: CourseRef,
    pub origin: CourseRef,
    /// Index of the PRIMARY or PARTIAL line that anchored this record.
    pub line: usize,
    /// Trailing year token of the anchor line.
    pub year: Option<String>,
}

/// Everything extracted from one petition document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub header: StudentHeader,
    pub disciplines: Vec<DisciplinePair>,
}

impl ParseResult {
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.disciplines.is_empty()
    }
}
