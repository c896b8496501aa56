use regex::Regex;

use crate::patterns::CoverPatterns;
use crate::types::StudentHeader;
use crate::PetitionError;

/// Compiled label patterns for the cover page.
#[derive(Debug, Clone)]
pub struct CoverFields {
    name: Regex,
    email: Regex,
    dre: Regex,
    date: Regex,
    origin_institution: Regex,
}

impl CoverFields {
    pub fn new(patterns: &CoverPatterns) -> Result<Self, PetitionError> {
        Ok(CoverFields {
            name: compile("cover.name", &patterns.name)?,
            email: compile("cover.email", &patterns.email)?,
            dre: compile("cover.dre", &patterns.dre)?,
            date: compile("cover.date", &patterns.date)?,
            origin_institution: compile(
                "cover.origin_institution",
                &patterns.origin_institution,
            )?,
        })
    }

    /// Look up every field independently; a field whose label is missing is
    /// left as `None`.
    pub fn read(&self, text: &str) -> StudentHeader {
        StudentHeader {
            name: find_value(&self.name, text),
            email: find_value(&self.email, text),
            dre: find_value(&self.dre, text),
            date: find_value(&self.date, text),
            origin_institution: find_value(&self.origin_institution, text),
        }
    }
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, PetitionError> {
    Regex::new(pattern).map_err(|source| PetitionError::Pattern { field, source })
}

/// First match of `re` in `text`, returning capture group 1 trimmed.
///
/// Patterns without a capture group fall back to the whole match. An empty
/// value counts as not found.
pub fn find_value(re: &Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    let value = caps.get(1).or_else(|| caps.get(0))?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
