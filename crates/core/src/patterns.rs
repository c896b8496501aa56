//! Pattern configuration for the table and cover pages.
//!
//! Everything that describes a particular document layout lives here as plain
//! data: code prefixes, digit counts, the column-gap width and the cover-page
//! label patterns. The values deserialize from TOML (every field defaults), so
//! a different petition layout is supported by swapping the configuration
//! rather than touching the classifier or the assembler.

use serde::{Deserialize, Serialize};

use crate::PetitionError;

/// Shape of a table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablePatterns {
    /// Code prefixes of the local (destination) institution.
    pub destination_prefixes: Vec<String>,
    /// Exact number of digits after a destination prefix.
    pub destination_digits: usize,
    /// Code prefixes of the origin institution.
    pub origin_prefixes: Vec<String>,
    /// Minimum number of digits after an origin prefix.
    pub origin_min_digits: usize,
    /// Minimum whitespace run treated as a column boundary.
    pub column_gap: usize,
}

impl Default for TablePatterns {
    fn default() -> Self {
        Self {
            destination_prefixes: vec!["ICP".to_string(), "MAE".to_string()],
            destination_digits: 3,
            origin_prefixes: vec!["MAT".to_string(), "INF".to_string(), "CTC".to_string()],
            origin_min_digits: 3,
            column_gap: 2,
        }
    }
}

impl TablePatterns {
    /// Regex source for a line holding all four fields plus the year.
    ///
    /// Groups: destination code, destination name, origin code, origin name,
    /// year.
    pub fn full_row(&self) -> Result<String, PetitionError> {
        Ok(format!(
            r"^({dest})\s+(.+?)\s{{{gap},}}({origin})\s+(.+?)\s+(\d{{4}})$",
            dest = self.destination_code()?,
            origin = self.origin_code()?,
            gap = self.column_gap.max(1),
        ))
    }

    /// Regex source for a line missing the origin code.
    ///
    /// Groups: destination code, destination name, origin name, year.
    pub fn partial_row(&self) -> Result<String, PetitionError> {
        Ok(format!(
            r"^({dest})\s+(.+?)\s{{{gap},}}(.+?)\s+(\d{{4}})$",
            dest = self.destination_code()?,
            gap = self.column_gap.max(1),
        ))
    }

    fn destination_code(&self) -> Result<String, PetitionError> {
        let prefixes = alternation(&self.destination_prefixes)
            .ok_or(PetitionError::NoPrefixes("destination_prefixes"))?;
        Ok(format!(r"(?:{prefixes})\d{{{}}}", self.destination_digits))
    }

    fn origin_code(&self) -> Result<String, PetitionError> {
        let prefixes = alternation(&self.origin_prefixes)
            .ok_or(PetitionError::NoPrefixes("origin_prefixes"))?;
        Ok(format!(r"(?:{prefixes})\d{{{},}}", self.origin_min_digits))
    }
}

/// Escape and join prefixes into a regex alternation. Blank prefixes are
/// ignored; `None` when nothing is left.
fn alternation(prefixes: &[String]) -> Option<String> {
    let escaped: Vec<String> = prefixes
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(regex::escape)
        .collect();

    if escaped.is_empty() {
        None
    } else {
        Some(escaped.join("|"))
    }
}

/// Label-anchored patterns for the cover page. Capture group 1 is the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverPatterns {
    pub name: String,
    pub email: String,
    pub dre: String,
    pub date: String,
    pub origin_institution: String,
}

impl Default for CoverPatterns {
    fn default() -> Self {
        Self {
            name: r"NOME:\s*\n\s*([^\n]+)".to_string(),
            email: r"EMAIL:\s*([^\s]+)".to_string(),
            dre: r"DRE:\s*\n\s*([^\n]+)".to_string(),
            date: r"DATA:\s*(\d{2}/\d{2}/\d{4})".to_string(),
            origin_institution: r"INSTITUIÇÃO DE ENSINO SUPERIOR:\s*([^\n]+)".to_string(),
        }
    }
}

/// The complete pattern set for one document layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub table: TablePatterns,
    pub cover: CoverPatterns,
}
