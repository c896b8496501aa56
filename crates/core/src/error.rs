use thiserror::Error;

/// Failures that abort a whole extraction.
///
/// Per-line anomalies (unmatched cover labels, unclassified table lines) are
/// never errors; they surface only as absent fields or missing records.
#[derive(Debug, Error)]
pub enum PetitionError {
    #[error("Document could not be read: {0}")]
    SourceUnreadable(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Invalid pattern for {field}: {source}")]
    Pattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },
    #[error("No code prefixes configured for {0}")]
    NoPrefixes(&'static str),
}

impl PetitionError {
    pub fn unreadable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        PetitionError::SourceUnreadable(Box::new(err))
    }
}
