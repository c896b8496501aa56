//! Core library for petition extraction
//!
//! This crate implements the **Functional Core** of the petition tooling: the
//! table reconstruction engine that turns whitespace-aligned page text into
//! ordered course-equivalence records. It performs no I/O; the document reader
//! lives behind the [`extract::PageSource`] trait and is implemented by the
//! `petition_pdf` crate.
//!
//! # Pipeline
//!
//! ```text
//! cover page text ──► CoverFields::read ──────────────► StudentHeader
//! table page text ──► page_lines ──► assemble ─────────► Vec<DisciplinePair>
//!                                     │  classify (per line, once)
//!                                     └─ resolve_partial (PARTIAL rows)
//! ```
//!
//! # Module Organization
//!
//! - [`patterns`]: layout configuration (code prefixes, column gap, cover labels)
//! - [`classify`]: EMPTY / PRIMARY / PARTIAL / FRAGMENT line classification
//! - [`resolve`]: borrowing a missing origin code from neighboring fragments
//! - [`assemble`]: the one-pass per-line state machine
//! - [`cover`]: label-anchored cover-page lookups
//! - [`extract`]: orchestration over a [`extract::PageSource`]
//! - [`report`]: plain-text printable grid of the extracted records
//!
//! # Example Usage
//!
//! ```rust
//! use petition_core::{assemble::assemble, classify::Classifier, patterns::TablePatterns};
//!
//! let classifier = Classifier::new(&TablePatterns::default()).unwrap();
//! let lines = ["MAT201", "ICP102 Data Structures   Linear Algebra   2022", ""];
//! let assembly = assemble(&lines, &classifier);
//!
//! assert_eq!(assembly.records.len(), 1);
//! assert_eq!(assembly.records[0].origin.code, "MAT201");
//! ```

pub mod assemble;
pub mod classify;
pub mod cover;
mod error;
pub mod extract;
pub mod patterns;
pub mod report;
pub mod resolve;
pub mod types;

pub use error::PetitionError;
pub use extract::{Extractor, PageSource, TextMode};
pub use patterns::{CoverPatterns, PatternConfig, TablePatterns};
pub use types::*;
