use crate::assemble::{assemble, page_lines, Assembly};
use crate::classify::Classifier;
use crate::cover::CoverFields;
use crate::patterns::PatternConfig;
use crate::types::{ParseResult, StudentHeader};
use crate::PetitionError;

/// Page holding the labeled personal fields.
pub const COVER_PAGE: usize = 0;
/// Page holding the course table.
pub const TABLE_PAGE: usize = 1;

/// How a page's text should be rendered by the document reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Reading order, words separated by single spaces.
    Plain,
    /// Horizontal positions preserved as runs of spaces; required for the
    /// column-gap heuristic of the table page.
    Layout,
}

/// A paginated document that can hand out the text of each page.
pub trait PageSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn page_count(&self) -> usize;

    /// Text of the zero-based page `index`.
    fn page_text(&self, index: usize, mode: TextMode) -> Result<String, Self::Error>;
}

/// Compiled patterns for one document layout.
///
/// Cheap to clone; every extraction works on its own line sequence and
/// state vector, so one extractor can be shared by many callers.
#[derive(Debug, Clone)]
pub struct Extractor {
    classifier: Classifier,
    cover: CoverFields,
}

impl Extractor {
    pub fn new(config: &PatternConfig) -> Result<Self, PetitionError> {
        Ok(Extractor {
            classifier: Classifier::new(&config.table)?,
            cover: CoverFields::new(&config.cover)?,
        })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Read the cover and table pages of `source`.
    ///
    /// Pages that do not exist leave their part of the result empty. Only a
    /// failure to read a page that does exist aborts the extraction.
    pub fn extract<S: PageSource>(&self, source: &S) -> Result<ParseResult, PetitionError> {
        let pages = source.page_count();
        log::debug!("extracting petition from {pages} page(s)");

        let header = if pages > COVER_PAGE {
            let text = source
                .page_text(COVER_PAGE, TextMode::Plain)
                .map_err(PetitionError::unreadable)?;
            self.cover.read(&text)
        } else {
            StudentHeader::default()
        };

        let disciplines = if pages > TABLE_PAGE {
            self.table(source)?.records
        } else {
            Vec::new()
        };

        Ok(ParseResult {
            header,
            disciplines,
        })
    }

    /// Run the assembler over the table page and keep all bookkeeping.
    ///
    /// A document without a table page yields an empty assembly.
    pub fn table<S: PageSource>(&self, source: &S) -> Result<Assembly, PetitionError> {
        if source.page_count() <= TABLE_PAGE {
            return Ok(assemble::<&str>(&[], &self.classifier));
        }

        let text = source
            .page_text(TABLE_PAGE, TextMode::Layout)
            .map_err(PetitionError::unreadable)?;
        Ok(self.assemble_text(&text))
    }

    /// Assemble records from already-extracted table-page text.
    pub fn assemble_text(&self, text: &str) -> Assembly {
        assemble(&page_lines(text), &self.classifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CourseRef;

    #[derive(Debug, thiserror::Error)]
    #[error("broken page {0}")]
    struct BrokenPage(usize);

    /// In-memory pages; `broken` pages fail to read.
    struct MockSource {
        pages: Vec<String>,
        broken: Vec<usize>,
        requested: std::cell::RefCell<Vec<(usize, TextMode)>>,
    }

    impl MockSource {
        fn new(pages: &[&str]) -> Self {
            MockSource {
                pages: pages.iter().map(|p| p.to_string()).collect(),
                broken: Vec::new(),
                requested: std::cell::RefCell::new(Vec::new()),
            }
        }
    }

    impl PageSource for MockSource {
        type Error = BrokenPage;

        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, index: usize, mode: TextMode) -> Result<String, BrokenPage> {
            self.requested.borrow_mut().push((index, mode));
            if self.broken.contains(&index) {
                return Err(BrokenPage(index));
            }
            Ok(self.pages[index].clone())
        }
    }

    fn extractor() -> Extractor {
        Extractor::new(&PatternConfig::default()).unwrap()
    }

    const COVER: &str = "NOME:\nAna Lima\nDRE:\n120111222\nEMAIL: ana@example.com\nDATA: 10/01/2025";
    const TABLE: &str = "\
ICP101 Intro to CS            MAT201 Calculus I        2021
                              INF300
ICP102 Data Structures        Linear Algebra           2022
";

    #[test]
    fn test_extract_two_pages() {
        let source = MockSource::new(&[COVER, TABLE]);
        let result = extractor().extract(&source).unwrap();

        assert_eq!(result.header.name.as_deref(), Some("Ana Lima"));
        assert_eq!(result.header.dre.as_deref(), Some("120111222"));
        assert_eq!(result.header.origin_institution, None);
        assert_eq!(result.disciplines.len(), 2);
        assert_eq!(
            result.disciplines[1].origin,
            CourseRef::new("INF300", "Linear Algebra")
        );
        assert_eq!(
            *source.requested.borrow(),
            vec![(COVER_PAGE, TextMode::Plain), (TABLE_PAGE, TextMode::Layout)]
        );
    }

    #[test]
    fn test_zero_pages_is_an_empty_result() {
        let source = MockSource::new(&[]);
        let result = extractor().extract(&source).unwrap();
        assert!(result.is_empty());
        assert!(source.requested.borrow().is_empty());
    }

    #[test]
    fn test_cover_only_document() {
        let source = MockSource::new(&[COVER]);
        let result = extractor().extract(&source).unwrap();
        assert_eq!(result.header.email.as_deref(), Some("ana@example.com"));
        assert!(result.disciplines.is_empty());
    }

    #[test]
    fn test_extra_pages_are_ignored() {
        let source = MockSource::new(&[COVER, TABLE, "ICP999 Ignored   MAT999 Ignored   2000"]);
        let result = extractor().extract(&source).unwrap();
        assert_eq!(result.disciplines.len(), 2);
    }

    #[test]
    fn test_unreadable_page_fails_the_extraction() {
        let mut source = MockSource::new(&[COVER, TABLE]);
        source.broken = vec![TABLE_PAGE];
        let err = extractor().extract(&source).unwrap_err();
        assert!(matches!(err, PetitionError::SourceUnreadable(_)));
        assert!(err.to_string().contains("broken page 1"));
    }

    #[test]
    fn test_table_without_table_page() {
        let source = MockSource::new(&[COVER]);
        let assembly = extractor().table(&source).unwrap();
        assert!(assembly.records.is_empty());
        assert!(assembly.states.is_empty());
    }

    #[test]
    fn test_extractor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Extractor>();
    }
}
