use lopdf::{self, content::Content};

use crate::PdfError;

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Font resource entry of a page, reduced to what text decoding needs.
#[derive(Debug, Clone)]
pub struct PageFont {
    /// Resource key as used by `Tf` (e.g. `b"F1"`).
    pub key: Vec<u8>,
    pub base_font: Option<String>,
    /// Name of the `/Encoding` entry when it is a plain name.
    pub encoding: Option<String>,
}

/// Page rectangle `[llx, lly, urx, ury]` in default user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl MediaBox {
    /// Build from the four numbers of a `/MediaBox` array, normalizing
    /// swapped corners.
    pub fn from_corners(values: [f32; 4]) -> Option<Self> {
        if !values.iter().all(|v| v.is_finite()) {
            return None;
        }
        let [x0, y0, x1, y1] = values;
        Some(Self {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        })
    }

    /// `true` when the point lies on the page (edges included).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.llx && x <= self.urx && y >= self.lly && y <= self.ury
    }
}

/// A content-stream operand detached from `lopdf::Object`.
///
/// Only the shapes that text operators can carry are kept; anything else
/// becomes [`Operand::Other`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<Operand>),
    Other,
}

impl Operand {
    /// Numeric value of an `Integer` or `Real` operand.
    pub fn number(&self) -> Option<f32> {
        match self {
            Operand::Integer(i) => Some(*i as f32),
            Operand::Real(f) => Some(*f),
            _ => None,
        }
    }
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct Operation {
    pub operator: String,
    pub operands: Vec<Operand>,
}

impl Operation {
    /// Numeric operand at `index`, if present and numeric.
    pub fn number(&self, index: usize) -> Option<f32> {
        self.operands.get(index).and_then(Operand::number)
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Convert a `lopdf::Object` operand into an [`Operand`].
pub fn convert_operand(obj: &lopdf::Object) -> Operand {
    match obj {
        lopdf::Object::Integer(i) => Operand::Integer(*i),
        lopdf::Object::Real(f) => Operand::Real(*f),
        lopdf::Object::Name(n) => Operand::Name(n.clone()),
        lopdf::Object::String(s, _) => Operand::Str(s.clone()),
        lopdf::Object::Array(arr) => Operand::Array(arr.iter().map(convert_operand).collect()),
        _ => Operand::Other,
    }
}

/// Best-effort decoding of raw PDF string bytes.
///
/// UTF-16BE with a BOM first, then UTF-8, then Latin-1 (which agrees with
/// WinAnsi for the accented letters found in Portuguese text).
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

// ---------------------------------------------------------------------------
// PageBackend trait
// ---------------------------------------------------------------------------

/// What the text extractor needs from a parsed document.
///
/// Kept as a trait so the content-stream walker can be tested against
/// hand-built operation lists.
pub trait PageBackend {
    /// Page identifiers in document order (index 0 is the first page).
    fn page_ids(&self) -> Vec<PageId>;

    fn page_fonts(&self, page: PageId) -> Result<Vec<PageFont>, PdfError>;

    /// Decoded content-stream operations of a page.
    fn page_operations(&self, page: PageId) -> Result<Vec<Operation>, PdfError>;

    /// The page's `/MediaBox`, inherited from the page tree when absent.
    fn page_media_box(&self, page: PageId) -> Option<MediaBox>;

    /// Decode the bytes of a text-showing operand drawn with `font`.
    fn decode_text(&self, font: Option<&PageFont>, bytes: &[u8]) -> String;
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// [`PageBackend`] over an in-memory [`lopdf::Document`].
/// Guards the `/Parent` walk against cyclic page trees.
const MAX_PAGE_TREE_DEPTH: usize = 32;

pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    /// Walk up the page tree to the nearest `/MediaBox`.
    fn find_media_box<'a>(&'a self, dict: &'a lopdf::Dictionary) -> Option<MediaBox> {
        let mut current = dict;
        for _ in 0..MAX_PAGE_TREE_DEPTH {
            if let Ok(obj) = current.get(b"MediaBox") {
                return self.resolve_media_box(obj);
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn resolve_media_box(&self, obj: &lopdf::Object) -> Option<MediaBox> {
        let array = match obj {
            lopdf::Object::Reference(id) => self.doc.get_object(*id).ok()?.as_array().ok()?,
            other => other.as_array().ok()?,
        };
        let numbers: Vec<f32> = array
            .iter()
            .filter_map(|item| convert_operand(item).number())
            .collect();
        match numbers.as_slice() {
            &[x0, y0, x1, y1] => MediaBox::from_corners([x0, y0, x1, y1]),
            _ => None,
        }
    }
}

impl PageBackend for LopdfBackend {
    fn page_ids(&self) -> Vec<PageId> {
        // `get_pages` is keyed by 1-based page number, so values are in order.
        self.doc.get_pages().into_values().collect()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<PageFont>, PdfError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;

        Ok(fonts
            .iter()
            .map(|(key, dict)| PageFont {
                key: key.clone(),
                base_font: dict
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).into_owned()),
                encoding: dict.get(b"Encoding").ok().and_then(|o| match o {
                    lopdf::Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
                    _ => None,
                }),
            })
            .collect())
    }

    fn page_operations(&self, page: PageId) -> Result<Vec<Operation>, PdfError> {
        let raw = self
            .doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))?;
        let content = Content::decode(&raw)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| Operation {
                operator: op.operator,
                operands: op.operands.iter().map(convert_operand).collect(),
            })
            .collect())
    }

    fn page_media_box(&self, page: PageId) -> Option<MediaBox> {
        let dict = self.doc.get_dictionary(page).ok()?;
        self.find_media_box(dict)
    }

    fn decode_text(&self, font: Option<&PageFont>, bytes: &[u8]) -> String {
        // Identity-H/V fonts carry 2-byte codes that are usually UTF-16BE.
        let identity = font
            .and_then(|f| f.encoding.as_deref())
            .is_some_and(|enc| enc.contains("Identity"));

        if identity && bytes.len() >= 2 && bytes.len() % 2 == 0 {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            let decoded = String::from_utf16_lossy(&units);
            if !decoded.chars().all(|c| c == '\u{FFFD}' || c == '\0') {
                return decoded;
            }
        }

        decode_pdf_string(bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
