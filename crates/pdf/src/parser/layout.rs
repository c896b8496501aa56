//! Text extraction and line rendering.
//!
//! Walks a page's content stream with a simplified text-state machine,
//! groups the resulting spans into visual lines and renders them either as
//! plain reading-order text or with horizontal positions preserved as runs
//! of spaces.
//!
//! # Pipeline
//!
//! ```text
//! content ops  ->  TextSpan[]  ->  TextLine[]  ->  String
//!   (per page)      extract         group_spans     render_plain / render_layout
//! ```

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use super::backend::{Operand, Operation, PageBackend, PageFont, PageId};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A single run of text at a specific position on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
}

/// Spans sharing (approximately) the same baseline, sorted left to right.
#[derive(Debug, Clone, Default)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub y: f32,
}

impl TextLine {
    /// Span texts joined by single spaces.
    pub fn plain_text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Span texts placed at the character column of their X position.
    ///
    /// A span that would start at or before the end of the previous one is
    /// separated from it by exactly one space. Columns past
    /// [`MAX_LAYOUT_COLUMN`] are pulled back to it.
    pub fn layout_text(&self, x_density: f32) -> String {
        let density = if x_density > 0.0 { x_density } else { 1.0 };
        let mut out = String::new();
        let mut cursor = 0usize;

        for span in &self.spans {
            let column = clamp_count(span.x / density, MAX_LAYOUT_COLUMN);
            if column > cursor {
                out.extend(std::iter::repeat(' ').take(column - cursor));
                cursor = column;
            } else if cursor > 0 {
                out.push(' ');
                cursor += 1;
            }
            out.push_str(&span.text);
            cursor += span.text.width();
        }

        out
    }
}

/// Point-to-character conversion used by [`render_layout`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Points per character column.
    pub x_density: f32,
    /// Points per text line.
    pub y_density: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            x_density: 7.25,
            y_density: 13.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Two spans whose Y coordinates differ by less than this are treated as
/// belonging to the same line.
const Y_TOLERANCE: f32 = 1.0;

/// Approximate character width as a fraction of font size for proportional
/// fonts.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Glyph width of the standard monospaced fonts (600/1000 em).
const MONOSPACE_CHAR_WIDTH_RATIO: f32 = 0.6;

/// Spans closer than this (in points) are glued together without a space.
const MIN_WORD_GAP: f32 = 1.5;

/// A `TJ` displacement wider than this many ems starts a new span.
const TJ_SPLIT_EMS: f32 = 1.0;

/// Widest indentation, in character columns, that layout text will emit.
pub const MAX_LAYOUT_COLUMN: usize = 2048;

/// Most blank lines emitted for a single vertical gap.
pub const MAX_BLANK_LINES: usize = 256;

const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    /// Resource entry of the current font, if `Tf` named a known one.
    font: Option<PageFont>,
    font_size: f32,
    /// Character width ratio of the current font.
    char_ratio: f32,
    /// Elements [a, b, c, d, tx, ty] of the current text matrix.
    text_matrix: [f32; 6],
    /// Set by BT and updated by Td/TD/T*/Tm.
    line_matrix: [f32; 6],
    /// Horizontal scaling (percent / 100).
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 0.0,
            char_ratio: APPROX_CHAR_WIDTH_RATIO,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5] + self.text_rise
    }

    /// Rendered font size: `font_size * sqrt(b^2 + d^2)`.
    fn effective_font_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    fn glyph_width(&self) -> f32 {
        self.font_size * self.char_ratio * self.horiz_scale
    }

    /// Estimated width of `text` in user space.
    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.glyph_width() * self.text_matrix[0].abs()
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Advance past `text` as if its glyphs had been painted.
    fn advance_after_show(&mut self, text: &str) {
        let dx: f32 = text
            .chars()
            .map(|ch| {
                let spacing = if ch == ' ' { self.word_spacing } else { 0.0 };
                self.glyph_width() + self.char_spacing + spacing
            })
            .sum();
        self.advance_x(dx);
    }

    fn translate_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn set_font(&mut self, font: Option<PageFont>, size: f32) {
        self.font_size = size;
        self.char_ratio = match font.as_ref().and_then(|f| f.base_font.as_deref()) {
            Some(name) if name.to_ascii_lowercase().contains("courier") => {
                MONOSPACE_CHAR_WIDTH_RATIO
            }
            _ => APPROX_CHAR_WIDTH_RATIO,
        };
        self.font = font;
    }

    fn span(&self, text: String, x: f32, y: f32) -> TextSpan {
        TextSpan {
            width: self.text_width(&text),
            text,
            x,
            y,
            font_size: self.effective_font_size(),
        }
    }
}

fn decode_operand(operand: &Operand, backend: &dyn PageBackend, state: &TextState) -> String {
    match operand {
        Operand::Str(bytes) => backend.decode_text(state.font.as_ref(), bytes),
        _ => String::new(),
    }
}

/// Round a non-negative float to a count no larger than `max`.
///
/// NaN counts as zero.
fn clamp_count(value: f32, max: usize) -> usize {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, max as f32) as usize
}

// ---------------------------------------------------------------------------
// Public API: span extraction
// ---------------------------------------------------------------------------

/// Walk a page's content stream and collect its text spans.
///
/// | Operator | Action |
/// |----------|--------|
/// | `BT`     | Reset matrices |
/// | `Tf`     | Set font and size |
/// | `Tm`     | Set text matrix |
/// | `Td` `TD` `T*` `TL` | Line positioning |
/// | `Tc` `Tw` `Tz` `Ts` | Spacing, scaling, rise |
/// | `Tj` `'` `"` | Show a string |
/// | `TJ`     | Show strings with kerning, splitting on wide gaps |
///
/// Spans placed outside the page's MediaBox are dropped.
pub fn extract_page_spans(
    backend: &dyn PageBackend,
    page: PageId,
) -> Result<Vec<TextSpan>, PdfError> {
    let ops = backend.page_operations(page)?;
    let fonts = backend.page_fonts(page).unwrap_or_default();
    let mut spans = walk_operations(&ops, &fonts, backend);

    let before = spans.len();
    match backend.page_media_box(page) {
        Some(bounds) => spans.retain(|s| bounds.contains(s.x, s.y)),
        None => spans.retain(|s| s.x.is_finite() && s.y.is_finite()),
    }
    if spans.len() < before {
        log::debug!(
            "page {:?}: dropped {} span(s) outside the page",
            page,
            before - spans.len()
        );
    }

    Ok(spans)
}

fn walk_operations(
    ops: &[Operation],
    fonts: &[PageFont],
    backend: &dyn PageBackend,
) -> Vec<TextSpan> {
    let mut state = TextState::default();
    let mut spans = Vec::new();

    for op in ops {
        match op.operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => handle_tf(op, fonts, &mut state),
            "Tm" => handle_tm(op, &mut state),
            "Td" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.next_line(),
            "TL" => {
                if let Some(v) = op.number(0) {
                    state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = op.number(0) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = op.number(0) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = op.number(0) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = op.number(0) {
                    state.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(first) = op.operands.first() {
                    show_string(first, backend, &mut state, &mut spans);
                }
            }
            "TJ" => {
                if let Some(Operand::Array(items)) = op.operands.first() {
                    show_tj_array(items, backend, &mut state, &mut spans);
                }
            }
            "'" => {
                state.next_line();
                if let Some(first) = op.operands.first() {
                    show_string(first, backend, &mut state, &mut spans);
                }
            }
            "\"" => {
                if op.operands.len() >= 3 {
                    if let Some(aw) = op.number(0) {
                        state.word_spacing = aw;
                    }
                    if let Some(ac) = op.number(1) {
                        state.char_spacing = ac;
                    }
                    state.next_line();
                    show_string(&op.operands[2], backend, &mut state, &mut spans);
                }
            }
            _ => {}
        }
    }

    spans
}

fn handle_tf(op: &Operation, fonts: &[PageFont], state: &mut TextState) {
    let key = match op.operands.first() {
        Some(Operand::Name(n)) | Some(Operand::Str(n)) => n.clone(),
        _ => return,
    };
    let size = op.number(1).unwrap_or(0.0);
    let font = fonts.iter().find(|font| font.key == key).cloned();
    state.set_font(font, size);
}

fn handle_tm(op: &Operation, state: &mut TextState) {
    let values: Vec<f32> = (0..6).filter_map(|i| op.number(i)).collect();
    if let &[a, b, c, d, e, f] = values.as_slice() {
        state.text_matrix = [a, b, c, d, e, f];
        state.line_matrix = state.text_matrix;
    }
}

fn show_string(
    operand: &Operand,
    backend: &dyn PageBackend,
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let text = decode_operand(operand, backend, state);
    if text.is_empty() {
        return;
    }
    spans.push(state.span(text.clone(), state.x(), state.y()));
    state.advance_after_show(&text);
}

/// Process a `TJ` array of strings and kerning adjustments (thousandths of
/// a text-space unit, negative moves right).
///
/// A small rightward adjustment becomes a space; one wider than an em ends
/// the current span so that column gaps survive into the layout text.
fn show_tj_array(
    items: &[Operand],
    backend: &dyn PageBackend,
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let mut buf = String::new();
    let mut span_x = state.x();
    let span_y = state.y();

    for item in items {
        if let Operand::Str(_) = item {
            let fragment = decode_operand(item, backend, state);
            if buf.is_empty() {
                span_x = state.x();
            }
            buf.push_str(&fragment);
            state.advance_after_show(&fragment);
            continue;
        }

        let Some(adjustment) = item.number() else {
            continue;
        };
        let dx = -adjustment / 1000.0 * state.font_size * state.horiz_scale;

        if dx > state.font_size * TJ_SPLIT_EMS {
            flush_tj_buffer(&mut buf, span_x, span_y, state, spans);
        } else if dx > state.glyph_width() * 0.3 && !buf.is_empty() {
            buf.push(' ');
        }
        state.advance_x(dx);
    }

    flush_tj_buffer(&mut buf, span_x, span_y, state, spans);
}

fn flush_tj_buffer(
    buf: &mut String,
    span_x: f32,
    span_y: f32,
    state: &TextState,
    spans: &mut Vec<TextSpan>,
) {
    let text = buf.trim_end();
    if !text.is_empty() {
        spans.push(state.span(text.to_string(), span_x, span_y));
    }
    buf.clear();
}

// ---------------------------------------------------------------------------
// Public API: span -> line grouping
// ---------------------------------------------------------------------------

/// Group spans into lines, top of the page first.
///
/// Spans whose Y coordinates are within [`Y_TOLERANCE`] points of the line's
/// first span share the line.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();

    for span in spans {
        if let Some(first) = current.first() {
            if (span.y - first.y).abs() > Y_TOLERANCE {
                lines.push(assemble_line(std::mem::take(&mut current)));
            }
        }
        current.push(span);
    }

    if !current.is_empty() {
        lines.push(assemble_line(current));
    }

    lines
}

/// Sort spans left to right and glue the ones that touch.
fn assemble_line(mut spans: Vec<TextSpan>) -> TextLine {
    spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

    let mut merged: Vec<TextSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(prev) = merged.last_mut() {
            let gap = span.x - (prev.x + prev.width);
            if gap < MIN_WORD_GAP && gap > -prev.font_size.max(1.0) {
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                continue;
            }
        }
        merged.push(span);
    }

    TextLine {
        y: merged.first().map(|s| s.y).unwrap_or(0.0),
        spans: merged,
    }
}

// ---------------------------------------------------------------------------
// Public API: rendering
// ---------------------------------------------------------------------------

/// One text line per visual line, words in reading order.
pub fn render_plain(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(TextLine::plain_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Visual lines with horizontal positions kept as runs of spaces.
///
/// Vertical gaps wider than one line pitch become blank lines, at most
/// [`MAX_BLANK_LINES`] per gap.
pub fn render_layout(lines: &[TextLine], options: &LayoutOptions) -> String {
    let pitch = if options.y_density > 0.0 {
        options.y_density
    } else {
        1.0
    };
    let mut out: Vec<String> = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            let gap = lines[i - 1].y - line.y;
            let blanks = clamp_count(gap / pitch - 1.0, MAX_BLANK_LINES);
            out.extend(std::iter::repeat(String::new()).take(blanks));
        }
        out.push(line.layout_text(options.x_density));
    }

    out.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
