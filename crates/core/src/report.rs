//! Plain-text printable report.
//!
//! Lays out discipline records in a four-column grid (destination code and
//! name, origin code and name). Cell text is word-wrapped to its column width,
//! each row is as tall as its tallest cell, and rows are packed into pages
//! with a fixed body height. Nothing here re-parses anything: the input is
//! the engine's finished records.
//!
//! Widths are display columns, so wide characters count twice and combining
//! marks not at all.

use prettytable::format::{Alignment, FormatBuilder, LinePosition, LineSeparator};
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::types::{DisciplinePair, StudentHeader};

const TITLE: &str = "Course Equivalence Petition";
const MISSING: &str = "(not provided)";

/// Column widths (in characters) and page body height (in text lines).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub destination_code: usize,
    pub destination_name: usize,
    pub origin_code: usize,
    pub origin_name: usize,
    pub page_lines: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            destination_code: 10,
            destination_name: 32,
            origin_code: 10,
            origin_name: 32,
            page_lines: 40,
        }
    }
}

impl GridLayout {
    fn widths(&self) -> [usize; 4] {
        [
            self.destination_code.max(1),
            self.destination_name.max(1),
            self.origin_code.max(1),
            self.origin_name.max(1),
        ]
    }

    /// Total rendered width of a grid line including borders.
    pub fn total_width(&self) -> usize {
        self.widths().iter().map(|w| w + 3).sum::<usize>() + 1
    }
}

/// One record laid out for printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub cells: [Vec<String>; 4],
    pub height: usize,
}

/// Word-wrap `text` to `width` display columns.
///
/// Words longer than the width are split hard. Always returns at least one
/// (possibly empty) line.
pub fn wrap_cell(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.width();

        if word_len > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut pieces = split_by_width(word, width);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
        } else if current.width() + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Cut `word` into pieces of at most `width` columns. A single character
/// wider than `width` gets a piece of its own.
fn split_by_width(word: &str, width: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut used = 0;

    for ch in word.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width && !piece.is_empty() {
            pieces.push(std::mem::take(&mut piece));
            used = 0;
        }
        piece.push(ch);
        used += w;
    }

    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Wrap every record's cells and compute the row heights.
pub fn layout_rows(records: &[DisciplinePair], layout: &GridLayout) -> Vec<GridRow> {
    let [dc, dn, oc, on] = layout.widths();
    records
        .iter()
        .map(|pair| {
            let cells = [
                wrap_cell(&pair.destination.code, dc),
                wrap_cell(&pair.destination.name, dn),
                wrap_cell(&pair.origin.code, oc),
                wrap_cell(&pair.origin.name, on),
            ];
            let height = cells.iter().map(Vec::len).max().unwrap_or(1);
            GridRow { cells, height }
        })
        .collect()
}

/// Pack rows into pages of at most `page_lines` body lines.
///
/// A row taller than a whole page is placed alone on its own page.
pub fn paginate(rows: Vec<GridRow>, page_lines: usize) -> Vec<Vec<GridRow>> {
    let mut pages: Vec<Vec<GridRow>> = Vec::new();
    let mut current: Vec<GridRow> = Vec::new();
    let mut used = 0;

    for row in rows {
        if !current.is_empty() && used + row.height > page_lines {
            pages.push(std::mem::take(&mut current));
            used = 0;
        }
        used += row.height;
        current.push(row);
    }

    if !current.is_empty() {
        pages.push(current);
    }
    pages
}

/// Render the full printable document.
pub fn render(header: &StudentHeader, records: &[DisciplinePair], layout: &GridLayout) -> String {
    let widths = layout.widths();
    let total = layout.total_width();
    let mut pages = paginate(layout_rows(records, layout), layout.page_lines);
    if pages.is_empty() {
        pages.push(Vec::new());
    }
    let page_count = pages.len();

    let mut out = String::new();
    for (number, rows) in pages.iter().enumerate() {
        if number > 0 {
            out.push('\u{000C}');
        }

        out.push_str(&format!("{:^total$}\n\n", TITLE));

        if number == 0 {
            out.push_str(&header_block(header));
            out.push('\n');
        }

        let body = page_table(rows, &widths).to_string();
        out.push_str(&body);
        if !body.ends_with('\n') {
            out.push('\n');
        }

        let footer = format!("Page {}/{}", number + 1, page_count);
        out.push_str(&format!("{footer:>total$}\n"));
    }
    out
}

fn header_block(header: &StudentHeader) -> String {
    let fields = [
        ("Name", &header.name),
        ("DRE", &header.dre),
        ("Email", &header.email),
        ("Date", &header.date),
        ("Origin institution", &header.origin_institution),
    ];
    fields
        .iter()
        .map(|(label, value)| format!("{label}: {}\n", value.as_deref().unwrap_or(MISSING)))
        .collect()
}

/// Bordered table with a rule between every row.
fn grid_table() -> Table {
    let mut table = Table::new();

    let format = FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separators(
            &[LinePosition::Top, LinePosition::Intern, LinePosition::Bottom],
            LineSeparator::new('-', '+', '+', '+'),
        )
        .padding(1, 1)
        .build();

    table.set_format(format);

    table
}

/// One page body: group titles, column labels, then the record rows.
fn page_table(rows: &[GridRow], widths: &[usize; 4]) -> Table {
    let mut table = grid_table();

    table.add_row(Row::new(vec![
        spanning_cell("Destination courses", &widths[..2], Alignment::CENTER),
        spanning_cell("Origin courses", &widths[2..], Alignment::CENTER),
    ]));

    // Padded labels pin every column to its configured width.
    let labels = ["Code", "Name", "Code", "Name"];
    table.add_row(Row::new(
        labels
            .iter()
            .zip(widths)
            .map(|(label, &w)| Cell::new(&pad(&fit(label, w), w)))
            .collect(),
    ));

    if rows.is_empty() {
        table.add_row(Row::new(vec![spanning_cell(
            "No disciplines extracted.",
            widths,
            Alignment::LEFT,
        )]));
    }

    for row in rows {
        table.add_row(Row::new(
            row.cells
                .iter()
                .map(|lines| Cell::new(&lines.join("\n")))
                .collect(),
        ));
    }

    table
}

/// A cell across `columns`, cut short so it never widens any of them.
fn spanning_cell(text: &str, columns: &[usize], align: Alignment) -> Cell {
    let narrowest = columns.iter().copied().min().unwrap_or(1);
    Cell::new_align(&fit(text, narrowest * columns.len()), align).with_hspan(columns.len())
}

/// Truncate to `width` display columns so labels never break the grid.
fn fit(text: &str, width: usize) -> String {
    let mut used = 0;
    text.chars()
        .take_while(|ch| {
            used += ch.width().unwrap_or(0);
            used <= width
        })
        .collect()
}

/// Right-pad with spaces to `width` display columns.
fn pad(text: &str, width: usize) -> String {
    let missing = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(missing))
}
