use std::path::Path;

use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tempfile::NamedTempFile;
use tracing::info;

use super::colors::{KitColorMap, Rgb};
use crate::model::{REPORT_COLUMNS, Record};
use crate::util::ensure_directory;

const ELLIPSIS: &str = "...";

/// Page geometry in PDF points. The default is US letter with half-inch margins.
#[derive(Debug, Clone, Copy)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub font_size: f32,
    pub title_size: f32,
    pub row_height: f32,
    pub cell_padding: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margin: 36.0,
            font_size: 9.0,
            title_size: 13.0,
            row_height: 15.0,
            cell_padding: 4.0,
        }
    }
}

impl PageLayout {
    fn usable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    fn title_block(&self) -> f32 {
        self.title_size * 2.0
    }

    /// Data rows that fit below the header row, at least one.
    pub(crate) fn rows_per_page(&self, with_title: bool) -> usize {
        let mut available = self.height - 2.0 * self.margin - self.row_height;
        if with_title {
            available -= self.title_block();
        }
        ((available / self.row_height).floor() as usize).max(1)
    }
}

struct TableRow<'a> {
    cells: [&'a str; 5],
    background: Rgb,
    text_color: Rgb,
}

/// Renders the merged table as a paginated PDF at `output`.
///
/// The header row is repeated on every page and each data row is filled with its kit's
/// color. The document is written to a temporary file beside `output` and moved into
/// place only once complete.
pub fn render_report(
    rows: &[Record],
    colors: &KitColorMap,
    title: Option<&str>,
    output: &Path,
    layout: &PageLayout,
) -> Result<usize> {
    let mut document = build_document(rows, colors, title, layout)?;
    let page_count = document.get_pages().len();

    let parent = output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_directory(parent)?;

    let mut staged = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to stage report in {}", parent.display()))?;
    document
        .save_to(&mut staged)
        .with_context(|| format!("failed to write report for {}", output.display()))?;
    staged
        .persist(output)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to move report into {}", output.display()))?;

    info!(path = %output.display(), rows = rows.len(), pages = page_count, "rendered report");
    Ok(page_count)
}

fn build_document(
    rows: &[Record],
    colors: &KitColorMap,
    title: Option<&str>,
    layout: &PageLayout,
) -> Result<Document> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();

    let regular_font = document.add_object(font_dictionary("Helvetica"));
    let bold_font = document.add_object(font_dictionary("Helvetica-Bold"));
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_font,
            "F2" => bold_font,
        },
    });

    let widths = column_widths(rows, layout);
    let header = TableRow {
        cells: REPORT_COLUMNS,
        background: Rgb::GREY,
        text_color: Rgb::WHITESMOKE,
    };

    let first_page_rows = layout.rows_per_page(title.is_some());
    let other_page_rows = layout.rows_per_page(false);

    let mut page_slices = Vec::<&[Record]>::new();
    let (first, mut rest) = rows.split_at(first_page_rows.min(rows.len()));
    page_slices.push(first);
    while !rest.is_empty() {
        let (page, tail) = rest.split_at(other_page_rows.min(rest.len()));
        page_slices.push(page);
        rest = tail;
    }

    let mut kids = Vec::<Object>::with_capacity(page_slices.len());
    for (page_index, page_rows) in page_slices.into_iter().enumerate() {
        let mut operations = Vec::<Operation>::new();
        let mut top = layout.height - layout.margin;

        if let (0, Some(title)) = (page_index, title) {
            push_text(
                &mut operations,
                "F2",
                layout.title_size,
                Rgb::BLACK,
                layout.margin,
                top - layout.title_size,
                title,
            );
            top -= layout.title_block();
        }

        push_row(&mut operations, &header, "F2", &widths, top, layout);
        top -= layout.row_height;

        for record in page_rows {
            let row = TableRow {
                cells: record.cells(),
                background: colors.color_for(&record.kit),
                text_color: Rgb::BLACK,
            };
            push_row(&mut operations, &row, "F1", &widths, top, layout);
            top -= layout.row_height;
        }

        let content = Content { operations };
        let encoded = content
            .encode()
            .with_context(|| format!("failed to encode content of page {}", page_index + 1))?;
        let content_id = document.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(layout.width),
            Object::Real(layout.height),
        ],
    };
    document
        .objects
        .insert(pages_id, Object::Dictionary(pages));

    let catalog_id: ObjectId = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.compress();

    Ok(document)
}

fn font_dictionary(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn push_row(
    operations: &mut Vec<Operation>,
    row: &TableRow<'_>,
    font: &str,
    widths: &[f32; 5],
    top: f32,
    layout: &PageLayout,
) {
    let bottom = top - layout.row_height;
    let table_width = widths.iter().sum::<f32>();
    let left = table_left(widths, layout);

    operations.push(color_operation("rg", row.background));
    operations.push(Operation::new(
        "re",
        vec![
            Object::Real(left),
            Object::Real(bottom),
            Object::Real(table_width),
            Object::Real(layout.row_height),
        ],
    ));
    operations.push(Operation::new("f", vec![]));

    let mut x = left;
    for (cell, width) in row.cells.iter().zip(widths) {
        operations.push(color_operation("RG", Rgb::BLACK));
        operations.push(Operation::new("w", vec![Object::Real(0.5)]));
        operations.push(Operation::new(
            "re",
            vec![
                Object::Real(x),
                Object::Real(bottom),
                Object::Real(*width),
                Object::Real(layout.row_height),
            ],
        ));
        operations.push(Operation::new("S", vec![]));

        let fitted = fit_text(cell, width - 2.0 * layout.cell_padding, layout.font_size);
        let baseline = bottom + (layout.row_height - layout.font_size) / 2.0 + 1.5;
        push_text(
            operations,
            font,
            layout.font_size,
            row.text_color,
            x + layout.cell_padding,
            baseline,
            &fitted,
        );
        x += width;
    }
}

fn push_text(
    operations: &mut Vec<Operation>,
    font: &str,
    size: f32,
    color: Rgb,
    x: f32,
    y: f32,
    text: &str,
) {
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), Object::Real(size)],
    ));
    operations.push(color_operation("rg", color));
    operations.push(Operation::new(
        "Td",
        vec![Object::Real(x), Object::Real(y)],
    ));
    operations.push(Operation::new(
        "Tj",
        vec![Object::string_literal(encode_win_ansi(text))],
    ));
    operations.push(Operation::new("ET", vec![]));
}

fn color_operation(operator: &str, color: Rgb) -> Operation {
    let [r, g, b] = color.unit_components();
    Operation::new(
        operator,
        vec![Object::Real(r), Object::Real(g), Object::Real(b)],
    )
}

/// Horizontally centered, like the table flowable of common report toolkits.
fn table_left(widths: &[f32; 5], layout: &PageLayout) -> f32 {
    let table_width = widths.iter().sum::<f32>();
    layout.margin + ((layout.usable_width() - table_width) / 2.0).max(0.0)
}

/// Natural column widths from the widest cell, scaled down to the usable page width.
pub fn column_widths(rows: &[Record], layout: &PageLayout) -> [f32; 5] {
    let padding = 2.0 * layout.cell_padding;
    let mut widths = REPORT_COLUMNS.map(|label| text_width(label, layout.font_size) + padding);

    for record in rows {
        for (width, cell) in widths.iter_mut().zip(record.cells()) {
            *width = width.max(text_width(cell, layout.font_size) + padding);
        }
    }

    let total = widths.iter().sum::<f32>();
    if total > layout.usable_width() {
        let scale = layout.usable_width() / total;
        for width in &mut widths {
            *width *= scale;
        }
    }

    widths
}

/// Approximate Helvetica advance width, in points.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(glyph_width).sum::<f32>() * font_size / 1000.0
}

fn glyph_width(character: char) -> f32 {
    match character {
        ' ' | '.' | ',' | ':' | ';' | '!' | '|' | '\'' => 278.0,
        'i' | 'j' | 'l' => 222.0,
        'f' | 't' | 'I' | '/' | '-' | '(' | ')' | '[' | ']' => 300.0,
        'm' | 'M' => 833.0,
        'w' | 'W' => 778.0,
        '0'..='9' => 556.0,
        'A'..='Z' => 667.0,
        _ => 556.0,
    }
}

/// Cuts `text` so it fits `max_width`, marking the cut with an ellipsis.
pub fn fit_text(text: &str, max_width: f32, font_size: f32) -> String {
    if text_width(text, font_size) <= max_width {
        return text.to_string();
    }

    let budget = max_width - text_width(ELLIPSIS, font_size);
    let mut used = 0.0;
    let mut fitted = String::new();
    for character in text.chars() {
        let advance = glyph_width(character) * font_size / 1000.0;
        if used + advance > budget {
            break;
        }
        used += advance;
        fitted.push(character);
    }
    fitted.push_str(ELLIPSIS);
    fitted
}

/// Maps text onto the WinAnsi code page of the standard Type 1 fonts.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|character| match character {
            '€' => 0x80,
            '…' => 0x85,
            'Œ' => 0x8c,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '–' => 0x96,
            '—' => 0x97,
            'œ' => 0x9c,
            _ => match u32::from(character) {
                code @ (0x20..=0x7e | 0xa0..=0xff) => code as u8,
                _ => b'?',
            },
        })
        .collect()
}
