//! # Reflection Export
//!
//! Renders a stored reflection as a downloadable document.
//!
//! Both formats share one mapping: eight ordered label/value pairs
//! (`summary_fields`). Only the layout differs.
//!
//! - **xlsx**: one sheet, labels in column A, values in column B.
//! - **pdf**: one US Letter page of text. A bold title, then each label on
//!   its own line followed by the value's lines indented by two spaces and
//!   a blank separator line. No pagination: long records run off the page.
//!   Text goes through the builtin fonts' WinAnsi encoding, so Latin-1
//!   letters and typographic quotes and dashes print as written.
//!
//! Unknown format names fall back to PDF.

use crate::{DirectionError, Reflection, ReflectionId};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use rust_xlsxwriter::Workbook;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Document title, also used as the worksheet name.
pub const DOCUMENT_TITLE: &str = "Direction Summary";

/// Filename stem of exported files.
pub const FILENAME_PREFIX: &str = "direction-summary";

/// Labels in output order.
pub const FIELD_LABELS: [&str; 8] = [
    "Feeling",
    "Area",
    "Challenge",
    "Desired Outcome",
    "Action Timeline",
    "Distilled",
    "Guidance",
    "Message",
];

// US Letter, one-inch margin.
const PAGE_WIDTH_MM: f32 = 215.9;
const PAGE_HEIGHT_MM: f32 = 279.4;
const MARGIN_MM: f32 = 25.4;
const TEXT_TOP_MM: f32 = 254.0;

const TITLE_FONT_SIZE: f32 = 16.0;
const BODY_FONT_SIZE: f32 = 11.0;
// Leading is 1.2x the font size.
const TITLE_LEADING: f32 = 19.2;
const BODY_LEADING: f32 = 13.2;

// =============================================================================
// FORMAT SELECTION
// =============================================================================

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Pdf,
    Xlsx,
}

impl ExportFormat {
    /// Lenient parse of a `format` query value.
    ///
    /// `xlsx` in any case selects the spreadsheet; anything else is PDF.
    #[must_use]
    pub fn from_query(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("xlsx") {
            Self::Xlsx
        } else {
            Self::Pdf
        }
    }

    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
        }
    }

    /// MIME type of the rendered bytes.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

// =============================================================================
// EXPORTED FILE
// =============================================================================

/// A rendered document ready to stream.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

/// Suggested download name for a record in a format.
#[must_use]
pub fn export_filename(id: &ReflectionId, format: ExportFormat) -> String {
    format!("{}-{}.{}", FILENAME_PREFIX, id, format.extension())
}

// =============================================================================
// FIELD MAPPING
// =============================================================================

/// The eight label/value pairs shown in every export, in order.
///
/// Guidance becomes one block: each item on its own line prefixed by
/// `"- "`, with a leading line break before every item.
#[must_use]
pub fn summary_fields(record: &Reflection) -> Vec<(&'static str, String)> {
    let guidance: String = record
        .guidance
        .iter()
        .map(|item| format!("\n- {}", item))
        .collect();

    let values = [
        record.feeling.clone(),
        record.area.clone(),
        record.challenge.clone(),
        record.desired_outcome.clone(),
        record.action_timeline.clone(),
        record.distilled.clone(),
        guidance,
        record.message.clone(),
    ];

    FIELD_LABELS.into_iter().zip(values).collect()
}

// =============================================================================
// RENDERING
// =============================================================================

/// Render `record` in `format`.
pub fn export_reflection(
    id: &ReflectionId,
    record: &Reflection,
    format: ExportFormat,
) -> Result<ExportedFile, DirectionError> {
    let fields = summary_fields(record);
    let bytes = match format {
        ExportFormat::Pdf => render_pdf(&fields)?,
        ExportFormat::Xlsx => render_xlsx(&fields)?,
    };

    Ok(ExportedFile {
        bytes,
        content_type: format.content_type(),
        filename: export_filename(id, format),
    })
}

/// Lines of the PDF text block, after the title.
///
/// A blank line, then per field: `"{label}:"`, each value line indented
/// by two spaces, and a blank separator.
#[must_use]
pub fn pdf_body_lines(fields: &[(&'static str, String)]) -> Vec<String> {
    let mut lines = vec![String::new()];
    for (label, value) in fields {
        lines.push(format!("{}:", label));
        for line in value.split('\n') {
            lines.push(format!("  {}", line));
        }
        lines.push(String::new());
    }
    lines
}

/// Characters at 0x80..=0x9F in WinAnsiEncoding (CP1252).
const WIN_ANSI_HIGH: [char; 27] = [
    '\u{20AC}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{017D}', '\u{2018}',
    '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}',
    '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{017E}', '\u{0178}',
];

/// True when the builtin fonts' WinAnsiEncoding has a glyph slot for `c`.
#[must_use]
pub fn is_win_ansi(c: char) -> bool {
    matches!(c, '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}') || WIN_ANSI_HIGH.contains(&c)
}

/// Map text onto what the builtin Helvetica font can show.
///
/// WinAnsi characters pass through unchanged. Near misses (other dashes,
/// primes, spacing variants) fold to their closest WinAnsi form and
/// everything else becomes '?'.
#[must_use]
pub fn to_builtin_font_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            c if is_win_ansi(c) => c,
            '\u{201B}' | '\u{2032}' => '\'',
            '\u{201F}' | '\u{2033}' => '"',
            '\u{2010}'..='\u{2012}' | '\u{2212}' => '-',
            '\u{2015}' => '\u{2014}',
            '\u{2000}'..='\u{200A}' | '\u{202F}' => ' ',
            _ => '?',
        })
        .collect()
}

fn render_pdf(fields: &[(&'static str, String)]) -> Result<Vec<u8>, DirectionError> {
    let (doc, page, layer) = PdfDocument::new(
        DOCUMENT_TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| DirectionError::Export(format!("PDF font: {}", e)))?;
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| DirectionError::Export(format!("PDF font: {}", e)))?;

    let canvas = doc.get_page(page).get_layer(layer);
    canvas.begin_text_section();
    canvas.set_text_cursor(Mm(MARGIN_MM), Mm(TEXT_TOP_MM));

    canvas.set_font(&bold, TITLE_FONT_SIZE);
    canvas.set_line_height(TITLE_LEADING);
    canvas.write_text(DOCUMENT_TITLE, &bold);
    canvas.add_line_break();

    canvas.set_font(&regular, BODY_FONT_SIZE);
    canvas.set_line_height(BODY_LEADING);
    for line in pdf_body_lines(fields) {
        canvas.write_text(to_builtin_font_text(&line), &regular);
        canvas.add_line_break();
    }
    canvas.end_text_section();

    doc.save_to_bytes()
        .map_err(|e| DirectionError::Export(format!("PDF save: {}", e)))
}

fn render_xlsx(fields: &[(&'static str, String)]) -> Result<Vec<u8>, DirectionError> {
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| DirectionError::Export(format!("XLSX: {}", e));

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(DOCUMENT_TITLE).map_err(xlsx_err)?;
        for (row, (label, value)) in (0u32..).zip(fields) {
            sheet.write_string(row, 0, *label).map_err(xlsx_err)?;
            sheet.write_string(row, 1, value.as_str()).map_err(xlsx_err)?;
        }
    }
    workbook.save_to_buffer().map_err(xlsx_err)
}

// =============================================================================
// TESTS
// =============================================================================
