//! Header-aware rendering of tabular content (XLSX workbooks and CSV files).
//!
//! Every data row is flattened into a single line where each value is prefixed by the header of
//! its column, so that downstream text consumers can still tell columns apart:
//!
//! ```text
//! (Name: Alice,	Age: 30)
//! (Name: Bob,	Age: )
//! ```
//!
//! The first row of a table is always the header row. Headers are matched to cells by position
//! only; duplicate header names are kept as they are.

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use std::fmt;
use std::io::Cursor;

use super::ExtractError;

/// Separator placed between the `header: value` segments of one row.
const SEGMENT_SEPARATOR: &str = ",\t";

/// A single cell as read from the source. `None` means the cell is absent.
pub type Cell = Option<String>;

/// One data row aligned to the header row.
///
/// Holds exactly one `(header, value)` pair per header column. Cells missing at the end of a short
/// row are `None`, cells beyond the last header are dropped. Empty cells are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularRow<'a> {
    pairs: Vec<(&'a str, Option<&'a str>)>,
}

impl<'a> TabularRow<'a> {
    pub fn align(headers: &'a [Cell], row: &'a [Cell]) -> Self {
        let pairs = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = row.get(i).and_then(|cell| cell.as_deref()).filter(|value| !value.is_empty());
                (header.as_deref().unwrap_or_default(), value)
            })
            .collect();
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(&'a str, Option<&'a str>)] {
        &self.pairs
    }
}

impl fmt::Display for TabularRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, (header, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(SEGMENT_SEPARATOR)?;
            }
            write!(f, "{}: {}", header, value.unwrap_or_default())?;
        }
        f.write_str(")")
    }
}

/// Render a table whose first row holds the headers.
///
/// Returns an empty string when there are no rows, or only a header row.
pub fn render_table(rows: &[Vec<Cell>]) -> String {
    let Some((headers, data)) = rows.split_first() else {
        return String::new();
    };

    data.iter()
        .map(|row| TabularRow::align(headers, row).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract every worksheet of an XLSX workbook, in workbook order.
///
/// Each sheet uses its own first row as headers. Sheets that render to nothing (no rows, or a
/// header row only) are skipped entirely rather than contributing an empty line. Formula cells are
/// read as their last cached value; nothing is re-evaluated.
pub fn extract_xlsx(content: &[u8]) -> Result<String, ExtractError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(content))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let mut rows: Vec<Vec<Cell>> = range.rows().map(|row| row.iter().map(cell_text).collect()).collect();
        if let Some(headers) = rows.first_mut() {
            trim_absent_headers(headers);
        }

        let text = render_table(&rows);
        tracing::debug!(sheet = %name, rows = rows.len(), "Rendered worksheet");
        if !text.is_empty() {
            sheets.push(text);
        }
    }

    Ok(sheets.join("\n"))
}

/// Extract a CSV file. The content must be valid UTF-8.
///
/// Rows may have differing lengths; short rows render their missing cells blank. A blank line is
/// an empty row and renders with every value blank.
pub fn extract_csv(content: &[u8]) -> Result<String, ExtractError> {
    let text = std::str::from_utf8(content)?;

    let rows = csv_records(text)
        .into_iter()
        .map(parse_csv_record)
        .collect::<Result<Vec<Vec<Cell>>, csv::Error>>()?;

    Ok(render_table(&rows))
}

/// Split CSV text into one slice per record, without the line terminator.
///
/// A line break inside a quoted field does not end the record. The `csv` reader drops blank lines
/// on its own, so records are cut here and parsed one at a time.
fn csv_records(text: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut quoted = false;

    for (i, byte) in text.bytes().enumerate() {
        match byte {
            b'"' => quoted = !quoted,
            b'\n' if !quoted => {
                records.push(text[start..i].trim_end_matches('\r'));
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < text.len() {
        records.push(text[start..].trim_end_matches('\r'));
    }

    records
}

fn parse_csv_record(record: &str) -> Result<Vec<Cell>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(record.as_bytes());

    match reader.records().next() {
        Some(fields) => Ok(fields?.iter().map(|field| Some(field.to_string())).collect()),
        None => Ok(Vec::new()),
    }
}

/// Drop trailing header cells that are absent.
///
/// A worksheet range is rectangular, so one wide data row gives the header row empty cells on the
/// right. Those columns have no header and their values are dropped, the same as cells beyond the
/// header row of a CSV file.
fn trim_absent_headers(headers: &mut Vec<Cell>) {
    let width = headers.iter().rposition(Option::is_some).map_or(0, |last| last + 1);
    headers.truncate(width);
}

/// Display form of a spreadsheet cell.
fn cell_text(cell: &Data) -> Cell {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::Error(e) => e.to_string(),
    };
    Some(text)
}
