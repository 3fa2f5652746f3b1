use crate::table::{Cell, Table};
use anyhow::{anyhow, bail, Context};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported file type: {extension}. Please provide CSV or Excel.")]
pub struct UnsupportedInputFormatError {
    pub extension: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    /// Comma first, tab as fallback.
    Delimited,
    Tab,
    Spreadsheet,
}

fn input_kind(path: &Path) -> Result<InputKind, UnsupportedInputFormatError> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| format!(".{}", s.to_ascii_lowercase()))
        .unwrap_or_default();
    match ext.as_str() {
        ".csv" | ".txt" => Ok(InputKind::Delimited),
        ".tsv" => Ok(InputKind::Tab),
        ".xlsx" | ".xlsm" | ".xls" | ".xlsb" | ".ods" => Ok(InputKind::Spreadsheet),
        _ => Err(UnsupportedInputFormatError { extension: ext }),
    }
}

/// Reads a grade export into a `Table`. `sheet` only applies to spreadsheets;
/// the first sheet is used when it is `None`.
pub fn read_table(path: &Path, sheet: Option<&str>) -> anyhow::Result<Table> {
    let table = match input_kind(path)? {
        InputKind::Delimited => read_delimited(path, None)?,
        InputKind::Tab => read_delimited(path, Some(b'\t'))?,
        InputKind::Spreadsheet => read_spreadsheet(path, sheet)?,
    };
    info!(
        path = %path.display(),
        columns = table.columns.len(),
        rows = table.row_count(),
        "read input table"
    );
    Ok(table)
}

/// Sheet names in workbook order. Delimited files have none.
pub fn list_sheets(path: &Path) -> anyhow::Result<Vec<String>> {
    match input_kind(path)? {
        InputKind::Spreadsheet => {
            let workbook = open_workbook_auto(path)
                .map_err(|e| anyhow!("failed to open workbook {}: {}", path.display(), e))?;
            Ok(workbook.sheet_names().to_vec())
        }
        _ => Ok(Vec::new()),
    }
}

fn read_delimited(path: &Path, delimiter: Option<u8>) -> anyhow::Result<Table> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    let raw = String::from_utf8(bytes)
        .with_context(|| format!("input file {} is not valid UTF-8", path.display()))?;
    let text: &str = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    if let Some(d) = delimiter {
        return parse_delimited(text, d, false);
    }

    let header = text.lines().next().unwrap_or("");
    if header.contains('\t') && !header.contains(',') {
        debug!(path = %path.display(), "header looks tab separated");
        return parse_delimited(text, b'\t', false);
    }
    match parse_delimited(text, b',', true) {
        Ok(t) => Ok(t),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "comma parse failed, retrying with tabs");
            parse_delimited(text, b'\t', false)
        }
    }
}

/// First record is the header. Empty fields become `Missing` and short rows
/// are padded. Rows longer than the header are an error when `strict`,
/// otherwise truncated.
pub fn parse_delimited(text: &str, delimiter: u8, strict: bool) -> anyhow::Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = rdr
        .headers()
        .context("failed to read header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut table = Table::new(columns);

    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("malformed record {}", i + 2))?;
        if strict && rec.len() > table.columns.len() {
            bail!(
                "record {} has {} fields, header has {}",
                i + 2,
                rec.len(),
                table.columns.len()
            );
        }
        table.push_row(
            rec.iter()
                .map(|f| if f.is_empty() { Cell::Missing } else { Cell::text(f) })
                .collect(),
        );
    }
    Ok(table)
}

fn read_spreadsheet(path: &Path, sheet: Option<&str>) -> anyhow::Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| anyhow!("failed to open workbook {}: {}", path.display(), e))?;
    let names: Vec<String> = workbook.sheet_names().to_vec();

    let name = match sheet {
        Some(want) => names
            .iter()
            .find(|n| n.as_str() == want)
            .cloned()
            .ok_or_else(|| anyhow!("sheet '{}' not found; available sheets: {:?}", want, names))?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("workbook {} contains no sheets", path.display()))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| anyhow!("failed to read sheet '{}': {}", name, e))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };
    let columns = header
        .iter()
        .enumerate()
        .map(|(i, c)| match spreadsheet_cell(c) {
            Cell::Missing => format!("Unnamed: {}", i),
            other => other.to_text(),
        })
        .collect();

    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.iter().map(spreadsheet_cell).collect());
    }
    debug!(sheet = %name, "read worksheet");
    Ok(table)
}

fn spreadsheet_cell(d: &Data) -> Cell {
    match d {
        Data::Empty | Data::Error(_) => Cell::Missing,
        Data::String(s) if s.is_empty() => Cell::Missing,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.as_str()),
    }
}
