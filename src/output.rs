use crate::summary::FailingReport;
use crate::table::{format_number, Cell, Table};
use anyhow::{anyhow, Context};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tracing::info;

pub const FAILING_ROWS_SHEET: &str = "Failing_Rows";
pub const SUMMARY_SHEET: &str = "Failing_Summary";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub xlsx: PathBuf,
    pub csv: PathBuf,
}

/// The workbook always gets an `.xlsx` extension; the summary CSV sits next
/// to it as `<stem>_readable.csv`.
pub fn output_paths(out: &Path) -> OutputPaths {
    let is_xlsx = out
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    let xlsx = if is_xlsx {
        out.to_path_buf()
    } else {
        out.with_extension("xlsx")
    };
    let stem = out
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("failing_summary");
    let csv = out.with_file_name(format!("{}_readable.csv", stem));
    OutputPaths { xlsx, csv }
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn write_sheet(workbook: &mut Workbook, name: &str, table: &Table) -> anyhow::Result<()> {
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(name)
        .map_err(|e| anyhow!("failed to name sheet '{}': {}", name, e))?;

    for (col, header) in table.columns.iter().enumerate() {
        sheet
            .write_string(0, col as u16, header)
            .map_err(|e| anyhow!("failed to write header '{}' on {}: {}", header, name, e))?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let row_num = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col_num = col as u16;
            let res = match cell {
                Cell::Number(n) if n.is_finite() => sheet.write_number(row_num, col_num, *n),
                Cell::Number(n) => sheet.write_string(row_num, col_num, format_number(*n)),
                Cell::Text(s) if !s.is_empty() => sheet.write_string(row_num, col_num, s),
                _ => continue,
            };
            res.map_err(|e| anyhow!("failed to write cell ({}, {}) on {}: {}", row_num, col, name, e))?;
        }
    }
    Ok(())
}

pub fn write_workbook(report: &FailingReport, path: &Path) -> anyhow::Result<()> {
    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, FAILING_ROWS_SHEET, &report.failing_rows_table())?;
    write_sheet(&mut workbook, SUMMARY_SHEET, &report.summary_table())?;

    ensure_parent(path)?;
    workbook
        .save(path)
        .map_err(|e| anyhow!("failed to save workbook {}: {}", path.display(), e))?;
    Ok(())
}

pub fn render_csv(table: &Table) -> anyhow::Result<String> {
    let mut w = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    w.write_record(&table.columns)
        .context("failed to write csv header")?;
    for row in &table.rows {
        w.write_record(row.iter().map(Cell::to_text))
            .context("failed to write csv record")?;
    }
    let bytes = w
        .into_inner()
        .map_err(|e| anyhow!("failed to flush csv: {}", e))?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

/// Summary table only; the header is written even when nobody fails.
pub fn render_summary_csv(report: &FailingReport) -> anyhow::Result<String> {
    render_csv(&report.summary_table())
}

pub fn write_summary_csv(report: &FailingReport, path: &Path) -> anyhow::Result<()> {
    let text = render_summary_csv(report)?;
    ensure_parent(path)?;
    std::fs::write(path, text)
        .with_context(|| format!("failed to write summary csv {}", path.display()))
}

pub fn write_outputs(report: &FailingReport, out: &Path) -> anyhow::Result<OutputPaths> {
    let paths = output_paths(out);
    write_workbook(report, &paths.xlsx)?;
    write_summary_csv(report, &paths.csv)?;
    info!(
        xlsx = %paths.xlsx.display(),
        csv = %paths.csv.display(),
        failing = report.failing.len(),
        students = report.summary.rows.len(),
        "wrote outputs"
    );
    Ok(paths)
}
