use crate::ipc::error::{err_from_anyhow, ok};
use crate::ipc::types::Request;
use crate::output;
use crate::summary::{self, FailingReport, FAILING_ROWS_COLUMNS};
use crate::table::format_number;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

use super::input::{load_table, parse_options, required_str};

fn build_report(req: &Request) -> Result<FailingReport, Value> {
    let options = parse_options(req)?;
    let table = load_table(req)?;
    summary::summarize_failing(&table, &options)
        .map_err(|e| err_from_anyhow(&req.id, "column_not_found", &anyhow::Error::new(e)))
}

/// JSON has no infinities, so those go out as text (`"-inf"`).
fn pct_json(v: f64) -> Value {
    if v.is_finite() {
        json!(v)
    } else {
        json!(format_number(v))
    }
}

fn failing_rows_json(report: &FailingReport) -> Value {
    let rows: Vec<Value> = report
        .failing
        .iter()
        .map(|r| json!([r.student, r.course, pct_json(r.pct)]))
        .collect();
    json!({
        "columns": FAILING_ROWS_COLUMNS,
        "rows": rows,
    })
}

fn summary_json(report: &FailingReport) -> Value {
    let rows: Vec<Value> = report
        .summary
        .rows
        .iter()
        .map(|r| {
            let mut row = vec![json!(r.student), json!(r.total)];
            row.extend(r.courses.iter().map(|c| json!(c)));
            Value::Array(row)
        })
        .collect();
    json!({
        "columns": report.summary_columns(),
        "rows": rows,
    })
}

fn handle_preview(req: &Request) -> Value {
    let report = match build_report(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({
            "threshold": report.threshold,
            "columns": report.columns,
            "maxCourses": report.summary.width,
            "failingRows": failing_rows_json(&report),
            "summary": summary_json(&report),
        }),
    )
}

fn handle_render_csv(req: &Request) -> Value {
    let report = match build_report(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match output::render_summary_csv(&report) {
        Ok(csv) => ok(&req.id, json!({ "csv": csv })),
        Err(e) => err_from_anyhow(&req.id, "write_failed", &e),
    }
}

fn handle_export(req: &Request) -> Value {
    let out_path = match required_str(req, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };
    let report = match build_report(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let paths = match output::write_outputs(&report, &out_path) {
        Ok(v) => v,
        Err(e) => return err_from_anyhow(&req.id, "write_failed", &e),
    };
    info!(id = %req.id, xlsx = %paths.xlsx.display(), "export complete");
    ok(
        &req.id,
        json!({
            "xlsxPath": paths.xlsx.to_string_lossy(),
            "csvPath": paths.csv.to_string_lossy(),
            "failingRowCount": report.failing.len(),
            "studentCount": report.summary.rows.len(),
        }),
    )
}

pub fn try_handle(req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "failing.preview" => Some(handle_preview(req)),
        "failing.renderCsv" => Some(handle_render_csv(req)),
        "failing.export" => Some(handle_export(req)),
        _ => None,
    }
}
