use crate::config;
use crate::input;
use crate::ipc::error::{err, err_from_anyhow, ok};
use crate::ipc::types::Request;
use crate::summary::{self, SummaryOptions};
use crate::table::Table;
use serde_json::{json, Value};
use std::path::PathBuf;

pub(super) fn required_str(req: &Request, key: &str) -> Result<String, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing params.{}", key), None))
}

fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

pub(super) fn load_table(req: &Request) -> Result<Table, Value> {
    let in_path = PathBuf::from(required_str(req, "inPath")?);
    let sheet = optional_str(req, "sheet");
    input::read_table(&in_path, sheet.as_deref()).map_err(|e| err_from_anyhow(&req.id, "read_failed", &e))
}

pub(super) fn parse_options(req: &Request) -> Result<SummaryOptions, Value> {
    config::parse_summary_options(&req.params, SummaryOptions::default())
        .map_err(|e| err(&req.id, &e.code, e.message, None))
}

fn handle_sheets(req: &Request) -> Value {
    let in_path = match required_str(req, "inPath") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };
    match input::list_sheets(&in_path) {
        Ok(sheets) => ok(&req.id, json!({ "sheets": sheets })),
        Err(e) => err_from_anyhow(&req.id, "read_failed", &e),
    }
}

fn handle_columns(req: &Request) -> Value {
    let options = match parse_options(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let table = match load_table(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let roles = summary::inspect_columns(&table, &options);
    ok(
        &req.id,
        json!({
            "columns": table.columns,
            "rowCount": table.row_count(),
            "roles": roles,
        }),
    )
}

pub fn try_handle(req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "input.sheets" => Some(handle_sheets(req)),
        "input.columns" => Some(handle_columns(req)),
        _ => None,
    }
}
