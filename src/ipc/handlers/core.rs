use crate::ipc::error::ok;
use crate::ipc::types::Request;
use crate::output::{FAILING_ROWS_SHEET, SUMMARY_SHEET};
use crate::summary::SummaryOptions;
use serde_json::json;

fn handle_health(req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "defaults": SummaryOptions::default(),
            "sheets": [FAILING_ROWS_SHEET, SUMMARY_SHEET],
        }),
    )
}

pub fn try_handle(req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(req)),
        _ => None,
    }
}
