use crate::config::OptionsError;
use crate::input::UnsupportedInputFormatError;
use crate::summary::ColumnNotFoundError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Maps typed errors anywhere in the chain to their protocol codes;
/// everything else is reported under `fallback_code`.
pub fn err_from_anyhow(id: &str, fallback_code: &str, e: &anyhow::Error) -> serde_json::Value {
    if let Some(c) = e.downcast_ref::<ColumnNotFoundError>() {
        return err(
            id,
            "column_not_found",
            c.to_string(),
            Some(json!({
                "role": c.role,
                "candidates": c.candidates,
                "found": c.found,
            })),
        );
    }
    if let Some(u) = e.downcast_ref::<UnsupportedInputFormatError>() {
        return err(
            id,
            "unsupported_format",
            u.to_string(),
            Some(json!({ "extension": u.extension })),
        );
    }
    if let Some(o) = e.downcast_ref::<OptionsError>() {
        return err(id, &o.code, o.message.clone(), None);
    }
    err(id, fallback_code, format!("{e:#}"), None)
}
