use crate::summary::{Role, SummaryOptions};
use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct OptionsError {
    pub code: String,
    pub message: String,
}

impl OptionsError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

fn bad(message: impl Into<String>) -> OptionsError {
    OptionsError::new("bad_params", message)
}

/// Applies `threshold` and `candidates.{student,pct,course}` from `raw` on top
/// of `base`. Absent or null keys keep the base value.
pub fn parse_summary_options(
    raw: &Value,
    base: SummaryOptions,
) -> Result<SummaryOptions, OptionsError> {
    let Some(obj) = raw.as_object() else {
        if raw.is_null() {
            return Ok(base);
        }
        return Err(bad("options must be an object"));
    };
    let mut out = base;

    match obj.get("threshold") {
        None => {}
        Some(v) if v.is_null() => {}
        Some(v) => {
            let Some(t) = v.as_f64().filter(|t| t.is_finite()) else {
                return Err(bad("threshold must be a finite number"));
            };
            out.threshold = t;
        }
    }

    match obj.get("candidates") {
        None => {}
        Some(v) if v.is_null() => {}
        Some(v) => {
            let Some(cands) = v.as_object() else {
                return Err(bad("candidates must be an object"));
            };
            for role in [Role::Student, Role::Pct, Role::Course] {
                if let Some(list) = parse_candidate_list(cands.get(role.as_str()), role)? {
                    set_candidates(&mut out, role, list);
                }
            }
        }
    }

    Ok(out)
}

fn parse_candidate_list(raw: Option<&Value>, role: Role) -> Result<Option<Vec<String>>, OptionsError> {
    let Some(v) = raw.filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let Some(arr) = v.as_array() else {
        return Err(bad(format!("candidates.{} must be an array of strings", role)));
    };
    let mut list = Vec::with_capacity(arr.len());
    for item in arr {
        let Some(s) = item.as_str() else {
            return Err(bad(format!("candidates.{} must be an array of strings", role)));
        };
        list.push(s.to_string());
    }
    if list.is_empty() {
        return Err(bad(format!("candidates.{} must not be empty", role)));
    }
    Ok(Some(list))
}

pub fn set_candidates(options: &mut SummaryOptions, role: Role, list: Vec<String>) {
    match role {
        Role::Student => options.student_candidates = list,
        Role::Pct => options.pct_candidates = list,
        Role::Course => options.course_candidates = list,
    }
}

/// Loads a JSON options file, e.g.
/// `{"threshold": 60, "candidates": {"student": ["Learner"]}}`.
pub fn load_options(path: &Path) -> anyhow::Result<SummaryOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let raw: Value = serde_json::from_str(&text)
        .with_context(|| format!("config {} is invalid JSON", path.display()))?;
    parse_summary_options(&raw, SummaryOptions::default())
        .with_context(|| format!("invalid config {}", path.display()))
}
