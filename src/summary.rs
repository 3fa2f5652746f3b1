use crate::table::{Cell, Table};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

pub const DEFAULT_THRESHOLD: f64 = 65.0;
pub const DEFAULT_STUDENT_CANDIDATES: [&str; 3] = ["Student", "Name", "Student Name"];
pub const DEFAULT_PCT_CANDIDATES: [&str; 4] = ["Pct", "PCT", "Percentage", "Percent"];
pub const DEFAULT_COURSE_CANDIDATES: [&str; 3] = ["Course", "Course Name", "Class"];

pub const FAILING_ROWS_COLUMNS: [&str; 3] = ["Student", "Course", "Pct"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Student,
    Pct,
    Course,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Pct => "pct",
            Role::Course => "course",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOptions {
    pub threshold: f64,
    pub student_candidates: Vec<String>,
    pub pct_candidates: Vec<String>,
    pub course_candidates: Vec<String>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            student_candidates: owned(&DEFAULT_STUDENT_CANDIDATES),
            pct_candidates: owned(&DEFAULT_PCT_CANDIDATES),
            course_candidates: owned(&DEFAULT_COURSE_CANDIDATES),
        }
    }
}

impl SummaryOptions {
    pub fn candidates(&self, role: Role) -> &[String] {
        match role {
            Role::Student => &self.student_candidates,
            Role::Pct => &self.pct_candidates,
            Role::Course => &self.course_candidates,
        }
    }
}

fn owned(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Could not find any of the expected {role} columns: {candidates:?}. Found columns: {found:?}")]
pub struct ColumnNotFoundError {
    pub role: Role,
    pub candidates: Vec<String>,
    pub found: Vec<String>,
}

/// Returns the real name of the first candidate present in `columns`,
/// compared case-insensitively. When several columns fold to the same
/// candidate, the leftmost one is returned.
pub fn find_first_present(columns: &[String], candidates: &[String]) -> Option<String> {
    let folded: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();
    candidates.iter().find_map(|cand| {
        let want = cand.to_lowercase();
        folded
            .iter()
            .position(|c| *c == want)
            .map(|idx| columns[idx].clone())
    })
}

pub fn resolve_column(
    table: &Table,
    role: Role,
    candidates: &[String],
) -> Result<String, ColumnNotFoundError> {
    find_first_present(&table.columns, candidates).ok_or_else(|| ColumnNotFoundError {
        role,
        candidates: candidates.to_vec(),
        found: table.columns.clone(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedColumns {
    pub student: String,
    pub pct: String,
    pub course: String,
}

/// Resolves Student, then Pct, then Course; the first role that cannot be
/// found is the one reported.
pub fn resolve_columns(
    table: &Table,
    options: &SummaryOptions,
) -> Result<ResolvedColumns, ColumnNotFoundError> {
    let student = resolve_column(table, Role::Student, options.candidates(Role::Student))?;
    let pct = resolve_column(table, Role::Pct, options.candidates(Role::Pct))?;
    let course = resolve_column(table, Role::Course, options.candidates(Role::Course))?;
    Ok(ResolvedColumns {
        student,
        pct,
        course,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInspection {
    pub student: Option<String>,
    pub pct: Option<String>,
    pub course: Option<String>,
}

/// Non-failing variant of `resolve_columns` for diagnostics.
pub fn inspect_columns(table: &Table, options: &SummaryOptions) -> ColumnInspection {
    let find = |role| find_first_present(&table.columns, options.candidates(role));
    ColumnInspection {
        student: find(Role::Student),
        pct: find(Role::Pct),
        course: find(Role::Course),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pct {
    Numeric(f64),
    Missing,
}

impl Pct {
    pub fn value(self) -> Option<f64> {
        match self {
            Pct::Numeric(v) => Some(v),
            Pct::Missing => None,
        }
    }
}

/// Accepts `72`, `72.5`, `"72"`, `"72%"`, `" 72 % "`. Anything else is Missing.
pub fn coerce_percentage(cell: &Cell) -> Pct {
    match cell {
        Cell::Missing => Pct::Missing,
        Cell::Number(n) => Pct::Numeric(*n),
        Cell::Text(s) => {
            let mut t = s.trim();
            if let Some(stripped) = t.strip_suffix('%') {
                t = stripped.trim_end();
            }
            match t.parse::<f64>() {
                Ok(v) => Pct::Numeric(v),
                Err(_) => Pct::Missing,
            }
        }
    }
}

pub fn coerce_column(table: &Table, column: &str) -> Vec<Pct> {
    match table.column_index(column) {
        Some(idx) => table.column_cells(idx).map(coerce_percentage).collect(),
        None => vec![Pct::Missing; table.row_count()],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailingRecord {
    /// `None` when the student cell was blank. Such rows are listed but
    /// never summarized.
    pub student: Option<String>,
    pub course: String,
    pub pct: f64,
}

/// Named students ascending, blank students last.
fn cmp_students(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_records(a: &FailingRecord, b: &FailingRecord) -> Ordering {
    cmp_students(&a.student, &b.student)
        .then_with(|| a.course.cmp(&b.course))
        .then_with(|| a.pct.total_cmp(&b.pct))
}

/// Rows whose percentage is present and strictly below `threshold`,
/// projected to (Student, Course, Pct) and sorted by all three.
pub fn failing_records(table: &Table, cols: &ResolvedColumns, threshold: f64) -> Vec<FailingRecord> {
    let (Some(si), Some(ci)) = (
        table.column_index(&cols.student),
        table.column_index(&cols.course),
    ) else {
        return Vec::new();
    };
    let pcts = coerce_column(table, &cols.pct);

    let mut out: Vec<FailingRecord> = table
        .rows
        .iter()
        .zip(pcts)
        .filter_map(|(row, pct)| {
            let v = pct.value()?;
            if v.is_nan() || v >= threshold {
                return None;
            }
            Some(FailingRecord {
                student: match row.get(si) {
                    None | Some(Cell::Missing) => None,
                    Some(cell) => Some(cell.to_text()),
                },
                course: row.get(ci).map(Cell::to_text).unwrap_or_default(),
                pct: v,
            })
        })
        .collect();
    out.sort_by(cmp_records);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummaryRow {
    pub student: String,
    pub total: usize,
    /// Exactly `Summary::width` slots; trailing slots are empty strings.
    pub courses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub width: usize,
    pub rows: Vec<StudentSummaryRow>,
}

/// Groups failing records by student into one wide row each. Course order
/// within a student follows the input order. Records without a student are
/// left out.
pub fn pivot_summary(records: &[FailingRecord]) -> Summary {
    let mut by_student: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for r in records {
        let Some(student) = r.student.as_deref() else {
            continue;
        };
        by_student.entry(student).or_default().push(r.course.as_str());
    }

    let width = by_student.values().map(Vec::len).max().unwrap_or(0);
    let mut rows: Vec<StudentSummaryRow> = by_student
        .into_iter()
        .map(|(student, courses)| {
            let total = courses.len();
            let mut padded: Vec<String> = courses.into_iter().map(str::to_string).collect();
            padded.resize(width, String::new());
            StudentSummaryRow {
                student: student.to_string(),
                total,
                courses: padded,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.student.cmp(&b.student)));

    Summary { width, rows }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailingReport {
    pub threshold: f64,
    pub columns: ResolvedColumns,
    pub failing: Vec<FailingRecord>,
    pub summary: Summary,
}

impl FailingReport {
    pub fn failing_rows_table(&self) -> Table {
        let mut t = Table::new(owned(&FAILING_ROWS_COLUMNS));
        for r in &self.failing {
            t.push_row(vec![
                r.student.as_deref().map_or(Cell::Missing, Cell::text),
                Cell::text(r.course.as_str()),
                Cell::Number(r.pct),
            ]);
        }
        t
    }

    /// `Student, Total, Course 1 .. Course N`.
    pub fn summary_columns(&self) -> Vec<String> {
        let mut columns = vec!["Student".to_string(), "Total".to_string()];
        columns.extend((1..=self.summary.width).map(|i| format!("Course {}", i)));
        columns
    }

    pub fn summary_table(&self) -> Table {
        let mut t = Table::new(self.summary_columns());
        for r in &self.summary.rows {
            let mut row = vec![Cell::text(r.student.as_str()), Cell::Number(r.total as f64)];
            row.extend(r.courses.iter().map(|c| Cell::text(c.as_str())));
            t.push_row(row);
        }
        t
    }
}

pub fn summarize_failing(
    table: &Table,
    options: &SummaryOptions,
) -> Result<FailingReport, ColumnNotFoundError> {
    let columns = resolve_columns(table, options)?;
    let failing = failing_records(table, &columns, options.threshold);
    let summary = pivot_summary(&failing);
    debug!(
        rows = table.row_count(),
        failing = failing.len(),
        students = summary.rows.len(),
        width = summary.width,
        "summarized failing rows"
    );
    Ok(FailingReport {
        threshold: options.threshold,
        columns,
        failing,
        summary,
    })
}
