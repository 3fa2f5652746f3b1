#[path = "../src/summary.rs"]
mod summary;
#[path = "../src/table.rs"]
mod table;

use summary::{
    coerce_percentage, failing_records, pivot_summary, resolve_column, resolve_columns,
    summarize_failing, ColumnNotFoundError, Pct, Role, SummaryOptions,
};
use table::{Cell, Table};

fn grades(headers: &[&str], rows: &[(&str, &str, Cell)]) -> Table {
    let mut t = Table::new(headers.iter().map(|h| h.to_string()).collect());
    for (student, course, pct) in rows {
        t.push_row(vec![Cell::text(*student), Cell::text(*course), pct.clone()]);
    }
    t
}

fn n(v: f64) -> Cell {
    Cell::Number(v)
}

fn s(v: &str) -> Cell {
    Cell::text(v)
}

#[test]
fn resolver_finds_candidates_in_any_case() {
    let t = grades(&["name", "COURSE", "pct"], &[]);
    let cols = resolve_columns(&t, &SummaryOptions::default()).expect("resolve");
    assert_eq!(cols.student, "name");
    assert_eq!(cols.course, "COURSE");
    assert_eq!(cols.pct, "pct");

    let t = grades(&["STUDENT NAME", "class", "Percentage"], &[]);
    let cols = resolve_columns(&t, &SummaryOptions::default()).expect("resolve synonyms");
    assert_eq!(cols.student, "STUDENT NAME");
    assert_eq!(cols.course, "class");
    assert_eq!(cols.pct, "Percentage");
}

#[test]
fn resolver_prefers_earlier_candidates() {
    let t = grades(&["Student Name", "Course", "Student"], &[]);
    let got = resolve_column(
        &t,
        Role::Student,
        &SummaryOptions::default().student_candidates,
    )
    .expect("resolve");
    assert_eq!(got, "Student");
}

#[test]
fn resolver_reports_candidates_and_found_columns() {
    let t = grades(&["Learner", "Course", "Pct"], &[]);
    let e: ColumnNotFoundError =
        resolve_columns(&t, &SummaryOptions::default()).expect_err("student missing");
    assert_eq!(e.role, Role::Student);
    assert_eq!(e.candidates, vec!["Student", "Name", "Student Name"]);
    assert_eq!(e.found, vec!["Learner", "Course", "Pct"]);
    let msg = e.to_string();
    assert!(msg.contains("Learner"), "{}", msg);
    assert!(msg.contains("Student Name"), "{}", msg);
}

#[test]
fn resolver_checks_pct_before_course() {
    let t = grades(&["Student", "Subject", "Mark"], &[]);
    let e = resolve_columns(&t, &SummaryOptions::default()).expect_err("pct missing");
    assert_eq!(e.role, Role::Pct);
}

#[test]
fn coercer_handles_every_input_shape() {
    assert_eq!(coerce_percentage(&n(72.0)), Pct::Numeric(72.0));
    assert_eq!(coerce_percentage(&s("72")), Pct::Numeric(72.0));
    assert_eq!(coerce_percentage(&s("72.5%")), Pct::Numeric(72.5));
    assert_eq!(coerce_percentage(&s("  64.9 %  ")), Pct::Numeric(64.9));
    assert_eq!(coerce_percentage(&s("\t80\n")), Pct::Numeric(80.0));
    assert_eq!(coerce_percentage(&Cell::Missing), Pct::Missing);
    assert_eq!(coerce_percentage(&s("absent")), Pct::Missing);
    assert_eq!(coerce_percentage(&s("72%%")), Pct::Missing);
    assert_eq!(coerce_percentage(&s("%72")), Pct::Missing);
}

#[test]
fn threshold_is_strict() {
    let t = grades(
        &["Student", "Course", "Pct"],
        &[
            ("Ann", "Math", n(65.0)),
            ("Ben", "Math", n(65.0 - 0.0001)),
            ("Cal", "Math", s("65%")),
        ],
    );
    let cols = resolve_columns(&t, &SummaryOptions::default()).expect("resolve");
    let failing = failing_records(&t, &cols, 65.0);
    assert_eq!(failing.len(), 1);
    assert_eq!(failing[0].student.as_deref(), Some("Ben"));
}

#[test]
fn unparseable_and_missing_pct_never_fail() {
    let t = grades(
        &["Student", "Course", "Pct"],
        &[
            ("Ann", "Math", Cell::Missing),
            ("Ben", "Math", s("n/a")),
            ("Cal", "Math", s("")),
            ("Dee", "Math", s("12")),
        ],
    );
    let report = summarize_failing(&t, &SummaryOptions::default()).expect("summarize");
    let students: Vec<Option<&str>> = report.failing.iter().map(|r| r.student.as_deref()).collect();
    assert_eq!(students, vec![Some("Dee")]);
}

#[test]
fn failing_rows_are_projected_and_sorted() {
    let mut t = Table::new(vec![
        "Teacher".into(),
        "name".into(),
        "Class".into(),
        "PCT".into(),
    ]);
    t.push_row(vec![s("T1"), s("Zoe"), s("Math"), s("40%")]);
    t.push_row(vec![s("T2"), s("Amy"), s("Science"), n(10.0)]);
    t.push_row(vec![s("T3"), s("Amy"), s("Art"), s("30")]);
    t.push_row(vec![s("T4"), s("Amy"), s("Art"), s("20")]);
    t.push_row(vec![s("T5"), s("Amy"), s("Music"), s("90")]);

    let report = summarize_failing(&t, &SummaryOptions::default()).expect("summarize");
    let rows = report.failing_rows_table();
    assert_eq!(rows.columns, vec!["Student", "Course", "Pct"]);
    assert_eq!(
        rows.rows,
        vec![
            vec![s("Amy"), s("Art"), n(20.0)],
            vec![s("Amy"), s("Art"), n(30.0)],
            vec![s("Amy"), s("Science"), n(10.0)],
            vec![s("Zoe"), s("Math"), n(40.0)],
        ]
    );
}

#[test]
fn pivot_orders_by_total_then_name_and_pads() {
    let t = grades(
        &["Student", "Course", "Pct"],
        &[
            ("Alice", "Math", n(60.0)),
            ("Alice", "Art", n(55.0)),
            ("Bob", "Math", n(64.9)),
        ],
    );
    let report = summarize_failing(&t, &SummaryOptions::default()).expect("summarize");
    let summary = report.summary_table();
    assert_eq!(summary.columns, vec!["Student", "Total", "Course 1", "Course 2"]);
    assert_eq!(
        summary.rows,
        vec![
            vec![s("Alice"), n(2.0), s("Art"), s("Math")],
            vec![s("Bob"), n(1.0), s("Math"), s("")],
        ]
    );
}

#[test]
fn pivot_breaks_total_ties_by_student_name() {
    let t = grades(
        &["Student", "Course", "Pct"],
        &[
            ("Cara", "Math", n(10.0)),
            ("Abe", "Math", n(10.0)),
            ("Bea", "Math", n(10.0)),
            ("Bea", "Art", n(10.0)),
            ("Dan", "Math", n(99.0)),
        ],
    );
    let report = summarize_failing(&t, &SummaryOptions::default()).expect("summarize");
    let order: Vec<&str> = report
        .summary
        .rows
        .iter()
        .map(|r| r.student.as_str())
        .collect();
    assert_eq!(order, vec!["Bea", "Abe", "Cara"]);
    assert_eq!(report.summary.width, 2);
}

#[test]
fn nobody_failing_gives_empty_tables() {
    let t = grades(
        &["Student", "Course", "Pct"],
        &[("Ann", "Math", n(90.0)), ("Ben", "Art", s("70%"))],
    );
    let report = summarize_failing(&t, &SummaryOptions::default()).expect("summarize");
    assert!(report.failing.is_empty());
    assert_eq!(report.summary.width, 0);
    assert!(report.summary.rows.is_empty());

    let summary = report.summary_table();
    assert_eq!(summary.columns, vec!["Student", "Total"]);
    assert!(summary.rows.is_empty());
    assert!(report.failing_rows_table().rows.is_empty());
    assert!(pivot_summary(&[]).rows.is_empty());
}

#[test]
fn pipeline_is_deterministic() {
    let t = grades(
        &["Student", "Course", "Pct"],
        &[
            ("Bob", "Math", s("50%")),
            ("Alice", "Art", n(12.0)),
            ("Alice", "Math", s(" 40 ")),
            ("Bob", "Art", n(80.0)),
        ],
    );
    let a = summarize_failing(&t, &SummaryOptions::default()).expect("first run");
    let b = summarize_failing(&t, &SummaryOptions::default()).expect("second run");
    assert_eq!(a, b);
    assert_eq!(a.summary_table(), b.summary_table());
}

#[test]
fn blank_student_is_listed_last_but_not_summarized() {
    let mut t = Table::new(vec!["Student".into(), "Course".into(), "Pct".into()]);
    t.push_row(vec![Cell::Missing, s("Art"), n(30.0)]);
    t.push_row(vec![s("Ann"), s("Math"), n(30.0)]);
    t.push_row(vec![n(1042.0), s("Math"), n(30.0)]);
    let report = summarize_failing(&t, &SummaryOptions::default()).expect("summarize");

    let students: Vec<Option<&str>> = report.failing.iter().map(|r| r.student.as_deref()).collect();
    assert_eq!(students, vec![Some("1042"), Some("Ann"), None]);
    let rows = report.failing_rows_table().rows;
    assert_eq!(rows[2], vec![Cell::Missing, s("Art"), n(30.0)]);

    let summarized: Vec<&str> = report.summary.rows.iter().map(|r| r.student.as_str()).collect();
    assert_eq!(summarized, vec!["1042", "Ann"]);
    assert_eq!(report.summary.width, 1);
    assert_eq!(report.summary_table().rows.len(), 2);
}

#[test]
fn custom_threshold_and_candidates() {
    let t = grades(
        &["Learner", "Subject", "Score"],
        &[("Ann", "Math", n(55.0)), ("Ben", "Math", n(45.0))],
    );
    let options = SummaryOptions {
        threshold: 50.0,
        student_candidates: vec!["learner".into()],
        pct_candidates: vec!["score".into()],
        course_candidates: vec!["subject".into()],
    };
    let report = summarize_failing(&t, &options).expect("summarize");
    assert_eq!(report.columns.student, "Learner");
    assert_eq!(report.failing.len(), 1);
    assert_eq!(report.failing[0].student.as_deref(), Some("Ben"));
    assert_eq!(report.threshold, 50.0);
}
