mod config;
mod input;
mod ipc;
mod output;
mod summary;
mod table;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use summary::{Role, SummaryOptions};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "failsumd",
    version,
    about = "Build a failing-students summary from a grade export."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Answer line-delimited JSON requests on stdin/stdout (default).
    Serve,
    /// Summarize one grade export and write the workbook and summary CSV.
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Input CSV/TSV/Excel grades file
    #[arg(long = "in", value_name = "PATH")]
    in_path: PathBuf,
    /// Sheet name (for Excel). Defaults to first sheet.
    #[arg(long)]
    sheet: Option<String>,
    /// Output Excel path
    #[arg(long = "out", value_name = "PATH", default_value = "failing_summary.xlsx")]
    out_path: PathBuf,
    /// Failing threshold (default 65)
    #[arg(long)]
    threshold: Option<f64>,
    /// JSON file with threshold and candidate column names
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Accepted student column header; repeat to give several
    #[arg(long = "student-col", value_name = "NAME")]
    student_cols: Vec<String>,
    /// Accepted percentage column header; repeat to give several
    #[arg(long = "pct-col", value_name = "NAME")]
    pct_cols: Vec<String>,
    /// Accepted course column header; repeat to give several
    #[arg(long = "course-col", value_name = "NAME")]
    course_cols: Vec<String>,
}

impl RunArgs {
    fn options(&self) -> anyhow::Result<SummaryOptions> {
        let mut options = match &self.config {
            Some(p) => config::load_options(p)?,
            None => SummaryOptions::default(),
        };
        if let Some(t) = self.threshold {
            if !t.is_finite() {
                bail!("threshold must be a finite number");
            }
            options.threshold = t;
        }
        for (role, list) in [
            (Role::Student, &self.student_cols),
            (Role::Pct, &self.pct_cols),
            (Role::Course, &self.course_cols),
        ] {
            if !list.is_empty() {
                config::set_candidates(&mut options, role, list.clone());
            }
        }
        Ok(options)
    }
}

fn init_tracing(default_filter: &str) {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let options = args.options()?;
    let table = input::read_table(&args.in_path, args.sheet.as_deref())?;
    let report = summary::summarize_failing(&table, &options)?;
    info!(
        student = %report.columns.student,
        pct = %report.columns.pct,
        course = %report.columns.course,
        threshold = report.threshold,
        "resolved columns"
    );
    let paths = output::write_outputs(&report, &args.out_path)?;
    println!("Wrote Excel to: {}", paths.xlsx.display());
    println!("Wrote CSV to:   {}", paths.csv.display());
    Ok(())
}

fn serve() -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(req),
            // No id to echo back.
            Err(e) => ipc::err("", "bad_json", e.to_string(), None),
        };
        writeln!(stdout, "{}", resp).context("failed to write response")?;
        stdout.flush().context("failed to flush response")?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Some(Command::Run(args)) => {
            init_tracing("info");
            run(args)
        }
        Some(Command::Serve) | None => {
            init_tracing("warn");
            serve()
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
