use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use itertools::Itertools;
use jitlog_report::{ReportKind, ReportOptions, SortOrder};
use jitlog_source::{EventSource, JsonLinesSource};
use mimalloc::MiMalloc;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Summarize HotSpot JIT compilation logs.
///
/// Each file holds one JSON-encoded log event per line. Files are analyzed
/// independently, in order. When several reports are requested the first of
/// -Q, -L, -S, -R wins; with none, every event is printed.
#[derive(Parser)]
#[command(author, version, about)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// Order events by start time (default)
    #[arg(short = 's', overrides_with_all = ["elapsed", "name"])]
    start: bool,

    /// Order events by compile time
    #[arg(short = 'e', overrides_with_all = ["start", "name"])]
    elapsed: bool,

    /// Order events by method name, then start time
    #[arg(short = 'n', overrides_with_all = ["start", "elapsed"])]
    name: bool,

    /// Skip malformed lines instead of failing the file
    #[arg(short = 'c')]
    cleanup: bool,

    /// Show inlining decisions under each compilation
    #[arg(short = 'i')]
    inlining: bool,

    /// Print compile time, phase and code cache statistics
    #[arg(short = 'S')]
    statistics: bool,

    /// Print uncommon traps grouped by method and reason
    #[arg(short = 'R')]
    recompilation: bool,

    /// Print lock sites eliminated by each compilation
    #[arg(short = 'L')]
    locks: bool,

    /// Print compile queue occupancy per tier
    #[arg(short = 'Q')]
    queue: bool,

    /// Compilation logs to analyze
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl Cli {
    fn report_kind(&self) -> ReportKind {
        ReportKind::select(
            self.queue,
            self.locks,
            self.statistics,
            self.recompilation,
        )
    }

    fn report_options(&self) -> ReportOptions {
        // At most one of these is set; the last flag given wins.
        let order = match (self.start, self.elapsed, self.name) {
            (_, true, _) => SortOrder::Elapsed,
            (_, _, true) => SortOrder::NameAndStart,
            (true, ..) | (false, false, false) => SortOrder::Start,
        };
        ReportOptions {
            order,
            print_inlining: self.inlining,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version go to stdout; anything else prints usage to
            // stderr.
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    ExitCode::SUCCESS
                }
                _ => ExitCode::FAILURE,
            };
        }
    };

    // Diagnostics go to stderr so stdout carries only report text. Default
    // to warn, allowlist our crates.
    const CRATES: &[&str] =
        &["jitlog", "jitlog_report", "jitlog_schemas", "jitlog_source"];
    let level = cli.verbose.tracing_level_filter();
    let allowlist = CRATES.iter().map(|c| format!("{c}={level}")).join(",");
    let filter = EnvFilter::new(format!("warn,{allowlist}"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let kind = cli.report_kind();
    let options = cli.report_options();

    // Lock stdout once up front rather than on each write call.
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut failed = 0usize;
    for path in &cli.files {
        if let Err(err) = analyze(path, cli.cleanup, kind, &options, &mut out) {
            error!(path = %path.display(), "{err:#}");
            failed += 1;
        }
    }

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Reads one log and writes the selected report for it.
fn analyze(
    path: &Path,
    cleanup: bool,
    kind: ReportKind,
    options: &ReportOptions,
    out: &mut impl Write,
) -> Result<()> {
    debug!(path = %path.display(), ?kind, "analyzing");

    let events = JsonLinesSource::open(path, cleanup)
        .and_then(|mut source| source.read_events())
        .with_context(|| format!("failed to read {}", path.display()))?;

    jitlog_report::run(&events, kind, options, BufWriter::new(out))
        .with_context(|| format!("failed to report on {}", path.display()))
}
