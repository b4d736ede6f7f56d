//! CLI binary for pdf-page-report.
//!
//! A thin shim over the library crate that loads credentials, maps CLI flags
//! to `PipelineConfig` and prints per-page progress and the final summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_page_report::{
    analyze_document, Credentials, PageSummary, PipelineConfig, ProgressCallback,
    RunProgressCallback, DEFAULT_API_URL,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a progress bar plus one log line per page,
/// per retry, and per failure.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Create a spinner; `on_run_start` turns it into a bar once the page
    /// count is known.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Splitting PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Analysing");
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("PDF split into {total_pages} pages"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_retry(&self, page_num: usize, attempt: u32, max: u32, delay: Duration, error: String) {
        self.bar.println(format!(
            "  {} Page {:>3}  attempt {}/{} failed: {}  {}",
            yellow("↻"),
            page_num,
            attempt,
            max,
            truncate(error),
            dim(&format!("retrying in {}s", delay.as_secs())),
        ));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, summary: &PageSummary) {
        let types = if summary.chunk_types.is_empty() {
            "-".to_string()
        } else {
            summary.chunk_types.join(", ")
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{} chunks ({types})", summary.chunk_count)),
            dim(&summary.report_path.display().to_string()),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: String) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&truncate(error)),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_pages: usize, success_count: usize, combined: Option<&Path>) {
        self.bar.finish_and_clear();
        let failed = total_pages.saturating_sub(success_count);

        if failed == 0 {
            eprintln!(
                "{} {} pages analysed successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages analysed  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
        if let Some(path) = combined {
            eprintln!("  combined report → {}", bold(&path.display().to_string()));
        }
    }
}

/// Keep very long error messages to one terminal line.
fn truncate(error: String) -> String {
    if error.chars().count() > 80 {
        let head: String = error.chars().take(79).collect();
        format!("{head}\u{2026}")
    } else {
        error
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a PDF, reports go to ./output
  pdf-report document.pdf

  # Custom output directory, more patient retries
  pdf-report --output-dir reports --max-retries 5 --retry-delay 10 scan.pdf

  # JSON run summary on stdout
  pdf-report --json document.pdf > run.json

OUTPUT FILES:
  pdf_analysis_<YYYYmmdd_HHMMSS>_page_<n>.md   one per successful page
  pdf_analysis_<YYYYmmdd_HHMMSS>_combined.md   all successful pages

ENVIRONMENT VARIABLES (required, may live in .env):
  LANDING_AI_API_KEY   document-analysis API key
  ANTHROPIC_API_KEY    Anthropic API key
  OPENAI_API_KEY       OpenAI API key
"#;

/// Analyse a PDF page by page and write Markdown reports.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-report",
    version,
    about = "Analyse a PDF page by page and write Markdown reports",
    long_about = "Split a PDF into single pages, submit each page to the agentic document-analysis \
API, and write one Markdown report per page plus a combined report.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Directory for page and combined reports.
    #[arg(short, long, env = "PDF_REPORT_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Directory for temporary single-page PDFs (default: system temp dir).
    #[arg(long, env = "PDF_REPORT_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Attempts per page on network/HTTP failure.
    #[arg(long, env = "PDF_REPORT_MAX_RETRIES", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_retries: u32,

    /// Seconds to wait between attempts.
    #[arg(long, env = "PDF_REPORT_RETRY_DELAY", default_value_t = 5)]
    retry_delay: u64,

    /// Do not ask the service for marginalia.
    #[arg(long, env = "PDF_REPORT_NO_MARGINALIA")]
    no_marginalia: bool,

    /// Do not ask the service to embed metadata in the markdown.
    #[arg(long, env = "PDF_REPORT_NO_METADATA")]
    no_metadata: bool,

    /// Analysis endpoint.
    #[arg(long, env = "PDF_REPORT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Per-request timeout in seconds (default: none).
    #[arg(long, env = "PDF_REPORT_TIMEOUT")]
    timeout: Option<u64>,

    /// Print the run summary (RunOutput) as JSON on stdout.
    #[arg(long, env = "PDF_REPORT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_REPORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_REPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_REPORT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the variables may come from the shell.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar already prints a line per page.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Credentials (fatal when missing) ─────────────────────────────────
    let credentials = Credentials::from_env().context("Missing API credentials")?;

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn RunProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = analyze_document(&cli.input, &credentials, &config)
        .await
        .context("Analysis failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        eprintln!(
            "Analysed {}/{} pages in {}ms",
            output.stats.succeeded_pages, output.stats.total_pages, output.stats.total_duration_ms
        );
        for e in output.page_errors() {
            eprintln!("  {e}");
        }
        if let Some(ref path) = output.combined_path {
            eprintln!("Combined report saved to {}", path.display());
        }
    }

    if let Some(ref e) = output.combine_error {
        eprintln!("{} failed to combine reports: {e}", red("✗"));
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .api_url(cli.api_url.clone())
        .output_dir(cli.output_dir.clone())
        .max_retries(cli.max_retries)
        .retry_delay_secs(cli.retry_delay)
        .include_marginalia(!cli.no_marginalia)
        .include_metadata_in_markdown(!cli.no_metadata);

    if let Some(ref dir) = cli.scratch_dir {
        builder = builder.scratch_dir(dir.clone());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
