//! CLI binary for lmp-lite.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `ConversionConfig`, runs the batch and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use lmp_lite::config::{
    read_system_prompt, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_OFFICE_BIN, DEFAULT_TEMP_DIR,
};
use lmp_lite::{
    ConversionConfig, ConversionProgressCallback, Converter, ProgressCallback, TargetStatus,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one spinner per target that turns into a page bar once
/// the document's page count is known, plus a ✔/✘ line per target.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
    page_errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(Self::spinner_style());
        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            page_errors: AtomicUsize::new(0),
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS)
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS)
    }

    fn page_elapsed(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_target_start(&self, target: &str) {
        self.bar.reset();
        self.bar.set_length(0);
        self.bar.set_style(Self::spinner_style());
        self.bar.set_prefix("Preparing");
        self.bar.set_message(target.to_string());
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.page_errors.store(0, Ordering::SeqCst);
    }

    fn on_web_fetch(&self, url: &str) {
        self.bar.set_prefix("Fetching");
        self.bar.set_message(url.to_string());
    }

    fn on_office_conversion(&self, path: &Path) {
        self.bar.set_prefix("Converting to PDF");
        self.bar.set_message(path.display().to_string());
    }

    fn on_document_start(&self, _pdf_path: &Path, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(Self::bar_style());
        self.bar.set_prefix("Transcribing");
        self.bar.reset_eta();
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{markdown_len:>5} chars")),
            dim(&format!("{:.1}s", self.page_elapsed())),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        self.page_errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg),
            dim(&format!("{:.1}s", self.page_elapsed())),
        ));
        self.bar.inc(1);
    }

    fn on_target_complete(&self, _target: &str, output: &Path) {
        self.bar.finish_and_clear();
        let failed = self.page_errors.load(Ordering::SeqCst);
        let mark = if failed == 0 { green("✔") } else { cyan("⚠") };
        let note = if failed == 0 {
            String::new()
        } else {
            format!("  ({} pages failed)", red(&failed.to_string()))
        };
        eprintln!("{mark} Saved: {}{note}", bold(&output.display().to_string()));
    }

    fn on_target_error(&self, target: &str, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}: {}", red("✘"), bold(target), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a PDF (writes ./report.pdf.md)
  lmp-lite report.pdf

  # Office documents are converted to PDF first (writes ./deck.pptx.md)
  lmp-lite deck.pptx

  # Web pages skip the model (writes ./web_export.md)
  lmp-lite https://example.com/article

  # Several targets at once; a failing target does not stop the rest
  lmp-lite a.pdf b.docx c.xlsx --output-dir out/

  # JSON report of the batch on stdout
  lmp-lite --json a.pdf b.pdf > report.json

ENVIRONMENT VARIABLES:
  ALIYUN_API_KEY        API key for the vision model endpoint (required)
  ALIYUN_BASE_URL       OpenAI-compatible base URL
  ALIYUN_VISION_MODEL   Vision model identifier
  TEMP_DIR              Staging directory for office → PDF conversion
  LIBREOFFICE_BIN       Office suite executable
  LMP_OUTPUT_DIR        Directory the Markdown files are written to
  LMP_API_TIMEOUT       Per-request timeout in seconds
  LMP_PROMPT            Instruction sent with every page image
  LMP_SYSTEM_PROMPT     File sent as the system message
  PDFIUM_LIB_PATH       Path to libpdfium (default: system library)
  RUST_LOG              Log filter, overrides -v / -q

NOTES:
  Every URL target is written to web_export.md; a later URL in the same
  batch overwrites an earlier one.
"#;

#[derive(Parser, Debug)]
#[command(
    name = "lmp-lite",
    version,
    about = "Convert PDFs, office documents and web pages to Markdown using a vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files (.pdf, .ppt[x], .doc[x], .xls[x]) or http(s) URLs.
    #[arg(required = true, num_args = 1..)]
    targets: Vec<String>,

    /// API key for the vision model endpoint.
    #[arg(long, env = "ALIYUN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenAI-compatible base URL.
    #[arg(long, env = "ALIYUN_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Vision model identifier.
    #[arg(long, env = "ALIYUN_VISION_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Staging directory for office → PDF conversion.
    #[arg(long, env = "TEMP_DIR", default_value = DEFAULT_TEMP_DIR)]
    temp_dir: PathBuf,

    /// Office suite executable run in headless mode.
    #[arg(long, env = "LIBREOFFICE_BIN", default_value = DEFAULT_OFFICE_BIN)]
    office_bin: String,

    /// Directory the Markdown files are written to.
    #[arg(short, long, env = "LMP_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Per-request timeout in seconds (default: 600 for the model, none for web pages).
    #[arg(long, env = "LMP_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Instruction sent with every page image, replacing the built-in one.
    #[arg(long, env = "LMP_PROMPT")]
    prompt: Option<String>,

    /// File whose contents are sent as a system message with every page.
    #[arg(long, env = "LMP_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "LMP_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "LMP_NO_PROGRESS")]
    no_progress: bool,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Errors only.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar reports targets and pages itself, so library INFO
    // logs are suppressed while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    // The provider logs every failed call and warns about its unused key
    // field on each request; page failures are already reported here.
    let filter = if cli.verbose {
        filter.to_string()
    } else {
        format!("{filter},edgequake_llm=error")
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    // Credential validation happens here, before any target is looked at.
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let converter = Converter::new(config).context("Failed to initialise converter")?;

    // ── Run batch ────────────────────────────────────────────────────────
    let started = Instant::now();
    let outcomes = converter.convert_batch(&cli.targets[..]).await;

    if cli.json {
        let json = serde_json::to_string_pretty(&outcomes).context("Failed to serialise report")?;
        println!("{json}");
    }

    if !cli.quiet {
        let written = outcomes
            .iter()
            .filter(|o| matches!(o.result, TargetStatus::Written { .. }))
            .count();
        let failed = outcomes.len() - written;
        eprintln!(
            "{}  {}/{} targets written  {}",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            written,
            outcomes.len(),
            dim(&format!("{}ms", started.elapsed().as_millis())),
        );
    }

    // Per-target failures are reported above, never through the exit code.
    Ok(())
}

fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .api_key(cli.api_key.clone().unwrap_or_default())
        .base_url(&cli.base_url)
        .model(&cli.model)
        .temp_dir(&cli.temp_dir)
        .output_dir(&cli.output_dir)
        .office_program(&cli.office_bin);

    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref prompt) = cli.prompt {
        builder = builder.prompt(prompt);
    }
    if let Some(ref path) = cli.system_prompt {
        builder = builder.system_prompt(read_system_prompt(path)?);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
