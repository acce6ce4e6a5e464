// kbart-filter - reconcile a KBART holdings file against a purchase list
// Writes the matching holdings rows and the purchase identifiers not held

mod exit_codes;
mod settings;
mod shell;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use kbart_recon::{Normalizer, RawValue, ReconConfig, ReconError};

use exit_codes::{recon_exit_code, EXIT_CANCELLED, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "kbart-filter")]
#[command(about = "Filter a KBART holdings file down to the titles of a purchase list")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
#[command(after_help = "\
Without a subcommand, `run` starts and asks for every input.

Environment:
  KBART_LOG              tracing filter (e.g. debug, kbart_io=trace)
  KBART_FILTER_CONFIG    config file used when --config is not given")]
struct Cli {
    /// Debug logging to stderr (KBART_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile holdings against a purchase list, asking for anything not given
    #[command(after_help = "\
Examples:
  kbart-filter run
  kbart-filter run --holdings kbart.tsv --purchase titles.xlsx --column 3
  kbart-filter run --holdings kbart.tsv --purchase titles.csv --column 2 --skip-rows 0 \\
      --filtered-out filtered.tsv --missing-out missing.txt --json")]
    Run(RunArgs),

    /// Print the normalized form of identifiers (one per line)
    #[command(after_help = "\
Examples:
  kbart-filter normalize 978-3-16-148410-0
  kbart-filter normalize 9783161484100.0 nan 0")]
    Normalize {
        /// Identifiers as they appear in a file
        #[arg(required = true)]
        values: Vec<String>,

        /// Config file (absent markers are read from [normalize])
        #[arg(long, env = "KBART_FILTER_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Validate a config file and print the effective settings
    #[command(after_help = "\
Examples:
  kbart-filter config-check ~/.config/kbart-filter/config.toml")]
    ConfigCheck {
        /// Path to the TOML config file
        path: PathBuf,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// KBART holdings file (tab-separated)
    #[arg(long)]
    holdings: Option<PathBuf>,

    /// Purchase list (xlsx, xlsm, xls, xlsb, ods, csv, tsv, txt)
    #[arg(long)]
    purchase: Option<PathBuf>,

    /// 1-based number of the ISBN column in the purchase list
    #[arg(long)]
    column: Option<usize>,

    /// Where to write the filtered holdings (.tsv added if no extension)
    #[arg(long)]
    filtered_out: Option<PathBuf>,

    /// Where to write the missing identifiers (.txt added if no extension)
    #[arg(long)]
    missing_out: Option<PathBuf>,

    /// Config file (default: <config dir>/kbart-filter/config.toml)
    #[arg(long, env = "KBART_FILTER_CONFIG")]
    config: Option<PathBuf>,

    /// Purchase worksheet name (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Rows above the purchase list header (default: 2)
    #[arg(long)]
    skip_rows: Option<usize>,

    /// Report every missing occurrence instead of each identifier once
    #[arg(long)]
    keep_duplicates: bool,

    /// Print the run report as JSON to stdout
    #[arg(long)]
    json: bool,
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  kbart-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  kbart-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
        )
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("KBART_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));
    // Logs share stderr with prompts; stdout is reserved for --json and command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        None => cmd_run(RunArgs {
            config: std::env::var_os("KBART_FILTER_CONFIG").map(PathBuf::from),
            ..RunArgs::default()
        }),
        Some(Commands::Run(args)) => cmd_run(args),
        Some(Commands::Normalize { values, config }) => cmd_normalize(values, config),
        Some(Commands::ConfigCheck { path }) => cmd_config_check(path),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                if code == EXIT_CANCELLED {
                    eprintln!("warning: {}", message);
                } else {
                    eprintln!("error: {}", message);
                }
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from a reconciliation error with the matching exit code.
    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::InvalidColumnSelection { .. } => {
                Some("count columns from the left of the sheet, starting at 1".to_string())
            }
            ReconError::MissingColumn { .. } => {
                Some("set [holdings] identifier_column in the config file".to_string())
            }
            ReconError::FileAccess { .. } => {
                Some("check the path, and that the file is not open in another program".to_string())
            }
            ReconError::Config(_) => {
                Some("run `kbart-filter config-check <PATH>` to see what is accepted".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let (mut config, source) = settings::load(args.config.as_deref()).map_err(CliError::recon)?;
    apply_overrides(&mut config, &args)?;
    if let Some(path) = &source {
        tracing::debug!(path = %path.display(), "using config file");
    }

    let session_args = shell::SessionArgs {
        holdings: args.holdings,
        purchase: args.purchase,
        column: args.column,
        filtered_out: args.filtered_out,
        missing_out: args.missing_out,
    };

    let stdin = io::stdin();
    let mut prompt = shell::TerminalPrompt::new(stdin.lock(), io::stderr());
    let report = shell::run_session(&mut prompt, session_args, &config).map_err(CliError::recon)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    let s = &report.summary;
    eprintln!(
        "{} of {} holdings row(s) matched, {} purchase identifier(s) missing",
        s.matched_rows, s.holdings_rows, s.missing,
    );
    Ok(())
}

fn apply_overrides(config: &mut ReconConfig, args: &RunArgs) -> Result<(), CliError> {
    if let Some(sheet) = &args.sheet {
        if sheet.trim().is_empty() {
            return Err(CliError::args("--sheet must not be empty")
                .with_hint("omit --sheet to read the first worksheet"));
        }
        config.purchase.sheet = Some(sheet.clone());
    }
    if let Some(skip_rows) = args.skip_rows {
        config.purchase.skip_rows = skip_rows;
    }
    if args.keep_duplicates {
        config.missing.dedupe = false;
    }
    config.validate().map_err(CliError::recon)
}

// ============================================================================
// normalize
// ============================================================================

fn cmd_normalize(values: Vec<String>, config: Option<PathBuf>) -> Result<(), CliError> {
    let (config, _) = settings::load(config.as_deref()).map_err(CliError::recon)?;
    let normalizer = Normalizer::new(&config.normalize);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for value in &values {
        let line = match normalizer.normalize(&RawValue::from_field(value)) {
            Some(id) => id.into_string(),
            None => "<absent>".to_string(),
        };
        writeln!(handle, "{line}").map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
    }
    Ok(())
}

// ============================================================================
// config-check
// ============================================================================

fn cmd_config_check(path: PathBuf) -> Result<(), CliError> {
    let (config, _) = settings::load(Some(&path)).map_err(CliError::recon)?;
    let effective = config.to_toml().map_err(CliError::recon)?;
    print!("{effective}");
    eprintln!("config ok: {}", path.display());
    Ok(())
}
