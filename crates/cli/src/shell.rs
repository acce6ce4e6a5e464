//! Interactive reconciliation session.
//!
//! Collects the two input files and the purchase column (from flags or by
//! asking), runs the engine, then offers to save the missing-identifier list
//! and the filtered holdings. All terminal interaction goes through
//! [`Prompt`] so the flow can be driven by a script in tests.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use kbart_recon::{run, ColumnSelector, MissingReport, ReconConfig, ReconError, ReconMeta, ReconSummary};
use serde::Serialize;
use tracing::{debug, info};

/// Question/answer channel to the user.
pub trait Prompt {
    /// Ask a question. `None` means the user dismissed it (empty answer or
    /// end of input).
    fn ask(&mut self, question: &str) -> Result<Option<String>, ReconError>;

    /// Informational message (saved files, "all present").
    fn notify(&mut self, message: &str);

    /// Something the user chose to skip.
    fn warn(&mut self, message: &str);
}

/// Line-oriented prompt over any reader/writer pair (stdin/stderr in `main`).
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
    fn ask(&mut self, question: &str) -> Result<Option<String>, ReconError> {
        write!(self.output, "{question}: ")
            .and_then(|_| self.output.flush())
            .map_err(|e| ReconError::Unclassified(format!("cannot write prompt: {e}")))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| ReconError::Unclassified(format!("cannot read answer: {e}")))?;
        if read == 0 {
            // EOF: finish the prompt line so later output starts clean
            let _ = writeln!(self.output);
            return Ok(None);
        }

        let answer = line.trim();
        Ok(if answer.is_empty() { None } else { Some(answer.to_string()) })
    }

    fn notify(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }

    fn warn(&mut self, message: &str) {
        let _ = writeln!(self.output, "warning: {message}");
    }
}

/// Values already known before the session starts. Anything left `None` is
/// asked for.
#[derive(Debug, Clone, Default)]
pub struct SessionArgs {
    pub holdings: Option<PathBuf>,
    pub purchase: Option<PathBuf>,
    pub column: Option<usize>,
    pub filtered_out: Option<PathBuf>,
    pub missing_out: Option<PathBuf>,
}

/// Outcome of a completed session (`--json` output).
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub missing: MissingReport,
    pub filtered_output: Option<PathBuf>,
    pub missing_output: Option<PathBuf>,
}

/// Run one reconciliation session.
///
/// A dismissed input prompt aborts with `UserCancelled`. A dismissed save
/// prompt only skips that output.
pub fn run_session<P: Prompt>(
    prompt: &mut P,
    args: SessionArgs,
    config: &ReconConfig,
) -> Result<RunReport, ReconError> {
    let holdings_path = match args.holdings {
        Some(path) => path,
        None => ask_path(prompt, "KBART holdings file (.tsv)")?
            .ok_or_else(|| ReconError::cancelled("KBART file"))?,
    };
    let purchase_path = match args.purchase {
        Some(path) => path,
        None => ask_path(prompt, "Purchase list (.xlsx, .ods, .csv)")?
            .ok_or_else(|| ReconError::cancelled("purchase file"))?,
    };
    let column = match args.column {
        Some(column) => column,
        None => ask_column(prompt)?,
    };
    debug!(
        holdings = %holdings_path.display(),
        purchase = %purchase_path.display(),
        column,
        "session inputs collected"
    );

    let holdings = kbart_io::load_holdings(&holdings_path)?;
    let purchase = kbart_io::load_purchase(&purchase_path, &config.purchase)?;
    let result = run(&holdings, &purchase, &ColumnSelector::ByPosition(column), config)?;

    let missing_output = match &result.missing {
        MissingReport::AllPresent => {
            prompt.notify("All identifiers from the purchase list are present in the KBART file.");
            None
        }
        MissingReport::Missing(ids) => {
            let destination = match args.missing_out {
                Some(path) => Some(path),
                None => ask_path(prompt, &format!("Save {} missing identifier(s) to (.txt)", ids.len()))?,
            };
            match destination {
                Some(path) => {
                    let path = with_default_extension(path, "txt");
                    kbart_io::save_missing(ids, &path)?;
                    prompt.notify(&format!("Missing identifiers saved to: {}", path.display()));
                    Some(path)
                }
                None => {
                    prompt.warn("missing identifiers not saved");
                    None
                }
            }
        }
    };

    let filtered_output = if result.filtered_holdings.is_empty() {
        prompt.notify("No KBART rows match the purchase list; no filtered file written.");
        None
    } else {
        let destination = match args.filtered_out {
            Some(path) => Some(path),
            None => ask_path(
                prompt,
                &format!("Save {} filtered KBART row(s) to (.tsv)", result.filtered_holdings.len()),
            )?,
        };
        match destination {
            Some(path) => {
                let path = with_default_extension(path, "tsv");
                kbart_io::save_filtered(&result.filtered_holdings, &path)?;
                prompt.notify(&format!("Filtered KBART file saved as: {}", path.display()));
                Some(path)
            }
            None => {
                prompt.warn("filtered KBART file not saved");
                None
            }
        }
    };

    info!(
        matched = result.summary.matched_rows,
        missing = result.summary.missing,
        "session complete"
    );

    Ok(RunReport {
        meta: result.meta,
        summary: result.summary,
        missing: result.missing,
        filtered_output,
        missing_output,
    })
}

fn ask_path<P: Prompt>(prompt: &mut P, question: &str) -> Result<Option<PathBuf>, ReconError> {
    Ok(prompt.ask(question)?.and_then(|answer| clean_path(&answer)))
}

/// Re-asks until the answer is a whole number. Range checking is left to
/// the engine, which knows the column count.
fn ask_column<P: Prompt>(prompt: &mut P) -> Result<usize, ReconError> {
    loop {
        let answer = prompt
            .ask("ISBN column number in the purchase list (starting at 1)")?
            .ok_or_else(|| ReconError::cancelled("ISBN column"))?;
        match answer.parse::<usize>() {
            Ok(column) => return Ok(column),
            Err(_) => prompt.warn(&format!("'{answer}' is not a column number")),
        }
    }
}

/// Strip surrounding quotes (pasted from a file manager) and expand `~`.
fn clean_path(answer: &str) -> Option<PathBuf> {
    let trimmed = answer
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(shellexpand::tilde(trimmed).into_owned()))
}

pub fn with_default_extension(path: PathBuf, ext: &str) -> PathBuf {
    if path.extension().is_some() {
        return path;
    }
    let mut path = path;
    path.set_extension(ext);
    path
}
