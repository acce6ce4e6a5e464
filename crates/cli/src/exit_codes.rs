//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success (including "all identifiers present")        |
//! | 1    | Unclassified failure                                 |
//! | 2    | CLI usage error (bad args; clap's own code)          |
//! | 3    | A prompt was cancelled (warning, not a failure)      |
//! | 4    | Purchase column number out of range                  |
//! | 5    | Required column missing                              |
//! | 6    | File cannot be opened, parsed or written             |
//! | 7    | Invalid configuration                                |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `recon_exit_code`

use kbart_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// The user dismissed a file or column prompt.
pub const EXIT_CANCELLED: u8 = 3;

/// Purchase column number is 0 or beyond the last column.
pub const EXIT_INVALID_COLUMN: u8 = 4;

/// The holdings identifier column (or another named column) does not exist.
pub const EXIT_MISSING_COLUMN: u8 = 5;

/// Input unreadable/unparseable or output not writable.
pub const EXIT_FILE_ACCESS: u8 = 6;

/// Config file unreadable as TOML or failing validation.
pub const EXIT_CONFIG: u8 = 7;

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::UserCancelled { .. } => EXIT_CANCELLED,
        ReconError::InvalidColumnSelection { .. } => EXIT_INVALID_COLUMN,
        ReconError::MissingColumn { .. } => EXIT_MISSING_COLUMN,
        ReconError::FileAccess { .. } => EXIT_FILE_ACCESS,
        ReconError::Config(_) => EXIT_CONFIG,
        ReconError::Unclassified(_) => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_code() {
        let errors = [
            ReconError::cancelled("x"),
            ReconError::InvalidColumnSelection { index: 0, column_count: 1 },
            ReconError::MissingColumn { column: "c".into() },
            ReconError::file_access("p", "r"),
            ReconError::Config("c".into()),
            ReconError::Unclassified("u".into()),
        ];
        let mut codes: Vec<u8> = errors.iter().map(recon_exit_code).collect();
        assert!(!codes.contains(&EXIT_SUCCESS));
        assert!(!codes.contains(&EXIT_USAGE));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
