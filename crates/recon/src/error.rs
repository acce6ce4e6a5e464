use thiserror::Error;

/// Every way a reconciliation run can fail.
///
/// The set is closed so callers can map each kind to a distinct reaction
/// (warning, error message, exit code). `Unclassified` is the fallback for
/// failures that fit none of the other kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconError {
    /// A selection or input prompt was dismissed without a value.
    #[error("{what} not selected")]
    UserCancelled { what: String },

    /// 1-based column position outside the purchase table.
    #[error("invalid column selection {index}: the purchase table has {column_count} column(s), choose 1 to {column_count}")]
    InvalidColumnSelection { index: usize, column_count: usize },

    /// A required column is not present in the input data.
    #[error("column '{column}' not found")]
    MissingColumn { column: String },

    /// File cannot be opened, read, parsed or written.
    #[error("cannot access {path}: {reason}")]
    FileAccess { path: String, reason: String },

    /// Invalid configuration file or option combination.
    #[error("config error: {0}")]
    Config(String),

    #[error("unexpected error: {0}")]
    Unclassified(String),
}

impl ReconError {
    pub fn cancelled(what: impl Into<String>) -> Self {
        Self::UserCancelled { what: what.into() }
    }

    pub fn file_access(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::FileAccess {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
