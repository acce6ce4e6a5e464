use std::fmt;

use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Cells + tables
// ---------------------------------------------------------------------------

/// One cell as it came out of a loader.
///
/// Delimited text only ever yields `Text` and `Missing`; spreadsheets also
/// produce typed numbers and booleans.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Missing,
}

static MISSING: RawValue = RawValue::Missing;

impl RawValue {
    /// Build a cell from a delimited-text field. Empty fields are `Missing`.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Self::Missing
        } else {
            Self::Text(field.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            // Integral floats print without a fractional part
            Self::Float(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Self::Float(n) if n.is_nan() => f.write_str("nan"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Self::Missing => Ok(()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// How the caller points at a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// Exact header name.
    ByName(String),
    /// 1-based column position.
    ByPosition(usize),
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByName(name) => write!(f, "'{name}'"),
            Self::ByPosition(pos) => write!(f, "#{pos}"),
        }
    }
}

/// A loaded table: one header row plus data rows.
///
/// Rows may be shorter than the header; absent trailing cells read as
/// `RawValue::Missing`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<RawValue>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a selector to a 0-based column index.
    pub fn resolve(&self, selector: &ColumnSelector) -> Result<usize, ReconError> {
        match selector {
            ColumnSelector::ByName(name) => self
                .headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ReconError::MissingColumn { column: name.clone() }),
            ColumnSelector::ByPosition(pos) => {
                if *pos == 0 || *pos > self.column_count() {
                    Err(ReconError::InvalidColumnSelection {
                        index: *pos,
                        column_count: self.column_count(),
                    })
                } else {
                    Ok(pos - 1)
                }
            }
        }
    }

    pub fn get(&self, row: usize, col: usize) -> &RawValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&MISSING)
    }

    /// All values of one column, in row order.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &RawValue> + '_ {
        self.rows.iter().map(move |r| r.get(col).unwrap_or(&MISSING))
    }

    /// Copy of this table without the named column. Used to compare output
    /// files against in-memory results when the derived column was appended.
    pub fn without_column(&self, name: &str) -> Table {
        let Some(idx) = self.headers.iter().position(|h| h == name) else {
            return self.clone();
        };
        let mut headers = self.headers.clone();
        headers.remove(idx);
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut r = r.clone();
                if idx < r.len() {
                    r.remove(idx);
                }
                r
            })
            .collect();
        Table { headers, rows }
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// A canonical identifier used as the join key. Never empty.
///
/// An identifier that normalizes to nothing usable is represented as
/// `Option::<NormalizedId>::None`, never as a sentinel string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedId(String);

impl NormalizedId {
    pub(crate) fn new(s: String) -> Self {
        debug_assert!(!s.is_empty());
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Purchase identifiers not found in the holdings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "identifiers", rename_all = "snake_case")]
pub enum MissingReport {
    /// Nothing to report: every usable purchase identifier is held (this
    /// includes a purchase list with no usable identifiers at all).
    AllPresent,
    Missing(Vec<String>),
}

impl MissingReport {
    pub fn identifiers(&self) -> &[String] {
        match self {
            Self::AllPresent => &[],
            Self::Missing(ids) => ids,
        }
    }

    pub fn is_all_present(&self) -> bool {
        matches!(self, Self::AllPresent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub holdings_rows: usize,
    pub holdings_absent: usize,
    pub purchase_rows: usize,
    pub purchase_absent: usize,
    pub matched_rows: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
    pub holdings_column: String,
    pub purchase_column: String,
}

#[derive(Debug, Clone)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    /// Matching holdings rows, original order, duplicates kept.
    pub filtered_holdings: Table,
    /// 0-based indices of `filtered_holdings` rows in the input holdings.
    pub matched_rows: Vec<usize>,
    pub missing: MissingReport,
}
