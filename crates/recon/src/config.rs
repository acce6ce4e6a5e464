use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::normalize::canonical_str;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run settings. Every key is optional; an empty TOML document yields the
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconConfig {
    pub holdings: HoldingsConfig,
    pub purchase: PurchaseConfig,
    pub normalize: NormalizeConfig,
    pub missing: MissingConfig,
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HoldingsConfig {
    /// Header of the identifier column in the KBART file.
    pub identifier_column: String,
}

impl Default for HoldingsConfig {
    fn default() -> Self {
        Self {
            identifier_column: "online_identifier".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PurchaseConfig {
    /// Leading rows dropped before the header row.
    pub skip_rows: usize,
    /// Worksheet to read. First sheet when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            skip_rows: 2,
            sheet: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization + missing report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeConfig {
    /// Normalized values that mean "no identifier". Compared ASCII
    /// case-insensitively. The empty string is always absent.
    pub absent_markers: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            // "nan"/"0" plus the spellings spreadsheet and CSV exports use for
            // a missing value
            absent_markers: [
                "nan", "0", "#N/A", "#N/A N/A", "#NA", "N/A", "NA", "<NA>", "NULL", "None",
                "-NaN", "1.#IND", "1.#QNAN", "-1.#IND", "-1.#QNAN",
            ]
            .iter()
            .map(|m| m.to_string())
            .collect(),
        }
    }
}

/// What happens to purchase rows whose identifier normalized to absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentPolicy {
    /// Never listed.
    #[default]
    Exclude,
    /// Marker values (`nan`, `0`, ...) are listed verbatim. Empty cells are
    /// still never listed.
    Report,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MissingConfig {
    pub absent_in_missing: AbsentPolicy,
    /// Keep only the first occurrence of each missing identifier.
    pub dedupe: bool,
}

impl Default for MissingConfig {
    fn default() -> Self {
        Self {
            absent_in_missing: AbsentPolicy::Exclude,
            dedupe: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Append the normalized identifier to each filtered holdings row.
    pub include_normalized_column: bool,
    pub normalized_column: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            include_normalized_column: true,
            normalized_column: "normalized_isbn".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing + validation
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ReconError> {
        toml::to_string_pretty(self).map_err(|e| ReconError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.holdings.identifier_column.trim().is_empty() {
            return Err(ReconError::Config(
                "holdings.identifier_column must not be empty".into(),
            ));
        }

        if let Some(sheet) = &self.purchase.sheet {
            if sheet.trim().is_empty() {
                return Err(ReconError::Config("purchase.sheet must not be empty".into()));
            }
        }

        if let Some(pos) = self
            .normalize
            .absent_markers
            .iter()
            .position(|m| canonical_str(m).is_empty())
        {
            return Err(ReconError::Config(format!(
                "normalize.absent_markers[{pos}] is empty (empty values are always absent)"
            )));
        }

        if self.output.include_normalized_column && self.output.normalized_column.trim().is_empty() {
            return Err(ReconError::Config(
                "output.normalized_column must not be empty".into(),
            ));
        }

        Ok(())
    }
}
