// File I/O operations

pub mod csv;
pub mod xlsx;

use std::path::Path;

use kbart_recon::config::PurchaseConfig;
use kbart_recon::{ReconError, Table};
use tracing::info;

/// How a purchase list is read, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseFormat {
    Spreadsheet,
    Delimited,
}

impl PurchaseFormat {
    /// Unknown extensions go to the spreadsheet reader, which reports a
    /// readable error if the file is not a workbook.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "tab" | "txt" => Self::Delimited,
            _ => Self::Spreadsheet,
        }
    }
}

/// Load a KBART holdings file (tab-separated, header row).
pub fn load_holdings(path: &Path) -> Result<Table, ReconError> {
    let table = csv::import_tsv(path)?;
    info!(path = %path.display(), rows = table.len(), columns = table.column_count(), "loaded holdings");
    Ok(table)
}

/// Load a purchase list, dropping the configured leading rows.
pub fn load_purchase(path: &Path, config: &PurchaseConfig) -> Result<Table, ReconError> {
    let table = match PurchaseFormat::from_path(path) {
        PurchaseFormat::Spreadsheet => xlsx::import(path, config.sheet.as_deref(), config.skip_rows)?,
        PurchaseFormat::Delimited => csv::import_sniffed(path, config.skip_rows)?,
    };
    info!(path = %path.display(), rows = table.len(), columns = table.column_count(), "loaded purchase list");
    Ok(table)
}

/// Write the filtered holdings as TSV with a header row.
pub fn save_filtered(table: &Table, path: &Path) -> Result<(), ReconError> {
    csv::export_tsv(table, path)?;
    info!(path = %path.display(), rows = table.len(), "saved filtered holdings");
    Ok(())
}

/// Write missing identifiers, one per line.
pub fn save_missing(ids: &[String], path: &Path) -> Result<(), ReconError> {
    csv::export_lines(ids, path)?;
    info!(path = %path.display(), count = ids.len(), "saved missing identifiers");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(PurchaseFormat::from_path(Path::new("list.xlsx")), PurchaseFormat::Spreadsheet);
        assert_eq!(PurchaseFormat::from_path(Path::new("list.ODS")), PurchaseFormat::Spreadsheet);
        assert_eq!(PurchaseFormat::from_path(Path::new("list.CSV")), PurchaseFormat::Delimited);
        assert_eq!(PurchaseFormat::from_path(Path::new("list.tsv")), PurchaseFormat::Delimited);
        assert_eq!(PurchaseFormat::from_path(Path::new("noext")), PurchaseFormat::Spreadsheet);
    }
}
