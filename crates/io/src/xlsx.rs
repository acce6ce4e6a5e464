// Spreadsheet import (xlsx, xlsm, xls, xlsb, ods) via calamine

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use kbart_recon::{RawValue, ReconError, Table};
use tracing::{debug, warn};

/// Maximum dimensions read from a sheet
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Import one worksheet as a table.
///
/// Row and column positions are absolute sheet positions: `skip_rows`
/// counts from the first sheet row even when the used range starts further
/// down, and columns left of the used range are kept as empty columns so a
/// 1-based column number matches the sheet's column letters. After the
/// skipped rows the first non-blank row is the header; blank data rows are
/// dropped.
pub fn import(path: &Path, sheet: Option<&str>, skip_rows: usize) -> Result<Table, ReconError> {
    let fail = |reason: String| ReconError::file_access(path.display(), reason);

    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| fail(format!("failed to open spreadsheet: {e}")))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| {
                fail(format!(
                    "no sheet named '{wanted}' (available: {})",
                    sheet_names.join(", ")
                ))
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| fail("spreadsheet contains no sheets".to_string()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| fail(format!("failed to read sheet '{sheet_name}': {e}")))?;

    let (height, width) = range.get_size();
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let (start_row, start_col) = (start_row as usize, start_col as usize);

    if start_row + height > MAX_ROWS || start_col + width > MAX_COLS {
        warn!(sheet = %sheet_name, height, width, "sheet exceeds size limits, truncating");
    }
    let total_cols = (start_col + width).min(MAX_COLS);

    // Absolute row index -> cells, left-padded to absolute columns
    let mut grid: Vec<(usize, Vec<RawValue>)> = Vec::with_capacity(height);
    for (row_idx, row) in range.rows().enumerate() {
        let abs_row = start_row + row_idx;
        if abs_row >= MAX_ROWS {
            break;
        }
        let mut cells = vec![RawValue::Missing; start_col.min(total_cols)];
        cells.extend(row.iter().take(total_cols.saturating_sub(start_col)).map(cell_value));
        grid.push((abs_row, cells));
    }

    let mut remaining = grid
        .into_iter()
        .filter(|(abs_row, _)| *abs_row >= skip_rows)
        .map(|(_, cells)| cells)
        .filter(|cells| cells.iter().any(|c| !c.is_missing()));

    let header_cells = remaining.next().ok_or_else(|| {
        fail(format!(
            "sheet '{sheet_name}' has no header row after skipping {skip_rows} row(s)"
        ))
    })?;

    let headers: Vec<String> = (0..total_cols)
        .map(|col| match header_cells.get(col) {
            Some(cell) if !cell.is_missing() => cell.to_string(),
            _ => format!("Unnamed: {col}"),
        })
        .collect();

    let rows: Vec<Vec<RawValue>> = remaining.collect();

    debug!(
        path = %path.display(),
        sheet = %sheet_name,
        columns = headers.len(),
        rows = rows.len(),
        "imported spreadsheet"
    );

    Ok(Table::new(headers, rows))
}

fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Empty => RawValue::Missing,
        Data::String(s) => {
            if s.is_empty() {
                RawValue::Missing
            } else {
                RawValue::Text(s.clone())
            }
        }
        Data::Float(n) => RawValue::Float(*n),
        Data::Int(n) => RawValue::Int(*n),
        Data::Bool(b) => RawValue::Bool(*b),
        // #N/A, #REF! and friends carry no identifier
        Data::Error(_) => RawValue::Missing,
        // Serial number; dates are not identifiers but must not be dropped
        Data::DateTime(dt) => RawValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) => RawValue::Text(s.clone()),
        Data::DurationIso(s) => RawValue::Text(s.clone()),
    }
}
