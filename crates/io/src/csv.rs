// Delimited text (TSV/CSV) import/export

use std::io::Read;
use std::path::Path;

use kbart_recon::{RawValue, ReconError, Table};
use tracing::debug;

/// Read a tab-separated file whose first row is the header (KBART layout).
pub fn import_tsv(path: &Path) -> Result<Table, ReconError> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, b'\t', 0).map_err(|reason| ReconError::file_access(path.display(), reason))
}

/// Read a delimited file with a sniffed delimiter, dropping `skip_rows`
/// leading records before the header.
pub fn import_sniffed(path: &Path, skip_rows: usize) -> Result<Table, ReconError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    debug!(path = %path.display(), delimiter = %(delimiter as char).escape_default(), "sniffed delimiter");
    import_from_string(&content, delimiter, skip_rows)
        .map_err(|reason| ReconError::file_access(path.display(), reason))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Score: best (lines sharing a field count) * field_count over counts >1.
        // Leading metadata lines (skipped rows) often have a single field, so
        // line 1 is not required to be representative.
        let score = counts
            .iter()
            .copied()
            .filter(|&c| c > 1)
            .map(|target| counts.iter().filter(|&&c| c == target).count() as u64 * target as u64)
            .max()
            .unwrap_or(0);

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, ReconError> {
    let mut file = std::fs::File::open(path).map_err(|e| ReconError::file_access(path.display(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| ReconError::file_access(path.display(), e))?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported files)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

fn import_from_string(content: &str, delimiter: u8, skip_rows: usize) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records().skip(skip_rows);

    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|e| e.to_string())?
            .iter()
            .map(|h| h.to_string())
            .collect(),
        None => return Err("no header row".to_string()),
    };
    let width = headers.len();

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| e.to_string())?;

        // Extra trailing empties are tolerated; extra data is not.
        if record.len() > width && record.iter().skip(width).any(|f| !f.is_empty()) {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(format!(
                "line {line}: expected {width} fields, saw {}",
                record.len()
            ));
        }

        rows.push(record.iter().take(width).map(RawValue::from_field).collect());
    }

    Ok(Table::new(headers, rows))
}

/// Write a table as tab-separated text with a header row.
pub fn export_tsv(table: &Table, path: &Path) -> Result<(), ReconError> {
    let to_err = |e: csv::Error| ReconError::file_access(path.display(), e);

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(to_err)?;

    writer.write_record(&table.headers).map_err(to_err)?;

    let width = table.column_count();
    for row_idx in 0..table.len() {
        let record: Vec<String> = (0..width).map(|col| table.get(row_idx, col).to_string()).collect();
        writer.write_record(&record).map_err(to_err)?;
    }

    writer
        .flush()
        .map_err(|e| ReconError::file_access(path.display(), e))?;
    Ok(())
}

/// Write one value per line.
pub fn export_lines(values: &[String], path: &Path) -> Result<(), ReconError> {
    let mut out = String::with_capacity(values.iter().map(|v| v.len() + 1).sum());
    for value in values {
        out.push_str(value);
        out.push('\n');
    }
    std::fs::write(path, out).map_err(|e| ReconError::file_access(path.display(), e))
}
