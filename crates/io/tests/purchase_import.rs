// Spreadsheet purchase lists authored with rust_xlsxwriter and read back.
// Run with: cargo test -p kbart-io --test purchase_import

use std::path::Path;

use kbart_io::{load_holdings, load_purchase, save_filtered};
use kbart_recon::config::PurchaseConfig;
use kbart_recon::{run, ColumnSelector, MissingReport, RawValue, ReconConfig, ReconError};
use rust_xlsxwriter::{Formula, Workbook};
use tempfile::tempdir;

fn write_purchase_xlsx(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Titles").unwrap();
    sheet.write_string(0, 0, "Publisher order export").unwrap();
    sheet.write_string(1, 0, "Generated 2024-03-01").unwrap();
    sheet.write_string(2, 0, "Title").unwrap();
    sheet.write_string(2, 1, "Author").unwrap();
    sheet.write_string(2, 2, "ISBN").unwrap();
    sheet.write_string(3, 0, "Clean Code").unwrap();
    sheet.write_string(3, 1, "Martin").unwrap();
    sheet.write_string(3, 2, "978-0-13-468599-1").unwrap();
    sheet.write_string(4, 0, "Numeric ISBN").unwrap();
    sheet.write_number(4, 2, 9783161484100.0).unwrap();
    sheet.write_string(5, 0, "No ISBN").unwrap();
    sheet.write_number(5, 2, 0.0).unwrap();
    sheet.write_string(6, 0, "Unknown").unwrap();
    sheet.write_string(6, 2, "999-9-99-999999-9").unwrap();

    let other = workbook.add_worksheet();
    other.set_name("Notes").unwrap();
    other.write_string(0, 0, "ignored").unwrap();

    workbook.save(path).unwrap();
}

#[test]
fn xlsx_rows_are_skipped_and_typed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("purchase.xlsx");
    write_purchase_xlsx(&path);

    let table = load_purchase(&path, &PurchaseConfig::default()).unwrap();
    assert_eq!(table.headers, vec!["Title", "Author", "ISBN"]);
    assert_eq!(table.len(), 4);
    assert_eq!(table.get(0, 2), &RawValue::Text("978-0-13-468599-1".into()));
    assert_eq!(table.get(1, 1), &RawValue::Missing);
    assert_eq!(table.get(1, 2), &RawValue::Float(9783161484100.0));
}

#[test]
fn xlsx_named_sheet_and_unknown_sheet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("purchase.xlsx");
    write_purchase_xlsx(&path);

    let config = PurchaseConfig { skip_rows: 0, sheet: Some("Notes".into()) };
    let table = load_purchase(&path, &config).unwrap();
    assert_eq!(table.headers, vec!["ignored"]);
    assert!(table.is_empty());

    let config = PurchaseConfig { skip_rows: 0, sheet: Some("Missing".into()) };
    match load_purchase(&path, &config).unwrap_err() {
        ReconError::FileAccess { reason, .. } => {
            assert!(reason.contains("no sheet named 'Missing'"), "{reason}");
            assert!(reason.contains("Titles, Notes"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn xlsx_used_range_offset_keeps_absolute_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("offset.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    // Used range starts at C4: header row is sheet row 4
    sheet.write_string(3, 2, "Title").unwrap();
    sheet.write_string(3, 3, "ISBN").unwrap();
    sheet.write_string(4, 2, "A").unwrap();
    sheet.write_string(4, 3, "123").unwrap();
    workbook.save(&path).unwrap();

    let table = load_purchase(&path, &PurchaseConfig::default()).unwrap();
    assert_eq!(table.headers, vec!["Unnamed: 0", "Unnamed: 1", "Title", "ISBN"]);
    assert_eq!(
        table.resolve(&ColumnSelector::ByPosition(4)).unwrap(),
        3
    );
    assert_eq!(table.get(0, 3), &RawValue::Text("123".into()));
}

#[test]
fn corrupt_spreadsheet_is_file_access_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, b"this is not a zip archive").unwrap();
    let err = load_purchase(&path, &PurchaseConfig::default()).unwrap_err();
    assert!(matches!(err, ReconError::FileAccess { .. }), "{err:?}");
}

#[test]
fn end_to_end_with_spreadsheet_and_round_trip() {
    let dir = tempdir().unwrap();
    let purchase_path = dir.path().join("purchase.xlsx");
    write_purchase_xlsx(&purchase_path);

    let holdings_path = dir.path().join("kbart.tsv");
    std::fs::write(
        &holdings_path,
        "publication_title\tprint_identifier\tonline_identifier\ttitle_url\n\
         Clean Code\t\t978-0-13-468599-1\thttps://example.org/cc\n\
         No identifier\t\t0\t\n\
         Some Book\t\t9783161484100\thttps://example.org/sb\n\
         Unrelated\t\t978-1-11-111111-1\t\n\
         Clean Code (dup)\t\t9780134685991\t\n",
    )
    .unwrap();

    let holdings = load_holdings(&holdings_path).unwrap();
    let purchase = load_purchase(&purchase_path, &PurchaseConfig::default()).unwrap();
    let config = ReconConfig::default();
    let result = run(&holdings, &purchase, &ColumnSelector::ByPosition(3), &config).unwrap();

    assert_eq!(result.matched_rows, vec![0, 2, 4]);
    assert_eq!(result.missing, MissingReport::Missing(vec!["9999999999999".into()]));

    let out = dir.path().join("filtered.tsv");
    save_filtered(&result.filtered_holdings, &out).unwrap();
    let reloaded = load_holdings(&out).unwrap();
    assert_eq!(reloaded, result.filtered_holdings);

    let column = &config.output.normalized_column;
    let expected_rows: Vec<_> = result.matched_rows.iter().map(|&i| holdings.rows[i].clone()).collect();
    assert_eq!(reloaded.without_column(column).rows, expected_rows);
    assert_eq!(reloaded.without_column(column).headers, holdings.headers);
}

#[test]
fn invalid_column_selection_after_loading() {
    let dir = tempdir().unwrap();
    let purchase_path = dir.path().join("purchase.xlsx");
    write_purchase_xlsx(&purchase_path);
    let holdings_path = dir.path().join("kbart.tsv");
    std::fs::write(&holdings_path, "online_identifier\n1\n").unwrap();

    let holdings = load_holdings(&holdings_path).unwrap();
    let purchase = load_purchase(&purchase_path, &PurchaseConfig::default()).unwrap();
    let err = run(&holdings, &purchase, &ColumnSelector::ByPosition(4), &ReconConfig::default())
        .unwrap_err();
    assert_eq!(err, ReconError::InvalidColumnSelection { index: 4, column_count: 3 });
}

#[test]
fn na_cells_are_not_reported_missing() {
    let dir = tempdir().unwrap();
    let purchase_path = dir.path().join("purchase.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(2, 0, "Title").unwrap();
    sheet.write_string(2, 1, "ISBN").unwrap();
    sheet.write_string(3, 0, "Held").unwrap();
    sheet.write_string(3, 1, "978-3-16-148410-0").unwrap();
    sheet.write_string(4, 0, "Lookup failed").unwrap();
    sheet
        .write_formula(4, 1, Formula::new("=NA()").set_result("#N/A"))
        .unwrap();
    sheet.write_string(5, 0, "Typed by hand").unwrap();
    sheet.write_string(5, 1, "#N/A").unwrap();
    sheet.write_string(6, 0, "Export placeholder").unwrap();
    sheet.write_string(6, 1, "NULL").unwrap();
    workbook.save(&purchase_path).unwrap();

    let holdings_path = dir.path().join("kbart.tsv");
    std::fs::write(&holdings_path, "online_identifier\n9783161484100\n").unwrap();

    let holdings = load_holdings(&holdings_path).unwrap();
    let purchase = load_purchase(&purchase_path, &PurchaseConfig::default()).unwrap();
    let result = run(&holdings, &purchase, &ColumnSelector::ByPosition(2), &ReconConfig::default())
        .unwrap();

    assert_eq!(result.missing, MissingReport::AllPresent);
    assert_eq!(result.summary.purchase_absent, 3);
    assert_eq!(result.matched_rows, vec![0]);
}

#[test]
fn ragged_rows_round_trip_without_derived_column() {
    let dir = tempdir().unwrap();
    let holdings_path = dir.path().join("kbart.tsv");
    std::fs::write(
        &holdings_path,
        "publication_title\tonline_identifier\tnotes\nA\t1\nB\t2\tkept\n",
    )
    .unwrap();
    let purchase_path = dir.path().join("titles.csv");
    std::fs::write(&purchase_path, "x\ny\nISBN\n1\n2\n").unwrap();

    let mut config = ReconConfig::default();
    config.output.include_normalized_column = false;
    let holdings = load_holdings(&holdings_path).unwrap();
    let purchase = load_purchase(&purchase_path, &config.purchase).unwrap();
    let result = run(&holdings, &purchase, &ColumnSelector::ByPosition(1), &config).unwrap();

    let out = dir.path().join("filtered.tsv");
    save_filtered(&result.filtered_holdings, &out).unwrap();
    assert_eq!(load_holdings(&out).unwrap(), result.filtered_holdings);
}
