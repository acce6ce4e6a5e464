use std::collections::HashSet;

use tracing::debug;

use crate::config::{AbsentPolicy, ReconConfig};
use crate::error::ReconError;
use crate::model::{
    ColumnSelector, MissingReport, NormalizedId, RawValue, ReconMeta, ReconResult, ReconSummary,
    Table,
};
use crate::normalize::{canonical_text, Normalizer};

/// Reconcile a holdings table against a purchase table.
///
/// The purchase column is checked before anything else so a bad selection
/// fails without doing any work. The holdings identifier column comes from
/// `config.holdings.identifier_column`.
///
/// Set membership on both sides: O(n + m).
pub fn run(
    holdings: &Table,
    purchase: &Table,
    purchase_column: &ColumnSelector,
    config: &ReconConfig,
) -> Result<ReconResult, ReconError> {
    let purchase_idx = purchase.resolve(purchase_column)?;
    let holdings_column = ColumnSelector::ByName(config.holdings.identifier_column.clone());
    let holdings_idx = holdings.resolve(&holdings_column)?;

    let normalizer = Normalizer::new(&config.normalize);
    let holdings_ids = normalizer.normalize_column(holdings.column(holdings_idx));
    let purchase_ids = normalizer.normalize_column(purchase.column(purchase_idx));

    let purchase_set: HashSet<&NormalizedId> = purchase_ids.iter().flatten().collect();
    let holdings_set: HashSet<&NormalizedId> = holdings_ids.iter().flatten().collect();

    debug!(
        purchase_column = %purchase_column,
        holdings_rows = holdings.len(),
        holdings_distinct = holdings_set.len(),
        purchase_rows = purchase.len(),
        purchase_distinct = purchase_set.len(),
        "normalized identifier columns"
    );

    let matched_rows: Vec<usize> = holdings_ids
        .iter()
        .enumerate()
        .filter_map(|(i, id)| match id {
            Some(id) if purchase_set.contains(id) => Some(i),
            _ => None,
        })
        .collect();

    let filtered_holdings = build_filtered(holdings, &holdings_ids, &matched_rows, config);

    let missing_ids = collect_missing(
        purchase,
        purchase_idx,
        &purchase_ids,
        &holdings_set,
        config,
    );

    let summary = ReconSummary {
        holdings_rows: holdings.len(),
        holdings_absent: holdings_ids.iter().filter(|id| id.is_none()).count(),
        purchase_rows: purchase.len(),
        purchase_absent: purchase_ids.iter().filter(|id| id.is_none()).count(),
        matched_rows: matched_rows.len(),
        missing: missing_ids.len(),
    };

    debug!(
        matched = summary.matched_rows,
        missing = summary.missing,
        "reconciliation finished"
    );

    let missing = if missing_ids.is_empty() {
        MissingReport::AllPresent
    } else {
        MissingReport::Missing(missing_ids)
    };

    Ok(ReconResult {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            holdings_column: holdings.headers[holdings_idx].clone(),
            purchase_column: purchase.headers[purchase_idx].clone(),
        },
        summary,
        filtered_holdings,
        matched_rows,
        missing,
    })
}

/// Copy the matched holdings rows, optionally carrying the normalized
/// identifier along. An existing column with the same name (e.g. when a
/// previous output is fed back in) is overwritten in place.
fn build_filtered(
    holdings: &Table,
    holdings_ids: &[Option<NormalizedId>],
    matched_rows: &[usize],
    config: &ReconConfig,
) -> Table {
    let out = &config.output;
    let width = holdings.column_count();

    let (headers, norm_idx) = if out.include_normalized_column {
        match holdings.headers.iter().position(|h| *h == out.normalized_column) {
            Some(idx) => (holdings.headers.clone(), Some(idx)),
            None => {
                let mut headers = holdings.headers.clone();
                headers.push(out.normalized_column.clone());
                (headers, Some(width))
            }
        }
    } else {
        (holdings.headers.clone(), None)
    };

    let rows = matched_rows
        .iter()
        .map(|&i| {
            let mut row = holdings.rows[i].clone();
            // Ragged input rows come out at full header width
            if row.len() < headers.len() {
                row.resize(headers.len(), RawValue::Missing);
            }
            if let Some(idx) = norm_idx {
                let id = holdings_ids[i]
                    .as_ref()
                    .map(|id| RawValue::Text(id.to_string()))
                    .unwrap_or(RawValue::Missing);
                row[idx] = id;
            }
            row
        })
        .collect();

    Table::new(headers, rows)
}

fn collect_missing(
    purchase: &Table,
    purchase_idx: usize,
    purchase_ids: &[Option<NormalizedId>],
    holdings_set: &HashSet<&NormalizedId>,
    config: &ReconConfig,
) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut missing = Vec::new();

    for (id, raw) in purchase_ids.iter().zip(purchase.column(purchase_idx)) {
        let candidate = match id {
            Some(id) if holdings_set.contains(id) => continue,
            Some(id) => id.to_string(),
            None => match config.missing.absent_in_missing {
                AbsentPolicy::Exclude => continue,
                AbsentPolicy::Report => {
                    let text = canonical_text(raw);
                    if text.is_empty() {
                        continue;
                    }
                    text
                }
            },
        };

        if config.missing.dedupe && !seen.insert(candidate.clone()) {
            continue;
        }
        missing.push(candidate);
    }

    missing
}
