//! Identifier normalization: raw cell values in, canonical join keys out.

use crate::config::NormalizeConfig;
use crate::model::{NormalizedId, RawValue};

/// Characters dropped from identifiers: ASCII hyphen-minus plus the Unicode
/// hyphens that show up in copy-pasted ISBNs.
const HYPHENS: [char; 3] = ['-', '\u{2010}', '\u{2011}'];

/// Turns raw identifier cells into `NormalizedId`s.
///
/// Never fails on a single value: anything is coerced to text first. Values
/// that end up empty or equal to an absent marker map to `None`.
#[derive(Debug, Clone)]
pub struct Normalizer {
    absent_markers: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&NormalizeConfig::default())
    }
}

impl Normalizer {
    pub fn new(config: &NormalizeConfig) -> Self {
        Self {
            // Markers go through the same canonical form as the values they
            // are compared with, so "n-a" matches "n-a" and "N/A " matches "N/A".
            absent_markers: config
                .absent_markers
                .iter()
                .map(|m| canonical_str(m).to_ascii_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// Normalize one value.
    pub fn normalize(&self, value: &RawValue) -> Option<NormalizedId> {
        let text = canonical_text(value);
        if self.is_absent_text(&text) {
            None
        } else {
            Some(NormalizedId::new(text))
        }
    }

    /// Normalize a column. Output is parallel to the input.
    pub fn normalize_column<'a, I>(&self, values: I) -> Vec<Option<NormalizedId>>
    where
        I: IntoIterator<Item = &'a RawValue>,
    {
        values.into_iter().map(|v| self.normalize(v)).collect()
    }

    /// True when already-canonical text counts as "no identifier".
    pub fn is_absent_text(&self, text: &str) -> bool {
        text.is_empty()
            || self
                .absent_markers
                .iter()
                .any(|m| m.eq_ignore_ascii_case(text))
    }
}

/// Canonical text form of a value, before the absent check.
///
/// Numbers are formatted from their type (integral floats lose the `.0`),
/// text has hyphens removed, a float-style `.0` suffix on an all-digit stem
/// stripped, and surrounding whitespace trimmed.
pub fn canonical_text(value: &RawValue) -> String {
    match value {
        RawValue::Missing => String::new(),
        RawValue::Text(s) => canonical_str(s),
        other => canonical_str(&other.to_string()),
    }
}

pub(crate) fn canonical_str(raw: &str) -> String {
    let dehyphenated: String = raw.chars().filter(|c| !HYPHENS.contains(c)).collect();
    strip_float_suffix(dehyphenated.trim()).trim().to_string()
}

/// `"9783161484100.0"` → `"9783161484100"`. Anything whose stem is not
/// purely digits (`"v1.0"`, `"1.0.0"`) is left alone.
fn strip_float_suffix(s: &str) -> &str {
    match s.strip_suffix(".0") {
        Some(stem) if !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()) => stem,
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> Option<String> {
        Normalizer::default()
            .normalize(&RawValue::Text(s.into()))
            .map(NormalizedId::into_string)
    }

    #[test]
    fn hyphens_are_removed() {
        assert_eq!(norm("978-3-16-148410-0"), Some("9783161484100".into()));
        assert_eq!(norm("978-3-16-148410-0"), norm("9783161484100"));
        assert_eq!(norm("978\u{2010}3\u{2011}16"), Some("978316".into()));
    }

    #[test]
    fn float_suffix_only_stripped_from_digit_stems() {
        assert_eq!(norm("9783161484100.0"), Some("9783161484100".into()));
        assert_eq!(norm("978-3-16-148410-0.0"), Some("9783161484100".into()));
        assert_eq!(norm("v1.0"), Some("v1.0".into()));
        assert_eq!(norm("1.0.0"), Some("1.0.0".into()));
        // The legacy replace-all approach turned this into "105".
        assert_eq!(norm("10.05"), Some("10.05".into()));
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(norm("  9783161484100\t"), Some("9783161484100".into()));
        assert_eq!(norm(" 9783161484100.0 "), Some("9783161484100".into()));
    }

    #[test]
    fn absent_values() {
        for s in ["", "   ", "0", "nan", "NaN", " nan ", "0.0", "-", "--0--"] {
            assert_eq!(norm(s), None, "{s:?} should be absent");
        }
        let n = Normalizer::default();
        assert_eq!(n.normalize(&RawValue::Missing), None);
        assert_eq!(n.normalize(&RawValue::Float(f64::NAN)), None);
        assert_eq!(n.normalize(&RawValue::Int(0)), None);
    }

    #[test]
    fn typed_numbers_format_without_fraction() {
        let n = Normalizer::default();
        assert_eq!(
            n.normalize(&RawValue::Float(9780134685991.0)).map(NormalizedId::into_string),
            Some("9780134685991".into())
        );
        assert_eq!(
            n.normalize(&RawValue::Int(9780134685991)).map(NormalizedId::into_string),
            Some("9780134685991".into())
        );
    }

    #[test]
    fn isbn10_with_check_letter_and_leading_zero_survive() {
        assert_eq!(norm("0-306-40615-X"), Some("030640615X".into()));
        assert_eq!(norm("0306406152"), Some("0306406152".into()));
    }

    #[test]
    fn custom_markers_replace_defaults() {
        let n = Normalizer::new(&NormalizeConfig {
            absent_markers: vec!["N/A".into()],
        });
        assert_eq!(n.normalize(&RawValue::Text("n/a".into())), None);
        assert!(n.normalize(&RawValue::Text("0".into())).is_some());
        assert_eq!(n.normalize(&RawValue::Text(" ".into())), None);
    }

    #[test]
    fn spreadsheet_null_spellings_are_absent() {
        for s in ["#N/A", "N/A", "n/a", "NA", "<NA>", "NULL", "null", "None", "-NaN", "#N/A N/A", "1.#IND"] {
            assert_eq!(norm(s), None, "{s:?} should be absent");
        }
        assert_eq!(norm("NAB-123"), Some("NAB123".into()));
    }

    #[test]
    fn hyphenated_markers_match_hyphenated_values() {
        let n = Normalizer::new(&NormalizeConfig {
            absent_markers: vec!["n-a".into(), " unknown ".into()],
        });
        assert_eq!(n.normalize(&RawValue::Text("N-A".into())), None);
        assert_eq!(n.normalize(&RawValue::Text("na".into())), None);
        assert_eq!(n.normalize(&RawValue::Text("UNKNOWN".into())), None);
    }

    #[test]
    fn column_output_is_parallel() {
        let values = vec![
            RawValue::Text("978-0-13-468599-1".into()),
            RawValue::Text("0".into()),
            RawValue::Missing,
            RawValue::Float(9783161484100.0),
        ];
        let out = Normalizer::default().normalize_column(&values);
        assert_eq!(out.len(), values.len());
        assert_eq!(out[0].as_ref().map(NormalizedId::as_str), Some("9780134685991"));
        assert!(out[1].is_none());
        assert!(out[2].is_none());
        assert_eq!(out[3].as_ref().map(NormalizedId::as_str), Some("9783161484100"));
    }
}
