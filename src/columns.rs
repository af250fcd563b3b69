//! Header canonicalisation and the depth/time column lookups built on it.
//!
//! Model output headers drift between versions ("z", "z(cm)", " Z ",
//! "Depth (cm)", "Time (d)", ...). Matching is always done on the canonical
//! key; the original header is what gets displayed and indexed.

use std::collections::HashMap;

use crate::error::PlotError;
use crate::table::Table;

/// Canonical keys that name a depth axis outright.
const DEPTH_KEYS: [&str; 4] = ["z", "zcm", "depth", "depthcm"];

/// Canonical key of the iteration counter written into profile files.
pub const ITERATION_KEY: &str = "iprint";

/// Lowercase, trim, and drop every character that is not an ASCII letter or digit.
///
/// `"Depth (cm)"` and `" DEPTH_CM "` both become `"depthcm"`.
pub fn canonical_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

pub fn is_time_key(key: &str) -> bool {
    key.starts_with("time")
}

/// Canonical key -> header as written.
///
/// When two headers share a key (`htop(cm)` and `HTOP (cm)`), the later one
/// wins, matching a plain key/value rebuild of the header row.
#[derive(Debug, Default, Clone)]
pub struct ColumnIndex {
    by_key: HashMap<String, String>,
}

impl ColumnIndex {
    pub fn new<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut by_key = HashMap::new();
        for h in headers {
            by_key.insert(canonical_key(h), h.to_string());
        }
        Self { by_key }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.by_key.get(key).map(String::as_str)
    }
}

/// Resolve the depth column of a profile file.
///
/// Exact synonyms are preferred; otherwise the first header whose key starts
/// with `z` is taken. `file` is only used for the error message.
pub fn find_depth_column<'a, S: AsRef<str>>(
    columns: &'a [S],
    file: &str,
) -> Result<&'a str, PlotError> {
    let exact = columns
        .iter()
        .map(AsRef::as_ref)
        .find(|c| DEPTH_KEYS.contains(&canonical_key(c).as_str()));
    if let Some(c) = exact {
        return Ok(c);
    }

    columns
        .iter()
        .map(AsRef::as_ref)
        .find(|c| canonical_key(c).starts_with('z'))
        .ok_or_else(|| PlotError::MissingDepthColumn {
            file: file.to_string(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        })
}

/// First row of the first time-like column, if it is numeric.
///
/// Only the first time-like column is consulted; if its first value does not
/// convert, the answer is `None` even when a later time-like column would.
pub fn extract_time_value(table: &Table) -> Option<f64> {
    let col = table
        .columns()
        .iter()
        .find(|c| is_time_key(&canonical_key(&c.name)))?;
    col.values.first().and_then(|v| v.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, Column};

    #[test]
    fn canonical_key_strips_case_and_punctuation() {
        assert_eq!(canonical_key("Depth (cm)"), "depthcm");
        assert_eq!(canonical_key(" DEPTH_CM "), "depthcm");
        assert_eq!(canonical_key("water_mb_error(%)"), "watermberror");
        assert_eq!(canonical_key("Time (d)"), "timed");
    }

    #[test]
    fn canonical_key_is_idempotent() {
        for raw in ["Depth (cm)", "  z(cm) ", "Ctop(mg/L)", "Sw-12", "", "__"] {
            let once = canonical_key(raw);
            assert_eq!(canonical_key(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn depth_column_prefers_exact_synonyms() {
        let cols = ["Time(d)", "Z", "h"];
        assert_eq!(find_depth_column(&cols, "p.csv").unwrap(), "Z");

        let cols = ["zeta", "Depth (cm)"];
        assert_eq!(find_depth_column(&cols, "p.csv").unwrap(), "Depth (cm)");
    }

    #[test]
    fn depth_column_falls_back_to_z_prefix() {
        let cols = ["time", "Zone", "val"];
        assert_eq!(find_depth_column(&cols, "p.csv").unwrap(), "Zone");
    }

    #[test]
    fn depth_column_missing_names_file_and_columns() {
        let cols = vec!["a".to_string(), "b".to_string()];
        let err = find_depth_column(&cols, "1.Profile-Time-3.csv").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("1.Profile-Time-3.csv"), "{msg}");
        assert!(msg.contains("\"a\"") && msg.contains("\"b\""), "{msg}");
        assert!(matches!(err, PlotError::MissingDepthColumn { .. }));
    }

    fn table(cols: Vec<(&str, Vec<Cell>)>) -> Table {
        Table::from_columns(
            cols.into_iter()
                .map(|(name, values)| Column {
                    name: name.to_string(),
                    values,
                })
                .collect(),
        )
    }

    #[test]
    fn time_value_from_first_time_like_column() {
        let t = table(vec![
            ("z", vec![Cell::Number(0.0)]),
            ("Time (d)", vec![Cell::Number(12.5)]),
        ]);
        assert_eq!(extract_time_value(&t), Some(12.5));
    }

    #[test]
    fn time_value_absent_or_unconvertible_is_none() {
        let t = table(vec![("z", vec![Cell::Number(0.0)])]);
        assert_eq!(extract_time_value(&t), None);

        let t = table(vec![("time", vec![Cell::Text("n/a".into())])]);
        assert_eq!(extract_time_value(&t), None);

        let t = table(vec![("time", vec![])]);
        assert_eq!(extract_time_value(&t), None);
    }

    #[test]
    fn column_index_maps_keys_to_headers() {
        let idx = ColumnIndex::new(["Htop (cm)", "hbot(cm)"]);
        assert_eq!(idx.get("htopcm"), Some("Htop (cm)"));
        assert_eq!(idx.get("hbotcm"), Some("hbot(cm)"));
        assert_eq!(idx.get("ctopmgl"), None);
    }

    #[test]
    fn column_index_keeps_last_header_on_collision() {
        let idx = ColumnIndex::new(["htop(cm)", "HTOP (cm)", "hbot(cm)"]);
        assert_eq!(idx.get("htopcm"), Some("HTOP (cm)"));
        assert_eq!(idx.get("hbotcm"), Some("hbot(cm)"));
    }
}
