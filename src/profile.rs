use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::Regex;

use crate::columns::{extract_time_value, find_depth_column};
use crate::labels::format_general;
use crate::table::{load_table, Table};

/// One depth profile: its table, resolved depth column and snapshot time.
#[derive(Debug, Clone)]
pub struct Profile {
    pub table: Table,
    pub depth_column: String,
    pub time: Option<f64>,
}

impl Profile {
    /// Resolve depth and time for a loaded table. A missing depth column is fatal.
    pub fn from_table(table: Table) -> Result<Self> {
        let depth_column = {
            let headers = table.headers();
            find_depth_column(&headers, &table.source_name())?.to_string()
        };
        let time = extract_time_value(&table);
        Ok(Self {
            table,
            depth_column,
            time,
        })
    }

    pub fn depths(&self) -> Vec<f64> {
        self.table.numeric(&self.depth_column).unwrap_or_default()
    }

    /// Largest finite depth, if any.
    pub fn max_depth(&self) -> Option<f64> {
        self.depths()
            .into_iter()
            .filter(|d| d.is_finite())
            .fold(None, |acc, d| Some(acc.map_or(d, |m: f64| m.max(d))))
    }

    /// Legend text, `None` when the file carries no usable time.
    pub fn label(&self) -> Option<String> {
        self.time.map(|t| format!("t={} d", format_general(t)))
    }
}

/// Chronological key: the `<N>` of `Profile-Time-<N>`, or 0 when absent.
pub fn profile_sort_key(file_name: &str, re: &Regex) -> u64 {
    re.captures(file_name)
        .and_then(|c| c[1].parse::<u64>().ok())
        .unwrap_or(0)
}

/// All `1.Profile-Time-*.csv` files in `dir`, ordered by their time index.
pub fn discover_profiles(dir: &Path) -> Result<Vec<PathBuf>> {
    let re_name = Regex::new(r"^1\.Profile-Time-.*\.csv$").expect("invalid regex");
    let re_index = Regex::new(r"Profile-Time-(\d+)").expect("invalid regex");

    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found: Vec<(String, PathBuf)> = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if re_name.is_match(&name) && entry.path().is_file() {
            found.push((name, entry.path()));
        }
    }

    // read_dir order is unspecified; sort by name first so ties are stable.
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found.sort_by_key(|(name, _)| profile_sort_key(name, &re_index));
    Ok(found.into_iter().map(|(_, p)| p).collect())
}

/// Load and resolve every profile file, in parallel, keeping input order.
pub fn load_profiles(paths: &[PathBuf]) -> Result<Vec<Profile>> {
    paths
        .par_iter()
        .map(|p| load_table(p).and_then(Profile::from_table))
        .collect()
}
