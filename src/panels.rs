//! Grouping of table columns into figure panels, one policy per table type.

use std::collections::BTreeMap;

use crate::columns::{canonical_key, is_time_key, ColumnIndex, ITERATION_KEY};
use crate::table::Table;

pub const MASS_BALANCE_TITLE: &str = "Mass balance errors (%)";

/// Time-series panels in drawing order: title and the canonical keys it collects.
///
/// Synonyms (`drainage`/`water_drainage`, `*_error`/`*_mb_error`) are listed
/// side by side; when a file carries both, both are drawn.
const TIME_SERIES_PANELS: &[(&str, &[&str])] = &[
    (
        "Monitored pressure head at the top and bottom",
        &["htopcm", "hbotcm"],
    ),
    (
        "Aqueous concentrations at the top and bottom",
        &["ctopmgl", "cbotmgl"],
    ),
    (
        "Water Balance",
        &[
            "waterinputcm",
            "etcm",
            "drainagecm",
            "waterdrainagecm",
            "watertotcm",
        ],
    ),
    (
        "PFAS Balance",
        &["pfasinmg", "pfasdecaymg", "pfasdischargemg", "pfastotmg"],
    ),
    (
        MASS_BALANCE_TITLE,
        &["watererror", "watermberror", "pfaserror", "pfasmberror"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Plain,
    /// Gets symmetric y-limits scaled from the largest absolute error.
    MassBalanceError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelGroup {
    pub title: String,
    pub kind: PanelKind,
    /// Original headers, in the panel's key order.
    pub columns: Vec<String>,
}

/// Match the dependent columns of a time-series table against the known panels.
///
/// Panels with no matching column are not emitted; unknown columns are dropped.
pub fn time_series_groups(table: &Table) -> Vec<PanelGroup> {
    let headers = table.headers();
    let index = ColumnIndex::new(headers.iter().skip(1).copied());

    let mut groups = Vec::new();
    for (title, keys) in TIME_SERIES_PANELS {
        let columns: Vec<String> = keys
            .iter()
            .filter_map(|k| index.get(k))
            .map(str::to_string)
            .collect();
        if columns.is_empty() {
            continue;
        }
        let kind = if *title == MASS_BALANCE_TITLE {
            PanelKind::MassBalanceError
        } else {
            PanelKind::Plain
        };
        groups.push(PanelGroup {
            title: title.to_string(),
            kind,
            columns,
        });
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedCell {
    pub cell_id: i64,
    pub column: String,
}

/// One observation panel: a variable and its monitored cells, by ascending id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationGroup {
    pub base: String,
    pub cells: Vec<ObservedCell>,
}

/// Split `<base>-<cell id>` at the last dash. `None` if there is no dash or
/// the suffix is not an integer.
pub fn split_cell_column(name: &str) -> Option<(&str, i64)> {
    let (base, cell) = name.rsplit_once('-')?;
    let cell_id = cell.trim().parse::<i64>().ok()?;
    Some((base, cell_id))
}

/// Cluster observation columns by base name, sorted alphabetically.
pub fn observation_groups(table: &Table) -> Vec<ObservationGroup> {
    let mut by_base: BTreeMap<String, Vec<ObservedCell>> = BTreeMap::new();
    for col in table.columns().iter().skip(1) {
        match split_cell_column(&col.name) {
            Some((base, cell_id)) => by_base.entry(base.to_string()).or_default().push(ObservedCell {
                cell_id,
                column: col.name.clone(),
            }),
            None => log::debug!("Dropping observation column without cell id: {}", col.name),
        }
    }

    by_base
        .into_iter()
        .map(|(base, mut cells)| {
            cells.sort_by_key(|c| c.cell_id);
            ObservationGroup { base, cells }
        })
        .collect()
}

/// Columns of a profile file that get a panel each: everything except the
/// iteration counter, time-like columns and the depth column.
pub fn profile_variables(headers: &[&str], depth_column: &str) -> Vec<String> {
    let depth_key = canonical_key(depth_column);
    headers
        .iter()
        .filter(|h| {
            let key = canonical_key(h);
            key != ITERATION_KEY && !is_time_key(&key) && key != depth_key
        })
        .map(|h| h.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, Column};

    fn table(headers: &[&str]) -> Table {
        Table::from_columns(
            headers
                .iter()
                .map(|h| Column {
                    name: h.to_string(),
                    values: vec![Cell::Number(0.0)],
                })
                .collect(),
        )
    }

    #[test]
    fn time_series_panels_follow_fixed_order() {
        let t = table(&["time", "pfas_in(mg)", "hbot(cm)", "htop(cm)", "unknown"]);
        let groups = time_series_groups(&t);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Monitored pressure head at the top and bottom");
        assert_eq!(groups[0].columns, vec!["htop(cm)", "hbot(cm)"]);
        assert_eq!(groups[1].title, "PFAS Balance");
        assert_eq!(groups[1].columns, vec!["pfas_in(mg)"]);
        assert!(groups.iter().all(|g| g.kind == PanelKind::Plain));
    }

    #[test]
    fn time_series_matching_ignores_case_and_spacing() {
        let t = table(&["Time (d)", "HTop (cm)", " Water_Tot(cm) "]);
        let groups = time_series_groups(&t);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].columns, vec!["HTop (cm)"]);
        assert_eq!(groups[1].columns, vec![" Water_Tot(cm) "]);
    }

    #[test]
    fn synonym_columns_are_both_kept() {
        let t = table(&["time", "water_error(%)", "water_mb_error(%)", "drainage(cm)", "water_drainage(cm)"]);
        let groups = time_series_groups(&t);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].columns, vec!["drainage(cm)", "water_drainage(cm)"]);
        assert_eq!(groups[1].title, MASS_BALANCE_TITLE);
        assert_eq!(groups[1].kind, PanelKind::MassBalanceError);
        assert_eq!(groups[1].columns, vec!["water_error(%)", "water_mb_error(%)"]);
    }

    #[test]
    fn first_column_is_never_grouped() {
        let t = table(&["htop(cm)", "time"]);
        assert!(time_series_groups(&t).is_empty());
    }

    #[test]
    fn observation_columns_cluster_by_base() {
        let t = table(&["time", "Sw-1", "Sw-2", "Cs1-1", "bad"]);
        let groups = observation_groups(&t);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].base, "Cs1");
        assert_eq!(
            groups[0].cells.iter().map(|c| c.cell_id).collect::<Vec<_>>(),
            vec![1]
        );
        assert_eq!(groups[1].base, "Sw");
        assert_eq!(
            groups[1].cells.iter().map(|c| c.cell_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn observation_cells_sorted_numerically() {
        let t = table(&["time", "h-10", "h-2", "h-x", "C-aq-3"]);
        let groups = observation_groups(&t);
        assert_eq!(groups[0].base, "C-aq");
        assert_eq!(groups[1].base, "h");
        let cols: Vec<&str> = groups[1].cells.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(cols, vec!["h-2", "h-10"]);
    }

    #[test]
    fn split_cell_column_rejects_non_integer_suffix() {
        assert_eq!(split_cell_column("Sw-12"), Some(("Sw", 12)));
        assert_eq!(split_cell_column("bad"), None);
        assert_eq!(split_cell_column("Sw-a"), None);
        assert_eq!(split_cell_column("Sw-"), None);
    }

    #[test]
    fn profile_variables_skip_bookkeeping_columns() {
        let headers = ["iprint", "Time (d)", "z(cm)", "h", "Sw", "Cs1"];
        assert_eq!(profile_variables(&headers, "z(cm)"), vec!["h", "Sw", "Cs1"]);
    }

    #[test]
    fn profile_variables_may_be_empty() {
        let headers = ["time", "Depth (cm)"];
        assert!(profile_variables(&headers, "Depth (cm)").is_empty());
    }
}
