//! Display names for plotted quantities. Lookups only; nothing here is mutated.

use crate::columns::canonical_key;

/// Time-series legend entries, keyed by canonical column key.
const TIME_SERIES_LABELS: &[(&str, &str)] = &[
    ("htopcm", "h_top (cm)"),
    ("hbotcm", "h_bottom (cm)"),
    ("ctopmgl", "Porewater C (top) (mg/L)"),
    ("cbotmgl", "Porewater C (bottom) (mg/L)"),
    ("waterinputcm", "Water input (cm)"),
    ("etcm", "ET (cm)"),
    ("drainagecm", "Drainage (cm)"),
    ("waterdrainagecm", "Drainage (cm)"),
    ("watertotcm", "Total amount of water in the domain (cm)"),
    ("pfasinmg", "PFAS input (mg)"),
    ("pfasdecaymg", "PFAS Decay (mg)"),
    ("pfasdischargemg", "PFAS discharged from the outlet (mg)"),
    ("pfastotmg", "Total amount of PFAS in the domain (mg)"),
    ("watererror", "MB Err water (%)"),
    ("watermberror", "MB Err water (%)"),
    ("pfaserror", "MB Err PFAS (%)"),
    ("pfasmberror", "MB Err PFAS (%)"),
];

/// Profile and observation variables, keyed by the lowercased name without units.
const VARIABLE_LABELS: &[(&str, &str)] = &[
    ("aaw", "A_aw (cm²/cm³)"),
    ("caw1", "C_aw,1 (mg/cm³)"),
    ("caw2", "C_aw,2 (mg/cm³)"),
    ("cs1", "C_s,1 (mg/g)"),
    ("cs2", "C_s,2 (mg/g)"),
    ("ctot", "C_tot (mg/cm³)"),
    ("sw", "S_w (-)"),
    ("h", "h (cm)"),
    ("th", "θ (cm³/cm³)"),
    ("c", "C (mg/L)"),
];

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Legend text for a time-series column; the raw header when unmapped.
pub fn time_series_label(column: &str) -> String {
    lookup(TIME_SERIES_LABELS, &canonical_key(column))
        .map(str::to_string)
        .unwrap_or_else(|| column.to_string())
}

/// Panel title for a profile or observation variable; the raw name when unmapped.
///
/// A trailing unit such as `"(mg/L)"` is ignored for the lookup.
pub fn variable_label(name: &str) -> String {
    let base = name.split('(').next().unwrap_or(name).trim();
    lookup(VARIABLE_LABELS, &base.to_lowercase())
        .map(str::to_string)
        .unwrap_or_else(|| name.to_string())
}

/// Number in the style of C's `%g`: six significant digits, trailing zeros
/// dropped, exponent form when the decimal exponent is below -4 or at least 6.
pub fn format_general(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return v.to_string();
    }
    // `{:e}` already rounds to six significant digits, so its exponent is final.
    let sci = format!("{v:.5e}");
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };
    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs());
    }
    let decimals = (5 - exp).max(0) as usize;
    trim_fraction(&format!("{v:.decimals$}")).to_string()
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
