use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_backend::DrawingBackend;

use super::canvas::{line_palette, write_figure, Figure, FigureStyle, RenderOptions};
use super::panel::{data_range, draw_panel, Curve, Panel};
use crate::labels::time_series_label;
use crate::layout::LayoutPlan;
use crate::panels::{time_series_groups, PanelGroup, PanelKind};
use crate::table::{load_table, Table};

pub const INPUT_FILE: &str = "2.Time series.csv";
pub const FIGURE_STEM: &str = "Time series";

const PREFERRED_COLS: usize = 2;
const BASE_WIDTH: f64 = 5.5;
const BASE_HEIGHT: f64 = 3.4;
const EXTRA_HEIGHT: f64 = 1.0;

/// Symmetric y-limits for the mass-balance error panel: ten times the largest
/// absolute error, or ±1 when every error is zero.
pub fn error_limits<I: IntoIterator<Item = f64>>(errors: I) -> (f64, f64) {
    let max_err = errors
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, |m, v| m.max(v.abs()));
    let x = if max_err > 0.0 { 10.0 * max_err } else { 1.0 };
    (-x, x)
}

struct TimeSeriesFigure<'a> {
    table: &'a Table,
    time_column: &'a str,
    groups: Vec<PanelGroup>,
    plan: LayoutPlan,
}

impl TimeSeriesFigure<'_> {
    fn panel(&self, index: usize, group: &PanelGroup) -> Panel {
        let time = self.table.numeric(self.time_column).unwrap_or_default();
        let palette = line_palette(group.columns.len());

        let curves: Vec<Curve> = group
            .columns
            .iter()
            .zip(palette)
            .map(|(col, color)| {
                let values = self.table.numeric(col).unwrap_or_default();
                Curve {
                    label: Some(time_series_label(col)),
                    color,
                    points: time.iter().copied().zip(values).collect(),
                }
            })
            .collect();

        let y_range = match group.kind {
            PanelKind::MassBalanceError => {
                let (lo, hi) =
                    error_limits(curves.iter().flat_map(|c| c.points.iter().map(|p| p.1)));
                lo..hi
            }
            PanelKind::Plain => {
                data_range(curves.iter().flat_map(|c| c.points.iter().map(|p| p.1)), 0.05)
            }
        };

        let mut panel = Panel::new(group.title.clone(), data_range(time.iter().copied(), 0.0), y_range);
        panel.curves = curves;
        panel.legend = true;
        if self.plan.is_bottom_row(index) {
            panel.x_desc = Some("Time (d)".to_string());
        }
        panel
    }
}

impl Figure for TimeSeriesFigure<'_> {
    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, style: &FigureStyle) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let cells = root.split_evenly((self.plan.rows, self.plan.cols));
        // Cells past the last panel stay empty.
        for (index, (area, group)) in cells.iter().zip(&self.groups).enumerate() {
            let panel = self.panel(index, group);
            draw_panel(area, &panel, style)
                .with_context(|| format!("Failed to draw panel '{}'", group.title))?;
        }
        Ok(())
    }
}

/// Plot `2.Time series.csv` into `Time series.<ext>`.
///
/// Returns `Ok(None)` when the input is absent or nothing in it is plottable.
pub fn plot_time_series(
    output_dir: &Path,
    figure_dir: &Path,
    opts: RenderOptions,
) -> Result<Option<PathBuf>> {
    let path = output_dir.join(INPUT_FILE);
    if !path.is_file() {
        log::info!("{} not found, skipping time series", path.display());
        return Ok(None);
    }

    let table = load_table(&path)?;
    let Some(time_column) = table.first_column().map(|c| c.name.as_str()) else {
        return Ok(None);
    };
    let groups = time_series_groups(&table);
    if groups.is_empty() {
        log::info!("No known time-series columns in {}, skipping", path.display());
        return Ok(None);
    }

    let plan = LayoutPlan::new(
        groups.len(),
        PREFERRED_COLS,
        BASE_WIDTH,
        BASE_HEIGHT,
        EXTRA_HEIGHT,
    );
    log::info!(
        "Time series: {} panel(s) in a {}x{} grid",
        groups.len(),
        plan.rows,
        plan.cols
    );

    let figure = TimeSeriesFigure {
        table: &table,
        time_column,
        groups,
        plan,
    };
    let written = write_figure(&figure, figure_dir, FIGURE_STEM, plan.pixels(opts.dpi), opts)?;
    log::info!("Wrote {}", written.display());
    Ok(Some(written))
}
