use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::RGBColor;
use plotters_backend::DrawingBackend;

use super::canvas::{line_palette, write_figure, Figure, FigureStyle, RenderOptions};
use super::panel::{data_range, draw_panel, draw_shared_legend, legend_height, Curve, Panel};
use crate::labels::variable_label;
use crate::layout::LayoutPlan;
use crate::panels::{observation_groups, ObservationGroup};
use crate::table::{load_table, Table};

pub const INPUT_FILE: &str = "3.Observations.csv";
pub const FIGURE_STEM: &str = "Monitored cells";

const PREFERRED_COLS: usize = 3;
const BASE_WIDTH: f64 = 4.0;
const BASE_HEIGHT: f64 = 3.0;
const LEGEND_COLS: usize = 6;

struct ObservationFigure<'a> {
    table: &'a Table,
    time_column: &'a str,
    groups: Vec<ObservationGroup>,
    colors: BTreeMap<i64, RGBColor>,
    plan: LayoutPlan,
}

impl<'a> ObservationFigure<'a> {
    fn new(
        table: &'a Table,
        time_column: &'a str,
        groups: Vec<ObservationGroup>,
        plan: LayoutPlan,
    ) -> Self {
        // One colour per cell id, shared by every panel.
        let mut ids: Vec<i64> = groups
            .iter()
            .flat_map(|g| g.cells.iter().map(|c| c.cell_id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        let colors = ids.iter().copied().zip(line_palette(ids.len())).collect();
        Self {
            table,
            time_column,
            groups,
            colors,
            plan,
        }
    }

    fn color(&self, cell_id: i64) -> RGBColor {
        self.colors.get(&cell_id).copied().unwrap_or(RGBColor(0, 0, 0))
    }

    /// Entries of the shared legend, taken from the first panel's cells.
    fn legend_entries(&self) -> Vec<(String, RGBColor)> {
        self.groups
            .first()
            .map(|g| {
                g.cells
                    .iter()
                    .map(|c| (c.cell_id.to_string(), self.color(c.cell_id)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn panel(&self, index: usize, group: &ObservationGroup) -> Panel {
        let time = self.table.numeric(self.time_column).unwrap_or_default();
        let curves: Vec<Curve> = group
            .cells
            .iter()
            .map(|cell| {
                let values = self.table.numeric(&cell.column).unwrap_or_default();
                Curve {
                    label: Some(cell.cell_id.to_string()),
                    color: self.color(cell.cell_id),
                    points: time.iter().copied().zip(values).collect(),
                }
            })
            .collect();

        let y_range = data_range(curves.iter().flat_map(|c| c.points.iter().map(|p| p.1)), 0.05);
        let mut panel = Panel::new(
            variable_label(&group.base),
            data_range(time.iter().copied(), 0.0),
            y_range,
        );
        panel.curves = curves;
        if self.plan.is_bottom_row(index) {
            panel.x_desc = Some("Time (d)".to_string());
        }
        panel
    }
}

impl Figure for ObservationFigure<'_> {
    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, style: &FigureStyle) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let entries = self.legend_entries();
        let (_, h) = root.dim_in_pixel();
        let legend_h = legend_height(entries.len(), LEGEND_COLS, true, style).min(h / 2);
        let (grid, legend) = root.split_vertically(h - legend_h);

        let cells = grid.split_evenly((self.plan.rows, self.plan.cols));
        for (index, (area, group)) in cells.iter().zip(&self.groups).enumerate() {
            let panel = self.panel(index, group);
            draw_panel(area, &panel, style)
                .with_context(|| format!("Failed to draw observation panel '{}'", group.base))?;
        }

        draw_shared_legend(&legend, Some("Cell"), &entries, LEGEND_COLS, style)
    }
}

/// Plot `3.Observations.csv` into `Monitored cells.<ext>`, one panel per variable.
pub fn plot_observations(
    output_dir: &Path,
    figure_dir: &Path,
    opts: RenderOptions,
) -> Result<Option<PathBuf>> {
    let path = output_dir.join(INPUT_FILE);
    if !path.is_file() {
        log::info!("{} not found, skipping observations", path.display());
        return Ok(None);
    }

    let table = load_table(&path)?;
    let Some(time_column) = table.first_column().map(|c| c.name.as_str()) else {
        return Ok(None);
    };
    let groups = observation_groups(&table);
    if groups.is_empty() {
        log::info!("No <variable>-<cell> columns in {}, skipping", path.display());
        return Ok(None);
    }

    let plan = LayoutPlan::new(groups.len(), PREFERRED_COLS, BASE_WIDTH, BASE_HEIGHT, 0.0);
    log::info!(
        "Observations: {} variable(s) in a {}x{} grid",
        groups.len(),
        plan.rows,
        plan.cols
    );

    let figure = ObservationFigure::new(&table, time_column, groups, plan);
    let written = write_figure(&figure, figure_dir, FIGURE_STEM, plan.pixels(opts.dpi), opts)?;
    log::info!("Wrote {}", written.display());
    Ok(Some(written))
}
