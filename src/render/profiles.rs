use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::RGBColor;
use plotters_backend::DrawingBackend;

use super::canvas::{line_palette, write_figure, Figure, FigureStyle, RenderOptions};
use super::panel::{data_range, draw_panel, draw_shared_legend, legend_height, Curve, Panel};
use crate::error::PlotError;
use crate::labels::variable_label;
use crate::layout::LayoutPlan;
use crate::panels::profile_variables;
use crate::profile::{discover_profiles, load_profiles, Profile};

pub const FIGURE_STEM: &str = "Profiles";

const PREFERRED_COLS: usize = 3;
const BASE_WIDTH: f64 = 4.0;
const BASE_HEIGHT: f64 = 3.2;
const EXTRA_HEIGHT: f64 = 1.0;
const LEGEND_COLS: usize = 4;

/// Shared vertical range, in negated depth so that 0 sits on top.
fn depth_range(profiles: &[Profile]) -> Range<f64> {
    let max_depth = profiles
        .iter()
        .filter_map(Profile::max_depth)
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.max(d))));
    match max_depth {
        Some(m) if m > 0.0 => -m..0.0,
        _ => data_range(profiles.iter().flat_map(|p| p.depths()).map(|d| -d), 0.05),
    }
}

/// Every profile file must carry every variable taken from the first one.
fn check_variables(profiles: &[Profile], variables: &[String]) -> Result<(), PlotError> {
    for profile in profiles {
        if let Some(var) = variables.iter().find(|v| profile.table.column(v).is_none()) {
            return Err(PlotError::MissingProfileVariable {
                file: profile.table.source_name(),
                column: var.clone(),
            });
        }
    }
    Ok(())
}

struct ProfileFigure<'a> {
    profiles: &'a [Profile],
    variables: Vec<String>,
    colors: Vec<RGBColor>,
    depth_range: Range<f64>,
    plan: LayoutPlan,
}

impl<'a> ProfileFigure<'a> {
    fn new(profiles: &'a [Profile], variables: Vec<String>, plan: LayoutPlan) -> Self {
        Self {
            profiles,
            variables,
            colors: line_palette(profiles.len()),
            depth_range: depth_range(profiles),
            plan,
        }
    }

    fn curves(&self, variable: &str) -> Vec<Curve> {
        self.profiles
            .iter()
            .zip(&self.colors)
            .filter_map(|(profile, color)| {
                let values = profile.table.numeric(variable)?;
                let points = values
                    .into_iter()
                    .zip(profile.depths())
                    .map(|(v, z)| (v, -z))
                    .collect();
                Some(Curve {
                    label: profile.label(),
                    color: *color,
                    points,
                })
            })
            .collect()
    }

    /// Legend keyed by time, from the first panel; profiles without a time are left out.
    fn legend_entries(&self) -> Vec<(String, RGBColor)> {
        self.variables
            .first()
            .map(|v| {
                self.curves(v)
                    .into_iter()
                    .filter_map(|c| c.label.map(|l| (l, c.color)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn panel(&self, index: usize, variable: &str) -> Panel {
        let curves = self.curves(variable);
        let x_range = data_range(curves.iter().flat_map(|c| c.points.iter().map(|p| p.0)), 0.05);
        let mut panel = Panel::new(variable_label(variable), x_range, self.depth_range.clone());
        panel.curves = curves;
        panel.negated_y = true;
        if self.plan.is_first_col(index) {
            panel.y_desc = Some("Depth (cm)".to_string());
        }
        panel
    }
}

impl Figure for ProfileFigure<'_> {
    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, style: &FigureStyle) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let entries = self.legend_entries();
        let (_, h) = root.dim_in_pixel();
        let legend_h = legend_height(entries.len(), LEGEND_COLS, false, style).min(h / 2);
        let (grid, legend) = root.split_vertically(h - legend_h);

        let cells = grid.split_evenly((self.plan.rows, self.plan.cols));
        for (index, (area, variable)) in cells.iter().zip(&self.variables).enumerate() {
            let panel = self.panel(index, variable);
            draw_panel(area, &panel, style)
                .with_context(|| format!("Failed to draw profile panel '{variable}'"))?;
        }

        draw_shared_legend(&legend, None, &entries, LEGEND_COLS, style)
    }
}

/// Plot every `1.Profile-Time-<N>.csv` into `Profiles.<ext>`, one panel per variable.
///
/// A profile file without a resolvable depth column, or without one of the
/// first file's variables, fails the whole figure.
pub fn plot_profiles(
    output_dir: &Path,
    figure_dir: &Path,
    opts: RenderOptions,
) -> Result<Option<PathBuf>> {
    let files = discover_profiles(output_dir)?;
    if files.is_empty() {
        log::info!("No profile files in {}, skipping profiles", output_dir.display());
        return Ok(None);
    }
    log::info!("Profiles: {} file(s)", files.len());

    let profiles = load_profiles(&files).context("Failed to load profile files")?;
    let Some(first) = profiles.first() else {
        return Ok(None);
    };

    let variables = profile_variables(&first.table.headers(), &first.depth_column);
    if variables.is_empty() {
        log::info!("No plottable profile variables in {}, skipping", first.table.source_name());
        return Ok(None);
    }
    check_variables(&profiles, &variables)?;

    let plan = LayoutPlan::new(
        variables.len(),
        PREFERRED_COLS,
        BASE_WIDTH,
        BASE_HEIGHT,
        EXTRA_HEIGHT,
    );
    log::info!(
        "Profiles: {} variable(s) in a {}x{} grid",
        variables.len(),
        plan.rows,
        plan.cols
    );

    let figure = ProfileFigure::new(&profiles, variables, plan);
    let written = write_figure(&figure, figure_dir, FIGURE_STEM, plan.pixels(opts.dpi), opts)?;
    log::info!("Wrote {}", written.display());
    Ok(Some(written))
}
