use std::ops::Range;

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::RGBColor;
use plotters_backend::DrawingBackend;

use super::canvas::FigureStyle;

#[derive(Debug, Clone)]
pub struct Curve {
    pub label: Option<String>,
    pub color: RGBColor,
    pub points: Vec<(f64, f64)>,
}

/// Everything needed to draw one subplot.
#[derive(Debug, Clone)]
pub struct Panel {
    pub title: String,
    pub curves: Vec<Curve>,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub x_desc: Option<String>,
    pub y_desc: Option<String>,
    /// Per-panel legend in the upper right corner.
    pub legend: bool,
    /// Curves carry negated y values; ticks print them positive again.
    pub negated_y: bool,
}

impl Panel {
    pub fn new(title: impl Into<String>, x_range: Range<f64>, y_range: Range<f64>) -> Self {
        Self {
            title: title.into(),
            curves: Vec::new(),
            x_range,
            y_range,
            x_desc: None,
            y_desc: None,
            legend: false,
            negated_y: false,
        }
    }
}

pub fn draw_panel<DB>(area: &DrawingArea<DB, Shift>, panel: &Panel, style: &FigureStyle) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let x_area = if panel.x_desc.is_some() { 28.0 } else { 16.0 };
    let y_area = if panel.y_desc.is_some() { 46.0 } else { 36.0 };

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, style.title_font())
        .margin(style.px_u32(6.0))
        .x_label_area_size(style.px_u32(x_area))
        .y_label_area_size(style.px_u32(y_area))
        .build_cartesian_2d(panel.x_range.clone(), panel.y_range.clone())?;

    let negated = panel.negated_y;
    let x_fmt = |v: &f64| format_tick(*v);
    let y_fmt = move |v: &f64| format_tick(if negated { -*v } else { *v });

    {
        let mut mesh = chart.configure_mesh();
        mesh.light_line_style(&BLACK.mix(0.04))
            .bold_line_style(&BLACK.mix(0.12))
            .label_style(style.tick_font())
            .axis_desc_style(style.axis_font())
            .x_labels(6)
            .y_labels(6)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt);
        if let Some(desc) = &panel.x_desc {
            mesh.x_desc(desc.as_str());
        }
        if let Some(desc) = &panel.y_desc {
            mesh.y_desc(desc.as_str());
        }
        mesh.draw()?;
    }

    let width = style.line_width();
    let swatch = style.px(14.0) as i32;
    let mut labelled = false;
    for curve in &panel.curves {
        let color = curve.color;
        for (i, seg) in finite_segments(&curve.points).into_iter().enumerate() {
            let series = chart.draw_series(LineSeries::new(seg, color.stroke_width(width)))?;
            if i > 0 {
                continue;
            }
            if let Some(label) = &curve.label {
                labelled = true;
                series.label(label.as_str()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + swatch, y)], color.stroke_width(width))
                });
            }
        }
    }

    if panel.legend && labelled {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&TRANSPARENT)
            .label_font(style.legend_font())
            .draw()?;
    }
    Ok(())
}

const LEGEND_ROW_PT: f64 = 12.0;

/// Height in pixels of a figure-level legend with `n` entries.
pub fn legend_height(n: usize, ncol: usize, titled: bool, style: &FigureStyle) -> u32 {
    if n == 0 {
        return 0;
    }
    let rows = n.div_ceil(ncol.max(1)) + usize::from(titled);
    (style.px(LEGEND_ROW_PT) * rows as f64 + style.px(8.0)).ceil() as u32
}

/// One legend shared by every panel, centred in `area`.
pub fn draw_shared_legend<DB>(
    area: &DrawingArea<DB, Shift>,
    title: Option<&str>,
    entries: &[(String, RGBColor)],
    ncol: usize,
    style: &FigureStyle,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if entries.is_empty() {
        return Ok(());
    }
    let (w, _) = area.dim_in_pixel();
    let cols = ncol.max(1).min(entries.len());
    let row_h = style.px(LEGEND_ROW_PT);
    let swatch = style.px(18.0);
    let col_w = (w as f64 * 0.9 / cols as f64).min(style.px(80.0));
    let x0 = (w as f64 - col_w * cols as f64) / 2.0;
    let mut y0 = style.px(4.0);

    if let Some(t) = title {
        area.draw(&Text::new(
            t.to_string(),
            ((w / 2) as i32, (y0 + row_h / 2.0) as i32),
            style
                .legend_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        ))?;
        y0 += row_h;
    }

    let width = style.line_width();
    for (i, (label, color)) in entries.iter().enumerate() {
        let (r, c) = (i / cols, i % cols);
        let x = x0 + c as f64 * col_w;
        let y = (y0 + r as f64 * row_h + row_h / 2.0) as i32;
        area.draw(&PathElement::new(
            vec![(x as i32, y), ((x + swatch) as i32, y)],
            color.stroke_width(width),
        ))?;
        area.draw(&Text::new(
            label.clone(),
            ((x + swatch + style.px(4.0)) as i32, y),
            style
                .legend_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Left, VPos::Center)),
        ))?;
    }
    Ok(())
}

/// Padded extent of the finite values; `0..1` when there are none.
pub fn data_range<I: IntoIterator<Item = f64>>(values: I, pad: f64) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let span = hi - lo;
    if span <= f64::EPSILON * lo.abs().max(1.0) {
        let d = if lo == 0.0 { 0.5 } else { lo.abs() * 0.1 };
        return (lo - d)..(hi + d);
    }
    (lo - span * pad)..(hi + span * pad)
}

/// Split a polyline wherever a coordinate is not finite.
pub fn finite_segments(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut cur = Vec::new();
    for &(x, y) in points {
        if x.is_finite() && y.is_finite() {
            cur.push((x, y));
        } else if !cur.is_empty() {
            out.push(std::mem::take(&mut cur));
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

fn format_tick(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let a = v.abs();
    if !(1e-3..1e5).contains(&a) {
        return format!("{v:.1e}");
    }
    let s = format!("{v:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
