//! Figure scope: backend selection, text fallback, colours and atomic output.

use std::cell::Cell;
use std::fs;
use std::panic;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle, RGBColor};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FigureFormat {
    #[default]
    Svg,
    Png,
}

impl FigureFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FigureFormat::Svg => "svg",
            FigureFormat::Png => "png",
        }
    }
}

impl FromStr for FigureFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(FigureFormat::Svg),
            "png" => Ok(FigureFormat::Png),
            other => anyhow::bail!("Unsupported figure format: {other} (expected svg or png)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: FigureFormat,
    /// Pixels per figure inch.
    pub dpi: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: FigureFormat::Svg,
            dpi: 100,
        }
    }
}

/// Point-based sizes converted to pixels at the figure's resolution.
#[derive(Debug, Clone, Copy)]
pub struct FigureStyle {
    pub dpi: u32,
}

impl FigureStyle {
    pub fn px(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }

    pub fn px_u32(&self, points: f64) -> u32 {
        self.px(points).round().max(1.0) as u32
    }

    pub fn font(&self, points: f64) -> FontDesc<'static> {
        FontDesc::new(FontFamily::SansSerif, self.px(points), FontStyle::Normal)
    }

    pub fn title_font(&self) -> FontDesc<'static> {
        self.font(10.0)
    }

    pub fn axis_font(&self) -> FontDesc<'static> {
        self.font(8.0)
    }

    pub fn tick_font(&self) -> FontDesc<'static> {
        self.font(7.0)
    }

    pub fn legend_font(&self) -> FontDesc<'static> {
        self.font(8.0)
    }

    pub fn line_width(&self) -> u32 {
        self.px_u32(1.2)
    }
}

/// Something that can lay itself out on a blank root area.
pub trait Figure {
    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, style: &FigureStyle) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static;
}

/// Draw `figure` and write it to `<dir>/<stem>.<ext>`.
///
/// The drawing area lives only inside this call. The final file appears only
/// after drawing succeeded; a failed figure leaves nothing behind.
pub fn write_figure<F: Figure>(
    figure: &F,
    dir: &Path,
    stem: &str,
    size: (u32, u32),
    opts: RenderOptions,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create figure directory: {}", dir.display()))?;
    let path = dir.join(format!("{stem}.{}", opts.format.extension()));
    let style = FigureStyle { dpi: opts.dpi };
    log::debug!("Rendering {} at {}x{} px", path.display(), size.0, size.1);

    match opts.format {
        FigureFormat::Svg => {
            let mut svg = String::new();
            {
                let root =
                    FontSafeBackend::new(SVGBackend::with_string(&mut svg, size)).into_drawing_area();
                render(figure, &root, &style)?;
            }
            write_atomic(&path, svg.as_bytes())?;
        }
        FigureFormat::Png => {
            let tmp = dir.join(format!(".{stem}.partial.png"));
            let drawn = (|| -> Result<()> {
                let root = FontSafeBackend::new(BitMapBackend::new(&tmp, size)).into_drawing_area();
                render(figure, &root, &style)
            })();
            if let Err(e) = drawn {
                let _ = fs::remove_file(&tmp);
                return Err(e);
            }
            fs::rename(&tmp, &path)
                .with_context(|| format!("Failed to move figure into place: {}", path.display()))?;
        }
    }
    Ok(path)
}

fn render<F, DB>(figure: &F, root: &DrawingArea<DB, Shift>, style: &FigureStyle) -> Result<()>
where
    F: Figure,
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    figure.draw(root, style)?;
    root.present()?;
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "figure".to_string());
    let tmp = path.with_file_name(format!(".{name}.partial"));
    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to write {}", tmp.display()));
    }
    fs::rename(&tmp, path).with_context(|| format!("Failed to write {}", path.display()))
}

/// `n` distinguishable line colours with evenly spaced hues.
pub fn line_palette(n: usize) -> Vec<RGBColor> {
    (0..n)
        .map(|i| {
            let hue = (i as f64 / n as f64) * 360.0;
            hsl_to_rgb(hue + 210.0, 0.65, 0.45)
        })
        .collect()
}

/// Minimal HSL -> RGB conversion returning a Plotters RGBColor
fn hsl_to_rgb(h: f64, s: f64, l: f64) -> RGBColor {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h_prime = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());
    let (r1, g1, b1) = if (0.0..1.0).contains(&h_prime) {
        (c, x, 0.0)
    } else if (1.0..2.0).contains(&h_prime) {
        (x, c, 0.0)
    } else if (2.0..3.0).contains(&h_prime) {
        (0.0, c, x)
    } else if (3.0..4.0).contains(&h_prime) {
        (0.0, x, c)
    } else if (4.0..5.0).contains(&h_prime) {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };
    let m = l - c / 2.0;
    let (r, g, b) = (r1 + m, g1 + m, b1 + m);
    RGBColor(
        (r.clamp(0.0, 1.0) * 255.0).round() as u8,
        (g.clamp(0.0, 1.0) * 255.0).round() as u8,
        (b.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

/// Backend wrapper that keeps a figure alive when no system font can be loaded.
///
/// Text measurement falls back to an estimate from the font size; text that
/// cannot be rasterised is left out.
pub struct FontSafeBackend<DB> {
    inner: DB,
    warned: Cell<bool>,
}

impl<DB> FontSafeBackend<DB> {
    pub fn new(inner: DB) -> Self {
        Self {
            inner,
            warned: Cell::new(false),
        }
    }

    fn warn_once(&self) {
        if !self.warned.replace(true) {
            log::warn!("No usable font found; text layout is approximated");
        }
    }
}

fn approx_text_size(text: &str, size: f64) -> (u32, u32) {
    let n = text.chars().count() as f64;
    ((n * size * 0.6).ceil() as u32, size.ceil() as u32)
}

impl<DB: DrawingBackend> DrawingBackend for FontSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.fill_polygon(vert, style)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let inner = &mut self.inner;
        match panic::catch_unwind(panic::AssertUnwindSafe(|| inner.draw_text(text, style, pos))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(DrawingErrorKind::DrawingError(e))) => Err(DrawingErrorKind::DrawingError(e)),
            _ => {
                self.warn_once();
                Ok(())
            }
        }
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        match panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.inner.estimate_text_size(text, style)
        })) {
            Ok(Ok(size)) => Ok(size),
            _ => {
                self.warn_once();
                Ok(approx_text_size(text, style.size()))
            }
        }
    }
}
