//! Figure renderers, one per model output table.
//!
//! ```text
//!  table/profile files ─▶ panels (grouping) ─▶ layout ─▶ Figure::draw ─▶ write_figure
//! ```

pub mod canvas;
pub mod observations;
pub mod panel;
pub mod profiles;
pub mod time_series;

pub use canvas::{FigureFormat, RenderOptions};
pub use observations::plot_observations;
pub use profiles::plot_profiles;
pub use time_series::plot_time_series;
