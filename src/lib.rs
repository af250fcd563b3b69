//! Figures for hydrological / solute-transport model output.
//!
//! Reads `2.Time series.csv`, `3.Observations.csv` and `1.Profile-Time-<N>.csv`
//! from an output directory and writes one faceted figure per table type.

pub mod columns;
pub mod config;
pub mod error;
pub mod labels;
pub mod layout;
pub mod panels;
pub mod pipeline;
pub mod profile;
pub mod render;
pub mod table;

pub use config::{PlotConfig, Stage};
pub use error::PlotError;
pub use pipeline::{run, RunReport};
