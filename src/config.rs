use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};

use crate::render::{FigureFormat, RenderOptions};

pub const DEFAULT_OUTPUT_DIR: &str = "OUTPUT";
pub const DEFAULT_FIGURE_DIR: &str = "FIGURES";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TimeSeries,
    Observations,
    Profiles,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::TimeSeries, Stage::Observations, Stage::Profiles];

    pub fn name(self) -> &'static str {
        match self {
            Stage::TimeSeries => "time-series",
            Stage::Observations => "observations",
            Stage::Profiles => "profiles",
        }
    }
}

impl FromStr for Stage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time-series" | "timeseries" | "ts" => Ok(Stage::TimeSeries),
            "observations" | "obs" => Ok(Stage::Observations),
            "profiles" | "profile" => Ok(Stage::Profiles),
            other => anyhow::bail!(
                "Unknown stage '{other}' (expected time-series, observations or profiles)"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Directory holding the model's output tables.
    pub output_dir: PathBuf,
    /// Directory the figures are written to; created if absent.
    pub figure_dir: PathBuf,
    pub render: RenderOptions,
    /// Rayon worker threads for profile loading.
    pub threads: Option<usize>,
    pub stages: Vec<Stage>,
}

impl PlotConfig {
    pub fn new(output_dir: impl Into<PathBuf>, figure_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            figure_dir: figure_dir.into(),
            render: RenderOptions::default(),
            threads: None,
            stages: Stage::ALL.to_vec(),
        }
    }

    pub fn from_matches(m: &ArgMatches) -> Result<Self> {
        let mut cfg = PlotConfig::new(
            m.get_one::<String>("output-dir")
                .expect("default provided by clap"),
            m.get_one::<String>("figure-dir")
                .expect("default provided by clap"),
        );
        cfg.render.format = m
            .get_one::<String>("format")
            .expect("default provided by clap")
            .parse::<FigureFormat>()?;
        cfg.render.dpi = *m.get_one::<u32>("dpi").expect("default provided by clap");
        if cfg.render.dpi == 0 {
            anyhow::bail!("--dpi must be positive");
        }
        cfg.threads = m.get_one::<usize>("threads").copied();
        if let Some(only) = m.get_one::<String>("only") {
            cfg.stages = only
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(Stage::from_str)
                .collect::<Result<Vec<_>>>()
                .context("Invalid --only")?;
        }
        Ok(cfg)
    }
}

pub fn build_cli() -> Command {
    Command::new("hydroplot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plot time series, monitored cells and depth profiles from model output tables")
        .arg(
            Arg::new("output-dir")
                .help("Directory holding the model output tables")
                .short('i')
                .long("output-dir")
                .value_name("DIR")
                .default_value(DEFAULT_OUTPUT_DIR),
        )
        .arg(
            Arg::new("figure-dir")
                .help("Directory to write figures into (created if absent)")
                .short('o')
                .long("figure-dir")
                .value_name("DIR")
                .default_value(DEFAULT_FIGURE_DIR),
        )
        .arg(
            Arg::new("format")
                .help("Figure format: svg or png")
                .long("format")
                .value_name("FMT")
                .default_value("svg"),
        )
        .arg(
            Arg::new("dpi")
                .help("Pixels per figure inch")
                .long("dpi")
                .value_parser(value_parser!(u32))
                .default_value("100"),
        )
        .arg(
            Arg::new("threads")
                .help("Rayon worker threads (optional)")
                .long("threads")
                .short('T')
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("only")
                .help("Comma-separated stages to run: time-series, observations, profiles")
                .long("only")
                .value_name("STAGES"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<PlotConfig> {
        let m = build_cli().try_get_matches_from(std::iter::once("hydroplot").chain(args.iter().copied()))?;
        PlotConfig::from_matches(&m)
    }

    #[test]
    fn no_arguments_uses_fixed_directories() {
        let cfg = parse(&[]).unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("OUTPUT"));
        assert_eq!(cfg.figure_dir, PathBuf::from("FIGURES"));
        assert_eq!(cfg.render, RenderOptions::default());
        assert_eq!(cfg.stages, Stage::ALL.to_vec());
        assert_eq!(cfg.threads, None);
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = parse(&[
            "-i", "run/out", "-o", "figs", "--format", "png", "--dpi", "150", "-T", "2", "--only",
            "profiles,ts",
        ])
        .unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("run/out"));
        assert_eq!(cfg.figure_dir, PathBuf::from("figs"));
        assert_eq!(cfg.render.format, FigureFormat::Png);
        assert_eq!(cfg.render.dpi, 150);
        assert_eq!(cfg.threads, Some(2));
        assert_eq!(cfg.stages, vec![Stage::Profiles, Stage::TimeSeries]);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse(&["--format", "pdf"]).is_err());
        assert!(parse(&["--only", "maps"]).is_err());
        assert!(parse(&["--dpi", "0"]).is_err());
    }
}
