use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::{PlotConfig, Stage};
use crate::render::{plot_observations, plot_profiles, plot_time_series};

/// What a run produced. Stages fail independently of each other.
#[derive(Debug, Default)]
pub struct RunReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<Stage>,
    pub failures: Vec<(Stage, anyhow::Error)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn run_stage(stage: Stage, cfg: &PlotConfig) -> Result<Option<PathBuf>> {
    let (out, fig, opts) = (&cfg.output_dir, &cfg.figure_dir, cfg.render);
    match stage {
        Stage::TimeSeries => plot_time_series(out, fig, opts),
        Stage::Observations => plot_observations(out, fig, opts),
        Stage::Profiles => plot_profiles(out, fig, opts),
    }
}

/// Run every configured stage in order against the configured directories.
pub fn run(cfg: &PlotConfig) -> Result<RunReport> {
    let pool = {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = cfg.threads {
            builder = builder.num_threads(n);
        }
        builder.build().context("Failed to build rayon thread pool")?
    };

    log::info!("Input : {}", cfg.output_dir.display());
    log::info!("Output: {}", cfg.figure_dir.display());
    std::fs::create_dir_all(&cfg.figure_dir).with_context(|| {
        format!("Failed to create figure directory: {}", cfg.figure_dir.display())
    })?;

    let mut report = RunReport::default();
    pool.install(|| {
        for &stage in &cfg.stages {
            match run_stage(stage, cfg) {
                Ok(Some(path)) => report.written.push(path),
                Ok(None) => report.skipped.push(stage),
                Err(e) => {
                    log::error!("{} failed: {e:#}", stage.name());
                    report.failures.push((stage, e));
                }
            }
        }
    });
    Ok(report)
}
