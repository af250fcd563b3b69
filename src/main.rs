use anyhow::Result;

use hydroplot::config::{build_cli, PlotConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match real_main() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            log::error!("{e:?}");
            std::process::exit(1);
        }
    }
}

/// `Ok(false)` when at least one figure failed.
fn real_main() -> Result<bool> {
    let matches = build_cli().get_matches();
    let cfg = PlotConfig::from_matches(&matches)?;

    let report = hydroplot::run(&cfg)?;
    for path in &report.written {
        log::info!("[OK] {}", path.display());
    }
    for stage in &report.skipped {
        log::info!("Skipped {}", stage.name());
    }
    Ok(report.is_success())
}
