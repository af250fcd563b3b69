use std::fs;
use std::path::Path;

use hydroplot::render::FigureFormat;
use hydroplot::{run, PlotConfig, PlotError, Stage};
use tempfile::TempDir;

fn setup(files: &[(&str, &str)]) -> (TempDir, PlotConfig) {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("OUTPUT");
    fs::create_dir_all(&out).unwrap();
    for (name, body) in files {
        fs::write(out.join(name), body).unwrap();
    }
    let cfg = PlotConfig::new(out, tmp.path().join("FIGURES"));
    (tmp, cfg)
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

const TIME_SERIES: &str = "time, htop(cm), hbot(cm)\n0, -10, -20\n1, -11, -21\n2, -12, -19\n";

const OBSERVATIONS: &str = "time Sw-1 Sw-2 Cs1-1 bad\n0 0.5 0.6 0.0 1\n1 0.55 0.62 0.1 2\n";

const PROFILE_1: &str = "iprint,time(d),z(cm),h,Sw\n1,1,0,-10,0.4\n1,1,50,-20,0.5\n1,1,100,-30,0.6\n";
const PROFILE_2: &str = "iprint,Time (d),Z,h,Sw\n2,5,0,-5,0.45\n2,5,50,-15,0.55\n2,5,100,-25,0.65\n";

#[test]
fn only_time_series_input_gives_only_time_series_figure() {
    let (_tmp, cfg) = setup(&[("2.Time series.csv", TIME_SERIES)]);
    let report = run(&cfg).unwrap();

    assert!(report.is_success());
    assert_eq!(listing(&cfg.figure_dir), vec!["Time series.svg"]);
    assert_eq!(report.written.len(), 1);
    assert_eq!(report.skipped, vec![Stage::Observations, Stage::Profiles]);

    let svg = fs::read_to_string(cfg.figure_dir.join("Time series.svg")).unwrap();
    assert!(svg.starts_with("<svg"));
}

#[test]
fn empty_output_directory_writes_nothing() {
    let (_tmp, cfg) = setup(&[]);
    let report = run(&cfg).unwrap();
    assert!(report.is_success());
    assert!(report.written.is_empty());
    assert!(listing(&cfg.figure_dir).is_empty());
}

#[test]
fn all_three_figures() {
    let (_tmp, cfg) = setup(&[
        ("2.Time series.csv", TIME_SERIES),
        ("3.Observations.csv", OBSERVATIONS),
        ("1.Profile-Time-1.csv", PROFILE_1),
        ("1.Profile-Time-5.csv", PROFILE_2),
    ]);
    let report = run(&cfg).unwrap();
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(
        listing(&cfg.figure_dir),
        vec!["Monitored cells.svg", "Profiles.svg", "Time series.svg"]
    );
}

#[test]
fn unplottable_tables_are_skipped() {
    let (_tmp, cfg) = setup(&[
        ("2.Time series.csv", "time,runoff(cm)\n0,1\n"),
        ("3.Observations.csv", "time,bad,alsobad-x\n0,1,2\n"),
        ("1.Profile-Time-1.csv", "time,z\n1,0\n"),
    ]);
    let report = run(&cfg).unwrap();
    assert!(report.is_success());
    assert!(report.written.is_empty());
    assert_eq!(report.skipped.len(), 3);
}

#[test]
fn missing_depth_column_fails_only_the_profile_figure() {
    let (_tmp, cfg) = setup(&[
        ("2.Time series.csv", TIME_SERIES),
        ("1.Profile-Time-1.csv", PROFILE_1),
        ("1.Profile-Time-2.csv", "time,a,b\n2,1,2\n"),
    ]);
    let report = run(&cfg).unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    let (stage, err) = &report.failures[0];
    assert_eq!(*stage, Stage::Profiles);
    let depth_err = err
        .chain()
        .find_map(|e| e.downcast_ref::<PlotError>())
        .expect("typed error in chain");
    match depth_err {
        PlotError::MissingDepthColumn { file, columns } => {
            assert_eq!(file, "1.Profile-Time-2.csv");
            assert_eq!(columns, &vec!["time".to_string(), "a".into(), "b".into()]);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(listing(&cfg.figure_dir), vec!["Time series.svg"]);
}

#[test]
fn later_profile_missing_a_variable_fails_the_profile_figure() {
    let (_tmp, cfg) = setup(&[
        ("2.Time series.csv", TIME_SERIES),
        ("1.Profile-Time-1.csv", PROFILE_1),
        ("1.Profile-Time-2.csv", "time,z,h\n2,0,-5\n2,50,-15\n"),
    ]);
    let report = run(&cfg).unwrap();

    assert_eq!(report.failures.len(), 1);
    let (stage, err) = &report.failures[0];
    assert_eq!(*stage, Stage::Profiles);
    match err.chain().find_map(|e| e.downcast_ref::<PlotError>()) {
        Some(PlotError::MissingProfileVariable { file, column }) => {
            assert_eq!(file, "1.Profile-Time-2.csv");
            assert_eq!(column, "Sw");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(listing(&cfg.figure_dir), vec!["Time series.svg"]);
}

#[test]
fn repeated_runs_are_identical() {
    let (_tmp, cfg) = setup(&[
        ("2.Time series.csv", TIME_SERIES),
        ("3.Observations.csv", OBSERVATIONS),
        ("1.Profile-Time-1.csv", PROFILE_1),
    ]);
    run(&cfg).unwrap();
    let first: Vec<Vec<u8>> = listing(&cfg.figure_dir)
        .iter()
        .map(|n| fs::read(cfg.figure_dir.join(n)).unwrap())
        .collect();
    run(&cfg).unwrap();
    let second: Vec<Vec<u8>> = listing(&cfg.figure_dir)
        .iter()
        .map(|n| fs::read(cfg.figure_dir.join(n)).unwrap())
        .collect();
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[test]
fn stages_can_be_selected() {
    let (_tmp, mut cfg) = setup(&[
        ("2.Time series.csv", TIME_SERIES),
        ("3.Observations.csv", OBSERVATIONS),
    ]);
    cfg.stages = vec![Stage::Observations];
    let report = run(&cfg).unwrap();
    assert!(report.is_success());
    assert_eq!(listing(&cfg.figure_dir), vec!["Monitored cells.svg"]);
}

#[test]
fn png_output() {
    let (_tmp, mut cfg) = setup(&[("2.Time series.csv", TIME_SERIES)]);
    cfg.render.format = FigureFormat::Png;
    cfg.render.dpi = 40;
    let report = run(&cfg).unwrap();
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(listing(&cfg.figure_dir), vec!["Time series.png"]);
    let bytes = fs::read(cfg.figure_dir.join("Time series.png")).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}
