use std::fs;
use std::path::PathBuf;

use gamelog_trends::config::AppConfig;
use gamelog_trends::game_log::{self, Location, Metric};
use gamelog_trends::report;
use gamelog_trends::team_results::Outcome;

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "gamelog_trends_{tag}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn fixture_config() -> AppConfig {
    AppConfig {
        player_csv: fixture("player_game_log_raw.csv"),
        team_csv: Some(fixture("team_schedule.csv")),
        player_name: "Test Guard".to_string(),
        ..AppConfig::default()
    }
}

fn approx(a: Option<f64>, b: f64) -> bool {
    a.is_some_and(|a| (a - b).abs() < 1e-9)
}

#[test]
fn raw_log_is_cleaned_on_load() {
    let loaded = report::load_log(&fixture_config()).expect("fixture loads");

    let clean = loaded.clean.expect("raw input gets cleaned");
    assert_eq!(clean.rows_in, 10);
    assert_eq!(clean.missing_points, 1);
    assert_eq!(clean.kept, 9);

    let dates = loaded
        .records
        .iter()
        .map(|r| r.date.to_string())
        .collect::<Vec<_>>();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);

    let away = loaded
        .records
        .iter()
        .filter(|r| r.location == Location::Away)
        .count();
    assert_eq!(away, 4);
}

#[test]
fn team_results_attach_by_date() {
    let loaded = report::load_log(&fixture_config()).expect("fixture loads");
    assert_eq!(loaded.outcomes_matched, Some(8));

    let unmatched = loaded
        .records
        .iter()
        .find(|r| r.outcome.is_none())
        .expect("one game is missing from the schedule");
    assert_eq!(unmatched.opponent, "ORL");

    let wins = loaded
        .records
        .iter()
        .filter(|r| r.outcome == Some(Outcome::Win))
        .count();
    assert_eq!(wins, 4);
}

#[test]
fn report_splits_and_streaks() {
    let cfg = fixture_config();
    let loaded = report::load_log(&cfg).expect("fixture loads");
    let report = report::build_report(&cfg, &loaded);

    assert_eq!(report.games, 9);

    let home = report.location.group("Home").expect("home group");
    let away = report.location.group("Away").expect("away group");
    assert_eq!(home.games, 5);
    assert!(approx(home.mean_of(Metric::Points), 18.4));
    assert!(approx(away.mean_of(Metric::Points), 19.75));

    let outcomes = report.outcomes.as_ref().expect("team csv configured");
    let wins = outcomes.group("Win").expect("win group");
    let losses = outcomes.group("Loss").expect("loss group");
    assert!(approx(wins.mean_of(Metric::Points), 23.0));
    assert!(approx(losses.mean_of(Metric::Points), 12.25));

    let spans = report
        .streaks
        .iter()
        .map(|s| (s.start, s.end, s.first_date.to_string(), s.last_date.to_string()))
        .collect::<Vec<_>>();
    assert_eq!(
        spans,
        vec![
            (1, 3, "2023-10-27".to_string(), "2023-10-30".to_string()),
            (5, 7, "2023-11-06".to_string(), "2023-11-10".to_string()),
        ]
    );

    let r = report
        .correlation
        .get(Metric::Points, Metric::PlusMinus)
        .expect("points and plus/minus vary");
    assert!(r > 0.5);

    assert!(report.efficiency_correlation.metrics.contains(&Metric::ThreePointPct));
    let ft = report
        .efficiency_correlation
        .get(Metric::FreeThrowPct, Metric::FreeThrowAttempts)
        .expect("free throw columns are numeric in the fixture");
    assert!((-1.0..=1.0).contains(&ft));
    assert!(
        report
            .efficiency_correlation
            .get(Metric::ThreePointPct, Metric::Points)
            .is_some()
    );
}

#[test]
fn outputs_are_written() {
    let mut cfg = fixture_config();
    cfg.out_dir = scratch_dir("outputs");
    let loaded = report::load_log(&cfg).expect("fixture loads");
    let report = report::build_report(&cfg, &loaded);

    let (json_path, xlsx_path) =
        report::write_outputs(&report, &cfg.out_dir).expect("outputs written");

    let raw = fs::read_to_string(&json_path).expect("json readable");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(value["player"], "Test Guard");
    assert_eq!(value["streaks"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(value["streak_metric"], "PTS");
    assert_eq!(
        value["efficiency_correlation"]["metrics"]
            .as_array()
            .map(|a| a.len()),
        Some(7)
    );
    assert!(!json_path.with_extension("json.tmp").exists());

    let xlsx = fs::metadata(&xlsx_path).expect("xlsx exists");
    assert!(xlsx.len() > 0);

    let _ = fs::remove_dir_all(&cfg.out_dir);
}

#[test]
fn cleaned_csv_round_trips_through_loader() {
    let dir = scratch_dir("clean");
    let out = dir.join("processed").join("cleaned.csv");

    let raw = game_log::read_csv(&fixture("player_game_log_raw.csv")).expect("raw loads");
    let (cleaned, _) = game_log::clean(&raw).expect("clean succeeds");
    game_log::write_csv(&cleaned, &out).expect("write succeeds");

    let cfg = AppConfig {
        player_csv: out.clone(),
        ..AppConfig::default()
    };
    let loaded = report::load_log(&cfg).expect("processed loads");
    assert!(loaded.clean.is_none());
    assert_eq!(loaded.records.len(), 9);
    assert_eq!(loaded.outcomes_matched, None);
    assert_eq!(loaded.records[0].stat(Metric::Points), Some(12.0));
    let away = loaded
        .records
        .iter()
        .filter(|r| r.location == Location::Away)
        .count();
    assert_eq!(away, 4);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_input_reports_path() {
    let cfg = AppConfig {
        player_csv: fixture("does_not_exist.csv"),
        ..AppConfig::default()
    };
    let err = report::load_log(&cfg).err().expect("missing file fails");
    assert!(format!("{err:#}").contains("does_not_exist.csv"));
}
