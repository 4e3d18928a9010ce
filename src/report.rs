use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;

use crate::config::AppConfig;
use crate::game_log::{self, CleanSummary, GameRecord, Metric};
use crate::streaks::{self, Streak, StreakConfig};
use crate::summary::{self, CorrelationMatrix, MetricMean, Split};
use crate::team_results;

pub const JSON_FILE: &str = "report.json";
pub const XLSX_FILE: &str = "report.xlsx";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreakEntry {
    pub start: usize,
    pub end: usize,
    pub games: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub rolling: Option<f64>,
    pub in_streak: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub player: String,
    pub generated_at: String,
    pub games: usize,
    pub first_game: Option<NaiveDate>,
    pub last_game: Option<NaiveDate>,
    pub clean: Option<CleanSummary>,
    pub metric_means: Vec<MetricMean>,
    pub shooting: Vec<MetricMean>,
    pub location: Split,
    pub outcomes: Option<Split>,
    pub correlation: CorrelationMatrix,
    pub efficiency_correlation: CorrelationMatrix,
    pub streak_metric: Metric,
    pub streak_config: StreakConfig,
    pub streaks: Vec<StreakEntry>,
    pub longest_streak: Option<StreakEntry>,
    pub rolling_window: usize,
    pub rolling: Vec<RollingPoint>,
}

/// Game records ready for analysis, plus the cleaning tally when the input was raw.
pub struct LoadedLog {
    pub records: Vec<GameRecord>,
    pub clean: Option<CleanSummary>,
    pub outcomes_matched: Option<usize>,
}

pub fn load_log(cfg: &AppConfig) -> Result<LoadedLog> {
    let log = game_log::read_csv(&cfg.player_csv)?;
    let (log, clean) = if log.has_location() {
        (log, None)
    } else {
        eprintln!(
            "[INFO] {} has no Home/Away column; cleaning in memory",
            cfg.player_csv.display()
        );
        let (cleaned, summary) = game_log::clean(&log)
            .with_context(|| format!("clean {}", cfg.player_csv.display()))?;
        (cleaned, Some(summary))
    };
    if let Some(summary) = clean {
        warn_dropped(&summary);
    }

    let mut records = game_log::records(&log)
        .with_context(|| format!("read records from {}", cfg.player_csv.display()))?;
    records.sort_by_key(|r| r.date);

    let outcomes_matched = match &cfg.team_csv {
        Some(path) => {
            let games = team_results::read_team_games(path)
                .with_context(|| format!("load team results from {}", path.display()))?;
            let matched = team_results::attach_outcomes(&mut records, &games);
            if matched < records.len() {
                eprintln!(
                    "[WARN] {} of {} games had no team result",
                    records.len() - matched,
                    records.len()
                );
            }
            Some(matched)
        }
        None => None,
    };

    Ok(LoadedLog {
        records,
        clean,
        outcomes_matched,
    })
}

pub fn warn_dropped(summary: &CleanSummary) {
    if summary.missing_points > 0 {
        eprintln!(
            "[WARN] dropped {} rows without points",
            summary.missing_points
        );
    }
    if summary.bad_dates > 0 {
        eprintln!("[WARN] dropped {} rows with unreadable dates", summary.bad_dates);
    }
}

pub fn build_report(cfg: &AppConfig, loaded: &LoadedLog) -> Report {
    let records = &loaded.records;
    let series = game_log::metric_series(records, cfg.streak_metric);
    let found = streaks::detect_streaks(&series, cfg.streak);
    let entries = found
        .iter()
        .map(|s| streak_entry(*s, records, &series))
        .collect::<Vec<_>>();
    let longest = streaks::longest_streak(&found).map(|s| streak_entry(s, records, &series));

    let rolling = summary::rolling_mean(&series, cfg.rolling_window)
        .into_iter()
        .zip(records.iter().zip(&series))
        .enumerate()
        .map(|(idx, (rolling, (record, value)))| RollingPoint {
            date: record.date,
            value: value.is_finite().then_some(*value),
            rolling,
            in_streak: found.iter().any(|s| s.contains(idx)),
        })
        .collect();

    Report {
        player: cfg.player_name.clone(),
        generated_at: Utc::now().to_rfc3339(),
        games: records.len(),
        first_game: records.first().map(|r| r.date),
        last_game: records.last().map(|r| r.date),
        clean: loaded.clean,
        metric_means: summary::metric_means(records, &Metric::ALL),
        shooting: summary::shooting_summary(records),
        location: summary::location_split(records, &Metric::PERFORMANCE),
        outcomes: loaded
            .outcomes_matched
            .map(|_| summary::outcome_split(records, &Metric::PERFORMANCE)),
        correlation: summary::correlation_matrix(records, &Metric::PERFORMANCE),
        efficiency_correlation: summary::correlation_matrix(records, &Metric::EFFICIENCY),
        streak_metric: cfg.streak_metric,
        streak_config: cfg.streak,
        streaks: entries,
        longest_streak: longest,
        rolling_window: cfg.rolling_window,
        rolling,
    }
}

fn streak_entry(streak: Streak, records: &[GameRecord], series: &[f64]) -> StreakEntry {
    StreakEntry {
        start: streak.start,
        end: streak.end,
        games: streak.games(),
        first_date: records[streak.start].date,
        last_date: records[streak.end].date,
        mean: summary::mean(series[streak.start..=streak.end].iter().map(|v| Some(*v))),
    }
}

pub fn save_json(report: &Report, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(report).context("serialize report")?;
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

pub fn export_xlsx(report: &Report, path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let mut summary_rows = vec![
        vec!["Field".to_string(), "Value".to_string()],
        vec!["Player".to_string(), report.player.clone()],
        vec!["Games".to_string(), report.games.to_string()],
        vec!["First game".to_string(), opt_to_string(report.first_game)],
        vec!["Last game".to_string(), opt_to_string(report.last_game)],
    ];
    for m in &report.metric_means {
        summary_rows.push(vec![format!("Mean {}", m.metric.label()), fmt_opt(m.mean)]);
    }

    let mut split_rows = vec![vec!["Split".to_string(), "Group".to_string(), "Games".to_string()]];
    split_rows[0].extend(Metric::PERFORMANCE.iter().map(|m| m.label().to_string()));
    split_rows.extend(split_rows_for("Location", &report.location));
    if let Some(outcomes) = &report.outcomes {
        split_rows.extend(split_rows_for("Result", outcomes));
    }

    let corr_rows = correlation_rows(&report.correlation);
    let efficiency_rows = correlation_rows(&report.efficiency_correlation);

    let mut streak_rows = vec![vec![
        "Start".to_string(),
        "End".to_string(),
        "Games".to_string(),
        "First Date".to_string(),
        "Last Date".to_string(),
        format!("Mean {}", report.streak_metric.label()),
    ]];
    streak_rows.extend(report.streaks.iter().map(|s| {
        vec![
            s.start.to_string(),
            s.end.to_string(),
            s.games.to_string(),
            s.first_date.to_string(),
            s.last_date.to_string(),
            fmt_opt(s.mean),
        ]
    }));

    let mut rolling_rows = vec![vec![
        "Date".to_string(),
        report.streak_metric.label().to_string(),
        format!("Rolling {}", report.rolling_window),
        "In Streak".to_string(),
    ]];
    rolling_rows.extend(report.rolling.iter().map(|p| {
        vec![
            p.date.to_string(),
            fmt_opt(p.value),
            fmt_opt(p.rolling),
            if p.in_streak { "Y" } else { "" }.to_string(),
        ]
    }));

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Splits")?;
        write_rows(sheet, &split_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Correlation")?;
        write_rows(sheet, &corr_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Efficiency")?;
        write_rows(sheet, &efficiency_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Streaks")?;
        write_rows(sheet, &streak_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Rolling")?;
        write_rows(sheet, &rolling_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

/// Writes `report.json` and `report.xlsx` into `out_dir`.
pub fn write_outputs(report: &Report, out_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed creating {}", out_dir.display()))?;
    let json_path = out_dir.join(JSON_FILE);
    let xlsx_path = out_dir.join(XLSX_FILE);
    save_json(report, &json_path)?;
    export_xlsx(report, &xlsx_path)?;
    Ok((json_path, xlsx_path))
}

pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}: {} games", report.player, report.games);
    if let (Some(first), Some(last)) = (report.first_game, report.last_game) {
        let _ = writeln!(out, "Span: {first} to {last}");
    }

    let _ = writeln!(out, "\nShooting:");
    for m in &report.shooting {
        let _ = writeln!(out, "  {:<4} {}", m.metric.label(), fmt_opt(m.mean));
    }

    let _ = writeln!(out, "\nHome vs Away:");
    write_split(&mut out, &report.location);
    if let Some(outcomes) = &report.outcomes {
        let _ = writeln!(out, "\nWins vs Losses:");
        write_split(&mut out, outcomes);
    }

    let cfg = report.streak_config;
    let _ = writeln!(
        out,
        "\nStreaks ({} >= {} for {}+ games): {}",
        report.streak_metric.label(),
        cfg.threshold,
        cfg.min_length,
        report.streaks.len()
    );
    for s in &report.streaks {
        let _ = writeln!(
            out,
            "  {} to {} ({} games, avg {})",
            s.first_date,
            s.last_date,
            s.games,
            fmt_opt(s.mean)
        );
    }
    out
}

fn write_split(out: &mut String, split: &Split) {
    for group in &split.groups {
        let means = group
            .means
            .iter()
            .map(|m| format!("{} {}", m.metric.label(), fmt_opt(m.mean)))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "  {:<5} ({} games) {}", group.label, group.games, means);
    }
}

fn split_rows_for(kind: &str, split: &Split) -> Vec<Vec<String>> {
    split
        .groups
        .iter()
        .map(|g| {
            let mut row = vec![kind.to_string(), g.label.clone(), g.games.to_string()];
            row.extend(Metric::PERFORMANCE.iter().map(|m| fmt_opt(g.mean_of(*m))));
            row
        })
        .collect()
}

fn correlation_rows(matrix: &CorrelationMatrix) -> Vec<Vec<String>> {
    let mut header = vec![String::new()];
    header.extend(matrix.metrics.iter().map(|m| m.label().to_string()));
    let mut rows = vec![header];
    for a in &matrix.metrics {
        let mut row = vec![a.label().to_string()];
        row.extend(matrix.metrics.iter().map(|b| fmt_opt(matrix.get(*a, *b))));
        rows.push(row);
    }
    rows
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".to_string())
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
