use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Serialize;

use crate::team_results::Outcome;

pub const DATE_COL: &str = "Date";
pub const OPP_COL: &str = "Opp";
pub const PTS_COL: &str = "PTS";
pub const LOCATION_COL: &str = "Home/Away";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%a, %b %d, %Y", "%m/%d/%Y"];

/// Raw game log table, one row per game as exported from the stats site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameLog {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl GameLog {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| anyhow!("missing required column '{name}'"))
    }

    pub fn has_location(&self) -> bool {
        self.column(LOCATION_COL).is_some()
    }

    pub fn cell(row: &[String], idx: usize) -> &str {
        row.get(idx).map(|s| s.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Metric {
    #[serde(rename = "PTS")]
    Points,
    #[serde(rename = "AST")]
    Assists,
    #[serde(rename = "TRB")]
    Rebounds,
    #[serde(rename = "FG%")]
    FieldGoalPct,
    #[serde(rename = "3P%")]
    ThreePointPct,
    #[serde(rename = "FT%")]
    FreeThrowPct,
    #[serde(rename = "FTA")]
    FreeThrowAttempts,
    #[serde(rename = "+/-")]
    PlusMinus,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Points,
        Metric::Assists,
        Metric::Rebounds,
        Metric::FieldGoalPct,
        Metric::ThreePointPct,
        Metric::FreeThrowPct,
        Metric::FreeThrowAttempts,
        Metric::PlusMinus,
    ];

    /// Columns compared across splits and fed to the correlation matrix.
    pub const PERFORMANCE: [Metric; 5] = [
        Metric::Points,
        Metric::Assists,
        Metric::Rebounds,
        Metric::FieldGoalPct,
        Metric::PlusMinus,
    ];

    /// Shooting accuracy against volume and production.
    pub const EFFICIENCY: [Metric; 7] = [
        Metric::FieldGoalPct,
        Metric::ThreePointPct,
        Metric::FreeThrowPct,
        Metric::FreeThrowAttempts,
        Metric::Points,
        Metric::Rebounds,
        Metric::Assists,
    ];

    pub const SHOOTING: [Metric; 3] = [
        Metric::FieldGoalPct,
        Metric::ThreePointPct,
        Metric::FreeThrowPct,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Points => "PTS",
            Metric::Assists => "AST",
            Metric::Rebounds => "TRB",
            Metric::FieldGoalPct => "FG%",
            Metric::ThreePointPct => "3P%",
            Metric::FreeThrowPct => "FT%",
            Metric::FreeThrowAttempts => "FTA",
            Metric::PlusMinus => "+/-",
        }
    }

    pub fn from_label(raw: &str) -> Option<Metric> {
        let raw = raw.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Location {
    Home,
    Away,
}

impl Location {
    pub fn label(self) -> &'static str {
        match self {
            Location::Home => "Home",
            Location::Away => "Away",
        }
    }

    pub fn parse(raw: &str) -> Option<Location> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home" => Some(Location::Home),
            "away" => Some(Location::Away),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub date: NaiveDate,
    pub opponent: String,
    pub location: Location,
    pub stats: BTreeMap<Metric, f64>,
    pub outcome: Option<Outcome>,
}

impl GameRecord {
    pub fn stat(&self, metric: Metric) -> Option<f64> {
        self.stats.get(&metric).copied()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanSummary {
    pub rows_in: usize,
    pub kept: usize,
    pub missing_points: usize,
    pub bad_dates: usize,
}

pub fn parse_csv(raw: &str) -> Result<GameLog> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(raw.as_bytes());

    let headers = reader
        .headers()
        .context("read csv header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read csv row {}", idx + 1))?;
        let mut row = record.iter().map(|c| c.trim().to_string()).collect::<Vec<_>>();
        if row.iter().all(|c| c.is_empty()) {
            continue;
        }
        if row.len() < headers.len() {
            row.resize(headers.len(), String::new());
        }
        rows.push(row);
    }

    Ok(GameLog { headers, rows })
}

pub fn read_csv(path: &Path) -> Result<GameLog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    parse_csv(&raw).with_context(|| format!("malformed csv in {}", path.display()))
}

pub fn to_csv_string(log: &GameLog) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(&log.headers).context("write csv header")?;
    for row in &log.rows {
        writer.write_record(row).context("write csv row")?;
    }
    let bytes = writer.into_inner().context("flush csv")?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

pub fn write_csv(log: &GameLog, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }
    }
    let body = to_csv_string(log)?;
    fs::write(path, body).with_context(|| format!("failed writing {}", path.display()))
}

pub fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Numeric cell, or None for blanks and text such as "Inactive".
pub fn parse_stat(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Drops unusable rows, tags each game Home/Away and orders by date.
pub fn clean(log: &GameLog) -> Result<(GameLog, CleanSummary)> {
    let date_idx = log.require_column(DATE_COL)?;
    let opp_idx = log.require_column(OPP_COL)?;
    let pts_idx = log.require_column(PTS_COL)?;
    let marker_cols = marker_columns(log);

    let mut headers = log.headers.clone();
    let loc_idx = match log.column(LOCATION_COL) {
        Some(idx) => idx,
        None => {
            headers.push(LOCATION_COL.to_string());
            headers.len() - 1
        }
    };

    let mut summary = CleanSummary {
        rows_in: log.rows.len(),
        ..CleanSummary::default()
    };
    let mut dated = Vec::with_capacity(log.rows.len());

    for row in &log.rows {
        let Some(points) = parse_stat(GameLog::cell(row, pts_idx)) else {
            summary.missing_points += 1;
            continue;
        };
        let Some(date) = parse_game_date(GameLog::cell(row, date_idx)) else {
            summary.bad_dates += 1;
            continue;
        };

        let location = detect_location(row, opp_idx, &marker_cols);
        let mut row = row.clone();
        if loc_idx == log.headers.len() && row.len() > loc_idx {
            // Cells past the header stay, after the appended label.
            row.insert(loc_idx, String::new());
        }
        if row.len() < headers.len() {
            row.resize(headers.len(), String::new());
        }
        row[pts_idx] = (points.trunc() as i64).to_string();
        row[loc_idx] = location.label().to_string();
        dated.push((date, row));
    }

    dated.sort_by_key(|(date, _)| *date);
    summary.kept = dated.len();

    let rows = dated.into_iter().map(|(_, row)| row).collect();
    Ok((GameLog { headers, rows }, summary))
}

/// Typed view over a cleaned log. Non-numeric stat cells become missing.
pub fn records(log: &GameLog) -> Result<Vec<GameRecord>> {
    let date_idx = log.require_column(DATE_COL)?;
    let opp_idx = log.require_column(OPP_COL)?;
    let loc_idx = log.column(LOCATION_COL);
    let marker_cols = marker_columns(log);
    let metric_cols = Metric::ALL
        .into_iter()
        .filter_map(|m| log.column(m.label()).map(|idx| (m, idx)))
        .collect::<Vec<_>>();

    let mut out = Vec::with_capacity(log.rows.len());
    for row in &log.rows {
        let Some(date) = parse_game_date(GameLog::cell(row, date_idx)) else {
            continue;
        };
        let location = loc_idx
            .and_then(|idx| Location::parse(GameLog::cell(row, idx)))
            .unwrap_or_else(|| detect_location(row, opp_idx, &marker_cols));
        let stats = metric_cols
            .iter()
            .filter_map(|(m, idx)| parse_stat(GameLog::cell(row, *idx)).map(|v| (*m, v)))
            .collect();

        out.push(GameRecord {
            date,
            opponent: GameLog::cell(row, opp_idx)
                .trim_start_matches('@')
                .trim()
                .to_string(),
            location,
            stats,
            outcome: None,
        });
    }
    Ok(out)
}

/// Per-game values of `metric`, NaN where the game has no value.
pub fn metric_series(records: &[GameRecord], metric: Metric) -> Vec<f64> {
    records
        .iter()
        .map(|r| r.stat(metric).unwrap_or(f64::NAN))
        .collect()
}

fn marker_columns(log: &GameLog) -> Vec<usize> {
    // The site leaves the "@" column unlabeled; pandas names it "Unnamed: N".
    log.headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.is_empty() || h.starts_with("Unnamed"))
        .map(|(idx, _)| idx)
        .collect()
}

fn detect_location(row: &[String], opp_idx: usize, marker_cols: &[usize]) -> Location {
    let away = GameLog::cell(row, opp_idx).contains('@')
        || marker_cols
            .iter()
            .any(|idx| GameLog::cell(row, *idx).contains('@'));
    if away { Location::Away } else { Location::Home }
}
