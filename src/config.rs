use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::game_log::Metric;
use crate::streaks::StreakConfig;

const DEFAULT_PLAYER_CSV: &str = "data/processed/player_game_log.csv";
const DEFAULT_OUT_DIR: &str = "reports";
const DEFAULT_ROLLING_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub player_csv: PathBuf,
    pub team_csv: Option<PathBuf>,
    pub out_dir: PathBuf,
    pub player_name: String,
    pub streak: StreakConfig,
    pub streak_metric: Metric,
    pub rolling_window: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            player_csv: PathBuf::from(DEFAULT_PLAYER_CSV),
            team_csv: None,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            player_name: "Player".to_string(),
            streak: StreakConfig::default(),
            streak_metric: Metric::Points,
            rolling_window: DEFAULT_ROLLING_WINDOW,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by environment variables. Unparseable values fall back.
    pub fn from_env() -> Self {
        Self::from_lookup(opt_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(path) = lookup("GAMELOG_PLAYER_CSV") {
            cfg.player_csv = PathBuf::from(path);
        }
        cfg.team_csv = lookup("GAMELOG_TEAM_CSV").map(PathBuf::from);
        if let Some(dir) = lookup("GAMELOG_OUT_DIR") {
            cfg.out_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup("GAMELOG_PLAYER") {
            cfg.player_name = name;
        }
        cfg.streak.threshold = lookup("STREAK_THRESHOLD")
            .and_then(|val| val.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(cfg.streak.threshold);
        cfg.streak.min_length = lookup("STREAK_MIN_LENGTH")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(cfg.streak.min_length)
            .max(1);
        cfg.streak_metric = lookup("STREAK_METRIC")
            .and_then(|val| Metric::from_label(&val))
            .unwrap_or(cfg.streak_metric);
        cfg.rolling_window = lookup("ROLLING_WINDOW")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(cfg.rolling_window)
            .max(1);
        cfg
    }

    /// Applies `--flag value` / `--flag=value` overrides. Bad flag values are errors.
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if let Some(path) = flag_value(args, "--input") {
            self.player_csv = PathBuf::from(path);
        }
        if let Some(path) = flag_value(args, "--team") {
            self.team_csv = Some(PathBuf::from(path));
        }
        if let Some(dir) = flag_value(args, "--out") {
            self.out_dir = PathBuf::from(dir);
        }
        if let Some(name) = flag_value(args, "--player") {
            self.player_name = name;
        }
        if let Some(raw) = flag_value(args, "--threshold") {
            let threshold = raw
                .trim()
                .parse::<f64>()
                .with_context(|| format!("invalid --threshold '{raw}'"))?;
            if !threshold.is_finite() {
                return Err(anyhow!("invalid --threshold '{raw}'"));
            }
            self.streak.threshold = threshold;
        }
        if let Some(raw) = flag_value(args, "--min-length") {
            let min_length = raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("invalid --min-length '{raw}'"))?;
            self.streak.min_length = min_length.max(1);
        }
        if let Some(raw) = flag_value(args, "--metric") {
            self.streak_metric =
                Metric::from_label(&raw).ok_or_else(|| anyhow!("unknown metric '{raw}'"))?;
        }
        if let Some(raw) = flag_value(args, "--window") {
            let window = raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("invalid --window '{raw}'"))?;
            self.rolling_window = window.max(1);
        }
        Ok(())
    }
}

/// Loads `.env.local` then `.env`, then resolves env and command-line settings.
pub fn load(args: &[String]) -> Result<AppConfig> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mut cfg = AppConfig::from_env();
    cfg.apply_args(args)?;
    Ok(cfg)
}

pub fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            let next = next.trim();
            if !next.is_empty() && !next.starts_with("--") {
                return Some(next.to_string());
            }
        }
    }
    None
}

/// Arguments that are neither flags nor flag values.
pub fn positional_args(args: &[String], value_flags: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if value_flags.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg.clone());
    }
    out
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|val| if val.trim().is_empty() { None } else { Some(val) })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::{AppConfig, flag_value, positional_args};
    use crate::game_log::Metric;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn env_overrides_and_fallbacks() {
        let vars: HashMap<&str, &str> = [
            ("STREAK_THRESHOLD", "25.5"),
            ("STREAK_MIN_LENGTH", "zero"),
            ("STREAK_METRIC", "ast"),
            ("ROLLING_WINDOW", "0"),
            ("GAMELOG_TEAM_CSV", "data/raw/team.csv"),
        ]
        .into_iter()
        .collect();
        let cfg = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(cfg.streak.threshold, 25.5);
        assert_eq!(cfg.streak.min_length, 3);
        assert_eq!(cfg.streak_metric, Metric::Assists);
        assert_eq!(cfg.rolling_window, 1);
        assert_eq!(cfg.team_csv, Some(PathBuf::from("data/raw/team.csv")));
    }

    #[test]
    fn flags_take_both_forms() {
        let mut cfg = AppConfig::default();
        cfg.apply_args(&args(&["--threshold=15", "--min-length", "4", "--metric", "TRB"]))
            .expect("flags parse");
        assert_eq!(cfg.streak.threshold, 15.0);
        assert_eq!(cfg.streak.min_length, 4);
        assert_eq!(cfg.streak_metric, Metric::Rebounds);
    }

    #[test]
    fn bad_flag_is_an_error() {
        let mut cfg = AppConfig::default();
        assert!(cfg.apply_args(&args(&["--min-length", "many"])).is_err());
        assert!(cfg.apply_args(&args(&["--metric", "BLK"])).is_err());
    }

    #[test]
    fn flag_without_value_does_not_swallow_next_flag() {
        let raw = args(&["--input", "--threshold", "5"]);
        assert_eq!(flag_value(&raw, "--input"), None);

        let mut cfg = AppConfig::default();
        cfg.apply_args(&raw).expect("flags parse");
        assert_eq!(cfg.player_csv, AppConfig::default().player_csv);
        assert_eq!(cfg.streak.threshold, 5.0);
    }

    #[test]
    fn flag_lookup_and_positionals() {
        let raw = args(&["in.csv", "--out", "reports", "out.csv", "--verbose"]);
        assert_eq!(flag_value(&raw, "--out"), Some("reports".to_string()));
        assert_eq!(flag_value(&raw, "--input"), None);
        assert_eq!(
            positional_args(&raw, &["--out"]),
            vec!["in.csv".to_string(), "out.csv".to_string()]
        );
    }
}
