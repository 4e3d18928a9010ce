use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use crate::game_log::{self, GameLog, GameRecord, parse_game_date, parse_stat};

const OPPONENT_COL: &str = "Opponent";
const TEAM_PTS_COL: &str = "Tm";
const OPP_PTS_COL: &str = "Opp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Win => "Win",
            Outcome::Loss => "Loss",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamGame {
    pub date: NaiveDate,
    pub opponent: String,
    pub team_points: u32,
    pub opponent_points: u32,
    pub outcome: Outcome,
}

pub fn classify_outcome(team_points: u32, opponent_points: u32) -> Outcome {
    // Basketball has no draws; a tied final would be a data error, counted as a loss.
    if team_points > opponent_points {
        Outcome::Win
    } else {
        Outcome::Loss
    }
}

/// Played games from a team schedule table. Unplayed games have no score and are skipped.
pub fn team_games(log: &GameLog) -> Result<Vec<TeamGame>> {
    let date_idx = log.require_column(game_log::DATE_COL)?;
    let opponent_idx = log.require_column(OPPONENT_COL)?;
    let tm_idx = log.require_column(TEAM_PTS_COL)?;
    let opp_idx = log.require_column(OPP_PTS_COL)?;

    let mut out = Vec::new();
    for row in &log.rows {
        let Some(date) = parse_game_date(GameLog::cell(row, date_idx)) else {
            continue;
        };
        let (Some(tm), Some(opp)) = (
            parse_stat(GameLog::cell(row, tm_idx)),
            parse_stat(GameLog::cell(row, opp_idx)),
        ) else {
            continue;
        };
        let team_points = tm.max(0.0) as u32;
        let opponent_points = opp.max(0.0) as u32;
        out.push(TeamGame {
            date,
            opponent: GameLog::cell(row, opponent_idx).trim().to_string(),
            team_points,
            opponent_points,
            outcome: classify_outcome(team_points, opponent_points),
        });
    }
    Ok(out)
}

pub fn read_team_games(path: &Path) -> Result<Vec<TeamGame>> {
    let log = game_log::read_csv(path)?;
    team_games(&log)
}

/// Sets each record's outcome from the team game played the same day.
/// Returns how many records were matched.
pub fn attach_outcomes(records: &mut [GameRecord], games: &[TeamGame]) -> usize {
    let by_date: HashMap<NaiveDate, Outcome> =
        games.iter().map(|g| (g.date, g.outcome)).collect();

    let mut matched = 0usize;
    for record in records.iter_mut() {
        record.outcome = by_date.get(&record.date).copied();
        if record.outcome.is_some() {
            matched += 1;
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::{Outcome, classify_outcome, team_games};
    use crate::game_log::parse_csv;

    #[test]
    fn schedule_rows_without_scores_are_skipped() {
        let raw = "\
Date,Start (ET),,,,Opponent,,,Tm,Opp,W,L
\"Wed, Oct 25, 2023\",8:00p,,Box Score,,Oklahoma City Thunder,L,,104,124,0,1
\"Fri, Oct 27, 2023\",8:00p,,Box Score,@,Toronto Raptors,W,,104,103,1,1
\"Sat, Apr 13, 2024\",7:00p,,,,New York Knicks,,,,,,
";
        let log = parse_csv(raw).expect("schedule parses");
        let games = team_games(&log).expect("games build");
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].outcome, Outcome::Loss);
        assert_eq!(games[1].outcome, Outcome::Win);
        assert_eq!(games[1].opponent, "Toronto Raptors");
        assert_eq!(games[1].date.to_string(), "2023-10-27");
    }

    #[test]
    fn ties_count_as_losses() {
        assert_eq!(classify_outcome(100, 99), Outcome::Win);
        assert_eq!(classify_outcome(99, 100), Outcome::Loss);
        assert_eq!(classify_outcome(100, 100), Outcome::Loss);
    }
}
