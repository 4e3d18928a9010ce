pub mod config;
pub mod game_log;
pub mod report;
pub mod streaks;
pub mod summary;
pub mod team_results;
