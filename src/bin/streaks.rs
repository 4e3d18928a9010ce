use anyhow::Result;

use gamelog_trends::{config, game_log, report, streaks};

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cfg = config::load(&args)?;

    let loaded = report::load_log(&cfg)?;
    let series = game_log::metric_series(&loaded.records, cfg.streak_metric);
    let found = streaks::detect_streaks(&series, cfg.streak);

    println!(
        "{} >= {} for at least {} games: {} streak(s)",
        cfg.streak_metric.label(),
        cfg.streak.threshold,
        cfg.streak.min_length,
        found.len()
    );
    for s in &found {
        let values = series[s.start..=s.end]
            .iter()
            .map(|v| format!("{v}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  [{}..{}] {} to {} ({} games): {}",
            s.start,
            s.end,
            loaded.records[s.start].date,
            loaded.records[s.end].date,
            s.games(),
            values
        );
    }
    if let Some(best) = streaks::longest_streak(&found) {
        println!("Longest: {} games starting {}", best.games(), loaded.records[best.start].date);
    }

    Ok(())
}
