use std::path::PathBuf;

use anyhow::{Result, anyhow};

use gamelog_trends::config::positional_args;
use gamelog_trends::{game_log, report};

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let paths = positional_args(&args, &[]);
    let (Some(input), Some(output)) = (paths.first(), paths.get(1)) else {
        return Err(anyhow!("usage: clean_log <raw.csv> <cleaned.csv>"));
    };
    let input = PathBuf::from(input);
    let output = PathBuf::from(output);

    let raw = game_log::read_csv(&input)?;
    let (cleaned, summary) = game_log::clean(&raw)?;
    report::warn_dropped(&summary);
    game_log::write_csv(&cleaned, &output)?;

    println!("Rows read: {}", summary.rows_in);
    println!("Rows kept: {}", summary.kept);
    println!("Cleaned data saved to {}", output.display());
    Ok(())
}
