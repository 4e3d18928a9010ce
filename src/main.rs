use anyhow::{Context, Result};

use gamelog_trends::config;
use gamelog_trends::report;

const USAGE: &str = "\
usage: gamelog_trends [--input PATH] [--team PATH] [--out DIR] [--player NAME]
                      [--metric PTS|AST|TRB|FG%|3P%|FT%|FTA|+/-]
                      [--threshold N] [--min-length N] [--window N]";

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    let cfg = config::load(&args).context("resolve configuration")?;
    eprintln!("[INFO] loading {}", cfg.player_csv.display());

    let loaded = report::load_log(&cfg)?;
    if loaded.records.is_empty() {
        eprintln!("[WARN] no usable games in {}", cfg.player_csv.display());
    }

    let report = report::build_report(&cfg, &loaded);
    print!("{}", report::render_text(&report));

    let (json_path, xlsx_path) = report::write_outputs(&report, &cfg.out_dir)?;
    eprintln!("[INFO] wrote {}", json_path.display());
    eprintln!("[INFO] wrote {}", xlsx_path.display());

    Ok(())
}
