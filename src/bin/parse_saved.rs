use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use club_fixtures::config::{ScrapeConfig, arg_value};
use club_fixtures::locate::extract_season_document;
use club_fixtures::season::SeasonContext;

fn main() -> Result<()> {
    club_fixtures::init_runtime();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let path = arg_value(&args, "--file")?
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: parse_saved --file <page.html> [--season-id <id>] [--season-name <label>]"))?;
    let season_id = arg_value(&args, "--season-id")?.unwrap_or_else(|| "saved".to_string());
    let season_name = arg_value(&args, "--season-name")?.unwrap_or_default();

    let body = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let config = ScrapeConfig::from_env();
    let ctx = SeasonContext::new(&season_id, &season_name, &config.club_name);

    let outcome = extract_season_document(&body, &ctx);
    if let Some(strategy) = outcome.strategy() {
        eprintln!("strategy: {strategy:?}");
    }
    let fixtures = outcome.into_fixtures();
    let json = serde_json::to_string_pretty(&fixtures).context("serialize fixtures")?;
    println!("{json}");
    Ok(())
}
