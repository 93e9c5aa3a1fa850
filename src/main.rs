use anyhow::{Context, Result};

use club_fixtures::config::ScrapeConfig;
use club_fixtures::export::write_outputs;
use club_fixtures::pipeline::run_seasons;
use club_fixtures::schema::assemble;
use club_fixtures::source::HttpPageSource;

fn main() -> Result<()> {
    club_fixtures::init_runtime();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = ScrapeConfig::from_env();
    config.apply_args(&args)?;

    let source = HttpPageSource::from_config(&config)?;
    let report = run_seasons(&source, &config).context("season run failed")?;
    let schema = assemble(&report.fixtures);
    let outputs = write_outputs(
        &config.output_dir,
        &report,
        &schema,
        config.literal_season.as_deref(),
    )?;

    println!("Fixture scrape complete");
    println!("Source: {}", config.base_url);
    for season in &report.seasons {
        let status = season
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let strategy = season
            .strategy
            .map(|s| format!("{s:?}"))
            .unwrap_or_else(|| "none".to_string());
        println!(
            "  {} ({}): http {status}, {} fixtures, strategy {strategy}{}",
            season.name,
            season.id,
            season.fixtures,
            if season.empty { ", EMPTY" } else { "" }
        );
    }
    println!(
        "Seasons: {} ({} empty)",
        report.seasons.len(),
        report.empty_seasons()
    );
    println!("Fixtures: {}", report.fixtures.len());
    println!(
        "Schema: {} teams, {} competitions, {} matches",
        schema.teams.len(),
        schema.competitions.len(),
        schema.fixtures.len()
    );
    if let Some(season) = &outputs.literal_season {
        println!(
            "Typed literal: season {season}, {} fixtures",
            outputs.literal_fixtures
        );
    }
    println!("Output: {}", config.output_dir.display());
    for file in &outputs.files {
        println!("  {}", file.display());
    }
    if !report.errors.is_empty() {
        println!("Errors: {}", report.errors.len());
        for err in report.errors.iter().take(10) {
            println!("  - {err}");
        }
    }
    Ok(())
}
