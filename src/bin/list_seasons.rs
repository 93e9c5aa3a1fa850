use anyhow::Result;

use club_fixtures::config::ScrapeConfig;
use club_fixtures::pipeline::enumerate_seasons;
use club_fixtures::season::season_years;
use club_fixtures::source::HttpPageSource;

fn main() -> Result<()> {
    club_fixtures::init_runtime();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = ScrapeConfig::from_env();
    config.apply_args(&args)?;

    let source = HttpPageSource::from_config(&config)?;
    let seasons = enumerate_seasons(&source, &config)?;

    println!("Seasons at {}", config.base_url);
    for season in &seasons {
        let years = season_years(&season.name)
            .map(|(start, end)| format!("{start}-{end}"))
            .unwrap_or_else(|| "?".to_string());
        println!("  {:>8}  {}  [{years}]", season.id, season.name);
    }
    println!("Total: {}", seasons.len());
    Ok(())
}
