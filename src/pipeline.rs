use std::thread;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ScrapeConfig;
use crate::fixture::{EmptyReason, LooseFixture, SeasonOutcome, Strategy};
use crate::locate::extract_season_document;
use crate::season::{SeasonContext, SeasonOption, parse_season_options};
use crate::source::{FetchedPage, PageSource};

#[derive(Debug, Clone, Serialize)]
pub struct SeasonSummary {
    pub id: String,
    pub name: String,
    /// HTTP status of the season page; absent when the fetch itself failed.
    pub status: Option<u16>,
    pub fixtures: usize,
    pub strategy: Option<Strategy>,
    pub empty: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub seasons: Vec<SeasonSummary>,
    /// Every loose fixture in season order, sentinels included.
    pub fixtures: Vec<LooseFixture>,
    pub errors: Vec<String>,
}

impl RunReport {
    pub fn fixtures_for_season<'a>(&'a self, season_id: &'a str) -> impl Iterator<Item = &'a LooseFixture> + 'a {
        self.fixtures.iter().filter(move |f| f.season == season_id)
    }

    pub fn empty_seasons(&self) -> usize {
        self.seasons.iter().filter(|s| s.empty).count()
    }
}

/// Fetch the season picker from the base page and apply the allow list.
pub fn enumerate_seasons<S: PageSource + ?Sized>(
    source: &S,
    config: &ScrapeConfig,
) -> Result<Vec<SeasonOption>> {
    let page = source
        .fetch(&config.base_url)
        .context("fetch season index")?;
    if !page.is_ok() {
        warn!(url = %page.url, status = page.status, "season index returned unexpected status");
    }
    let mut seasons = parse_season_options(&page.body);
    info!(count = seasons.len(), "seasons enumerated");

    if let Some(allow) = &config.season_filter {
        seasons.retain(|s| allow.contains(&s.id));
        info!(count = seasons.len(), "seasons after allow list");
    }
    Ok(seasons)
}

/// Fetch every season page one at a time, then extract them in parallel.
///
/// A season whose fetch fails is recorded in `errors` and contributes no
/// fixtures. A season that fetched but held nothing contributes one
/// sentinel row.
pub fn run_seasons<S: PageSource + ?Sized>(source: &S, config: &ScrapeConfig) -> Result<RunReport> {
    let seasons = enumerate_seasons(source, config)?;
    let mut report = RunReport::default();
    if seasons.is_empty() {
        report
            .errors
            .push(format!("no seasons found at {}", config.base_url));
        return Ok(report);
    }

    let mut pages: Vec<(SeasonOption, Option<FetchedPage>)> = Vec::with_capacity(seasons.len());
    for (idx, season) in seasons.into_iter().enumerate() {
        if idx > 0 {
            thread::sleep(config.season_pause);
        }
        let url = config.season_url(&season.id);
        match source.fetch(&url) {
            Ok(page) => {
                if !page.is_ok() {
                    warn!(season = %season.id, status = page.status, "season page returned unexpected status");
                }
                pages.push((season, Some(page)));
            }
            Err(err) => {
                report.errors.push(format!("season {}: {err:#}", season.id));
                pages.push((season, None));
            }
        }
    }

    let outcomes: Vec<Option<SeasonOutcome>> = pages
        .par_iter()
        .map(|(season, page)| {
            page.as_ref().map(|page| {
                let ctx = SeasonContext::from_option(season, &config.club_name);
                extract_season_document(&page.body, &ctx)
            })
        })
        .collect();

    for ((season, page), outcome) in pages.into_iter().zip(outcomes) {
        let status = page.as_ref().map(|p| p.status);
        let Some(outcome) = outcome else {
            report.seasons.push(SeasonSummary {
                id: season.id,
                name: season.name,
                status,
                fixtures: 0,
                strategy: None,
                empty: true,
            });
            continue;
        };

        match &outcome {
            SeasonOutcome::Fixtures {
                strategy, fixtures, ..
            } => info!(
                season = %season.id,
                name = %season.name,
                ?strategy,
                fixtures = fixtures.len(),
                "season extracted"
            ),
            SeasonOutcome::Empty { reason, .. } => {
                let candidates = match reason {
                    EmptyReason::NoCandidateBlocks => 0,
                    EmptyReason::NoUsableBlocks { candidates } => *candidates,
                };
                warn!(season = %season.id, name = %season.name, candidates, "season has no fixtures")
            }
        }

        let strategy = outcome.strategy();
        let empty = outcome.is_empty();
        let fixtures = outcome.into_fixtures();
        report.seasons.push(SeasonSummary {
            id: season.id,
            name: season.name,
            status,
            fixtures: if empty { 0 } else { fixtures.len() },
            strategy,
            empty,
        });
        report.fixtures.extend(fixtures);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::source::StaticPageSource;

    const BASE: &str = "https://club.example/fixtures";

    fn config() -> ScrapeConfig {
        ScrapeConfig {
            base_url: BASE.to_string(),
            season_pause: Duration::ZERO,
            ..ScrapeConfig::default()
        }
    }

    fn index() -> &'static str {
        r#"<select name="season">
             <option value="2">2024/25 season</option>
             <option value="1">2023/24 season</option>
           </select>"#
    }

    #[test]
    fn seasons_run_in_order_with_sentinel_for_empty() {
        let source = StaticPageSource::new()
            .with_page(BASE, index())
            .with_page(&format!("{BASE}?season=2"), "<p>Nothing yet</p>")
            .with_page(
                &format!("{BASE}?season=1"),
                r#"<div class="fixture">Sat, 02 Sep Banks o' Dee 3-1 Deveronvale</div>
                   <div class="fixture">Sat, 09 Sep Huntly v Banks o' Dee</div>"#,
            );

        let report = run_seasons(&source, &config()).unwrap();
        assert!(report.errors.is_empty());
        assert_eq!(report.seasons.len(), 2);
        assert!(report.seasons[0].empty);
        assert_eq!(report.seasons[1].fixtures, 2);
        assert_eq!(report.seasons[1].strategy, Some(Strategy::ContainerClass));

        assert_eq!(report.fixtures.len(), 3);
        assert!(report.fixtures[0].is_sentinel());
        assert_eq!(report.fixtures[0].season, "2");
        assert_eq!(report.fixtures[1].home_team, "Banks o' Dee");
        assert_eq!(report.fixtures_for_season("1").count(), 2);
        assert_eq!(report.empty_seasons(), 1);
    }

    #[test]
    fn allow_list_and_missing_index() {
        let source = StaticPageSource::new().with_page(BASE, index());
        let mut cfg = config();
        cfg.season_filter = Some(vec!["1".to_string()]);
        let seasons = enumerate_seasons(&source, &cfg).unwrap();
        assert_eq!(seasons.len(), 1);
        assert_eq!(seasons[0].id, "1");

        let report = run_seasons(&StaticPageSource::new(), &config()).unwrap();
        assert!(report.fixtures.is_empty());
        assert_eq!(report.errors.len(), 1);
    }
}
