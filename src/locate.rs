use std::collections::HashSet;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::extract::{BlockText, JSON_FIXTURE_KEYS, extract_text_block, fixture_from_json};
use crate::fixture::{EmptyReason, LooseFixture, MatchDate, SeasonOutcome, Strategy};
use crate::normalize::{DateParts, find_date_parts, has_date_signature};
use crate::season::SeasonContext;

const CLASS_TOKENS: &[&str] = &["fixture", "match", "game"];

// Elements whose text is never fixture content.
const SKIP_TAGS: &[&str] = &["html", "head", "body", "script", "style", "noscript", "title"];

static CONTAINERS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div[class], li[class], article[class], section[class]")
        .expect("valid selector")
});
static TABLE_ROWS: Lazy<Selector> = Lazy::new(|| Selector::parse("tr[class]").expect("valid selector"));
static EVERY_ELEMENT: Lazy<Selector> = Lazy::new(|| Selector::parse("*").expect("valid selector"));
static SCRIPTS: Lazy<Selector> = Lazy::new(|| Selector::parse("script").expect("valid selector"));

type HtmlStrategy = for<'a> fn(&'a Html) -> Vec<ElementRef<'a>>;

/// HTML heuristics in the order they are tried.
const HTML_STRATEGIES: &[(Strategy, HtmlStrategy)] = &[
    (Strategy::ContainerClass, container_blocks),
    (Strategy::TableRow, table_row_blocks),
    (Strategy::DateSweep, date_sweep_blocks),
];

/// Extract every fixture of one season document.
///
/// Raw JSON bodies are walked directly. HTML bodies go through the
/// structural strategies, then embedded JSON payloads. The first strategy
/// that produces at least one fixture decides the outcome.
pub fn extract_season_document(body: &str, ctx: &SeasonContext) -> SeasonOutcome {
    let trimmed = body.trim_start();
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && let Ok(value) = serde_json::from_str::<Value>(trimmed)
    {
        let objects = find_json_fixture_objects(&value);
        let candidates = objects.len();
        let fixtures = extract_json_objects(&objects, ctx);
        return outcome(ctx, Strategy::JsonDocument, fixtures, candidates);
    }

    let doc = Html::parse_document(body);
    let mut candidates = 0usize;

    for (strategy, locate) in HTML_STRATEGIES {
        let blocks = locate(&doc);
        if blocks.is_empty() {
            continue;
        }
        candidates += blocks.len();
        let fixtures = extract_html_blocks(&blocks, ctx);
        debug!(
            season = %ctx.id,
            ?strategy,
            blocks = blocks.len(),
            fixtures = fixtures.len(),
            "strategy finished"
        );
        if !fixtures.is_empty() {
            return SeasonOutcome::Fixtures {
                season: ctx.id.clone(),
                strategy: *strategy,
                fixtures,
            };
        }
    }

    for payload in embedded_json_payloads(&doc) {
        let objects = find_json_fixture_objects(&payload);
        candidates += objects.len();
        let fixtures = extract_json_objects(&objects, ctx);
        if !fixtures.is_empty() {
            return SeasonOutcome::Fixtures {
                season: ctx.id.clone(),
                strategy: Strategy::EmbeddedJson,
                fixtures,
            };
        }
    }

    empty(ctx, candidates)
}

fn outcome(
    ctx: &SeasonContext,
    strategy: Strategy,
    fixtures: Vec<LooseFixture>,
    candidates: usize,
) -> SeasonOutcome {
    if fixtures.is_empty() {
        return empty(ctx, candidates);
    }
    SeasonOutcome::Fixtures {
        season: ctx.id.clone(),
        strategy,
        fixtures,
    }
}

fn empty(ctx: &SeasonContext, candidates: usize) -> SeasonOutcome {
    let reason = if candidates == 0 {
        EmptyReason::NoCandidateBlocks
    } else {
        EmptyReason::NoUsableBlocks { candidates }
    };
    SeasonOutcome::Empty {
        season: ctx.id.clone(),
        reason,
    }
}

fn container_blocks(doc: &Html) -> Vec<ElementRef<'_>> {
    doc.select(&CONTAINERS).filter(has_fixture_class).collect()
}

fn table_row_blocks(doc: &Html) -> Vec<ElementRef<'_>> {
    doc.select(&TABLE_ROWS).filter(has_fixture_class).collect()
}

/// Elements whose own text carries a date signature. The block is the
/// parent, so the date and its neighbouring team text travel together.
fn date_sweep_blocks(doc: &Html) -> Vec<ElementRef<'_>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for el in doc.select(&EVERY_ELEMENT) {
        if SKIP_TAGS.contains(&el.value().name()) {
            continue;
        }
        if !has_date_signature(&own_text(el)) {
            continue;
        }
        let block = el
            .parent()
            .and_then(ElementRef::wrap)
            .filter(|parent| !SKIP_TAGS.contains(&parent.value().name()))
            .unwrap_or(el);
        if seen.insert(block.id()) {
            out.push(block);
        }
    }
    out
}

fn has_fixture_class(el: &ElementRef<'_>) -> bool {
    let Some(class) = el.value().attr("class") else {
        return false;
    };
    let class = class.to_ascii_lowercase();
    CLASS_TOKENS.iter().any(|token| class.contains(token))
}

/// Run the text extractor over each block.
///
/// When blocks nest, a fixture found in an inner block wins and every
/// ancestor block's fixture is dropped.
fn extract_html_blocks(blocks: &[ElementRef<'_>], ctx: &SeasonContext) -> Vec<LooseFixture> {
    let mut extracted = Vec::new();
    for block in blocks {
        let text = BlockText::from_fragments(block.text());
        let date = locate_date(*block, ctx);
        match extract_text_block(&text, date, ctx) {
            Ok(Some(fixture)) => extracted.push((*block, fixture)),
            Ok(None) => {}
            Err(err) => warn!(season = %ctx.id, "skipping fixture block: {err:#}"),
        }
    }

    let superseded: HashSet<_> = extracted
        .iter()
        .flat_map(|(block, _)| block.ancestors().map(|node| node.id()))
        .collect();

    extracted
        .into_iter()
        .filter(|(block, _)| !superseded.contains(&block.id()))
        .map(|(_, fixture)| {
            debug!(
                season = %ctx.id,
                home = %fixture.home_team,
                away = %fixture.away_team,
                status = %fixture.status,
                "extracted fixture"
            );
            fixture
        })
        .collect()
}

/// Date of the block: its own text first, then the closest sibling on the
/// way up the tree, preceding siblings before following ones.
pub fn locate_date(block: ElementRef<'_>, ctx: &SeasonContext) -> Option<MatchDate> {
    let own = block.text().collect::<Vec<_>>().join(" ");
    if let Some(parts) = find_date_parts(&own).into_iter().next() {
        return resolve_date(&parts, ctx);
    }

    // Sibling subtree text; a text node is its own text.
    let text_of = |sibling| match ElementRef::wrap(sibling) {
        Some(el) if SKIP_TAGS.contains(&el.value().name()) => String::new(),
        Some(el) => el.text().collect::<Vec<_>>().join(" "),
        None => sibling
            .value()
            .as_text()
            .map(|t| t.to_string())
            .unwrap_or_default(),
    };

    let mut node = *block;
    loop {
        for sibling in node.prev_siblings() {
            if let Some(parts) = find_date_parts(&text_of(sibling)).pop() {
                return resolve_date(&parts, ctx);
            }
        }
        for sibling in node.next_siblings() {
            if let Some(parts) = find_date_parts(&text_of(sibling)).into_iter().next() {
                return resolve_date(&parts, ctx);
            }
        }
        let parent = node.parent()?;
        if ElementRef::wrap(parent).is_some_and(|el| SKIP_TAGS.contains(&el.value().name())) {
            return None;
        }
        node = parent;
    }
}

fn resolve_date(parts: &DateParts, ctx: &SeasonContext) -> Option<MatchDate> {
    let year = ctx.year_for_month(parts.month);
    NaiveDate::from_ymd_opt(year, parts.month, parts.day).map(MatchDate::Calendar)
}

fn own_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|child| child.value().as_text().map(|t| t.to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// JSON payloads embedded in `<script>` tags that mention fixtures.
/// Payloads that fail to decode are logged and skipped.
fn embedded_json_payloads(doc: &Html) -> Vec<Value> {
    let mut out = Vec::new();
    for script in doc.select(&SCRIPTS) {
        let is_json = script
            .value()
            .attr("type")
            .is_some_and(|t| t.to_ascii_lowercase().contains("json"));
        if !is_json {
            continue;
        }
        let raw = script.text().collect::<String>();
        let lower = raw.to_ascii_lowercase();
        if !CLASS_TOKENS.iter().any(|token| lower.contains(token)) {
            continue;
        }
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => out.push(value),
            Err(err) => warn!("skipping embedded json payload: {err}"),
        }
    }
    out
}

/// Depth-first walk collecting every object that exposes a fixture key.
pub fn find_json_fixture_objects(value: &Value) -> Vec<&Map<String, Value>> {
    let mut out = Vec::new();
    walk_json(value, &mut out);
    out
}

fn walk_json<'a>(value: &'a Value, out: &mut Vec<&'a Map<String, Value>>) {
    match value {
        Value::Object(map) => {
            if JSON_FIXTURE_KEYS.iter().any(|key| map.contains_key(*key)) {
                out.push(map);
            }
            for child in map.values() {
                walk_json(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_json(item, out);
            }
        }
        _ => {}
    }
}

fn extract_json_objects(objects: &[&Map<String, Value>], ctx: &SeasonContext) -> Vec<LooseFixture> {
    let mut out = Vec::new();
    for obj in objects {
        match fixture_from_json(obj, ctx) {
            Ok(Some(fixture)) => out.push(fixture),
            Ok(None) => {}
            Err(err) => warn!(season = %ctx.id, "skipping json fixture object: {err:#}"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FixtureStatus;

    fn ctx() -> SeasonContext {
        SeasonContext::new("87216", "2023/24 season", "Banks o' Dee")
    }

    fn only_fixtures(outcome: SeasonOutcome) -> (Strategy, Vec<LooseFixture>) {
        match outcome {
            SeasonOutcome::Fixtures {
                strategy, fixtures, ..
            } => (strategy, fixtures),
            SeasonOutcome::Empty { reason, .. } => panic!("expected fixtures, got {reason:?}"),
        }
    }

    #[test]
    fn sibling_date_feeds_the_scored_block() {
        let html = r#"<html><body>
            <div class="fixture-card">
              <span class="date">Sun, 02 Sep</span>
              <div class="match-line">Banks o' Dee 3-1 Deveronvale</div>
            </div></body></html>"#;
        let (strategy, fixtures) = only_fixtures(extract_season_document(html, &ctx()));
        assert_eq!(strategy, Strategy::ContainerClass);
        assert_eq!(fixtures.len(), 1);
        let f = &fixtures[0];
        assert_eq!(f.home_team, "Banks o' Dee");
        assert_eq!(f.away_team, "Deveronvale");
        assert_eq!(f.score.map(|s| (s.home, s.away)), Some((3, 1)));
        assert_eq!(f.status, FixtureStatus::Completed);
        assert_eq!(f.date.as_ref().map(ToString::to_string).as_deref(), Some("2023-09-02"));
        assert!(f.is_home);
    }

    #[test]
    fn grouped_dates_apply_to_following_rows() {
        let html = r#"<table>
            <tr><td>Sat, 05 Aug</td></tr>
            <tr class="fixture-row"><td>Huntly</td><td>0-2</td><td>Banks o' Dee</td></tr>
            <tr><td>Wed, 17 Jan</td></tr>
            <tr class="fixture-row"><td>Banks o' Dee</td><td>v</td><td>Nairn County</td></tr>
        </table>"#;
        let (strategy, fixtures) = only_fixtures(extract_season_document(html, &ctx()));
        assert_eq!(strategy, Strategy::TableRow);
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0].date.as_ref().map(ToString::to_string).as_deref(), Some("2023-08-05"));
        assert_eq!(fixtures[1].date.as_ref().map(ToString::to_string).as_deref(), Some("2024-01-17"));
        assert_eq!(fixtures[1].status, FixtureStatus::Upcoming);
    }

    #[test]
    fn date_sweep_catches_unclassed_markup() {
        let html = r#"<div><div>
            <p>Sat, 14 Oct</p>
            <p>Banks o' Dee 4-0 Strathspey Thistle</p>
            <p>Highland League</p>
        </div></div>"#;
        let (strategy, fixtures) = only_fixtures(extract_season_document(html, &ctx()));
        assert_eq!(strategy, Strategy::DateSweep);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].competition, "Highland League");
        assert_eq!(fixtures[0].date.as_ref().map(ToString::to_string).as_deref(), Some("2023-10-14"));
    }

    #[test]
    fn embedded_json_when_markup_has_nothing() {
        let html = r#"<html><head>
            <script type="application/json">{ broken json, fixture</script>
            <script type="application/json">
              {"props": {"fixtures": [
                {"date": "02/09/2023", "homeTeam": {"name": "Banks o' Dee"}, "awayTeam": {"name": "Deveronvale"},
                 "competition": "Highland League", "result": {"homeScore": 3, "awayScore": 1}},
                {"date": "TBC", "homeTeam": "Keith", "awayTeam": "Banks o' Dee", "status": "upcoming"}
              ]}}
            </script></head><body><p>Loading…</p></body></html>"#;
        let (strategy, fixtures) = only_fixtures(extract_season_document(html, &ctx()));
        assert_eq!(strategy, Strategy::EmbeddedJson);
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0].status, FixtureStatus::Completed);
        assert_eq!(fixtures[1].date, None);
        assert_eq!(fixtures[1].status, FixtureStatus::Upcoming);
    }

    #[test]
    fn raw_json_document_is_walked() {
        let body = r#"[{"fixture": {"homeTeam": "A", "awayTeam": "B", "date": "2024-03-02"}}]"#;
        let (strategy, fixtures) = only_fixtures(extract_season_document(body, &ctx()));
        assert_eq!(strategy, Strategy::JsonDocument);
        assert_eq!(fixtures.len(), 1);
    }

    #[test]
    fn nothing_found_is_an_empty_outcome() {
        let outcome = extract_season_document("<html><body><p>Under construction</p></body></html>", &ctx());
        assert_eq!(
            outcome,
            SeasonOutcome::Empty {
                season: "87216".to_string(),
                reason: EmptyReason::NoCandidateBlocks
            }
        );

        let outcome = extract_season_document(r#"<div class="match-report">Report text</div>"#, &ctx());
        assert_eq!(
            outcome,
            SeasonOutcome::Empty {
                season: "87216".to_string(),
                reason: EmptyReason::NoUsableBlocks { candidates: 1 }
            }
        );
    }

    #[test]
    fn team_names_that_start_like_months_keep_the_sibling_date() {
        let html = r#"<ul>
            <li class="date-row">Sat, 14 Oct</li>
            <li class="fixture">Maryhill 2-0 Banks o' Dee</li>
            <li class="fixture">Banks o' Dee 1-1 Mayfield 2 XI</li>
        </ul>"#;
        let ctx = SeasonContext::new("87216", "2023/24", "Banks o' Dee");
        let (_, fixtures) = only_fixtures(extract_season_document(html, &ctx));
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0].home_team, "Maryhill");
        assert_eq!(fixtures[1].away_team, "Mayfield 2 XI");
        for f in &fixtures {
            assert_eq!(f.date.as_ref().map(ToString::to_string).as_deref(), Some("2023-10-14"));
        }
    }

    #[test]
    fn malformed_block_is_skipped_and_the_rest_kept() {
        let html = r#"<ul>
            <li class="fixture">Banks o' Dee 99999999999-1 Keith</li>
            <li class="fixture">Huntly 0-2 Banks o' Dee</li>
        </ul>"#;
        let (_, fixtures) = only_fixtures(extract_season_document(html, &ctx()));
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].home_team, "Huntly");
    }

    #[test]
    fn json_walk_is_depth_first() {
        let value: Value = serde_json::from_str(
            r#"{"match": {"date": "x", "inner": [{"homeTeam": "A"}]}, "other": {"fixture": 1}}"#,
        )
        .unwrap();
        let objects = find_json_fixture_objects(&value);
        assert_eq!(objects.len(), 4);
        assert!(objects[0].contains_key("match"));
        assert!(objects[1].contains_key("date"));
        assert!(objects[2].contains_key("homeTeam"));
    }
}
