use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::fixture::{FixtureDraft, FixtureStatus, LooseFixture, MatchDate, UNKNOWN_COMPETITION};
use crate::normalize::{normalize_ws, parse_clock_time, parse_generic_date, strip_date_noise};
use crate::season::SeasonContext;

static SCORED_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)\s+(\d+)\s*[-:]\s*(\d+)\s+(.+)$").expect("valid scored pair regex")
});

static VERSUS_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?)\s+(?:v|vs|versus)\.?\s+(.+)$").expect("valid versus regex")
});

static VENUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bvenue\s*[-:]\s*(.+)$").expect("valid venue regex"));

// Whole word only: a team line such as "Cupar Hearts" must stay in the joined text.
static CUP_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcup\b").expect("valid cup regex"));

enum CompetitionRule {
    /// Case-insensitive substring mapped onto a fixed label.
    Label {
        needle: &'static str,
        label: &'static str,
    },
    /// Any line containing "cup" is used verbatim.
    CupLine,
}

const COMPETITION_RULES: &[CompetitionRule] = &[
    CompetitionRule::Label {
        needle: "friendly",
        label: "Friendly",
    },
    CompetitionRule::Label {
        needle: "highland league",
        label: "Highland League",
    },
    CompetitionRule::CupLine,
];

const TEAM_KEYS: [(&str, &str); 2] = [("homeTeam", "awayTeam"), ("home_team", "away_team")];

const MAPPABLE_KEYS: &[&str] = &[
    "date",
    "competition",
    "homeTeam",
    "awayTeam",
    "home_team",
    "away_team",
];

/// Keys that make a JSON object worth handing to [`fixture_from_json`].
pub const JSON_FIXTURE_KEYS: &[&str] = &[
    "date",
    "homeTeam",
    "awayTeam",
    "home_team",
    "away_team",
    "match",
    "fixture",
];

/// Team pair recovered from a block, with the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamPair {
    pub home: String,
    pub away: String,
    pub score: Option<(u32, u32)>,
    pub status: FixtureStatus,
    /// Index into the block lines, `None` when the pair only appeared once
    /// the lines were joined.
    pub line: Option<usize>,
}

/// Text lines of one block, as they appeared in its text nodes.
#[derive(Debug, Clone, Default)]
pub struct BlockText {
    lines: Vec<String>,
}

impl BlockText {
    pub fn from_fragments<'a, I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let lines = fragments
            .into_iter()
            .map(normalize_ws)
            .filter(|line| !line.is_empty())
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Turn one text block into a fixture.
///
/// `Ok(None)` means the block holds no team pair and is simply skipped.
/// A score too large to be real is an error for this block.
/// The date comes from the locator; it is never re-derived here.
pub fn extract_text_block(
    block: &BlockText,
    date: Option<MatchDate>,
    ctx: &SeasonContext,
) -> Result<Option<LooseFixture>> {
    if block.is_empty() {
        return Ok(None);
    }
    let Some(pair) = extract_teams(block)? else {
        return Ok(None);
    };

    let mut draft = FixtureDraft::default()
        .teams(&pair.home, &pair.away)
        .status(pair.status)
        .date(date);
    if let Some((home, away)) = pair.score {
        draft = draft.score(home, away);
    }
    draft.competition = Some(detect_competition(block.lines(), pair.line));
    draft.venue = detect_venue(block.lines());
    draft.time = detect_time(block.lines(), pair.line);

    Ok(draft.build(ctx))
}

/// Scored pair first, then the versus form; each tried per line before
/// falling back to the whole block on one line.
pub fn extract_teams(block: &BlockText) -> Result<Option<TeamPair>> {
    let cleaned: Vec<String> = block.lines().iter().map(|l| strip_date_noise(l)).collect();
    // Label lines stay out of the joined text so they cannot prefix a team name.
    let joined = strip_date_noise(
        &block
            .lines()
            .iter()
            .filter(|line| !is_label_line(line))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" "),
    );

    for (idx, line) in cleaned.iter().enumerate() {
        if let Some(pair) = scored_pair(line)? {
            return Ok(Some(TeamPair {
                line: Some(idx),
                ..pair
            }));
        }
    }
    if let Some(pair) = scored_pair(&joined)? {
        return Ok(Some(pair));
    }

    Ok(cleaned
        .iter()
        .enumerate()
        .find_map(|(idx, line)| versus_pair(line).map(|p| TeamPair { line: Some(idx), ..p }))
        .or_else(|| versus_pair(&joined)))
}

fn scored_pair(text: &str) -> Result<Option<TeamPair>> {
    let Some(caps) = SCORED_PAIR.captures(text) else {
        return Ok(None);
    };
    let home = clean_team(&caps[1]);
    let away = clean_team(&caps[4]);
    if home.is_empty() || away.is_empty() {
        return Ok(None);
    }
    let home_score = goals(&caps[2])?;
    let away_score = goals(&caps[3])?;
    Ok(Some(TeamPair {
        home,
        away,
        score: Some((home_score, away_score)),
        status: FixtureStatus::Completed,
        line: None,
    }))
}

fn goals(raw: &str) -> Result<u32> {
    raw.parse::<u32>()
        .with_context(|| format!("score out of range: {raw}"))
}

fn versus_pair(text: &str) -> Option<TeamPair> {
    let caps = VERSUS_PAIR.captures(text)?;
    let home = clean_team(caps.get(1)?.as_str());
    let away = clean_team(caps.get(2)?.as_str());
    if home.is_empty() || away.is_empty() {
        return None;
    }
    Some(TeamPair {
        home,
        away,
        score: None,
        status: FixtureStatus::Upcoming,
        line: None,
    })
}

fn is_label_line(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    COMPETITION_RULES.iter().any(|rule| match rule {
        CompetitionRule::Label { needle, .. } => lower.contains(needle),
        CompetitionRule::CupLine => CUP_WORD.is_match(line),
    }) || VENUE.is_match(line)
}

fn clean_team(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '|' | ',' | '-' | ':' | '/'))
        .to_string()
}

/// First competition rule that matches any line wins. The team line is
/// skipped so a side like "Cupar Hearts" cannot label its own fixture.
pub fn detect_competition(lines: &[String], team_line: Option<usize>) -> String {
    for rule in COMPETITION_RULES {
        for (idx, line) in lines.iter().enumerate() {
            if Some(idx) == team_line {
                continue;
            }
            match rule {
                CompetitionRule::Label { needle, label } => {
                    if line.to_ascii_lowercase().contains(needle) {
                        return (*label).to_string();
                    }
                }
                CompetitionRule::CupLine => {
                    if line.to_ascii_lowercase().contains("cup") {
                        return line.trim().to_string();
                    }
                }
            }
        }
    }
    UNKNOWN_COMPETITION.to_string()
}

pub fn detect_venue(lines: &[String]) -> Option<String> {
    lines.iter().find_map(|line| {
        let caps = VENUE.captures(line)?;
        let venue = caps.get(1)?.as_str().trim();
        (!venue.is_empty()).then(|| venue.to_string())
    })
}

fn detect_time(lines: &[String], team_line: Option<usize>) -> Option<String> {
    lines
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != team_line)
        .find_map(|(_, line)| parse_clock_time(line))
}

/// Map a JSON object straight onto a fixture by key.
///
/// Objects without any fixture-ish key, or without both team names, give
/// `Ok(None)`. Team fields of an unsupported shape are an error for this
/// block only.
pub fn fixture_from_json(obj: &Map<String, Value>, ctx: &SeasonContext) -> Result<Option<LooseFixture>> {
    let qualifies = MAPPABLE_KEYS.iter().any(|key| obj.contains_key(*key));
    if !qualifies {
        return Ok(None);
    }

    let mut draft = FixtureDraft::default();
    for (home_key, away_key) in TEAM_KEYS {
        if draft.home_team.is_none() {
            draft.home_team = obj.get(home_key).map(named_value).transpose()?.flatten();
        }
        if draft.away_team.is_none() {
            draft.away_team = obj.get(away_key).map(named_value).transpose()?.flatten();
        }
    }

    draft.date = obj
        .get("date")
        .and_then(Value::as_str)
        .and_then(parse_generic_date);
    draft.time = obj
        .get("time")
        .and_then(Value::as_str)
        .and_then(parse_clock_time);
    draft.competition = obj
        .get("competition")
        .map(named_value)
        .transpose()?
        .flatten();
    draft.venue = obj.get("venue").map(named_value).transpose()?.flatten();

    let result = obj.get("result").and_then(Value::as_object).unwrap_or(obj);
    draft.home_score = result
        .get("homeScore")
        .or_else(|| obj.get("homeScore"))
        .and_then(as_u32_any);
    draft.away_score = result
        .get("awayScore")
        .or_else(|| obj.get("awayScore"))
        .and_then(as_u32_any);

    draft.status = Some(
        obj.get("status")
            .and_then(Value::as_str)
            .map(status_from_str)
            .unwrap_or(FixtureStatus::Upcoming),
    );

    Ok(draft.build(ctx))
}

/// A string, or an object carrying a `name`.
fn named_value(v: &Value) -> Result<Option<String>> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Object(map) => Ok(map
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.to_string())),
        other => Err(anyhow!("unsupported name field: {other}")),
    }
}

fn as_u32_any(v: &Value) -> Option<u32> {
    if let Some(n) = v.as_u64() {
        return u32::try_from(n).ok();
    }
    v.as_str()?.trim().parse::<u32>().ok()
}

fn status_from_str(raw: &str) -> FixtureStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "completed" | "finished" | "result" | "ft" => FixtureStatus::Completed,
        "upcoming" | "scheduled" | "fixture" | "not started" => FixtureStatus::Upcoming,
        _ => FixtureStatus::Unknown,
    }
}
