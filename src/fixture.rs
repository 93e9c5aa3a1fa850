use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::season::SeasonContext;

pub const UNKNOWN_COMPETITION: &str = "Unknown";
pub const SENTINEL_HOME_TEAM: &str = "ERROR: No fixtures found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
    Completed,
    Upcoming,
    #[default]
    Unknown,
}

impl FixtureStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FixtureStatus::Completed => "completed",
            FixtureStatus::Upcoming => "upcoming",
            FixtureStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FixtureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixture date: either a real calendar day or the source text that
/// no known layout could read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchDate {
    Calendar(NaiveDate),
    Unparsed(String),
}

impl MatchDate {
    pub fn is_calendar(&self) -> bool {
        matches!(self, MatchDate::Calendar(_))
    }

    pub fn calendar(&self) -> Option<NaiveDate> {
        match self {
            MatchDate::Calendar(date) => Some(*date),
            MatchDate::Unparsed(_) => None,
        }
    }
}

impl fmt::Display for MatchDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchDate::Calendar(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            MatchDate::Unparsed(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for MatchDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    #[serde(rename = "home_score")]
    pub home: u32,
    #[serde(rename = "away_score")]
    pub away: u32,
}

/// A fixture recovered from one block of a season document.
///
/// Only [`FixtureDraft::build`] produces these, so both team names are
/// always non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LooseFixture {
    pub date: Option<MatchDate>,
    pub time: Option<String>,
    pub home_team: String,
    pub away_team: String,
    #[serde(flatten)]
    pub score: Option<Score>,
    pub competition: String,
    pub venue: Option<String>,
    pub status: FixtureStatus,
    pub is_home: bool,
    pub season: String,
}

impl LooseFixture {
    pub fn home_score(&self) -> Option<u32> {
        self.score.map(|s| s.home)
    }

    pub fn away_score(&self) -> Option<u32> {
        self.score.map(|s| s.away)
    }

    pub fn is_sentinel(&self) -> bool {
        self.home_team == SENTINEL_HOME_TEAM
    }

    /// The in-band "nothing found" marker kept for downstream consumers that
    /// expect one row per season.
    pub fn sentinel(season_id: &str) -> Self {
        Self {
            date: None,
            time: None,
            home_team: SENTINEL_HOME_TEAM.to_string(),
            away_team: format!("Season ID: {season_id}"),
            score: None,
            competition: UNKNOWN_COMPETITION.to_string(),
            venue: None,
            status: FixtureStatus::Upcoming,
            is_home: false,
            season: season_id.to_string(),
        }
    }
}

/// Builder for [`LooseFixture`] with the team check deferred to `build`.
#[derive(Debug, Clone, Default)]
pub struct FixtureDraft {
    pub date: Option<MatchDate>,
    pub time: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub competition: Option<String>,
    pub venue: Option<String>,
    pub status: Option<FixtureStatus>,
}

impl FixtureDraft {
    pub fn teams(mut self, home: &str, away: &str) -> Self {
        self.home_team = Some(home.to_string());
        self.away_team = Some(away.to_string());
        self
    }

    pub fn score(mut self, home: u32, away: u32) -> Self {
        self.home_score = Some(home);
        self.away_score = Some(away);
        self
    }

    pub fn status(mut self, status: FixtureStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn date(mut self, date: Option<MatchDate>) -> Self {
        self.date = date;
        self
    }

    /// Finish the record, or `None` if either team name is blank.
    ///
    /// A half-present score is dropped. A full score forces `completed`.
    pub fn build(self, ctx: &SeasonContext) -> Option<LooseFixture> {
        let home_team = self.home_team.map(|s| s.trim().to_string()).unwrap_or_default();
        let away_team = self.away_team.map(|s| s.trim().to_string()).unwrap_or_default();
        if home_team.is_empty() || away_team.is_empty() {
            return None;
        }

        let score = match (self.home_score, self.away_score) {
            (Some(home), Some(away)) => Some(Score { home, away }),
            _ => None,
        };
        let status = if score.is_some() {
            FixtureStatus::Completed
        } else {
            self.status.unwrap_or_default()
        };
        let competition = self
            .competition
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNKNOWN_COMPETITION.to_string());
        let venue = self
            .venue
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let is_home = !ctx.club_name.is_empty() && home_team.contains(&ctx.club_name);

        Some(LooseFixture {
            date: self.date,
            time: self.time,
            home_team,
            away_team,
            score,
            competition,
            venue,
            status,
            is_home,
            season: ctx.id.clone(),
        })
    }
}

/// Which locating heuristic produced a season's blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ContainerClass,
    TableRow,
    DateSweep,
    EmbeddedJson,
    JsonDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    NoCandidateBlocks,
    NoUsableBlocks { candidates: usize },
}

/// Result of extracting one season document.
#[derive(Debug, Clone, PartialEq)]
pub enum SeasonOutcome {
    Fixtures {
        season: String,
        strategy: Strategy,
        fixtures: Vec<LooseFixture>,
    },
    Empty {
        season: String,
        reason: EmptyReason,
    },
}

impl SeasonOutcome {
    pub fn season(&self) -> &str {
        match self {
            SeasonOutcome::Fixtures { season, .. } | SeasonOutcome::Empty { season, .. } => season,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SeasonOutcome::Empty { .. })
    }

    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            SeasonOutcome::Fixtures { strategy, .. } => Some(*strategy),
            SeasonOutcome::Empty { .. } => None,
        }
    }

    /// Flatten to records; an empty season becomes a single sentinel row.
    pub fn into_fixtures(self) -> Vec<LooseFixture> {
        match self {
            SeasonOutcome::Fixtures { fixtures, .. } => fixtures,
            SeasonOutcome::Empty { season, .. } => vec![LooseFixture::sentinel(&season)],
        }
    }
}
