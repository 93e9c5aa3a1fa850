use std::collections::HashMap;

use serde::Serialize;

use crate::fixture::{FixtureStatus, LooseFixture, MatchDate};

/// A deduplicated team or competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    pub logo: Option<String>,
}

/// A fixture that points at teams and competitions by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub competition: String,
    pub date: Option<MatchDate>,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub is_home: bool,
    pub status: FixtureStatus,
    pub season: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CanonicalSchema {
    pub teams: Vec<EntityRecord>,
    pub competitions: Vec<EntityRecord>,
    pub fixtures: Vec<MatchRecord>,
}

impl CanonicalSchema {
    pub fn team_by_name(&self, name: &str) -> Option<&EntityRecord> {
        self.teams.iter().find(|t| t.name == name)
    }

    pub fn competition_by_name(&self, name: &str) -> Option<&EntityRecord> {
        self.competitions.iter().find(|c| c.name == name)
    }

    pub fn team_name(&self, id: &str) -> Option<&str> {
        self.teams
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.name.as_str())
    }

    pub fn competition_name(&self, id: &str) -> Option<&str> {
        self.competitions
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }
}

/// Name to id table with ids handed out in first-seen order.
#[derive(Debug)]
struct EntityTable {
    prefix: &'static str,
    records: Vec<EntityRecord>,
    index: HashMap<String, usize>,
}

impl EntityTable {
    fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn intern(&mut self, name: &str) -> String {
        if let Some(&pos) = self.index.get(name) {
            return self.records[pos].id.clone();
        }
        let id = format!("{}_{}", self.prefix, self.records.len() + 1);
        self.index.insert(name.to_string(), self.records.len());
        self.records.push(EntityRecord {
            id: id.clone(),
            name: name.to_string(),
            logo: None,
        });
        id
    }
}

/// Folds loose fixtures into a [`CanonicalSchema`].
///
/// The id counters live here, one assembler per run, so folding the same
/// ordered input twice yields the same ids.
#[derive(Debug)]
pub struct SchemaAssembler {
    teams: EntityTable,
    competitions: EntityTable,
    fixtures: Vec<MatchRecord>,
}

impl Default for SchemaAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaAssembler {
    pub fn new() -> Self {
        Self {
            teams: EntityTable::new("team"),
            competitions: EntityTable::new("comp"),
            fixtures: Vec::new(),
        }
    }

    pub fn push(&mut self, fixture: &LooseFixture) {
        let home = fixture.home_team.trim();
        let away = fixture.away_team.trim();
        if home.is_empty() || away.is_empty() {
            return;
        }

        let home_team = self.teams.intern(home);
        let away_team = self.teams.intern(away);
        let competition = self.competitions.intern(&fixture.competition);

        self.fixtures.push(MatchRecord {
            id: format!("match_{}", self.fixtures.len() + 1),
            home_team,
            away_team,
            competition,
            date: fixture.date.clone(),
            time: fixture.time.clone(),
            venue: fixture.venue.clone(),
            is_home: fixture.is_home,
            status: fixture.status,
            season: fixture.season.clone(),
            home_score: fixture.home_score(),
            away_score: fixture.away_score(),
        });
    }

    pub fn finish(self) -> CanonicalSchema {
        CanonicalSchema {
            teams: self.teams.records,
            competitions: self.competitions.records,
            fixtures: self.fixtures,
        }
    }
}

pub fn assemble(fixtures: &[LooseFixture]) -> CanonicalSchema {
    let mut assembler = SchemaAssembler::new();
    for fixture in fixtures {
        assembler.push(fixture);
    }
    assembler.finish()
}
