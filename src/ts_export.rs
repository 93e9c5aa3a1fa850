use std::fmt::Write as _;

use crate::fixture::{FixtureStatus, LooseFixture};

const HEADER: &str = "// fixturesData.ts - generated from the club fixtures pages\n\n";

/// `fixturesData.ts` for one season: `export const allFixtures = [...]`.
///
/// Optional fields are left out instead of written as `null`; ids restart
/// at 1 within the export.
pub fn fixtures_literal<'a, I>(fixtures: I) -> String
where
    I: IntoIterator<Item = &'a LooseFixture>,
{
    let entries: Vec<String> = fixtures
        .into_iter()
        .enumerate()
        .map(|(idx, fixture)| fixture_entry(idx + 1, fixture))
        .collect();

    let mut out = String::from(HEADER);
    out.push_str("export const allFixtures = [\n");
    out.push_str(&entries.join(",\n"));
    if !entries.is_empty() {
        out.push('\n');
    }
    out.push_str("];\n");
    out
}

fn fixture_entry(id: usize, fixture: &LooseFixture) -> String {
    let mut fields: Vec<String> = vec![
        format!("id: {}", quote(&id.to_string())),
        format!("competition: {}", quote(&fixture.competition)),
    ];
    if let Some(date) = &fixture.date {
        fields.push(format!("date: {}", quote(&date.to_string())));
    }
    if let Some(time) = &fixture.time {
        fields.push(format!("time: {}", quote(time)));
    }
    fields.push(format!("homeTeam: {}", quote(&fixture.home_team)));
    fields.push(format!("awayTeam: {}", quote(&fixture.away_team)));
    if let Some(venue) = &fixture.venue {
        fields.push(format!("venue: {}", quote(venue)));
    }
    let completed = fixture.status == FixtureStatus::Completed;
    fields.push(format!("status: {}", quote(fixture.status.as_str())));
    fields.push(format!("isCompleted: {completed}"));
    if completed && let Some(score) = fixture.score {
        fields.push(format!(
            "result: {{\n      homeScore: {},\n      awayScore: {}\n    }}",
            score.home, score.away
        ));
    }
    fields.push("ticketLink: \"\"".to_string());

    let mut entry = String::from("  {\n");
    for (i, field) in fields.iter().enumerate() {
        let sep = if i + 1 < fields.len() { "," } else { "" };
        let _ = writeln!(entry, "    {field}{sep}");
    }
    entry.push_str("  }");
    entry
}

// JSON string syntax is valid TypeScript string syntax.
fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text.replace('"', "\\\"")))
}
