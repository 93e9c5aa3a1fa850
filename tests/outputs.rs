use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;

use club_fixtures::config::ScrapeConfig;
use club_fixtures::export::{Table, write_outputs};
use club_fixtures::pipeline::{RunReport, run_seasons};
use club_fixtures::schema::{CanonicalSchema, assemble};
use club_fixtures::source::StaticPageSource;

const BASE: &str = "https://club.example/teams/1/fixtures-results";

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn config() -> ScrapeConfig {
    ScrapeConfig {
        base_url: BASE.to_string(),
        season_pause: Duration::ZERO,
        ..ScrapeConfig::default()
    }
}

fn replay_run() -> (RunReport, CanonicalSchema) {
    let mut source = StaticPageSource::new()
        .with_page(BASE, read_fixture("season_index.html"))
        .with_page(&format!("{BASE}?season=87216"), read_fixture("season_2023_24.html"))
        .with_page(&format!("{BASE}?season=58857"), read_fixture("season_2018_19_table.html"));
    source.insert(
        &format!("{BASE}?season=91607"),
        503,
        read_fixture("empty_season.html"),
    );
    let report = run_seasons(&source, &config()).expect("replayed run");
    let schema = assemble(&report.fixtures);
    (report, schema)
}

fn out_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("club_fixtures_{}_{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn replayed_run_covers_every_season() {
    let (report, schema) = replay_run();
    assert!(report.errors.is_empty(), "{:?}", report.errors);

    let ids: Vec<_> = report.seasons.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["87216", "58857", "91607"]);
    assert_eq!(report.seasons[0].fixtures, 4);
    assert_eq!(report.seasons[1].fixtures, 3);
    assert_eq!(report.seasons[2].status, Some(503));
    assert!(report.seasons[2].empty);

    // 4 + 3 fixtures plus the sentinel of the empty season.
    assert_eq!(report.fixtures.len(), 8);
    assert!(report.fixtures[7].is_sentinel());
    assert_eq!(schema.fixtures.len(), 8);

    let mut names: Vec<&str> = report
        .fixtures
        .iter()
        .flat_map(|f| [f.home_team.as_str(), f.away_team.as_str()])
        .collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(schema.teams.len(), names.len());
    assert_eq!(schema.teams[0].name, "Banks o' Dee");
    assert_eq!(schema.teams[0].id, "team_1");
}

#[test]
fn outputs_are_written_and_sql_loads() {
    let (report, schema) = replay_run();
    let dir = out_dir("outputs");
    let summary = write_outputs(&dir, &report, &schema, None).expect("outputs written");

    for name in [
        "fixtures_raw.csv",
        "season_87216_fixtures.csv",
        "season_58857_fixtures.csv",
        "season_91607_fixtures.csv",
        "matches.csv",
        "teams.csv",
        "competitions.csv",
        "fixtures.xlsx",
        "import.sql",
        "fixturesData.ts",
        "schema.json",
    ] {
        assert!(dir.join(name).is_file(), "missing {name}");
    }
    assert_eq!(summary.literal_season.as_deref(), Some("87216"));
    assert_eq!(summary.literal_fixtures, 4);

    let teams_csv = fs::read_to_string(dir.join("teams.csv")).unwrap();
    assert!(teams_csv.starts_with("id,name,logo\nteam_1,Banks o' Dee,\n"));

    let sql = fs::read_to_string(dir.join("import.sql")).unwrap();
    assert!(sql.contains("-- Teams\n"));
    assert!(sql.contains("-- Competitions\n"));
    assert!(sql.contains("-- Matches\n"));

    let conn = Connection::open_in_memory().unwrap();
    for (name, records) in [
        ("teams", Table::from_records(&schema.teams).unwrap()),
        ("competitions", Table::from_records(&schema.competitions).unwrap()),
        ("matches", Table::from_records(&schema.fixtures).unwrap()),
    ] {
        let columns = records
            .columns
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute_batch(&format!("CREATE TABLE {name} ({columns});"))
            .unwrap();
    }
    conn.execute_batch(&sql).expect("generated sql should execute");

    let matches: i64 = conn
        .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))
        .unwrap();
    assert_eq!(matches as usize, schema.fixtures.len());

    let club: String = conn
        .query_row("SELECT name FROM teams WHERE id = 'team_1'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(club, "Banks o' Dee");

    let unscored: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM matches WHERE \"homeScore\" IS NULL",
            [],
            |row| row.get(0),
        )
        .unwrap();
    let expected = schema.fixtures.iter().filter(|m| m.home_score.is_none()).count();
    assert_eq!(unscored as usize, expected);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn typed_literal_follows_the_chosen_season() {
    let (report, schema) = replay_run();
    let dir = out_dir("literal");
    let summary = write_outputs(&dir, &report, &schema, Some("58857")).expect("outputs written");
    assert_eq!(summary.literal_fixtures, 3);

    let ts = fs::read_to_string(dir.join("fixturesData.ts")).unwrap();
    assert!(ts.contains("export const allFixtures = ["));
    assert_eq!(ts.matches("ticketLink: \"\"").count(), 3);
    assert!(ts.contains("homeTeam: \"Fraserburgh\""));
    assert!(ts.contains("result: {\n      homeScore: 4,\n      awayScore: 2\n    }"));
    assert!(!ts.contains("Inverurie"));

    let schema_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("schema.json")).unwrap()).unwrap();
    assert_eq!(schema_json["fixtures"][0]["id"], "match_1");
    assert_eq!(schema_json["teams"][0]["logo"], serde_json::Value::Null);

    let _ = fs::remove_dir_all(&dir);
}
