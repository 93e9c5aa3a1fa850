use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::fixture::LooseFixture;
use crate::pipeline::RunReport;
use crate::schema::CanonicalSchema;
use crate::sql_export::import_script;
use crate::ts_export::fixtures_literal;

/// Records flattened to rows over the union of their keys.
///
/// Columns keep the order in which keys are first seen, record by record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

impl Table {
    pub fn from_records<T: Serialize>(records: &[T]) -> Result<Self> {
        let mut table = Table::default();
        for record in records {
            let value = serde_json::to_value(record).context("serialize export record")?;
            let Value::Object(row) = value else {
                return Err(anyhow!("export record is not an object"));
            };
            for key in row.keys() {
                if !table.columns.iter().any(|c| c == key) {
                    table.columns.push(key.clone());
                }
            }
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Header row followed by one text row per record.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        out.push(self.columns.clone());
        for row in &self.rows {
            out.push(
                self.columns
                    .iter()
                    .map(|c| cell_text(row.get(c).unwrap_or(&Value::Null)))
                    .collect(),
            );
        }
        out
    }
}

pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

pub fn write_csv_row<W: Write>(w: &mut W, row: &[String]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

pub fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    for row in table.text_rows() {
        write_csv_row(&mut w, &row).with_context(|| format!("write {}", path.display()))?;
    }
    w.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

pub fn write_workbook(path: &Path, sheets: &[(&str, &Table)]) -> Result<()> {
    let mut workbook = Workbook::new();
    for (name, table) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(*name)
            .with_context(|| format!("name sheet {name}"))?;
        write_cells(worksheet, table)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(())
}

fn write_cells(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    for (col_idx, column) in table.columns.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, column)
            .with_context(|| format!("write header ({col_idx})"))?;
    }
    for (idx, row) in table.rows.iter().enumerate() {
        let row_idx = idx as u32 + 1;
        for (col_idx, column) in table.columns.iter().enumerate() {
            let col = col_idx as u16;
            let written = match row.get(column) {
                None | Some(Value::Null) => continue,
                Some(Value::Bool(b)) => worksheet.write_boolean(row_idx, col, *b).map(|_| ()),
                Some(Value::Number(n)) => match n.as_f64() {
                    Some(f) => worksheet.write_number(row_idx, col, f).map(|_| ()),
                    None => worksheet.write_string(row_idx, col, n.to_string()).map(|_| ()),
                },
                Some(other) => worksheet
                    .write_string(row_idx, col, cell_text(other))
                    .map(|_| ()),
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

/// Paths written by [`write_outputs`], in write order.
#[derive(Debug, Clone, Default)]
pub struct OutputSummary {
    pub files: Vec<PathBuf>,
    pub literal_season: Option<String>,
    pub literal_fixtures: usize,
}

/// Write every export for one run into `dir`.
///
/// `literal_season` picks the season for `fixturesData.ts`; without one the
/// first season of the report is used.
pub fn write_outputs(
    dir: &Path,
    report: &RunReport,
    schema: &CanonicalSchema,
    literal_season: Option<&str>,
) -> Result<OutputSummary> {
    fs::create_dir_all(dir).with_context(|| format!("create output dir {}", dir.display()))?;
    let mut summary = OutputSummary::default();

    let raw = Table::from_records(&report.fixtures)?;
    let path = dir.join("fixtures_raw.csv");
    write_csv(&path, &raw)?;
    summary.files.push(path);

    for season in &report.seasons {
        let rows: Vec<&LooseFixture> = report.fixtures_for_season(&season.id).collect();
        let path = dir.join(format!("season_{}_fixtures.csv", season.id));
        write_csv(&path, &Table::from_records(&rows)?)?;
        summary.files.push(path);
    }

    let teams = Table::from_records(&schema.teams)?;
    let competitions = Table::from_records(&schema.competitions)?;
    let matches = Table::from_records(&schema.fixtures)?;

    for (name, table) in [
        ("matches.csv", &matches),
        ("teams.csv", &teams),
        ("competitions.csv", &competitions),
    ] {
        let path = dir.join(name);
        write_csv(&path, table)?;
        summary.files.push(path);
    }

    let path = dir.join("fixtures.xlsx");
    write_workbook(
        &path,
        &[
            ("Teams", &teams),
            ("Competitions", &competitions),
            ("Matches", &matches),
        ],
    )?;
    summary.files.push(path);

    let path = dir.join("import.sql");
    fs::write(&path, import_script(&teams, &competitions, &matches))
        .with_context(|| format!("write {}", path.display()))?;
    summary.files.push(path);

    let season = literal_season
        .map(str::to_string)
        .or_else(|| report.seasons.first().map(|s| s.id.clone()));
    if let Some(season) = season {
        let fixtures: Vec<&LooseFixture> = report.fixtures_for_season(&season).collect();
        let path = dir.join("fixturesData.ts");
        fs::write(&path, fixtures_literal(fixtures.iter().copied()))
            .with_context(|| format!("write {}", path.display()))?;
        summary.files.push(path);
        summary.literal_fixtures = fixtures.len();
        summary.literal_season = Some(season);
    }

    let path = dir.join("schema.json");
    let json = serde_json::to_string_pretty(schema).context("serialize schema")?;
    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    summary.files.push(path);

    info!(dir = %dir.display(), files = summary.files.len(), "outputs written");
    Ok(summary)
}
