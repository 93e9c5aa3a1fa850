use serde_json::Value;

use crate::export::Table;

/// One `INSERT` per row over the table's full column set.
///
/// Absent cells become `NULL`, strings are single-quoted with embedded
/// quotes doubled, and booleans are `TRUE` / `FALSE`.
pub fn insert_statements(table_name: &str, table: &Table) -> String {
    if table.rows.is_empty() {
        return String::new();
    }
    let columns = table
        .columns
        .iter()
        .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = String::new();
    for row in &table.rows {
        let values = table
            .columns
            .iter()
            .map(|c| sql_literal(row.get(c).unwrap_or(&Value::Null)))
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(&format!("INSERT INTO {table_name} ({columns}) VALUES ({values});\n"));
    }
    sql
}

pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

/// The `import.sql` document: teams, then competitions, then matches.
pub fn import_script(teams: &Table, competitions: &Table, matches: &Table) -> String {
    let mut sql = String::new();
    for (title, name, table) in [
        ("Teams", "teams", teams),
        ("Competitions", "competitions", competitions),
        ("Matches", "matches", matches),
    ] {
        sql.push_str(&format!("-- {title}\n"));
        sql.push_str(&insert_statements(name, table));
        sql.push('\n');
    }
    sql
}
