use chrono::{Datelike, Local};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::normalize::normalize_ws;

static SEASON_SELECT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"select[name="season"]"#).expect("valid selector"));
static ANY_SELECT: Lazy<Selector> = Lazy::new(|| Selector::parse("select").expect("valid selector"));
static OPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("option").expect("valid selector"));

/// One entry of the site's season picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonOption {
    pub id: String,
    pub name: String,
}

/// Everything extraction needs to know about the season being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonContext {
    /// Identifier stamped on every fixture (the site's season id).
    pub id: String,
    /// Human label such as `2023/24 season`, used to resolve years.
    pub label: String,
    /// Club whose appearance as home team sets `is_home`.
    pub club_name: String,
}

impl SeasonContext {
    pub fn new(id: &str, label: &str, club_name: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            club_name: club_name.to_string(),
        }
    }

    pub fn from_option(option: &SeasonOption, club_name: &str) -> Self {
        Self::new(&option.id, &option.name, club_name)
    }

    /// Calendar year for a month within this season. Labels without a
    /// readable `YYYY/YY` shape fall back to the current year.
    pub fn year_for_month(&self, month: u32) -> i32 {
        resolve_year_num(&self.label, month).unwrap_or_else(|| Local::now().year())
    }
}

/// Calendar year that a two-digit month falls in for a season label.
///
/// August to December belong to the starting year, January to July to the
/// second one: `("2023/24", "09")` is `2023`, `("2023/24", "03")` is `2024`.
pub fn resolve_year(label: &str, month: &str) -> Option<String> {
    let month = month.trim().parse::<u32>().ok()?;
    resolve_year_num(label, month).map(|y| y.to_string())
}

fn resolve_year_num(label: &str, month: u32) -> Option<i32> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let (first, second) = season_years(label)?;
    Some(if month >= 8 { first } else { second })
}

/// Starting and ending calendar years of a `YYYY/YY` or `YYYY/YYYY` label.
pub fn season_years(label: &str) -> Option<(i32, i32)> {
    let (head, tail) = label.split_once('/')?;

    let first_digits = trailing_digits(head.trim());
    if first_digits.len() != 4 {
        return None;
    }
    let first = first_digits.parse::<i32>().ok()?;

    let second_digits = leading_digits(tail.trim());
    let second = match second_digits.len() {
        4 => second_digits.parse::<i32>().ok()?,
        2 => {
            let short = second_digits.parse::<i32>().ok()?;
            let mut year = first - first % 100 + short;
            if year < first {
                year += 100;
            }
            year
        }
        _ => return None,
    };
    Some((first, second))
}

fn trailing_digits(s: &str) -> &str {
    let start = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[start..]
}

fn leading_digits(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    &s[..end]
}

/// Read the season picker: the `select[name=season]` control, or failing
/// that the first `select` on the page. Options without a value are skipped.
pub fn parse_season_options(html: &str) -> Vec<SeasonOption> {
    let doc = Html::parse_document(html);
    let Some(select) = doc
        .select(&SEASON_SELECT)
        .next()
        .or_else(|| doc.select(&ANY_SELECT).next())
    else {
        return Vec::new();
    };

    select
        .select(&OPTION)
        .filter_map(|option| {
            let id = option.value().attr("value")?.trim();
            if id.is_empty() {
                return None;
            }
            Some(SeasonOption {
                id: id.to_string(),
                name: normalize_ws(&option.text().collect::<String>()),
            })
        })
        .collect()
}
