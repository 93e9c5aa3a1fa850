use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};

pub const DEFAULT_BASE_URL: &str = "https://www.banksodeefc.com/teams/211103/fixtures-results";
pub const DEFAULT_CLUB_NAME: &str = "Banks o' Dee";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const DEFAULT_PAUSE_MS: u64 = 2000;
const MIN_PAUSE_MS: u64 = 250;
const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub club_name: String,
    pub output_dir: PathBuf,
    /// Sleep between consecutive season fetches.
    pub season_pause: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    /// Only these season ids are fetched when set.
    pub season_filter: Option<Vec<String>>,
    pub literal_season: Option<String>,
    pub use_cache: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            club_name: DEFAULT_CLUB_NAME.to_string(),
            output_dir: PathBuf::from("output"),
            season_pause: Duration::from_millis(DEFAULT_PAUSE_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            season_filter: None,
            literal_season: None,
            use_cache: true,
        }
    }
}

impl ScrapeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = env_string("FIXTURES_BASE_URL").unwrap_or(defaults.base_url);
        let club_name = env_string("FIXTURES_CLUB_NAME").unwrap_or(defaults.club_name);
        let output_dir = env_string("FIXTURES_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);
        let season_pause = Duration::from_millis(
            env::var("FIXTURES_SEASON_PAUSE_MS")
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_PAUSE_MS)
                .max(MIN_PAUSE_MS),
        );
        let timeout = Duration::from_secs(
            env::var("FIXTURES_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .clamp(1, 300),
        );
        let user_agent = env_string("FIXTURES_USER_AGENT").unwrap_or(defaults.user_agent);
        let season_filter = env_string("FIXTURES_SEASONS")
            .map(|raw| parse_season_list(&raw))
            .filter(|ids| !ids.is_empty());
        let literal_season = env_string("FIXTURES_LITERAL_SEASON");
        let use_cache = env_bool("FIXTURES_CACHE", true);

        Self {
            base_url,
            club_name,
            output_dir,
            season_pause,
            timeout,
            user_agent,
            season_filter,
            literal_season,
            use_cache,
        }
    }

    /// Apply `--out` and `--seasons` overrides from the command line.
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if let Some(out) = arg_value(args, "--out")? {
            self.output_dir = PathBuf::from(out);
        }
        if let Some(raw) = arg_value(args, "--seasons")? {
            let ids = parse_season_list(&raw);
            if ids.is_empty() {
                return Err(anyhow!("--seasons needs at least one season id"));
            }
            self.season_filter = Some(ids);
        }
        Ok(())
    }

    pub fn season_url(&self, season_id: &str) -> String {
        format!("{}?season={season_id}", self.base_url)
    }
}

/// Value of `--name=value` or `--name value`. A bare flag at the end is an error.
pub fn arg_value(args: &[String], name: &str) -> Result<Option<String>> {
    let prefix = format!("{name}=");
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(rest) = arg.strip_prefix(&prefix) {
            return Ok(Some(rest.to_string()));
        }
        if arg == name {
            return iter
                .next()
                .map(|v| Some(v.to_string()))
                .ok_or_else(|| anyhow!("{name} expects a value"));
        }
    }
    Ok(None)
}

pub fn parse_season_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reads_both_arg_forms() {
        let a = args(&["--out=dist", "--seasons", "87216,91607"]);
        assert_eq!(arg_value(&a, "--out").unwrap().as_deref(), Some("dist"));
        assert_eq!(arg_value(&a, "--seasons").unwrap().as_deref(), Some("87216,91607"));
        assert_eq!(arg_value(&a, "--file").unwrap(), None);
        assert!(arg_value(&args(&["--out"]), "--out").is_err());
    }

    #[test]
    fn overrides_apply() {
        let mut config = ScrapeConfig::default();
        config
            .apply_args(&args(&["--out", "dist", "--seasons=87216 91607"]))
            .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert_eq!(
            config.season_filter,
            Some(vec!["87216".to_string(), "91607".to_string()])
        );
        assert!(config.apply_args(&args(&["--seasons=,"])).is_err());
    }

    #[test]
    fn season_urls() {
        let config = ScrapeConfig {
            base_url: "https://club.example/fixtures".to_string(),
            ..ScrapeConfig::default()
        };
        assert_eq!(
            config.season_url("87216"),
            "https://club.example/fixtures?season=87216"
        );
    }
}
