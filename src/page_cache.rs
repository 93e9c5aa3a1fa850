use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "club_fixtures";
const CACHE_FILE: &str = "page_cache.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PageCacheFile {
    version: u32,
    entries: HashMap<String, CachedPage>,
}

impl PageCacheFile {
    /// Missing, unreadable or stale-version files all read as empty.
    fn read(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|raw| serde_json::from_str::<Self>(&raw).ok())
            .filter(|file| file.version == CACHE_VERSION)
            .unwrap_or_default()
    }

    fn write(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create cache dir {}", dir.display()))?;
        }
        let json = serde_json::to_vec(self).context("serialize page cache")?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)
            .with_context(|| format!("write {}", staging.display()))?;
        fs::rename(&staging, path).with_context(|| format!("replace {}", path.display()))
    }
}

/// A stored page body with its validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPage {
    pub body: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub fetched_at: u64,
}

impl CachedPage {
    pub fn new(body: String, etag: Option<String>, last_modified: Option<String>) -> Self {
        let fetched_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Self {
            body,
            etag,
            last_modified,
            fetched_at,
        }
    }

    pub fn has_validators(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }
}

/// On-disk page store keyed by URL, used for conditional GETs.
///
/// The index is a single JSON file; a version mismatch or an unreadable file
/// starts an empty cache.
#[derive(Debug)]
pub struct PageCache {
    path: PathBuf,
    file: Mutex<PageCacheFile>,
}

impl PageCache {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = Mutex::new(PageCacheFile::read(&path));
        Self { path, file }
    }

    /// Open the cache at its default location, if a cache dir is known.
    pub fn open_default() -> Option<Self> {
        Self::default_location().map(Self::open)
    }

    /// `$XDG_CACHE_HOME/club_fixtures`, else `~/.cache/club_fixtures`.
    pub fn default_location() -> Option<PathBuf> {
        let non_blank = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let root = non_blank("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(|| non_blank("HOME").map(|home| Path::new(&home).join(".cache")))?;
        Some(root.join(CACHE_DIR).join(CACHE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lookup(&self, url: &str) -> Result<Option<CachedPage>> {
        let guard = self
            .file
            .lock()
            .map_err(|_| anyhow!("page cache lock poisoned"))?;
        Ok(guard.entries.get(url).cloned())
    }

    pub fn store(&self, url: &str, page: CachedPage) -> Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| anyhow!("page cache lock poisoned"))?;
        guard.version = CACHE_VERSION;
        guard.entries.insert(url.to_string(), page);
        guard.write(&self.path)
    }
}
