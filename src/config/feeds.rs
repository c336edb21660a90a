// src/config/feeds.rs
//! Feed catalog: the static `country key -> sources` table.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_FEEDS_CONFIG_PATH: &str = "RSS_FEEDS_CONFIG_PATH";
pub const DEFAULT_FEEDS_TOML_PATH: &str = "config/feeds.toml";
pub const DEFAULT_FEEDS_JSON_PATH: &str = "config/feeds.json";

const EMBEDDED_CATALOG: &str = include_str!("../../config/feeds.toml");

/// One market bucket and the feeds that contribute to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub country: String,
    pub label: String,
    pub description: String,
    /// Ordered, non-empty, validated http(s) URLs.
    pub urls: Vec<String>,
}

/// Immutable lookup table built once at startup.
#[derive(Debug, Clone, Default)]
pub struct FeedCatalog {
    sources: BTreeMap<String, FeedSource>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    countries: BTreeMap<String, CountryEntry>,
}

#[derive(Debug, Deserialize)]
struct CountryEntry {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    description: Option<String>,
    sources: Vec<String>,
}

impl FeedCatalog {
    pub fn get(&self, country: &str) -> Option<&FeedSource> {
        self.sources.get(country)
    }

    /// Sources ordered by country key.
    pub fn iter(&self) -> impl Iterator<Item = &FeedSource> {
        self.sources.values()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Build from already-known sources (tests, embedding callers).
    pub fn from_sources<I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = FeedSource>,
    {
        let mut map = BTreeMap::new();
        for s in sources {
            let urls = clean_urls(&s.country, s.urls)?;
            let key = s.country.trim().to_string();
            if key.is_empty() {
                bail!("feed catalog contains an empty country key");
            }
            map.insert(
                key.clone(),
                FeedSource {
                    country: key,
                    label: s.label,
                    description: s.description,
                    urls,
                },
            );
        }
        if map.is_empty() {
            bail!("feed catalog has no countries");
        }
        Ok(Self { sources: map })
    }

    /// The catalog compiled into the binary (`config/feeds.toml`).
    pub fn embedded() -> Result<Self> {
        parse_catalog(EMBEDDED_CATALOG, "toml").context("parsing embedded feed catalog")
    }
}

/// Load the catalog from an explicit path. Supports TOML or JSON formats.
pub fn load_catalog_from(path: &Path) -> Result<FeedCatalog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed catalog from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_catalog(&content, ext.as_str())
        .with_context(|| format!("parsing feed catalog {}", path.display()))
}

/// Load the catalog using env var + fallbacks:
/// 1) $RSS_FEEDS_CONFIG_PATH
/// 2) config/feeds.toml
/// 3) config/feeds.json
/// 4) embedded default
pub fn load_catalog_default() -> Result<FeedCatalog> {
    if let Ok(p) = std::env::var(ENV_FEEDS_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_catalog_from(&pb);
        } else {
            return Err(anyhow!("{ENV_FEEDS_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_FEEDS_TOML_PATH);
    if toml_p.exists() {
        return load_catalog_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_FEEDS_JSON_PATH);
    if json_p.exists() {
        return load_catalog_from(&json_p);
    }
    FeedCatalog::embedded()
}

fn parse_catalog(s: &str, hint_ext: &str) -> Result<FeedCatalog> {
    let file: CatalogFile = if hint_ext == "json" {
        serde_json::from_str(s)?
    } else if hint_ext == "toml" {
        toml::from_str(s)?
    } else {
        // Unknown extension: TOML first, then JSON.
        match toml::from_str(s) {
            Ok(v) => v,
            Err(_) => serde_json::from_str(s).map_err(|_| anyhow!("unsupported feed catalog format"))?,
        }
    };

    FeedCatalog::from_sources(file.countries.into_iter().map(|(key, c)| FeedSource {
        label: c.label.unwrap_or_else(|| key.clone()),
        description: c.description.unwrap_or_default(),
        country: key,
        urls: c.sources,
    }))
}

/// Trim, validate and dedup (order-preserving) one country's URLs.
fn clean_urls(country: &str, items: Vec<String>) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if t.is_empty() {
            continue;
        }
        let parsed = url::Url::parse(t)
            .with_context(|| format!("country '{country}': invalid source url '{t}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            bail!("country '{country}': source url '{t}' must be http(s) with a host");
        }
        if !out.iter().any(|u| u == t) {
            out.push(t.to_string());
        }
    }
    if out.is_empty() {
        bail!("country '{country}' has no sources");
    }
    Ok(out)
}
