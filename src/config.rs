use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the raw record snapshot comes from. Exactly one of `path`/`url`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub url: Option<String>,
    /// Optional `[{id, name}]` maker directory.
    #[serde(default)]
    pub makers_path: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Defaults for the fixed catalog views.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_rating_threshold")]
    pub rating_threshold: f64,
    #[serde(default = "default_view_limit")]
    pub rating_limit: usize,
    #[serde(default = "default_bargain_max_price")]
    pub bargain_max_price: u32,
    #[serde(default = "default_view_limit")]
    pub bargain_limit: usize,
    #[serde(default = "default_view_limit")]
    pub newest_limit: usize,
    #[serde(default = "default_view_limit")]
    pub popular_limit: usize,
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
    #[serde(default = "default_popular_tags_limit")]
    pub popular_tags_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            rating_threshold: default_rating_threshold(),
            rating_limit: default_view_limit(),
            bargain_max_price: default_bargain_max_price(),
            bargain_limit: default_view_limit(),
            newest_limit: default_view_limit(),
            popular_limit: default_view_limit(),
            related_limit: default_related_limit(),
            popular_tags_limit: default_popular_tags_limit(),
        }
    }
}

fn default_rating_threshold() -> f64 {
    4.5
}
fn default_view_limit() -> usize {
    12
}
fn default_bargain_max_price() -> u32 {
    500
}
fn default_related_limit() -> usize {
    4
}
fn default_popular_tags_limit() -> usize {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_search_index_path")]
    pub search_index_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            search_index_path: default_search_index_path(),
        }
    }
}

fn default_search_index_path() -> PathBuf {
    PathBuf::from("public/data/search-index.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

impl Config {
    /// Config for commands that run without a config file, such as
    /// `search --index`. The snapshot points at a path that need not exist;
    /// a missing snapshot loads as an empty catalog.
    pub fn minimal() -> Self {
        Self {
            snapshot: SnapshotConfig {
                path: Some(PathBuf::from(".cache/data/works.json")),
                url: None,
                makers_path: None,
                timeout_secs: default_timeout_secs(),
            },
            catalog: CatalogConfig::default(),
            export: ExportConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate snapshot source
    match (&config.snapshot.path, &config.snapshot.url) {
        (Some(_), Some(_)) => anyhow::bail!("snapshot: set either path or url, not both"),
        (None, None) => anyhow::bail!("snapshot: one of path or url is required"),
        (None, Some(url)) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            anyhow::bail!("snapshot.url must be an http(s) URL, got '{}'", url)
        }
        _ => {}
    }
    if config.snapshot.timeout_secs == 0 {
        anyhow::bail!("snapshot.timeout_secs must be > 0");
    }

    // Validate catalog views
    let catalog = &config.catalog;
    if !(0.0..=5.0).contains(&catalog.rating_threshold) {
        anyhow::bail!("catalog.rating_threshold must be in [0.0, 5.0]");
    }
    for (name, value) in [
        ("rating_limit", catalog.rating_limit),
        ("bargain_limit", catalog.bargain_limit),
        ("newest_limit", catalog.newest_limit),
        ("popular_limit", catalog.popular_limit),
        ("related_limit", catalog.related_limit),
        ("popular_tags_limit", catalog.popular_tags_limit),
    ] {
        if value < 1 {
            anyhow::bail!("catalog.{} must be >= 1", name);
        }
    }
    if catalog.bargain_max_price == 0 {
        anyhow::bail!("catalog.bargain_max_price must be > 0");
    }

    Ok(())
}
