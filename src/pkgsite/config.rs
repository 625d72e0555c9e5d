use anyhow::{Result, anyhow};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://tcbsd.beckhoff.com/TCBSD/14/stable/packages/";

/// Every environment variable the tool reads to override defaults.
pub const ENV_OVERRIDES: &[&str] = &[
    "PKGSITE_HOME",
    "PKGSITE_CONFIG_PATH",
    "PKGSITE_BASE_URL",
    "PKGSITE_METADATA_FILE",
    "PKGSITE_ARCHIVE_FILE",
    "PKGSITE_INDEX_ENTRY",
    "PKGSITE_REQUEST_TIMEOUT_SECS",
    "PKGSITE_PREVIEW_PORT",
    "PKGSITE_PREVIEW_ROOT",
    "PKGSITE_PREVIEW_ENTRY",
    "PKGSITE_HISTORY_FILE",
    "PKGSITE_README_FILE",
    "PKGSITE_INDEX_FILE",
    "PKGSITE_WORK_DIR",
    "PKGSITE_LOG",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub base_url: String,
    pub metadata_file: String,
    pub archive_file: String,
    pub index_entry: String,
    pub request_timeout_secs: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            metadata_file: "packagesite.html".to_string(),
            archive_file: "packagesite.tzst".to_string(),
            index_entry: "packagesite.yaml".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl RepositoryConfig {
    fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|err| anyhow!("invalid repository base url {}: {err}", self.base_url))
    }

    pub fn metadata_url(&self) -> Result<Url> {
        Ok(self.base()?.join(&self.metadata_file)?)
    }

    pub fn archive_url(&self) -> Result<Url> {
        Ok(self.base()?.join(&self.archive_file)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub port: u16,
    /// Directory to serve; relative paths resolve against the pkgsite home.
    pub root: Option<String>,
    pub entry: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            root: None,
            entry: "docs/index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PkgsiteConfig {
    pub repository: RepositoryConfig,
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialPkgsiteConfig {
    repository: Option<RepositoryConfig>,
    preview: Option<PreviewConfig>,
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_u16(var: &str, fallback: u16) -> u16 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u16>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_optional_string(var: &str, fallback: Option<String>) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => fallback,
    }
}

fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

fn validate(cfg: &PkgsiteConfig) -> Result<()> {
    let repo = &cfg.repository;
    let base = repo.base()?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(anyhow!(
            "invalid repository base url {}: scheme must be http or https",
            repo.base_url
        ));
    }
    for (name, value) in [
        ("metadata_file", &repo.metadata_file),
        ("archive_file", &repo.archive_file),
        ("index_entry", &repo.index_entry),
    ] {
        if value.trim().is_empty() {
            return Err(anyhow!("invalid repository {name}: cannot be empty"));
        }
    }
    if repo.request_timeout_secs == 0 {
        return Err(anyhow!("invalid request timeout: must be >= 1 second"));
    }
    if cfg.preview.port == 0 {
        return Err(anyhow!("invalid preview port: must be >= 1"));
    }
    if cfg.preview.entry.trim().is_empty() {
        return Err(anyhow!("invalid preview entry: cannot be empty"));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("PKGSITE_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = match env::var("PKGSITE_HOME") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => env::current_dir().ok()?,
    };
    Some(home.join("pkgsite.toml"))
}

pub fn config_path() -> Option<PathBuf> {
    resolve_config_path().filter(|path| path.exists())
}

fn merge_file_config(base: &mut PkgsiteConfig) -> Result<()> {
    let Some(path) = config_path() else {
        return Ok(());
    };

    let raw = fs::read_to_string(&path)
        .map_err(|err| anyhow!("failed to read pkgsite config {}: {err}", path.display()))?;
    let parsed: PartialPkgsiteConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse pkgsite config {}: {err}", path.display()))?;
    if let Some(repository) = parsed.repository {
        base.repository = repository;
    }
    if let Some(preview) = parsed.preview {
        base.preview = preview;
    }
    Ok(())
}

pub fn load_config() -> Result<PkgsiteConfig> {
    let mut cfg = PkgsiteConfig::default();
    merge_file_config(&mut cfg)?;

    let repo = &mut cfg.repository;
    repo.base_url = normalize_base_url(&env_or_string("PKGSITE_BASE_URL", &repo.base_url));
    repo.metadata_file = env_or_string("PKGSITE_METADATA_FILE", &repo.metadata_file);
    repo.archive_file = env_or_string("PKGSITE_ARCHIVE_FILE", &repo.archive_file);
    repo.index_entry = env_or_string("PKGSITE_INDEX_ENTRY", &repo.index_entry);
    repo.request_timeout_secs =
        env_or_u64("PKGSITE_REQUEST_TIMEOUT_SECS", repo.request_timeout_secs);

    cfg.preview.port = env_or_u16("PKGSITE_PREVIEW_PORT", cfg.preview.port);
    cfg.preview.root = env_optional_string("PKGSITE_PREVIEW_ROOT", cfg.preview.root.take());
    cfg.preview.entry = env_or_string("PKGSITE_PREVIEW_ENTRY", &cfg.preview.entry);

    validate(&cfg)?;
    Ok(cfg)
}
