use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PkgsitePaths {
    pub home: PathBuf,
    pub history_file: PathBuf,
    pub readme_file: PathBuf,
    pub index_file: PathBuf,
    pub work_dir: PathBuf,
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<PkgsitePaths> {
    let cwd = env::current_dir().context("current directory could not be resolved")?;
    let home = env_or_default_path("PKGSITE_HOME", cwd);
    Ok(paths_under(&home))
}

fn paths_under(home: &Path) -> PkgsitePaths {
    PkgsitePaths {
        home: home.to_path_buf(),
        history_file: env_or_default_path("PKGSITE_HISTORY_FILE", home.join("packagehistory.json")),
        readme_file: env_or_default_path("PKGSITE_README_FILE", home.join("README.md")),
        index_file: env_or_default_path("PKGSITE_INDEX_FILE", home.join("packagesite.json")),
        work_dir: env_or_default_path("PKGSITE_WORK_DIR", home.join("temp")),
    }
}

impl PkgsitePaths {
    /// Resolve a possibly relative path against the home directory.
    pub fn under_home(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.home.join(path)
        }
    }
}
