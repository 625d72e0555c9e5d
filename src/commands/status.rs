use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::pkgsite::ci_env;
use crate::pkgsite::config::{ENV_OVERRIDES, config_path, load_config};
use crate::pkgsite::paths::resolve_paths;

fn set_env_overrides() -> Vec<&'static str> {
    ENV_OVERRIDES
        .iter()
        .copied()
        .filter(|key| env::var_os(key).is_some_and(|v| !v.is_empty()))
        .collect()
}

pub fn run() -> Result<CommandReport> {
    let cfg = load_config()?;
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("version={}", env!("CARGO_PKG_VERSION")));
    match config_path() {
        Some(path) => report.detail(format!("config={}", path.display())),
        None => report.detail("config=defaults"),
    }
    report.detail(format!("metadata_url={}", cfg.repository.metadata_url()?));
    report.detail(format!("archive_url={}", cfg.repository.archive_url()?));
    report.detail(format!("home={}", paths.home.display()));
    report.detail(format!("history_file={}", paths.history_file.display()));
    report.detail(format!("readme_file={}", paths.readme_file.display()));
    report.detail(format!("index_file={}", paths.index_file.display()));
    report.detail(format!("work_dir={}", paths.work_dir.display()));

    let overrides = set_env_overrides();
    if !overrides.is_empty() {
        report.detail(format!("env_overrides={}", overrides.join(",")));
    }
    match ci_env::env_file_from_env() {
        Some(path) => report.detail(format!("ci_env_file={}", path.display())),
        None => report.detail("ci_env_file=unset"),
    }

    if !paths.history_file.exists() {
        report.issue("missing package history (run `pkgsite-history init`)");
    }
    if !paths.readme_file.exists() {
        report.issue("missing changelog README");
    }
    if paths.work_dir.exists() {
        report.issue(format!(
            "stale work dir {} left by an earlier failed run",
            paths.work_dir.display()
        ));
    }

    Ok(report)
}
