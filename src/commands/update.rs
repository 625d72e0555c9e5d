use anyhow::{Context, Result};
use std::fs;
use tracing::{info, warn};

use crate::commands::CommandReport;
use crate::pkgsite::changelog::{self, BuildRow};
use crate::pkgsite::config::load_config;
use crate::pkgsite::http::build_client;
use crate::pkgsite::paths::resolve_paths;
use crate::pkgsite::util::{move_file, today};
use crate::pkgsite::{archive, ci_env, history, index, metadata};

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub skip_changelog: bool,
    pub keep_work_dir: bool,
}

/// One full tracking pass. Any failure aborts the remaining steps and leaves
/// the work dir in place for inspection.
pub fn run(opts: &UpdateOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("update");

    let metadata_url = cfg.repository.metadata_url()?;
    let archive_url = cfg.repository.archive_url()?;
    report.detail(format!("metadata_url={metadata_url}"));
    report.detail(format!("archive_url={archive_url}"));

    let client = build_client(&cfg.repository)?;
    let meta = metadata::fetch_metadata(&client, &metadata_url)?;
    report.metadata(&meta);

    let exports = ci_env::repository_exports(&meta);
    let env_file = ci_env::env_file_from_env();
    if ci_env::write_exports(env_file.as_deref(), &exports)? {
        report.detail("ci_exports=written");
    } else {
        report.detail("ci_exports=skipped");
    }

    fs::create_dir_all(&paths.work_dir)
        .with_context(|| format!("failed to create {}", paths.work_dir.display()))?;
    let archive_path = paths.work_dir.join(&cfg.repository.archive_file);
    let downloaded = archive::download(&client, &archive_url, &archive_path)?;
    report.detail(format!("archive_bytes={}", downloaded.bytes));

    let entry = archive::extract(
        &downloaded.path,
        &paths.work_dir,
        &cfg.repository.index_entry,
    )?;
    let staged_index = entry.with_extension("json");
    move_file(&entry, &staged_index)?;

    let normalized = index::normalize_file(&staged_index, &staged_index)?;
    report.detail(format!("index_packages={}", normalized.len()));

    let mut record = history::load(&paths.history_file)?;
    let today = today();
    let outcome = history::merge(&mut record, &normalized, &meta, &today)?;
    history::sort_packages(&mut record);
    history::save(&paths.history_file, &record)?;
    report.merge_outcome(&outcome);
    if !outcome.changed() {
        info!(build = %meta.build, "history already up to date");
    }

    move_file(&staged_index, &paths.index_file)?;
    report.detail(format!("index_file={}", paths.index_file.display()));

    if opts.keep_work_dir {
        report.detail(format!("work_dir kept at {}", paths.work_dir.display()));
    } else {
        fs::remove_dir_all(&paths.work_dir)
            .with_context(|| format!("failed to remove {}", paths.work_dir.display()))?;
    }

    if opts.skip_changelog {
        report.detail("changelog=skipped");
    } else {
        let row = BuildRow {
            build: meta.build.clone(),
            release_date: meta.release_date.clone(),
            freebsd_version: meta.platform_version.clone(),
            package_count: meta.package_count.clone(),
            update_date: today,
        };
        if !paths.readme_file.exists() {
            warn!(path = %paths.readme_file.display(), "changelog file missing; skipped");
            report.detail("changelog=missing");
        } else if changelog::update_file(&paths.readme_file, &row)? {
            report.detail("changelog=appended");
        } else {
            report.detail("changelog=no-table");
        }
    }

    info!(build = %meta.build, "update completed");
    Ok(report)
}
