use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::pkgsite::changelog::{self, BuildRow};
use crate::pkgsite::paths::resolve_paths;

#[derive(Debug, Clone)]
pub struct ChangelogOptions {
    pub readme: Option<PathBuf>,
    pub row: BuildRow,
}

pub fn run(opts: &ChangelogOptions) -> Result<CommandReport> {
    let readme = match &opts.readme {
        Some(path) => path.clone(),
        None => resolve_paths()?.readme_file,
    };
    let mut report = CommandReport::new("changelog");
    report.detail(format!("readme={}", readme.display()));

    if changelog::update_file(&readme, &opts.row)? {
        report.detail(format!("appended row for build {}", opts.row.build));
    } else {
        report.issue("no build table found; changelog left unchanged");
    }
    Ok(report)
}
