use anyhow::Result;

use crate::commands::CommandReport;
use crate::pkgsite::history;
use crate::pkgsite::paths::resolve_paths;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("init");
    report.detail(format!("history={}", paths.history_file.display()));

    if history::init(&paths.history_file)? {
        report.detail("created empty package history");
    } else {
        report.detail("package history already exists; left unchanged");
    }
    Ok(report)
}
