use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::pkgsite::index;
use crate::pkgsite::paths::resolve_paths;

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
}

pub fn run(opts: &NormalizeOptions) -> Result<CommandReport> {
    let output = match &opts.output {
        Some(path) => path.clone(),
        None => resolve_paths()?.index_file,
    };
    let mut report = CommandReport::new("normalize");
    report.detail(format!("input={}", opts.input.display()));
    report.detail(format!("output={}", output.display()));

    let normalized = index::normalize_file(&opts.input, &output)?;
    report.detail(format!("packages={}", normalized.len()));
    Ok(report)
}
