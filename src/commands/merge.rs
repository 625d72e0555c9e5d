use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::error::PkgsiteError;
use crate::pkgsite::history;
use crate::pkgsite::index::load_index;
use crate::pkgsite::metadata::{RepositoryMetadata, is_valid_build, is_valid_date};
use crate::pkgsite::paths::resolve_paths;
use crate::pkgsite::util::today;

#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub index: PathBuf,
    pub history: Option<PathBuf>,
    pub metadata: RepositoryMetadata,
}

pub fn validate_metadata(metadata: &RepositoryMetadata) -> Result<(), PkgsiteError> {
    if !is_valid_date(&metadata.release_date) {
        return Err(PkgsiteError::Validation(format!(
            "invalid date format: {}",
            metadata.release_date
        )));
    }
    if !is_valid_build(&metadata.build) {
        return Err(PkgsiteError::Validation(format!(
            "invalid version format: {}",
            metadata.build
        )));
    }
    Ok(())
}

pub fn run(opts: &MergeOptions) -> Result<CommandReport> {
    validate_metadata(&opts.metadata)?;
    let history_path = match &opts.history {
        Some(path) => path.clone(),
        None => resolve_paths()?.history_file,
    };

    let mut report = CommandReport::new("merge");
    report.detail(format!("index={}", opts.index.display()));
    report.detail(format!("history={}", history_path.display()));

    let index = load_index(&opts.index)?;
    let mut record = history::load(&history_path)?;
    let outcome = history::merge(&mut record, &index, &opts.metadata, &today())?;
    history::sort_packages(&mut record);
    history::save(&history_path, &record)?;

    report.merge_outcome(&outcome);
    Ok(report)
}
