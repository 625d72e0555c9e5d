use anyhow::Result;

use crate::commands::CommandReport;
use crate::pkgsite::ci_env;
use crate::pkgsite::config::load_config;
use crate::pkgsite::http::build_client;
use crate::pkgsite::metadata::fetch_metadata;

pub fn run() -> Result<CommandReport> {
    let cfg = load_config()?;
    let mut report = CommandReport::new("metadata");

    let url = cfg.repository.metadata_url()?;
    report.detail(format!("metadata_url={url}"));

    let client = build_client(&cfg.repository)?;
    let metadata = fetch_metadata(&client, &url)?;
    report.metadata(&metadata);
    for (name, value) in ci_env::repository_exports(&metadata) {
        report.detail(format!("export {name}={value}"));
    }

    Ok(report)
}
