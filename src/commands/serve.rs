use anyhow::Result;

use crate::commands::CommandReport;
use crate::pkgsite::config::load_config;
use crate::pkgsite::paths::resolve_paths;
use crate::pkgsite::preview::{self, PreviewOptions};

#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    pub port: Option<u16>,
    pub no_browser: bool,
}

pub fn run(opts: &ServeOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let paths = resolve_paths()?;
    let root = match &cfg.preview.root {
        Some(raw) => paths.under_home(raw),
        None => paths.home.clone(),
    };
    let preview_opts = PreviewOptions {
        root,
        port: opts.port.unwrap_or(cfg.preview.port),
        entry: cfg.preview.entry.clone(),
        open_browser: !opts.no_browser,
    };

    let mut report = CommandReport::new("serve");
    report.detail(format!("root={}", preview_opts.root.display()));
    report.detail(format!(
        "url={}",
        preview::entry_url(preview_opts.port, &preview_opts.entry)
    ));
    if !preview_opts.root.is_dir() {
        report.issue(format!(
            "preview root {} is not a directory",
            preview_opts.root.display()
        ));
        return Ok(report);
    }

    preview::run_blocking(&preview_opts)?;
    Ok(report)
}
