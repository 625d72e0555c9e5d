use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::pkgsite::metadata::RepositoryMetadata;

pub const ENV_FILE_VAR: &str = "GITHUB_ENV";

pub type Exports = Vec<(&'static str, String)>;

pub fn repository_exports(metadata: &RepositoryMetadata) -> Exports {
    vec![
        ("REPOSITORY_DATE", metadata.release_date.clone()),
        ("REPOSITORY_BUILD", metadata.build.clone()),
    ]
}

pub fn env_file_from_env() -> Option<std::path::PathBuf> {
    std::env::var_os(ENV_FILE_VAR)
        .filter(|v| !v.is_empty())
        .map(std::path::PathBuf::from)
}

/// Append `NAME=value` lines to `env_file`. Returns `false` when no env-file
/// is configured and the step was skipped.
pub fn write_exports(env_file: Option<&Path>, exports: &Exports) -> Result<bool> {
    let Some(path) = env_file else {
        for (name, _) in exports {
            info!(name, "not running under CI ({ENV_FILE_VAR} unset); skipped export");
        }
        return Ok(false);
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    for (name, value) in exports {
        info!(name, value = %value, "exporting CI variable");
        writeln!(file, "{name}={value}")
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(true)
}
