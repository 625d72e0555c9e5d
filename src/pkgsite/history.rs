use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::PkgsiteError;
use crate::pkgsite::index::PackageIndex;
use crate::pkgsite::metadata::RepositoryMetadata;
use crate::pkgsite::ordered::OrderedMap;
use crate::pkgsite::util::write_json_pretty;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub release_date: String,
    pub freebsd_version: String,
    pub packages_count: String,
    pub update_date: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PackageHistory {
    #[serde(default)]
    pub versions: OrderedMap<String>,
}

/// The cumulative `packagehistory.json` record. A (package, build) pair, once
/// recorded, is never rewritten and build entries are never mutated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub builds: OrderedMap<BuildInfo>,
    #[serde(default)]
    pub packages: OrderedMap<PackageHistory>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub build_added: bool,
    pub packages_added: usize,
    pub versions_added: usize,
    pub unchanged: usize,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        self.build_added || self.packages_added > 0 || self.versions_added > 0
    }
}

/// Newest build first. Build identifiers compare as strings, so ordering only
/// matches numeric order for identifiers of equal length.
fn sort_versions_descending(versions: &mut OrderedMap<String>) {
    versions.sort_keys_by(|a, b| b.cmp(a));
}

fn package_versions(index: &PackageIndex) -> Result<Vec<(&str, &str)>, PkgsiteError> {
    index
        .iter()
        .map(|(name, info)| {
            info.get("version")
                .and_then(Value::as_str)
                .map(|version| (name, version))
                .ok_or_else(|| {
                    PkgsiteError::parse(
                        "package index",
                        format!("package {name} is missing key `version`"),
                    )
                })
        })
        .collect()
}

/// Fold one normalized index into `history` under the build in `metadata`.
pub fn merge(
    history: &mut History,
    index: &PackageIndex,
    metadata: &RepositoryMetadata,
    today: &str,
) -> Result<MergeOutcome, PkgsiteError> {
    let entries = package_versions(index)?;
    let build = metadata.build.as_str();
    let mut outcome = MergeOutcome::default();

    if !history.builds.contains_key(build) {
        history.builds.insert_first(
            build,
            BuildInfo {
                release_date: metadata.release_date.clone(),
                freebsd_version: metadata.platform_version.clone(),
                packages_count: metadata.package_count.clone(),
                update_date: today.to_string(),
            },
        );
        outcome.build_added = true;
        info!(build, release_date = %metadata.release_date, "added new build");
    }

    for (name, version) in entries {
        match history.packages.get_mut(name) {
            None => {
                let mut versions = OrderedMap::new();
                versions.insert(build, version.to_string());
                history.packages.insert(name, PackageHistory { versions });
                outcome.packages_added += 1;
                debug!(package = name, version, build, "added new package");
            }
            Some(existing) if !existing.versions.contains_key(build) => {
                existing.versions.insert(build, version.to_string());
                sort_versions_descending(&mut existing.versions);
                outcome.versions_added += 1;
                debug!(package = name, version, build, "recorded version");
            }
            Some(_) => {
                outcome.unchanged += 1;
            }
        }
    }

    info!(
        build,
        packages_added = outcome.packages_added,
        versions_added = outcome.versions_added,
        unchanged = outcome.unchanged,
        "merged package index"
    );
    Ok(outcome)
}

pub fn sort_packages(history: &mut History) {
    history.packages.sort_keys_case_insensitive();
}

pub fn load(path: &Path) -> Result<History> {
    if !path.is_file() {
        return Err(PkgsiteError::MissingFile(path.to_path_buf()).into());
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let history: History = serde_json::from_str(&raw)
        .map_err(|err| PkgsiteError::parse(path.display().to_string(), err))?;
    Ok(history)
}

pub fn save(path: &Path, history: &History) -> Result<()> {
    write_json_pretty(path, history)?;
    info!(path = %path.display(), "saved package history");
    Ok(())
}

/// Create an empty record. Returns `false` when `path` already exists.
pub fn init(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save(path, &History::default())?;
    Ok(true)
}
