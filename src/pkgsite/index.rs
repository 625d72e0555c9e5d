use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::PkgsiteError;
use crate::pkgsite::ordered::OrderedMap;
use crate::pkgsite::util::write_json_pretty;

pub type PackageIndex = OrderedMap<Value>;

/// Parse the upstream index, a stream of JSON objects with no enclosing array
/// or separators, keyed by each object's `name`.
pub fn normalize(text: &str) -> Result<PackageIndex, PkgsiteError> {
    let mut index = PackageIndex::new();
    let stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    for (position, item) in stream.enumerate() {
        let value = item.map_err(|err| PkgsiteError::parse("package index", err))?;
        let name = value
            .as_object()
            .ok_or_else(|| {
                PkgsiteError::parse(
                    "package index",
                    format!("entry {position} is not a JSON object"),
                )
            })?
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PkgsiteError::parse(
                    "package index",
                    format!("entry {position} has no string `name` field"),
                )
            })?
            .to_string();
        index.insert(name, value);
    }
    Ok(index)
}

pub fn sort_case_insensitive(index: &mut PackageIndex) {
    index.sort_keys_case_insensitive();
}

/// Normalize `input` and write the sorted mapping to `output`. Nothing is
/// written when the stream fails to parse.
pub fn normalize_file(input: &Path, output: &Path) -> Result<PackageIndex> {
    let raw = match fs::read_to_string(input) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(PkgsiteError::MissingFile(input.to_path_buf()).into());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", input.display()));
        }
    };

    let mut index = normalize(&raw)?;
    sort_case_insensitive(&mut index);
    write_json_pretty(output, &index)?;
    info!(packages = index.len(), path = %output.display(), "normalized package index");
    Ok(index)
}

pub fn load_index(path: &Path) -> Result<PackageIndex> {
    if !path.is_file() {
        return Err(PkgsiteError::MissingFile(path.to_path_buf()).into());
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let index: PackageIndex = serde_json::from_str(&raw)
        .map_err(|err| PkgsiteError::parse(path.display().to_string(), err))?;
    Ok(index)
}
