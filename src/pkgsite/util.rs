use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

const JSON_INDENT: &[u8] = b"    ";

pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser)?;
    out.push(b'\n');
    Ok(out)
}

/// Write `value` as 4-space indented JSON. The document is written to a
/// temporary file next to `path` and renamed into place.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let data = to_json_pretty(value)?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(&data)
        .with_context(|| format!("failed to write {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    match fs::rename(from, to) {
        Ok(_) => Ok(()),
        Err(rename_err) => {
            if matches!(
                rename_err.kind(),
                ErrorKind::CrossesDevices | ErrorKind::PermissionDenied
            ) {
                fs::copy(from, to).with_context(|| {
                    format!("failed to copy {} to {}", from.display(), to.display())
                })?;
                fs::remove_file(from)
                    .with_context(|| format!("failed to remove {}", from.display()))?;
                Ok(())
            } else {
                Err(rename_err).with_context(|| {
                    format!("failed to move {} to {}", from.display(), to.display())
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn today_is_iso_date() {
        let value = today();
        assert!(chrono::NaiveDate::parse_from_str(&value, "%Y-%m-%d").is_ok());
    }

    #[test]
    fn pretty_json_uses_four_space_indent() {
        let data = to_json_pretty(&serde_json::json!({"a": {"b": 1}})).expect("encode");
        let text = String::from_utf8(data).expect("utf8");
        assert_eq!(text, "{\n    \"a\": {\n        \"b\": 1\n    }\n}\n");
    }

    #[test]
    fn move_file_creates_destination_parent() {
        let tmp = tempdir().expect("tempdir");
        let from = tmp.path().join("a.json");
        let to = tmp.path().join("nested/b.json");
        fs::write(&from, "{}").expect("write");

        move_file(&from, &to).expect("move");
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).expect("read"), "{}");
    }
}
