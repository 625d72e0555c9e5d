use anyhow::{Context, Result};
use reqwest::Url;
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::PkgsiteError;

#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub bytes: u64,
}

pub fn download(client: &Client, url: &Url, dest: &Path) -> Result<DownloadOutcome> {
    let failure = |reason: String| PkgsiteError::Download {
        url: url.to_string(),
        reason,
    };

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    debug!(%url, dest = %dest.display(), "downloading archive");
    let mut response = client
        .get(url.clone())
        .send()
        .map_err(|err| failure(err.to_string()))?;
    if !response.status().is_success() {
        return Err(failure(format!("status {}", response.status())).into());
    }

    let file =
        File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    let mut writer = BufWriter::new(file);
    let bytes = response
        .copy_to(&mut writer)
        .map_err(|err| failure(err.to_string()))?;
    writer
        .into_inner()
        .map_err(|err| err.into_error())
        .and_then(|file| file.sync_all())
        .with_context(|| format!("failed to flush {}", dest.display()))?;

    info!(path = %dest.display(), bytes, "archive downloaded");
    Ok(DownloadOutcome {
        path: dest.to_path_buf(),
        bytes,
    })
}

/// Unpack a zstd-compressed tar into `work_dir` and return the path of
/// `entry_name` inside it.
pub fn extract(archive_path: &Path, work_dir: &Path, entry_name: &str) -> Result<PathBuf> {
    let failure = |reason: String| PkgsiteError::Extraction {
        path: archive_path.to_path_buf(),
        reason,
    };

    let file = File::open(archive_path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => PkgsiteError::MissingFile(archive_path.to_path_buf()),
        _ => failure(err.to_string()),
    })?;
    let decoder = zstd::Decoder::new(BufReader::new(file))
        .map_err(|err| failure(format!("zstd decoder: {err}")))?;

    fs::create_dir_all(work_dir)
        .with_context(|| format!("failed to create {}", work_dir.display()))?;
    let mut tar = tar::Archive::new(decoder);
    tar.unpack(work_dir)
        .map_err(|err| failure(format!("tar unpack: {err}")))?;

    let entry = work_dir.join(entry_name);
    if !entry.is_file() {
        return Err(PkgsiteError::MissingFile(entry).into());
    }
    info!(entry = %entry.display(), "archive extracted");
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_tzst(path: &Path, entries: &[(&str, &[u8])]) {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, *data)
                .expect("append tar entry");
        }
        let tar_bytes = builder.into_inner().expect("finish tar");
        let compressed = zstd::encode_all(tar_bytes.as_slice(), 3).expect("compress");
        fs::write(path, compressed).expect("write tzst");
    }

    #[test]
    fn extract_returns_index_entry() {
        let tmp = tempdir().expect("tempdir");
        let archive = tmp.path().join("packagesite.tzst");
        write_tzst(
            &archive,
            &[
                ("meta", b"version = 2\n"),
                ("packagesite.yaml", b"{\"name\":\"a\",\"version\":\"1\"}\n"),
            ],
        );

        let work = tmp.path().join("work");
        let entry = extract(&archive, &work, "packagesite.yaml").expect("extract");
        assert_eq!(entry, work.join("packagesite.yaml"));
        assert!(work.join("meta").is_file());
    }

    #[test]
    fn extract_reports_missing_entry() {
        let tmp = tempdir().expect("tempdir");
        let archive = tmp.path().join("packagesite.tzst");
        write_tzst(&archive, &[("meta", b"version = 2\n")]);

        let err = extract(&archive, &tmp.path().join("work"), "packagesite.yaml").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PkgsiteError>(),
            Some(PkgsiteError::MissingFile(_))
        ));
    }

    #[test]
    fn extract_rejects_non_zstd_input() {
        let tmp = tempdir().expect("tempdir");
        let archive = tmp.path().join("packagesite.tzst");
        fs::write(&archive, b"definitely not zstd").expect("write");

        let err = extract(&archive, &tmp.path().join("work"), "packagesite.yaml").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PkgsiteError>(),
            Some(PkgsiteError::Extraction { .. })
        ));
    }
}
