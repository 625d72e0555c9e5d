use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::error::PkgsiteError;

// Row order of the `topbartable`; the value is in each row's second cell.
const ROW_PLATFORM: usize = 0;
const ROW_RELEASE_DATE: usize = 1;
const ROW_BUILD: usize = 2;
const ROW_PACKAGE_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryMetadata {
    pub release_date: String,
    pub build: String,
    pub platform_version: String,
    pub package_count: String,
}

fn table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<table\b[^>]*\bid\s*=\s*["']?topbartable["']?[^>]*>(.*?)</table>"#)
            .expect("valid table regex")
    })
}

fn row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").expect("valid row regex"))
}

fn cell_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").expect("valid cell regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"))
}

fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn cell_text(raw: &str) -> String {
    let stripped = tag_re().replace_all(raw, "");
    decode_entities(&stripped).trim().to_string()
}

fn second_cell(rows: &[&str], index: usize) -> Result<String, PkgsiteError> {
    let row = rows.get(index).ok_or_else(|| {
        PkgsiteError::NotFound(format!("topbar table has no row {index}"))
    })?;
    let cell = cell_re()
        .captures_iter(row)
        .nth(1)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| PkgsiteError::NotFound(format!("topbar row {index} has no value cell")))?;
    Ok(cell_text(cell.as_str()))
}

pub fn is_valid_date(raw: &str) -> bool {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}

pub fn is_valid_build(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

pub fn parse_metadata(html: &str) -> Result<RepositoryMetadata, PkgsiteError> {
    let table = table_re()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| PkgsiteError::NotFound("topbar table not found".to_string()))?;

    let rows: Vec<&str> = row_re()
        .captures_iter(table.as_str())
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    if rows.len() <= ROW_PACKAGE_COUNT {
        return Err(PkgsiteError::NotFound(format!(
            "topbar table has {} rows, expected at least {}",
            rows.len(),
            ROW_PACKAGE_COUNT + 1
        )));
    }

    let release_date = second_cell(&rows, ROW_RELEASE_DATE)?;
    if !is_valid_date(&release_date) {
        return Err(PkgsiteError::Validation(format!(
            "invalid date format: {release_date}"
        )));
    }

    let build = second_cell(&rows, ROW_BUILD)?;
    if !is_valid_build(&build) {
        return Err(PkgsiteError::Validation(format!(
            "invalid version format: {build}"
        )));
    }

    Ok(RepositoryMetadata {
        release_date,
        build,
        platform_version: second_cell(&rows, ROW_PLATFORM)?,
        package_count: second_cell(&rows, ROW_PACKAGE_COUNT)?,
    })
}

pub fn fetch_html(client: &Client, url: &Url) -> Result<String, PkgsiteError> {
    let network = |reason: String| PkgsiteError::Network {
        url: url.to_string(),
        reason,
    };
    debug!(%url, "fetching metadata page");
    let response = client
        .get(url.clone())
        .send()
        .map_err(|err| network(err.to_string()))?;
    if !response.status().is_success() {
        return Err(network(format!("status {}", response.status())));
    }
    response.text().map_err(|err| network(err.to_string()))
}

pub fn fetch_metadata(client: &Client, url: &Url) -> Result<RepositoryMetadata> {
    let html = fetch_html(client, url)?;
    let metadata = parse_metadata(&html)?;
    info!(
        date = %metadata.release_date,
        build = %metadata.build,
        freebsd_version = %metadata.platform_version,
        packages = %metadata.package_count,
        "repository metadata"
    );
    Ok(metadata)
}
