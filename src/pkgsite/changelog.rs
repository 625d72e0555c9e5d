use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRow {
    pub build: String,
    pub release_date: String,
    pub freebsd_version: String,
    pub package_count: String,
    pub update_date: String,
}

impl BuildRow {
    pub fn render(&self) -> String {
        format!(
            "| {} | {} | {} | {} | {} |\n",
            self.build, self.release_date, self.freebsd_version, self.package_count, self.update_date
        )
    }
}

/// Header, separator and existing rows of the build table. Rows must be
/// newline-terminated to count as part of the table.
fn table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"\|\s*Build\s*\|\s*Release Date\s*\|\s*FreeBSD Version\s*\|\s*Package Count\s*\|\s*Update Date\s*\|[ \t]*\r?\n",
            r"\|[-:| \t]+\|[ \t]*\r?\n",
            r"(?:\|.*\|[ \t]*\r?\n)*",
        ))
        .expect("valid changelog table regex")
    })
}

pub fn append_build_row(content: &str, row: &BuildRow) -> Option<String> {
    // A table at end of file may lack the final newline.
    let terminated;
    let content = if content.trim_end_matches([' ', '\t']).ends_with('|') {
        terminated = format!("{content}\n");
        terminated.as_str()
    } else {
        content
    };
    let table = table_re().find(content)?;
    let mut out = String::with_capacity(content.len() + 64);
    out.push_str(&content[..table.end()]);
    out.push_str(&row.render());
    out.push_str(&content[table.end()..]);
    Some(out)
}

/// Append `row` to the build table in `path`. Returns `false`, leaving the
/// file untouched, when no build table is present.
pub fn update_file(path: &Path, row: &BuildRow) -> Result<bool> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let Some(updated) = append_build_row(&content, row) else {
        warn!(path = %path.display(), "no build table found; changelog left unchanged");
        return Ok(false);
    };
    fs::write(path, updated).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), build = %row.build, "appended changelog row");
    Ok(true)
}
