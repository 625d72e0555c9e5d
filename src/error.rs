use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PkgsiteError {
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("unexpected metadata format: {0}")]
    Validation(String),
    #[error("expected structure not found: {0}")]
    NotFound(String),
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },
    #[error("extraction of {} failed: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },
    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },
    #[error("expected file is missing: {}", .0.display())]
    MissingFile(PathBuf),
}

impl PkgsiteError {
    pub fn parse(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Network { .. } => "E_NETWORK",
            Self::Validation(_) => "E_VALIDATION",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Download { .. } => "E_DOWNLOAD",
            Self::Extraction { .. } => "E_EXTRACTION",
            Self::Parse { .. } => "E_PARSE",
            Self::MissingFile(_) => "E_MISSING_FILE",
        }
    }
}
