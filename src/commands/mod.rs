pub mod changelog;
pub mod init;
pub mod merge;
pub mod metadata;
pub mod normalize;
pub mod serve;
pub mod status;
pub mod update;

use serde::Serialize;

use crate::pkgsite::history::MergeOutcome;
use crate::pkgsite::metadata::RepositoryMetadata;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn metadata(&mut self, metadata: &RepositoryMetadata) {
        self.detail(format!("release_date={}", metadata.release_date));
        self.detail(format!("build={}", metadata.build));
        self.detail(format!("freebsd_version={}", metadata.platform_version));
        self.detail(format!("package_count={}", metadata.package_count));
    }

    pub fn merge_outcome(&mut self, outcome: &MergeOutcome) {
        self.detail(format!("build_added={}", outcome.build_added));
        self.detail(format!("packages_added={}", outcome.packages_added));
        self.detail(format!("versions_added={}", outcome.versions_added));
        self.detail(format!("unchanged={}", outcome.unchanged));
    }
}
