use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;

use crate::pkgsite::config::RepositoryConfig;

pub fn build_client(repo: &RepositoryConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(repo.request_timeout_secs))
        .user_agent(concat!("pkgsite-history/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build http client")
}
