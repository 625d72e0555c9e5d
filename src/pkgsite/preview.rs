use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, header};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};

pub const CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, max-age=0";

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub root: PathBuf,
    pub port: u16,
    pub entry: String,
    pub open_browser: bool,
}

pub fn router(root: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
}

pub fn entry_url(port: u16, entry: &str) -> String {
    format!("http://localhost:{port}/{}", entry.trim_start_matches('/'))
}

fn browser_command(url: &str) -> Command {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(url).stdout(Stdio::null()).stderr(Stdio::null());
    cmd
}

fn open_browser(url: &str) {
    match browser_command(url).spawn() {
        Ok(_) => info!(%url, "opened browser"),
        Err(err) => warn!(%url, "could not open browser: {err}"),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down preview server");
}

pub async fn serve(opts: &PreviewOptions) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], opts.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind preview server on {addr}"))?;
    info!(
        port = opts.port,
        root = %opts.root.display(),
        "starting preview server"
    );

    if opts.open_browser {
        open_browser(&entry_url(opts.port, &opts.entry));
    }

    axum::serve(listener, router(&opts.root))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("preview server failed")?;
    Ok(())
}

/// Run the preview server to completion on a dedicated runtime.
pub fn run_blocking(opts: &PreviewOptions) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime.block_on(serve(opts))
}
