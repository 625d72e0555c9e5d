use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PKGSITE_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Install the stderr subscriber. `PKGSITE_LOG` takes precedence over
/// `--verbose` when it holds a valid filter.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
