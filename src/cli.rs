use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{
    self, CommandReport, changelog::ChangelogOptions, merge::MergeOptions,
    normalize::NormalizeOptions, serve::ServeOptions, update::UpdateOptions,
};
use crate::logging;
use crate::pkgsite::changelog::BuildRow;
use crate::pkgsite::metadata::RepositoryMetadata;
use crate::pkgsite::util::today;

#[derive(Debug, Parser)]
#[command(name = "pkgsite-history")]
#[command(about = "Track a FreeBSD packagesite and keep a per-build package version history")]
#[command(version)]
struct Cli {
    /// Print the command report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch metadata and archive, merge the index into the history, update the changelog
    Update {
        #[arg(long)]
        skip_changelog: bool,
        #[arg(long)]
        keep_work_dir: bool,
    },
    /// Fetch and print repository build metadata
    Metadata,
    /// Normalize a streamed packagesite index into a sorted JSON mapping
    Normalize {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Merge a normalized index into the package history
    Merge {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        history: Option<PathBuf>,
        #[command(flatten)]
        meta: BuildArgs,
    },
    /// Append a build row to the changelog table
    Changelog {
        #[arg(long)]
        readme: Option<PathBuf>,
        #[command(flatten)]
        meta: BuildArgs,
        /// Defaults to today
        #[arg(long)]
        update_date: Option<String>,
    },
    /// Create an empty package history
    Init,
    /// Serve the docs locally with caching disabled
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        no_browser: bool,
    },
    /// Show resolved configuration and paths
    Status,
}

#[derive(Debug, Clone, Args)]
struct BuildArgs {
    #[arg(long)]
    build: String,
    #[arg(long)]
    release_date: String,
    #[arg(long)]
    freebsd_version: String,
    #[arg(long)]
    package_count: String,
}

impl From<BuildArgs> for RepositoryMetadata {
    fn from(args: BuildArgs) -> Self {
        Self {
            release_date: args.release_date,
            build: args.build,
            platform_version: args.freebsd_version,
            package_count: args.package_count,
        }
    }
}

fn render(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let status = if report.ok { "ok" } else { "failed" };
    println!("{}: {status}", report.command);
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  issue: {issue}");
    }
    Ok(())
}

/// Parse arguments, run the selected command and print its report. Returns
/// whether the report came back clean.
pub fn run() -> Result<bool> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let report = match cli.command {
        Command::Update {
            skip_changelog,
            keep_work_dir,
        } => commands::update::run(&UpdateOptions {
            skip_changelog,
            keep_work_dir,
        })?,
        Command::Metadata => commands::metadata::run()?,
        Command::Normalize { input, output } => {
            commands::normalize::run(&NormalizeOptions { input, output })?
        }
        Command::Merge {
            index,
            history,
            meta,
        } => commands::merge::run(&MergeOptions {
            index,
            history,
            metadata: meta.into(),
        })?,
        Command::Changelog {
            readme,
            meta,
            update_date,
        } => {
            let meta = RepositoryMetadata::from(meta);
            commands::changelog::run(&ChangelogOptions {
                readme,
                row: BuildRow {
                    build: meta.build,
                    release_date: meta.release_date,
                    freebsd_version: meta.platform_version,
                    package_count: meta.package_count,
                    update_date: update_date.unwrap_or_else(today),
                },
            })?
        }
        Command::Init => commands::init::run()?,
        Command::Serve { port, no_browser } => {
            commands::serve::run(&ServeOptions { port, no_browser })?
        }
        Command::Status => commands::status::run()?,
    };

    render(&report, cli.json)?;
    Ok(report.ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn merge_arguments_map_to_metadata() {
        let cli = Cli::try_parse_from([
            "pkgsite-history",
            "merge",
            "--index",
            "packagesite.json",
            "--build",
            "101",
            "--release-date",
            "2024-02-01",
            "--freebsd-version",
            "14.1",
            "--package-count",
            "12",
        ])
        .expect("parse");
        let Command::Merge { meta, .. } = cli.command else {
            panic!("expected merge command");
        };
        let meta = RepositoryMetadata::from(meta);
        assert_eq!(meta.build, "101");
        assert_eq!(meta.platform_version, "14.1");
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["pkgsite-history", "status", "--json", "-v"]).expect("parse");
        assert!(cli.json);
        assert!(cli.verbose);
    }
}
