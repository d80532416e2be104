//! site-refresh: build-time data tasks for a static personal site.
//!
//! ## Architecture overview
//!
//! ```text
//!  updates.config.yaml
//!          │
//! ┌────────▼───────┐  RawDocument  ┌──────────────┐  Record  ┌──────────────┐
//! │   source/      │ ────────────► │ post/parser  │ ───────► │ post/merge   │
//! │ (join-all over │  (per source) │ (state mach.)│          │ (sort, write)│
//! │  strategies)   │               └──────────────┘          └──────┬───────┘
//! └────────────────┘                                                │ merged.md
//!                                                            ┌──────▼───────┐
//!                                                            │   render     │
//!                                                            │ (external)   │
//!                                                            └──────────────┘
//! ```
//!
//! * **`config`**: site layout, `updates.config.yaml`, named defaults.
//! * **`source/`**: the `RetrievalStrategy` trait, `gh api` and raw-URL
//!   strategies, and the concurrent fetcher.
//! * **`post/`**: the `Record` type, the posts-file parser and the merger.
//! * **`render`**: runs the external renderer on the merged file.
//! * **`updates`**: wires the above into the `updates` subcommand.
//! * **`refresh/`**: the CSV refresh tasks and CSV → JSON conversion.
//! * **`main`**: argument parsing, logging setup, exit codes.

mod config;
mod error;
mod post;
mod refresh;
mod render;
mod source;
mod updates;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use config::SiteLayout;
use updates::UpdatesOutcome;

#[derive(Parser)]
#[command(name = "site-refresh", about = "Build-time data refresh tasks for the site")]
struct Cli {
    /// Site checkout root; all inputs and outputs resolve under it
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge posts from tracked repos and render the updates page
    Updates,
    /// Refresh raw-data/github_repos.csv via `gh repo list`
    Repos {
        /// GitHub user or organisation
        #[arg(long, default_value = "sujankapadia")]
        user: String,
    },
    /// Refresh raw-data/medium_articles.csv from the Medium RSS feed
    Medium {
        #[arg(long, default_value = "https://medium.com/feed/@sujankapadia")]
        feed: String,
    },
    /// Refresh raw-data/youtube_videos.csv from a playlist via yt-dlp
    Youtube {
        #[arg(long, default_value = "PLloqgzEeMq16Lp9wKyqn31rOu0JhcokT4")]
        playlist: String,
    },
    /// Refresh raw-data/chariot_content.csv from site search results
    Chariot {
        #[arg(long, default_value = "https://chariotsolutions.com")]
        base: String,
        /// Search query
        #[arg(long, default_value = "sujan")]
        search: String,
    },
    /// Curate AI-related posts from the local LinkedIn export
    Linkedin,
    /// Convert raw-data/*.csv into src/data/*.json
    CsvToJson,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let layout = SiteLayout::new(cli.root);

    match run(cli.command, &layout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, layout: &SiteLayout) -> anyhow::Result<()> {
    match command {
        Commands::Updates => match updates::run(layout).await? {
            UpdatesOutcome::Empty => println!("No posts to publish; wrote empty updates page."),
            UpdatesOutcome::Rendered { posts, sources } => {
                println!("Merged {posts} posts from {sources} repo(s).")
            }
        },
        Commands::Repos { user } => {
            let output = layout.raw_data(refresh::repos::OUTPUT_FILE);
            let n = refresh::repos::run(&user, &output).await?;
            println!("Wrote {n} repos to {}", output.display());
        }
        Commands::Medium { feed } => {
            let output = layout.raw_data(refresh::medium::OUTPUT_FILE);
            let n = refresh::medium::run(&feed, &output).await?;
            println!("Wrote {n} articles to {}", output.display());
        }
        Commands::Youtube { playlist } => {
            let output = layout.raw_data(refresh::youtube::OUTPUT_FILE);
            let n = refresh::youtube::run(&playlist, &output).await?;
            println!("Wrote {n} videos to {}", output.display());
        }
        Commands::Chariot { base, search } => {
            let output = layout.raw_data(refresh::chariot::OUTPUT_FILE);
            let manual = layout.raw_data(refresh::chariot::MANUAL_FILE);
            let n = refresh::chariot::run(&base, &search, &output, &manual).await?;
            println!("Wrote {n} items to {}", output.display());
        }
        Commands::Linkedin => {
            let output = layout.raw_data(refresh::linkedin::OUTPUT_FILE);
            let n = refresh::linkedin::run(&layout.linkedin_export(), &output)?;
            println!("Wrote {n} curated posts to {}", output.display());
        }
        Commands::CsvToJson => {
            let n = refresh::convert::run(layout)?;
            println!("Converted {n} file(s) under {}", layout.root().display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn root_is_global_and_defaults_to_cwd() {
        let cli = Cli::try_parse_from(["site-refresh", "updates"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("."));

        let cli = Cli::try_parse_from(["site-refresh", "csv-to-json", "--root", "/site"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("/site"));
        assert!(matches!(cli.command, Commands::CsvToJson));
    }

    #[test]
    fn task_flags_override_defaults() {
        let cli = Cli::try_parse_from(["site-refresh", "repos", "--user", "jane"]).unwrap();
        assert!(matches!(cli.command, Commands::Repos { user } if user == "jane"));
    }
}
