//! Fetching posts files from tracked repositories.
//!
//! This module defines the [`RetrievalStrategy`] trait and the [`Fetcher`]
//! that runs an ordered list of strategies for each source. Concrete
//! strategies live in sub-modules:
//!
//! * [`gh_api`]: authenticated `gh api` call (private repos work).
//! * [`raw_url`]: unauthenticated GET against the raw-content host.
//!
//! ## Adding a strategy
//!
//! 1. Create a file in this directory and implement [`RetrievalStrategy`].
//! 2. Re-export it below.
//! 3. Insert it into [`Fetcher::with_default_strategies`] at the position it
//!    should be tried.
//!
//! The fan-out, logging and "drop the source on failure" policy are all
//! strategy-agnostic.

mod gh_api;
mod raw_url;

pub use gh_api::GhApiStrategy;
pub use raw_url::RawUrlStrategy;

use std::sync::LazyLock;

use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use tracing::{info, warn};

use crate::config::{Defaults, SourceDescriptor};
use crate::error::{Error, Result};

static GITHUB_REPO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"github\.com/([^/]+)/([^/?#]+)").unwrap());

/// `owner/repo` pair parsed from a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn from_url(url: &str) -> Result<Self> {
        let caps = GITHUB_REPO_RE
            .captures(url)
            .ok_or_else(|| Error::InvalidRepoUrl(url.to_string()))?;
        let repo = caps[2].trim_end_matches(".git");
        if repo.is_empty() {
            return Err(Error::InvalidRepoUrl(url.to_string()));
        }
        Ok(Self {
            owner: caps[1].to_string(),
            repo: repo.to_string(),
        })
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Everything a strategy needs to locate one posts file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub repo: RepoRef,
    pub path: String,
    pub branch: String,
}

impl FetchTarget {
    pub fn resolve(source: &SourceDescriptor, defaults: &Defaults) -> Result<Self> {
        Ok(Self {
            repo: RepoRef::from_url(&source.url)?,
            path: source.posts_path(defaults).to_string(),
            branch: source.branch(defaults).to_string(),
        })
    }
}

/// Unparsed posts file, tagged with its source's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub source_name: String,
    pub content: String,
}

/// One way of retrieving a posts file.
///
/// The fetcher calls strategies concurrently across sources, so
/// implementations must be [`Send`] + [`Sync`].
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    /// Short label used in log lines, e.g. `"gh api"`.
    fn name(&self) -> &str;

    /// Fetch the file text or fail.
    async fn retrieve(&self, target: &FetchTarget) -> Result<String>;
}

/// Runs the strategy list for each source.
pub struct Fetcher {
    strategies: Vec<Box<dyn RetrievalStrategy>>,
    defaults: Defaults,
}

impl Fetcher {
    pub fn new(strategies: Vec<Box<dyn RetrievalStrategy>>, defaults: Defaults) -> Self {
        Self {
            strategies,
            defaults,
        }
    }

    /// `gh api` first, then the public raw URL.
    pub fn with_default_strategies(defaults: Defaults) -> Result<Self> {
        let strategies: Vec<Box<dyn RetrievalStrategy>> = vec![
            Box::new(GhApiStrategy::new(defaults.fetch_timeout)),
            Box::new(RawUrlStrategy::new(defaults.fetch_timeout)?),
        ];
        Ok(Self::new(strategies, defaults))
    }

    /// Retrieve one source. Returns `None` (after a warning) when the URL
    /// is unusable or every strategy fails.
    pub async fn fetch(&self, source: &SourceDescriptor) -> Option<RawDocument> {
        let target = match FetchTarget::resolve(source, &self.defaults) {
            Ok(t) => t,
            Err(e) => {
                warn!("{}: {e}", source.name);
                return None;
            }
        };

        let mut last_error = None;
        for strategy in &self.strategies {
            match strategy.retrieve(&target).await {
                Ok(content) => {
                    info!(
                        "Fetched {} from {} (via {})",
                        target.path,
                        source.name,
                        strategy.name()
                    );
                    return Some(RawDocument {
                        source_name: source.name.clone(),
                        content,
                    });
                }
                Err(e) => last_error = Some(e),
            }
        }

        match last_error {
            Some(e) => warn!("Could not fetch posts from {}: {e}; skipping", source.name),
            None => warn!("No retrieval strategies configured for {}; skipping", source.name),
        }
        None
    }

    /// Fetch every source concurrently and wait for all of them. The result
    /// has one slot per source, in input order.
    pub async fn fetch_all(&self, sources: &[SourceDescriptor]) -> Vec<Option<RawDocument>> {
        join_all(sources.iter().map(|s| self.fetch(s))).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
