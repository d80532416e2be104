//! `repos`: the owner's GitHub repositories, via `gh repo list`.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use super::{run_tool, write_csv};

pub const OUTPUT_FILE: &str = "github_repos.csv";

const FIELDS: &str =
    "name,description,url,primaryLanguage,stargazerCount,forkCount,isPrivate,createdAt,updatedAt";
const LIMIT: &str = "100";
const TIMEOUT: Duration = Duration::from_secs(15);

const HEADERS: &[&str] = &[
    "Name",
    "Description",
    "URL",
    "Language",
    "Stars",
    "Forks",
    "Private",
    "Created",
    "Updated",
];

#[derive(Debug, Deserialize)]
struct Language {
    name: String,
}

/// One entry of `gh repo list --json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    primary_language: Option<Language>,
    pub stargazer_count: u64,
    pub fork_count: u64,
    pub is_private: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Repo {
    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.description.clone().unwrap_or_default(),
            self.url.clone(),
            self.primary_language
                .as_ref()
                .map(|l| l.name.clone())
                .unwrap_or_default(),
            self.stargazer_count.to_string(),
            self.fork_count.to_string(),
            if self.is_private { "True" } else { "False" }.to_string(),
            date_prefix(&self.created_at).to_string(),
            date_prefix(&self.updated_at).to_string(),
        ]
    }
}

/// `YYYY-MM-DD` part of an ISO timestamp.
fn date_prefix(ts: &str) -> &str {
    ts.get(..10).unwrap_or(ts)
}

pub fn parse_repo_list(json: &str) -> Result<Vec<Repo>> {
    serde_json::from_str(json).context("parsing gh repo list output")
}

pub fn write_repos(path: &Path, repos: &[Repo]) -> Result<()> {
    write_csv(path, HEADERS, repos.iter().map(Repo::row))
}

pub async fn run(user: &str, output: &Path) -> Result<usize> {
    info!("Fetching repos for {user}");
    let raw = run_tool(
        "gh",
        &["repo", "list", user, "--json", FIELDS, "--limit", LIMIT],
        TIMEOUT,
    )
    .await
    .context("failed to fetch repos")?;

    let repos = parse_repo_list(&raw)?;
    write_repos(output, &repos)?;
    Ok(repos.len())
}
