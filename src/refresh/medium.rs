//! `medium`: articles from a Medium RSS feed.
//!
//! Fetching and parsing are split so the parsing half is testable without
//! the network; [`parse_channel`] is a pure function over an already-read
//! [`rss::Channel`].

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use super::write_csv;

pub const OUTPUT_FILE: &str = "medium_articles.csv";

const HEADERS: &[&str] = &["Title", "URL", "Date", "Tags"];

/// One feed item, flattened for the CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    /// Link with tracking query parameters removed.
    pub url: String,
    /// `pubDate` exactly as published.
    pub date: String,
    /// Categories joined with `", "`.
    pub tags: String,
}

/// Turn feed items into articles. Items missing a title or link are dropped.
pub fn parse_channel(channel: &rss::Channel) -> Vec<Article> {
    channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title().filter(|t| !t.is_empty())?;
            let link = item.link().filter(|l| !l.is_empty())?;
            let url = link.split('?').next().unwrap_or(link);

            let tags = item
                .categories()
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(", ");

            Some(Article {
                title: title.to_string(),
                url: url.to_string(),
                date: item.pub_date().unwrap_or_default().to_string(),
                tags,
            })
        })
        .collect()
}

pub async fn fetch(feed_url: &str) -> Result<Vec<Article>> {
    let response = reqwest::get(feed_url)
        .await
        .with_context(|| format!("fetching {feed_url}"))?;
    let status = response.status();
    if !status.is_success() {
        bail!("HTTP {} fetching RSS feed", status.as_u16());
    }
    let body = response.bytes().await?;
    let channel = rss::Channel::read_from(body.as_ref()).context("parsing RSS feed")?;
    Ok(parse_channel(&channel))
}

pub fn write_articles(path: &Path, articles: &[Article]) -> Result<()> {
    write_csv(
        path,
        HEADERS,
        articles
            .iter()
            .map(|a| [a.title.as_str(), a.url.as_str(), a.date.as_str(), a.tags.as_str()]),
    )
}

pub async fn run(feed_url: &str, output: &Path) -> Result<usize> {
    info!("Refreshing Medium articles from {feed_url}");
    let articles = fetch(feed_url).await?;
    info!("Articles found: {}", articles.len());
    write_articles(output, &articles)?;
    Ok(articles.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
