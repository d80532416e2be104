//! `youtube`: videos in a playlist, listed with `yt-dlp`.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::info;

use super::{run_tool, write_csv};

pub const OUTPUT_FILE: &str = "youtube_videos.csv";

const HEADERS: &[&str] = &["URL", "Title"];
const TIMEOUT: Duration = Duration::from_secs(60);
const PRINT_FORMAT: &str = "%(url)s\t%(title)s";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub url: String,
    pub title: String,
}

pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={playlist_id}")
}

/// Parse `url<TAB>title` lines. Only the first tab separates; any later
/// tabs belong to the title.
pub fn parse_listing(raw: &str) -> Vec<Video> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (url, title) = line.split_once('\t').unwrap_or((line, ""));
            Video {
                url: url.to_string(),
                title: title.to_string(),
            }
        })
        .collect()
}

pub fn write_videos(path: &Path, videos: &[Video]) -> Result<()> {
    write_csv(
        path,
        HEADERS,
        videos.iter().map(|v| [v.url.as_str(), v.title.as_str()]),
    )
}

pub async fn run(playlist_id: &str, output: &Path) -> Result<usize> {
    let ytdlp = which::which("yt-dlp")
        .map_err(|_| anyhow!("yt-dlp is not installed (e.g. `brew install yt-dlp`)"))?;

    let url = playlist_url(playlist_id);
    info!("Fetching YouTube playlist {url}");

    let raw = run_tool(
        &ytdlp.to_string_lossy(),
        &["--flat-playlist", "--print", PRINT_FORMAT, url.as_str()],
        TIMEOUT,
    )
    .await?;

    let videos = parse_listing(raw.trim());
    info!("Videos found: {}", videos.len());
    write_videos(output, &videos)?;
    Ok(videos.len())
}
