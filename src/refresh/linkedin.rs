//! `linkedin`: AI-related posts curated from a local LinkedIn export.

use std::path::Path;

use anyhow::{bail, Result};
use csv::StringRecord;
use tracing::{info, warn};

use super::{read_csv, write_csv};

pub const OUTPUT_FILE: &str = "linkedin_ai_posts.csv";

/// The export is newest-first; only this many recent posts are considered.
pub const RECENT_LIMIT: usize = 50;

const COMMENTARY_COLUMN: &str = "ShareCommentary";

/// Case-insensitive substrings that mark a post as AI-related.
pub const AI_KEYWORDS: &[&str] = &[
    "ai",
    "artificial intelligence",
    "machine learning",
    "ml",
    "llm",
    "gpt",
    "claude",
    "openai",
    "anthropic",
    "gemini",
    "agent",
    "chatgpt",
    "neural",
    "deep learning",
    "model",
    "prompt",
    "token",
    "embedding",
    "inference",
];

pub fn is_ai_related(text: &str) -> bool {
    let text = text.to_lowercase();
    AI_KEYWORDS.iter().any(|kw| text.contains(kw))
}

/// Keep the AI-related posts among the most recent [`RECENT_LIMIT`].
pub fn curate(headers: &StringRecord, rows: Vec<StringRecord>) -> Vec<StringRecord> {
    let Some(column) = headers.iter().position(|h| h == COMMENTARY_COLUMN) else {
        warn!("{COMMENTARY_COLUMN} column missing from export; no posts selected");
        return Vec::new();
    };

    rows.into_iter()
        .take(RECENT_LIMIT)
        .filter(|row| row.get(column).is_some_and(is_ai_related))
        .collect()
}

pub fn run(input: &Path, output: &Path) -> Result<usize> {
    if !input.exists() {
        bail!(
            "LinkedIn export not found: {} (place your LinkedIn export at linkedin/complete-export/)",
            input.display()
        );
    }

    let (headers, rows) = read_csv(input)?;
    info!("Total posts in export: {}", rows.len());

    let posts = curate(&headers, rows);
    info!("AI-related posts found: {}", posts.len());

    let header_names: Vec<&str> = headers.iter().collect();
    write_csv(output, &header_names, &posts)?;
    Ok(posts.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> StringRecord {
        StringRecord::from(vec!["Date", "ShareLink", "ShareCommentary"])
    }

    fn row(i: usize, text: &str) -> StringRecord {
        StringRecord::from(vec![format!("2024-01-{i:02}"), format!("https://l/{i}"), text.to_string()])
    }

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        assert!(is_ai_related("Trying out Claude for code review"));
        assert!(is_ai_related("New LLM benchmarks"));
        assert!(!is_ai_related("Hiking photos from the weekend"));
    }

    #[test]
    fn only_recent_posts_are_considered() {
        let mut rows: Vec<_> = (0..RECENT_LIMIT).map(|i| row(i, "gardening")).collect();
        rows.push(row(99, "an LLM post beyond the window"));

        assert!(curate(&headers(), rows).is_empty());
    }

    #[test]
    fn keeps_matching_rows_in_order() {
        let rows = vec![row(1, "GPT thoughts"), row(2, "cats"), row(3, "prompt tips")];
        let kept = curate(&headers(), rows);

        assert_eq!(kept.len(), 2);
        assert_eq!(&kept[0][2], "GPT thoughts");
        assert_eq!(&kept[1][2], "prompt tips");
    }

    #[test]
    fn missing_column_selects_nothing() {
        let headers = StringRecord::from(vec!["Date"]);
        assert!(curate(&headers, vec![StringRecord::from(vec!["x"])]).is_empty());
    }

    #[test]
    fn run_writes_export_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Shares.csv");
        let output = dir.path().join(OUTPUT_FILE);
        std::fs::write(
            &input,
            "Date,ShareLink,ShareCommentary\r\n2024-02-01,https://l/1,\"Agents, finally\"\r\n2024-01-01,https://l/2,Bread\r\n",
        )
        .unwrap();

        assert_eq!(run(&input, &output).unwrap(), 1);
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            text,
            "Date,ShareLink,ShareCommentary\n2024-02-01,https://l/1,\"Agents, finally\"\n"
        );
    }

    #[test]
    fn missing_export_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&dir.path().join("Shares.csv"), &dir.path().join("out.csv")).unwrap_err();
        assert!(err.to_string().contains("LinkedIn export not found"));
    }
}
