//! `csv-to-json`: convert the refreshed CSV files into the JSON the site
//! build imports. Column order is kept as object key order.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::info;

use super::read_csv;
use crate::config::SiteLayout;

/// `raw-data/<csv>` → `src/data/<json>`.
pub const CONVERSIONS: &[(&str, &str)] = &[
    ("github_repos.csv", "github-repos.json"),
    ("linkedin_ai_posts.csv", "linkedin-posts.json"),
    ("medium_articles.csv", "medium-articles.json"),
    ("youtube_videos.csv", "youtube-videos.json"),
    ("chariot_content.csv", "chariot-content.json"),
    ("speaking_engagements.csv", "speaking.json"),
];

/// Convert one file, returning the number of records.
pub fn convert_file(csv_path: &Path, json_path: &Path) -> Result<usize> {
    let (headers, rows) = read_csv(csv_path)?;

    let records: Vec<Value> = rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = headers
                .iter()
                .zip(row.iter())
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect();
            Value::Object(object)
        })
        .collect();

    if let Some(parent) = json_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut text = serde_json::to_string_pretty(&records)?;
    text.push('\n');
    std::fs::write(json_path, text).with_context(|| format!("writing {}", json_path.display()))?;

    Ok(records.len())
}

/// Convert every known CSV present under `raw-data/`. Returns how many
/// files were converted.
pub fn run(layout: &SiteLayout) -> Result<usize> {
    let mut converted = 0;

    for (csv_name, json_name) in CONVERSIONS {
        let csv_path = layout.raw_data(csv_name);
        if !csv_path.exists() {
            info!("[SKIP] {csv_name} not found");
            continue;
        }
        let count = convert_file(&csv_path, &layout.data_file(json_name))?;
        info!("[OK] {csv_name} -> {json_name} ({count} records)");
        converted += 1;
    }

    Ok(converted)
}
