//! Merging per-source records into one document and writing it back out in
//! the posts-file format.

use std::fmt::Write as _;

use super::parser::DELIMITER;
use super::Record;

/// Site-level metadata written at the top of the merged document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteMeta {
    pub site_title: String,
    pub author: String,
}

/// All records, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDocument {
    pub site: SiteMeta,
    pub records: Vec<Record>,
}

impl MergedDocument {
    /// Concatenate the per-source sequences in the order given and sort
    /// newest first. The sort is stable, so same-dated posts keep the
    /// concatenation order.
    pub fn merge<I>(site: SiteMeta, per_source: I) -> Self
    where
        I: IntoIterator<Item = Vec<Record>>,
    {
        let mut records: Vec<Record> = per_source.into_iter().flatten().collect();
        records.sort_by(Record::newest_first);
        Self { site, records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render in the posts-file format, with a project badge ahead of each
    /// post body.
    pub fn serialize(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "{DELIMITER}");
        let _ = writeln!(out, "site_title: \"{}\"", self.site.site_title);
        let _ = writeln!(out, "author: {}", self.site.author);
        let _ = writeln!(out, "{DELIMITER}\n");

        for record in &self.records {
            let _ = writeln!(out, "{DELIMITER}");
            let _ = writeln!(out, "{}", record.meta);
            let _ = writeln!(out, "{DELIMITER}\n");
            let _ = writeln!(out, "{}\n", badge(&record.source_name));
            if !record.body.is_empty() {
                let _ = writeln!(out, "{}\n", record.body);
            }
        }

        out
    }
}

/// Inline HTML marker attributing a post to its source.
pub fn badge(source_name: &str) -> String {
    format!(
        "<span class=\"project-badge\">{}</span>",
        escape_html(source_name)
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
