//! `chariot`: content listed on a WordPress site's search results.
//!
//! Scrapes the paginated search page, keeps content-type articles, carries
//! over dates already recorded in the previous output, appends manual
//! entries, then looks up publication dates for whatever is still undated.
//! Extraction is regex-based and tailored to the theme's markup
//! (`article.type-*`, `.entry-title a`, `.entry-summary p`, `.nav-links`).

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::info;

use super::{read_csv, write_csv};
use crate::config::FETCH_TIMEOUT;

pub const OUTPUT_FILE: &str = "chariot_content.csv";
pub const MANUAL_FILE: &str = "chariot_content_manual.csv";

/// Safety limit on search result pages.
pub const MAX_PAGES: usize = 20;

/// Written when a post page was checked and had no date.
pub const NO_DATE: &str = "none";

const HEADERS: &[&str] = &["Title", "URL", "Type", "Description", "Date"];

static ARTICLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<article\b([^>]*)>(.*?)</article>").unwrap());
static TYPE_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)class\s*=\s*["'][^"']*?\btype-(\w+)"#).unwrap());
static TITLE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)class\s*=\s*["'][^"']*\bentry-title\b[^"']*["'][^>]*>.*?<a\b([^>]*)>(.*?)</a>"#)
        .unwrap()
});
static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)class\s*=\s*["'][^"']*\bentry-summary\b[^"']*["'][^>]*>.*?<p\b[^>]*>(.*?)</p>"#)
        .unwrap()
});
static NAV_LINKS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)class\s*=\s*["'][^"']*\bnav-links\b"#).unwrap());
static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a>").unwrap());
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhref\s*=\s*["']([^"']*)["']"#).unwrap());
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<time\b([^>]*)>").unwrap());
static DATETIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bdatetime\s*=\s*["']([^"']*)["']"#).unwrap());
static ENTRY_DATE_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)class\s*=\s*["'][^"']*\bentry-date\b"#).unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(?:x([0-9a-fA-F]+)|([0-9]+));").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static PODCAST_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Podcast:\s*Play in new window\s*\|\s*Download\s*\([^)]*\)\s*\|\s*Embed\s*")
        .unwrap()
});

/// Display label for a WordPress content type slug; `None` for types that
/// are not content (pages, attachments, ...).
pub fn type_label(slug: &str) -> Option<&'static str> {
    Some(match slug {
        "blog" => "Blog",
        "podcast" => "Podcast",
        "event" => "Event",
        "news" => "News",
        "presentation" => "Presentation",
        "webinar" => "Webinar",
        "video" => "Video",
        _ => return None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub title: String,
    pub url: String,
    pub kind: String,
    pub description: String,
    /// `YYYY-MM-DD`, [`NO_DATE`], or empty when not looked up yet.
    pub date: String,
}

impl ContentItem {
    fn row(&self) -> [&str; 5] {
        [
            &self.title,
            &self.url,
            &self.kind,
            &self.description,
            &self.date,
        ]
    }
}

// ---------------------------------------------------------------------------
// Markup helpers
// ---------------------------------------------------------------------------

fn decode_entities(s: &str) -> String {
    let named = s
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&hellip;", "…");
    let numeric = NUMERIC_ENTITY_RE.replace_all(&named, |caps: &regex::Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    // Last, so "&amp;lt;" stays "&lt;".
    numeric.replace("&amp;", "&")
}

/// Visible text of an HTML fragment: tags removed, entities decoded,
/// whitespace collapsed.
fn text_of(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

fn href_of(attrs: &str) -> Option<String> {
    HREF_RE
        .captures(attrs)
        .map(|c| decode_entities(&c[1]))
        .filter(|h| !h.is_empty())
}

fn clean_description(text: &str) -> String {
    let without_player = PODCAST_PREFIX_RE.replace(text, "");
    WHITESPACE_RE
        .replace_all(&without_player, " ")
        .trim()
        .to_string()
}

/// Content items on one search results page. Dates are left empty.
pub fn extract_items(html: &str) -> Vec<ContentItem> {
    ARTICLE_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let attrs = &caps[1];
            let inner = &caps[2];

            let slug = TYPE_CLASS_RE
                .captures(attrs)
                .map(|c| c[1].to_lowercase())
                .unwrap_or_else(|| "unknown".to_string());
            let kind = type_label(&slug)?;

            let link = TITLE_LINK_RE.captures(inner)?;
            let url = href_of(&link[1])?;
            let title = text_of(&link[2]);
            if title.is_empty() {
                return None;
            }

            let description = SUMMARY_RE
                .captures(inner)
                .map(|c| clean_description(&text_of(&c[1])))
                .unwrap_or_default();

            Some(ContentItem {
                title,
                url,
                kind: kind.to_string(),
                description,
                date: String::new(),
            })
        })
        .collect()
}

/// The "Next" link in the pagination block, if any.
pub fn next_page_url(html: &str) -> Option<String> {
    let nav = NAV_LINKS_RE.find(html)?;
    ANCHOR_RE
        .captures_iter(&html[nav.end()..])
        .find(|c| text_of(&c[2]).contains("Next"))
        .and_then(|c| href_of(&c[1]))
}

/// Publication date (`YYYY-MM-DD`) from a post page: the `time.entry-date`
/// element, else the first `<time>`.
pub fn extract_date(html: &str) -> Option<String> {
    let tags: Vec<&str> = TIME_RE
        .captures_iter(html)
        .map(|c| c.get(1).map_or("", |m| m.as_str()))
        .collect();

    let datetime = |attrs: &str| DATETIME_RE.captures(attrs).map(|c| c[1].to_string());

    let found = tags
        .iter()
        .find(|attrs| ENTRY_DATE_CLASS_RE.is_match(attrs))
        .and_then(|attrs| datetime(attrs))
        .or_else(|| tags.first().and_then(|attrs| datetime(attrs)))?;

    let date: String = found.chars().take(10).collect();
    (!date.is_empty()).then_some(date)
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Items de-duplicated by URL, in first-seen order.
#[derive(Debug, Default)]
pub struct Collection {
    items: Vec<ContentItem>,
    seen: HashSet<String>,
    /// URL → date from the previous run's output.
    known_dates: HashMap<String, String>,
}

impl Collection {
    pub fn new(known_dates: HashMap<String, String>) -> Self {
        Self {
            known_dates,
            ..Default::default()
        }
    }

    fn known_date(&self, url: &str) -> Option<&str> {
        self.known_dates
            .get(url)
            .map(String::as_str)
            .filter(|d| !d.is_empty())
    }

    /// Add a scraped item unless its URL was already seen. Scraped items
    /// take the previously recorded date when there is one.
    pub fn add_scraped(&mut self, mut item: ContentItem) -> bool {
        if !self.seen.insert(item.url.clone()) {
            return false;
        }
        if let Some(date) = self.known_date(&item.url) {
            item.date = date.to_string();
        }
        self.items.push(item);
        true
    }

    /// Add a manual entry unless its URL was already seen. A manual date
    /// wins over the previously recorded one.
    pub fn add_manual(&mut self, mut item: ContentItem) -> bool {
        if !self.seen.insert(item.url.clone()) {
            return false;
        }
        if item.date.is_empty() {
            if let Some(date) = self.known_date(&item.url) {
                item.date = date.to_string();
            }
        }
        self.items.push(item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_items(self) -> Vec<ContentItem> {
        self.items
    }
}

/// Load `URL → Date` from a previous output file, if present.
pub fn load_known_dates(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    Ok(load_items(path)?
        .into_iter()
        .map(|item| (item.url, item.date))
        .collect())
}

/// Read a file in the output layout. Columns are matched by header name;
/// missing columns read as empty.
pub fn load_items(path: &Path) -> Result<Vec<ContentItem>> {
    let (headers, rows) = read_csv(path)?;
    let column = |name: &str| headers.iter().position(|h| h == name);
    let (title, url, kind, description, date) = (
        column("Title"),
        column("URL"),
        column("Type"),
        column("Description"),
        column("Date"),
    );
    let field = |row: &csv::StringRecord, idx: Option<usize>| {
        idx.and_then(|i| row.get(i)).unwrap_or_default().to_string()
    };

    Ok(rows
        .iter()
        .map(|row| ContentItem {
            title: field(row, title),
            url: field(row, url),
            kind: field(row, kind),
            description: field(row, description),
            date: field(row, date),
        })
        .filter(|item| !item.url.is_empty())
        .collect())
}

// ---------------------------------------------------------------------------
// Scraper
// ---------------------------------------------------------------------------

pub struct Scraper {
    client: reqwest::Client,
    search_url: String,
}

impl Scraper {
    pub fn new(base: &str, query: &str) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            search_url: format!("{}/?s={query}", base.trim_end_matches('/')),
        })
    }

    /// Walk the search result pages into `collection`.
    pub async fn scrape_search(&self, collection: &mut Collection) -> Result<()> {
        let mut current = self.search_url.clone();

        for page in 1..=MAX_PAGES {
            info!("Fetching page {page}: {current}");

            let response = self.client.get(&current).send().await?;
            if !response.status().is_success() {
                info!("HTTP {}, stopping", response.status().as_u16());
                break;
            }
            let html = response.text().await?;

            let items = extract_items(&html);
            if items.is_empty() {
                info!("No items found, stopping");
                break;
            }
            let found = items.len();
            for item in items {
                collection.add_scraped(item);
            }
            info!("Found {found} items ({} total)", collection.len());

            match next_page_url(&html) {
                Some(next) => current = next,
                None => {
                    info!("No next page, done");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Date of one post page; empty on any failure.
    pub async fn fetch_date(&self, url: &str) -> String {
        let Ok(response) = self.client.get(url).send().await else {
            return String::new();
        };
        if !response.status().is_success() {
            return String::new();
        }
        match response.text().await {
            Ok(html) => extract_date(&html).unwrap_or_default(),
            Err(_) => String::new(),
        }
    }

    /// Look up dates for undated items, marking misses with [`NO_DATE`] so
    /// they are not re-fetched next run.
    pub async fn fill_dates(&self, items: &mut [ContentItem]) {
        let pending: Vec<usize> = (0..items.len()).filter(|&i| items[i].date.is_empty()).collect();
        if pending.is_empty() {
            info!("All entries already have dates");
            return;
        }

        info!("Fetching dates for {} entries", pending.len());
        let total = pending.len();
        for (n, i) in pending.into_iter().enumerate() {
            let item = &mut items[i];
            let date = self.fetch_date(&item.url).await;
            let short: String = item.title.chars().take(50).collect();
            info!(
                "[{}/{total}] {short}... {}",
                n + 1,
                if date.is_empty() { "(no date found)" } else { date.as_str() }
            );
            item.date = if date.is_empty() { NO_DATE.to_string() } else { date };
        }
    }
}

pub async fn run(base: &str, query: &str, output: &Path, manual: &Path) -> Result<usize> {
    let known = load_known_dates(output)?;
    info!(
        "Existing entries with dates: {}",
        known.values().filter(|d| !d.is_empty()).count()
    );

    let scraper = Scraper::new(base, query)?;
    let mut collection = Collection::new(known);
    scraper.scrape_search(&mut collection).await?;

    if manual.exists() {
        let entries = load_items(manual)?;
        let total = entries.len();
        let added = entries
            .into_iter()
            .filter(|entry| collection.add_manual(entry.clone()))
            .count();
        info!("Manual entries: {total} total, {added} new");
    }

    let mut items = collection.into_items();
    scraper.fill_dates(&mut items).await;

    info!("Total unique items: {}", items.len());
    write_csv(output, HEADERS, items.iter().map(ContentItem::row))?;
    Ok(items.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
