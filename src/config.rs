//! Configuration: the site directory layout, the updates config file, and
//! the named defaults that flow from it into the fetcher and parser.
//!
//! All paths the tasks read or write are resolved through [`SiteLayout`],
//! so every subcommand can be pointed at a different checkout with
//! `--root`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::post::SiteMeta;

/// Path of the posts file inside each tracked repository.
pub const DEFAULT_POSTS_PATH: &str = "monolog/posts.md";

/// Branch the posts file is read from.
pub const DEFAULT_BRANCH: &str = "main";

/// Sort key for posts with no (or an unreadable) `date:` line. Earlier than
/// any date a post can carry, so undated posts always land at the end.
pub const UNDATED_SORT_KEY: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

/// Upper bound on any single retrieval attempt.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Public raw-content host used by the unauthenticated fallback.
pub const RAW_GITHUB_BASE: &str = "https://raw.githubusercontent.com";

pub const DEFAULT_RENDER_COMMAND: &[&str] = &["npx", "monolog"];
pub const DEFAULT_RENDER_FLAG: &str = "--permalinks";

// ---------------------------------------------------------------------------
// Site layout
// ---------------------------------------------------------------------------

/// Fixed relative layout of the site checkout.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    root: PathBuf,
}

impl SiteLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn updates_config(&self) -> PathBuf {
        self.root.join("updates.config.yaml")
    }

    pub fn updates_template(&self) -> PathBuf {
        self.root.join("templates").join("updates-template.html")
    }

    pub fn updates_merged(&self) -> PathBuf {
        self.data_file("updates-merged.md")
    }

    pub fn updates_output(&self) -> PathBuf {
        self.data_file("updates-output.html")
    }

    /// `raw-data/<name>`: CSV produced by the refresh tasks.
    pub fn raw_data(&self, name: &str) -> PathBuf {
        self.root.join("raw-data").join(name)
    }

    /// `src/data/<name>`: files consumed by the static-site build.
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.root.join("src").join("data").join(name)
    }

    pub fn linkedin_export(&self) -> PathBuf {
        self.root
            .join("linkedin")
            .join("complete-export")
            .join("Shares.csv")
    }
}

// ---------------------------------------------------------------------------
// Updates config
// ---------------------------------------------------------------------------

/// One tracked repository contributing posts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceDescriptor {
    /// Repository URL, e.g. `https://github.com/owner/repo`.
    pub url: String,
    /// Display name, used for the project badge and in log lines.
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

impl SourceDescriptor {
    pub fn posts_path<'a>(&'a self, defaults: &'a Defaults) -> &'a str {
        self.path.as_deref().unwrap_or(&defaults.posts_path)
    }

    pub fn branch<'a>(&'a self, defaults: &'a Defaults) -> &'a str {
        self.branch.as_deref().unwrap_or(&defaults.branch)
    }
}

/// Values that apply whenever a source or post leaves something unset.
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    pub posts_path: String,
    pub branch: String,
    pub undated_sort_key: DateTime<Utc>,
    pub fetch_timeout: Duration,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            posts_path: DEFAULT_POSTS_PATH.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            undated_sort_key: UNDATED_SORT_KEY,
            fetch_timeout: FETCH_TIMEOUT,
        }
    }
}

/// How the merged document is turned into HTML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Program followed by any leading arguments.
    pub command: Vec<String>,
    /// Formatting flag appended after the path arguments. Empty means none.
    pub flag: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_RENDER_COMMAND.iter().map(|s| s.to_string()).collect(),
            flag: DEFAULT_RENDER_FLAG.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawUpdatesConfig {
    #[serde(default)]
    site_title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    default_path: Option<String>,
    #[serde(default)]
    renderer: RendererConfig,
    #[serde(default)]
    repos: Vec<SourceDescriptor>,
}

/// Parsed `updates.config.yaml`.
#[derive(Debug, Clone)]
pub struct UpdatesConfig {
    pub site: SiteMeta,
    pub sources: Vec<SourceDescriptor>,
    pub defaults: Defaults,
    pub renderer: RendererConfig,
}

impl UpdatesConfig {
    /// Load and validate the config file. A missing file or an empty
    /// source list is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text, path)
    }

    /// Parse config text; `origin` is only used in error messages.
    pub fn from_yaml(text: &str, origin: &Path) -> Result<Self> {
        let raw: RawUpdatesConfig = serde_yaml::from_str(text).map_err(|source| Error::Config {
            path: origin.to_path_buf(),
            source,
        })?;

        if raw.repos.is_empty() {
            return Err(Error::NoSources(origin.to_path_buf()));
        }

        let mut defaults = Defaults::default();
        if let Some(branch) = raw.default_branch {
            defaults.branch = branch;
        }
        if let Some(path) = raw.default_path {
            defaults.posts_path = path;
        }

        Ok(Self {
            site: SiteMeta {
                site_title: raw.site_title,
                author: raw.author,
            },
            sources: raw.repos,
            defaults,
            renderer: raw.renderer,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
site_title: Project Updates
author: Jane Doe
repos:
  - url: https://github.com/jane/alpha
    name: Alpha
  - url: https://github.com/jane/beta
    name: Beta
    path: notes/posts.md
    branch: trunk
"#;

    #[test]
    fn parses_sources_and_site_meta() {
        let cfg = UpdatesConfig::from_yaml(SAMPLE, Path::new("updates.config.yaml")).unwrap();

        assert_eq!(cfg.site.site_title, "Project Updates");
        assert_eq!(cfg.site.author, "Jane Doe");
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.sources[0].name, "Alpha");
        assert_eq!(cfg.renderer, RendererConfig::default());
    }

    #[test]
    fn descriptor_falls_back_to_defaults() {
        let cfg = UpdatesConfig::from_yaml(SAMPLE, Path::new("x")).unwrap();
        let d = &cfg.defaults;

        assert_eq!(cfg.sources[0].posts_path(d), DEFAULT_POSTS_PATH);
        assert_eq!(cfg.sources[0].branch(d), DEFAULT_BRANCH);
        assert_eq!(cfg.sources[1].posts_path(d), "notes/posts.md");
        assert_eq!(cfg.sources[1].branch(d), "trunk");
    }

    #[test]
    fn global_defaults_override_constants() {
        let yaml = r#"
site_title: T
author: A
default_branch: develop
default_path: updates.md
renderer:
  command: [monolog]
  flag: ""
repos:
  - url: https://github.com/a/b
    name: B
"#;
        let cfg = UpdatesConfig::from_yaml(yaml, Path::new("x")).unwrap();

        assert_eq!(cfg.sources[0].branch(&cfg.defaults), "develop");
        assert_eq!(cfg.sources[0].posts_path(&cfg.defaults), "updates.md");
        assert_eq!(cfg.renderer.command, vec!["monolog".to_string()]);
        assert!(cfg.renderer.flag.is_empty());
    }

    #[test]
    fn empty_repo_list_is_rejected() {
        let yaml = "site_title: T\nauthor: A\nrepos: []\n";
        let err = UpdatesConfig::from_yaml(yaml, Path::new("x")).unwrap_err();
        assert!(matches!(err, Error::NoSources(_)));
    }

    #[test]
    fn missing_repo_key_is_rejected() {
        let err = UpdatesConfig::from_yaml("site_title: T\n", Path::new("x")).unwrap_err();
        assert!(matches!(err, Error::NoSources(_)));
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let err = UpdatesConfig::from_yaml("repos: [unterminated", Path::new("x")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("updates.config.yaml");
        let err = UpdatesConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(p) if p == path));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SiteLayout::new(dir.path());
        std::fs::write(layout.updates_config(), SAMPLE).unwrap();

        let cfg = UpdatesConfig::load(&layout.updates_config()).unwrap();
        assert_eq!(cfg.sources.len(), 2);
    }

    #[test]
    fn layout_resolves_under_root() {
        let layout = SiteLayout::new("/site");
        assert_eq!(
            layout.updates_merged(),
            PathBuf::from("/site/src/data/updates-merged.md")
        );
        assert_eq!(
            layout.raw_data("github_repos.csv"),
            PathBuf::from("/site/raw-data/github_repos.csv")
        );
        assert_eq!(
            layout.updates_template(),
            PathBuf::from("/site/templates/updates-template.html")
        );
    }
}
