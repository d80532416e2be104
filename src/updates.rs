//! The `updates` task: merge every tracked repo's posts into one page.
//!
//! config → fetch (concurrent) → parse → merge → write → render.

use std::path::Path;

use tracing::{info, warn};

use crate::config::{SiteLayout, UpdatesConfig};
use crate::error::Result;
use crate::post::{parse_document, MergedDocument};
use crate::render::Renderer;
use crate::source::Fetcher;

/// How a run ended. Both are successful outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdatesOutcome {
    /// Nothing to show; both outputs were written empty.
    Empty,
    /// The merged document was written and rendered.
    Rendered { posts: usize, sources: usize },
}

/// Load the config from the site layout and run with the default strategies.
pub async fn run(layout: &SiteLayout) -> Result<UpdatesOutcome> {
    let config = UpdatesConfig::load(&layout.updates_config())?;
    let fetcher = Fetcher::with_default_strategies(config.defaults.clone())?;
    run_with(layout, &config, &fetcher).await
}

pub async fn run_with(
    layout: &SiteLayout,
    config: &UpdatesConfig,
    fetcher: &Fetcher,
) -> Result<UpdatesOutcome> {
    let merged_path = layout.updates_merged();
    let output_path = layout.updates_output();

    info!("Building project updates from {} repo(s)", config.sources.len());

    let documents: Vec<_> = fetcher
        .fetch_all(&config.sources)
        .await
        .into_iter()
        .flatten()
        .collect();

    if documents.is_empty() {
        warn!("No repos returned posts; generating empty updates page");
        write_empty(&merged_path, &output_path)?;
        return Ok(UpdatesOutcome::Empty);
    }

    let undated = config.defaults.undated_sort_key;
    let merged = MergedDocument::merge(
        config.site.clone(),
        documents
            .iter()
            .map(|doc| parse_document(&doc.content, &doc.source_name, undated)),
    );

    if merged.is_empty() {
        warn!("No posts found across all repos; generating empty updates page");
        write_empty(&merged_path, &output_path)?;
        return Ok(UpdatesOutcome::Empty);
    }

    info!(
        "Merged {} posts from {} repo(s)",
        merged.records.len(),
        documents.len()
    );

    write_file(&merged_path, &merged.serialize())?;
    info!("Wrote merged posts to {}", merged_path.display());

    Renderer::new(&config.renderer)
        .render(&merged_path, &output_path, &layout.updates_template())
        .await?;
    info!("Generated updates HTML: {}", output_path.display());

    Ok(UpdatesOutcome::Rendered {
        posts: merged.records.len(),
        sources: documents.len(),
    })
}

fn write_empty(merged: &Path, output: &Path) -> Result<()> {
    write_file(merged, "")?;
    write_file(output, "")
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::config::{Defaults, RendererConfig, SourceDescriptor};
    use crate::error::Error;
    use crate::post::SiteMeta;
    use crate::source::{FetchTarget, RetrievalStrategy};

    /// Serves fixed documents keyed by repo name; anything else is a 404.
    struct Fixed(HashMap<&'static str, String>);

    #[async_trait]
    impl RetrievalStrategy for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn retrieve(&self, target: &FetchTarget) -> crate::error::Result<String> {
            self.0
                .get(target.repo.repo.as_str())
                .cloned()
                .ok_or(Error::HttpStatus(404))
        }
    }

    fn posts_file(site: &str, posts: &[(&str, &str, &str)]) -> String {
        let mut out = format!("+++\nsite_title: {site}\n+++\n\n{site} page\n\n");
        for (title, date, body) in posts {
            out.push_str(&format!("+++\ntitle: {title}\ndate: {date}\n+++\n\n{body}\n\n"));
        }
        out
    }

    fn config(renderer: &[&str]) -> UpdatesConfig {
        let source = |name: &str, repo: &str| SourceDescriptor {
            url: format!("https://github.com/jane/{repo}"),
            name: name.to_string(),
            path: None,
            branch: None,
        };
        UpdatesConfig {
            site: SiteMeta {
                site_title: "Project Updates".into(),
                author: "Jane".into(),
            },
            sources: vec![source("A", "a"), source("B", "b")],
            defaults: Defaults::default(),
            renderer: RendererConfig {
                command: renderer.iter().map(|s| s.to_string()).collect(),
                flag: String::new(),
            },
        }
    }

    fn fetcher(docs: HashMap<&'static str, String>) -> Fetcher {
        Fetcher::new(vec![Box::new(Fixed(docs))], Defaults::default())
    }

    fn layout_with_template() -> (tempfile::TempDir, SiteLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = SiteLayout::new(dir.path());
        let template = layout.updates_template();
        std::fs::create_dir_all(template.parent().unwrap()).unwrap();
        std::fs::write(&template, "<ul></ul>").unwrap();
        (dir, layout)
    }

    #[tokio::test]
    async fn all_sources_failing_writes_empty_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SiteLayout::new(dir.path());

        let outcome = run_with(&layout, &config(&["false"]), &fetcher(HashMap::new()))
            .await
            .unwrap();

        assert_eq!(outcome, UpdatesOutcome::Empty);
        assert_eq!(std::fs::read_to_string(layout.updates_merged()).unwrap(), "");
        assert_eq!(std::fs::read_to_string(layout.updates_output()).unwrap(), "");
    }

    #[tokio::test]
    async fn header_only_sources_write_empty_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SiteLayout::new(dir.path());
        std::fs::create_dir_all(layout.updates_merged().parent().unwrap()).unwrap();
        std::fs::write(layout.updates_merged(), "stale").unwrap();

        let docs = HashMap::from([("a", posts_file("A", &[])), ("b", posts_file("B", &[]))]);
        let outcome = run_with(&layout, &config(&["false"]), &fetcher(docs)).await.unwrap();

        assert_eq!(outcome, UpdatesOutcome::Empty);
        assert_eq!(std::fs::read_to_string(layout.updates_merged()).unwrap(), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn merges_sources_newest_first_and_renders() {
        let (_dir, layout) = layout_with_template();
        let docs = HashMap::from([
            (
                "a",
                posts_file("A", &[("jan", "2024-01-01", "A jan"), ("mar", "2024-03-01", "A mar")]),
            ),
            ("b", posts_file("B", &[("feb", "2024-02-01", "B feb")])),
        ]);

        let outcome = run_with(&layout, &config(&["true"]), &fetcher(docs)).await.unwrap();
        assert_eq!(outcome, UpdatesOutcome::Rendered { posts: 3, sources: 2 });

        let merged = std::fs::read_to_string(layout.updates_merged()).unwrap();
        assert!(merged.starts_with("+++\nsite_title: \"Project Updates\"\nauthor: Jane\n+++\n"));
        let mar = merged.find("A mar").unwrap();
        let feb = merged.find("B feb").unwrap();
        let jan = merged.find("A jan").unwrap();
        assert!(mar < feb && feb < jan);
        assert!(merged.contains("<span class=\"project-badge\">B</span>\n\nB feb"));
        assert!(!merged.contains("A page"), "source site body must not leak");
    }

    #[tokio::test]
    async fn missing_template_is_fatal_after_writing_merge() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SiteLayout::new(dir.path());
        let docs = HashMap::from([("a", posts_file("A", &[("one", "2024-01-01", "x")]))]);

        let err = run_with(&layout, &config(&["true"]), &fetcher(docs))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TemplateNotFound(_)));
        assert!(layout.updates_merged().exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn renderer_failure_is_fatal() {
        let (_dir, layout) = layout_with_template();
        let docs = HashMap::from([("a", posts_file("A", &[("one", "2024-01-01", "x")]))]);

        let err = run_with(&layout, &config(&["false"]), &fetcher(docs))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Renderer(_)));
    }

    #[tokio::test]
    async fn run_without_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&SiteLayout::new(dir.path())).await.unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }
}
