//! Error types for the updates pipeline.
//!
//! Only configuration-level and renderer-level failures ever reach `main`.
//! Fetch and parse problems are logged where they happen and turned into
//! "no document" / "no records", so most variants below are seen by the
//! fetcher as retrieval-strategy failures rather than by the operator.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for updates operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The updates configuration file does not exist.
    #[error("configuration not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration parsed but lists no sources.
    #[error("no repos configured in {}", .0.display())]
    NoSources(PathBuf),

    /// The configuration file could not be parsed.
    #[error("invalid configuration {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The renderer template is missing.
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// The external renderer could not be run or exited non-zero.
    #[error("renderer failed: {0}")]
    Renderer(String),

    /// An external tool (gh, yt-dlp, ...) failed.
    #[error("{tool}: {message}")]
    Tool { tool: String, message: String },

    /// An operation exceeded its time bound.
    #[error("{0} timed out")]
    Timeout(String),

    /// Non-success HTTP status.
    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Source URL is not a recognisable GitHub repository URL.
    #[error("invalid GitHub URL: {0}")]
    InvalidRepoUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_path() {
        let err = Error::TemplateNotFound(PathBuf::from("templates/updates-template.html"));
        assert_eq!(
            err.to_string(),
            "template not found: templates/updates-template.html"
        );
    }

    #[test]
    fn tool_error_prefixes_tool_name() {
        let err = Error::tool("gh", "exit status 1");
        assert_eq!(err.to_string(), "gh: exit status 1");
    }
}
