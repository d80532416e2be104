//! Unauthenticated retrieval from the raw-content host. Public repos only.

use std::time::Duration;

use async_trait::async_trait;

use super::{FetchTarget, RetrievalStrategy};
use crate::config::RAW_GITHUB_BASE;
use crate::error::{Error, Result};

pub struct RawUrlStrategy {
    client: reqwest::Client,
    base: String,
}

impl RawUrlStrategy {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base(RAW_GITHUB_BASE, timeout)
    }

    /// Point at a different host (mirrors, tests).
    pub fn with_base(base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, target: &FetchTarget) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base, target.repo, target.branch, target.path
        )
    }
}

#[async_trait]
impl RetrievalStrategy for RawUrlStrategy {
    fn name(&self) -> &str {
        "raw URL"
    }

    async fn retrieve(&self, target: &FetchTarget) -> Result<String> {
        let response = self.client.get(self.url(target)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}
