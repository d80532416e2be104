//! Authenticated retrieval through the GitHub CLI.
//!
//! Shells out to `gh api` with the raw-content media type so the response
//! body is the file itself. Authentication comes from the operator's `gh`
//! login, which is what makes private repositories reachable.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{FetchTarget, RetrievalStrategy};
use crate::error::{Error, Result};

const RAW_MEDIA_TYPE: &str = "Accept: application/vnd.github.raw";

pub struct GhApiStrategy {
    program: String,
    timeout: Duration,
}

impl GhApiStrategy {
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("gh", timeout)
    }

    /// Use a specific binary instead of `gh` from `PATH`.
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn api_path(target: &FetchTarget) -> String {
        format!(
            "repos/{}/contents/{}?ref={}",
            target.repo, target.path, target.branch
        )
    }
}

#[async_trait]
impl RetrievalStrategy for GhApiStrategy {
    fn name(&self) -> &str {
        "gh api"
    }

    async fn retrieve(&self, target: &FetchTarget) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("api")
            .arg(Self::api_path(target))
            .arg("-H")
            .arg(RAW_MEDIA_TYPE)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| Error::Timeout(format!("{} api", self.program)))?
            .map_err(|e| Error::tool(&self.program, format!("failed to execute: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => output.status.to_string(),
                s => s.to_string(),
            };
            return Err(Error::tool(&self.program, message));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| Error::tool(&self.program, "response is not valid UTF-8"))
    }
}
