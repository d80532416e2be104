//! Hand-off to the external renderer that turns the merged posts file into
//! the HTML fragment served on the updates page.

use std::path::Path;

use tokio::process::Command;
use tracing::info;

use crate::config::RendererConfig;
use crate::error::{Error, Result};

/// External renderer invocation:
/// `<command...> -i <input> -o <output> -t <template> [flag]`.
#[derive(Debug, Clone)]
pub struct Renderer {
    command: Vec<String>,
    flag: String,
}

impl Renderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            command: config.command.clone(),
            flag: config.flag.clone(),
        }
    }

    fn args(&self, input: &Path, output: &Path, template: &Path) -> Vec<String> {
        let mut args: Vec<String> = self.command.iter().skip(1).cloned().collect();
        args.extend([
            "-i".to_string(),
            input.display().to_string(),
            "-o".to_string(),
            output.display().to_string(),
            "-t".to_string(),
            template.display().to_string(),
        ]);
        if !self.flag.is_empty() {
            args.push(self.flag.clone());
        }
        args
    }

    /// Run the renderer to completion. The template must exist; any spawn
    /// failure or non-zero exit is an error. There is no time limit.
    pub async fn render(&self, input: &Path, output: &Path, template: &Path) -> Result<()> {
        if !template.exists() {
            return Err(Error::TemplateNotFound(template.to_path_buf()));
        }
        let program = self
            .command
            .first()
            .ok_or_else(|| Error::Renderer("no renderer command configured".into()))?;
        let args = self.args(input, output, template);

        info!("Running: {program} {}", args.join(" "));

        let status = Command::new(program)
            .args(&args)
            .status()
            .await
            .map_err(|e| Error::Renderer(format!("failed to execute {program}: {e}")))?;

        if !status.success() {
            return Err(Error::Renderer(format!("{program} exited with {status}")));
        }
        Ok(())
    }
}
