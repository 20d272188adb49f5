use super::Command;
use crate::cli::validation::require;
use crate::config::SquidVizConfig;
use crate::http::{describe_request, PublishOutcome, Publisher, UrlTemplate};
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// `sv push`: upload the report file for a pull request.
#[derive(Debug, Clone)]
pub struct PushCommand {
    pub file: PathBuf,
    pub api_key: String,
    pub url_template: UrlTemplate,
    pub pr_id: String,
    pub verbose: bool,
    pub dry_run: bool,
}

impl PushCommand {
    /// Validate settings and the URL template. Nothing is opened or sent yet.
    pub fn from_config(config: &SquidVizConfig) -> Result<Self> {
        let file = require("file", Some(&config.file))?;
        let api_key = require("api-key", config.api_key.as_deref())?;
        let api_url = require("api-url", Some(&config.api_url))?;
        let pr_id = require("pr-id", config.pr_id.as_deref())?;

        let url_template = UrlTemplate::parse(api_url)
            .with_context(|| format!("invalid API URL template \"{api_url}\""))?;
        // Fail on execution errors before the report file is touched
        url_template
            .resolve(pr_id)
            .with_context(|| format!("invalid API URL template \"{api_url}\""))?;

        Ok(Self {
            file: PathBuf::from(file),
            api_key: api_key.to_string(),
            url_template,
            pr_id: pr_id.to_string(),
            verbose: config.verbose,
            dry_run: config.dry_run,
        })
    }

    /// Publish the report, echoing the request to `echo` when verbose.
    ///
    /// On success the response body is written to `output`.
    pub async fn run<W: Write, E: Write>(&self, mut output: W, mut echo: E) -> Result<PublishOutcome> {
        debug!(
            template = self.url_template.source(),
            pr_id = %self.pr_id,
            file = ?self.file,
            "Publishing report"
        );
        let report = tokio::fs::File::open(&self.file)
            .await
            .with_context(|| format!("Couldn't read report file \"{}\"", self.file.display()))?;

        let publisher = Publisher::new()?;
        let mut echo_result = Ok(());
        let outcome = publisher
            .publish(
                &self.url_template,
                &self.pr_id,
                &self.api_key,
                report,
                self.dry_run,
                |request| {
                    if self.verbose {
                        echo_result = echo.write_all(describe_request(request).as_bytes());
                    }
                },
            )
            .await;
        echo_result.context("failed to print request")?;
        let outcome = outcome.context("failed to publish metrics")?;

        match &outcome {
            PublishOutcome::DryRun(_) => info!(pr_id = %self.pr_id, "Dry run complete"),
            PublishOutcome::Published(body) => {
                output.write_all(body)?;
                output.flush()?;
            }
        }
        Ok(outcome)
    }
}

impl Command for PushCommand {
    async fn execute(&self) -> Result<()> {
        self.run(io::stdout(), io::stdout()).await?;
        Ok(())
    }
}
