use super::Command;
use crate::cli::validation::{parse_decimal, require, ValidationError};
use crate::config::SquidVizConfig;
use crate::metrics::{Metric, ReportStore};
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// `sv add`: read one decimal value from stdin and append it to the report.
#[derive(Debug, Clone)]
pub struct AddCommand {
    pub label: String,
    pub file: PathBuf,
    pub metric_type: String,
}

impl AddCommand {
    pub fn from_config(config: &SquidVizConfig) -> Result<Self, ValidationError> {
        let label = require("label", config.label.as_deref())?;
        let file = require("file", Some(&config.file))?;
        Ok(Self {
            label: label.to_string(),
            file: PathBuf::from(file),
            metric_type: config.metric_type.clone(),
        })
    }

    /// Read the value from `input`, record it, and echo `<label> <value>` to `output`.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> Result<Metric> {
        let mut line = String::new();
        input
            .read_line(&mut line)
            .context("failed to read value from stdin")?;
        let value = parse_decimal(&line)?;

        let metric = Metric::new(&self.label, value, &self.metric_type);
        ReportStore::new(&self.file)
            .append(metric.clone())
            .with_context(|| format!("failed to record metric \"{}\"", self.label))?;

        writeln!(output, "{} {}", self.label, value)?;
        Ok(metric)
    }
}

impl Command for AddCommand {
    async fn execute(&self) -> Result<()> {
        self.run(io::stdin().lock(), io::stdout().lock())?;
        Ok(())
    }
}
