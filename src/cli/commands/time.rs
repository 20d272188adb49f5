use super::Command;
use crate::cli::validation::{parse_magnitude, require, ValidationError};
use crate::config::SquidVizConfig;
use crate::metrics::{Magnitude, Metric, ReportStore};
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// `sv time`: pass stdin through to stdout and record how long it took.
///
/// This is a rough wall-clock measurement of whatever is piped in. Use
/// `sv add` with GNU time(1) for user/system time.
#[derive(Debug, Clone)]
pub struct TimeCommand {
    pub label: String,
    pub file: PathBuf,
    pub magnitude: Magnitude,
    pub started: Instant,
}

impl TimeCommand {
    pub fn from_config(config: &SquidVizConfig, started: Instant) -> Result<Self, ValidationError> {
        let file = require("file", Some(&config.file))?;
        let label = require("label", config.label.as_deref())?;
        let magnitude = parse_magnitude(&config.magnitude)?;
        Ok(Self {
            label: label.to_string(),
            file: PathBuf::from(file),
            magnitude,
            started,
        })
    }

    /// Copy `input` to `output`, then append the elapsed time to the report.
    ///
    /// The `<label> <value> <unit>` summary goes to `summary` so it stays out
    /// of the passed-through stream.
    pub fn run<R, W, S>(&self, input: R, output: W, mut summary: S) -> Result<Metric>
    where
        R: BufRead,
        W: Write,
        S: Write,
    {
        let lines = pass_through(input, output).context("failed to pass input through")?;
        let elapsed = self.started.elapsed();
        debug!(lines, ?elapsed, "Input stream closed");

        let value = self.magnitude.measure(elapsed);
        let unit = self.magnitude.unit_name();
        let metric = Metric::new(&self.label, value, unit);
        ReportStore::new(&self.file)
            .append(metric.clone())
            .with_context(|| format!("failed to record metric \"{}\"", self.label))?;

        writeln!(summary, "{} {} {}", self.label, value, unit)?;
        Ok(metric)
    }
}

impl Command for TimeCommand {
    async fn execute(&self) -> Result<()> {
        self.run(io::stdin().lock(), io::stdout().lock(), io::stderr().lock())?;
        Ok(())
    }
}

/// Copy `input` to `output` line by line, byte for byte, flushing after each line.
///
/// Returns the number of lines copied. A final line without a newline is
/// copied as is.
pub fn pass_through<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<u64> {
    let mut line = Vec::new();
    let mut lines = 0;
    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        output.write_all(&line)?;
        output.flush()?;
        lines += 1;
    }
    Ok(lines)
}
