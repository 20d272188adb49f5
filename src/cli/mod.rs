use crate::config::{ConfigSources, FlagOverrides, SquidVizConfig};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

pub mod commands;
pub mod validation;

use commands::{AddCommand, Command, PushCommand, TimeCommand};

#[derive(Parser, Debug)]
#[command(name = "sv", version)]
#[command(about = "Record benchmark metrics and publish them for a pull request")]
#[command(long_about = "sv records scalar measurements into a local JSON report file (.svfile by default) \
                       and publishes that file to the metrics API for a pull request. Every flag can also \
                       be set through an SV_ prefixed environment variable or the ~/.squidviz config file.")]
pub struct Cli {
    /// Config file to read defaults from
    #[arg(long, global = true, value_name = "PATH", help = "Config file (default $HOME/.squidviz.{toml,yaml,yml,json})")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, help = "Write logs to stderr as JSON lines (filter with $SV_LOG)")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new metric to the output file from stdin
    #[command(after_help = "Example:\n  echo \"1.3\" | sv add --label \"some label\"\n  \
                            command time -f \"%U + %S\" go test 2> >(bc | sv add --label \"go test\")")]
    Add {
        #[arg(short = 'f', long, value_name = "PATH", help = "Output report file (default $SV_FILE, \".svfile\")")]
        file: Option<String>,
        #[arg(short = 'l', long, help = "Label for this data point (default $SV_LABEL)")]
        label: Option<String>,
        #[arg(short = 't', long = "type", hide = true, help = "Set the datatype (default $SV_TYPE)")]
        metric_type: Option<String>,
    },
    /// Measure how long the command piped into stdin takes
    #[command(after_help = "Example:\n  ls | sv time --label \"ls\"")]
    Time {
        #[arg(short = 'f', long, value_name = "PATH", help = "Report output file (default $SV_FILE, \".svfile\")")]
        file: Option<String>,
        #[arg(short = 'l', long, help = "Set the label for this data point (default $SV_LABEL)")]
        label: Option<String>,
        #[arg(short = 'm', long, help = "Unit of time: s/seconds, ms/milliseconds or ns/nanoseconds (default $SV_MAGNITUDE, \"ms\"). \
                                         Units other than seconds are recorded as whole numbers")]
        magnitude: Option<String>,
    },
    /// Publish metrics for this pull request
    Push {
        #[arg(short = 'v', long, help = "Print the request line and headers before sending it (the API key is masked)")]
        verbose: bool,
        #[arg(short = 'n', long, help = "Stop before publishing results")]
        dry_run: bool,
        #[arg(long, help = "API key used as bearer token (default $SV_API_KEY)")]
        api_key: Option<String>,
        #[arg(long, value_name = "TEMPLATE", help = "API endpoint template, {{.Id}} is replaced by the pull request id (default $SV_API_URL)")]
        api_url: Option<String>,
        #[arg(short = 'p', long, help = "Id of the pull request to publish metrics to (the GitHub v3 API id)")]
        pr_id: Option<String>,
        #[arg(short = 'f', long, value_name = "PATH", help = "Input file containing all metrics to publish")]
        file: Option<String>,
    },
}

impl Commands {
    /// Flags given on the command line, as the top configuration layer.
    pub fn flag_overrides(&self) -> FlagOverrides {
        match self {
            Commands::Add { file, label, metric_type } => FlagOverrides {
                file: file.clone(),
                label: label.clone(),
                metric_type: metric_type.clone(),
                ..FlagOverrides::default()
            },
            Commands::Time { file, label, magnitude } => FlagOverrides {
                file: file.clone(),
                label: label.clone(),
                magnitude: magnitude.clone(),
                ..FlagOverrides::default()
            },
            Commands::Push { verbose, dry_run, api_key, api_url, pr_id, file } => FlagOverrides {
                file: file.clone(),
                api_key: api_key.clone(),
                api_url: api_url.clone(),
                pr_id: pr_id.clone(),
                verbose: verbose.then_some(true),
                dry_run: dry_run.then_some(true),
                ..FlagOverrides::default()
            },
        }
    }
}

/// Resolve configuration for `cli` and run the selected command.
pub async fn run(cli: Cli) -> Result<()> {
    let started = Instant::now();

    let sources = ConfigSources::from_process(cli.config.clone());
    let config = SquidVizConfig::resolve(&cli.command.flag_overrides(), &sources)
        .context("failed to load configuration")?;
    if let Some(path) = &config.config_file_used {
        info!(file = ?path, "Using config file");
    }

    match cli.command {
        Commands::Add { .. } => AddCommand::from_config(&config)?.execute().await,
        Commands::Time { .. } => TimeCommand::from_config(&config, started)?.execute().await,
        Commands::Push { .. } => PushCommand::from_config(&config)?.execute().await,
    }
}
