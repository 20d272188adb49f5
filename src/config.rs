use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_REPORT_FILE: &str = ".svfile";
pub const DEFAULT_MAGNITUDE: &str = "ms";
pub const DEFAULT_API_URL: &str = "https://mnemosyne.dkendal.com/api/v1/pull_requests/{{.Id}}";

/// Prefix of environment variables, e.g. `SV_API_KEY`
pub const ENV_PREFIX: &str = "SV";

const HOME_CONFIG_NAME: &str = ".squidviz";
const HOME_CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Settings for one invocation, resolved from all configuration layers.
///
/// Precedence, highest first: command-line flags, `SV_*` environment
/// variables, the config file, built-in defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SquidVizConfig {
    /// Report file path
    pub file: String,
    pub label: Option<String>,
    /// Type tag used by `sv add`
    #[serde(rename = "type")]
    pub metric_type: String,
    /// Time unit used by `sv time`
    pub magnitude: String,
    pub api_key: Option<String>,
    /// Endpoint URL template, see [`crate::http::UrlTemplate`]
    pub api_url: String,
    pub pr_id: Option<String>,
    pub verbose: bool,
    pub dry_run: bool,
    /// Config file that contributed to this configuration, if any
    #[serde(skip)]
    pub config_file_used: Option<PathBuf>,
}

/// Values given explicitly on the command line.
///
/// `None` means the flag was not given and lower layers apply.
#[derive(Debug, Clone, Default)]
pub struct FlagOverrides {
    pub file: Option<String>,
    pub label: Option<String>,
    pub metric_type: Option<String>,
    pub magnitude: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub pr_id: Option<String>,
    pub verbose: Option<bool>,
    pub dry_run: Option<bool>,
}

/// Where the file and environment layers are read from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Explicit config file. It must exist.
    pub config_file: Option<PathBuf>,
    /// Directory searched for `.squidviz.{toml,yaml,yml,json}` when no
    /// explicit file is given
    pub home_dir: Option<PathBuf>,
    /// Variables to read `SV_*` settings from instead of the process environment
    pub env: Option<HashMap<String, String>>,
}

impl ConfigSources {
    /// Sources for a real invocation: process environment and the user's home directory.
    pub fn from_process(config_file: Option<PathBuf>) -> Self {
        Self {
            config_file,
            home_dir: dirs::home_dir(),
            env: None,
        }
    }
}

impl SquidVizConfig {
    /// Merge defaults, config file, environment and flags into one configuration.
    pub fn resolve(flags: &FlagOverrides, sources: &ConfigSources) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("file", DEFAULT_REPORT_FILE)?
            .set_default("type", "")?
            .set_default("magnitude", DEFAULT_MAGNITUDE)?
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("verbose", false)?
            .set_default("dry_run", false)?;

        let config_file = match &sources.config_file {
            Some(path) => Some(path.clone()),
            None => sources.home_dir.as_deref().and_then(find_home_config),
        };
        if let Some(path) = &config_file {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        let mut environment = Environment::with_prefix(ENV_PREFIX).prefix_separator("_");
        if let Some(vars) = &sources.env {
            environment = environment.source(Some(vars.clone()));
        }
        builder = builder.add_source(environment);

        builder = builder
            .set_override_option("file", flags.file.clone())?
            .set_override_option("label", flags.label.clone())?
            .set_override_option("type", flags.metric_type.clone())?
            .set_override_option("magnitude", flags.magnitude.clone())?
            .set_override_option("api_key", flags.api_key.clone())?
            .set_override_option("api_url", flags.api_url.clone())?
            .set_override_option("pr_id", flags.pr_id.clone())?
            .set_override_option("verbose", flags.verbose)?
            .set_override_option("dry_run", flags.dry_run)?;

        let mut resolved: SquidVizConfig = builder.build()?.try_deserialize()?;
        resolved.config_file_used = config_file;
        Ok(resolved)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> anyhow::Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

fn find_home_config(home: &Path) -> Option<PathBuf> {
    HOME_CONFIG_EXTENSIONS
        .iter()
        .map(|ext| home.join(format!("{HOME_CONFIG_NAME}.{ext}")))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn isolated(home: &TempDir, env: &[(&str, &str)]) -> ConfigSources {
        ConfigSources {
            config_file: None,
            home_dir: Some(home.path().to_path_buf()),
            env: Some(
                env.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        }
    }

    #[test]
    fn test_defaults() {
        let home = TempDir::new().unwrap();
        let config = SquidVizConfig::resolve(&FlagOverrides::default(), &isolated(&home, &[])).unwrap();

        assert_eq!(config.file, DEFAULT_REPORT_FILE);
        assert_eq!(config.magnitude, DEFAULT_MAGNITUDE);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.metric_type, "");
        assert_eq!(config.label, None);
        assert_eq!(config.api_key, None);
        assert_eq!(config.pr_id, None);
        assert!(!config.verbose);
        assert!(!config.dry_run);
        assert_eq!(config.config_file_used, None);
    }

    #[test]
    fn test_home_config_overrides_defaults() {
        let home = TempDir::new().unwrap();
        std::fs::write(
            home.path().join(".squidviz.toml"),
            "file = \"from-file.json\"\nmagnitude = \"ns\"\npr_id = 42\n",
        )
        .unwrap();

        let config = SquidVizConfig::resolve(&FlagOverrides::default(), &isolated(&home, &[])).unwrap();

        assert_eq!(config.file, "from-file.json");
        assert_eq!(config.magnitude, "ns");
        assert_eq!(config.pr_id.as_deref(), Some("42"));
        assert_eq!(
            config.config_file_used,
            Some(home.path().join(".squidviz.toml"))
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let home = TempDir::new().unwrap();
        std::fs::write(
            home.path().join(".squidviz.toml"),
            "file = \"from-file.json\"\napi_key = \"file-key\"\n",
        )
        .unwrap();

        let sources = isolated(
            &home,
            &[("SV_FILE", "from-env.json"), ("SV_API_URL", "https://env/{{.Id}}")],
        );
        let config = SquidVizConfig::resolve(&FlagOverrides::default(), &sources).unwrap();

        assert_eq!(config.file, "from-env.json");
        assert_eq!(config.api_url, "https://env/{{.Id}}");
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
    }

    #[test]
    fn test_flags_override_env() {
        let home = TempDir::new().unwrap();
        let sources = isolated(
            &home,
            &[("SV_LABEL", "env label"), ("SV_TYPE", "env-type"), ("SV_DRY_RUN", "true")],
        );
        let flags = FlagOverrides {
            label: Some("flag label".to_string()),
            ..FlagOverrides::default()
        };

        let config = SquidVizConfig::resolve(&flags, &sources).unwrap();

        assert_eq!(config.label.as_deref(), Some("flag label"));
        assert_eq!(config.metric_type, "env-type");
        assert!(config.dry_run);
    }

    #[test]
    fn test_unset_bool_flag_keeps_env_value() {
        let home = TempDir::new().unwrap();
        let sources = isolated(&home, &[("SV_VERBOSE", "true")]);
        let flags = FlagOverrides {
            verbose: None,
            dry_run: Some(true),
            ..FlagOverrides::default()
        };

        let config = SquidVizConfig::resolve(&flags, &sources).unwrap();

        assert!(config.verbose);
        assert!(config.dry_run);
    }

    #[test]
    fn test_unrelated_env_is_ignored() {
        let home = TempDir::new().unwrap();
        let sources = isolated(&home, &[("HOME", "/nowhere"), ("SVX_FILE", "nope.json")]);

        let config = SquidVizConfig::resolve(&FlagOverrides::default(), &sources).unwrap();

        assert_eq!(config.file, DEFAULT_REPORT_FILE);
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        let home = TempDir::new().unwrap();
        let mut sources = isolated(&home, &[]);
        sources.config_file = Some(home.path().join("missing.toml"));

        assert!(SquidVizConfig::resolve(&FlagOverrides::default(), &sources).is_err());
    }

    #[test]
    fn test_explicit_config_file_wins_over_home_file() {
        let home = TempDir::new().unwrap();
        std::fs::write(home.path().join(".squidviz.toml"), "label = \"home\"\n").unwrap();
        let explicit = home.path().join("ci.json");
        std::fs::write(&explicit, r#"{"label": "explicit"}"#).unwrap();

        let mut sources = isolated(&home, &[]);
        sources.config_file = Some(explicit.clone());
        let config = SquidVizConfig::resolve(&FlagOverrides::default(), &sources).unwrap();

        assert_eq!(config.label.as_deref(), Some("explicit"));
        assert_eq!(config.config_file_used, Some(explicit));
    }
}
