//! Load and validate the optional toolkit configuration file.
use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::lib::errors::ConfigError;

pub mod aws;
pub mod telemetry;

pub use aws::{parse_aws_section, AwsSection, RawAwsSection};

pub const CONFIG_ENV_KEY: &str = "AGENTCORE_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "agentcore.toml";

/// Top-level configuration container.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolkitConfig {
    pub aws: AwsSection,
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawToolkitConfig {
    aws: Option<RawAwsSection>,
}

impl ToolkitConfig {
    /// Prefer `AGENTCORE_CONFIG_PATH` if set; otherwise read `agentcore.toml`
    /// from the current directory when it exists.
    pub fn load_from_env_or_default() -> Result<Self, ConfigError> {
        Self::load_from_env_value(env::var_os(CONFIG_ENV_KEY))
    }

    fn load_from_env_value(value: Option<OsString>) -> Result<Self, ConfigError> {
        match value.filter(|v| !v.is_empty()) {
            Some(value) => {
                let path = PathBuf::from(value);
                telemetry::log_env_source(&path, true);
                Self::load_from_path(path)
            }
            None => {
                let path = absolutize(Path::new(DEFAULT_CONFIG_PATH))?;
                telemetry::log_env_source(&path, false);
                if !path.is_file() {
                    telemetry::log_default_missing(&path);
                    return Ok(Self::default());
                }
                Self::load_from_path(path)
            }
        }
    }

    /// Load configuration from a specific path. The file must exist.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.clone()).format(config::FileFormat::Toml));
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: "agentcore::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let raw: RawToolkitConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "agentcore::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, path.clone()).map_err(|err| {
            error!(
                target: "agentcore::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    fn from_raw(raw: RawToolkitConfig, path: PathBuf) -> Result<Self, ConfigError> {
        let aws = parse_aws_section(raw.aws, &path)?;
        Ok(Self {
            aws,
            source_path: Some(path),
        })
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|source| ConfigError::CurrentDir { source })?;
    Ok(cwd.join(path))
}
