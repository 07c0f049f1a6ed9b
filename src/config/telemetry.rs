use tracing::{debug, info};

use super::{ToolkitConfig, CONFIG_ENV_KEY, DEFAULT_CONFIG_PATH};

pub fn log_env_source(path: &std::path::Path, from_env: bool) {
    if from_env {
        info!(
            target: "agentcore::config",
            path = %path.display(),
            "Loading configuration using AGENTCORE_CONFIG_PATH environment variable"
        );
    } else {
        debug!(
            target: "agentcore::config",
            path = %path.display(),
            env = CONFIG_ENV_KEY,
            default = DEFAULT_CONFIG_PATH,
            "AGENTCORE_CONFIG_PATH not set; using default agentcore.toml"
        );
    }
}

pub fn log_default_missing(path: &std::path::Path) {
    debug!(
        target: "agentcore::config",
        path = %path.display(),
        "No configuration file found; using SDK defaults"
    );
}

pub fn log_loaded(config: &ToolkitConfig) {
    let path = config
        .source_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    info!(
        target: "agentcore::config",
        path = %path,
        profile = config.aws.profile.as_deref().unwrap_or(""),
        region = config.aws.region.as_deref().unwrap_or(""),
        endpoint_override = config.aws.endpoint_url.is_some(),
        "Configuration file loaded successfully"
    );
}
