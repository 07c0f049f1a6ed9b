//! `configure` group.
use std::sync::Arc;

use serde::Serialize;

use crate::{
    aws::{get_region, IdentityProvider},
    cli::{CommandContext, CommandHandler, CommandRegistry, ExitStatus, Visibility},
    config::{AwsSection, ToolkitConfig},
    lib::errors::{CommandError, RegistrationError},
};

pub const GROUP: &str = "configure";
const ABOUT: &str = "Inspect the toolkit configuration";

#[derive(Debug, Serialize)]
struct EffectiveConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    region: String,
    aws: &'a AwsSection,
}

/// Prints the loaded configuration plus the region commands will use.
pub struct ConfigureShowHandler {
    config: ToolkitConfig,
    identity: Arc<dyn IdentityProvider>,
}

impl ConfigureShowHandler {
    pub fn new(config: ToolkitConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { config, identity }
    }
}

impl CommandHandler for ConfigureShowHandler {
    fn about(&self) -> &str {
        "Show the effective configuration"
    }

    fn run(&self, ctx: &mut CommandContext<'_>) -> Result<ExitStatus, CommandError> {
        let effective = EffectiveConfig {
            config_file: self
                .config
                .source_path
                .as_ref()
                .map(|path| path.display().to_string()),
            region: get_region(self.identity.as_ref()),
            aws: &self.config.aws,
        };
        let rendered = toml::to_string_pretty(&effective)?;
        ctx.out.write_all(rendered.as_bytes())?;
        Ok(ExitStatus::SUCCESS)
    }
}

pub fn register(
    registry: &mut CommandRegistry,
    config: &ToolkitConfig,
    identity: &Arc<dyn IdentityProvider>,
) -> Result<(), RegistrationError> {
    registry.group(GROUP, ABOUT)?;
    registry.register(
        "configure show",
        Arc::new(ConfigureShowHandler::new(config.clone(), Arc::clone(identity))),
        Visibility::Visible,
    )
}
