//! CLI surface: handler capability, command registry and router, and the
//! assembly of the `agentcore` command tree.
use std::sync::Arc;

use crate::{
    aws::IdentityProvider,
    commands::{
        configure, create, identity, memory, observability, runtime, DevHandler, GatewayHandlers,
        Operation, OperationHandler,
    },
    config::ToolkitConfig,
    lib::errors::RegistrationError,
};

pub mod handler;
pub mod registry;
pub mod router;

pub use handler::{
    CommandArgs, CommandContext, CommandHandler, ExitStatus, FnHandler, ParamShape, ParamSpec,
};
pub use registry::{same_handler, CommandRegistry, SharedHandler, Visibility};
pub use router::CommandRouter;

/// Name of the binary and of the root command.
pub const APP_NAME: &str = "agentcore";
const APP_ABOUT: &str = "BedrockAgentCore CLI";

/// Build the full command tree. Fails when two registrations conflict.
pub fn build_app(
    provider: Arc<dyn IdentityProvider>,
    config: &ToolkitConfig,
) -> Result<CommandRouter, RegistrationError> {
    let mut registry = CommandRegistry::new(APP_NAME, APP_ABOUT);
    let operation = |op: &'static Operation| OperationHandler::shared(op, &provider);

    // runtime
    registry.register("invoke", operation(&runtime::INVOKE), Visibility::Visible)?;
    registry.register("status", operation(&runtime::STATUS), Visibility::Visible)?;
    registry.register("deploy", operation(&runtime::DEPLOY), Visibility::Visible)?;
    registry.register("dev", Arc::new(DevHandler), Visibility::Visible)?;
    registry.register("destroy", operation(&runtime::DESTROY), Visibility::Visible)?;
    registry.register(
        "stop-session",
        operation(&runtime::STOP_SESSION),
        Visibility::Visible,
    )?;
    identity::register(&mut registry, &provider)?;
    configure::register(&mut registry, config, &provider)?;

    // gateway
    let gateways = GatewayHandlers::new(&provider);
    registry.register(
        "create_mcp_gateway",
        Arc::clone(&gateways.create_gateway),
        Visibility::Visible,
    )?;
    registry.register(
        "create_mcp_gateway_target",
        Arc::clone(&gateways.create_target),
        Visibility::Visible,
    )?;
    gateways.register_group(&mut registry)?;

    memory::register(&mut registry, &provider)?;
    observability::register(&mut registry, &provider)?;

    // create
    registry.group(create::GROUP, create::ABOUT)?;
    registry.register(create::IMPORT.path, operation(&create::IMPORT), Visibility::Visible)?;
    registry.alias(create::IMPORT.path, "import-agent", Visibility::Visible)?;

    // Backward compatibility
    registry.alias("deploy", "launch", Visibility::Hidden)?;

    Ok(registry.into_router())
}
