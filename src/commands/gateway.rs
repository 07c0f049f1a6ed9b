//! `gateway` group: MCP gateways and their targets.
//!
//! The create handlers are also mounted at the top level
//! (`create_mcp_gateway`, `create_mcp_gateway_target`), so they are built
//! once and registered under both paths.
use std::sync::Arc;

use crate::{
    aws::IdentityProvider,
    cli::{CommandArgs, CommandRegistry, ParamSpec, SharedHandler, Visibility},
    lib::errors::{CommandError, RegistrationError},
};

use super::operation::{parse_json_arg, require_arn, Operation, OperationHandler};

pub const GROUP: &str = "gateway";
const ABOUT: &str = "Create and manage MCP gateways";

const TARGET_TYPES: &[&str] = &["lambda", "openApiSchema", "smithyModel"];

pub static CREATE_MCP_GATEWAY: Operation = Operation::new(
    "gateway create-mcp-gateway",
    "Create an MCP gateway",
    &[
        ParamSpec::text("name", "Gateway name"),
        ParamSpec::text("role-arn", "Execution role for the gateway"),
        ParamSpec::text("authorizer-config", "Authorizer configuration as JSON"),
        ParamSpec::switch("enable-semantic-search", "Enable semantic tool search"),
    ],
)
.prepare(prepare_gateway);

pub static CREATE_MCP_GATEWAY_TARGET: Operation = Operation::new(
    "gateway create-mcp-gateway-target",
    "Add a target to an MCP gateway",
    &[
        ParamSpec::text("gateway-arn", "Gateway to attach the target to").required(),
        ParamSpec::text("gateway-url", "Gateway endpoint URL"),
        ParamSpec::text("role-arn", "Role the gateway assumes for the target"),
        ParamSpec::text("name", "Target name"),
        ParamSpec::text("target-type", "Kind of target")
            .default_value("lambda")
            .choices(TARGET_TYPES),
        ParamSpec::text("target-payload", "Target definition as JSON"),
        ParamSpec::text("credentials", "Outbound credentials as JSON").secret(),
    ],
)
.prepare(prepare_target);

pub static LIST_MCP_GATEWAYS: Operation = Operation::new(
    "gateway list-mcp-gateways",
    "List MCP gateways in the account",
    &[ParamSpec::text("name", "Only gateways with this name")],
);

fn prepare_gateway(args: &mut CommandArgs) -> Result<(), CommandError> {
    require_arn(args, "role-arn")?;
    parse_json_arg(args, "authorizer-config")
}

fn prepare_target(args: &mut CommandArgs) -> Result<(), CommandError> {
    require_arn(args, "gateway-arn")?;
    require_arn(args, "role-arn")?;
    parse_json_arg(args, "target-payload")?;
    parse_json_arg(args, "credentials")
}

/// Gateway handlers, shared between the group and the top-level shortcuts.
pub struct GatewayHandlers {
    pub create_gateway: SharedHandler,
    pub create_target: SharedHandler,
    pub list: SharedHandler,
}

impl GatewayHandlers {
    pub fn new(identity: &Arc<dyn IdentityProvider>) -> Self {
        Self {
            create_gateway: OperationHandler::shared(&CREATE_MCP_GATEWAY, identity),
            create_target: OperationHandler::shared(&CREATE_MCP_GATEWAY_TARGET, identity),
            list: OperationHandler::shared(&LIST_MCP_GATEWAYS, identity),
        }
    }

    pub fn register_group(&self, registry: &mut CommandRegistry) -> Result<(), RegistrationError> {
        registry.group(GROUP, ABOUT)?;
        registry.register(
            CREATE_MCP_GATEWAY.path,
            Arc::clone(&self.create_gateway),
            Visibility::Visible,
        )?;
        registry.register(
            CREATE_MCP_GATEWAY_TARGET.path,
            Arc::clone(&self.create_target),
            Visibility::Visible,
        )?;
        registry.register(LIST_MCP_GATEWAYS.path, Arc::clone(&self.list), Visibility::Visible)
    }
}
