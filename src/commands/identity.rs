//! `identity` group: outbound credential providers for agents.
use std::sync::Arc;

use crate::{
    aws::IdentityProvider,
    cli::{CommandArgs, CommandRegistry, ParamSpec, SharedHandler, Visibility},
    lib::errors::{CommandError, RegistrationError},
};

use super::operation::{Operation, OperationHandler};

pub const GROUP: &str = "identity";
const ABOUT: &str = "Manage credential providers used by agents";

const PROVIDER_TYPES: &[&str] = &["oauth2", "api-key"];

pub static CREATE_CREDENTIAL_PROVIDER: Operation = Operation::new(
    "identity create-credential-provider",
    "Create an OAuth2 or API key credential provider",
    &[
        ParamSpec::text("name", "Provider name").required(),
        ParamSpec::text("type", "Provider type")
            .required()
            .choices(PROVIDER_TYPES),
        ParamSpec::text("client-id", "OAuth2 client id"),
        ParamSpec::text("client-secret", "OAuth2 client secret").secret(),
        ParamSpec::text("discovery-url", "OAuth2 discovery URL"),
        ParamSpec::text("api-key", "API key value").secret(),
    ],
)
.prepare(prepare_create);

pub static LIST_CREDENTIAL_PROVIDERS: Operation = Operation::new(
    "identity list-credential-providers",
    "List credential providers in the account",
    &[],
);

fn prepare_create(args: &mut CommandArgs) -> Result<(), CommandError> {
    let missing = match args.text("type") {
        Some("oauth2") if args.text("client-id").is_none() => Some("client-id"),
        Some("api-key") if args.text("api-key").is_none() => Some("api-key"),
        _ => None,
    };
    match missing {
        Some(name) => Err(CommandError::InvalidArgument {
            name,
            message: format!(
                "required for `{}` providers",
                args.text("type").unwrap_or_default()
            ),
        }),
        None => Ok(()),
    }
}

pub fn register(
    registry: &mut CommandRegistry,
    identity: &Arc<dyn IdentityProvider>,
) -> Result<(), RegistrationError> {
    registry.group(GROUP, ABOUT)?;
    for operation in [&CREATE_CREDENTIAL_PROVIDER, &LIST_CREDENTIAL_PROVIDERS] {
        let handler: SharedHandler = OperationHandler::shared(operation, identity);
        registry.register(operation.path, handler, Visibility::Visible)?;
    }
    Ok(())
}
