//! `obs` group: traces and spans recorded for agent sessions.
use std::sync::Arc;

use crate::{
    aws::IdentityProvider,
    cli::{CommandArgs, CommandRegistry, ParamSpec, Visibility},
    lib::errors::{CommandError, RegistrationError},
};

use super::operation::{require_range, Operation, OperationHandler};

pub const GROUP: &str = "obs";
const ABOUT: &str = "Query traces recorded for agent sessions";

pub static LIST: Operation = Operation::new(
    "obs list",
    "List recent traces for an agent",
    &[
        ParamSpec::text("agent", "Agent name from the project configuration"),
        ParamSpec::text("session-id", "Only traces of this session"),
        ParamSpec::number("days", "How far back to look").default_value("7"),
    ],
)
.prepare(prepare_list);

pub static SHOW: Operation = Operation::new(
    "obs show",
    "Show the spans of a trace or session",
    &[
        ParamSpec::text("trace-id", "Trace to show"),
        ParamSpec::text("session-id", "Session whose traces to show"),
        ParamSpec::switch("verbose", "Include full span payloads"),
        ParamSpec::text("output", "Write the result to this file"),
    ],
)
.prepare(prepare_show);

fn prepare_list(args: &mut CommandArgs) -> Result<(), CommandError> {
    require_range(args, "days", 1, 90)
}

fn prepare_show(args: &mut CommandArgs) -> Result<(), CommandError> {
    if args.text("trace-id").is_none() && args.text("session-id").is_none() {
        return Err(CommandError::InvalidArgument {
            name: "trace-id",
            message: "pass --trace-id or --session-id".into(),
        });
    }
    Ok(())
}

pub fn register(
    registry: &mut CommandRegistry,
    identity: &Arc<dyn IdentityProvider>,
) -> Result<(), RegistrationError> {
    registry.group(GROUP, ABOUT)?;
    registry.register(
        LIST.path,
        OperationHandler::shared(&LIST, identity),
        Visibility::Visible,
    )?;
    registry.register(
        SHOW.path,
        OperationHandler::shared(&SHOW, identity),
        Visibility::Visible,
    )
}
