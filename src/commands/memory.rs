//! `memory` group.
use std::sync::Arc;

use crate::{
    aws::IdentityProvider,
    cli::{CommandArgs, CommandRegistry, ParamSpec, Visibility},
    lib::errors::{CommandError, RegistrationError},
};

use super::operation::{parse_json_arg, require_range, Operation, OperationHandler};

pub const GROUP: &str = "memory";
const ABOUT: &str = "Manage agent memory resources";

const MIN_EXPIRY_DAYS: u64 = 7;
const MAX_EXPIRY_DAYS: u64 = 365;
const MAX_NAME_LEN: usize = 48;

pub static CREATE: Operation = Operation::new(
    "memory create",
    "Create a memory resource",
    &[
        ParamSpec::positional("name", "Memory name"),
        ParamSpec::text("description", "Free-form description"),
        ParamSpec::number("event-expiry-days", "Days to keep short-term events")
            .default_value("90"),
        ParamSpec::text("strategies", "Long-term strategies as JSON"),
        ParamSpec::switch("wait", "Wait until the memory is active"),
    ],
)
.prepare(prepare_create);

pub static LIST: Operation = Operation::new(
    "memory list",
    "List memory resources",
    &[ParamSpec::number("max-results", "Page size").default_value("100")],
);

pub static DELETE: Operation = Operation::new(
    "memory delete",
    "Delete a memory resource",
    &[
        ParamSpec::positional("memory-id", "Memory to delete"),
        ParamSpec::switch("wait", "Wait until deletion completes"),
    ],
);

fn prepare_create(args: &mut CommandArgs) -> Result<(), CommandError> {
    if let Some(name) = args.text("name") {
        validate_memory_name(name)?;
    }
    require_range(args, "event-expiry-days", MIN_EXPIRY_DAYS, MAX_EXPIRY_DAYS)?;
    parse_json_arg(args, "strategies")
}

/// Memory names start with a letter and hold letters, digits and `_`.
fn validate_memory_name(name: &str) -> Result<(), CommandError> {
    let starts_with_letter = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_chars = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if starts_with_letter && valid_chars && name.len() <= MAX_NAME_LEN {
        return Ok(());
    }
    Err(CommandError::InvalidArgument {
        name: "name",
        message: format!(
            "`{name}` must start with a letter, use only letters, digits and `_`, and be at most {MAX_NAME_LEN} characters"
        ),
    })
}

pub fn register(
    registry: &mut CommandRegistry,
    identity: &Arc<dyn IdentityProvider>,
) -> Result<(), RegistrationError> {
    registry.group(GROUP, ABOUT)?;
    for operation in [&CREATE, &LIST, &DELETE] {
        registry.register(
            operation.path,
            OperationHandler::shared(operation, identity),
            Visibility::Visible,
        )?;
    }
    Ok(())
}
