//! `create` group: project scaffolding and imports.
use crate::{
    cli::{CommandArgs, ParamSpec},
    lib::errors::CommandError,
};

use super::operation::Operation;

pub const GROUP: &str = "create";
pub const ABOUT: &str = "Create new agent projects";

const TARGET_PLATFORMS: &[&str] = &["strands", "langchain"];
const RUN_OPTIONS: &[&str] = &["locally", "runtime", "none"];

/// Import an existing Bedrock Agent into a runtime project.
pub static IMPORT: Operation = Operation::new(
    "create import",
    "Import a Bedrock Agent as an AgentCore runtime project",
    &[
        ParamSpec::text("agent-id", "Bedrock Agent id"),
        ParamSpec::text("agent-alias-id", "Bedrock Agent alias id"),
        ParamSpec::text("target-platform", "Framework for the generated agent")
            .choices(TARGET_PLATFORMS),
        ParamSpec::text("output-dir", "Directory for the generated project")
            .default_value("./output"),
        ParamSpec::switch("deploy-runtime", "Deploy the generated agent"),
        ParamSpec::text("run-option", "How to run the generated agent")
            .choices(RUN_OPTIONS),
        ParamSpec::switch("disable-memory", "Do not provision memory"),
        ParamSpec::switch("disable-gateway", "Do not provision a gateway"),
    ],
)
.prepare(prepare_import);

fn prepare_import(args: &mut CommandArgs) -> Result<(), CommandError> {
    if args.text("agent-alias-id").is_some() && args.text("agent-id").is_none() {
        return Err(CommandError::InvalidArgument {
            name: "agent-id",
            message: "required when --agent-alias-id is given".into(),
        });
    }
    if args.flag("deploy-runtime") && args.text("run-option") == Some("none") {
        return Err(CommandError::InvalidArgument {
            name: "run-option",
            message: "`none` conflicts with --deploy-runtime".into(),
        });
    }
    Ok(())
}
