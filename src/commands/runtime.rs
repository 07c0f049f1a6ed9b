//! Agent runtime commands: invoke, status, deploy, dev, destroy, stop-session.

use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    cli::{CommandArgs, CommandContext, CommandHandler, ExitStatus, ParamSpec},
    lib::errors::CommandError,
};

use super::operation::Operation;

const AGENT: ParamSpec = ParamSpec::text("agent", "Agent name from the project configuration");
const LOCAL: ParamSpec = ParamSpec::switch("local", "Target the local development runtime");

pub static INVOKE: Operation = Operation::new(
    "invoke",
    "Invoke a deployed agent with a JSON payload",
    &[
        ParamSpec::positional("payload", "JSON payload, or plain text sent as the prompt"),
        AGENT,
        ParamSpec::text("session-id", "Runtime session to continue"),
        ParamSpec::text("bearer-token", "OAuth bearer token for the invocation").secret(),
        ParamSpec::text("user-id", "User id forwarded to the agent"),
        LOCAL,
    ],
)
.prepare(prepare_invoke)
.with_session()
.local_capable();

pub static STATUS: Operation = Operation::new(
    "status",
    "Show the status of a deployed agent",
    &[AGENT, ParamSpec::switch("verbose", "Include endpoint details")],
);

pub static DEPLOY: Operation = Operation::new(
    "deploy",
    "Build and deploy an agent to the managed runtime",
    &[
        AGENT,
        LOCAL,
        ParamSpec::switch("local-build", "Build the image locally, deploy to the cloud"),
        ParamSpec::switch("auto-update-on-conflict", "Update an existing agent in place"),
        ParamSpec::text("env", "Environment variables as KEY=VALUE,KEY=VALUE"),
    ],
)
.prepare(prepare_deploy)
.local_capable();

pub static DESTROY: Operation = Operation::new(
    "destroy",
    "Delete an agent and its managed resources",
    &[
        AGENT,
        ParamSpec::switch("dry-run", "Show what would be deleted"),
        ParamSpec::switch("force", "Skip the confirmation prompt"),
        ParamSpec::switch("delete-ecr-repo", "Also delete the container repository"),
    ],
);

pub static STOP_SESSION: Operation = Operation::new(
    "stop-session",
    "Stop an active runtime session",
    &[
        AGENT,
        ParamSpec::text("session-id", "Session to stop; defaults to the last one used"),
    ],
);

/// Plain-text payloads become `{"prompt": ...}`.
fn prepare_invoke(args: &mut CommandArgs) -> Result<(), CommandError> {
    let Some(raw) = args.text("payload") else {
        return Ok(());
    };
    let payload = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| json!({ "prompt": raw }));
    args.insert("payload", payload);
    Ok(())
}

/// `--env A=1,B=2` becomes an object.
fn prepare_deploy(args: &mut CommandArgs) -> Result<(), CommandError> {
    let Some(raw) = args.text("env") else {
        return Ok(());
    };
    let mut vars = serde_json::Map::new();
    for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| CommandError::InvalidArgument {
                name: "env",
                message: format!("`{pair}` is not KEY=VALUE"),
            })?;
        vars.insert(key.trim().to_string(), Value::String(value.to_string()));
    }
    args.insert("env", Value::Object(vars));
    Ok(())
}

pub const DEFAULT_DEV_PORT: u64 = 8080;

const DEV_PARAMS: &[ParamSpec] = &[
    ParamSpec::number("port", "Port for the local development server").default_value("8080"),
    AGENT,
];

#[derive(Debug, Serialize)]
struct DevPlan<'a> {
    status: &'static str,
    command: &'static str,
    agent: Option<&'a str>,
    endpoint: String,
    port: u64,
}

/// Local development server plan; never touches cloud credentials.
pub struct DevHandler;

impl CommandHandler for DevHandler {
    fn about(&self) -> &str {
        "Run the agent in a local development server with hot reload"
    }

    fn params(&self) -> &[ParamSpec] {
        DEV_PARAMS
    }

    fn run(&self, ctx: &mut CommandContext<'_>) -> Result<ExitStatus, CommandError> {
        let port = ctx.args.number("port").unwrap_or(DEFAULT_DEV_PORT);
        if !(1024..=65535).contains(&port) {
            return Err(CommandError::InvalidArgument {
                name: "port",
                message: "Use a port in the range 1024-65535".into(),
            });
        }
        let plan = DevPlan {
            status: "planned",
            command: "dev",
            agent: ctx.args.text("agent"),
            endpoint: format!("http://localhost:{port}/invocations"),
            port,
        };
        serde_json::to_writer_pretty(&mut *ctx.out, &plan)?;
        writeln!(ctx.out)?;
        Ok(ExitStatus::SUCCESS)
    }
}
