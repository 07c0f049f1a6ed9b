//! Privileged operations: credential pre-flight, then a planned request.
//!
//! Every cloud-facing command is described by a static [`Operation`]. The
//! shared [`OperationHandler`] checks credentials, resolves the account and
//! region and prints the request it would submit as JSON.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{
    aws::{check_credentials, get_account_id, get_region, IdentityProvider},
    cli::{CommandArgs, CommandContext, CommandHandler, ExitStatus, ParamSpec, SharedHandler},
    lib::errors::CommandError,
};

/// Argument hook run before the credential check.
pub type PrepareFn = fn(&mut CommandArgs) -> Result<(), CommandError>;

/// Static description of one cloud-facing command.
#[derive(Debug)]
pub struct Operation {
    /// Canonical path, e.g. `memory create`.
    pub path: &'static str,
    pub about: &'static str,
    pub params: &'static [ParamSpec],
    pub prepare: Option<PrepareFn>,
    /// Attach a session id (from `--session-id` or freshly generated).
    pub session: bool,
    /// `--local` skips the account lookup and credential check.
    pub local_capable: bool,
}

impl Operation {
    pub const fn new(path: &'static str, about: &'static str, params: &'static [ParamSpec]) -> Self {
        Self {
            path,
            about,
            params,
            prepare: None,
            session: false,
            local_capable: false,
        }
    }

    pub const fn prepare(mut self, prepare: PrepareFn) -> Self {
        self.prepare = Some(prepare);
        self
    }

    pub const fn with_session(mut self) -> Self {
        self.session = true;
        self
    }

    pub const fn local_capable(mut self) -> Self {
        self.local_capable = true;
        self
    }
}

#[derive(Debug, Serialize)]
struct PlannedRequest<'a> {
    status: &'static str,
    command: &'static str,
    account_id: Option<String>,
    region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    arguments: &'a CommandArgs,
    requested_at: String,
}

/// Handler shared by every [`Operation`].
pub struct OperationHandler {
    operation: &'static Operation,
    identity: Arc<dyn IdentityProvider>,
}

impl OperationHandler {
    pub fn new(operation: &'static Operation, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            operation,
            identity,
        }
    }

    /// Boxed into the registry's shared handler type.
    pub fn shared(operation: &'static Operation, identity: &Arc<dyn IdentityProvider>) -> SharedHandler {
        Arc::new(Self::new(operation, Arc::clone(identity)))
    }

    fn account_id(&self, local: bool) -> Result<Option<String>, CommandError> {
        if local {
            return Ok(None);
        }
        let check = check_credentials(self.identity.as_ref());
        if let Some(message) = check.message() {
            return Err(CommandError::Credentials { message });
        }
        get_account_id(self.identity.as_ref())
            .map(Some)
            .map_err(|source| CommandError::Identity { source })
    }
}

impl CommandHandler for OperationHandler {
    fn about(&self) -> &str {
        self.operation.about
    }

    fn params(&self) -> &[ParamSpec] {
        self.operation.params
    }

    fn run(&self, ctx: &mut CommandContext<'_>) -> Result<ExitStatus, CommandError> {
        let mut args = ctx.args.clone();
        if let Some(prepare) = self.operation.prepare {
            prepare(&mut args)?;
        }

        let local = self.operation.local_capable && args.flag("local");
        let account_id = self.account_id(local)?;
        let region = get_region(self.identity.as_ref());
        let session_id = self.operation.session.then(|| {
            args.text("session-id")
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string())
        });

        let arguments = args.masked(self.operation.params);
        let request = PlannedRequest {
            status: "planned",
            command: self.operation.path,
            account_id,
            region,
            session_id,
            arguments: &arguments,
            requested_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        debug!(
            target: "agentcore::commands",
            command = self.operation.path,
            invoked_as = ctx.command,
            region = %request.region,
            "Planned request"
        );
        serde_json::to_writer_pretty(&mut *ctx.out, &request)?;
        writeln!(ctx.out)?;
        Ok(ExitStatus::SUCCESS)
    }
}

/// Replace a JSON-text argument with its parsed value.
pub fn parse_json_arg(args: &mut CommandArgs, name: &'static str) -> Result<(), CommandError> {
    let Some(raw) = args.text(name) else {
        return Ok(());
    };
    let parsed: Value =
        serde_json::from_str(raw).map_err(|err| CommandError::InvalidArgument {
            name,
            message: format!("expected JSON: {err}"),
        })?;
    args.insert(name, parsed);
    Ok(())
}

/// Reject a present value that is not an ARN.
pub fn require_arn(args: &CommandArgs, name: &'static str) -> Result<(), CommandError> {
    match args.text(name) {
        Some(value) if !value.starts_with("arn:") => Err(CommandError::InvalidArgument {
            name,
            message: format!("`{value}` is not an ARN"),
        }),
        _ => Ok(()),
    }
}

/// Reject a present number outside `min..=max`.
pub fn require_range(
    args: &CommandArgs,
    name: &'static str,
    min: u64,
    max: u64,
) -> Result<(), CommandError> {
    match args.number(name) {
        Some(value) if !(min..=max).contains(&value) => Err(CommandError::InvalidArgument {
            name,
            message: format!("{value} is outside {min}..={max}"),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::{aws::CallerIdentity, lib::errors::IdentityError};

    /// Identity provider with a fixed outcome that counts lookups.
    pub(crate) struct StaticIdentity {
        pub outcome: Result<CallerIdentity, IdentityError>,
        pub region: Option<String>,
        pub calls: AtomicUsize,
    }

    impl StaticIdentity {
        pub(crate) fn account(account: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(CallerIdentity {
                    account: account.into(),
                    arn: None,
                    user_id: None,
                }),
                region: Some("eu-west-1".into()),
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn failing(error: IdentityError) -> Arc<Self> {
            Arc::new(Self {
                outcome: Err(error),
                region: None,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl IdentityProvider for StaticIdentity {
        fn caller_identity(&self) -> Result<CallerIdentity, IdentityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }

        fn region(&self) -> Option<String> {
            self.region.clone()
        }
    }

    /// Run `handler` with `args` and parse its JSON output.
    pub(crate) fn run_json(
        handler: &dyn CommandHandler,
        args: CommandArgs,
    ) -> Result<Value, CommandError> {
        let mut out = Vec::new();
        let mut ctx = CommandContext {
            command: "test",
            args,
            out: &mut out,
        };
        handler.run(&mut ctx)?;
        Ok(serde_json::from_slice(&out).expect("handler prints JSON"))
    }

    pub(crate) fn args(pairs: &[(&str, Value)]) -> CommandArgs {
        let mut args = CommandArgs::default();
        for (name, value) in pairs {
            args.insert(name, value.clone());
        }
        args
    }

    const PARAMS: &[ParamSpec] = &[
        ParamSpec::text("agent", "agent"),
        ParamSpec::switch("local", "local"),
    ];
    static PLAIN: Operation = Operation::new("status", "status", PARAMS).local_capable();
    static SESSION: Operation = Operation::new("invoke", "invoke", PARAMS).with_session();

    #[test]
    fn planned_request_carries_account_region_and_arguments() {
        let identity = StaticIdentity::account("111122223333");
        let handler = OperationHandler::new(&PLAIN, identity.clone());

        let value = run_json(&handler, args(&[("agent", json!("alpha"))])).expect("runs");

        assert_eq!(value["status"], "planned");
        assert_eq!(value["command"], "status");
        assert_eq!(value["account_id"], "111122223333");
        assert_eq!(value["region"], "eu-west-1");
        assert_eq!(value["arguments"], json!({"agent": "alpha"}));
        assert!(value["requested_at"].is_string());
        assert!(value.get("session_id").is_none());
        // One lookup for the check, one for the account id.
        assert_eq!(identity.calls(), 2);
    }

    #[test]
    fn failed_credential_check_stops_before_account_lookup() {
        let identity = StaticIdentity::failing(IdentityError::Rejected {
            code: "ExpiredToken".into(),
            message: None,
        });
        let handler = OperationHandler::new(&PLAIN, identity.clone());

        let error = run_json(&handler, CommandArgs::default()).expect_err("must fail");

        assert_eq!(
            error.to_string(),
            "AWS credentials have expired. Please refresh or re-authenticate."
        );
        assert_eq!(identity.calls(), 1);
    }

    #[test]
    fn unclassified_check_failure_surfaces_from_account_lookup() {
        let identity = StaticIdentity::failing(IdentityError::Unclassified {
            message: "connection timed out".into(),
        });
        let handler = OperationHandler::new(&PLAIN, identity.clone());

        let error = run_json(&handler, CommandArgs::default()).expect_err("lookup fails");

        assert!(matches!(error, CommandError::Identity { .. }));
        assert_eq!(identity.calls(), 2);
    }

    #[test]
    fn local_mode_skips_credentials() {
        let identity = StaticIdentity::failing(IdentityError::NoCredentials);
        let handler = OperationHandler::new(&PLAIN, identity.clone());

        let value = run_json(&handler, args(&[("local", json!(true))])).expect("runs");

        assert_eq!(value["account_id"], Value::Null);
        assert_eq!(value["region"], "us-west-2");
        assert_eq!(identity.calls(), 0);
    }

    #[test]
    fn local_flag_is_ignored_when_not_supported() {
        let identity = StaticIdentity::failing(IdentityError::NoCredentials);
        let handler = OperationHandler::new(&SESSION, identity);

        let error = run_json(&handler, args(&[("local", json!(true))])).expect_err("must fail");

        assert_eq!(error.to_string(), "No AWS credentials found.");
    }

    #[test]
    fn session_id_is_generated_or_taken_from_arguments() {
        let identity = StaticIdentity::account("111122223333");
        let handler = OperationHandler::new(&SESSION, identity);

        let generated = run_json(&handler, CommandArgs::default()).expect("runs");
        let session = generated["session_id"].as_str().expect("session id");
        assert!(Uuid::parse_str(session).is_ok(), "{session}");

        let given = run_json(&handler, args(&[("session-id", json!("abc"))])).expect("runs");
        assert_eq!(given["session_id"], "abc");
    }

    #[test]
    fn argument_helpers_validate_values() {
        let mut parsed = args(&[("config", json!("{\"a\": 1}"))]);
        parse_json_arg(&mut parsed, "config").expect("valid JSON");
        assert_eq!(parsed.get("config"), Some(&json!({"a": 1})));

        let mut broken = args(&[("config", json!("{"))]);
        assert!(parse_json_arg(&mut broken, "config").is_err());

        assert!(require_arn(&args(&[("role", json!("arn:aws:iam::1:role/x"))]), "role").is_ok());
        assert!(require_arn(&args(&[("role", json!("role/x"))]), "role").is_err());
        assert!(require_arn(&CommandArgs::default(), "role").is_ok());

        assert!(require_range(&args(&[("days", json!(90))]), "days", 7, 365).is_ok());
        assert!(require_range(&args(&[("days", json!(3))]), "days", 7, 365).is_err());
    }
}
