//! Entry point for the `agentcore` CLI.
use std::{ffi::OsString, io, process::ExitCode};

use agentcore_cli::{
    aws::identity_provider_from_env,
    cli::{build_app, CommandRouter, ExitStatus},
    config::ToolkitConfig,
    lib::telemetry::{self, LogMode},
};
use anyhow::Error;

fn main() -> ExitCode {
    match bootstrap() {
        Ok(router) => {
            let argv: Vec<OsString> = std::env::args_os().skip(1).collect();
            let status = router.dispatch(&argv, &mut io::stdout().lock(), &mut io::stderr().lock());
            status.into()
        }
        Err(exit) => exit.report(),
    }
}

/// Startup failure: message plus the status to exit with.
#[derive(Debug)]
struct StartupExit {
    message: String,
    status: ExitStatus,
}

impl StartupExit {
    fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("{err:#}"),
            status: ExitStatus::CONFIG,
        }
    }

    fn report(self) -> ExitCode {
        eprintln!("Error: {}", self.message);
        self.status.into()
    }
}

fn bootstrap() -> Result<CommandRouter, StartupExit> {
    telemetry::init_logging(LogMode::Cli).map_err(StartupExit::from_error)?;
    let config = ToolkitConfig::load_from_env_or_default().map_err(StartupExit::from_error)?;
    let provider = identity_provider_from_env(&config).map_err(StartupExit::from_error)?;
    build_app(provider, &config).map_err(StartupExit::from_error)
}
