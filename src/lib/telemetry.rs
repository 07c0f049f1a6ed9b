//! Logging initialization and command dispatch span helpers.

use std::{
    env,
    io::{self, IsTerminal},
    time::Instant,
};

use anyhow::Result;
use tracing::{debug, debug_span, Span};
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV_KEY: &str = "AGENTCORE_LOG";

/// Where the toolkit is running; decides the log format and default level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Interactive command line: quiet by default, terse lines on stderr.
    Cli,
    /// Embedded as a library: developer-oriented records with source locations.
    Sdk,
}

impl LogMode {
    pub const fn default_filter(&self) -> &'static str {
        match self {
            LogMode::Cli => "warn",
            LogMode::Sdk => "info",
        }
    }
}

/// Initialize `tracing` once for the process. Later calls are no-ops.
pub fn init_logging(mode: LogMode) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = resolve_filter(mode);
    let result = match mode {
        LogMode::Cli => fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .without_time()
            .with_ansi(io::stderr().is_terminal())
            .with_writer(io::stderr)
            .try_init(),
        LogMode::Sdk => fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_writer(io::stderr)
            .try_init(),
    };
    result.map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))
}

fn resolve_filter(mode: LogMode) -> EnvFilter {
    env::var(LOG_ENV_KEY)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(mode.default_filter()))
}

/// Span helper recording the start and finish of one dispatched command.
pub struct CommandSpan {
    span: Span,
    started_at: Instant,
    command: String,
}

impl CommandSpan {
    pub fn start(command: &str) -> Self {
        let span = debug_span!(target: "agentcore::cli", "dispatch", command);
        Self {
            span,
            started_at: Instant::now(),
            command: command.to_string(),
        }
    }

    /// Close the span while recording the exit status.
    pub fn finish(self, exit_code: u8) {
        let elapsed_ms = u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        let _entered = self.span.enter();
        debug!(
            target: "agentcore::cli",
            command = %self.command,
            exit_code = exit_code,
            elapsed_ms = elapsed_ms,
            "Command finished"
        );
    }
}
