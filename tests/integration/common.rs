use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use anyhow::{Context, Result};
use serde_json::Value;

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_agentcore");

/// Captured result of one CLI run.
pub struct Run {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Run {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.stdout)
            .with_context(|| format!("stdout is not JSON:\n{}", self.stdout))
    }
}

/// Run the binary against the environment identity provider.
///
/// `envs` are applied on top of a scrubbed environment; the working
/// directory is a fresh temp dir so no stray `agentcore.toml` is picked up.
pub fn run_cli<A: AsRef<OsStr>>(args: &[A], envs: &[(&str, &str)]) -> Result<Run> {
    let workdir = tempfile::tempdir().context("failed to create temp dir")?;
    run_cli_in(workdir.path(), args, envs)
}

pub fn run_cli_in<A: AsRef<OsStr>>(
    workdir: &Path,
    args: &[A],
    envs: &[(&str, &str)],
) -> Result<Run> {
    let mut command = Command::new(BINARY_PATH);
    command
        .args(args)
        .current_dir(workdir)
        .env_remove("AGENTCORE_CONFIG_PATH")
        .env_remove("AGENTCORE_IDENTITY_ERROR")
        .env_remove("AGENTCORE_IDENTITY_ACCOUNT")
        .env_remove("AGENTCORE_IDENTITY_REGION")
        .env_remove("AGENTCORE_LOG")
        .env_remove("RUST_LOG")
        .env("AGENTCORE_IDENTITY_PROBE", "env");
    for (key, value) in envs {
        command.env(key, value);
    }
    let output: Output = command.output().context("failed to run agentcore")?;
    Ok(Run {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

pub fn fixture(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}
