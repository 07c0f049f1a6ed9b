use anyhow::Result;
use serde_json::Value;

use crate::common::{fixture, run_cli, run_cli_in};

fn without_timestamp(mut value: Value) -> Value {
    if let Some(object) = value.as_object_mut() {
        object.remove("requested_at");
    }
    value
}

#[test]
fn launch_alias_matches_deploy() -> Result<()> {
    let deploy = run_cli(&["deploy", "--agent", "alpha"], &[])?;
    let launch = run_cli(&["launch", "--agent", "alpha"], &[])?;

    assert_eq!(deploy.code, Some(0), "stderr: {}", deploy.stderr);
    assert_eq!(launch.code, Some(0), "stderr: {}", launch.stderr);
    let deploy = without_timestamp(deploy.json()?);
    assert_eq!(deploy["command"], "deploy");
    assert_eq!(deploy["account_id"], "123456789012");
    assert_eq!(deploy, without_timestamp(launch.json()?));
    Ok(())
}

#[test]
fn import_agent_runs_create_import() -> Result<()> {
    let run = run_cli(&["import-agent", "--agent-id", "AGENT1"], &[])?;

    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
    assert_eq!(run.json()?["command"], "create import");
    Ok(())
}

#[test]
fn help_omits_hidden_launch() -> Result<()> {
    let run = run_cli(&["--help"], &[])?;

    assert_eq!(run.code, Some(0));
    assert!(run.stdout.contains("deploy"), "{}", run.stdout);
    assert!(run.stdout.contains("import-agent"), "{}", run.stdout);
    assert!(!run.stdout.contains("launch"), "{}", run.stdout);
    Ok(())
}

#[test]
fn unknown_command_exits_with_usage_error() -> Result<()> {
    let run = run_cli(&["deplyo"], &[])?;

    assert_eq!(run.code, Some(2));
    assert!(run.stdout.is_empty());
    assert!(run.stderr.contains("No such command 'deplyo'"), "{}", run.stderr);
    assert!(run.stderr.contains("Did you mean: deploy?"), "{}", run.stderr);
    Ok(())
}

#[test]
fn group_without_subcommand_lists_children() -> Result<()> {
    let run = run_cli(&["memory"], &[])?;

    assert_eq!(run.code, Some(2));
    assert!(
        run.stderr.contains("Available commands: create, list, delete"),
        "{}",
        run.stderr
    );
    Ok(())
}

#[test]
fn bad_argument_value_exits_with_usage_error() -> Result<()> {
    let run = run_cli(&["dev", "--port", "eighty"], &[])?;

    assert_eq!(run.code, Some(2));
    assert!(run.stderr.contains("eighty"), "{}", run.stderr);
    Ok(())
}

#[test]
fn dev_plans_local_server_without_credentials() -> Result<()> {
    let run = run_cli(
        &["dev", "--port", "9090"],
        &[("AGENTCORE_IDENTITY_ERROR", "no_credentials")],
    )?;

    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
    assert_eq!(run.json()?["endpoint"], "http://localhost:9090/invocations");
    Ok(())
}

#[test]
fn invoke_generates_session_id() -> Result<()> {
    let run = run_cli(&["invoke", "{\"prompt\": \"hello\"}"], &[])?;

    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
    let value = run.json()?;
    assert!(value["session_id"].as_str().is_some_and(|id| id.len() == 36));
    assert_eq!(value["arguments"]["payload"]["prompt"], "hello");
    Ok(())
}

#[test]
fn configure_show_reads_config_override() -> Result<()> {
    let path = fixture("tests/fixtures/agentcore.toml");
    let path = path.display().to_string();
    let run = run_cli(
        &["configure", "show"],
        &[("AGENTCORE_CONFIG_PATH", path.as_str())],
    )?;

    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
    assert!(run.stdout.contains("region = \"eu-central-1\""), "{}", run.stdout);
    assert!(run.stdout.contains("profile = \"integration\""), "{}", run.stdout);
    Ok(())
}

#[test]
fn config_file_in_working_directory_is_picked_up() -> Result<()> {
    let workdir = tempfile::tempdir()?;
    std::fs::write(
        workdir.path().join("agentcore.toml"),
        "[aws]\nregion = \"ap-southeast-2\"\n",
    )?;

    let run = run_cli_in(workdir.path(), &["status"], &[])?;

    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
    assert_eq!(run.json()?["region"], "ap-southeast-2");
    Ok(())
}

#[test]
fn invalid_config_fails_before_dispatch() -> Result<()> {
    let path = fixture("tests/fixtures/agentcore_invalid_region.toml");
    let path = path.display().to_string();
    let run = run_cli(&["status"], &[("AGENTCORE_CONFIG_PATH", path.as_str())])?;

    assert_eq!(run.code, Some(70));
    assert!(run.stdout.is_empty());
    assert!(run.stderr.contains("aws.region"), "{}", run.stderr);
    Ok(())
}

#[cfg(unix)]
#[test]
fn non_utf8_argument_exits_with_usage_error() -> Result<()> {
    use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

    let invalid = OsStr::from_bytes(b"\xff");
    let run = run_cli(&[OsStr::new("deploy"), OsStr::new("--agent"), invalid], &[])?;

    assert_eq!(run.code, Some(2), "stderr: {}", run.stderr);
    assert!(run.stdout.is_empty());
    assert!(run.stderr.contains("invalid UTF-8"), "{}", run.stderr);
    Ok(())
}
