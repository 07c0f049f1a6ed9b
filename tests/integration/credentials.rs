use anyhow::Result;

use crate::common::run_cli;

#[test]
fn expired_credentials_block_deploy() -> Result<()> {
    let run = run_cli(
        &["deploy"],
        &[("AGENTCORE_IDENTITY_ERROR", "code:ExpiredToken:The security token has expired")],
    )?;

    assert_eq!(run.code, Some(1));
    assert!(run.stdout.is_empty(), "{}", run.stdout);
    assert!(
        run.stderr.contains(
            "Error: AWS credentials have expired. Please refresh or re-authenticate."
        ),
        "{}",
        run.stderr
    );
    Ok(())
}

#[test]
fn missing_credentials_are_reported() -> Result<()> {
    let run = run_cli(&["status"], &[("AGENTCORE_IDENTITY_ERROR", "no_credentials")])?;

    assert_eq!(run.code, Some(1));
    // Diagnostic printed once, without log records or color codes.
    assert_eq!(run.stderr, "Error: No AWS credentials found.\n");
    Ok(())
}

#[test]
fn other_rejections_show_service_message() -> Result<()> {
    let run = run_cli(
        &["memory", "list"],
        &[("AGENTCORE_IDENTITY_ERROR", "code:AccessDenied:not authorized")],
    )?;

    assert_eq!(run.code, Some(1));
    assert!(
        run.stderr
            .contains("Error: AWS credential validation failed: not authorized"),
        "{}",
        run.stderr
    );
    Ok(())
}

#[test]
fn local_deploy_skips_credential_check() -> Result<()> {
    let run = run_cli(
        &["deploy", "--local"],
        &[("AGENTCORE_IDENTITY_ERROR", "no_credentials")],
    )?;

    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
    assert!(run.json()?["account_id"].is_null());
    Ok(())
}

#[test]
fn region_falls_back_to_default() -> Result<()> {
    let run = run_cli(&["obs", "list"], &[])?;

    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
    assert_eq!(run.json()?["region"], "us-west-2");
    Ok(())
}

#[test]
fn ambient_region_and_account_are_used() -> Result<()> {
    let run = run_cli(
        &["gateway", "list-mcp-gateways"],
        &[
            ("AGENTCORE_IDENTITY_ACCOUNT", "444455556666"),
            ("AGENTCORE_IDENTITY_REGION", "us-east-1"),
        ],
    )?;

    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
    let value = run.json()?;
    assert_eq!(value["account_id"], "444455556666");
    assert_eq!(value["region"], "us-east-1");
    Ok(())
}

#[test]
fn unclassified_failure_passes_the_check() -> Result<()> {
    let run = run_cli(
        &["destroy"],
        &[("AGENTCORE_IDENTITY_ERROR", "unclassified:connection timed out")],
    )?;

    // The pre-flight check lets it through; the account lookup then fails
    // with the underlying error instead of a credential diagnostic.
    assert_eq!(run.code, Some(1));
    assert!(
        run.stderr
            .contains("Error: Failed to resolve AWS account: connection timed out"),
        "{}",
        run.stderr
    );
    assert!(!run.stderr.contains("AWS credentials"), "{}", run.stderr);
    Ok(())
}
