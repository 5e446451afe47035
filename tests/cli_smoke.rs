use std::process::{Command, Output};

fn agentchain(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_agentchain"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("AGENTCHAIN_MACHINE_LOG")
        .output()
        .expect("spawn agentchain")
}

#[test]
fn help_prints_usage_and_succeeds() {
    let out = agentchain(&["--help"]);

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("Usage: agentchain"), "stdout: {stdout}");
    assert!(stdout.contains("--builtin NAME"));
    assert!(stdout.contains("--list-models"));
}

#[test]
fn zero_runs_is_rejected() {
    let out = agentchain(&["--runs", "0"]);

    assert!(!out.status.success());
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("--runs expects a positive integer, got '0'"),
        "stderr: {stderr}"
    );
}

#[test]
fn unknown_builtin_is_rejected() {
    let out = agentchain(&["--builtin", "poetry"]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("unknown built-in pipeline 'poetry'"),
        "stderr: {stderr}"
    );
}

#[test]
fn conflicting_request_sources_are_rejected() {
    let out = agentchain(&["-r", "a game", "-f", "request.txt"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("cannot be used together"));
}
