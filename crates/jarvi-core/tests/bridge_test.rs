//! Integration tests for the command bridge
//!
//! These run real child processes inside a temp working directory:
//! - Authentication is scoped per session
//! - Allowlist rejects anything outside the argv prefixes (and shell tricks)
//! - Code runs through a temp file that is always removed

use std::sync::Arc;

use jarvi_core::{
    Bridge, BridgeConfig, BridgeError, ClaudeCommand, Language, LogKind, SessionId, SystemOutcome,
};
use tempfile::TempDir;

const SECRET: &str = "Test-Commander-Secret";

fn bridge_in(dir: &TempDir) -> Bridge {
    Bridge::new(&BridgeConfig::with_secret(dir.path(), SECRET)).unwrap()
}

fn temp_files(dir: &TempDir) -> Vec<String> {
    std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("temp_"))
        .collect()
}

fn node_available() -> bool {
    std::process::Command::new("node")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn test_authenticate_exact_secret_only() {
    let dir = TempDir::new().unwrap();
    let bridge = bridge_in(&dir);
    let session = SessionId::from("s1");

    for wrong in ["", "test-commander-secret", "TEST-COMMANDER-SECRET", "Test-Commander-Secret ", "nope"] {
        let err = bridge.authenticate(&session, wrong).await.unwrap_err();
        assert!(matches!(err, BridgeError::AuthenticationFailed), "{:?} should fail", wrong);
        assert!(!bridge.is_authenticated(&session));
    }

    bridge.authenticate(&session, SECRET).await.unwrap();
    assert!(bridge.is_authenticated(&session));
}

#[tokio::test]
async fn test_failed_attempt_revokes_only_its_own_session() {
    let dir = TempDir::new().unwrap();
    let bridge = Arc::new(bridge_in(&dir));
    let alice = SessionId::from("alice");
    let mallory = SessionId::from("mallory");

    bridge.authenticate(&alice, SECRET).await.unwrap();

    // Concurrent failed attempt from another caller.
    let b = Arc::clone(&bridge);
    let m = mallory.clone();
    let handle = tokio::spawn(async move { b.authenticate(&m, "guess").await });
    assert!(handle.await.unwrap().is_err());

    assert!(bridge.is_authenticated(&alice));
    assert!(!bridge.is_authenticated(&mallory));

    // Alice's own failed attempt does revoke her.
    assert!(bridge.authenticate(&alice, "typo").await.is_err());
    assert!(!bridge.is_authenticated(&alice));
}

#[tokio::test]
async fn test_no_secret_configured_rejects_everything() {
    let dir = TempDir::new().unwrap();
    let config = BridgeConfig {
        working_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let bridge = Bridge::new(&config).unwrap();
    let session = SessionId::from("s");
    assert!(matches!(
        bridge.authenticate(&session, "").await,
        Err(BridgeError::SecretNotConfigured)
    ));
    assert!(!bridge.verify_secret(""));
}

#[tokio::test]
async fn test_system_command_requires_auth() {
    let dir = TempDir::new().unwrap();
    let bridge = bridge_in(&dir);
    let session = SessionId::from("anon");
    let err = bridge.execute_system_command(&session, "ls").await.unwrap_err();
    assert!(matches!(err, BridgeError::NotAuthenticated));
    assert_eq!(err.to_string(), "🔒 Requiere autenticación");
}

#[tokio::test]
async fn test_system_command_rejects_non_allowlisted() {
    let dir = TempDir::new().unwrap();
    let bridge = bridge_in(&dir);
    let session = SessionId::from("s");
    bridge.authenticate(&session, SECRET).await.unwrap();

    for cmd in ["rm -rf /", "ls; rm -rf /", "ls && touch pwned", "echo $(id)", "find . -delete", "curl x"] {
        let err = bridge.execute_system_command(&session, cmd).await.unwrap_err();
        assert!(matches!(err, BridgeError::CommandRejected { .. }), "{} should be rejected", cmd);
        assert!(err.is_rejection());
    }
    assert!(!dir.path().join("pwned").exists());
}

#[tokio::test]
async fn test_ls_runs_in_working_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
    let bridge = bridge_in(&dir);
    let session = SessionId::from("s");
    bridge.authenticate(&session, SECRET).await.unwrap();

    let outcome = bridge.execute_system_command(&session, "ls -la").await.unwrap();
    let SystemOutcome::Executed(out) = outcome else {
        panic!("expected an executed command");
    };
    assert!(!out.output.is_empty());
    assert!(out.output.contains("marker.txt"));
    assert_eq!(out.exit_code, 0);

    let history = bridge.history(&session, 10).await;
    assert!(history
        .iter()
        .any(|e| e.kind == LogKind::Command && e.message == "Ejecutado: ls -la"));
}

#[tokio::test]
async fn test_quoted_arguments_reach_program_verbatim() {
    let dir = TempDir::new().unwrap();
    let bridge = bridge_in(&dir);
    let session = SessionId::from("s");
    bridge.authenticate(&session, SECRET).await.unwrap();

    let outcome = bridge
        .execute_system_command(&session, "echo 'a; b' \"$HOME\"")
        .await
        .unwrap();
    let SystemOutcome::Executed(out) = outcome else {
        panic!("expected an executed command");
    };
    assert_eq!(out.output.trim_end(), "a; b $HOME");
}

#[tokio::test]
async fn test_non_zero_exit_is_an_error_and_logged() {
    let dir = TempDir::new().unwrap();
    let bridge = bridge_in(&dir);
    let session = SessionId::from("s");
    bridge.authenticate(&session, SECRET).await.unwrap();

    let err = bridge
        .execute_system_command(&session, "cat does-not-exist.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::ExitStatus { .. }));

    let log = std::fs::read_to_string(dir.path().join("jarvi-bridge.log")).unwrap();
    assert!(log.contains("[error] Error ejecutando: cat does-not-exist.txt"));
}

#[tokio::test]
async fn test_command_timeout_kills_child() {
    let dir = TempDir::new().unwrap();
    let config = BridgeConfig {
        allowed_commands: vec!["sleep".to_string()],
        command_timeout_secs: 1,
        ..BridgeConfig::with_secret(dir.path(), SECRET)
    };
    let bridge = Bridge::new(&config).unwrap();
    let session = SessionId::from("s");
    bridge.authenticate(&session, SECRET).await.unwrap();

    let started = std::time::Instant::now();
    let err = bridge.execute_system_command(&session, "sleep 5").await.unwrap_err();
    assert!(matches!(err, BridgeError::Timeout(_)));
    assert!(started.elapsed() < std::time::Duration::from_secs(4));
}

#[tokio::test]
async fn test_claude_prefix_routes_to_claude_handler() {
    let dir = TempDir::new().unwrap();
    let bridge = bridge_in(&dir);
    let session = SessionId::from("s");
    bridge.authenticate(&session, SECRET).await.unwrap();

    let outcome = bridge.execute_system_command(&session, "CLAUDE_STATUS").await.unwrap();
    let SystemOutcome::Claude(reply) = outcome else {
        panic!("expected a Claude reply");
    };
    assert_eq!(reply.data.unwrap()["status"], "online");

    let outcome = bridge
        .execute_system_command(&session, "CLAUDE_EXPLAIN ownership")
        .await
        .unwrap();
    let SystemOutcome::Claude(reply) = outcome else {
        panic!("expected a Claude reply");
    };
    assert_eq!(reply.action.as_deref(), Some("forward_to_claude"));
    assert_eq!(reply.params, "ownership");
}

#[tokio::test]
async fn test_claude_execute_without_code() {
    let dir = TempDir::new().unwrap();
    let bridge = bridge_in(&dir);
    let session = SessionId::from("s");
    bridge.authenticate(&session, SECRET).await.unwrap();

    assert_eq!(ClaudeCommand::parse("EXECUTE"), ClaudeCommand::Execute);
    let err = bridge
        .process_claude_command(&session, "EXECUTE", "")
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::MissingCode));
}

#[tokio::test]
async fn test_execute_code_javascript() {
    if !node_available() {
        eprintln!("node not installed; skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let bridge = bridge_in(&dir);
    let session = SessionId::from("s");
    bridge.authenticate(&session, SECRET).await.unwrap();

    let out = bridge
        .execute_code(&session, "console.log(1+1)", Language::JavaScript)
        .await
        .unwrap();
    assert!(out.output.contains('2'));
    assert!(temp_files(&dir).is_empty());
}

#[tokio::test]
async fn test_temp_file_removed_when_interpreter_missing() {
    let dir = TempDir::new().unwrap();
    let config = BridgeConfig {
        node_binary: "jarvi-no-such-interpreter".to_string(),
        ..BridgeConfig::with_secret(dir.path(), SECRET)
    };
    let bridge = Bridge::new(&config).unwrap();
    let session = SessionId::from("s");
    bridge.authenticate(&session, SECRET).await.unwrap();

    let err = bridge
        .execute_code(&session, "console.log(1)", Language::JavaScript)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Spawn { .. }));
    assert!(temp_files(&dir).is_empty());
}

#[tokio::test]
async fn test_temp_file_removed_when_code_fails() {
    let dir = TempDir::new().unwrap();
    // `false` ignores its argument and exits 1, standing in for a failing script.
    let config = BridgeConfig {
        python_binary: "false".to_string(),
        ..BridgeConfig::with_secret(dir.path(), SECRET)
    };
    let bridge = Bridge::new(&config).unwrap();
    let session = SessionId::from("s");
    bridge.authenticate(&session, SECRET).await.unwrap();

    let err = bridge
        .execute_code(&session, "raise SystemExit(1)", Language::Python)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::ExitStatus { code: 1, .. }));
    assert!(temp_files(&dir).is_empty());
}

#[tokio::test]
async fn test_execute_code_requires_auth() {
    let dir = TempDir::new().unwrap();
    let bridge = bridge_in(&dir);
    let err = bridge
        .execute_code(&SessionId::from("anon"), "console.log(1)", Language::JavaScript)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::NotAuthenticated));
    assert!(temp_files(&dir).is_empty());
}

#[tokio::test]
async fn test_history_is_per_session() {
    let dir = TempDir::new().unwrap();
    let bridge = bridge_in(&dir);
    let a = SessionId::from("a");
    let b = SessionId::from("b");
    bridge.authenticate(&a, SECRET).await.unwrap();
    bridge.authenticate(&b, SECRET).await.unwrap();
    bridge.execute_system_command(&a, "pwd").await.unwrap();

    assert_eq!(bridge.history(&a, 10).await.len(), 2);
    assert_eq!(bridge.history(&b, 10).await.len(), 1);

    assert_eq!(bridge.clear_history(&a).await, 2);
    assert!(bridge.history(&a, 10).await.is_empty());
    assert_eq!(bridge.history(&b, 10).await.len(), 1);
}
