//! Exit status and output of the operator CLI against a live router.

use std::sync::Arc;
use tokio::process::Command;

use users_service::config::ServiceConfig;
use users_service::http::build_router;
use users_service::lifecycle::Services;

mod common;

const ADMIN_KEY: &str = "test-admin-key";

async fn serve_router() -> String {
    let mut config = ServiceConfig::default();
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_string();
    let services = Services::with_drivers(
        config,
        Arc::new(common::HangingDriver),
        Arc::new(common::HangingDriver),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let _ = axum::serve(listener, build_router(services)).await;
    });
    base
}

async fn cli(base: &str, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_users-cli"))
        .args(["--url", base, "--key", ADMIN_KEY])
        .args(args)
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .output()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_cli_prints_backends() {
    let base = serve_router().await;

    let output = cli(&base, &["backends"]).await;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("datastore"));
    assert!(stdout.contains("disconnected"));
}

#[tokio::test]
async fn test_cli_exits_nonzero_on_error_status() {
    let base = serve_router().await;

    let output = cli(&base, &["reconnect", "postgres"]).await;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("400"));

    let output = Command::new(env!("CARGO_BIN_EXE_users-cli"))
        .args(["--url", &base, "--key", "wrong", "backends"])
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .output()
        .await
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("401"));
}
