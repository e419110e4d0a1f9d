//! Exit-code mapping against a live HTTP server (§7).

use assert_cmd::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_with_status(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resource"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn success_status_exits_zero() {
    let server = server_with_status(200).await;
    Command::cargo_bin("fetch")
        .unwrap()
        .arg(format!("{}/resource", server.uri()))
        .arg("--format")
        .arg("off")
        .assert()
        .code(0);
}

#[tokio::test]
async fn client_error_status_exits_four() {
    let server = server_with_status(404).await;
    Command::cargo_bin("fetch")
        .unwrap()
        .arg(format!("{}/resource", server.uri()))
        .arg("--format")
        .arg("off")
        .assert()
        .code(4);
}

#[tokio::test]
async fn server_error_status_exits_five() {
    let server = server_with_status(500).await;
    Command::cargo_bin("fetch")
        .unwrap()
        .arg(format!("{}/resource", server.uri()))
        .arg("--format")
        .arg("off")
        .assert()
        .code(5);
}

#[tokio::test]
async fn ignore_status_forces_zero_on_server_error() {
    let server = server_with_status(503).await;
    Command::cargo_bin("fetch")
        .unwrap()
        .arg(format!("{}/resource", server.uri()))
        .arg("--format")
        .arg("off")
        .arg("--ignore-status")
        .assert()
        .code(0);
}
