//! Session cookie jar lifecycle (§8): a `Set-Cookie` from the server is
//! sent back on the next request in the same session, and an expired
//! cookie is neither sent nor persisted.

use fetch::session::Jar;
use serial_test::serial;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn cookie_set_by_server_is_sent_on_the_next_request_in_session() {
    let dir = tempdir().unwrap();
    let mut jar = Jar::load("checkout", dir.path()).unwrap();
    assert!(jar.matching("shop.example", "/", true).is_empty());

    jar.ingest("session_id=abc123; Domain=shop.example; Path=/", "shop.example", "/");
    jar.flush().unwrap();

    let reloaded = Jar::load("checkout", dir.path()).unwrap();
    let sent = reloaded.matching("shop.example", "/", true);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, "session_id");
    assert_eq!(sent[0].value, "abc123");
}

#[test]
fn expired_cookie_is_dropped_from_future_requests_and_disk() {
    let dir = tempdir().unwrap();
    let mut jar = Jar::load("checkout", dir.path()).unwrap();
    jar.ingest(
        "session_id=abc123; Domain=shop.example; Path=/; Max-Age=-1",
        "shop.example",
        "/",
    );
    assert!(jar.matching("shop.example", "/", true).is_empty());
    jar.flush().unwrap();

    let reloaded = Jar::load("checkout", dir.path()).unwrap();
    assert!(reloaded.matching("shop.example", "/", true).is_empty());
}

#[test]
fn secure_cookie_is_withheld_from_an_insecure_connection() {
    let dir = tempdir().unwrap();
    let mut jar = Jar::load("checkout", dir.path()).unwrap();
    jar.ingest(
        "session_id=abc123; Domain=shop.example; Path=/; Secure",
        "shop.example",
        "/",
    );
    assert!(jar.matching("shop.example", "/", false).is_empty());
    assert_eq!(jar.matching("shop.example", "/", true).len(), 1);
}

#[tokio::test]
#[serial]
async fn cli_persists_and_replays_a_server_issued_cookie() {
    use assert_cmd::Command;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "sid=xyz; Path=/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let sessions_dir = tempdir().unwrap();
    std::env::set_var("FETCH_INTERNAL_SESSIONS_DIR", sessions_dir.path());

    Command::cargo_bin("fetch")
        .unwrap()
        .arg(format!("{}/login", server.uri()))
        .arg("--session")
        .arg("integration-test")
        .arg("--format")
        .arg("off")
        .assert()
        .success();

    Command::cargo_bin("fetch")
        .unwrap()
        .arg(format!("{}/account", server.uri()))
        .arg("--session")
        .arg("integration-test")
        .arg("--format")
        .arg("off")
        .assert()
        .success();

    server.verify().await;
    let requests = server.received_requests().await.unwrap();
    let account_request = requests
        .iter()
        .find(|r| r.url.path() == "/account")
        .expect("the /account request should have been recorded");
    let cookie_header = account_request
        .headers
        .get("cookie")
        .expect("cookie header should be present on the replayed request");
    assert!(cookie_header.to_str().unwrap().contains("sid=xyz"));

    std::env::remove_var("FETCH_INTERNAL_SESSIONS_DIR");
}
