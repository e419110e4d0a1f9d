//! SSE classification + formatting round-trip (§8): a `text/event-stream`
//! body is classified correctly and every dispatched event's data
//! reappears in the rendered output.

use assert_cmd::Command;
use fetch::format::dispatch_buffered;
use fetch::printer::color::ColorMode;
use fetch::printer::Printer;
use fetch::response::classify::{classify, ContentType};
use fetch::response::envelope::HeaderMap;
use predicates::str::contains;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn content_type_header_classifies_as_sse() {
    let mut headers = HeaderMap::default();
    headers.push("content-type", "text/event-stream");
    let (kind, _charset) = classify(&headers, b"");
    assert_eq!(kind, ContentType::Sse);
}

#[test]
fn dispatched_events_preserve_their_data_and_event_name() {
    let body = b"event: update\ndata: {\"id\": 7}\n\nevent: ping\ndata: still here\n\n";
    let mut buf = Vec::new();
    {
        let mut printer = Printer::new(&mut buf, ColorMode::Off);
        dispatch_buffered(&mut printer, ContentType::Sse, body).expect("sse body should format");
    }
    let rendered = String::from_utf8(buf).unwrap();
    assert!(rendered.contains("[update]"));
    assert!(rendered.contains("[ping]"));
    assert!(rendered.contains("still here"));
    assert!(rendered.contains("\"id\": 7"));
}

#[tokio::test]
async fn cli_formats_sse_response_from_a_live_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_raw("event: hello\ndata: world\n\n", "text/event-stream"),
        )
        .mount(&server)
        .await;

    Command::cargo_bin("fetch")
        .unwrap()
        .arg(format!("{}/stream", server.uri()))
        .arg("--format")
        .arg("on")
        .assert()
        .success()
        .stdout(contains("[hello]"))
        .stdout(contains("world"));
}
