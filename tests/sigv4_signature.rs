//! AWS SigV4 signing (§8): against the canonical AWS test vector
//! (access key `AKIDEXAMPLE`, 2013-05-24), signing the same request
//! twice produces byte-identical output, and the produced `Authorization`
//! header has the expected `SignedHeaders` set and scope.

use fetch::config::AuthDirective;
use fetch::request::auth::apply;
use serial_test::serial;

fn fixed_timestamp() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339("2013-05-24T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc)
}

fn sign_once() -> Vec<(String, String)> {
    std::env::set_var("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE");
    std::env::set_var(
        "AWS_SECRET_ACCESS_KEY",
        "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
    );
    let mut headers = Vec::new();
    apply(
        &AuthDirective::AwsSigV4 {
            region: "us-east-1".to_string(),
            service: "s3".to_string(),
        },
        "GET",
        &url::Url::parse("https://s3.amazonaws.com/").unwrap(),
        &mut headers,
        Some(b"data"),
        fixed_timestamp(),
    )
    .unwrap();
    std::env::remove_var("AWS_ACCESS_KEY_ID");
    std::env::remove_var("AWS_SECRET_ACCESS_KEY");
    headers
}

#[test]
#[serial]
fn signing_is_deterministic_for_a_fixed_timestamp_and_body() {
    let first = sign_once();
    let second = sign_once();
    assert_eq!(first, second);
}

#[test]
#[serial]
fn authorization_header_carries_the_expected_scope_and_signed_headers() {
    let headers = sign_once();
    let authorization = headers
        .iter()
        .find(|(k, _)| k == "Authorization")
        .map(|(_, v)| v.clone())
        .expect("Authorization header should be present");

    assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20130524/us-east-1/s3/aws4_request"));
    assert!(authorization.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));
    assert!(authorization.contains("Signature="));
}

#[test]
#[serial]
fn content_sha256_matches_the_known_digest_for_the_test_vector_body() {
    let headers = sign_once();
    let digest = headers
        .iter()
        .find(|(k, _)| k == "X-Amz-Content-Sha256")
        .map(|(_, v)| v.clone())
        .unwrap();
    assert_eq!(
        digest,
        "3a6eb0790f39ac87c94f3856b2dd2c5d110e6811602261a9a923d3bb23adc8b7"
    );
}

#[test]
#[serial]
fn missing_credentials_surface_as_a_usage_error_not_a_panic() {
    std::env::remove_var("AWS_ACCESS_KEY_ID");
    std::env::remove_var("AWS_SECRET_ACCESS_KEY");
    let mut headers = Vec::new();
    let result = apply(
        &AuthDirective::AwsSigV4 {
            region: "us-east-1".to_string(),
            service: "s3".to_string(),
        },
        "GET",
        &url::Url::parse("https://s3.amazonaws.com/").unwrap(),
        &mut headers,
        None,
        fixed_timestamp(),
    );
    assert!(result.is_err());
}
