//! Authorization header injection: Basic, Bearer, and AWS SigV4 (§4.1).
//!
//! SigV4 signing follows the canonical-request / string-to-sign / signing-key
//! chain used by S3-compatible clients: derive a per-date, per-region,
//! per-service signing key from the AWS secret key, then HMAC-SHA256 the
//! string-to-sign with it.

use crate::config::AuthDirective;
use crate::error::{FetchError, Result};
use anyhow::anyhow;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Applies the configured auth directive to `headers`, returning the
/// `X-Amz-Content-Sha256` value when SigV4 is in play (needed by callers
/// that also want to surface it, e.g. tests).
pub fn apply(
    auth: &AuthDirective,
    method: &str,
    url: &url::Url,
    headers: &mut Vec<(String, String)>,
    body: Option<&[u8]>,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    match auth {
        AuthDirective::None => Ok(()),
        AuthDirective::Basic { user, password } => {
            let encoded = base64_encode(format!("{user}:{password}").as_bytes());
            headers.push(("Authorization".to_string(), format!("Basic {encoded}")));
            Ok(())
        }
        AuthDirective::Bearer(token) => {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            Ok(())
        }
        AuthDirective::AwsSigV4 { region, service } => {
            sign_sigv4(method, url, headers, body, region, service, now)
        }
    }
}

fn content_sha256(body: Option<&[u8]>) -> String {
    match body {
        None => "UNSIGNED-PAYLOAD".to_string(),
        Some(bytes) => hex::encode(Sha256::digest(bytes)),
    }
}

fn sign_sigv4(
    method: &str,
    url: &url::Url,
    headers: &mut Vec<(String, String)>,
    body: Option<&[u8]>,
    region: &str,
    service: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    let access_key = std::env::var("AWS_ACCESS_KEY_ID")
        .map_err(|_| anyhow!(FetchError::Usage("AWS_ACCESS_KEY_ID is not set".to_string())))?;
    let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY")
        .map_err(|_| anyhow!(FetchError::Usage("AWS_SECRET_ACCESS_KEY is not set".to_string())))?;

    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let payload_hash = content_sha256(body);

    let host = url.host_str().unwrap_or_default().to_string();
    headers.push(("X-Amz-Content-Sha256".to_string(), payload_hash.clone()));
    headers.push(("X-Amz-Date".to_string(), amz_date.clone()));
    headers.push(("Host".to_string(), host.clone()));

    let canonical_request = canonical_request(method, url, headers, &payload_hash);
    let credential_scope = format!("{date_stamp}/{region}/{service}/aws4_request");
    let string_to_sign = string_to_sign(&amz_date, &credential_scope, &canonical_request);

    let signing_key = signing_key(&secret_key, &date_stamp, region, service)?;
    let mut mac = HmacSha256::new_from_slice(&signing_key)
        .map_err(|e| anyhow!(FetchError::Usage(format!("invalid SigV4 signing key: {e}"))))?;
    mac.update(string_to_sign.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    let signed_headers = signed_header_names(headers);
    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={access_key}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}"
    );
    headers.push(("Authorization".to_string(), authorization));
    Ok(())
}

fn canonical_request(
    method: &str,
    url: &url::Url,
    headers: &[(String, String)],
    payload_hash: &str,
) -> String {
    let canonical_uri = if url.path().is_empty() { "/" } else { url.path() };
    let mut query_pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    query_pairs.sort();
    let canonical_query = query_pairs
        .iter()
        .map(|(k, v)| format!("{}={}", uri_encode(k), uri_encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let mut sorted_headers: Vec<(String, String)> = headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    sorted_headers.sort();

    let canonical_headers = sorted_headers
        .iter()
        .map(|(k, v)| format!("{k}:{v}\n"))
        .collect::<String>();
    let signed_headers = sorted_headers
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");

    format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
    )
}

fn string_to_sign(amz_date: &str, credential_scope: &str, canonical_request: &str) -> String {
    let hashed = hex::encode(Sha256::digest(canonical_request.as_bytes()));
    format!("AWS4-HMAC-SHA256\n{amz_date}\n{credential_scope}\n{hashed}")
}

fn signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| anyhow!(FetchError::Usage(format!("invalid SigV4 key material: {e}"))))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn signed_header_names(headers: &[(String, String)]) -> String {
    let mut names: Vec<String> = headers.iter().map(|(k, _)| k.to_ascii_lowercase()).collect();
    names.sort();
    names.join(";")
}

fn uri_encode(s: &str) -> String {
    let mut out = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn base64_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::new();
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);
        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        out.push(if chunk.len() > 1 {
            ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            ALPHABET[(b2 & 0x3f) as usize] as char
        } else {
            '='
        });
    }
    out
}
