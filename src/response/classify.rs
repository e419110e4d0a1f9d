//! Content-type classification: `Content-Type` header first, then a
//! bounded sniff of the buffered body (§3 ClassifiedBody).

use crate::response::envelope::HeaderMap;

/// The recognised body shapes a pretty-printer can be dispatched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Unknown,
    Css,
    Csv,
    Grpc,
    Html,
    Image,
    Json,
    MsgPack,
    Ndjson,
    Protobuf,
    Sse,
    Xml,
    Yaml,
    Markdown,
}

/// Only the first KiB of a non-seekable stream is ever inspected; the
/// sniffer never requests a rewind.
const SNIFF_LIMIT: usize = 1024;

/// Classifies a response by `Content-Type` header, falling back to a
/// signature-based sniff of up to [`SNIFF_LIMIT`] bytes of the body.
pub fn classify(headers: &HeaderMap, body_prefix: &[u8]) -> (ContentType, Option<String>) {
    if let Some(raw) = headers.get_first("content-type") {
        let (mime, charset) = split_charset(raw);
        if let Some(kind) = from_mime(&mime) {
            return (kind, charset);
        }
    }
    (sniff(&body_prefix[..body_prefix.len().min(SNIFF_LIMIT)]), None)
}

fn split_charset(raw: &str) -> (String, Option<String>) {
    let mut parts = raw.split(';');
    let mime = parts.next().unwrap_or("").trim().to_ascii_lowercase();
    let charset = parts
        .find_map(|p| p.trim().strip_prefix("charset=").map(|c| c.to_string()));
    (mime, charset)
}

fn from_mime(mime: &str) -> Option<ContentType> {
    Some(match mime {
        "application/json" | "text/json" => ContentType::Json,
        "application/x-ndjson" | "application/ndjson" | "application/jsonl" | "application/x-jsonlines" => {
            ContentType::Ndjson
        }
        "text/event-stream" => ContentType::Sse,
        "application/xml" | "text/xml" => ContentType::Xml,
        "text/html" | "application/xhtml+xml" => ContentType::Html,
        "text/css" => ContentType::Css,
        "text/csv" => ContentType::Csv,
        "application/yaml" | "text/yaml" | "application/x-yaml" => ContentType::Yaml,
        "text/markdown" => ContentType::Markdown,
        "application/x-msgpack" | "application/msgpack" | "application/vnd.msgpack" => ContentType::MsgPack,
        "application/grpc" | "application/grpc+proto" => ContentType::Grpc,
        "application/x-protobuf" | "application/protobuf" | "application/vnd.google.protobuf" => {
            ContentType::Protobuf
        }
        m if m.starts_with("image/") => ContentType::Image,
        _ => return None,
    })
}

/// Magic-byte / leading-character sniffing for when `Content-Type` is
/// absent or unrecognised.
fn sniff(prefix: &[u8]) -> ContentType {
    if is_image_magic(prefix) {
        return ContentType::Image;
    }
    let text = String::from_utf8_lossy(prefix);
    let trimmed = text.trim_start();

    if trimmed.starts_with("<?xml") {
        return ContentType::Xml;
    }
    if trimmed.to_ascii_lowercase().starts_with("<!doctype") || looks_like_html(trimmed) {
        return ContentType::Html;
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return ContentType::Json;
    }
    if trimmed.starts_with("---") {
        return ContentType::Yaml;
    }
    ContentType::Unknown
}

fn looks_like_html(trimmed: &str) -> bool {
    const TAGS: &[&str] = &["html", "head", "body", "div", "span", "p", "table", "script"];
    let Some(rest) = trimmed.strip_prefix('<') else {
        return false;
    };
    let lower = rest.to_ascii_lowercase();
    TAGS.iter().any(|tag| {
        lower.starts_with(tag)
            && lower[tag.len()..]
                .chars()
                .next()
                .map(|c| c.is_whitespace() || c == '>' || c == '/')
                .unwrap_or(false)
    })
}

fn is_image_magic(prefix: &[u8]) -> bool {
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
    const GIF: &[u8] = b"GIF8";
    prefix.starts_with(PNG) || prefix.starts_with(JPEG) || prefix.starts_with(GIF)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(content_type: &str) -> HeaderMap {
        let mut h = HeaderMap::default();
        h.push("Content-Type", content_type);
        h
    }

    #[test]
    fn header_takes_precedence_over_sniff() {
        let headers = headers_with("application/json; charset=utf-8");
        let (kind, charset) = classify(&headers, b"not json at all");
        assert_eq!(kind, ContentType::Json);
        assert_eq!(charset, Some("utf-8".to_string()));
    }

    #[test]
    fn sniffs_json_by_leading_brace() {
        let (kind, _) = classify(&HeaderMap::default(), b"{\"a\":1}");
        assert_eq!(kind, ContentType::Json);
    }

    #[test]
    fn sniffs_xml_declaration() {
        let (kind, _) = classify(&HeaderMap::default(), b"<?xml version=\"1.0\"?><a/>");
        assert_eq!(kind, ContentType::Xml);
    }

    #[test]
    fn sniffs_html_doctype() {
        let (kind, _) = classify(&HeaderMap::default(), b"<!DOCTYPE html><html></html>");
        assert_eq!(kind, ContentType::Html);
    }

    #[test]
    fn sniffs_png_magic_bytes() {
        let (kind, _) = classify(&HeaderMap::default(), &[0x89, b'P', b'N', b'G', 0x0d, 0x0a]);
        assert_eq!(kind, ContentType::Image);
    }

    #[test]
    fn unrecognised_content_is_unknown() {
        let (kind, _) = classify(&HeaderMap::default(), b"just some plain text");
        assert_eq!(kind, ContentType::Unknown);
    }

    #[test]
    fn sniff_never_reads_past_the_limit() {
        let mut big = vec![b' '; SNIFF_LIMIT + 500];
        big.extend_from_slice(b"{\"a\":1}");
        // The JSON marker is past the sniff limit, so this should NOT
        // be classified as JSON.
        let (kind, _) = classify(&HeaderMap::default(), &big);
        assert_ne!(kind, ContentType::Json);
    }
}
