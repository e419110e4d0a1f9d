//! RFC 6265 cookie parsing, matching, and jar (de)serialization.

use chrono::{DateTime, Utc};

/// One stored cookie record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub expiry: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<String>,
}

impl Cookie {
    pub fn is_expired(&self, now_unix: i64) -> bool {
        matches!(self.expiry, Some(exp) if exp <= now_unix)
    }

    /// RFC 6265 §5.1.3 domain matching: exact match, or `host` is a
    /// subdomain of a domain cookie's `domain`.
    pub fn domain_matches(&self, host: &str) -> bool {
        if self.domain.is_empty() {
            return false;
        }
        let domain = self.domain.trim_start_matches('.');
        host == domain || host.ends_with(&format!(".{domain}"))
    }

    /// RFC 6265 §5.1.4 path matching: exact match, prefix match with a
    /// following `/`, or the cookie path is `/`.
    pub fn path_matches(&self, request_path: &str) -> bool {
        if self.path == "/" || self.path == request_path {
            return true;
        }
        request_path.starts_with(&self.path)
            && (self.path.ends_with('/') || request_path[self.path.len()..].starts_with('/'))
    }
}

/// Parses a `Set-Cookie` header value into a `Cookie`. Returns `None` for
/// a line with no `name=value` pair.
pub fn parse_set_cookie(raw: &str) -> Option<Cookie> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.trim().split_once('=')?;

    let mut cookie = Cookie {
        name: name.trim().to_string(),
        value: value.trim().to_string(),
        domain: String::new(),
        path: String::new(),
        expiry: None,
        secure: false,
        http_only: false,
        same_site: None,
    };

    for attr in parts {
        let attr = attr.trim();
        let (key, value) = attr.split_once('=').unwrap_or((attr, ""));
        match key.to_ascii_lowercase().as_str() {
            "domain" => cookie.domain = value.trim().to_string(),
            "path" => cookie.path = value.trim().to_string(),
            "secure" => cookie.secure = true,
            "httponly" => cookie.http_only = true,
            "samesite" => cookie.same_site = Some(value.trim().to_string()),
            "max-age" => {
                if let Ok(seconds) = value.trim().parse::<i64>() {
                    cookie.expiry = Some(now_unix() + seconds);
                }
            }
            "expires" => {
                if let Ok(dt) = DateTime::parse_from_rfc2822(value.trim()) {
                    cookie.expiry = Some(dt.with_timezone(&Utc).timestamp());
                }
            }
            _ => {}
        }
    }

    Some(cookie)
}

fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Serializes a jar to a simple line-oriented, losslessly round-trippable
/// format: one cookie per line, tab-separated fields.
pub fn serialize_jar(cookies: &[Cookie]) -> String {
    let mut out = String::new();
    for c in cookies {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            c.name,
            c.value,
            c.domain,
            c.path,
            c.expiry.map(|e| e.to_string()).unwrap_or_default(),
            c.secure,
            c.http_only,
            c.same_site.clone().unwrap_or_default(),
        ));
    }
    out
}

pub fn parse_jar(text: &str) -> Vec<Cookie> {
    text.lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 8 {
                return None;
            }
            Some(Cookie {
                name: fields[0].to_string(),
                value: fields[1].to_string(),
                domain: fields[2].to_string(),
                path: fields[3].to_string(),
                expiry: fields[4].parse().ok(),
                secure: fields[5] == "true",
                http_only: fields[6] == "true",
                same_site: if fields[7].is_empty() {
                    None
                } else {
                    Some(fields[7].to_string())
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_value_and_attributes() {
        let cookie = parse_set_cookie("session=abc123; Domain=example.com; Path=/app; Secure; HttpOnly").unwrap();
        assert_eq!(cookie.name, "session");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.domain, "example.com");
        assert_eq!(cookie.path, "/app");
        assert!(cookie.secure);
        assert!(cookie.http_only);
    }

    #[test]
    fn domain_matching_allows_subdomains() {
        let cookie = parse_set_cookie("k=v; Domain=example.com").unwrap();
        assert!(cookie.domain_matches("example.com"));
        assert!(cookie.domain_matches("api.example.com"));
        assert!(!cookie.domain_matches("other.com"));
    }

    #[test]
    fn jar_round_trips_losslessly() {
        let cookies = vec![parse_set_cookie("k=v; Domain=example.com; Path=/; Secure").unwrap()];
        let serialized = serialize_jar(&cookies);
        let parsed = parse_jar(&serialized);
        assert_eq!(parsed, cookies);
    }

    #[test]
    fn max_age_sets_future_expiry() {
        let cookie = parse_set_cookie("k=v; Max-Age=3600").unwrap();
        assert!(cookie.expiry.unwrap() > now_unix());
    }
}
