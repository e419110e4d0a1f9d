//! Named, on-disk cookie jar (§4.6)

pub mod cookie;

use crate::config::validate_session_name;
use crate::error::Result;
use anyhow::Context;
use cookie::Cookie;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One session's cookie store, loaded from and flushed back to a single
/// file under the sessions directory.
pub struct Jar {
    name: String,
    path: PathBuf,
    cookies: Vec<Cookie>,
}

impl Jar {
    /// Loads the named session's jar, dropping any cookie already expired
    /// at load time. `dir` is the sessions directory (overridable via
    /// `FETCH_INTERNAL_SESSIONS_DIR`).
    pub fn load(name: &str, dir: &Path) -> Result<Self> {
        validate_session_name(name)?;
        let path = dir.join(name);
        let cookies = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading session file {}", path.display()))?;
            cookie::parse_jar(&text)
        } else {
            Vec::new()
        };
        let now = now_unix();
        let cookies = cookies.into_iter().filter(|c| !c.is_expired(now)).collect();
        Ok(Jar {
            name: name.to_string(),
            path,
            cookies,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookies that should be sent on a request to `host`/`path` over a
    /// connection that is (or isn't) secure, per RFC 6265 matching rules.
    pub fn matching(&self, host: &str, path: &str, secure: bool) -> Vec<&Cookie> {
        let now = now_unix();
        self.cookies
            .iter()
            .filter(|c| !c.is_expired(now))
            .filter(|c| c.domain_matches(host))
            .filter(|c| c.path_matches(path))
            .filter(|c| !c.secure || secure)
            .collect()
    }

    /// Ingests a `Set-Cookie` header value, merging on the (name, domain,
    /// path) key. A cookie already expired at ingest time is dropped
    /// rather than stored.
    pub fn ingest(&mut self, set_cookie: &str, default_domain: &str, default_path: &str) {
        let Some(mut cookie) = cookie::parse_set_cookie(set_cookie) else {
            return;
        };
        if cookie.domain.is_empty() {
            cookie.domain = default_domain.to_string();
        }
        if cookie.path.is_empty() {
            cookie.path = default_path.to_string();
        }
        if cookie.is_expired(now_unix()) {
            self.cookies
                .retain(|c| !(c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path));
            return;
        }
        self.cookies
            .retain(|c| !(c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path));
        self.cookies.push(cookie);
    }

    /// Writes the jar back atomically: write to a sibling tempfile, fsync,
    /// rename over the destination.
    pub fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating sessions directory {}", parent.display()))?;
        }
        let serialized = cookie::serialize_jar(&self.cookies);
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(parent)
            .with_context(|| format!("creating temp file in {}", parent.display()))?;
        use std::io::Write;
        tmp.write_all(serialized.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("persisting session file {}", self.path.display()))?;
        Ok(())
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sessions_are_independent() {
        let dir = tempdir().unwrap();
        let mut a = Jar::load("alpha", dir.path()).unwrap();
        a.ingest("k=v; Domain=example.com; Path=/", "example.com", "/");
        a.flush().unwrap();

        let b = Jar::load("beta", dir.path()).unwrap();
        assert!(b.matching("example.com", "/", false).is_empty());

        let a_reloaded = Jar::load("alpha", dir.path()).unwrap();
        assert_eq!(a_reloaded.matching("example.com", "/", false).len(), 1);
    }

    #[test]
    fn expired_cookie_is_not_sent_or_persisted() {
        let dir = tempdir().unwrap();
        let mut jar = Jar::load("expiring", dir.path()).unwrap();
        jar.ingest(
            "k=v; Domain=example.com; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            "example.com",
            "/",
        );
        assert!(jar.matching("example.com", "/", false).is_empty());
        jar.flush().unwrap();
        let reloaded = Jar::load("expiring", dir.path()).unwrap();
        assert!(reloaded.matching("example.com", "/", false).is_empty());
    }

    #[test]
    fn invalid_session_name_is_rejected_before_disk_access() {
        let dir = tempdir().unwrap();
        assert!(Jar::load("../escape", dir.path()).is_err());
    }
}
