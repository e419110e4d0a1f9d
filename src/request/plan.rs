//! The immutable description of one HTTP attempt (§3 RequestPlan).

use crate::config::{BodySource, Config, MultipartField};
use crate::error::Result;
use anyhow::Context;
use std::time::Duration;

/// A body provider is either replayable (its bytes can be produced more
/// than once, enabling retry/redirect/SigV4) or a one-shot stream.
#[derive(Debug, Clone)]
pub enum BodyProvider {
    Empty,
    Memory(Vec<u8>),
    FilePath(std::path::PathBuf),
    /// A non-replayable source (stdin). Carries the already-read bytes
    /// only once; a retry after any byte was written is not permitted.
    Stream,
}

impl BodyProvider {
    pub fn is_replayable(&self) -> bool {
        !matches!(self, BodyProvider::Stream)
    }

    /// Produces the body bytes. `FilePath` reads from position 0 every
    /// call, satisfying replayability.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        match self {
            BodyProvider::Empty => Ok(Vec::new()),
            BodyProvider::Memory(b) => Ok(b.clone()),
            BodyProvider::FilePath(path) => std::fs::read(path)
                .with_context(|| format!("reading body file {}", path.display())),
            BodyProvider::Stream => Ok(Vec::new()),
        }
    }
}

/// One HTTP attempt's immutable plan. Rebuilt fresh for every retry and
/// every followed redirect (method/body may change per §4.1).
#[derive(Debug, Clone)]
pub struct RequestPlan {
    pub method: String,
    pub url: url::Url,
    pub headers: Vec<(String, String)>,
    pub body: BodyProvider,
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl RequestPlan {
    /// Builds the initial plan from a resolved `Config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut url = url::Url::parse(&config.url).context("parsing request URL")?;
        if !config.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &config.query {
                pairs.append_pair(k, v);
            }
        }

        let method = config
            .method
            .clone()
            .unwrap_or_else(|| default_method(&config.body));

        let mut headers = config.headers.clone();
        let body = body_provider_for(config, &mut headers)?;

        Ok(RequestPlan {
            method,
            url,
            headers,
            body,
            timeout: config.network.timeout,
            connect_timeout: config.network.connect_timeout,
        })
    }

    /// Returns a copy of this plan retargeted at a redirect `Location`,
    /// applying the method/body rewrite rules in §4.1 and stripping
    /// `Authorization` when the host changes.
    pub fn for_redirect(&self, location: &url::Url, status: u16) -> RequestPlan {
        let mut plan = self.clone();
        let cross_origin = plan.url.host_str() != location.host_str();
        plan.url = location.clone();

        match status {
            303 => {
                plan.method = "GET".to_string();
                plan.body = BodyProvider::Empty;
            }
            301 | 302 if plan.method == "POST" => {
                plan.method = "GET".to_string();
                plan.body = BodyProvider::Empty;
            }
            _ => {}
        }

        if cross_origin {
            plan.headers.retain(|(k, _)| !k.eq_ignore_ascii_case("authorization"));
        }
        plan
    }
}

fn default_method(body: &BodySource) -> String {
    match body {
        BodySource::None => "GET".to_string(),
        _ => "POST".to_string(),
    }
}

fn body_provider_for(config: &Config, headers: &mut Vec<(String, String)>) -> Result<BodyProvider> {
    let has_content_type = headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type"));

    match &config.body {
        BodySource::None => Ok(BodyProvider::Empty),
        BodySource::Raw(s) => Ok(BodyProvider::Memory(s.clone().into_bytes())),
        BodySource::File(path) => Ok(BodyProvider::FilePath(path.clone())),
        BodySource::Stdin => Ok(BodyProvider::Stream),
        BodySource::Json(s) => {
            if !has_content_type {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
            }
            Ok(BodyProvider::Memory(s.clone().into_bytes()))
        }
        BodySource::Xml(s) => {
            if !has_content_type {
                headers.push(("Content-Type".to_string(), "application/xml".to_string()));
            }
            Ok(BodyProvider::Memory(s.clone().into_bytes()))
        }
        BodySource::Form(fields) => {
            if !has_content_type {
                headers.push((
                    "Content-Type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                ));
            }
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields)
                .finish();
            Ok(BodyProvider::Memory(encoded.into_bytes()))
        }
        BodySource::Multipart(fields) => {
            // Multipart bodies are built lazily by the executor (reqwest
            // owns boundary generation); the plan only carries the field
            // descriptions by re-deriving them from config at send time.
            let _ = fields;
            Ok(BodyProvider::Empty)
        }
    }
}

/// Rebuilds a `reqwest::multipart::Form` from the configured fields. Kept
/// separate from `BodyProvider` because reqwest's multipart form is not
/// `Clone`, so it must be rebuilt fresh on every attempt.
pub fn build_multipart_form(fields: &[MultipartField]) -> Result<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    for field in fields {
        form = match field {
            MultipartField::Text { name, value } => form.text(name.clone(), value.clone()),
            MultipartField::File { name, path } => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("reading multipart file {}", path.display()))?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                form.part(name.clone(), reqwest::multipart::Part::bytes(bytes).file_name(file_name))
            }
        };
    }
    Ok(form)
}
