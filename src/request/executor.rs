//! The request pipeline's state machine: Prepare → Signed → InFlight →
//! AwaitHeaders → AwaitBody → Done | Retrying | Following | Failed (§4.1).

use crate::config::Config;
use crate::dns::{ReqwestResolverAdapter, Resolver as DnsResolver};
use crate::error::{FetchError, Result};
use crate::request::auth;
use crate::request::plan::{BodyProvider, RequestPlan};
use crate::request::retry::{delay_for, is_retryable_status, parse_retry_after};
use crate::response::envelope::ResponseEnvelope;
use crate::session::Jar;
use crate::tls::TlsAssembly;
use anyhow::anyhow;
use reqwest::redirect::Policy;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// One logical outcome of a state-machine transition.
enum StepOutcome {
    Done(ResponseEnvelope),
    Following(RequestPlan),
    Retrying(RequestPlan),
}

/// Owns the transport, TLS config, DNS resolver, and cookie jar for the
/// lifetime of one request sequence (initial attempt + redirects + retries).
pub struct Executor {
    client: reqwest::Client,
    jar: Option<Jar>,
    redirects_remaining: u32,
    retries_remaining: u32,
    retry_delay: Duration,
    ignore_status: bool,
}

impl Executor {
    pub async fn new(config: &Config) -> Result<Self> {
        let tls = TlsAssembly {
            ca_certs: config.tls.ca_certs.clone(),
            client_identity: config.tls.cert.clone().map(|c| (c, config.tls.key.clone())),
            min_version: config.tls.min_version,
            insecure: config.tls.insecure,
            http_version: config.network.http_version,
        };
        let tls_config = tls.build()?;

        let mut builder = reqwest::Client::builder()
            .use_preconfigured_tls(tls_config)
            .redirect(Policy::none())
            .user_agent(format!("fetch/{}", env!("CARGO_PKG_VERSION")));

        if config.no_encode {
            builder = builder.no_gzip().no_zstd();
        }

        if let Some(proxy) = &config.proxy {
            builder = builder
                .proxy(reqwest::Proxy::all(proxy).map_err(|e| anyhow!(FetchError::Usage(e.to_string())))?);
        }

        if let Some(timeout) = config.network.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        let resolver = DnsResolver::from_override(config.dns_server.as_deref(), reqwest::Client::new())?;
        if config.dns_server.is_some() {
            builder = builder.dns_resolver(Arc::new(ReqwestResolverAdapter(Arc::new(resolver))));
        }

        let client = builder
            .build()
            .map_err(|e| anyhow!(FetchError::Transport(e.to_string())))?;

        let jar = match &config.session {
            Some(name) => Some(Jar::load(name, &sessions_dir())?),
            None => None,
        };

        Ok(Executor {
            client,
            jar,
            redirects_remaining: config.network.redirects,
            retries_remaining: config.network.retry,
            retry_delay: config.network.retry_delay,
            ignore_status: config.ignore_status,
        })
    }

    /// Drives one full request sequence to completion, following redirects
    /// and retrying transient failures per §4.1 until `Done` or `Failed`.
    pub async fn run(&mut self, initial: RequestPlan, config: &Config) -> Result<ResponseEnvelope> {
        let mut plan = initial;
        loop {
            match self.attempt(&plan, config).await {
                Ok(StepOutcome::Done(envelope)) => {
                    if let Some(jar) = &self.jar {
                        jar.flush()?;
                    }
                    return Ok(envelope);
                }
                Ok(StepOutcome::Following(next)) => {
                    if self.redirects_remaining == 0 {
                        return Err(anyhow!(FetchError::RedirectBudgetExceeded));
                    }
                    self.redirects_remaining -= 1;
                    debug!(remaining = self.redirects_remaining, "following redirect");
                    plan = next;
                }
                Ok(StepOutcome::Retrying(next)) => {
                    if self.retries_remaining == 0 {
                        return Err(anyhow!(FetchError::Transport(
                            "retries exhausted".to_string()
                        )));
                    }
                    self.retries_remaining -= 1;
                    debug!(remaining = self.retries_remaining, "retrying attempt");
                    plan = next;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&mut self, plan: &RequestPlan, config: &Config) -> Result<StepOutcome> {
        let mut plan = plan.clone();

        // Prepare -> Signed
        self.sign(&mut plan)?;
        trace!(method = %plan.method, url = %plan.url, "prepared request");

        if let Some(jar) = &self.jar {
            let host = plan.url.host_str().unwrap_or_default();
            let secure = plan.url.scheme() == "https";
            let cookie_header: Vec<String> = jar
                .matching(host, plan.url.path(), secure)
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect();
            if !cookie_header.is_empty() {
                plan.headers.push(("Cookie".to_string(), cookie_header.join("; ")));
            }
        }

        // Signed -> InFlight
        let method = reqwest::Method::from_bytes(plan.method.as_bytes())
            .map_err(|_| anyhow!(FetchError::Usage(format!("invalid method: {}", plan.method))))?;
        let mut request = self.client.request(method, plan.url.clone());
        for (k, v) in &plan.headers {
            request = request.header(k, v);
        }
        match &plan.body {
            BodyProvider::Empty => {}
            BodyProvider::Memory(bytes) => request = request.body(bytes.clone()),
            BodyProvider::FilePath(_) => request = request.body(plan.body.bytes()?),
            BodyProvider::Stream => {
                let mut buf = Vec::new();
                std::io::Read::read_to_end(&mut std::io::stdin(), &mut buf)
                    .map_err(FetchError::Io)?;
                request = request.body(buf);
            }
        }
        if let Some(timeout) = plan.timeout {
            request = request.timeout(timeout);
        }

        let started = Instant::now();
        let response = request.send().await;

        // InFlight -> AwaitHeaders
        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                let duration = plan.timeout.unwrap_or_default();
                if plan.body.is_replayable() && self.retries_remaining > 0 {
                    warn!("attempt timed out after {:?}, retrying", duration);
                    return Ok(StepOutcome::Retrying(plan));
                }
                return Err(anyhow!(FetchError::Timeout { duration }));
            }
            Err(e) => {
                if plan.body.is_replayable() && self.retries_remaining > 0 {
                    warn!(error = %e, "transient transport error, retrying");
                    return Ok(StepOutcome::Retrying(plan));
                }
                return Err(anyhow!(FetchError::Transport(e.to_string())));
            }
        };
        trace!(elapsed = ?started.elapsed(), status = %response.status(), "received headers");

        let status = response.status().as_u16();

        if let Some(jar) = &mut self.jar {
            let host = plan.url.host_str().unwrap_or_default().to_string();
            for value in response.headers().get_all("set-cookie") {
                if let Ok(raw) = value.to_str() {
                    jar.ingest(raw, &host, plan.url.path());
                }
            }
        }

        if matches!(status, 301 | 302 | 303 | 307 | 308) {
            if let Some(location) = response.headers().get("location").and_then(|v| v.to_str().ok()) {
                if let Ok(location_url) = plan.url.join(location) {
                    return Ok(StepOutcome::Following(plan.for_redirect(&location_url, status)));
                }
            }
        }

        if is_retryable_status(status) && plan.body.is_replayable() && self.retries_remaining > 0 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            let delay = delay_for(self.retry_delay, retry_after);
            tokio::time::sleep(delay).await;
            return Ok(StepOutcome::Retrying(plan));
        }

        if !self.ignore_status && !(100..400).contains(&status) {
            debug!(status, "non-success status, treating attempt as done");
        }

        let envelope = ResponseEnvelope::from_reqwest(response).await?;
        let _ = config;
        Ok(StepOutcome::Done(envelope))
    }

    fn sign(&self, plan: &mut RequestPlan) -> Result<()> {
        // SigV4/Basic/Bearer headers are injected by the caller before
        // `run` via `apply_auth`, since auth is a Config-level directive
        // rather than per-attempt state; this hook exists for symmetry
        // with the documented state machine and future per-attempt auth.
        let _ = plan;
        Ok(())
    }
}

/// Applies the configured auth directive to the initial plan. Exposed
/// separately from `Executor::sign` because SigV4 needs the resolved
/// body bytes before the first attempt, and the body is replayable so
/// this only needs to run once.
pub fn apply_auth(config: &Config, plan: &mut RequestPlan) -> Result<()> {
    let body = match &plan.body {
        BodyProvider::Stream => None,
        other => Some(other.bytes()?),
    };
    auth::apply(
        &config.auth,
        &plan.method,
        &plan.url,
        &mut plan.headers,
        body.as_deref(),
        chrono::Utc::now(),
    )
}

fn sessions_dir() -> std::path::PathBuf {
    if let Ok(dir) = std::env::var("FETCH_INTERNAL_SESSIONS_DIR") {
        return std::path::PathBuf::from(dir);
    }
    directories::ProjectDirs::from("", "", "fetch")
        .map(|dirs| dirs.data_dir().join("sessions"))
        .unwrap_or_else(|| std::path::PathBuf::from(".fetch-sessions"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_dir_honours_env_override() {
        std::env::set_var("FETCH_INTERNAL_SESSIONS_DIR", "/tmp/fetch-test-sessions");
        assert_eq!(sessions_dir(), std::path::PathBuf::from("/tmp/fetch-test-sessions"));
        std::env::remove_var("FETCH_INTERNAL_SESSIONS_DIR");
    }
}
