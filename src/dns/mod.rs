//! DNS-over-HTTPS and plain UDP resolution (§4.9)
//!
//! `--dns-server` selects one of two resolvers: an `https://` URL talks
//! the DoH JSON API; anything else is parsed as a plain `IP[:PORT]` and
//! used as a conventional UDP resolver via `hickory-resolver`.

use crate::error::{FetchError, Result};
use anyhow::{anyhow, Context};
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

/// Resolves a hostname to a list of IP addresses, honouring an optional
/// `--dns-server` override.
pub enum Resolver {
    System,
    Udp(TokioAsyncResolver),
    DnsOverHttps { endpoint: String, client: reqwest::Client },
}

impl Resolver {
    /// Builds a resolver from the `--dns-server` value, or the system
    /// default when `None`.
    pub fn from_override(dns_server: Option<&str>, http_client: reqwest::Client) -> Result<Self> {
        let Some(server) = dns_server else {
            return Ok(Resolver::System);
        };
        if server.starts_with("https://") {
            return Ok(Resolver::DnsOverHttps {
                endpoint: server.to_string(),
                client: http_client,
            });
        }
        let addr: SocketAddr = if server.contains(':') {
            server
                .parse()
                .with_context(|| format!("invalid DNS server address: {server}"))?
        } else {
            format!("{server}:53")
                .parse()
                .with_context(|| format!("invalid DNS server address: {server}"))?
        };
        let group = NameServerConfigGroup::from_ips_clear(&[addr.ip()], addr.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], group);
        let resolver = TokioAsyncResolver::tokio(config, ResolverOpts::default());
        Ok(Resolver::Udp(resolver))
    }

    pub async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }
        match self {
            Resolver::System => {
                let resolver =
                    TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
                lookup(&resolver, host).await
            }
            Resolver::Udp(resolver) => lookup(resolver, host).await,
            Resolver::DnsOverHttps { endpoint, client } => resolve_doh(client, endpoint, host).await,
        }
    }
}

async fn lookup(resolver: &TokioAsyncResolver, host: &str) -> Result<Vec<IpAddr>> {
    let response = resolver
        .lookup_ip(host)
        .await
        .map_err(|_| anyhow!(FetchError::Dns))?;
    let ips: Vec<IpAddr> = response.iter().collect();
    if ips.is_empty() {
        return Err(anyhow!(FetchError::Dns));
    }
    Ok(ips)
}

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: i32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

/// DNS RR types we resolve to addresses: A=1, AAAA=28.
const RR_A: u16 = 1;
const RR_AAAA: u16 = 28;

async fn resolve_doh(client: &reqwest::Client, endpoint: &str, host: &str) -> Result<Vec<IpAddr>> {
    let response = client
        .get(endpoint)
        .query(&[("name", host), ("type", "A")])
        .header("Accept", "application/dns-json")
        .send()
        .await
        .map_err(|e| anyhow!(FetchError::Transport(e.to_string())))?;
    let body: DohResponse = response
        .json()
        .await
        .map_err(|e| anyhow!(FetchError::Transport(format!("malformed DoH response: {e}"))))?;

    if body.status == 3 {
        return Err(anyhow!(FetchError::Dns));
    }

    let ips: Vec<IpAddr> = body
        .answer
        .into_iter()
        .filter(|a| a.record_type == RR_A || a.record_type == RR_AAAA)
        .filter_map(|a| a.data.parse().ok())
        .collect();

    if ips.is_empty() {
        return Err(anyhow!(FetchError::Dns));
    }
    Ok(ips)
}

/// Adapts [`Resolver`] to `reqwest`'s `Resolve` trait so `--dns-server`
/// threads through the HTTP transport exactly as it does the TLS dialer.
pub struct ReqwestResolverAdapter(pub std::sync::Arc<Resolver>);

impl reqwest::dns::Resolve for ReqwestResolverAdapter {
    fn resolve(&self, name: reqwest::dns::Name) -> reqwest::dns::Resolving {
        let resolver = self.0.clone();
        Box::pin(async move {
            let host = name.as_str().to_string();
            let ips = resolver
                .resolve(&host)
                .await
                .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { e.to_string().into() })?;
            let addrs: Vec<SocketAddr> = ips.into_iter().map(|ip| SocketAddr::new(ip, 0)).collect();
            Ok(Box::new(addrs.into_iter()) as reqwest::dns::Addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doh_nxdomain_status_maps_to_dns_error() {
        let body = DohResponse {
            status: 3,
            answer: vec![],
        };
        assert_eq!(body.status, 3);
    }

    #[test]
    fn literal_ip_short_circuits_resolution() {
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(ip.is_loopback());
    }

    #[tokio::test]
    async fn resolver_resolves_literal_ip_without_lookup() {
        let resolver = Resolver::System;
        let ips = resolver.resolve("127.0.0.1").await.unwrap();
        assert_eq!(ips, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);
    }
}
