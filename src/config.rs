//! Configuration loading, merging, and validation for `fetch`
//!
//! A [`Config`] is assembled once per process by layering, in increasing
//! priority: built-in defaults, the global section of a config file,
//! per-host/`*.domain` sections of that file whose selector matches the
//! request's host, and finally CLI flags. List-valued fields (headers, CA
//! certs) concatenate across layers; scalar fields follow last-wins.

use crate::cli::{Cli, FormatMode, HttpVersion, TlsVersion};
use crate::error::{FetchError, Result};
use anyhow::{anyhow, Context};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fully resolved options after merging defaults, config file layers, and
/// CLI flags. Immutable once constructed; created exactly once per process.
#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub method: Option<String>,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: BodySource,
    pub auth: AuthDirective,
    pub network: NetworkConfig,
    pub tls: TlsConfig,
    pub output: OutputConfig,
    pub session: Option<String>,
    pub grpc: GrpcConfig,
    pub format: FormatMode,
    pub no_encode: bool,
    pub timing: bool,
    pub verbosity: Verbosity,
    pub range: Vec<String>,
    pub ignore_status: bool,
    pub dns_server: Option<String>,
    pub proxy: Option<String>,
    pub unix: Option<PathBuf>,
    pub dry_run: bool,
}

/// How the request body was supplied on the command line.
#[derive(Debug, Clone)]
pub enum BodySource {
    None,
    Raw(String),
    File(PathBuf),
    Stdin,
    Json(String),
    Xml(String),
    Form(Vec<(String, String)>),
    Multipart(Vec<MultipartField>),
}

/// One `-F key=value` / `-F key=@file` multipart field.
#[derive(Debug, Clone)]
pub enum MultipartField {
    Text { name: String, value: String },
    File { name: String, path: PathBuf },
}

/// Mutually-exclusive auth directive.
#[derive(Debug, Clone)]
pub enum AuthDirective {
    None,
    Basic { user: String, password: String },
    Bearer(String),
    AwsSigV4 { region: String, service: String },
}

/// 0 (silent) through 3 (trace) diagnostic verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Verbosity(pub u8);

impl Verbosity {
    pub fn from_count(count: u8) -> Self {
        Verbosity(count.min(3))
    }

    /// Default `RUST_LOG` directive implied by this verbosity when the
    /// user has not set `RUST_LOG` explicitly.
    pub fn default_env_filter(self) -> &'static str {
        match self.0 {
            0 => "fetch=warn",
            1 => "fetch=info",
            2 => "fetch=debug",
            _ => "fetch=trace",
        }
    }
}

/// Connection, timeout, and retry knobs.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub retry: u32,
    pub retry_delay: Duration,
    pub redirects: u32,
    pub http_version: Option<HttpVersion>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: None,
            retry: 0,
            retry_delay: Duration::from_secs(1),
            redirects: 10,
            http_version: None,
        }
    }
}

/// TLS assembly knobs.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    pub min_version: Option<TlsVersion>,
    pub insecure: bool,
    pub ca_certs: Vec<PathBuf>,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub inspect_only: bool,
}

/// Output destination knobs.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub auto_name: bool,
    pub use_content_disposition: bool,
    pub clobber: bool,
    pub copy_to_clipboard: bool,
    pub no_pager: bool,
}

/// gRPC mode knobs.
#[derive(Debug, Clone, Default)]
pub struct GrpcConfig {
    pub enabled: bool,
    pub proto_desc: Option<PathBuf>,
    pub proto_file: Option<PathBuf>,
}

impl Config {
    /// Loads and merges the global + per-host config file layers, then
    /// applies CLI overrides. `--config` wins over the default discovery
    /// search (`XDG_CONFIG_HOME`, then the platform config dir).
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_path = cli.config.clone().or_else(default_config_path);
        let layers = match &file_path {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                parse_ini_layers(&text, path)?
            }
            _ => ConfigFile::default(),
        };

        let host = url::Url::parse(&cli.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()));

        let mut kv: HashMap<String, String> = layers.global.clone();
        if let Some(host) = &host {
            for section in layers.matching_sections(host) {
                kv.extend(section.clone());
            }
        }

        let mut headers: Vec<(String, String)> = layers.headers.clone();
        for raw in &cli.headers {
            headers.push(split_header(raw)?);
        }

        let mut ca_certs: Vec<PathBuf> = kv
            .get("ca_cert")
            .map(|v| v.split(',').map(|s| PathBuf::from(s.trim())).collect())
            .unwrap_or_default();
        ca_certs.extend(cli.ca_cert.clone());

        let query = cli
            .query
            .iter()
            .map(|kv| split_kv(kv, '='))
            .collect::<Result<Vec<_>>>()?;

        let body = resolve_body(cli)?;
        let auth = resolve_auth(cli)?;

        let retry = cli
            .retry
            .or_else(|| kv.get("retry").and_then(|v| v.parse().ok()))
            .unwrap_or(0);
        let retry_delay = cli
            .retry_delay
            .or_else(|| kv.get("retry_delay").and_then(|v| v.parse().ok()))
            .map(Duration::from_secs_f64)
            .unwrap_or(Duration::from_secs(1));
        let redirects = cli
            .redirects
            .or_else(|| kv.get("redirects").and_then(|v| v.parse().ok()))
            .unwrap_or(10);

        let config = Config {
            url: cli.url.clone(),
            method: cli.method.clone(),
            headers,
            query,
            body,
            auth,
            network: NetworkConfig {
                timeout: cli.timeout.map(Duration::from_secs_f64),
                connect_timeout: cli.connect_timeout.map(Duration::from_secs_f64),
                retry,
                retry_delay,
                redirects,
                http_version: cli.http,
            },
            tls: TlsConfig {
                min_version: cli.tls,
                insecure: cli.insecure,
                ca_certs,
                cert: cli.cert.clone(),
                key: cli.key.clone(),
                inspect_only: cli.inspect_tls,
            },
            output: OutputConfig {
                path: cli.output.clone(),
                auto_name: cli.output_auto,
                use_content_disposition: cli.output_content_disposition,
                clobber: cli.clobber,
                copy_to_clipboard: cli.copy,
                no_pager: cli.no_pager,
            },
            session: cli.session.clone(),
            grpc: GrpcConfig {
                enabled: cli.grpc,
                proto_desc: cli.proto_desc.clone(),
                proto_file: cli.proto_file.clone(),
            },
            format: cli.format,
            no_encode: cli.no_encode,
            timing: cli.timing,
            verbosity: Verbosity::from_count(cli.verbose),
            range: cli.range.clone(),
            ignore_status: cli.ignore_status,
            dns_server: cli.dns_server.clone(),
            proxy: cli.proxy.clone(),
            unix: cli.unix.clone(),
            dry_run: cli.dry_run,
        };

        Ok(config)
    }

    /// Rejects incompatible flag combinations before the request pipeline
    /// runs.
    pub fn validate(&self, cli: &Cli) -> Result<()> {
        if cli.key.is_some() && cli.cert.is_none() {
            return Err(anyhow!(FetchError::Usage(
                "--key requires --cert".to_string()
            )));
        }
        if cli.proto_file.is_some() && cli.proto_desc.is_some() {
            return Err(anyhow!(FetchError::Usage(
                "--proto-file and --proto-desc are mutually exclusive".to_string()
            )));
        }
        if cli.update && cli.auto_update.is_some() {
            return Err(anyhow!(FetchError::Usage(
                "--update and --auto-update are mutually exclusive".to_string()
            )));
        }
        if cli.output_content_disposition && !cli.output_auto {
            return Err(anyhow!(FetchError::Usage("-J requires -O".to_string())));
        }
        let auth_flags = [cli.basic.is_some(), cli.bearer.is_some(), cli.aws_sigv4.is_some()]
            .iter()
            .filter(|b| **b)
            .count();
        if auth_flags > 1 {
            return Err(anyhow!(FetchError::Usage(
                "--basic, --bearer, and --aws-sigv4 are mutually exclusive".to_string()
            )));
        }
        if let Some(name) = &self.session {
            validate_session_name(name)?;
        }
        if self.tls.inspect_only && !self.url.starts_with("https://") {
            return Err(anyhow!(FetchError::Usage(
                "--inspect-tls requires an https:// URL".to_string()
            )));
        }
        if matches!(self.network.http_version, Some(HttpVersion::Http3)) {
            return Err(anyhow!(FetchError::Usage(
                "HTTP/3 is not yet supported by this build".to_string()
            )));
        }
        Ok(())
    }
}

/// Validates a session name: must be non-empty and match `[A-Za-z0-9_-]+`,
/// so it can never resolve outside the sessions directory.
pub fn validate_session_name(name: &str) -> Result<()> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(anyhow!(FetchError::Usage(format!(
            "invalid session name: {name}"
        ))));
    }
    Ok(())
}

fn default_config_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(dir).join("fetch").join("config"));
    }
    directories::ProjectDirs::from("", "", "fetch")
        .map(|dirs| dirs.config_dir().join("config"))
}

fn split_header(raw: &str) -> Result<(String, String)> {
    let (k, v) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!(FetchError::Usage(format!("invalid header: {raw}"))))?;
    Ok((k.trim().to_string(), v.trim().to_string()))
}

fn split_kv(raw: &str, sep: char) -> Result<(String, String)> {
    let (k, v) = raw
        .split_once(sep)
        .ok_or_else(|| anyhow!(FetchError::Usage(format!("invalid key{sep}value pair: {raw}"))))?;
    Ok((k.to_string(), v.to_string()))
}

fn resolve_body(cli: &Cli) -> Result<BodySource> {
    if let Some(v) = &cli.json {
        return Ok(BodySource::Json(v.clone()));
    }
    if let Some(v) = &cli.xml {
        return Ok(BodySource::Xml(v.clone()));
    }
    if !cli.form.is_empty() {
        let fields = cli
            .form
            .iter()
            .map(|kv| split_kv(kv, '='))
            .collect::<Result<Vec<_>>>()?;
        return Ok(BodySource::Form(fields));
    }
    if !cli.multipart.is_empty() {
        let mut fields = Vec::with_capacity(cli.multipart.len());
        for raw in &cli.multipart {
            let (name, value) = split_kv(raw, '=')?;
            if let Some(path) = value.strip_prefix('@') {
                fields.push(MultipartField::File {
                    name,
                    path: PathBuf::from(path),
                });
            } else {
                fields.push(MultipartField::Text { name, value });
            }
        }
        return Ok(BodySource::Multipart(fields));
    }
    match &cli.data {
        None => Ok(BodySource::None),
        Some(v) if v == "@-" => Ok(BodySource::Stdin),
        Some(v) => match v.strip_prefix('@') {
            Some(path) => Ok(BodySource::File(PathBuf::from(path))),
            None => Ok(BodySource::Raw(v.clone())),
        },
    }
}

fn resolve_auth(cli: &Cli) -> Result<AuthDirective> {
    if let Some(basic) = &cli.basic {
        let (user, password) = split_kv(basic, ':')?;
        return Ok(AuthDirective::Basic { user, password });
    }
    if let Some(token) = &cli.bearer {
        return Ok(AuthDirective::Bearer(token.clone()));
    }
    if let Some(sigv4) = &cli.aws_sigv4 {
        let (region, service) = sigv4.split_once('/').ok_or_else(|| {
            anyhow!(FetchError::Usage(
                "--aws-sigv4 expects REGION/SERVICE".to_string()
            ))
        })?;
        return Ok(AuthDirective::AwsSigV4 {
            region: region.to_string(),
            service: service.to_string(),
        });
    }
    Ok(AuthDirective::None)
}

/// A parsed config file: a global key=value map, a separately-tracked list
/// of `header=` lines so they concatenate rather than overwrite, and
/// `[host]` / `[*.domain]` sections.
#[derive(Debug, Default)]
struct ConfigFile {
    global: HashMap<String, String>,
    headers: Vec<(String, String)>,
    sections: Vec<(HostSelector, HashMap<String, String>)>,
}

impl ConfigFile {
    /// Sections matching `host`, ordered so exact matches overwrite
    /// wildcard matches when folded into a single map in order.
    fn matching_sections(&self, host: &str) -> Vec<&HashMap<String, String>> {
        let mut matches: Vec<(&HostSelector, &HashMap<String, String>)> = self
            .sections
            .iter()
            .filter(|(sel, _)| sel.matches(host))
            .map(|(sel, kv)| (sel, kv))
            .collect();
        matches.sort_by_key(|(sel, _)| sel.specificity());
        matches.into_iter().map(|(_, kv)| kv).collect()
    }
}

/// A `[host]` or `[*.domain]` section selector.
#[derive(Debug, Clone)]
enum HostSelector {
    Exact(String),
    Wildcard(String),
}

impl HostSelector {
    fn parse(raw: &str) -> Option<Self> {
        if let Some(domain) = raw.strip_prefix("*.") {
            if domain.is_empty() || domain.starts_with('*') || domain.starts_with('.') {
                return None;
            }
            return Some(HostSelector::Wildcard(domain.to_string()));
        }
        if raw.contains('*') {
            return None;
        }
        Some(HostSelector::Exact(raw.to_string()))
    }

    fn matches(&self, host: &str) -> bool {
        match self {
            HostSelector::Exact(h) => h == host,
            HostSelector::Wildcard(domain) => {
                host == domain || host.ends_with(&format!(".{domain}"))
            }
        }
    }

    /// Lower sorts first, so later `kv.extend(...)` calls let a
    /// higher-specificity section win.
    fn specificity(&self) -> u8 {
        match self {
            HostSelector::Wildcard(_) => 0,
            HostSelector::Exact(_) => 1,
        }
    }
}

/// Parses the INI-like config format: blank lines and `#` comments
/// ignored, free-standing `key=value` pairs before any section header form
/// the global layer, `[host]`/`[*.domain]` headers open a new section.
/// Invalid wildcard forms are rejected immediately with the offending file
/// and line number.
fn parse_ini_layers(text: &str, path: &Path) -> Result<ConfigFile> {
    let mut file = ConfigFile::default();
    let mut current: Option<(HostSelector, HashMap<String, String>)> = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            if let Some((sel, kv)) = current.take() {
                file.sections.push((sel, kv));
            }
            let selector = HostSelector::parse(section).ok_or_else(|| {
                anyhow!(FetchError::Config {
                    file: path.display().to_string(),
                    line: line_no,
                    reason: format!("invalid section selector: [{section}]"),
                })
            })?;
            current = Some((selector, HashMap::new()));
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| {
            anyhow!(FetchError::Config {
                file: path.display().to_string(),
                line: line_no,
                reason: "expected key=value".to_string(),
            })
        })?;
        let key = key.trim().to_string();
        let value = value.trim().to_string();
        if key == "header" {
            file.headers.push(split_header(&value)?);
            continue;
        }
        match &mut current {
            Some((_, kv)) => {
                kv.insert(key, value);
            }
            None => {
                file.global.insert(key, value);
            }
        }
    }
    if let Some((sel, kv)) = current.take() {
        file.sections.push((sel, kv));
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli_for(url: &str) -> Cli {
        Cli::try_parse_from(["fetch", url]).unwrap()
    }

    #[test]
    fn wildcard_host_selector_matches_subdomains() {
        let sel = HostSelector::parse("*.example.com").unwrap();
        assert!(sel.matches("api.example.com"));
        assert!(sel.matches("example.com"));
        assert!(!sel.matches("example.org"));
    }

    #[test]
    fn invalid_wildcard_forms_are_rejected() {
        for bad in ["*domain", "*.", "*.*.com", "a.*.com"] {
            assert!(HostSelector::parse(bad).is_none(), "{bad} should be invalid");
        }
    }

    #[test]
    fn ini_parser_reads_global_and_section() {
        let text = "timeout=5\n\n[*.example.com]\nretry=3\n";
        let file = parse_ini_layers(text, Path::new("test.conf")).unwrap();
        assert_eq!(file.global.get("timeout"), Some(&"5".to_string()));
        let sections = file.matching_sections("api.example.com");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].get("retry"), Some(&"3".to_string()));
    }

    #[test]
    fn ini_parser_rejects_bad_wildcard_with_line_number() {
        let text = "timeout=5\n[*domain]\nretry=1\n";
        let err = parse_ini_layers(text, Path::new("test.conf")).unwrap_err();
        let fetch_err = err.downcast::<FetchError>().unwrap();
        match fetch_err {
            FetchError::Config { line, .. } => assert_eq!(line, 2),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn exact_match_outranks_wildcard() {
        let text = "[*.example.com]\nretry=1\n[api.example.com]\nretry=9\n";
        let file = parse_ini_layers(text, Path::new("test.conf")).unwrap();
        let mut merged = HashMap::new();
        for section in file.matching_sections("api.example.com") {
            merged.extend(section.clone());
        }
        assert_eq!(merged.get("retry"), Some(&"9".to_string()));
    }

    #[test]
    fn validate_rejects_key_without_cert() {
        let mut cli = cli_for("https://example.com");
        cli.key = Some(PathBuf::from("key.pem"));
        let config = Config::load(&cli).unwrap();
        assert!(config.validate(&cli).is_err());
    }

    #[test]
    fn validate_rejects_j_without_o() {
        let mut cli = cli_for("https://example.com");
        cli.output_content_disposition = true;
        let config = Config::load(&cli).unwrap();
        assert!(config.validate(&cli).is_err());
    }

    #[test]
    fn validate_rejects_multiple_auth_directives() {
        let mut cli = cli_for("https://example.com");
        cli.basic = Some("u:p".to_string());
        cli.bearer = Some("tok".to_string());
        let config = Config::load(&cli).unwrap();
        assert!(config.validate(&cli).is_err());
    }

    #[test]
    fn validate_rejects_http3() {
        let mut cli = cli_for("https://example.com");
        cli.http = Some(HttpVersion::Http3);
        let config = Config::load(&cli).unwrap();
        assert!(config.validate(&cli).is_err());
    }

    #[test]
    fn session_name_rejects_path_traversal() {
        assert!(validate_session_name("../etc").is_err());
        assert!(validate_session_name("a/b").is_err());
        assert!(validate_session_name("valid-name_1").is_ok());
    }
}
