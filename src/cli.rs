//! Command-line interface definition for `fetch`
//!
//! Defines the CLI surface using clap's derive API. This module only
//! describes *syntax*; semantic validation (mutually-exclusive flags,
//! range checks) happens in [`crate::config::Config::validate`] once the
//! CLI value has been merged with file-based configuration.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// `fetch` - a content-aware HTTP, gRPC, and WebSocket client
#[derive(Parser, Debug, Clone)]
#[command(name = "fetch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// URL to request (http://, https://, ws://, wss://)
    pub url: String,

    /// Override HTTP method
    #[arg(short = 'X', long = "method")]
    pub method: Option<String>,

    /// Append a request header "Key: Value" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Append a query parameter "key=value" (repeatable)
    #[arg(short = 'q', long = "query")]
    pub query: Vec<String>,

    /// Request body: literal value, @file, or @- for stdin
    #[arg(short = 'd', long = "data")]
    pub data: Option<String>,

    /// JSON request body (sets Content-Type: application/json)
    #[arg(long = "json")]
    pub json: Option<String>,

    /// XML request body (sets Content-Type: application/xml)
    #[arg(long = "xml")]
    pub xml: Option<String>,

    /// URL-encoded form field "key=value" (repeatable)
    #[arg(short = 'f', long = "form")]
    pub form: Vec<String>,

    /// Multipart field "key=value" or "key=@file" (repeatable)
    #[arg(short = 'F', long = "multipart")]
    pub multipart: Vec<String>,

    /// HTTP Basic auth "user:pass"
    #[arg(long = "basic")]
    pub basic: Option<String>,

    /// Bearer token auth
    #[arg(long = "bearer")]
    pub bearer: Option<String>,

    /// AWS SigV4 auth "region/service"
    #[arg(long = "aws-sigv4")]
    pub aws_sigv4: Option<String>,

    /// Total timeout in seconds (float)
    #[arg(short = 't', long = "timeout")]
    pub timeout: Option<f64>,

    /// Connect-phase timeout in seconds
    #[arg(long = "connect-timeout")]
    pub connect_timeout: Option<f64>,

    /// Number of retries for transient failures
    #[arg(long = "retry")]
    pub retry: Option<u32>,

    /// Base delay between retries, in seconds
    #[arg(long = "retry-delay")]
    pub retry_delay: Option<f64>,

    /// Redirect budget (0 disables following redirects)
    #[arg(long = "redirects")]
    pub redirects: Option<u32>,

    /// Append to the Range header (repeatable)
    #[arg(short = 'r', long = "range")]
    pub range: Vec<String>,

    /// Force exit 0 regardless of HTTP status
    #[arg(long = "ignore-status")]
    pub ignore_status: bool,

    /// Write the response body to PATH, or "-" for stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    /// Write the response body to a file named from the URL or Content-Disposition
    #[arg(short = 'O')]
    pub output_auto: bool,

    /// With -O, prefer the filename from Content-Disposition
    #[arg(short = 'J')]
    pub output_content_disposition: bool,

    /// Allow -o/-O to overwrite an existing file
    #[arg(long = "clobber")]
    pub clobber: bool,

    /// Also copy the response body to the system clipboard
    #[arg(long = "copy")]
    pub copy: bool,

    /// Control response pretty-printing
    #[arg(long = "format", value_enum, default_value_t = FormatMode::Auto)]
    pub format: FormatMode,

    /// Disable Accept-Encoding negotiation and content-decoding
    #[arg(long = "no-encode")]
    pub no_encode: bool,

    /// Never page long output
    #[arg(long = "no-pager")]
    pub no_pager: bool,

    /// Pin the HTTP protocol version
    #[arg(long = "http", value_enum)]
    pub http: Option<HttpVersion>,

    /// Pin the minimum TLS version
    #[arg(long = "tls", value_enum)]
    pub tls: Option<TlsVersion>,

    /// Disable TLS certificate verification
    #[arg(long = "insecure")]
    pub insecure: bool,

    /// Additional CA certificate bundle (repeatable, appended to system roots)
    #[arg(long = "ca-cert")]
    pub ca_cert: Vec<PathBuf>,

    /// Client certificate for mTLS (PEM, optionally combined with the key)
    #[arg(long = "cert")]
    pub cert: Option<PathBuf>,

    /// Client private key for mTLS
    #[arg(long = "key")]
    pub key: Option<PathBuf>,

    /// Perform only a TLS handshake and render certificate/negotiation info
    #[arg(long = "inspect-tls")]
    pub inspect_tls: bool,

    /// DNS-over-HTTPS URL or plain "IP[:PORT]" resolver override
    #[arg(long = "dns-server")]
    pub dns_server: Option<String>,

    /// HTTP/HTTPS proxy URL
    #[arg(long = "proxy")]
    pub proxy: Option<String>,

    /// Connect via a Unix domain socket instead of TCP
    #[arg(long = "unix")]
    pub unix: Option<PathBuf>,

    /// Named cookie session to load/persist
    #[arg(long = "session")]
    pub session: Option<String>,

    /// Treat the request/response as gRPC (implies HTTP/2 framing)
    #[arg(long = "grpc")]
    pub grpc: bool,

    /// Compiled FileDescriptorSet for schema-aware gRPC/protobuf formatting
    #[arg(long = "proto-desc")]
    pub proto_desc: Option<PathBuf>,

    /// .proto source compiled via an external `protoc` for schema-aware formatting
    #[arg(long = "proto-file")]
    pub proto_file: Option<PathBuf>,

    /// Render the timing waterfall after the response completes
    #[arg(short = 'T', long = "timing")]
    pub timing: bool,

    /// Increase diagnostic verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Download and install the latest release
    #[arg(long = "update")]
    pub update: bool,

    /// Check for updates every DURATION (e.g. "24h") and install automatically
    #[arg(long = "auto-update")]
    pub auto_update: Option<String>,

    /// Report what an action would do without performing it
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Path to a config file (overrides the default discovery search)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

/// Formatter engagement mode (§4.2).
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatMode {
    /// Pretty-print only when stdout is a TTY and the content type is formattable.
    #[default]
    Auto,
    /// Always attempt pretty-printing.
    On,
    /// Never pretty-print; copy bytes verbatim (after transport decoding).
    Off,
}

/// HTTP protocol pin (`--http`).
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    /// HTTP/1.1 only.
    #[value(name = "1")]
    Http1,
    /// HTTP/2, offering `h2, http/1.1` via ALPN.
    #[value(name = "2")]
    Http2,
    /// HTTP/3 over QUIC. Accepted for forward-compatibility; see
    /// `DESIGN.md` for why this build rejects it with a clear `UsageError`
    /// instead of silently downgrading.
    #[value(name = "3")]
    Http3,
}

/// Minimum TLS version pin (`--tls`).
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    #[value(name = "1.0")]
    Tls1_0,
    #[value(name = "1.1")]
    Tls1_1,
    #[value(name = "1.2")]
    Tls1_2,
    #[value(name = "1.3")]
    Tls1_3,
}

impl Cli {
    /// Parses `std::env::args`, exiting the process on a usage error
    /// exactly as clap's generated `--help`/error output does.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_get() {
        let cli = Cli::try_parse_from(["fetch", "https://example.com"]).unwrap();
        assert_eq!(cli.url, "https://example.com");
        assert_eq!(cli.method, None);
        assert_eq!(cli.format, FormatMode::Auto);
    }

    #[test]
    fn parses_repeated_headers() {
        let cli = Cli::try_parse_from([
            "fetch",
            "https://example.com",
            "-H",
            "X-One: 1",
            "-H",
            "X-Two: 2",
        ])
        .unwrap();
        assert_eq!(cli.headers, vec!["X-One: 1", "X-Two: 2"]);
    }

    #[test]
    fn parses_verbosity_count() {
        let cli = Cli::try_parse_from(["fetch", "https://example.com", "-vvv"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn parses_format_enum() {
        let cli =
            Cli::try_parse_from(["fetch", "https://example.com", "--format", "off"]).unwrap();
        assert_eq!(cli.format, FormatMode::Off);
    }

    #[test]
    fn rejects_unknown_format_value() {
        let cli = Cli::try_parse_from(["fetch", "https://example.com", "--format", "maybe"]);
        assert!(cli.is_err());
    }

    #[test]
    fn parses_grpc_and_proto_desc() {
        let cli = Cli::try_parse_from([
            "fetch",
            "https://example.com",
            "--grpc",
            "--proto-desc",
            "svc.desc",
        ])
        .unwrap();
        assert!(cli.grpc);
        assert_eq!(cli.proto_desc, Some(PathBuf::from("svc.desc")));
    }

    #[test]
    fn missing_url_is_an_error() {
        let cli = Cli::try_parse_from(["fetch"]);
        assert!(cli.is_err());
    }
}
