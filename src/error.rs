//! Error types for `fetch`
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling. The crate boundary uses
//! `anyhow::Result` so call sites can propagate with `?` freely; the CLI
//! entrypoint downcasts the terminal error back to a [`FetchError`] to pick
//! an exit code (see [`FetchError::exit_code`]).

use std::time::Duration;
use thiserror::Error;

/// The kind of TLS validation failure, used to decide whether an
/// `--insecure` hint should be appended to the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsHintKind {
    /// The certificate's SAN/CN did not match the requested host.
    HostnameMismatch,
    /// The certificate chain did not terminate at a trusted root.
    UnknownAuthority,
    /// The certificate was malformed, expired, or otherwise invalid.
    InvalidCertificate,
}

/// Main error type for `fetch` operations.
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, request execution, TLS handling, DNS
/// resolution, and gRPC streaming. Formatter failures are intentionally
/// *not* represented here: they are caught at the dispatch boundary and
/// silently trigger a raw-passthrough fallback (see `format::dispatch`).
#[derive(Error, Debug)]
pub enum FetchError {
    /// Bad flag, bad value, mutually-exclusive conflict, missing required
    /// arg, invalid session name, or bad config wildcard.
    #[error("{0}")]
    Usage(String),

    /// A config file line could not be parsed.
    #[error("{file}:{line}: {reason}")]
    Config {
        /// Path of the offending config file.
        file: String,
        /// 1-indexed line number within the file.
        line: usize,
        /// Human-readable reason the line was rejected.
        reason: String,
    },

    /// File read/write/create failure.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// DNS lookup failed or returned NXDOMAIN.
    #[error("no such host")]
    Dns,

    /// TLS handshake or certificate verification failure.
    #[error("{message}")]
    Tls {
        /// Underlying message describing the failure.
        message: String,
        /// Present for the three recognised sub-kinds; used to decide
        /// whether an `--insecure` hint is appended.
        hint: Option<TlsHintKind>,
    },

    /// Connect/read/write failure at the transport layer.
    #[error("{0}")]
    Transport(String),

    /// Per-attempt timeout elapsed.
    #[error("request timed out after {}", format_duration(.duration))]
    Timeout {
        /// The configured per-attempt timeout.
        duration: Duration,
    },

    /// A gRPC call completed with a non-zero `Grpc-Status` trailer.
    #[error("{status_name}: {message}")]
    Grpc {
        /// Numeric gRPC status code.
        code: i32,
        /// Canonical status enum name (e.g. `INTERNAL`).
        status_name: String,
        /// Server-supplied `Grpc-Message`.
        message: String,
    },

    /// Redirect budget exhausted.
    #[error("exceeded maximum number of redirects")]
    RedirectBudgetExceeded,
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs.fract() == 0.0 {
        format!("{}s", secs as u64)
    } else {
        format!("{secs:.2}s")
    }
}

impl FetchError {
    /// Maps this error to the process exit code described in the CLI spec.
    ///
    /// HTTP status errors are not represented as a `FetchError` variant;
    /// [`crate::request::exit_code_for_status`] is used for those instead.
    /// Every variant here is a "local" failure and always exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            FetchError::RedirectBudgetExceeded => 1,
            _ => 1,
        }
    }

    /// `true` when the underlying failure is one of the three kinds for
    /// which an `--insecure` retry hint should be shown (see §4.5).
    pub fn insecure_hint(&self) -> Option<TlsHintKind> {
        match self {
            FetchError::Tls { hint, .. } => *hint,
            _ => None,
        }
    }
}

/// Result type alias for `fetch` operations.
///
/// This is a convenience alias that uses `anyhow::Error` as the error
/// type, allowing rich error context (via `.context(...)`) while still
/// letting the top-level handler downcast to a [`FetchError`] when it
/// needs to pick an exit code.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_error_displays_message_verbatim() {
        let err = FetchError::Usage("--cert and --key conflict".into());
        assert_eq!(err.to_string(), "--cert and --key conflict");
    }

    #[test]
    fn config_error_includes_file_and_line() {
        let err = FetchError::Config {
            file: "fetch.conf".into(),
            line: 12,
            reason: "invalid wildcard".into(),
        };
        assert_eq!(err.to_string(), "fetch.conf:12: invalid wildcard");
    }

    #[test]
    fn timeout_error_formats_whole_seconds() {
        let err = FetchError::Timeout {
            duration: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "request timed out after 5s");
    }

    #[test]
    fn timeout_error_formats_fractional_seconds() {
        let err = FetchError::Timeout {
            duration: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "request timed out after 1.50s");
    }

    #[test]
    fn grpc_error_includes_status_name_and_message() {
        let err = FetchError::Grpc {
            code: 13,
            status_name: "INTERNAL".into(),
            message: "oh no!".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("INTERNAL"));
        assert!(msg.contains("oh no!"));
    }

    #[test]
    fn dns_error_message_matches_spec() {
        assert_eq!(FetchError::Dns.to_string(), "no such host");
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FetchError = io_err.into();
        assert!(matches!(err, FetchError::Io(_)));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FetchError>();
    }

    #[test]
    fn redirect_budget_exceeded_exit_code_is_one() {
        assert_eq!(FetchError::RedirectBudgetExceeded.exit_code(), 1);
    }

    #[test]
    fn tls_hint_only_present_for_tagged_variant() {
        let err = FetchError::Tls {
            message: "hostname mismatch".into(),
            hint: Some(TlsHintKind::HostnameMismatch),
        };
        assert_eq!(err.insecure_hint(), Some(TlsHintKind::HostnameMismatch));
        assert_eq!(FetchError::Dns.insecure_hint(), None);
    }
}
