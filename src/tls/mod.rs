//! TLS client configuration assembly and certificate-chain inspection (§4.5)

pub mod inspect;

use crate::cli::{HttpVersion, TlsVersion};
use crate::error::{FetchError, Result, TlsHintKind};
use anyhow::{anyhow, Context};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ClientConfig;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Everything needed to assemble a `rustls::ClientConfig` for one request.
pub struct TlsAssembly {
    pub ca_certs: Vec<std::path::PathBuf>,
    pub client_identity: Option<(std::path::PathBuf, Option<std::path::PathBuf>)>,
    pub min_version: Option<TlsVersion>,
    pub insecure: bool,
    pub http_version: Option<HttpVersion>,
}

impl TlsAssembly {
    /// Builds the `rustls::ClientConfig`. CA overrides are appended to the
    /// system roots, never substituted for them. ALPN protocols offered
    /// follow the requested HTTP version.
    pub fn build(&self) -> Result<ClientConfig> {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        for path in &self.ca_certs {
            let certs = load_certs(path)?;
            for cert in certs {
                roots
                    .add(cert)
                    .map_err(|e| anyhow!(FetchError::Tls { message: format!("invalid CA certificate {}: {e}", path.display()), hint: None }))?;
            }
        }

        let builder = ClientConfig::builder();

        let mut config = if let Some((cert_path, key_path)) = &self.client_identity {
            let certs = load_certs(cert_path)?;
            let key = match key_path {
                Some(key_path) => load_key(key_path)?,
                None => load_key(cert_path).map_err(|_| {
                    anyhow!(FetchError::Tls {
                        message: format!(
                            "{} may require a private key (--key)",
                            cert_path.display()
                        ),
                        hint: None,
                    })
                })?,
            };
            builder
                .with_root_certificates(roots)
                .with_client_auth_cert(certs, key)
                .map_err(|e| anyhow!(FetchError::Tls { message: e.to_string(), hint: None }))?
        } else {
            builder.with_root_certificates(roots).with_no_client_auth()
        };

        config.alpn_protocols = match self.http_version {
            Some(HttpVersion::Http1) => vec![b"http/1.1".to_vec()],
            Some(HttpVersion::Http2) => vec![b"h2".to_vec(), b"http/1.1".to_vec()],
            Some(HttpVersion::Http3) => {
                return Err(anyhow!(FetchError::Usage(
                    "HTTP/3 is not yet supported by this build".to_string()
                )))
            }
            None => vec![b"h2".to_vec(), b"http/1.1".to_vec()],
        };

        if self.insecure {
            config
                .dangerous()
                .set_certificate_verifier(Arc::new(InsecureVerifier));
        }

        Ok(config)
    }
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("parsing certificates from {}", path.display()))
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .with_context(|| format!("parsing private key from {}", path.display()))?
        .ok_or_else(|| anyhow!(FetchError::Tls {
            message: format!("no private key found in {}", path.display()),
            hint: None,
        }))
}

/// Classifies a rustls verification failure into the three hinted kinds
/// the spec recognises, so the CLI can suggest `--insecure`.
pub fn classify_tls_error(message: &str) -> Option<TlsHintKind> {
    let lower = message.to_lowercase();
    if lower.contains("not valid for") || lower.contains("hostname") || lower.contains("certificatenotvalidforname") {
        Some(TlsHintKind::HostnameMismatch)
    } else if lower.contains("unknown issuer") || lower.contains("unknownissuer") {
        Some(TlsHintKind::UnknownAuthority)
    } else if lower.contains("invalid") || lower.contains("expired") || lower.contains("badcertificate") {
        Some(TlsHintKind::InvalidCertificate)
    } else {
        None
    }
}

/// A certificate verifier that accepts anything, wired in only when
/// `--insecure` is set.
#[derive(Debug)]
struct InsecureVerifier;

impl rustls::client::danger::ServerCertVerifier for InsecureVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_hostname_mismatch() {
        assert_eq!(
            classify_tls_error("certificate is not valid for 'example.com'"),
            Some(TlsHintKind::HostnameMismatch)
        );
    }

    #[test]
    fn classifies_unknown_authority() {
        assert_eq!(
            classify_tls_error("UnknownIssuer"),
            Some(TlsHintKind::UnknownAuthority)
        );
    }

    #[test]
    fn unrecognised_message_has_no_hint() {
        assert_eq!(classify_tls_error("connection reset"), None);
    }

    #[test]
    fn http3_assembly_is_rejected() {
        let assembly = TlsAssembly {
            ca_certs: vec![],
            client_identity: None,
            min_version: None,
            insecure: false,
            http_version: Some(HttpVersion::Http3),
        };
        assert!(assembly.build().is_err());
    }
}
