//! `--inspect-tls`: handshake-only certificate chain rendering (§4.5)

use crate::printer::color::Style;
use crate::printer::Printer;
use std::io::Write;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

/// Expiry colour bucket for a certificate's `notAfter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryBucket {
    Expired,
    Soon,
    Warning,
    Healthy,
}

impl ExpiryBucket {
    /// Buckets `days_remaining` per the spec thresholds: expired (<0),
    /// red (<7 days), yellow (<30 days), green (>=30 days).
    pub fn from_days_remaining(days_remaining: i64) -> Self {
        if days_remaining < 0 {
            ExpiryBucket::Expired
        } else if days_remaining < 7 {
            ExpiryBucket::Soon
        } else if days_remaining < 30 {
            ExpiryBucket::Warning
        } else {
            ExpiryBucket::Healthy
        }
    }

    fn style(self) -> Style {
        match self {
            ExpiryBucket::Expired | ExpiryBucket::Soon => Style::Red,
            ExpiryBucket::Warning => Style::Yellow,
            ExpiryBucket::Healthy => Style::Green,
        }
    }
}

/// One parsed certificate in a rendered chain.
pub struct CertEntry {
    pub display_name: String,
    pub expiry_bucket: ExpiryBucket,
    pub days_remaining: i64,
    pub sans: Vec<String>,
}

/// Derives the display name per the precedence: CN, else first
/// Organization, else first DNS SAN, else the full Subject string.
pub fn display_name(cert: &X509Certificate<'_>) -> String {
    let subject = cert.subject();
    if let Some(cn) = subject.iter_common_name().next() {
        if let Ok(s) = cn.as_str() {
            return s.to_string();
        }
    }
    if let Some(org) = subject.iter_organization().next() {
        if let Ok(s) = org.as_str() {
            return s.to_string();
        }
    }
    if let Ok(Some(sans)) = cert.subject_alternative_name() {
        for name in &sans.value.general_names {
            if let x509_parser::extensions::GeneralName::DNSName(dns) = name {
                return dns.to_string();
            }
        }
    }
    subject.to_string()
}

/// Renders a parsed certificate chain as a tree with `└─` connectors,
/// increasing indent, display name, and colour-bucketed expiry.
pub fn render_chain<W: Write>(
    printer: &mut Printer<W>,
    der_chain: &[Vec<u8>],
    now_unix: i64,
) -> std::io::Result<Vec<CertEntry>> {
    let mut entries = Vec::new();
    for (depth, der) in der_chain.iter().enumerate() {
        let Ok((_, cert)) = X509Certificate::from_der(der) else {
            continue;
        };
        let name = display_name(&cert);
        let not_after = cert.validity().not_after.timestamp();
        let days_remaining = (not_after - now_unix) / 86_400;
        let bucket = ExpiryBucket::from_days_remaining(days_remaining);
        let sans = cert
            .subject_alternative_name()
            .ok()
            .flatten()
            .map(|sans| {
                sans.value
                    .general_names
                    .iter()
                    .filter_map(|n| match n {
                        x509_parser::extensions::GeneralName::DNSName(d) => Some(d.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let indent = "  ".repeat(depth);
        printer.write_str(&format!("{indent}└─ "))?;
        printer.styled(bucket.style(), &name)?;
        printer.newline()?;

        entries.push(CertEntry {
            display_name: name,
            expiry_bucket: bucket,
            days_remaining,
            sans,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_buckets_follow_thresholds() {
        assert_eq!(ExpiryBucket::from_days_remaining(-1), ExpiryBucket::Expired);
        assert_eq!(ExpiryBucket::from_days_remaining(3), ExpiryBucket::Soon);
        assert_eq!(ExpiryBucket::from_days_remaining(20), ExpiryBucket::Warning);
        assert_eq!(ExpiryBucket::from_days_remaining(90), ExpiryBucket::Healthy);
    }

    #[test]
    fn boundary_values_are_inclusive_of_next_bucket() {
        assert_eq!(ExpiryBucket::from_days_remaining(7), ExpiryBucket::Warning);
        assert_eq!(ExpiryBucket::from_days_remaining(30), ExpiryBucket::Healthy);
    }
}
