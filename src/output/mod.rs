//! Output destination dispatch: stdout, file, pager, clipboard (§6,
//! testable property #7 / end-to-end scenario #6).

use crate::error::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where formatted or raw body bytes are ultimately written.
pub enum Destination {
    Stdout,
    File { path: PathBuf, clobber: bool },
}

impl Destination {
    pub fn is_tty(&self) -> bool {
        use std::io::IsTerminal;
        matches!(self, Destination::Stdout) && std::io::stdout().is_terminal()
    }

    pub fn write_all(&self, bytes: &[u8]) -> Result<()> {
        match self {
            Destination::Stdout => {
                std::io::stdout().write_all(bytes)?;
                Ok(())
            }
            Destination::File { path, clobber } => {
                let mut options = OpenOptions::new();
                options.write(true).create(true);
                if *clobber {
                    options.truncate(true);
                } else {
                    options.create_new(true);
                }
                let mut file = options.open(path)?;
                file.write_all(bytes)?;
                file.sync_all()?;
                Ok(())
            }
        }
    }
}

/// Extracts a safe base filename from a `Content-Disposition` header
/// value for use with `-O -J`. Any directory component (`/`, `\`, or
/// `..`) is stripped so the file can only land inside the current
/// working directory — see end-to-end scenario #6.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let lower = header.to_ascii_lowercase();
    let marker = "filename=";
    let idx = lower.find(marker)?;
    let rest = &header[idx + marker.len()..];
    let raw = rest.trim_start_matches('"').split(['"', ';']).next()?.trim();
    sanitize_filename(raw)
}

fn sanitize_filename(raw: &str) -> Option<String> {
    let base = Path::new(raw).file_name()?.to_string_lossy().to_string();
    if base.is_empty() || base == "." || base == ".." {
        None
    } else {
        Some(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_traversal_filename_is_reduced_to_basename() {
        let name = filename_from_content_disposition(
            r#"attachment; filename="../../etc/passwd""#,
        )
        .unwrap();
        assert_eq!(name, "passwd");
    }

    #[test]
    fn plain_filename_is_kept_verbatim() {
        let name = filename_from_content_disposition(r#"attachment; filename="report.csv""#).unwrap();
        assert_eq!(name, "report.csv");
    }

    #[test]
    fn missing_filename_directive_returns_none() {
        assert!(filename_from_content_disposition("attachment").is_none());
    }

    #[test]
    fn dot_dot_alone_is_rejected() {
        assert!(filename_from_content_disposition(r#"attachment; filename="..""#).is_none());
    }
}
