//! Shared test helpers: a temp dir for file-backed body/output tests, and
//! a minimal `Config` builder so integration tests don't hand-assemble
//! every field.

use crate::cli::Cli;
use crate::config::Config;
use crate::error::FetchError;
use clap::Parser;
use std::path::PathBuf;
use tempfile::TempDir;

pub fn temp_dir() -> TempDir {
    TempDir::new().expect("failed to create temporary directory")
}

pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("failed to write test file");
    path
}

/// Builds a `Config` for `url` with otherwise-default flags, the way
/// most request-pipeline unit tests want one.
pub fn test_config(url: &str) -> Config {
    let cli = Cli::try_parse_from(["fetch", url]).expect("valid minimal CLI args");
    Config::load(&cli).expect("minimal config should always load")
}

pub fn assert_error_contains<T>(result: Result<T, FetchError>, expected: &str) {
    match result {
        Ok(_) => panic!("expected error containing '{expected}' but got Ok"),
        Err(e) => {
            let message = e.to_string();
            assert!(
                message.contains(expected),
                "error message '{message}' does not contain '{expected}'"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_creation_produces_existing_path() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn create_test_file_writes_content() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "body.json", "{}");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_config_loads_for_minimal_url() {
        let config = test_config("https://example.com/resource");
        assert_eq!(config.url, "https://example.com/resource");
    }

    #[test]
    fn assert_error_contains_panics_on_ok() {
        let result = std::panic::catch_unwind(|| {
            assert_error_contains(Ok::<(), FetchError>(()), "anything");
        });
        assert!(result.is_err());
    }

    #[test]
    fn assert_error_contains_passes_on_matching_message() {
        assert_error_contains(
            Err::<(), FetchError>(FetchError::Usage("bad flag combination".to_string())),
            "bad flag",
        );
    }
}
