use crate::utils::error::{PracticeError, Result};
use std::path::Path;
use url::Url;

pub const MAX_TIMEOUT_SECONDS: u64 = 600;
const REPORT_EXTENSIONS: [&str; 2] = ["csv", "json"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: &str, reason: impl Into<String>) -> PracticeError {
    PracticeError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Base URL of the document store or blob server. Paths are appended to it,
/// so it cannot carry a query string or fragment.
pub fn validate_endpoint(field_name: &str, endpoint: &str) -> Result<()> {
    if endpoint.trim().is_empty() {
        return Err(invalid(field_name, endpoint, "Endpoint cannot be empty"));
    }

    let url = Url::parse(endpoint)
        .map_err(|e| invalid(field_name, endpoint, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(invalid(
                field_name,
                endpoint,
                format!("Content is only served over http or https, not {}", scheme),
            ))
        }
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid(
            field_name,
            endpoint,
            "Endpoint must not contain a query string or fragment",
        ));
    }
    Ok(())
}

fn validate_local_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }
    Ok(())
}

/// A content dump is a directory or a `.zip` archive.
pub fn validate_dump_path(field_name: &str, path: &str) -> Result<()> {
    validate_local_path(field_name, path)?;

    let dump = Path::new(path);
    let extension = dump
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        None | Some("zip") => Ok(()),
        Some(_) if dump.is_dir() => Ok(()),
        Some(other) => Err(invalid(
            field_name,
            path,
            format!("Dump must be a directory or a .zip archive, got .{}", other),
        )),
    }
}

/// Root directory of local blob storage.
pub fn validate_storage_root(field_name: &str, path: &str) -> Result<()> {
    validate_local_path(field_name, path)?;
    if Path::new(path).is_file() {
        return Err(invalid(field_name, path, "Blob storage root must be a directory"));
    }
    Ok(())
}

pub fn validate_limit(field_name: &str, limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(invalid(
            field_name,
            "0",
            "Listing limit must be at least 1 exercise",
        ));
    }
    Ok(())
}

pub fn validate_timeout(field_name: &str, seconds: u64) -> Result<()> {
    if seconds == 0 || seconds > MAX_TIMEOUT_SECONDS {
        return Err(invalid(
            field_name,
            &seconds.to_string(),
            format!("Timeout must be between 1 and {} seconds", MAX_TIMEOUT_SECONDS),
        ));
    }
    Ok(())
}

/// Attempt reports are written as CSV or JSON, chosen by extension.
pub fn validate_report_path(field_name: &str, path: &str) -> Result<()> {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some(extension) if REPORT_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()) => {
            Ok(())
        }
        Some(extension) => Err(invalid(
            field_name,
            path,
            format!(
                "Reports can be written as {}, not .{}",
                REPORT_EXTENSIONS.join(" or "),
                extension
            ),
        )),
        None => Err(invalid(
            field_name,
            path,
            "Report path needs a .csv or .json extension",
        )),
    }
}

/// Bearer token for the document store; a leftover `${VAR}` means the variable was not set.
pub fn validate_token(field_name: &str, token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(invalid(field_name, token, "Token cannot be empty or whitespace-only"));
    }
    if token.starts_with("${") {
        return Err(invalid(field_name, token, "Environment variable is not set"));
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| PracticeError::MissingConfigError {
        field: field_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_endpoint() {
        assert!(validate_endpoint("store.endpoint", "https://content.example.com/api").is_ok());
        assert!(validate_endpoint("store.endpoint", "http://localhost:8080").is_ok());
        assert!(validate_endpoint("store.endpoint", "").is_err());
        assert!(validate_endpoint("store.endpoint", "invalid-url").is_err());
        assert!(validate_endpoint("store.endpoint", "ftp://example.com").is_err());
        assert!(validate_endpoint("store.endpoint", "https://example.com/api?key=1").is_err());
    }

    #[test]
    fn test_validate_dump_path() {
        assert!(validate_dump_path("store.path", "./content").is_ok());
        assert!(validate_dump_path("store.path", "./content.ZIP").is_ok());
        assert!(validate_dump_path("store.path", "./content.tar.gz").is_err());
        assert!(validate_dump_path("store.path", "").is_err());

        let temp_dir = TempDir::new().unwrap();
        let dotted = temp_dir.path().join("dump.2024");
        std::fs::create_dir(&dotted).unwrap();
        assert!(validate_dump_path("store.path", &dotted.to_string_lossy()).is_ok());
    }

    #[test]
    fn test_validate_storage_root() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("blob.json");
        std::fs::write(&file, "{}").unwrap();

        assert!(validate_storage_root("blobs.path", &temp_dir.path().to_string_lossy()).is_ok());
        assert!(validate_storage_root("blobs.path", &file.to_string_lossy()).is_err());
    }

    #[test]
    fn test_validate_limit_and_timeout() {
        assert!(validate_limit("catalog.default_limit", 5).is_ok());
        assert!(validate_limit("catalog.default_limit", 0).is_err());
        assert!(validate_timeout("store.timeout_seconds", 30).is_ok());
        assert!(validate_timeout("store.timeout_seconds", 0).is_err());
        assert!(validate_timeout("store.timeout_seconds", 601).is_err());
    }

    #[test]
    fn test_validate_report_path() {
        assert!(validate_report_path("report", "out/attempt.csv").is_ok());
        assert!(validate_report_path("report", "attempt.JSON").is_ok());
        assert!(validate_report_path("report", "attempt.txt").is_err());
        assert!(validate_report_path("report", "attempt").is_err());
    }

    #[test]
    fn test_validate_token() {
        assert!(validate_token("store.token", "secret").is_ok());
        assert!(validate_token("store.token", "  ").is_err());
        assert!(validate_token("store.token", "${CONTENT_TOKEN}").is_err());
    }
}
