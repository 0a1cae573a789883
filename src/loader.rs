//! Specification loading from various sources.
//!
//! Handles loading service documents from files, strings, and HTTP URLs,
//! in JSON or YAML.

use std::path::Path;

use tracing::debug;

use crate::error::LoadError;
use crate::model::Service;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Serialization format of a specification document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Picks the format from a file name or URL: `.json` is JSON, anything else YAML.
    pub fn from_name(name: &str) -> Self {
        let name = name.split(['?', '#']).next().unwrap_or(name);
        if name.to_ascii_lowercase().ends_with(".json") {
            Format::Json
        } else {
            Format::Yaml
        }
    }
}

/// Load a service from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist, or a parse
/// error if the content is not a valid specification.
pub fn load_service(path: &Path) -> Result<Service, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let format = Format::from_name(&path.to_string_lossy());
    debug!(path = %path.display(), ?format, "Loading specification.");
    load_service_str(&content, format)
}

/// Load a service from a string in the given format.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` or `LoadError::InvalidYaml` on parse failure,
/// including unknown keys and case-mismatched literals.
pub fn load_service_str(content: &str, format: Format) -> Result<Service, LoadError> {
    match format {
        Format::Json => {
            serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
        }
        Format::Yaml => {
            serde_yaml::from_str(content).map_err(|source| LoadError::InvalidYaml { source })
        }
    }
}

/// Load a service from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails, or a parse error
/// if the body isn't a valid specification.
#[cfg(feature = "remote")]
pub fn load_service_url(url: &str) -> Result<Service, LoadError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    debug!(url, "Fetching specification.");
    let response = client
        .get(url)
        .send()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    // Check for HTTP errors before parsing
    let response = response
        .error_for_status()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let body = response.text().map_err(|source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    })?;

    load_service_str(&body, Format::from_name(url))
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a service from a file path or URL.
///
/// Automatically detects whether the source is a URL or file path.
/// URL loading requires the `remote` feature.
pub fn load_service_auto(source: &str) -> Result<Service, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_service_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_service(Path::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const MINIMAL_JSON: &str = r#"{"name": "Accounts", "resources": [
        {"name": "User", "operations": ["Read"],
         "fields": [{"name": "id", "type": "UUID", "operations": ["Read"]}]}
    ]}"#;

    const MINIMAL_YAML: &str = "name: Accounts
resources:
  - name: User
    operations: [Read]
    fields:
      - name: id
        type: UUID
        operations: [Read]
";

    fn temp_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn format_from_name() {
        assert_eq!(Format::from_name("spec.json"), Format::Json);
        assert_eq!(Format::from_name("SPEC.JSON"), Format::Json);
        assert_eq!(Format::from_name("spec.yaml"), Format::Yaml);
        assert_eq!(Format::from_name("spec.yml"), Format::Yaml);
        assert_eq!(
            Format::from_name("https://example.com/spec.json?rev=2"),
            Format::Json
        );
    }

    #[test]
    fn load_service_json_file() {
        let file = temp_file(".json", MINIMAL_JSON);
        let service = load_service(file.path()).unwrap();
        assert_eq!(service.name, "Accounts");
        assert_eq!(service.resources[0].fields[0].type_name, "UUID");
    }

    #[test]
    fn load_service_yaml_file() {
        let file = temp_file(".yaml", MINIMAL_YAML);
        let service = load_service(file.path()).unwrap();
        assert_eq!(service.resources[0].name, "User");
    }

    #[test]
    fn load_service_file_not_found() {
        let result = load_service(Path::new("/nonexistent/service.yaml"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_service_invalid_json() {
        let file = temp_file(".json", "not valid json");
        let result = load_service(file.path());
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_service_str_rejects_unknown_keys() {
        let result = load_service_str(r#"{"name": "A", "resourcez": []}"#, Format::Json);
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_service_str_rejects_lowercase_operation() {
        let yaml = "name: A
resources:
  - name: User
    operations: [create]
";
        let result = load_service_str(yaml, Format::Yaml);
        assert!(matches!(result, Err(LoadError::InvalidYaml { .. })));
    }

    #[test]
    fn is_url_detection() {
        assert!(is_url("https://example.com/spec.yaml"));
        assert!(is_url("http://example.com/spec.yaml"));
        assert!(!is_url("/path/to/spec.yaml"));
        assert!(!is_url("spec.yaml"));
    }

    #[test]
    fn load_service_auto_file() {
        let file = temp_file(".yaml", MINIMAL_YAML);
        let service = load_service_auto(file.path().to_str().unwrap()).unwrap();
        assert_eq!(service.name, "Accounts");
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_service_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/spec.json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(MINIMAL_JSON)
                .create();

            let service = load_service_url(&format!("{}/spec.json", server.url())).unwrap();
            assert_eq!(service.name, "Accounts");
            mock.assert();
        }

        #[test]
        fn load_service_url_yaml() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("GET", "/spec.yaml")
                .with_status(200)
                .with_body(MINIMAL_YAML)
                .create();

            let service = load_service_auto(&format!("{}/spec.yaml", server.url())).unwrap();
            assert_eq!(service.resources.len(), 1);
        }

        #[test]
        fn load_service_url_404() {
            let mut server = mockito::Server::new();
            let _mock = server.mock("GET", "/missing.json").with_status(404).create();

            let result = load_service_url(&format!("{}/missing.json", server.url()));
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }
    }
}
