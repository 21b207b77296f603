use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(super) runtime: RuntimeSettings,
    pub(super) api: ApiSettings,
    pub(super) auth: AuthSettings,
    pub(super) downloads: DownloadSettings,
    pub(super) paging: PagingSettings,
    pub(super) telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub(crate) struct ApiSettings {
    pub(crate) base_url: Url,
    pub(crate) request_timeout_seconds: u64,
    pub(crate) download_path: DownloadPath,
}

#[derive(Debug, Clone)]
pub(crate) struct AuthSettings {
    pub(crate) token: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct DownloadSettings {
    pub(crate) directory: String,
}

#[derive(Debug, Clone)]
pub(crate) struct PagingSettings {
    pub(crate) page_size: usize,
    pub(crate) page_size_options: Vec<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RuntimeSettings {
    pub(crate) environment: Environment,
    pub(crate) strict_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Environment {
    Development,
    Production,
    Staging,
    Test,
}

impl Environment {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Test => "test",
        }
    }

    pub(super) fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Path template for file downloads, relative to the API base URL.
///
/// Always contains exactly one `{file_id}` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DownloadPath(pub(super) String);

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid api base url: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid download path template: {0}")]
    InvalidDownloadPath(String),
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("failed to read {field} from {path}: {source}")]
    Unreadable {
        field: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("missing required secret for {0}")]
    MissingSecret(&'static str),
}

pub(crate) const FILE_ID_PLACEHOLDER: &str = "{file_id}";

impl DownloadPath {
    pub(super) fn parse(value: String) -> Result<Self, ConfigError> {
        let trimmed = value.trim();
        let placeholders =
            trimmed.split('/').filter(|segment| *segment == FILE_ID_PLACEHOLDER).count();
        if placeholders != 1 {
            return Err(ConfigError::InvalidDownloadPath(value));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Path segments with the file id substituted, empty segments dropped.
    pub(crate) fn segments<'a>(&'a self, file_id: &'a str) -> Vec<&'a str> {
        self.0
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| if segment == FILE_ID_PLACEHOLDER { file_id } else { segment })
            .collect()
    }
}

impl Default for DownloadPath {
    fn default() -> Self {
        Self(format!("/download/{FILE_ID_PLACEHOLDER}"))
    }
}

pub(super) fn parse_base_url(value: String) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|_| ConfigError::InvalidBaseUrl(value.clone()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl(value));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_path_substitutes_file_id() {
        let path = DownloadPath::parse("/files/{file_id}/raw".to_string()).expect("template");
        assert_eq!(path.segments("abc"), vec!["files", "abc", "raw"]);
    }

    #[test]
    fn download_path_requires_single_placeholder() {
        assert!(DownloadPath::parse("/download".to_string()).is_err());
        assert!(DownloadPath::parse("/{file_id}/{file_id}".to_string()).is_err());
        assert!(DownloadPath::parse("/download/x{file_id}".to_string()).is_err());
    }

    #[test]
    fn base_url_rejects_non_http_schemes() {
        assert!(parse_base_url("ftp://example.com".to_string()).is_err());
        assert!(parse_base_url("mailto:someone@example.com".to_string()).is_err());
        assert!(parse_base_url("not a url".to_string()).is_err());
        let url = parse_base_url("https://grader.example.com/api".to_string()).expect("url");
        assert_eq!(url.path(), "/api");
    }
}
